//! # Note Generator Common Library
//!
//! Shared code for the note generator CLI and web front end:
//! - Error type used across crates
//! - Settings model, resolution order and the saved settings file
//! - Atomic file writes

pub mod atomic;
pub mod config;
pub mod error;

pub use config::{Settings, SettingsOverrides, SettingsStore};
pub use error::{Error, Result};
