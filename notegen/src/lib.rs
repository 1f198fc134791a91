//! notegen - two-call note generator
//!
//! Turns a subject into an Obsidian note: one inference call for metadata
//! (title, topic, topics, tags), a configurable pause, one call for the body,
//! then a Markdown file with YAML front matter in the notes directory.

pub mod batch;
pub mod client;
pub mod error;
pub mod metadata;
pub mod note;
pub mod pipeline;
pub mod prompts;
pub mod slug;

pub use batch::{read_subjects, run_batch, BatchReport, CsvSubject, RowFailure};
pub use client::{HttpInferenceClient, InferenceApi, InferenceError};
pub use error::{Error, Result};
pub use note::Note;
pub use pipeline::{fetch_body, fetch_metadata, generate_note, process_subject};
