//! Error types for note generation

use thiserror::Error;

use crate::client::InferenceError;

/// Errors from generating or writing a note
#[derive(Debug, Error)]
pub enum Error {
    /// The inference API call failed or returned a non-ok envelope
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Writing the note (or reading the subject file) failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The subject list could not be read as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty subject or similar caller mistake
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// notegen-common error (settings, atomic writes)
    #[error(transparent)]
    Common(#[from] notegen_common::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
