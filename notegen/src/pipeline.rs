//! Two-call generation flow for one subject
//!
//! metadata call → pause → body call → render → write

use std::path::PathBuf;
use std::time::Duration;

use notegen_common::Settings;
use tracing::info;

use crate::client::{InferenceApi, InferenceError};
use crate::metadata::NoteMetadata;
use crate::note::{write_note, Note};
use crate::prompts::{body_prompt, metadata_prompt};
use crate::{Error, Result};

/// Ask the model for title/topic/topics/tags; returns the raw output text
pub async fn fetch_metadata<A: InferenceApi>(
    api: &A,
    subject: &str,
) -> std::result::Result<String, InferenceError> {
    api.infer(&metadata_prompt(subject)).await
}

/// Ask the model for the note body, given the settled metadata
pub async fn fetch_body<A: InferenceApi>(
    api: &A,
    subject: &str,
    metadata: &NoteMetadata,
) -> std::result::Result<String, InferenceError> {
    api.infer(&body_prompt(
        subject,
        &metadata.topic,
        &metadata.topics,
        &metadata.tags,
    ))
    .await
}

/// Run both calls for `subject`, pausing `meta_to_content` in between
///
/// The subject is trimmed; an empty subject is rejected before any call.
pub async fn generate_note<A: InferenceApi>(
    api: &A,
    subject: &str,
    meta_to_content: Duration,
) -> Result<Note> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(Error::InvalidInput("subject is empty".to_string()));
    }

    let raw_metadata = fetch_metadata(api, subject).await?;
    let metadata = NoteMetadata::from_output(subject, &raw_metadata);
    info!(
        subject,
        title = %metadata.title,
        topic = %metadata.topic,
        "Metadata received"
    );

    if !meta_to_content.is_zero() {
        info!("Waiting {}s before body call", meta_to_content.as_secs());
        tokio::time::sleep(meta_to_content).await;
    }

    let body = fetch_body(api, subject, &metadata).await?;
    Ok(Note::new(subject, metadata, body))
}

/// Generate one note and write it to `settings.notes_dir`
pub async fn process_subject<A: InferenceApi>(
    api: &A,
    subject: &str,
    settings: &Settings,
) -> Result<PathBuf> {
    let note = generate_note(api, subject, settings.meta_to_content()).await?;
    let path = write_note(&settings.notes_dir, &note.file_stem(), &note)?;
    info!(path = %path.display(), "Note written");
    Ok(path)
}
