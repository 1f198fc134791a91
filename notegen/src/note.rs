//! Markdown note rendering and writing

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use notegen_common::atomic::write_atomic;

use crate::metadata::NoteMetadata;
use crate::prompts::json_list;
use crate::slug::file_stem;
use crate::Result;

/// Body written when the model returns nothing
pub const EMPTY_BODY_PLACEHOLDER: &str = "(Model returned no body text.)";

/// Timestamp format for the `created` property
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A generated note, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub subject: String,
    pub metadata: NoteMetadata,
    pub body: String,
    pub created: DateTime<FixedOffset>,
}

impl Note {
    /// Build a note stamped with the current local time
    pub fn new(
        subject: impl Into<String>,
        metadata: NoteMetadata,
        body: impl Into<String>,
    ) -> Self {
        Self::with_created(subject, metadata, body, Local::now().fixed_offset())
    }

    pub fn with_created(
        subject: impl Into<String>,
        metadata: NoteMetadata,
        body: impl Into<String>,
        created: DateTime<FixedOffset>,
    ) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            EMPTY_BODY_PLACEHOLDER.to_string()
        } else {
            body
        };

        Self {
            subject: subject.into(),
            metadata,
            body,
            created,
        }
    }

    /// File stem derived from the subject
    pub fn file_stem(&self) -> String {
        file_stem(&self.subject)
    }

    /// Render as Markdown with YAML front matter
    pub fn render(&self) -> String {
        let title = if self.metadata.title.trim().is_empty() {
            &self.subject
        } else {
            &self.metadata.title
        };

        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str("---\n");
        out.push_str(&format!("title: \"{}\"\n", escape_yaml(title)));
        out.push_str(&format!("created: \"{}\"\n", self.created.format(CREATED_FORMAT)));
        out.push_str(&format!("topic: \"{}\"\n", escape_yaml(&self.metadata.topic)));
        out.push_str(&format!("topics: {}\n", json_list(&self.metadata.topics)));
        out.push_str(&format!("tags: [{}]\n", self.metadata.tag_slugs().join(", ")));
        out.push_str("---\n\n");
        out.push_str(self.body.trim_end());
        out.push('\n');
        out
    }
}

/// Escape a value for a double-quoted YAML scalar on one line
pub fn escape_yaml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\r' | '\n' | '\t' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Write `note` to `<notes_dir>/<stem>.md` atomically and return the path
///
/// An existing file with the same name is replaced.
pub fn write_note(notes_dir: &Path, stem: &str, note: &Note) -> Result<PathBuf> {
    let path = notes_dir.join(format!("{}.md", stem));
    if path.exists() {
        tracing::warn!(path = %path.display(), "Replacing existing note");
    }
    write_atomic(&path, note.render().as_bytes())?;
    Ok(path)
}

/// Hands out file stems for one batch so two subjects never share a file
///
/// The first subject keeps the plain stem; later ones get `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct StemAllocator {
    claimed: HashSet<String>,
}

impl StemAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, subject: &str) -> String {
        let base = file_stem(subject);
        if self.claimed.insert(base.clone()) {
            return base;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
