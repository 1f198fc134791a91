//! Form fields shared by `/run-one` and `/upload`
//!
//! Blank fields mean "use the default". Both the short delay names
//! (`delay_meta`, `delay_rows`) and the long ones (`delay_meta_content`,
//! `delay_between_rows`) are accepted.

use notegen_common::config::{expand_home, parse_delay};
use notegen_common::SettingsOverrides;

use crate::{ApiError, ApiResult};

#[derive(Debug, Clone, Default)]
pub struct RunForm {
    pub api_url: Option<String>,
    pub notes_dir: Option<String>,
    pub delay_meta: Option<String>,
    pub delay_rows: Option<String>,
    pub subject: Option<String>,
}

impl RunForm {
    /// Build from submitted name/value pairs; a later field wins over an earlier one
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.set_field(&name, value);
        }
        form
    }

    /// Set a field by its form name; unknown names are ignored
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "api_url" => &mut self.api_url,
            "notes_dir" => &mut self.notes_dir,
            "delay_meta" | "delay_meta_content" => &mut self.delay_meta,
            "delay_rows" | "delay_between_rows" => &mut self.delay_rows,
            "subject" => &mut self.subject,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Settings given explicitly in this submission
    pub fn overrides(&self) -> ApiResult<SettingsOverrides> {
        Ok(SettingsOverrides {
            api_url: non_blank(&self.api_url).map(str::to_string),
            notes_dir: non_blank(&self.notes_dir).map(expand_home),
            delay_meta_content: non_blank(&self.delay_meta)
                .map(|raw| parse_delay("delay_meta", raw))
                .transpose()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            delay_between_rows: non_blank(&self.delay_rows)
                .map(|raw| parse_delay("delay_rows", raw))
                .transpose()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        })
    }

    /// The trimmed subject, if one was given
    pub fn subject(&self) -> Option<&str> {
        non_blank(&self.subject)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
