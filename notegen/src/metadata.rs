//! Metadata parsing and fallbacks
//!
//! The metadata call is asked for strict JSON but models drift: output may be
//! fenced, partial or not JSON at all. Parsing never fails; missing pieces are
//! derived from the subject instead.

use serde_json::Value;

use crate::prompts::TOPIC_LIST;
use crate::slug::{first_word, tag_slug};

/// Maximum number of broad topics kept on a note
pub const MAX_TOPICS: usize = 4;

/// Topic used when neither the model nor the keyword table offers one
pub const DEFAULT_TOPIC: &str = "Computers & Information";

/// Substring keywords → vocabulary topic, checked in order
const KEYWORD_TOPICS: &[(&[&str], &str)] = &[
    (&["ai", "llm", "data", "internet", "comput", "info"], "Computers & Information"),
    (&["philosophy", "ethic", "logic", "epistem"], "Philosophy"),
    (&["psychology", "adhd", "mental", "therapy", "self-help"], "Psychology & Self-Help"),
    (&["religion", "spiritual", "theolog", "mytholog"], "Religion & Spirituality"),
    (&["sociolog", "anthropolog", "culture", "gender"], "Social Sciences"),
    (&["politic", "policy", "government", "law", "election"], "Politics & Government"),
    (&["business", "startup", "market", "econom", "finance", "invest"], "Economics & Business"),
    (&["education", "teaching", "curriculum", "pedagog"], "Education & Teaching"),
    (&["linguist", "grammar", "language", "translate"], "Language & Linguistics"),
    (&["science", "scientific method"], "Science (General)"),
    (&["math", "algebra", "calculus", "statistic"], "Mathematics"),
    (&["physics", "astronomy", "cosmo", "quantum"], "Physics & Astronomy"),
    (&["chemistry", "chemical", "compound", "reagent"], "Chemistry"),
    (&["biology", "genetic", "zoolog", "ecolog", "flora", "fauna"], "Biology"),
    (&["medicine", "health", "clinic", "nutrition", "sleep"], "Medicine & Health"),
    (
        &["engineer", "robotic", "civil", "electrical", "mechanical", "technology"],
        "Engineering & Technology",
    ),
    (&["art", "design", "photo", "architec"], "Arts & Design"),
    (&["literature", "writing", "poetry", "novel", "criticism"], "Literature & Writing"),
    (&["history", "geograph", "cartograph", "histor"], "History & Geography"),
    (&["travel", "touris", "hobby", "sport", "recreat"], "Travel & Recreation"),
];

/// Fields of the metadata call exactly as the model returned them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub title: String,
    pub topic: String,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
}

impl RawMetadata {
    /// Parse model output; anything unusable yields empty fields
    pub fn parse(output: &str) -> Self {
        let object = match parse_json_object(output) {
            Some(Value::Object(map)) => map,
            _ => return Self::default(),
        };

        Self {
            title: string_field(object.get("title")),
            topic: string_field(object.get("topic")),
            topics: string_list(object.get("topics")),
            tags: string_list(object.get("tags")),
        }
    }
}

/// Metadata after fallbacks, ready for the body prompt and front matter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    pub title: String,
    /// One-word topic, never empty, never contains a space
    pub topic: String,
    /// 1..=4 entries from the topic vocabulary
    pub topics: Vec<String>,
    /// Extra tags as returned by the model
    pub tags: Vec<String>,
}

impl NoteMetadata {
    pub fn from_output(subject: &str, output: &str) -> Self {
        Self::from_raw(subject, RawMetadata::parse(output))
    }

    pub fn from_raw(subject: &str, raw: RawMetadata) -> Self {
        let title = match raw.title.trim() {
            "" => subject.to_string(),
            title => title.to_string(),
        };

        let topic = match raw.topic.trim() {
            "" => first_word(subject),
            topic if topic.contains(char::is_whitespace) => first_word(subject),
            topic => topic.to_string(),
        };

        let mut topics = sanitize_topics(&raw.topics);
        if topics.is_empty() {
            topics.push(fallback_topic(subject).to_string());
        }

        Self {
            title,
            topic,
            topics,
            tags: raw.tags,
        }
    }

    /// Front matter tag slugs: topics then extra tags, de-duplicated
    pub fn tag_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::new();
        for value in self.topics.iter().chain(self.tags.iter()) {
            let slug = tag_slug(value);
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }

        if slugs.is_empty() {
            let fallback = tag_slug(&self.topic);
            slugs.push(if fallback.is_empty() { "topic".to_string() } else { fallback });
        }
        slugs
    }
}

/// Keep vocabulary entries only, first occurrence wins, at most [`MAX_TOPICS`]
pub fn sanitize_topics(topics: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for topic in topics {
        if kept.len() >= MAX_TOPICS {
            break;
        }
        if TOPIC_LIST.contains(&topic.as_str()) && !kept.contains(topic) {
            kept.push(topic.clone());
        }
    }
    kept
}

/// Pick a vocabulary topic from keywords in the subject
pub fn fallback_topic(subject: &str) -> &'static str {
    let subject = subject.to_lowercase();
    KEYWORD_TOPICS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| subject.contains(needle)))
        .map(|(_, topic)| *topic)
        .unwrap_or(DEFAULT_TOPIC)
}

/// Parse output as JSON, falling back to its outermost `{...}` span
fn parse_json_object(output: &str) -> Option<Value> {
    let trimmed = output.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
