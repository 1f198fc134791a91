//! Prompt text for the two inference calls

/// Broad topic vocabulary the metadata call must choose from
pub const TOPIC_LIST: [&str; 20] = [
    "Computers & Information",
    "Philosophy",
    "Psychology & Self-Help",
    "Religion & Spirituality",
    "Social Sciences",
    "Politics & Government",
    "Economics & Business",
    "Education & Teaching",
    "Language & Linguistics",
    "Science (General)",
    "Mathematics",
    "Physics & Astronomy",
    "Chemistry",
    "Biology",
    "Medicine & Health",
    "Engineering & Technology",
    "Arts & Design",
    "Literature & Writing",
    "History & Geography",
    "Travel & Recreation",
];

/// Inline JSON array, `["a", "b"]`
pub fn json_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| serde_json::Value::from(item.as_ref()).to_string())
        .collect();
    format!("[{}]", quoted.join(", "))
}

pub fn metadata_prompt(subject: &str) -> String {
    format!(
        r#"You will ONLY return strict JSON. No markdown or extra text.

Subject: {subject}

TASK:
1) "title": a concise title.
2) "topic": a ONE-WORD topic (no spaces).
3) "topics": pick 2–4 distinct items from TOPICS (exact string match; avoid near-duplicates).
4) "tags": 1–3 short extra tags (1–2 words each), semantically distinct from "topics".

TOPICS = {topics}

OUTPUT:
{{
  "title": "Concise Title",
  "topic": "OneWordTopic",
  "topics": ["Item from TOPICS", "..."],
  "tags": ["short-tag-1", "short-tag-2"]
}}"#,
        subject = subject,
        topics = json_list(&TOPIC_LIST[..]),
    )
}

pub fn body_prompt(subject: &str, topic: &str, topics: &[String], tags: &[String]) -> String {
    format!(
        "Return ONLY the body text (no JSON/YAML or code fences).\n\n\
         Subject: {subject}\n\
         One-word topic: {topic}\n\
         Chosen broad topics: {topics}\n\
         Extra tags: {tags}\n\n\
         Write ~900–1300 words of cohesive, detailed prose:\n\
         - Short paragraphs; light bullets only when helpful.\n\
         - Include concrete facts, dates, definitions, trade-offs, practical implications.\n\
         - Optional parenthetical source mentions (author/site + year). No URLs.",
        subject = subject,
        topic = topic,
        topics = json_list(topics),
        tags = json_list(tags),
    )
}
