//! Filename and tag slugs

/// Lowercase, collapse every run of non-`[a-z0-9]` into one `-`, trim `-`
fn hyphenate(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// File stem for a subject; never empty
pub fn file_stem(subject: &str) -> String {
    let slug = hyphenate(subject);
    if slug.is_empty() {
        "note".to_string()
    } else {
        slug
    }
}

/// Obsidian tag slug; `&` and `+` read as "and". May be empty.
pub fn tag_slug(text: &str) -> String {
    hyphenate(&text.replace(['&', '+'], " and "))
}

/// First alphanumeric word of `text`, lowercased, or `topic`
pub fn first_word(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "topic".to_string())
}
