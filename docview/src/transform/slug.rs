//! Anchor slugs derived from display text

use std::collections::HashMap;

/// Slugify heading text the way GitHub anchors are generated
///
/// Lowercases, drops everything that is not a letter, digit, `-`, `_` or a
/// space, and turns each space into `-`. See [`Slugger`] for unique ids.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.push(c);
        } else if c == ' ' {
            slug.push('-');
        }
    }
    slug
}

/// Hands out document-unique slugs
///
/// A repeated slug gets `-1`, `-2`, ... appended, skipping any id that is
/// already taken (reserved ids included).
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    /// Create a slugger with no ids taken
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as taken without handing it out
    pub fn reserve(&mut self, id: &str) {
        self.occurrences.entry(id.to_string()).or_insert(0);
    }

    /// Unique slug for `text`; empty when the text has no slug characters
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if base.is_empty() {
            return base;
        }

        let mut slug = base.clone();
        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            slug = format!("{}-{}", base, count);
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

/// Title-case a file stem (`getting-started` -> `Getting Started`)
pub fn title_from_slug(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
