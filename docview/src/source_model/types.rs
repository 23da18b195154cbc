//! Shared type definitions

use itertools::Itertools;
use std::collections::BTreeMap;

/// Table cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Alignment {
    fn from(align: pulldown_cmark::Alignment) -> Self {
        match align {
            pulldown_cmark::Alignment::None => Alignment::None,
            pulldown_cmark::Alignment::Left => Alignment::Left,
            pulldown_cmark::Alignment::Center => Alignment::Center,
            pulldown_cmark::Alignment::Right => Alignment::Right,
        }
    }
}

/// Output attributes attached to a node by the transformation passes
///
/// These end up on the rendered element: `id` becomes the anchor, `classes`
/// the class list, and every `data` entry a `data-<key>` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Anchor id of the element
    pub id: Option<String>,

    /// CSS classes, in insertion order
    pub classes: Vec<String>,

    /// `data-*` attributes keyed without the `data-` prefix
    pub data: BTreeMap<String, String>,
}

impl Attributes {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class unless it is already present
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    /// Set a `data-*` attribute, replacing any previous value
    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a `data-*` attribute by key (without the prefix)
    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Space-separated class list, as written into a `class` attribute
    pub fn class_list(&self) -> String {
        self.classes.iter().join(" ")
    }

    /// Whether nothing has been attached
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.classes.is_empty() && self.data.is_empty()
    }
}
