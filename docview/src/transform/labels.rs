//! Label index
//!
//! Per-document registry of declared anchors. Created fresh for each
//! document, filled by the collection pass (and the annotation pass), and
//! read by the reference resolver.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Label declaration at the start of a heading's text: `(sec:intro)= `
pub static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(([a-z][a-z0-9\-:]*)\)=\s*").expect("label prefix pattern is valid")
});

/// Label declaration on a line of its own: `(sec:intro)=`
pub static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(([a-z][a-z0-9\-:]*)\)=\s*$").expect("label line pattern is valid")
});

/// Kind of element a label points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Heading,
    Column,
    Annotation,
}

impl LabelKind {
    /// Value written into `data-ref-type`
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Heading => "heading",
            LabelKind::Column => "column",
            LabelKind::Annotation => "annotation",
        }
    }
}

/// A declared anchor point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    /// Normalized identifier
    pub id: String,

    /// What the label is attached to
    pub kind: LabelKind,

    /// Display title used as link text and tooltip
    pub title: String,

    /// Output anchor the label resolves to
    pub element_id: String,

    /// Plain-text excerpt (annotations only)
    pub summary: Option<String>,
}

impl LabelInfo {
    /// Create a label whose anchor equals its id
    pub fn new(id: impl Into<String>, kind: LabelKind, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            element_id: id.clone(),
            id,
            kind,
            title: title.into(),
            summary: None,
        }
    }
}

/// Map a raw label token to its canonical form (`sec:intro` -> `sec-intro`)
///
/// Every producer and consumer of label ids goes through this function.
pub fn normalize_id(raw: &str) -> String {
    raw.replace(':', "-")
}

/// Mapping from normalized id to label, in declaration order
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: Vec<LabelInfo>,
    by_id: HashMap<String, usize>,
}

impl LabelIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label unless its id is already present
    ///
    /// The first declaration wins. Returns `false` when the id was taken.
    pub fn add(&mut self, info: LabelInfo) -> bool {
        if self.by_id.contains_key(&info.id) {
            return false;
        }
        self.by_id.insert(info.id.clone(), self.labels.len());
        self.labels.push(info);
        true
    }

    /// Look up a label by normalized id
    pub fn get(&self, id: &str) -> Option<&LabelInfo> {
        self.by_id.get(id).map(|&index| &self.labels[index])
    }

    /// Whether a label with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels were declared
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &LabelInfo> {
        self.labels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("sec:intro"), "sec-intro");
        assert_eq!(normalize_id("a:b:c"), "a-b-c");
        assert_eq!(normalize_id("plain"), "plain");
    }

    #[test]
    fn test_normalize_id_is_idempotent() {
        for raw in ["sec:intro", "x", "a-b:c", "fig:1:2", "z9:"] {
            let once = normalize_id(raw);
            assert_eq!(normalize_id(&once), once);
        }
    }

    #[test]
    fn test_first_declaration_wins() {
        // Arrange
        let mut index = LabelIndex::new();

        // Act
        let first = index.add(LabelInfo::new("sec-a", LabelKind::Heading, "First"));
        let second = index.add(LabelInfo::new("sec-a", LabelKind::Column, "Second"));

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(index.len(), 1);
        let info = index.get("sec-a").unwrap();
        assert_eq!(info.title, "First");
        assert_eq!(info.kind, LabelKind::Heading);
    }

    #[test]
    fn test_get_missing() {
        let index = LabelIndex::new();
        assert!(index.is_empty());
        assert!(index.get("nope").is_none());
    }

    #[test]
    fn test_label_patterns() {
        let caps = LABEL_PREFIX.captures("(sec:intro)= Introduction").unwrap();
        assert_eq!(&caps[1], "sec:intro");
        assert_eq!(caps[0].len(), "(sec:intro)= ".len());

        assert!(LABEL_LINE.is_match("(side-note)=  "));
        assert!(!LABEL_LINE.is_match("(side-note)= trailing text"));
        assert!(!LABEL_PREFIX.is_match("(Upper)= x"));
        assert!(!LABEL_PREFIX.is_match("(9lives)= x"));
    }
}
