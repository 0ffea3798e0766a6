use serde::Serialize;
use std::collections::BTreeMap;

/// One `@type{key, ...}` block as found in the input, before field parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub entry_type: String,
    pub key: String,
    pub raw_fields: String,
    /// Byte offset of the `@` marker
    pub offset: usize,
}

/// An `@string{name = value}` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMacro {
    pub name: String,
    pub raw_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    UnbalancedBraces,
    MissingType,
    MissingKey,
}

impl MalformedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedReason::UnbalancedBraces => "unbalanced braces",
            MalformedReason::MissingType => "missing entry type",
            MalformedReason::MissingKey => "missing citation key",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Malformed {
    pub offset: usize,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Entry(RawEntry),
    Macro(RawMacro),
    Malformed(Malformed),
}

/// A fully decoded publication record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub entry_type: String,
    pub key: String,
    pub fields: BTreeMap<String, String>,
    pub year: u32,
    #[serde(skip)]
    pub normalized_title: String,
}

impl Entry {
    /// Field value, treating an empty string the same as a missing field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn journal(&self) -> Option<&str> {
        self.field("journal")
    }

    /// Conference venue: `booktitle`, falling back to `venue`.
    pub fn venue(&self) -> Option<&str> {
        self.field("booktitle").or_else(|| self.field("venue"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Badges {
    pub top_journal: bool,
    pub top_conference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    #[serde(flatten)]
    pub entry: Entry,
    pub badges: Badges,
}

/// Surviving publications grouped by year, file order kept within a year.
pub type YearBuckets = BTreeMap<u32, Vec<Publication>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(fields: &[(&str, &str)]) -> Entry {
        Entry {
            entry_type: "article".to_string(),
            key: "k".to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            year: 2020,
            normalized_title: String::new(),
        }
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let entry = entry_with(&[("journal", "")]);
        assert_eq!(entry.journal(), None);
    }

    #[test]
    fn venue_prefers_booktitle() {
        let entry = entry_with(&[("booktitle", "MICCAI"), ("venue", "Other")]);
        assert_eq!(entry.venue(), Some("MICCAI"));
    }

    #[test]
    fn venue_falls_back_to_venue_field() {
        let entry = entry_with(&[("venue", "CVPR")]);
        assert_eq!(entry.venue(), Some("CVPR"));
    }

    #[test]
    fn publication_serializes_flat() {
        let publication = Publication {
            entry: entry_with(&[("title", "T")]),
            badges: Badges::default(),
        };
        let json = serde_json::to_value(&publication).unwrap();
        assert_eq!(json["key"], "k");
        assert_eq!(json["fields"]["title"], "T");
        assert_eq!(json["badges"]["top_journal"], false);
        assert!(json.get("normalized_title").is_none());
    }
}
