use crate::config::{Config, Owner, UNKNOWN_YEAR};
use crate::latex::LatexTable;
use crate::models::{Entry, RawEntry, RawMacro};
use crate::scan::{find_matching_close, is_balanced, split_at_depth_zero};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::btree_map::Entry as MapEntry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Field names and macro references share the same token shape.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_:.-]*$").unwrap());

/// Month macros every BibTeX style predefines.
static MONTHS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("jan", "January"),
        ("feb", "February"),
        ("mar", "March"),
        ("apr", "April"),
        ("may", "May"),
        ("jun", "June"),
        ("jul", "July"),
        ("aug", "August"),
        ("sep", "September"),
        ("oct", "October"),
        ("nov", "November"),
        ("dec", "December"),
    ])
});

/// Turns raw entries into decoded [`Entry`] records.
///
/// Holds the `@string` macros seen so far, so blocks must be fed in file order.
pub struct Normalizer {
    latex: LatexTable,
    owner: Owner,
    year_corrections: BTreeMap<u32, u32>,
    verbatim_fields: FxHashSet<String>,
    macros: FxHashMap<String, String>,
}

impl Normalizer {
    pub fn new(config: &Config) -> Self {
        Self {
            latex: LatexTable::with_commands(&config.latex_commands),
            owner: config.owner.clone(),
            year_corrections: config.year_corrections.clone(),
            verbatim_fields: config
                .verbatim_fields
                .iter()
                .map(|f| f.trim().to_ascii_lowercase())
                .collect(),
            macros: FxHashMap::default(),
        }
    }

    /// Registers an `@string` macro. Later definitions replace earlier ones.
    pub fn define_macro(&mut self, raw: &RawMacro) {
        let value = self.expand(&raw.raw_value);
        debug!(name = %raw.name, "Defined string macro");
        self.macros.insert(raw.name.to_ascii_lowercase(), value);
    }

    pub fn macro_count(&self) -> usize {
        self.macros.len()
    }

    pub fn normalize(&self, raw: &RawEntry) -> Entry {
        let mut fields = BTreeMap::new();

        for segment in split_at_depth_zero(&raw.raw_fields, b',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((name, value)) = segment.split_once('=') else {
                trace!(key = %raw.key, segment, "Ignoring field without '='");
                continue;
            };
            let name = name.trim();
            if !IDENTIFIER.is_match(name) {
                trace!(key = %raw.key, name, "Ignoring invalid field name");
                continue;
            }
            let name = name.to_ascii_lowercase();

            let expanded = self.expand(value.trim());
            if !is_balanced(&expanded) {
                debug!(key = %raw.key, field = %name, "Unbalanced braces in field value");
            }
            let decoded = if name == "author" || name == "editor" {
                self.format_names(&expanded)
            } else if self.verbatim_fields.contains(&name) {
                collapse_whitespace(&expanded)
            } else {
                collapse_whitespace(&self.latex.decode(&expanded))
            };

            match fields.entry(name) {
                MapEntry::Vacant(slot) => {
                    slot.insert(decoded);
                }
                MapEntry::Occupied(slot) => {
                    debug!(key = %raw.key, field = %slot.key(), "Ignoring repeated field");
                }
            }
        }

        let year = self.extract_year(fields.get("year").map(String::as_str));
        let normalized_title = fields
            .get("title")
            .map(|t| normalize_title(t))
            .unwrap_or_default();

        Entry {
            entry_type: raw.entry_type.clone(),
            key: raw.key.clone(),
            fields,
            year,
            normalized_title,
        }
    }

    /// Resolves `#` concatenation, delimiters and macro references; the result is
    /// still LaTeX source.
    fn expand(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for part in split_at_depth_zero(value, b'#') {
            let part = part.trim();
            if let Some(inner) = strip_braces(part) {
                out.push_str(inner);
            } else if part.len() >= 2 && part.starts_with('"') && part.ends_with('"') {
                out.push_str(&part[1..part.len() - 1]);
            } else if IDENTIFIER.is_match(part) {
                let lower = part.to_ascii_lowercase();
                if let Some(v) = self.macros.get(&lower) {
                    out.push_str(v);
                } else if let Some(month) = MONTHS.get(lower.as_str()) {
                    out.push_str(month);
                } else {
                    out.push_str(part);
                }
            } else {
                out.push_str(part);
            }
        }
        out
    }

    /// Splits a BibTeX name list on `and`, decodes each name, applies the owner
    /// rule, and joins with commas.
    fn format_names(&self, raw: &str) -> String {
        split_names(raw)
            .into_iter()
            .map(|name| collapse_whitespace(&self.latex.decode(name)))
            .filter(|name| !name.is_empty())
            .map(|name| self.normalize_name(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn normalize_name(&self, name: String) -> String {
        if name == self.owner.full_name() {
            self.owner.initialed_name()
        } else if name == self.owner.full_name_inverted() {
            self.owner.initialed_name_inverted()
        } else {
            name
        }
    }

    fn extract_year(&self, year: Option<&str>) -> u32 {
        let Some(parsed) = year.and_then(|y| y.trim().parse::<u32>().ok()) else {
            return UNKNOWN_YEAR;
        };
        match self.year_corrections.get(&parsed) {
            Some(&corrected) => {
                debug!(from = parsed, to = corrected, "Correcting year");
                corrected
            }
            None => parsed,
        }
    }
}

/// Deduplication key: braces stripped, trimmed, lower-cased.
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.replace(['{', '}'], "")).to_lowercase()
}

/// `{...}` with matching outer braces -> inner text
fn strip_braces(part: &str) -> Option<&str> {
    if !part.starts_with('{') {
        return None;
    }
    match find_matching_close(part.as_bytes(), 0) {
        Some(close) if close == part.len() - 1 => Some(&part[1..close]),
        _ => None,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits on the word `and` (any case, surrounded by whitespace) at brace depth 0,
/// so that `{Barnes and Noble}` stays one name.
fn split_names(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut names = Vec::new();
    let mut depth: i32 = 0;
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            b if b.is_ascii_whitespace() && depth == 0 => {
                if let Some(len) = and_separator_len(&bytes[i..]) {
                    names.push(raw[last..i].trim());
                    last = i + len;
                    i += len;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    names.push(raw[last..].trim());
    names
}

/// Length of `<ws>and<ws>` at the start of `bytes`, if present.
fn and_separator_len(bytes: &[u8]) -> Option<usize> {
    let lead = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let word = bytes.get(lead..lead + 3)?;
    if !word.eq_ignore_ascii_case(b"and") {
        return None;
    }
    let trail = bytes[lead + 3..]
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    if trail == 0 {
        return None;
    }
    Some(lead + 3 + trail)
}
