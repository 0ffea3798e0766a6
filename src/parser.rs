use crate::models::{Block, Malformed, MalformedReason, RawEntry, RawMacro};
use crate::scan::find_matching_close;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// `@type{` with an optional type token so that `@{...}` can be reported instead of
/// silently skipped.
static ENTRY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*([A-Za-z][A-Za-z0-9_-]*)?\s*\{").unwrap());

static CITATION_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s,={}]+$").unwrap());

/// Lazily walks a bibliography, yielding one [`Block`] per `@...{...}` block in file
/// order.
///
/// Text between blocks is ignored. A block that cannot be parsed is reported as
/// [`Block::Malformed`] and scanning continues after it, so one corrupt record never
/// hides the rest of the file.
pub struct BibReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> BibReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn malformed(&mut self, offset: usize, reason: MalformedReason, resume: usize) -> Block {
        debug!(offset, reason = reason.as_str(), "Skipping malformed block");
        self.pos = resume;
        Block::Malformed(Malformed { offset, reason })
    }
}

impl Iterator for BibReader<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let text = self.text;
        loop {
            let caps = ENTRY_START.captures_at(text, self.pos)?;
            let whole = caps.get(0)?;
            let at = whole.start();
            let open = whole.end() - 1;
            let bytes = text.as_bytes();

            let close = match find_matching_close(bytes, open) {
                Some(c) => c,
                None => {
                    return Some(self.malformed(at, MalformedReason::UnbalancedBraces, at + 1));
                }
            };
            let after = close + 1;

            let entry_type = match caps.get(1) {
                Some(t) => t.as_str().to_ascii_lowercase(),
                None => return Some(self.malformed(at, MalformedReason::MissingType, after)),
            };
            let body = &text[open + 1..close];

            match entry_type.as_str() {
                "comment" | "preamble" => {
                    trace!(offset = at, entry_type = %entry_type, "Skipping non-entry block");
                    self.pos = after;
                    continue;
                }
                "string" => {
                    let Some((name, value)) = body.split_once('=') else {
                        return Some(self.malformed(at, MalformedReason::MissingKey, after));
                    };
                    let name = name.trim();
                    if !CITATION_KEY.is_match(name) {
                        return Some(self.malformed(at, MalformedReason::MissingKey, after));
                    }
                    self.pos = after;
                    return Some(Block::Macro(RawMacro {
                        name: name.to_string(),
                        raw_value: value.trim().to_string(),
                    }));
                }
                _ => {}
            }

            let (key, raw_fields) = match body.split_once(',') {
                Some((key, rest)) => (key.trim(), rest.trim()),
                None => (body.trim(), ""),
            };
            if !CITATION_KEY.is_match(key) {
                return Some(self.malformed(at, MalformedReason::MissingKey, after));
            }

            self.pos = after;
            return Some(Block::Entry(RawEntry {
                entry_type,
                key: key.to_string(),
                raw_fields: raw_fields.to_string(),
                offset: at,
            }));
        }
    }
}
