use crate::config::{Config, UNKNOWN_YEAR};
use crate::models::{Badges, Entry, Publication, YearBuckets};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// Substring rules deciding which venues earn a badge.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueRules {
    journal_exclusions: Vec<String>,
    conference_exclusions: Vec<String>,
}

impl VenueRules {
    pub fn new(journal_exclusions: &[String], conference_exclusions: &[String]) -> Self {
        Self {
            journal_exclusions: lowercase_all(journal_exclusions),
            conference_exclusions: lowercase_all(conference_exclusions),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.journal_exclusions, &config.conference_exclusions)
    }

    pub fn is_top_journal(&self, journal: Option<&str>) -> bool {
        passes(journal, &self.journal_exclusions)
    }

    pub fn is_top_conference(&self, venue: Option<&str>) -> bool {
        passes(venue, &self.conference_exclusions)
    }

    /// The two flags are decided independently.
    pub fn badges(&self, entry: &Entry) -> Badges {
        Badges {
            top_journal: self.is_top_journal(entry.journal()),
            top_conference: self.is_top_conference(entry.venue()),
        }
    }
}

impl Default for VenueRules {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn passes(name: Option<&str>, exclusions: &[String]) -> bool {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return false;
    };
    let lower = name.to_lowercase();
    !exclusions.iter().any(|exc| lower.contains(exc.as_str()))
}

/// Output of the classifier stage.
#[derive(Debug, Default)]
pub struct Classification {
    pub buckets: YearBuckets,
    /// Titles kept so far; pass back into [`classify`] to continue deduplicating.
    pub seen_titles: FxHashSet<String>,
    pub duplicates: u64,
    /// Surviving entries with a known year; the highest display number.
    pub total: usize,
}

impl Classification {
    pub fn undated(&self) -> &[Publication] {
        self.buckets
            .get(&UNKNOWN_YEAR)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn surviving(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Publications in render order: newest year first, file order within a year,
    /// undated last.
    pub fn in_render_order(&self) -> impl Iterator<Item = &Publication> {
        self.buckets
            .iter()
            .rev()
            .filter(|(year, _)| **year != UNKNOWN_YEAR)
            .flat_map(|(_, pubs)| pubs.iter())
            .chain(self.undated().iter())
    }
}

/// Deduplicates by normalized title (first occurrence wins), assigns badges, and
/// groups by year.
///
/// Entries without a title are never treated as duplicates.
pub fn classify<I>(entries: I, seen_titles: FxHashSet<String>, rules: &VenueRules) -> Classification
where
    I: IntoIterator<Item = Entry>,
{
    let mut result = Classification {
        seen_titles,
        ..Classification::default()
    };

    for entry in entries {
        if !entry.normalized_title.is_empty()
            && !result.seen_titles.insert(entry.normalized_title.clone())
        {
            debug!(
                key = %entry.key,
                title = %entry.normalized_title,
                "Dropping duplicate entry"
            );
            result.duplicates += 1;
            continue;
        }

        let badges = rules.badges(&entry);
        if entry.year != UNKNOWN_YEAR {
            result.total += 1;
        }
        result
            .buckets
            .entry(entry.year)
            .or_default()
            .push(Publication { entry, badges });
    }

    info!(
        kept = result.surviving(),
        numbered = result.total,
        duplicates = result.duplicates,
        years = result.buckets.len(),
        "Classification complete"
    );

    result
}
