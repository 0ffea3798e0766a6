use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Journal names containing any of these (lower-cased) never get the journal badge
pub const DEFAULT_JOURNAL_EXCLUSIONS: &[&str] = &["arxiv", "corr", "medrxiv"];

/// Venue names containing any of these (lower-cased) never get the conference badge
pub const DEFAULT_CONFERENCE_EXCLUSIONS: &[&str] = &[
    "workshop",
    "bvm",
    "bildverarbeitung",
    "rofo",
    "fortschritte",
];

/// Fields copied as written: only whitespace is collapsed, no LaTeX decoding
pub const DEFAULT_VERBATIM_FIELDS: &[&str] = &["url", "doi", "eprint", "file"];

/// The upstream export writes 2018 as 1804 for some records.
pub const DEFAULT_YEAR_CORRECTIONS: &[(u32, u32)] = &[(1804, 2018)];

pub const DEFAULT_OWNER_GIVEN: &str = "Bernhard";
pub const DEFAULT_OWNER_FAMILY: &str = "Kainz";

/// Year assigned to entries whose year is missing or not a number
pub const UNKNOWN_YEAR: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Owner {
    pub given: String,
    pub family: String,
}

impl Default for Owner {
    fn default() -> Self {
        Self {
            given: DEFAULT_OWNER_GIVEN.to_string(),
            family: DEFAULT_OWNER_FAMILY.to_string(),
        }
    }
}

impl Owner {
    /// "B." for a given name of "Bernhard"; multi-part given names keep every initial.
    pub fn initials(&self) -> String {
        self.given
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter_map(|part| part.chars().next())
            .map(|c| format!("{}.", c))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// "Bernhard Kainz"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given, self.family)
    }

    /// "B. Kainz", the form every rendered author list uses for the owner
    pub fn initialed_name(&self) -> String {
        format!("{} {}", self.initials(), self.family)
    }

    /// "Kainz, Bernhard"
    pub fn full_name_inverted(&self) -> String {
        format!("{}, {}", self.family, self.given)
    }

    /// "Kainz, B."
    pub fn initialed_name_inverted(&self) -> String {
        format!("{}, {}", self.family, self.initials())
    }
}

/// Run configuration, loaded from an optional JSON file.
///
/// Every key is optional; a missing key falls back to the constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub journal_exclusions: Vec<String>,
    pub conference_exclusions: Vec<String>,
    pub year_corrections: BTreeMap<u32, u32>,
    pub verbatim_fields: Vec<String>,
    pub owner: Owner,
    pub highlight_owner: bool,
    pub render_undated: bool,
    /// Extra named LaTeX commands, e.g. `{"textmu": "μ"}` for `\textmu`
    pub latex_commands: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            journal_exclusions: to_strings(DEFAULT_JOURNAL_EXCLUSIONS),
            conference_exclusions: to_strings(DEFAULT_CONFERENCE_EXCLUSIONS),
            year_corrections: DEFAULT_YEAR_CORRECTIONS.iter().copied().collect(),
            verbatim_fields: to_strings(DEFAULT_VERBATIM_FIELDS),
            owner: Owner::default(),
            highlight_owner: true,
            render_undated: true,
            latex_commands: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        info!(path = ?path, "Loaded configuration");
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
