use crate::classify::Classification;
use crate::config::{Config, UNKNOWN_YEAR};
use crate::models::{Entry, Publication};
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt::Write;

const JOURNAL_BADGE: &str = r#"<span class="badge badge-journal">Top Journal</span>"#;
const CONFERENCE_BADGE: &str = r#"<span class="badge badge-conference">Top Conference</span>"#;
const UNDATED_HEADING: &str = "Undated";
const UNTITLED: &str = "No title";

/// Renders the HTML fragment.
///
/// The fragment has no enclosing document. It is pasted into the publications page
/// directly after the closing `</style>` marker; pasted anywhere else, the page's
/// styles can hide the list entirely.
pub struct HtmlRenderer {
    /// Matches the owner's (escaped) name in an escaped author list
    owner_pattern: Option<Regex>,
    render_undated: bool,
}

impl HtmlRenderer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let owner_pattern = if config.highlight_owner {
            let plain = regex::escape(&escape_html(&config.owner.initialed_name()));
            let inverted = regex::escape(&escape_html(&config.owner.initialed_name_inverted()));
            let pattern = format!(r"\b{}\b|\b{}", plain, inverted);
            Some(Regex::new(&pattern).context("Failed to build owner highlight pattern")?)
        } else {
            None
        };
        Ok(Self {
            owner_pattern,
            render_undated: config.render_undated,
        })
    }

    /// Renders every year newest first. Dated entries are numbered from
    /// `classification.total` down to 1; undated entries follow without numbers.
    pub fn render(&self, classification: &Classification) -> Result<String> {
        let mut out = String::new();
        let mut counter = classification.total;

        for (year, pubs) in classification.buckets.iter().rev() {
            if *year == UNKNOWN_YEAR {
                continue;
            }
            writeln!(out, "<h3>{}</h3>", year)?;
            writeln!(out, r#"<ul class="publication-list">"#)?;
            for publication in pubs {
                self.write_publication(&mut out, publication, Some(counter))?;
                counter = counter.saturating_sub(1);
            }
            writeln!(out, "</ul>")?;
        }

        let undated = classification.undated();
        if self.render_undated && !undated.is_empty() {
            writeln!(out, "<h3>{}</h3>", UNDATED_HEADING)?;
            writeln!(out, r#"<ul class="publication-list publication-list-undated">"#)?;
            for publication in undated {
                self.write_publication(&mut out, publication, None)?;
            }
            writeln!(out, "</ul>")?;
        }

        Ok(out)
    }

    fn write_publication(
        &self,
        out: &mut String,
        publication: &Publication,
        number: Option<usize>,
    ) -> std::fmt::Result {
        let entry = &publication.entry;
        let title = escape_html(entry.field("title").unwrap_or(UNTITLED));

        let mut badges = String::new();
        if publication.badges.top_journal {
            badges.push(' ');
            badges.push_str(JOURNAL_BADGE);
        }
        if publication.badges.top_conference {
            badges.push(' ');
            badges.push_str(CONFERENCE_BADGE);
        }

        match number {
            Some(n) => writeln!(out, r#"<li id="pub-{}">"#, n)?,
            None => writeln!(out, "<li>")?,
        }
        writeln!(out, r#"  <div class="pub-entry">"#)?;
        if let Some(n) = number {
            writeln!(out, r#"    <span class="pub-number">[{}]</span>"#, n)?;
        }
        writeln!(out, r#"    <div class="pub-title">{}{}</div>"#, title, badges)?;
        if let Some(authors) = entry.field("author") {
            writeln!(
                out,
                r#"    <div class="pub-authors">{}</div>"#,
                self.format_authors(authors)
            )?;
        }
        let venue = venue_line(entry);
        if !venue.is_empty() {
            writeln!(out, r#"    <div class="pub-venue">{}</div>"#, venue)?;
        }
        writeln!(out, "  </div>")?;
        writeln!(out, "</li>")
    }

    fn format_authors(&self, authors: &str) -> String {
        let escaped = escape_html(authors);
        match &self.owner_pattern {
            Some(pattern) => pattern
                .replace_all(&escaped, "<strong>$0</strong>")
                .into_owned(),
            None => escaped,
        }
    }
}

/// `<em>Journal</em>, 12(3):1–10, 2020`, or `In <em>Book</em>, pp. 1–10, 2020`, or
/// just the year. Missing parts are left out.
fn venue_line(entry: &Entry) -> String {
    let mut parts = Vec::new();

    if let Some(journal) = entry.journal() {
        let mut line = format!("<em>{}</em>", escape_html(journal));
        if let Some(volume) = entry.field("volume") {
            line.push_str(", ");
            line.push_str(&escape_html(volume));
        }
        if let Some(number) = entry.field("number") {
            line.push('(');
            line.push_str(&escape_html(number));
            line.push(')');
        }
        if let Some(pages) = entry.field("pages") {
            line.push(':');
            line.push_str(&escape_html(pages));
        }
        parts.push(line);
    } else if let Some(venue) = entry.venue() {
        parts.push(format!("In <em>{}</em>", escape_html(venue)));
        if let Some(pages) = entry.field("pages") {
            parts.push(format!("pp. {}", escape_html(pages)));
        }
    }

    if entry.year != UNKNOWN_YEAR {
        parts.push(entry.year.to_string());
    }

    parts.join(", ")
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, VenueRules};
    use crate::normalize::normalize_title;
    use rustc_hash::FxHashSet;
    use std::collections::BTreeMap;

    fn entry(key: &str, year: u32, fields: &[(&str, &str)]) -> Entry {
        let fields: BTreeMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let normalized_title = fields
            .get("title")
            .map(|t| normalize_title(t))
            .unwrap_or_default();
        Entry {
            entry_type: "article".to_string(),
            key: key.to_string(),
            fields,
            year,
            normalized_title,
        }
    }

    fn render_entries(entries: Vec<Entry>) -> String {
        render_with(entries, &Config::default())
    }

    fn render_with(entries: Vec<Entry>, config: &Config) -> String {
        let classification = classify(entries, FxHashSet::default(), &VenueRules::from_config(config));
        HtmlRenderer::from_config(config)
            .unwrap()
            .render(&classification)
            .unwrap()
    }

    fn numbers(html: &str) -> Vec<usize> {
        let re = Regex::new(r#"<span class="pub-number">\[(\d+)\]</span>"#).unwrap();
        re.captures_iter(html)
            .map(|c| c[1].parse().unwrap())
            .collect()
    }

    #[test]
    fn numbering_counts_down_across_years() {
        let html = render_entries(vec![
            entry("a", 2019, &[("title", "A")]),
            entry("b", 2021, &[("title", "B")]),
            entry("c", 2019, &[("title", "C")]),
            entry("d", 2020, &[("title", "D")]),
        ]);
        assert_eq!(numbers(&html), vec![4, 3, 2, 1]);

        let b = html.find(">B<").unwrap();
        let d = html.find(">D<").unwrap();
        let a = html.find(">A<").unwrap();
        let c = html.find(">C<").unwrap();
        assert!(b < d && d < a && a < c);
    }

    #[test]
    fn year_headings_descend() {
        let html = render_entries(vec![
            entry("a", 2018, &[("title", "A")]),
            entry("b", 2022, &[("title", "B")]),
        ]);
        let y2022 = html.find("<h3>2022</h3>").unwrap();
        let y2018 = html.find("<h3>2018</h3>").unwrap();
        assert!(y2022 < y2018);
    }

    #[test]
    fn undated_entries_render_last_without_numbers() {
        let html = render_entries(vec![
            entry("u", UNKNOWN_YEAR, &[("title", "Undated one")]),
            entry("a", 2020, &[("title", "A")]),
        ]);
        assert_eq!(numbers(&html), vec![1]);
        let undated = html.find("<h3>Undated</h3>").unwrap();
        assert!(html.find("<h3>2020</h3>").unwrap() < undated);
        assert!(html[undated..].contains("Undated one"));
    }

    #[test]
    fn undated_entries_can_be_hidden() {
        let config = Config {
            render_undated: false,
            ..Config::default()
        };
        let html = render_with(
            vec![entry("u", UNKNOWN_YEAR, &[("title", "Undated one")])],
            &config,
        );
        assert!(html.is_empty());
    }

    #[test]
    fn journal_venue_line() {
        let html = render_entries(vec![entry(
            "a",
            2020,
            &[
                ("title", "T"),
                ("journal", "Medical Image Analysis"),
                ("volume", "64"),
                ("number", "2"),
                ("pages", "101–110"),
            ],
        )]);
        assert!(html.contains(
            r#"<div class="pub-venue"><em>Medical Image Analysis</em>, 64(2):101–110, 2020</div>"#
        ));
        assert!(html.contains(JOURNAL_BADGE));
        assert!(!html.contains(CONFERENCE_BADGE));
    }

    #[test]
    fn conference_venue_line_omits_missing_pages() {
        let html = render_entries(vec![entry(
            "a",
            2021,
            &[("title", "T"), ("booktitle", "MICCAI")],
        )]);
        assert!(html.contains(r#"<div class="pub-venue">In <em>MICCAI</em>, 2021</div>"#));
        assert!(html.contains(CONFERENCE_BADGE));
    }

    #[test]
    fn excluded_venues_get_no_badge() {
        let html = render_entries(vec![
            entry("a", 2021, &[("title", "A"), ("journal", "CoRR")]),
            entry("b", 2021, &[("title", "B"), ("booktitle", "MICCAI Workshop on Foo")]),
        ]);
        assert!(!html.contains("badge"));
    }

    #[test]
    fn double_badge_is_rendered() {
        let html = render_entries(vec![entry(
            "a",
            2021,
            &[("title", "T"), ("journal", "TMI"), ("booktitle", "MICCAI")],
        )]);
        assert!(html.contains(JOURNAL_BADGE));
        assert!(html.contains(CONFERENCE_BADGE));
        assert!(html.contains("<em>TMI</em>"));
    }

    #[test]
    fn missing_title_and_authors() {
        let html = render_entries(vec![entry("a", 2020, &[])]);
        assert!(html.contains(r#"<div class="pub-title">No title</div>"#));
        assert!(!html.contains("pub-authors"));
        assert!(html.contains(r#"<div class="pub-venue">2020</div>"#));
    }

    #[test]
    fn text_is_escaped() {
        let html = render_entries(vec![entry(
            "a",
            2020,
            &[("title", "R&D <fast>"), ("journal", "A & B")],
        )]);
        assert!(html.contains("R&amp;D &lt;fast&gt;"));
        assert!(html.contains("<em>A &amp; B</em>"));
    }

    #[test]
    fn owner_is_highlighted() {
        let html = render_entries(vec![
            entry("a", 2020, &[("title", "A"), ("author", "J. Doe, B. Kainz")]),
            entry("b", 2020, &[("title", "B"), ("author", "Kainz, B., Doe, J.")]),
        ]);
        assert!(html.contains("J. Doe, <strong>B. Kainz</strong>"));
        assert!(html.contains("<strong>Kainz, B.</strong>, Doe, J."));
    }

    #[test]
    fn owner_highlight_does_not_overlap() {
        let html = render_entries(vec![entry(
            "a",
            2020,
            &[("title", "A"), ("author", "B. Kainz, B. Smith")],
        )]);
        assert!(html.contains("<strong>B. Kainz</strong>, B. Smith"));
        assert_eq!(html.matches("<strong>").count(), 1);
    }

    #[test]
    fn highlight_can_be_disabled() {
        let config = Config {
            highlight_owner: false,
            ..Config::default()
        };
        let html = render_with(
            vec![entry("a", 2020, &[("title", "A"), ("author", "B. Kainz")])],
            &config,
        );
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn empty_classification_renders_nothing() {
        let html = render_entries(vec![]);
        assert!(html.is_empty());
    }
}
