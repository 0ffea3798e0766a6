use crate::classify::{classify, Classification, VenueRules};
use crate::config::Config;
use crate::models::{Block, Publication};
use crate::normalize::Normalizer;
use crate::parser::BibReader;
use crate::render::HtmlRenderer;
use crate::stats::RunStats;
use anyhow::{bail, Context, Result};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of the extract, normalize and classify stages.
pub struct Conversion {
    pub classification: Classification,
    pub stats: RunStats,
}

#[derive(Serialize)]
pub struct InspectReport<'a> {
    pub stats: &'a RunStats,
    pub publications: Vec<&'a Publication>,
}

/// Runs every stage except rendering over an in-memory bibliography.
pub fn convert_str(text: &str, config: &Config) -> Conversion {
    let mut normalizer = Normalizer::new(config);
    let mut stats = RunStats::new();
    let rules = VenueRules::from_config(config);

    let entries = BibReader::new(text).filter_map(|block| match block {
        Block::Entry(raw) => {
            stats.inc_entries();
            Some(normalizer.normalize(&raw))
        }
        Block::Macro(raw) => {
            stats.inc_macros();
            normalizer.define_macro(&raw);
            None
        }
        Block::Malformed(_) => {
            stats.inc_malformed();
            None
        }
    });
    let classification = classify(entries, FxHashSet::default(), &rules);

    if stats.malformed_blocks > 0 {
        warn!(
            count = stats.malformed_blocks,
            "Skipped malformed blocks (run with -vv for offsets)"
        );
    }

    stats.duplicates_dropped = classification.duplicates;
    stats.undated_entries = classification.undated().len() as u64;
    stats.numbered_entries = classification.total as u64;
    stats.rendered_entries = if config.render_undated {
        classification.surviving() as u64
    } else {
        classification.total as u64
    };
    for publication in classification.buckets.values().flatten() {
        stats.top_journals += u64::from(publication.badges.top_journal);
        stats.top_conferences += u64::from(publication.badges.top_conference);
    }

    info!(
        entries = stats.entries_parsed,
        macros = stats.macros_defined,
        malformed = stats.malformed_blocks,
        duplicates = stats.duplicates_dropped,
        "Parsed bibliography"
    );

    Conversion {
        classification,
        stats,
    }
}

/// Converts an in-memory bibliography to the HTML fragment.
pub fn render_str(text: &str, config: &Config) -> Result<(String, RunStats)> {
    let conversion = convert_str(text, config);
    let renderer = HtmlRenderer::from_config(config)?;
    let html = renderer.render(&conversion.classification)?;
    Ok((html, conversion.stats))
}

/// Pretty JSON of the kept publications in render order, plus run statistics.
pub fn inspect_str(text: &str, config: &Config) -> Result<String> {
    let conversion = convert_str(text, config);
    let report = InspectReport {
        stats: &conversion.stats,
        publications: conversion.classification.in_render_order().collect(),
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize inspection report")
}

pub fn read_input(input: &Path) -> Result<String> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read bibliography: {:?}", input))?;
    info!(path = ?input, bytes = text.len(), "Read bibliography");
    Ok(text)
}

/// Reads `input`, renders it, and writes `output` unless `dry_run` is set.
pub fn run(input: &Path, output: &Path, config: &Config, dry_run: bool) -> Result<RunStats> {
    let text = read_input(input)?;
    let (html, stats) = render_str(&text, config)?;

    if dry_run {
        info!("Dry run, not writing output");
    } else {
        write_atomic(output, &html)?;
        info!(path = ?output, bytes = html.len(), "Wrote HTML fragment");
    }

    Ok(stats)
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let Some(name) = path.file_name() else {
        bail!("Output path has no file name: {:?}", path);
    };
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Writes to a sibling temp file and renames it over `path`, so a failed run never
/// leaves a truncated fragment behind.
///
/// The temp file is always `<path>.tmp`. A file already at that name is overwritten,
/// and removed if the write fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = temp_path(path)?;
    let result = write_then_rename(&tmp_path, path, contents);

    if result.is_err() && tmp_path.exists() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            warn!(error = %e, path = ?tmp_path, "Failed to remove temp output file");
        }
    }

    result
}

fn write_then_rename(tmp_path: &Path, path: &Path, contents: &str) -> Result<()> {
    let file = File::create(tmp_path)
        .with_context(|| format!("Failed to create temp output file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temp output file: {:?}", tmp_path))?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to flush temp output file: {:?}", tmp_path))?;

    fs::rename(tmp_path, path)
        .with_context(|| format!("Failed to rename temp output file to: {:?}", path))
}
