//! bibpage: BibTeX export to HTML publication list
//!
//! Converts the bibliography export of a personal academic site into the HTML
//! fragment that lists its publications. One batch run, four stages:
//!
//! 1. **Extraction** -- Scan the raw text for `@type{key, ...}` blocks, matching nested
//!    braces so that values like `M{\"u}ller` never end an entry early. Malformed
//!    blocks are reported and skipped, never fatal.
//! 2. **Normalization** -- Split fields at brace depth zero, expand `@string` macros
//!    and `#` concatenation, decode LaTeX escapes, format author lists, and derive the
//!    publication year (with the configured year corrections).
//! 3. **Classification** -- Drop duplicates by normalized title (first in file order
//!    wins), decide the journal and conference badges from substring exclusion lists,
//!    and group the rest by year.
//! 4. **Rendering** -- Emit year sections newest first, numbering entries from the
//!    total down to 1.
//!
//! # Key Modules
//!
//! - [`scan`] -- Brace-depth scanning shared by the extractor and field splitter
//! - [`parser`] -- Lazy block extractor ([`parser::BibReader`])
//! - [`latex`] -- Table-driven LaTeX escape decoding
//! - [`normalize`] -- Field parsing, macro expansion, author and year rules
//! - [`classify`] -- Deduplication, venue badges, year buckets
//! - [`render`] -- HTML fragment output
//! - [`pipeline`] -- Stage wiring, input read and atomic output write
//! - [`models`] -- Core data types (RawEntry, Entry, Publication)
//! - [`stats`] -- Per-run counters
//! - [`config`] -- Defaults and the JSON configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Render the fragment, then paste it after the page's closing </style> marker
//! bibpage render -i publications2025.bib -o publications_generated.html
//!
//! # Check what would be rendered, as JSON
//! bibpage inspect -i publications2025.bib -c bibpage.json
//! ```

pub mod classify;
pub mod config;
pub mod latex;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod stats;
