//! Data models for social-recall.
//!
//! - Entry: a stored or retrieved record
//! - Enrichment rules: platform detection and date extraction

pub mod enrich;
pub mod entry;

pub use enrich::{detect_platform, extract_date};
pub use entry::{Entry, Metadata};
