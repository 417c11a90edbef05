//! Platform detection and date extraction.
//!
//! Both are ordered rule tables evaluated top to bottom; the first match
//! wins. Order matters where markers overlap (`@` claims a post for
//! Twitter/X before any later rule is consulted).

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::entry::Metadata;

/// Label used when no platform rule matches.
pub const DEFAULT_PLATFORM: &str = "Social Media";

/// A platform rule: any marker found in the lowercased content selects the label.
struct PlatformRule {
    markers: &'static [&'static str],
    label: &'static str,
}

const PLATFORM_RULES: &[PlatformRule] = &[
    PlatformRule { markers: &["#twitter", "#tweet", "@"], label: "Twitter/X" },
    PlatformRule { markers: &["#instagram", "#insta", "#ig"], label: "Instagram" },
    PlatformRule { markers: &["#facebook", "#fb"], label: "Facebook" },
    PlatformRule { markers: &["#linkedin", "#in"], label: "LinkedIn" },
    PlatformRule { markers: &["#tiktok", "#fyp", "#foryou"], label: "TikTok" },
    PlatformRule { markers: &["#youtube", "#yt"], label: "YouTube" },
    PlatformRule { markers: &["#reddit", "/r/"], label: "Reddit" },
    PlatformRule { markers: &["http"], label: "Web/Blog" },
];

/// Metadata keys consulted for a date, in priority order.
const DATE_FIELDS: &[&str] = &["date", "timestamp", "created_at"];

/// Content date patterns, in priority order.
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d{4}-\d{2}-\d{2}",        // YYYY-MM-DD
        r"\d{2}/\d{2}/\d{4}",        // MM/DD/YYYY
        r"\d{1,2}/\d{1,2}/\d{2,4}",  // M/D/YY or MM/DD/YYYY
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Detect the source platform of a post from its content.
///
/// Never empty: falls back to [`DEFAULT_PLATFORM`].
#[must_use]
pub fn detect_platform(content: &str) -> &'static str {
    let lowered = content.to_lowercase();
    PLATFORM_RULES
        .iter()
        .find(|rule| rule.markers.iter().any(|m| lowered.contains(m)))
        .map_or(DEFAULT_PLATFORM, |rule| rule.label)
}

/// Extract a date from metadata or, failing that, from the content.
///
/// Metadata strings are returned verbatim and other values as their JSON
/// text; `null` counts as missing.
#[must_use]
pub fn extract_date(content: &str, metadata: Option<&Metadata>) -> Option<String> {
    let from_metadata = metadata.and_then(|meta| {
        DATE_FIELDS
            .iter()
            .filter_map(|field| meta.get(*field))
            .find(|value| !value.is_null())
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    from_metadata.or_else(|| {
        DATE_PATTERNS
            .iter()
            .find_map(|pattern| pattern.find(content))
            .map(|m| m.as_str().to_string())
    })
}
