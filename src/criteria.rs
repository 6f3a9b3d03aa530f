//! Fixed curation criteria shared by the ENA and SRA slim filters.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Minimum sequencing depth (ENA `read_count`, SRA `spots`).
pub const MIN_READ_COUNT: u64 = 100_000;

pub const KEEP_LIBRARY_SELECTION: &str = "RANDOM";
pub const KEEP_LIBRARY_SOURCE: &str = "METAGENOMIC";
pub const KEEP_SCIENTIFIC_NAME: &str = "Homo sapiens";

/// Accepted composite strategy/selection value for SRA exports.
pub const KEEP_LIBRARY_COMBINED: &str = "WGS/RANDOM";

const EXTENDED_EXCLUDED_TERMS: &[&str] = &[
    "amplicon",
    "wxs",
    "targeted-capture",
    "targeted_capture",
    "targeted",
    "wga",
];

const MINIMAL_EXCLUDED_TERMS: &[&str] = &[
    "amplicon",
    "wxs",
    "targeted-capture",
    "targeted_capture",
    "targeted",
];

/// Curation profile for the ENA slim filter. The two profiles encode
/// different curation policies and must not be collapsed: `minimal` has no
/// organism/taxonomy columns and also accepts whole-genome-amplification
/// strategies, `extended` requires an exact organism match and rejects WGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnaProfile {
    Minimal,
    Extended,
}

impl fmt::Display for EnaProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnaProfile::Minimal => write!(f, "minimal"),
            EnaProfile::Extended => write!(f, "extended"),
        }
    }
}

impl EnaProfile {
    pub fn accepted_strategy_prefixes(self) -> &'static [&'static str] {
        match self {
            EnaProfile::Minimal => &["wgs", "wga"],
            EnaProfile::Extended => &["wgs"],
        }
    }

    pub fn excluded_strategy_terms(self) -> &'static [&'static str] {
        match self {
            EnaProfile::Minimal => MINIMAL_EXCLUDED_TERMS,
            EnaProfile::Extended => EXTENDED_EXCLUDED_TERMS,
        }
    }

    pub fn requires_organism(self) -> bool {
        matches!(self, EnaProfile::Extended)
    }
}

/// Trimmed, lowercased view used for all case-insensitive comparisons.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    normalize(left) == normalize(right)
}

/// Parses a count field, accepting integer and float renditions
/// ("1200000", "1.2e6"). Blank or unparsable values count as zero, which
/// then fails the depth threshold.
pub fn parse_count(value: &str) -> u64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed as u64,
        _ => 0,
    }
}

/// Whole-genome-shotgun classification: the strategy must start with an
/// accepted prefix and must not contain any deny-listed term. The substring
/// check is deliberately coarse ("AMPLICON-WGS" is rejected even though it
/// contains "wgs"); that is the inherited curation rule.
pub fn is_shotgun_strategy(
    strategy: &str,
    accepted_prefixes: &[&str],
    excluded_terms: &[&str],
) -> bool {
    let normalized = normalize(strategy);
    if normalized.is_empty() {
        return false;
    }
    if excluded_terms.iter().any(|term| normalized.contains(term)) {
        return false;
    }
    accepted_prefixes
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Composite strategy/selection value. A strategy that already contains a
/// separator is kept verbatim, otherwise strategy and selection are joined
/// with `/`.
pub fn combined_strategy(strategy: &str, selection: &str) -> String {
    let strategy = strategy.trim();
    let selection = selection.trim();
    if strategy.contains('/') {
        return strategy.to_string();
    }
    if !selection.is_empty() {
        if strategy.is_empty() {
            return selection.to_string();
        }
        return format!("{strategy}/{selection}");
    }
    strategy.to_string()
}

/// Splits `WGS/RANDOM` back into `("WGS", "RANDOM")`; a value without a
/// separator keeps the whole string as the strategy.
pub fn split_strategy_selection(combined: &str) -> (String, String) {
    let combined = combined.trim();
    match combined.split_once('/') {
        Some((strategy, selection)) => {
            (strategy.trim().to_string(), selection.trim().to_string())
        }
        None => (combined.to_string(), String::new()),
    }
}
