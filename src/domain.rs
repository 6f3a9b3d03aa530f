use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Identifier of the query/project that produced a per-query export,
/// derived from the source filename minus a fixed suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryId(String);

impl QueryId {
    pub fn from_path(path: &Path, suffix: &str) -> Self {
        let name = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        let stem = name.strip_suffix(suffix).unwrap_or(name);
        Self(stem.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized sequencing layout tag inferred from a paired/single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqType {
    Paired,
    Single,
}

impl SeqType {
    pub fn from_layout(layout: &str) -> Option<Self> {
        match layout.trim().to_ascii_uppercase().as_str() {
            "PAIRED" => Some(SeqType::Paired),
            "SINGLE" => Some(SeqType::Single),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeqType::Paired => "paired",
            SeqType::Single => "single",
        }
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source archive tag carried on every unified output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceDb {
    Ena,
    Sra,
}

impl SourceDb {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceDb::Ena => "ENA",
            SourceDb::Sra => "SRA",
        }
    }
}

impl fmt::Display for SourceDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Instrument model, falling back to the platform when the model is blank.
pub fn sequencing_machine(model: &str, platform: &str) -> String {
    let model = model.trim();
    if model.is_empty() {
        platform.trim().to_string()
    } else {
        model.to_string()
    }
}
