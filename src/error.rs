use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CuratorError {
    #[error("no input files matched pattern: {0}")]
    NoInputFiles(String),

    #[error("unsupported glob pattern: {0}")]
    InvalidPattern(String),

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("input file is empty: {0}")]
    EmptyInput(PathBuf),

    #[error(
        "header mismatch in {path}\nexpected: {expected:?}\nfound:    {found:?}\nmake sure all per-query files were fetched with the same fields"
    )]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path}: missing required column(s): {}", .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("malformed delimited data: {0}")]
    Malformed(String),
}
