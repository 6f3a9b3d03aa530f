//! ENA slim filter: streams one `read_run` export and keeps only rows
//! meeting the metagenomic whole-genome-shotgun curation criteria.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::criteria::{
    self, EnaProfile, KEEP_LIBRARY_SELECTION, KEEP_LIBRARY_SOURCE, KEEP_SCIENTIFIC_NAME,
    MIN_READ_COUNT,
};
use crate::error::CuratorError;
use crate::table::{DelimitedReader, DelimitedWriter};

const MINIMAL_COLUMNS: &[&str] = &[
    "study_accession",
    "run_accession",
    "read_count",
    "library_strategy",
    "library_source",
    "library_selection",
    "library_layout",
    "instrument_platform",
    "instrument_model",
];

const EXTENDED_COLUMNS: &[&str] = &[
    "study_accession",
    "run_accession",
    "read_count",
    "library_strategy",
    "library_source",
    "library_selection",
    "library_layout",
    "instrument_platform",
    "instrument_model",
    "scientific_name",
    "tax_id",
];

/// Fixed output schema of the slim file; identical to the required input
/// columns of the chosen profile.
pub fn columns(profile: EnaProfile) -> &'static [&'static str] {
    match profile {
        EnaProfile::Minimal => MINIMAL_COLUMNS,
        EnaProfile::Extended => EXTENDED_COLUMNS,
    }
}

#[derive(Debug, Default, Serialize)]
pub struct EnaSkipCounts {
    pub missing_identifiers: u64,
    pub low_read_count: u64,
    pub non_shotgun_strategy: u64,
    pub non_random_selection: u64,
    pub non_metagenomic_source: u64,
    pub wrong_organism: u64,
}

#[derive(Debug, Serialize)]
pub struct EnaSlimReport {
    pub profile: EnaProfile,
    pub rows_in: u64,
    pub rows_out: u64,
    pub skipped: EnaSkipCounts,
    pub output: Utf8PathBuf,
}

/// Filters one export into a slim file with the profile's fixed schema.
///
/// Input delimiter is sniffed from the header line; output is always
/// tab-separated with trimmed values. Rows failing a criterion are counted
/// under that rejection reason, never treated as errors.
pub fn slim(
    input: &Utf8Path,
    output: &Utf8Path,
    profile: EnaProfile,
) -> Result<EnaSlimReport, CuratorError> {
    if !input.as_std_path().exists() {
        return Err(CuratorError::InputNotFound(input.as_std_path().to_path_buf()));
    }

    let reader = DelimitedReader::open(input.as_std_path())?;
    let missing = reader.missing_columns(columns(profile));
    if !missing.is_empty() {
        return Err(CuratorError::MissingColumns {
            path: input.as_std_path().to_path_buf(),
            missing,
        });
    }

    let mut writer = DelimitedWriter::create(output.as_std_path(), b'\t')?;
    writer.write_record(columns(profile))?;

    let mut rows_in = 0u64;
    let mut rows_out = 0u64;
    let mut skipped = EnaSkipCounts::default();

    for row in reader {
        let row = row?;
        rows_in += 1;

        if row.field("study_accession").is_empty() || row.field("run_accession").is_empty() {
            skipped.missing_identifiers += 1;
            continue;
        }

        if criteria::parse_count(row.field("read_count")) < MIN_READ_COUNT {
            skipped.low_read_count += 1;
            continue;
        }

        if !criteria::is_shotgun_strategy(
            row.field("library_strategy"),
            profile.accepted_strategy_prefixes(),
            profile.excluded_strategy_terms(),
        ) {
            skipped.non_shotgun_strategy += 1;
            continue;
        }

        if !criteria::eq_ignore_case(row.field("library_selection"), KEEP_LIBRARY_SELECTION) {
            skipped.non_random_selection += 1;
            continue;
        }

        if !criteria::eq_ignore_case(row.field("library_source"), KEEP_LIBRARY_SOURCE) {
            skipped.non_metagenomic_source += 1;
            continue;
        }

        if profile.requires_organism()
            && !criteria::eq_ignore_case(row.field("scientific_name"), KEEP_SCIENTIFIC_NAME)
        {
            skipped.wrong_organism += 1;
            continue;
        }

        let record: Vec<&str> = columns(profile)
            .iter()
            .map(|column| row.field(column))
            .collect();
        writer.write_record(&record)?;
        rows_out += 1;
    }
    writer.flush()?;

    tracing::debug!(rows_in, rows_out, "ena slim finished");
    Ok(EnaSlimReport {
        profile,
        rows_in,
        rows_out,
        skipped,
        output: output.to_path_buf(),
    })
}
