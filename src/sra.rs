//! SRA-side tools: the slim filter over one metadata export and the
//! run-level merge of per-project `runinfo` listings.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::criteria::{
    self, KEEP_LIBRARY_COMBINED, KEEP_LIBRARY_SOURCE, KEEP_SCIENTIFIC_NAME, MIN_READ_COUNT,
};
use crate::discover;
use crate::domain::{self, SeqType};
use crate::error::CuratorError;
use crate::table::{DelimitedReader, DelimitedWriter};

const REQUIRED_COLUMNS: &[&str] = &[
    "Run",
    "BioProject",
    "spots",
    "LibraryStrategy",
    "LibrarySelection",
    "LibrarySource",
    "ScientificName",
];

pub const SLIM_COLUMNS: &[&str] = &[
    "BioProject",
    "Run",
    "spots",
    "spots_with_mates",
    "SeqType",
    "SequencingMachine",
    "ScientificName",
    "LibraryStrategy",
    "LibrarySource",
];

#[derive(Debug, Default, Serialize)]
pub struct SraSkipCounts {
    pub missing_run: u64,
    pub missing_bioproject: u64,
    pub low_spot_count: u64,
    pub wrong_organism: u64,
    pub non_metagenomic_source: u64,
    pub wrong_library: u64,
}

#[derive(Debug, Serialize)]
pub struct SraSlimReport {
    pub rows_in: u64,
    pub rows_out: u64,
    pub skipped: SraSkipCounts,
    pub output: Utf8PathBuf,
}

/// Filters one SRA export into the slim schema.
///
/// Besides the fixed acceptance criteria this derives two fields:
/// `SeqType` from the paired/single layout indicator and
/// `SequencingMachine` from the model with a platform fallback. The
/// strategy and selection fields are combined into one `WGS/RANDOM`-style
/// value unless the strategy already carries the separator.
pub fn slim(input: &Utf8Path, output: &Utf8Path) -> Result<SraSlimReport, CuratorError> {
    if !input.as_std_path().exists() {
        return Err(CuratorError::InputNotFound(input.as_std_path().to_path_buf()));
    }

    let reader = DelimitedReader::open(input.as_std_path())?;
    let missing = reader.missing_columns(REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(CuratorError::MissingColumns {
            path: input.as_std_path().to_path_buf(),
            missing,
        });
    }

    let mut writer = DelimitedWriter::create(output.as_std_path(), b',')?;
    writer.write_record(SLIM_COLUMNS)?;

    let mut rows_in = 0u64;
    let mut rows_out = 0u64;
    let mut skipped = SraSkipCounts::default();

    for row in reader {
        let row = row?;
        rows_in += 1;

        let run = row.field("Run");
        if run.is_empty() {
            skipped.missing_run += 1;
            continue;
        }

        let bioproject = row.field("BioProject");
        if bioproject.is_empty() {
            skipped.missing_bioproject += 1;
            continue;
        }

        if criteria::parse_count(row.field("spots")) < MIN_READ_COUNT {
            skipped.low_spot_count += 1;
            continue;
        }

        if !criteria::eq_ignore_case(row.field("ScientificName"), KEEP_SCIENTIFIC_NAME) {
            skipped.wrong_organism += 1;
            continue;
        }

        if !criteria::eq_ignore_case(row.field("LibrarySource"), KEEP_LIBRARY_SOURCE) {
            skipped.non_metagenomic_source += 1;
            continue;
        }

        let combined = criteria::combined_strategy(
            row.field("LibraryStrategy"),
            row.field("LibrarySelection"),
        );
        if !criteria::eq_ignore_case(&combined, KEEP_LIBRARY_COMBINED) {
            skipped.wrong_library += 1;
            continue;
        }

        let seq_type = SeqType::from_layout(row.field("LibraryLayout")).unwrap_or(SeqType::Single);
        let machine = domain::sequencing_machine(row.field("Model"), row.field("Platform"));

        writer.write_record([
            bioproject,
            run,
            row.field("spots"),
            row.field("spots_with_mates"),
            seq_type.as_str(),
            machine.as_str(),
            row.field("ScientificName"),
            combined.as_str(),
            row.field("LibrarySource"),
        ])?;
        rows_out += 1;
    }
    writer.flush()?;

    tracing::debug!(rows_in, rows_out, "sra slim finished");
    Ok(SraSlimReport {
        rows_in,
        rows_out,
        skipped,
        output: output.to_path_buf(),
    })
}

#[derive(Debug, Serialize)]
pub struct RunInfoMergeReport {
    pub files_processed: u64,
    pub rows_in: u64,
    pub written_rows: u64,
    pub skipped_missing_run: u64,
    pub output: Utf8PathBuf,
}

/// Merges every `*.runinfo.csv` under `input_dir` into one table,
/// deduplicating strictly by `Run` (first seen wins). A project keeps all
/// of its runs. The first file's header is canonical: later files may
/// carry extra columns, which are dropped, and missing columns are emitted
/// blank. This is deliberately laxer than the per-query merge, where any
/// header drift is fatal.
pub fn merge_runinfo(
    input_dir: &Utf8Path,
    output: &Utf8Path,
) -> Result<RunInfoMergeReport, CuratorError> {
    let pattern = input_dir.join("*.runinfo.csv");
    let paths = discover::expand(pattern.as_str())?;
    if paths.is_empty() {
        return Err(CuratorError::NoInputFiles(pattern.into_string()));
    }

    let mut writer = DelimitedWriter::create(output.as_std_path(), b',')?;
    let mut canonical: Option<Vec<String>> = None;
    let mut seen_runs: HashSet<String> = HashSet::new();

    let mut files_processed = 0u64;
    let mut rows_in = 0u64;
    let mut written_rows = 0u64;
    let mut skipped_missing_run = 0u64;

    for path in &paths {
        files_processed += 1;
        tracing::debug!(path = %path.display(), "merging runinfo file");

        let reader = match DelimitedReader::open_with_delimiter(path, b',') {
            Ok(reader) => reader,
            Err(CuratorError::EmptyInput(_)) => continue,
            Err(err) => return Err(err),
        };

        if canonical.is_none() {
            if !reader.has_column("Run") {
                return Err(CuratorError::MissingColumns {
                    path: path.clone(),
                    missing: vec!["Run".to_string()],
                });
            }
            writer.write_record(reader.header())?;
            canonical = Some(reader.header().to_vec());
        }
        let Some(header) = canonical.as_deref() else {
            continue;
        };

        for row in reader {
            let row = row?;
            rows_in += 1;

            let run = row.field("Run");
            if run.is_empty() {
                skipped_missing_run += 1;
                continue;
            }
            if seen_runs.contains(run) {
                continue;
            }
            seen_runs.insert(run.to_string());

            let record: Vec<&str> = header.iter().map(|column| row.field(column)).collect();
            writer.write_record(&record)?;
            written_rows += 1;
        }
    }
    writer.flush()?;

    Ok(RunInfoMergeReport {
        files_processed,
        rows_in,
        written_rows,
        skipped_missing_run,
        output: output.to_path_buf(),
    })
}
