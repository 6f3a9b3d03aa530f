//! Cross-archive merge: projects the slimmed SRA and ENA tables into one
//! unified schema, deduplicating globally by run accession.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::criteria;
use crate::domain::{self, SeqType, SourceDb};
use crate::error::CuratorError;
use crate::table::{DelimitedReader, DelimitedWriter};

pub const UNIFIED_COLUMNS: &[&str] = &[
    "project_accession",
    "run_accession",
    "spots_or_reads",
    "spots_with_mates",
    "library_layout",
    "seq_type",
    "instrument_platform",
    "instrument_model",
    "sequencing_machine",
    "scientific_name",
    "library_strategy",
    "library_selection",
    "library_source",
    "source_db",
];

const SRA_REQUIRED: &[&str] = &[
    "BioProject",
    "Run",
    "spots",
    "ScientificName",
    "LibraryStrategy",
    "LibrarySource",
];

const ENA_REQUIRED: &[&str] = &[
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
];

#[derive(Debug, Serialize)]
pub struct UnifyReport {
    pub sra_rows: u64,
    pub ena_rows: u64,
    pub written_rows: u64,
    pub dropped_duplicates: u64,
    pub skipped_missing_run: u64,
    pub output: Utf8PathBuf,
}

struct UnifyState {
    writer: DelimitedWriter,
    seen_runs: HashSet<String>,
    written_rows: u64,
    dropped_duplicates: u64,
    skipped_missing_run: u64,
}

/// Combines one slimmed file per archive into the unified schema.
///
/// The SRA file is processed first, then ENA; a run accession already seen
/// keeps its first row and the duplicate is dropped and counted. Either
/// input being empty, unreadable, or missing required columns is fatal.
pub fn merge_archives(
    ena_input: &Utf8Path,
    sra_input: &Utf8Path,
    output: &Utf8Path,
) -> Result<UnifyReport, CuratorError> {
    if !ena_input.as_std_path().exists() {
        return Err(CuratorError::InputNotFound(
            ena_input.as_std_path().to_path_buf(),
        ));
    }
    if !sra_input.as_std_path().exists() {
        return Err(CuratorError::InputNotFound(
            sra_input.as_std_path().to_path_buf(),
        ));
    }

    let mut writer = DelimitedWriter::create(output.as_std_path(), b',')?;
    writer.write_record(UNIFIED_COLUMNS)?;

    let mut state = UnifyState {
        writer,
        seen_runs: HashSet::new(),
        written_rows: 0,
        dropped_duplicates: 0,
        skipped_missing_run: 0,
    };

    let sra_rows = append_sra(&mut state, sra_input)?;
    let ena_rows = append_ena(&mut state, ena_input)?;
    state.writer.flush()?;

    Ok(UnifyReport {
        sra_rows,
        ena_rows,
        written_rows: state.written_rows,
        dropped_duplicates: state.dropped_duplicates,
        skipped_missing_run: state.skipped_missing_run,
        output: output.to_path_buf(),
    })
}

fn append_sra(state: &mut UnifyState, input: &Utf8Path) -> Result<u64, CuratorError> {
    let reader = DelimitedReader::open(input.as_std_path())?;
    let missing = reader.missing_columns(SRA_REQUIRED);
    if !missing.is_empty() {
        return Err(CuratorError::MissingColumns {
            path: input.as_std_path().to_path_buf(),
            missing,
        });
    }

    let mut rows_in = 0u64;
    for row in reader {
        let row = row?;
        rows_in += 1;

        let run = row.field("Run").to_string();
        if run.is_empty() {
            state.skipped_missing_run += 1;
            continue;
        }
        if state.seen_runs.contains(&run) {
            state.dropped_duplicates += 1;
            continue;
        }

        let (strategy, selection) =
            criteria::split_strategy_selection(row.field("LibraryStrategy"));

        // The SRA slim file has no layout or platform/model split; those
        // columns stay blank in the unified row.
        state.writer.write_record([
            row.field("BioProject"),
            run.as_str(),
            row.field("spots"),
            row.field("spots_with_mates"),
            "",
            row.field("SeqType"),
            "",
            "",
            row.field("SequencingMachine"),
            row.field("ScientificName"),
            strategy.as_str(),
            selection.as_str(),
            row.field("LibrarySource"),
            SourceDb::Sra.as_str(),
        ])?;
        state.seen_runs.insert(run);
        state.written_rows += 1;
    }
    tracing::debug!(rows_in, "appended sra rows");
    Ok(rows_in)
}

fn append_ena(state: &mut UnifyState, input: &Utf8Path) -> Result<u64, CuratorError> {
    let reader = DelimitedReader::open(input.as_std_path())?;
    let missing = reader.missing_columns(ENA_REQUIRED);
    if !missing.is_empty() {
        return Err(CuratorError::MissingColumns {
            path: input.as_std_path().to_path_buf(),
            missing,
        });
    }

    let mut rows_in = 0u64;
    for row in reader {
        let row = row?;
        rows_in += 1;

        let run = row.field("run_accession").to_string();
        if run.is_empty() {
            state.skipped_missing_run += 1;
            continue;
        }
        if state.seen_runs.contains(&run) {
            state.dropped_duplicates += 1;
            continue;
        }

        let layout = row.field("library_layout");
        let seq_type = SeqType::from_layout(layout)
            .map(SeqType::as_str)
            .unwrap_or("");
        let machine = domain::sequencing_machine(
            row.field("instrument_model"),
            row.field("instrument_platform"),
        );

        state.writer.write_record([
            row.field("study_accession"),
            run.as_str(),
            row.field("read_count"),
            "",
            layout,
            seq_type,
            row.field("instrument_platform"),
            row.field("instrument_model"),
            machine.as_str(),
            row.field("scientific_name"),
            row.field("library_strategy"),
            row.field("library_selection"),
            row.field("library_source"),
            SourceDb::Ena.as_str(),
        ])?;
        state.seen_runs.insert(run);
        state.written_rows += 1;
    }
    tracing::debug!(rows_in, "appended ena rows");
    Ok(rows_in)
}
