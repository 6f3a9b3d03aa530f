//! Per-query merge of archive exports sharing one header (ENA `read_run`
//! flavor), with key-based deduplication and provenance tracking.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::discover;
use crate::domain::QueryId;
use crate::error::CuratorError;
use crate::table::{DelimitedReader, DelimitedWriter};

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Pattern for the per-query exports, e.g. `raw_data/ena/per_query/*.read_run.tsv`.
    pub pattern: String,
    pub outdir: Utf8PathBuf,
    /// Column to deduplicate on, e.g. `run_accession` or `study_accession`.
    pub dedup_key: String,
    /// Filename suffix stripped to obtain the query identifier.
    pub suffix: String,
    /// Keep every row in the merged output; only the key listing is
    /// deduplicated.
    pub keep_all_rows: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryStats {
    pub query_id: String,
    pub input_rows: u64,
    pub written_rows: u64,
    pub unique_keys: u64,
}

#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub files_processed: u64,
    pub input_rows: u64,
    pub unique_keys: u64,
    pub written_rows: u64,
    pub per_query: Vec<QueryStats>,
    pub merged_path: Utf8PathBuf,
    pub dedup_path: Utf8PathBuf,
    pub summary_path: Utf8PathBuf,
}

/// Merges all files matching the pattern, in lexicographic path order.
///
/// The first file's header becomes the reference; any later file whose
/// header differs aborts the merge. Unless `keep_all_rows` is set, at most
/// one row per key value survives (first seen wins) and rows with a blank
/// key are dropped from the merged output, though they still count toward
/// per-query input totals.
pub fn merge_per_query(options: &MergeOptions) -> Result<MergeReport, CuratorError> {
    let paths = discover::expand(&options.pattern)?;
    if paths.is_empty() {
        return Err(CuratorError::NoInputFiles(options.pattern.clone()));
    }

    let merged_path = options.outdir.join("merged_runs.tsv");
    let dedup_path = options.outdir.join("dedup_keys.tsv");
    let summary_path = options.outdir.join("summary.tsv");

    let mut merged = DelimitedWriter::create(merged_path.as_std_path(), b'\t')?;
    let mut header_ref: Option<Vec<String>> = None;

    // key value -> queries that produced it, kept even for rows that were
    // deduplicated away.
    let mut key_to_queries: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut per_query = Vec::new();

    let mut files_processed = 0u64;
    let mut input_rows_total = 0u64;
    let mut written_total = 0u64;

    for path in &paths {
        files_processed += 1;
        let query_id = QueryId::from_path(path, &options.suffix);
        tracing::debug!(path = %path.display(), query = %query_id, "merging per-query file");

        let reader = match DelimitedReader::open_with_delimiter(path, b'\t') {
            Ok(reader) => reader,
            Err(CuratorError::EmptyInput(_)) => continue,
            Err(err) => return Err(err),
        };

        match &header_ref {
            None => {
                let mut record = vec!["query_id".to_string()];
                record.extend(reader.header().iter().cloned());
                merged.write_record(&record)?;
                header_ref = Some(reader.header().to_vec());
            }
            Some(expected) => {
                if reader.header() != expected.as_slice() {
                    return Err(CuratorError::HeaderMismatch {
                        path: path.clone(),
                        expected: expected.clone(),
                        found: reader.header().to_vec(),
                    });
                }
            }
        }

        let mut input_rows = 0u64;
        let mut written_rows = 0u64;
        let mut unique_in_file: HashSet<String> = HashSet::new();

        for row in reader {
            let row = row?;
            input_rows += 1;
            input_rows_total += 1;

            let key = row.field(&options.dedup_key).to_string();
            if !key.is_empty() {
                key_to_queries
                    .entry(key.clone())
                    .or_default()
                    .insert(query_id.as_str().to_string());
                unique_in_file.insert(key.clone());
            }

            if !options.keep_all_rows {
                if key.is_empty() || seen.contains(&key) {
                    continue;
                }
                seen.insert(key);
            }

            let mut record = vec![query_id.as_str()];
            record.extend(row.values_padded());
            merged.write_record(&record)?;
            written_rows += 1;
            written_total += 1;
        }

        per_query.push(QueryStats {
            query_id: query_id.as_str().to_string(),
            input_rows,
            written_rows,
            unique_keys: unique_in_file.len() as u64,
        });
    }
    merged.flush()?;

    let mut dedup = DelimitedWriter::create(dedup_path.as_std_path(), b'\t')?;
    dedup.write_record([options.dedup_key.as_str(), "query_ids"])?;
    for (key, queries) in &key_to_queries {
        let joined = queries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        dedup.write_record([key.as_str(), joined.as_str()])?;
    }
    dedup.flush()?;

    let mut summary = DelimitedWriter::create(summary_path.as_std_path(), b'\t')?;
    summary.write_record([
        "query_id".to_string(),
        "input_rows".to_string(),
        "written_rows".to_string(),
        format!("unique_{}_in_query", options.dedup_key),
    ])?;
    for stats in &per_query {
        summary.write_record([
            stats.query_id.clone(),
            stats.input_rows.to_string(),
            stats.written_rows.to_string(),
            stats.unique_keys.to_string(),
        ])?;
    }
    summary.flush()?;

    Ok(MergeReport {
        files_processed,
        input_rows: input_rows_total,
        unique_keys: key_to_queries.len() as u64,
        written_rows: written_total,
        per_query,
        merged_path,
        dedup_path,
        summary_path,
    })
}
