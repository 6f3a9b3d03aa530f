use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use seqmeta_curator::error::CuratorError;
use seqmeta_curator::unify;

const SRA_HEADER: &str = "BioProject,Run,spots,spots_with_mates,SeqType,SequencingMachine,\
ScientificName,LibraryStrategy,LibrarySource";

const ENA_HEADER: &str = "study_accession\trun_accession\tread_count\tlibrary_strategy\t\
library_source\tlibrary_selection\tlibrary_layout\tinstrument_platform\tinstrument_model\t\
scientific_name\ttax_id";

fn sra_row(run: &str) -> String {
    format!("PRJNA1,{run},150000,140000,paired,NovaSeq,Homo sapiens,WGS/RANDOM,METAGENOMIC")
}

fn ena_row(run: &str) -> String {
    format!(
        "PRJEB1\t{run}\t120000\tWGS\tMETAGENOMIC\tRANDOM\tPAIRED\tILLUMINA\tHiSeq 2500\t\
         Homo sapiens\t9606"
    )
}

fn write_inputs(
    temp: &tempfile::TempDir,
    sra_runs: &[&str],
    ena_runs: &[&str],
) -> (Utf8PathBuf, Utf8PathBuf, Utf8PathBuf) {
    let ena = Utf8PathBuf::from_path_buf(temp.path().join("ena_filtered.tsv")).unwrap();
    let sra = Utf8PathBuf::from_path_buf(temp.path().join("sra_filtered.csv")).unwrap();
    let out = Utf8PathBuf::from_path_buf(temp.path().join("merged/merged.csv")).unwrap();

    let mut sra_content = format!("{SRA_HEADER}\n");
    for run in sra_runs {
        sra_content.push_str(&sra_row(run));
        sra_content.push('\n');
    }
    fs::write(sra.as_std_path(), sra_content).unwrap();

    let mut ena_content = format!("{ENA_HEADER}\n");
    for run in ena_runs {
        ena_content.push_str(&ena_row(run));
        ena_content.push('\n');
    }
    fs::write(ena.as_std_path(), ena_content).unwrap();

    (ena, sra, out)
}

#[test]
fn disjoint_runs_concatenate_sra_first() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["SRR1", "SRR2"], &["ERR1", "ERR2"]);

    let report = unify::merge_archives(&ena, &sra, &out).unwrap();
    assert_eq!(report.sra_rows, 2);
    assert_eq!(report.ena_rows, 2);
    assert_eq!(report.written_rows, 4);
    assert_eq!(report.dropped_duplicates, 0);

    let written = fs::read_to_string(out.as_std_path()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines[0],
        "project_accession,run_accession,spots_or_reads,spots_with_mates,library_layout,\
         seq_type,instrument_platform,instrument_model,sequencing_machine,scientific_name,\
         library_strategy,library_selection,library_source,source_db"
    );
    // SRA rows first; composite strategy split, layout/platform/model blank.
    assert_eq!(
        lines[1],
        "PRJNA1,SRR1,150000,140000,,paired,,,NovaSeq,Homo sapiens,WGS,RANDOM,METAGENOMIC,SRA"
    );
    // ENA rows carry layout, inferred seq_type, and the model-based machine.
    assert_eq!(
        lines[3],
        "PRJEB1,ERR1,120000,,PAIRED,paired,ILLUMINA,HiSeq 2500,HiSeq 2500,Homo sapiens,\
         WGS,RANDOM,METAGENOMIC,ENA"
    );
}

#[test]
fn duplicate_run_across_archives_is_dropped_once() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["SRR1", "SHARED1"], &["SHARED1", "ERR2"]);

    let report = unify::merge_archives(&ena, &sra, &out).unwrap();
    assert_eq!(report.written_rows, 3);
    assert_eq!(report.dropped_duplicates, 1);

    // First-processed source wins: the surviving SHARED1 row is tagged SRA.
    let written = fs::read_to_string(out.as_std_path()).unwrap();
    let shared: Vec<&str> = written
        .lines()
        .filter(|line| line.contains("SHARED1"))
        .collect();
    assert_eq!(shared.len(), 1);
    assert!(shared[0].ends_with(",SRA"));
}

#[test]
fn ena_machine_falls_back_to_platform() {
    let temp = tempfile::tempdir().unwrap();
    let ena = Utf8PathBuf::from_path_buf(temp.path().join("ena.tsv")).unwrap();
    let sra = Utf8PathBuf::from_path_buf(temp.path().join("sra.csv")).unwrap();
    let out = Utf8PathBuf::from_path_buf(temp.path().join("merged.csv")).unwrap();

    fs::write(sra.as_std_path(), format!("{SRA_HEADER}\n")).unwrap();
    fs::write(
        ena.as_std_path(),
        format!(
            "{ENA_HEADER}\nPRJEB1\tERR1\t120000\tWGS\tMETAGENOMIC\tRANDOM\tSINGLE\tILLUMINA\t\
             \tHomo sapiens\t9606\n"
        ),
    )
    .unwrap();

    let report = unify::merge_archives(&ena, &sra, &out).unwrap();
    assert_eq!(report.written_rows, 1);

    let written = fs::read_to_string(out.as_std_path()).unwrap();
    let row = written.lines().nth(1).unwrap();
    assert_eq!(
        row,
        "PRJEB1,ERR1,120000,,SINGLE,single,ILLUMINA,,ILLUMINA,Homo sapiens,WGS,RANDOM,\
         METAGENOMIC,ENA"
    );
}

#[test]
fn blank_run_accessions_are_skipped_and_counted() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["", "SRR2"], &["ERR1"]);

    let report = unify::merge_archives(&ena, &sra, &out).unwrap();
    assert_eq!(report.written_rows, 2);
    assert_eq!(report.skipped_missing_run, 1);
}

#[test]
fn rerun_on_unchanged_inputs_is_byte_identical() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["SRR1", "SHARED1"], &["SHARED1", "ERR2"]);

    let first = unify::merge_archives(&ena, &sra, &out).unwrap();
    let written_first = fs::read(out.as_std_path()).unwrap();

    let second = unify::merge_archives(&ena, &sra, &out).unwrap();
    let written_second = fs::read(out.as_std_path()).unwrap();

    assert_eq!(first.written_rows, second.written_rows);
    assert_eq!(first.dropped_duplicates, second.dropped_duplicates);
    assert_eq!(written_first, written_second);
}

#[test]
fn empty_archive_input_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["SRR1"], &["ERR1"]);
    fs::write(sra.as_std_path(), "").unwrap();

    let err = unify::merge_archives(&ena, &sra, &out).unwrap_err();
    assert_matches!(err, CuratorError::EmptyInput(_));
}

#[test]
fn missing_columns_in_either_input_are_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let (ena, sra, out) = write_inputs(&temp, &["SRR1"], &["ERR1"]);
    fs::write(ena.as_std_path(), "run_accession\nERR1\n").unwrap();

    let err = unify::merge_archives(&ena, &sra, &out).unwrap_err();
    assert_matches!(err, CuratorError::MissingColumns { missing, .. } => {
        assert!(missing.contains(&"study_accession".to_string()));
    });
}

#[test]
fn missing_input_file_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let ena = Utf8PathBuf::from_path_buf(temp.path().join("absent.tsv")).unwrap();
    let sra = Utf8PathBuf::from_path_buf(temp.path().join("absent.csv")).unwrap();
    let out = Utf8PathBuf::from_path_buf(temp.path().join("merged.csv")).unwrap();

    let err = unify::merge_archives(&ena, &sra, &out).unwrap_err();
    assert_matches!(err, CuratorError::InputNotFound(_));
}
