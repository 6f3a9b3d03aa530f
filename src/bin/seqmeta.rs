use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use seqmeta_curator::criteria::{
    EnaProfile, KEEP_LIBRARY_COMBINED, KEEP_LIBRARY_SELECTION, KEEP_LIBRARY_SOURCE,
    KEEP_SCIENTIFIC_NAME, MIN_READ_COUNT,
};
use seqmeta_curator::ena;
use seqmeta_curator::error::CuratorError;
use seqmeta_curator::merge::{self, MergeOptions};
use seqmeta_curator::output::{JsonOutput, OutputMode};
use seqmeta_curator::sra;
use seqmeta_curator::unify;

#[derive(Parser)]
#[command(name = "seqmeta")]
#[command(about = "Merge, filter, and reconcile ENA/SRA sequencing-read metadata exports")]
#[command(version, author)]
struct Cli {
    /// Print the run summary as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Merge ENA per-query exports, deduplicating rows by a key column")]
    MergeQueries(MergeQueriesArgs),
    #[command(about = "Filter one ENA export down to the curated slim schema")]
    SlimEna(SlimEnaArgs),
    #[command(about = "Filter one SRA export down to the curated slim schema")]
    SlimSra(SlimSraArgs),
    #[command(about = "Combine slimmed ENA and SRA tables, deduplicating by run accession")]
    MergeArchives(MergeArchivesArgs),
    #[command(about = "Merge per-project SRA runinfo listings, deduplicating by Run")]
    MergeRuninfo(MergeRuninfoArgs),
}

#[derive(Args)]
struct MergeQueriesArgs {
    /// Pattern for per-query exports, e.g. "raw_data/ena/per_query/*.read_run.tsv".
    #[arg(long)]
    glob: String,

    #[arg(long)]
    outdir: Utf8PathBuf,

    /// Column to deduplicate on. Common alternative: study_accession.
    #[arg(long, default_value = "run_accession")]
    dedup_key: String,

    /// Filename suffix stripped to obtain the query identifier.
    #[arg(long, default_value = ".read_run.tsv")]
    suffix: String,

    /// Write every row; only the key listing is deduplicated.
    #[arg(long)]
    keep_all_rows: bool,
}

#[derive(Args)]
struct SlimEnaArgs {
    input: Utf8PathBuf,
    output: Utf8PathBuf,

    #[arg(long, value_enum, default_value_t = EnaProfile::Extended)]
    profile: EnaProfile,
}

#[derive(Args)]
struct SlimSraArgs {
    input: Utf8PathBuf,
    output: Utf8PathBuf,
}

#[derive(Args)]
struct MergeArchivesArgs {
    ena_input: Utf8PathBuf,
    sra_input: Utf8PathBuf,
    output: Utf8PathBuf,
}

#[derive(Args)]
struct MergeRuninfoArgs {
    #[arg(default_value = "sra_out_runinfo")]
    input_dir: Utf8PathBuf,

    #[arg(default_value = "sra_merged_runs.csv")]
    output: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(curator) = report.downcast_ref::<CuratorError>() {
            return ExitCode::from(map_exit_code(curator));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CuratorError) -> u8 {
    match error {
        CuratorError::NoInputFiles(_)
        | CuratorError::InvalidPattern(_)
        | CuratorError::InputNotFound(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::MergeQueries(args) => run_merge_queries(args, output_mode),
        Commands::SlimEna(args) => run_slim_ena(args, output_mode),
        Commands::SlimSra(args) => run_slim_sra(args, output_mode),
        Commands::MergeArchives(args) => run_merge_archives(args, output_mode),
        Commands::MergeRuninfo(args) => run_merge_runinfo(args, output_mode),
    }
}

fn run_merge_queries(args: MergeQueriesArgs, output_mode: OutputMode) -> miette::Result<()> {
    let options = MergeOptions {
        pattern: args.glob,
        outdir: args.outdir,
        dedup_key: args.dedup_key,
        suffix: args.suffix,
        keep_all_rows: args.keep_all_rows,
    };
    let report = merge::merge_per_query(&options).map_err(miette::Report::new)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_merge(&report).into_diagnostic()?,
        OutputMode::Human => {
            println!("DONE");
            println!("Files processed: {}", report.files_processed);
            println!("Total input rows read: {}", report.input_rows);
            println!(
                "Unique {} values: {}",
                options.dedup_key, report.unique_keys
            );
            if options.keep_all_rows {
                println!("Total rows merged: {}", report.written_rows);
            } else {
                println!(
                    "Unique rows written (deduped by {}): {}",
                    options.dedup_key, report.written_rows
                );
            }
            println!("Wrote: {}", report.merged_path);
            println!("Wrote: {}", report.dedup_path);
            println!("Wrote: {}", report.summary_path);
        }
    }
    Ok(())
}

fn run_slim_ena(args: SlimEnaArgs, output_mode: OutputMode) -> miette::Result<()> {
    let report = ena::slim(&args.input, &args.output, args.profile).map_err(miette::Report::new)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_ena_slim(&report).into_diagnostic()?,
        OutputMode::Human => {
            println!(
                "Done. Read {} rows, wrote {} rows to {}",
                report.rows_in, report.rows_out, report.output
            );
            println!(
                "Skipped (read_count < {MIN_READ_COUNT}): {}",
                report.skipped.low_read_count
            );
            println!(
                "Skipped (not WGS or excluded strategy terms): {}",
                report.skipped.non_shotgun_strategy
            );
            println!(
                "Skipped (library_selection != {KEEP_LIBRARY_SELECTION}): {}",
                report.skipped.non_random_selection
            );
            println!(
                "Skipped (library_source != {KEEP_LIBRARY_SOURCE}): {}",
                report.skipped.non_metagenomic_source
            );
            if args.profile.requires_organism() {
                println!(
                    "Skipped (scientific_name != '{KEEP_SCIENTIFIC_NAME}'): {}",
                    report.skipped.wrong_organism
                );
            }
            if report.skipped.missing_identifiers > 0 {
                println!(
                    "Skipped (missing study_accession or run_accession): {}",
                    report.skipped.missing_identifiers
                );
            }
        }
    }
    Ok(())
}

fn run_slim_sra(args: SlimSraArgs, output_mode: OutputMode) -> miette::Result<()> {
    let report = sra::slim(&args.input, &args.output).map_err(miette::Report::new)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_sra_slim(&report).into_diagnostic()?,
        OutputMode::Human => {
            println!(
                "Done. Read {} rows, wrote {} rows to {}",
                report.rows_in, report.rows_out, report.output
            );
            println!("Skipped (missing Run): {}", report.skipped.missing_run);
            println!(
                "Skipped (missing BioProject): {}",
                report.skipped.missing_bioproject
            );
            println!(
                "Skipped (spots < {MIN_READ_COUNT}): {}",
                report.skipped.low_spot_count
            );
            println!(
                "Skipped (ScientificName != '{KEEP_SCIENTIFIC_NAME}'): {}",
                report.skipped.wrong_organism
            );
            println!(
                "Skipped (LibrarySource != '{KEEP_LIBRARY_SOURCE}'): {}",
                report.skipped.non_metagenomic_source
            );
            println!(
                "Skipped (library != '{KEEP_LIBRARY_COMBINED}'): {}",
                report.skipped.wrong_library
            );
        }
    }
    Ok(())
}

fn run_merge_archives(args: MergeArchivesArgs, output_mode: OutputMode) -> miette::Result<()> {
    let report = unify::merge_archives(&args.ena_input, &args.sra_input, &args.output)
        .map_err(miette::Report::new)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_unify(&report).into_diagnostic()?,
        OutputMode::Human => {
            println!("Wrote {} rows -> {}", report.written_rows, report.output);
            println!(
                "Dedup by run accession: dropped {} duplicate rows",
                report.dropped_duplicates
            );
            if report.skipped_missing_run > 0 {
                println!(
                    "Rows skipped (missing run accession): {}",
                    report.skipped_missing_run
                );
            }
        }
    }
    Ok(())
}

fn run_merge_runinfo(args: MergeRuninfoArgs, output_mode: OutputMode) -> miette::Result<()> {
    let report =
        sra::merge_runinfo(&args.input_dir, &args.output).map_err(miette::Report::new)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_runinfo(&report).into_diagnostic()?,
        OutputMode::Human => {
            println!("Input files: {}", report.files_processed);
            println!("Total rows read: {}", report.rows_in);
            println!("Unique runs written: {}", report.written_rows);
            if report.skipped_missing_run > 0 {
                println!(
                    "Rows skipped (missing Run): {}",
                    report.skipped_missing_run
                );
            }
            println!("Output: {}", report.output);
        }
    }
    Ok(())
}
