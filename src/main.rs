//! Command-line front-end for merging BWT files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bwt_merge::{Error, Fmi, FormatKind, MergeParameters};

#[derive(Debug, Parser)]
#[command(name = "bwt_merge")]
#[command(about = "Merges BWT files into a single BWT", long_about = None)]
#[command(version)]
struct Cli {
    /// Input BWT files followed by the output file
    #[arg(required = true, num_args = 3..)]
    files: Vec<PathBuf>,

    /// Thread buffer size in megabytes
    #[arg(short = 'b', long, default_value_t = 256)]
    buffer_size: usize,

    /// Number of merge buffers
    #[arg(short = 'm', long, default_value_t = 6)]
    merge_buffers: usize,

    /// Run buffer size in megabytes
    #[arg(short = 'r', long, default_value_t = 8)]
    run_buffer: usize,

    /// Total number of sequence blocks (defaults to 4 per thread)
    #[arg(short = 's', long)]
    sequence_blocks: Option<usize>,

    /// Number of worker threads (defaults to all cores)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Directory for temporary rank array files
    #[arg(short = 'd', long, default_value = ".")]
    temp_dir: PathBuf,

    /// Verify the merge with the patterns in this file
    #[arg(short = 'v', long)]
    verify: Option<PathBuf>,

    /// Input formats, comma-separated: one entry for all inputs, or one
    /// per input (native, plain, plain_sorted, rfm, sdsl, ropebwt, sga)
    #[arg(short = 'i', long, default_value = "native")]
    input_format: String,

    /// Output format
    #[arg(short = 'o', long, default_value = "native")]
    output_format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let (output, inputs) = cli
        .files
        .split_last()
        .expect("clap guarantees at least three files");

    let input_formats = parse_input_formats(&cli.input_format, inputs.len())?;
    let output_format: FormatKind = cli.output_format.parse()?;

    let threads = cli
        .threads
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
    let params = MergeParameters {
        threads,
        seq_blocks: cli.sequence_blocks.unwrap_or(4 * threads),
        run_buffer_size: MergeParameters::run_buffer_from_mb(cli.run_buffer),
        thread_buffer_size: MergeParameters::thread_buffer_from_mb(cli.buffer_size),
        merge_buffers: cli.merge_buffers,
        temp_dir: cli.temp_dir.clone(),
        ..MergeParameters::default()
    }
    .sanitized();

    let patterns = match &cli.verify {
        Some(path) => read_patterns(path)?,
        None => Vec::new(),
    };
    let mut expected = vec![0u64; patterns.len()];

    let mut result: Option<Fmi> = None;
    for (path, format) in inputs.iter().zip(&input_formats) {
        let input = Fmi::load(path, *format)
            .with_context(|| format!("cannot load input {}", path.display()))?;
        info!(
            path = %path.display(),
            size = input.len(),
            sequences = input.sequences(),
            "loaded input"
        );
        for (count, pattern) in expected.iter_mut().zip(&patterns) {
            *count += input.count(pattern.as_bytes());
        }
        result = Some(match result {
            None => input,
            Some(merged) => Fmi::merge(merged, input, &params)?,
        });
    }
    let merged = result.expect("at least two inputs");

    merged
        .save(output, output_format)
        .with_context(|| format!("cannot write output {}", output.display()))?;
    info!(
        path = %output.display(),
        size = merged.len(),
        sequences = merged.sequences(),
        "wrote output"
    );

    if !patterns.is_empty() {
        let mut mismatches = 0usize;
        for (pattern, &count) in patterns.iter().zip(&expected) {
            let found = merged.count(pattern.as_bytes());
            if found != count {
                warn!(pattern = %pattern, found, expected = count, "occurrence count mismatch");
                mismatches += 1;
            }
        }
        if mismatches > 0 {
            warn!(
                mismatches,
                patterns = patterns.len(),
                "verification found mismatches"
            );
        } else {
            info!(patterns = patterns.len(), "verification passed");
        }
    }

    Ok(())
}

fn parse_input_formats(spec: &str, inputs: usize) -> bwt_merge::Result<Vec<FormatKind>> {
    let formats: Vec<FormatKind> = spec
        .split(',')
        .map(|tag| tag.trim().parse::<FormatKind>())
        .collect::<bwt_merge::Result<_>>()?;
    match formats.len() {
        1 => Ok(vec![formats[0]; inputs]),
        n if n == inputs => Ok(formats),
        n => Err(Error::Config(format!(
            "{n} input formats given for {inputs} inputs"
        ))),
    }
}

/// Reads the pattern file, one pattern per line, skipping empty lines.
fn read_patterns(path: &std::path::Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read pattern file {}", path.display()))?;
    Ok(contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
