use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, trace, warn};

use debruijn_rs::{
    build_graph, export_graph_json, read_sequences, write_contigs_to_path, AssemblyConfig,
    AssemblyOutcome, DEFAULT_KMER_LEN, DEFAULT_OUTPUT_FILE,
};

/// Assemble reads into contigs with a de Bruijn graph
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// FASTA/FASTQ file of reads (optionally gzipped)
    input: PathBuf,

    /// Output FASTA path for the contigs
    #[arg(default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// K-mer length; non-numeric values fall back to the default
    kmer_len: Option<String>,

    /// Keep only the first occurrence of each k-mer. Overlapping reads then
    /// share their k-mers, so `ATGCG` and `GCGTA` at k=3 give the single contig
    /// `ATGCGTA` instead of `ATGCGTA` plus `GCG`
    #[arg(long)]
    distinct_kmers: bool,

    /// Do not add the temporary balancing edge
    #[arg(long)]
    no_balance: bool,

    /// Wrap contig lines to this width (0 = no-wrap)
    #[arg(long, default_value_t = 0)]
    fasta_line_width: usize,

    /// Optional output file for the assembly graph (JSON nodes and edges)
    #[arg(long)]
    export_graph_json: Option<PathBuf>,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

/// Parse the positional k-mer length, falling back to the default when it is
/// missing, non-numeric or too short to form a (k-1)-mer node.
fn resolve_kmer_len(raw: Option<&str>) -> usize {
    match raw.map(|value| value.trim().parse::<usize>()) {
        Some(Ok(k)) if k >= 2 => k,
        _ => {
            println!("Using default k-mer length: {DEFAULT_KMER_LEN}");
            DEFAULT_KMER_LEN
        }
    }
}

fn main() {
    let args = Args::parse();
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = AssemblyConfig {
        kmer_len: resolve_kmer_len(args.kmer_len.as_deref()),
        distinct_kmers: args.distinct_kmers,
        balance: !args.no_balance,
    };
    info!("input: {}", args.input.display());
    info!("output: {}", args.output.display());
    debug!("{config:?}");

    println!("Reading input file...");
    let reads = match read_sequences(&args.input) {
        Ok(reads) => reads,
        Err(error) => {
            eprintln!("Error reading input file. {error}");
            std::process::exit(1);
        }
    };

    let outcome = match run(&args, &config, &reads) {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("Error writing to file. {error:?}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.export_graph_json {
        if let Err(error) = export_graph(path, &outcome) {
            eprintln!("Error exporting assembly graph. {error:?}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, config: &AssemblyConfig, reads: &[String]) -> Result<AssemblyOutcome> {
    println!("Building de Bruijn graph...");
    let built = build_graph(reads, config);
    println!("Generating contigs...");
    let outcome = built.assemble(config);
    if log::log_enabled!(log::Level::Trace) {
        trace!("{}", outcome.graph.node_listing());
    }
    if outcome.contigs.is_empty() {
        warn!("No contigs from {} k-mers", outcome.kmer_count);
        println!("ERROR: Could not generate any contigs");
    }

    write_output(&args.output, &outcome.contigs, args.fasta_line_width)?;
    println!("Contigs written to: {}", args.output.display());
    Ok(outcome)
}

fn export_graph(path: &Path, outcome: &AssemblyOutcome) -> Result<()> {
    export_graph_json(&outcome.graph, path)
        .with_context(|| format!("Failed to export graph to {}", path.display()))
}

fn write_output(path: &Path, contigs: &[String], line_width: usize) -> Result<()> {
    write_contigs_to_path(path, contigs, line_width)
        .with_context(|| format!("Failed to write contigs to {}", path.display()))
}
