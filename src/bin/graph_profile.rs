//! Dataset profiling tool for choosing a k-mer length.
//!
//! For every requested k it reports:
//! - Read length statistics
//! - Total and distinct k-mer counts
//! - Graph size and degree imbalance
//! - Contig statistics from a full assembly run
//! - A suggested k (largest N50, fewest contigs on ties)

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use debruijn_rs::{
    extract_distinct_kmers, extract_kmers, read_sequences, AssemblyStats, DeBruijnGraph,
    DegreeSummary, PathAssembler,
};

#[derive(Parser, Debug)]
#[command(name = "graph_profile")]
#[command(about = "Profile reads and their de Bruijn graphs across k-mer lengths")]
struct Args {
    /// FASTA/FASTQ file of reads
    input: PathBuf,

    /// Comma separated k-mer lengths to try
    #[arg(long, value_delimiter = ',', default_values_t = vec![21, 31, 50])]
    kmer_lens: Vec<usize>,

    /// Keep only the first occurrence of each k-mer when assembling
    #[arg(long)]
    distinct_kmers: bool,

    /// Output the profile as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ReadStats {
    count: usize,
    mean_length: f32,
    min_length: usize,
    max_length: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
struct KmerProfile {
    k: usize,
    kmers: usize,
    distinct_kmers: usize,
    nodes: usize,
    edges: usize,
    degrees: DegreeSummary,
    assembly: AssemblyStats,
    restarts: usize,
    dead_ends: usize,
}

#[derive(Debug, serde::Serialize)]
struct DatasetProfile {
    reads: ReadStats,
    per_k: Vec<KmerProfile>,
    suggested_k: Option<usize>,
}

fn read_stats(reads: &[String]) -> ReadStats {
    if reads.is_empty() {
        return ReadStats {
            count: 0,
            mean_length: 0.0,
            min_length: 0,
            max_length: 0,
        };
    }
    let lengths: Vec<usize> = reads.iter().map(String::len).collect();
    ReadStats {
        count: reads.len(),
        mean_length: lengths.iter().sum::<usize>() as f32 / lengths.len() as f32,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
    }
}

fn profile_k(reads: &[String], k: usize, distinct: bool) -> KmerProfile {
    let kmers = if distinct {
        extract_distinct_kmers(reads, k)
    } else {
        extract_kmers(reads, k)
    };
    let distinct_kmers = kmers.iter().collect::<HashSet<_>>().len();

    let mut graph = DeBruijnGraph::from_kmers(&kmers);
    let degrees = graph.degree_summary();
    let (nodes, edges) = (graph.num_nodes(), graph.num_edges());
    let assembly = PathAssembler::new(&mut graph).run();
    let contigs = assembly.contigs(&graph);

    KmerProfile {
        k,
        kmers: kmers.len(),
        distinct_kmers,
        nodes,
        edges,
        degrees,
        assembly: AssemblyStats::from_contigs(&contigs),
        restarts: assembly.restarts(),
        dead_ends: assembly.dead_ends,
    }
}

fn suggest_k(per_k: &[KmerProfile]) -> Option<usize> {
    per_k
        .iter()
        .filter(|p| p.assembly.contigs > 0)
        .max_by(|a, b| {
            a.assembly
                .n50
                .cmp(&b.assembly.n50)
                .then(b.assembly.contigs.cmp(&a.assembly.contigs))
        })
        .map(|p| p.k)
}

fn print_profile(profile: &DatasetProfile, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }

    println!("=== Dataset Profile ===\n");
    println!("Reads: {}", profile.reads.count);
    println!(
        "  Length: {:.1} bp (range: {}-{})",
        profile.reads.mean_length, profile.reads.min_length, profile.reads.max_length
    );

    for p in &profile.per_k {
        println!("\nk = {}:", p.k);
        println!("  K-mers: {} ({} distinct)", p.kmers, p.distinct_kmers);
        println!("  Graph: {} nodes, {} edges", p.nodes, p.edges);
        println!(
            "  Degrees: {} start / {} end candidates, {} balanced, Eulerian path: {}",
            p.degrees.start_candidates,
            p.degrees.end_candidates,
            p.degrees.balanced,
            p.degrees.admits_eulerian_path
        );
        println!(
            "  Contigs: {} ({} bp, longest {}, N50 {}), {} restarts, {} dead ends",
            p.assembly.contigs,
            p.assembly.total_len,
            p.assembly.longest,
            p.assembly.n50,
            p.restarts,
            p.dead_ends
        );
    }

    match profile.suggested_k {
        Some(k) => println!("\n=== Suggested k ===\n{k}"),
        None => println!("\nNo k produced any contigs"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = Args::parse();

    eprintln!("Profiling {}...", args.input.display());
    let reads = read_sequences(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let per_k: Vec<KmerProfile> = args
        .kmer_lens
        .iter()
        .filter(|&&k| k >= 2)
        .map(|&k| profile_k(&reads, k, args.distinct_kmers))
        .collect();
    let profile = DatasetProfile {
        reads: read_stats(&reads),
        suggested_k: suggest_k(&per_k),
        per_k,
    };

    print_profile(&profile, args.json)
}
