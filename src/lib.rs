//! debruijn_rs: contig assembly from short reads via a de Bruijn graph.
//!
//! Reads are cut into k-mers, each k-mer becomes an edge between its prefix and
//! suffix (k-1)-mers, and a greedy Eulerian traversal turns the edges into contigs.

pub mod assembler;
mod circuit;
pub mod contig;
pub mod graph;
pub mod kmer;
pub mod output;
pub mod read_source;

pub use assembler::{Assembly, AssemblyConfig, ContigPath, PathAssembler, DEFAULT_KMER_LEN};
pub use contig::{render_edges, split_synthetic, AssemblyStats};
pub use graph::{DeBruijnGraph, DegreeSummary, Edge, EdgeId, Node, NodeId};
pub use kmer::{extract_distinct_kmers, extract_kmers, kmers};
pub use output::{export_graph_json, write_contigs, write_contigs_to_path, DEFAULT_OUTPUT_FILE};
pub use read_source::{read_sequences, ReadSourceError};

/// Everything produced by [`assemble_reads`].
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    pub contigs: Vec<String>,
    pub stats: AssemblyStats,
    pub graph: DeBruijnGraph,
    pub assembly: Assembly,
    pub kmer_count: usize,
}

/// K-mers of a read set wired into a graph, ready for path assembly.
#[derive(Debug, Clone)]
pub struct KmerGraph {
    pub graph: DeBruijnGraph,
    pub kmer_count: usize,
}

/// Cut `reads` into k-mers and build the de Bruijn graph over them.
pub fn build_graph(reads: &[String], config: &AssemblyConfig) -> KmerGraph {
    let kmers = if config.distinct_kmers {
        extract_distinct_kmers(reads, config.kmer_len)
    } else {
        extract_kmers(reads, config.kmer_len)
    };
    log::info!(
        "Extracted {} k-mers (k={}) from {} reads",
        kmers.len(),
        config.kmer_len,
        reads.len()
    );

    let graph = DeBruijnGraph::from_kmers(&kmers);
    log::info!(
        "Graph has {} nodes and {} edges",
        graph.num_nodes(),
        graph.num_edges()
    );
    KmerGraph {
        graph,
        kmer_count: kmers.len(),
    }
}

impl KmerGraph {
    /// Consume every edge into contigs.
    pub fn assemble(self, config: &AssemblyConfig) -> AssemblyOutcome {
        let KmerGraph {
            mut graph,
            kmer_count,
        } = self;
        let assembly = PathAssembler::new(&mut graph)
            .with_balancing(config.balance)
            .run();
        let contigs = assembly.contigs(&graph);
        let stats = AssemblyStats::from_contigs(&contigs);
        log::info!(
            "Assembled {} contigs, {} bp total, longest {}, N50 {} ({} restarts, {} dead ends)",
            stats.contigs,
            stats.total_len,
            stats.longest,
            stats.n50,
            assembly.restarts(),
            assembly.dead_ends
        );

        AssemblyOutcome {
            contigs,
            stats,
            graph,
            assembly,
            kmer_count,
        }
    }
}

/// Run the whole reads -> k-mers -> graph -> contigs pipeline.
pub fn assemble_reads(reads: &[String], config: &AssemblyConfig) -> AssemblyOutcome {
    build_graph(reads, config).assemble(config)
}
