//! Turning edge walks into sequences, and summarising the result.

use serde::Serialize;

use crate::assembler::ContigPath;
use crate::graph::{DeBruijnGraph, EdgeId};

/// Spell out a walk: the first edge in full, then the last character of every
/// following edge (consecutive edges share the k-1 characters of their common node).
pub fn render_edges(graph: &DeBruijnGraph, edges: &[EdgeId]) -> String {
    let Some((&first, rest)) = edges.split_first() else {
        return String::new();
    };
    let mut sequence = graph.edge(first).value.clone();
    sequence.reserve(rest.len());
    for &edge in rest {
        if let Some(last) = graph.edge(edge).value.chars().last() {
            sequence.push(last);
        }
    }
    sequence
}

/// Remove the balancing edge from the contig that carries it.
///
/// A closed walk is rotated so the synthetic edge comes last and is then dropped,
/// leaving a single walk from the edge's target to its source. An open walk is cut
/// around the synthetic edge into up to two walks. Empty pieces are discarded.
pub fn split_synthetic(
    graph: &DeBruijnGraph,
    path: &ContigPath,
    synthetic: EdgeId,
) -> Vec<Vec<EdgeId>> {
    let Some(at) = path.edges.iter().position(|&edge| edge == synthetic) else {
        return vec![path.edges.clone()];
    };
    let pieces = if path.closed {
        let rotated: Vec<EdgeId> = path.edges[at + 1..]
            .iter()
            .chain(&path.edges[..at])
            .copied()
            .collect();
        vec![rotated]
    } else {
        vec![path.edges[..at].to_vec(), path.edges[at + 1..].to_vec()]
    };
    log::debug!(
        "Excluded balancing edge {} from a {} contig",
        graph.edge(synthetic).value,
        if path.closed { "closed" } else { "open" }
    );
    pieces.into_iter().filter(|piece| !piece.is_empty()).collect()
}

/// Length statistics over a set of contigs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub contigs: usize,
    pub total_len: usize,
    pub longest: usize,
    pub shortest: usize,
    pub n50: usize,
}

impl AssemblyStats {
    pub fn from_contigs<S: AsRef<str>>(contigs: &[S]) -> Self {
        let mut lengths: Vec<usize> = contigs.iter().map(|c| c.as_ref().len()).collect();
        if lengths.is_empty() {
            return Self::default();
        }
        lengths.sort_unstable_by(|a, b| b.cmp(a));
        let total_len: usize = lengths.iter().sum();

        let mut n50 = 0;
        let mut running = 0;
        for &len in &lengths {
            running += len;
            if running * 2 >= total_len {
                n50 = len;
                break;
            }
        }

        Self {
            contigs: lengths.len(),
            total_len,
            longest: lengths[0],
            shortest: lengths[lengths.len() - 1],
            n50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_first_edge_then_trailing_characters() {
        let graph = DeBruijnGraph::from_kmers(["ATG", "TGC", "GCG"]);
        let edges = vec![EdgeId(0), EdgeId(1), EdgeId(2)];
        assert_eq!(render_edges(&graph, &edges), "ATGCG");
        assert_eq!(render_edges(&graph, &edges[..1]), "ATG");
        assert_eq!(render_edges(&graph, &[]), "");
    }

    #[test]
    fn closed_walk_is_rotated_before_dropping_synthetic_edge() {
        let mut graph = DeBruijnGraph::from_kmers(["ATG", "TGC"]);
        let gc = graph.node_id("GC").unwrap();
        let at = graph.node_id("AT").unwrap();
        let synthetic = graph.add_synthetic_edge(gc, at);

        // TGC, GC->AT, ATG: the synthetic edge sits in the middle of the circuit.
        let path = ContigPath {
            edges: vec![EdgeId(1), synthetic, EdgeId(0)],
            closed: true,
            sub_cycles: 1,
        };
        let pieces = split_synthetic(&graph, &path, synthetic);
        assert_eq!(pieces, vec![vec![EdgeId(0), EdgeId(1)]]);
        assert_eq!(render_edges(&graph, &pieces[0]), "ATGC");
    }

    #[test]
    fn open_walk_is_cut_around_synthetic_edge() {
        let mut graph = DeBruijnGraph::from_kmers(["ATG", "TGC", "CAA"]);
        let gc = graph.node_id("GC").unwrap();
        let ca = graph.node_id("CA").unwrap();
        let synthetic = graph.add_synthetic_edge(gc, ca);

        let path = ContigPath {
            edges: vec![EdgeId(0), EdgeId(1), synthetic, EdgeId(2)],
            closed: false,
            sub_cycles: 0,
        };
        let pieces = split_synthetic(&graph, &path, synthetic);
        assert_eq!(pieces, vec![vec![EdgeId(0), EdgeId(1)], vec![EdgeId(2)]]);

        let trailing = ContigPath {
            edges: vec![EdgeId(0), EdgeId(1), synthetic],
            closed: false,
            sub_cycles: 0,
        };
        assert_eq!(
            split_synthetic(&graph, &trailing, synthetic),
            vec![vec![EdgeId(0), EdgeId(1)]]
        );
    }

    #[test]
    fn stats_report_n50() {
        let contigs = ["AAAAAAAAAA", "CCCCCC", "GGGG", "TT"];
        let stats = AssemblyStats::from_contigs(&contigs);
        assert_eq!(stats.contigs, 4);
        assert_eq!(stats.total_len, 22);
        assert_eq!(stats.longest, 10);
        assert_eq!(stats.shortest, 2);
        assert_eq!(stats.n50, 6);

        let empty: [&str; 0] = [];
        assert_eq!(AssemblyStats::from_contigs(&empty), AssemblyStats::default());
    }
}
