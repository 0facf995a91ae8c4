//! Restart-driven Eulerian path assembly over a [`DeBruijnGraph`].
//!
//! The assembler balances the graph once with a single temporary edge, then walks
//! closed sub-cycles out of the adjacency queues and splices them together. When no
//! visited node has edges left, or a walk strands on an empty queue, the current
//! contig is finalised and the outer loop starts a new one from the remaining edges.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, trace};

use crate::circuit::Circuit;
use crate::contig::{render_edges, split_synthetic};
use crate::graph::{DeBruijnGraph, EdgeId, NodeId};

/// Default k-mer length used by the command line tool.
pub const DEFAULT_KMER_LEN: usize = 50;

/// Options for the reads -> contigs pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Length of the k-mers (edges); nodes are one shorter.
    pub kmer_len: usize,
    /// Drop repeated k-mers before building the graph.
    pub distinct_kmers: bool,
    /// Add one temporary parent -> child edge before the first contig.
    pub balance: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            kmer_len: DEFAULT_KMER_LEN,
            distinct_kmers: false,
            balance: true,
        }
    }
}

/// Edges of one contig in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigPath {
    pub edges: Vec<EdgeId>,
    /// The walk ends on the node it started from.
    pub closed: bool,
    pub sub_cycles: usize,
}

/// Result of one assembler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub paths: Vec<ContigPath>,
    /// The balancing edge, if one was added.
    pub synthetic_edge: Option<EdgeId>,
    pub dead_ends: usize,
}

impl Assembly {
    /// Contigs started after the first one.
    pub fn restarts(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Edge sequences as rendered: the synthetic edge removed from the contig holding it.
    pub fn rendered_paths(&self, graph: &DeBruijnGraph) -> Vec<Vec<EdgeId>> {
        let mut out = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            match self.synthetic_edge {
                Some(synthetic) if path.edges.contains(&synthetic) => {
                    out.extend(split_synthetic(graph, path, synthetic));
                }
                _ => out.push(path.edges.clone()),
            }
        }
        out
    }

    /// Nucleotide string of every contig, in assembly order.
    pub fn contigs(&self, graph: &DeBruijnGraph) -> Vec<String> {
        self.rendered_paths(graph)
            .iter()
            .map(|edges| render_edges(graph, edges))
            .collect()
    }
}

enum Walk {
    /// Returned to the node the walk started on.
    Closed(Vec<EdgeId>),
    /// Stopped on a node with an empty queue.
    DeadEnd(Vec<EdgeId>),
}

/// Single-use traversal state over a mutable graph.
pub struct PathAssembler<'g> {
    graph: &'g mut DeBruijnGraph,
    balance: bool,
    balance_attempted: bool,
    consumed: Vec<bool>,
    circuit: Circuit,
    synthetic: Option<EdgeId>,
    dead_ends: usize,
}

impl<'g> PathAssembler<'g> {
    pub fn new(graph: &'g mut DeBruijnGraph) -> Self {
        let consumed = vec![false; graph.num_nodes()];
        // One spare slot for the balancing edge.
        let circuit = Circuit::with_capacity(graph.num_edges() + 1);
        Self {
            graph,
            balance: true,
            balance_attempted: false,
            consumed,
            circuit,
            synthetic: None,
            dead_ends: 0,
        }
    }

    pub fn with_balancing(mut self, balance: bool) -> Self {
        self.balance = balance;
        self
    }

    /// Consume every edge of the graph into contigs.
    pub fn run(mut self) -> Assembly {
        if log::log_enabled!(log::Level::Trace) {
            trace!("{}", self.graph.adjacency_listing());
        }
        let mut paths = Vec::new();
        while self.graph.remaining_edges() > 0 {
            let Some(start) = self.choose_start() else {
                debug!("No start node available; stopping with {} contigs", paths.len());
                break;
            };
            match self.assemble_contig(start) {
                Some(path) => {
                    debug!(
                        "Contig {} finished: {} edges, {} sub-cycles, closed={}, {} edges left",
                        paths.len() + 1,
                        path.edges.len(),
                        path.sub_cycles,
                        path.closed,
                        self.graph.remaining_edges()
                    );
                    paths.push(path);
                }
                None => break,
            }
        }
        Assembly {
            paths,
            synthetic_edge: self.synthetic,
            dead_ends: self.dead_ends,
        }
    }

    /// Pick where the next contig starts, balancing the graph on the first call.
    fn choose_start(&mut self) -> Option<NodeId> {
        let mut parent = None;
        let mut child = None;
        for (id, node) in self.graph.nodes() {
            if self.consumed[id.0] {
                continue;
            }
            if parent.is_none() && node.is_parent() {
                parent = Some(id);
            }
            if child.is_none() && node.is_child() {
                child = Some(id);
            }
        }

        let first_pass = !self.balance_attempted;
        self.balance_attempted = true;
        if self.balance && first_pass {
            if let (Some(parent), Some(child)) = (parent, child) {
                let edge = self.graph.add_synthetic_edge(parent, child);
                debug!(
                    "Balanced graph with temporary edge {} -> {}",
                    self.graph.node(parent),
                    self.graph.node(child)
                );
                self.synthetic = Some(edge);
                return Some(child);
            }
        }

        child
            .or_else(|| self.first_with_edges(true))
            .or_else(|| self.first_with_edges(false))
    }

    fn first_with_edges(&self, unconsumed_only: bool) -> Option<NodeId> {
        self.graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| !unconsumed_only || !self.consumed[id.0])
            .find(|&id| self.graph.has_unconsumed(id))
    }

    fn assemble_contig(&mut self, start: NodeId) -> Option<ContigPath> {
        if !self.graph.has_unconsumed(start) {
            return None;
        }
        self.circuit.clear();
        // First outgoing edge of each node in current circuit order.
        let mut first_out: HashMap<NodeId, EdgeId> = HashMap::new();
        // Visited nodes whose queues still hold edges.
        let mut pending: BTreeSet<NodeId> = BTreeSet::new();
        let mut sub_cycles = 0;
        let mut from = start;

        loop {
            match self.walk(from, &mut pending) {
                Walk::Closed(cycle) => {
                    sub_cycles += 1;
                    let at = self.splice(&mut first_out, from, &cycle);
                    trace!(
                        "Sub-cycle of {} edges from {} spliced at {}",
                        cycle.len(),
                        self.graph.node(from),
                        at
                    );
                }
                Walk::DeadEnd(tail) => {
                    self.dead_ends += 1;
                    debug!(
                        "Dead end after {} edges from {}",
                        tail.len(),
                        self.graph.node(from)
                    );
                    let mut edges = rotate_to(self.graph, &self.circuit.to_vec(), from);
                    edges.extend(tail);
                    return Some(ContigPath {
                        edges,
                        closed: false,
                        sub_cycles,
                    });
                }
            }

            match pending.first() {
                Some(&next) => from = next,
                None => break,
            }
        }

        Some(ContigPath {
            edges: self.circuit.to_vec(),
            closed: true,
            sub_cycles,
        })
    }

    /// Follow queue heads from `from` until the walk comes back or strands.
    fn walk(&mut self, from: NodeId, pending: &mut BTreeSet<NodeId>) -> Walk {
        let mut edges = Vec::new();
        let mut current = from;
        self.visit(from, pending);
        loop {
            let Some(edge) = self.graph.take_next_edge(current) else {
                return Walk::DeadEnd(edges);
            };
            if !self.graph.has_unconsumed(current) {
                pending.remove(&current);
            }
            edges.push(edge);
            current = self.graph.edge(edge).target;
            self.visit(current, pending);
            if current == from {
                return Walk::Closed(edges);
            }
        }
    }

    fn visit(&mut self, node: NodeId, pending: &mut BTreeSet<NodeId>) {
        self.consumed[node.0] = true;
        if self.graph.has_unconsumed(node) {
            pending.insert(node);
        }
    }

    /// Insert `cycle` before the first circuit edge leaving `node`, or append it.
    ///
    /// Edges sharing a value share a prefix and therefore a source node, so the first
    /// edge leaving `node` is the first one whose value is on `node`'s outgoing record.
    fn splice(
        &mut self,
        first_out: &mut HashMap<NodeId, EdgeId>,
        node: NodeId,
        cycle: &[EdgeId],
    ) -> usize {
        let at = match first_out.get(&node) {
            Some(&edge) => self.circuit.position(edge),
            None => self.circuit.len(),
        };

        let mut seen = HashSet::new();
        for &edge in cycle {
            let source = self.graph.edge(edge).source;
            if !seen.insert(source) {
                continue;
            }
            let earlier = first_out
                .get(&source)
                .is_some_and(|&first| self.circuit.position(first) < at);
            if !earlier {
                first_out.insert(source, edge);
            }
        }
        self.circuit.insert(at, cycle);
        at
    }
}

/// Rotate a closed walk so it starts with the first edge leaving `node`.
///
/// Walks that never leave `node` are returned unchanged.
pub(crate) fn rotate_to(graph: &DeBruijnGraph, path: &[EdgeId], node: NodeId) -> Vec<EdgeId> {
    match path.iter().position(|&edge| graph.edge(edge).source == node) {
        Some(at) => path[at..].iter().chain(&path[..at]).copied().collect(),
        None => path.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(graph: &DeBruijnGraph, edges: &[EdgeId]) -> Vec<String> {
        edges.iter().map(|&e| graph.edge(e).value.clone()).collect()
    }

    #[test]
    fn balanced_circuit_needs_no_synthetic_edge() {
        let mut graph = DeBruijnGraph::from_kmers(["AAC", "ACA", "CAA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.synthetic_edge, None);
        assert_eq!(assembly.paths.len(), 1);
        assert!(assembly.paths[0].closed);
        assert_eq!(values(&graph, &assembly.paths[0].edges), vec!["AAC", "ACA", "CAA"]);
        assert_eq!(assembly.contigs(&graph), vec!["AACAA"]);
        assert_eq!(graph.remaining_edges(), 0);
    }

    #[test]
    fn sub_cycles_are_spliced_before_the_reconnecting_edge() {
        let mut graph =
            DeBruijnGraph::from_kmers(["AAC", "ACA", "CAA", "CAG", "AGC", "GCA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.paths.len(), 1);
        let path = &assembly.paths[0];
        assert_eq!(path.sub_cycles, 2);
        assert_eq!(
            values(&graph, &path.edges),
            vec!["AAC", "ACA", "CAG", "AGC", "GCA", "CAA"]
        );
        assert_eq!(assembly.contigs(&graph), vec!["AACAGCAA"]);
    }

    #[test]
    fn single_imbalance_is_balanced_then_excluded() {
        let mut graph = DeBruijnGraph::from_kmers(["ATG", "TGC", "GCG", "CGT", "GTA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        let synthetic = assembly.synthetic_edge.expect("balancing edge");
        assert!(graph.edge(synthetic).synthetic);
        assert_eq!(graph.node(graph.edge(synthetic).source).value(), "TA");
        assert_eq!(graph.node(graph.edge(synthetic).target).value(), "AT");
        assert_eq!(assembly.paths.len(), 1);
        assert_eq!(assembly.paths[0].edges.last(), Some(&synthetic));
        assert_eq!(assembly.contigs(&graph), vec!["ATGCGTA"]);
    }

    #[test]
    fn balancing_can_be_disabled() {
        let mut graph = DeBruijnGraph::from_kmers(["ATG", "TGC", "GCG"]);
        let assembly = PathAssembler::new(&mut graph).with_balancing(false).run();

        assert_eq!(assembly.synthetic_edge, None);
        assert_eq!(assembly.dead_ends, 1);
        assert!(!assembly.paths[0].closed);
        assert_eq!(assembly.contigs(&graph), vec!["ATGCG"]);
    }

    #[test]
    fn disconnected_circuits_become_separate_contigs() {
        let mut graph =
            DeBruijnGraph::from_kmers(["AAC", "ACA", "CAA", "GGT", "GTG", "TGG"]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.synthetic_edge, None);
        assert_eq!(assembly.restarts(), 1);
        assert_eq!(assembly.contigs(&graph), vec!["AACAA", "GGTGG"]);
    }

    #[test]
    fn disconnected_paths_restart_from_remaining_start_node() {
        let mut graph = DeBruijnGraph::from_kmers(["ATG", "TGC", "CCA", "CAA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.paths.len(), 2);
        assert_eq!(assembly.contigs(&graph), vec!["ATGC", "CCAA"]);
    }

    #[test]
    fn duplicate_kmers_leave_a_fragment_contig() {
        let mut graph =
            DeBruijnGraph::from_kmers(["ATG", "TGC", "GCG", "GCG", "CGT", "GTA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        let contigs = assembly.contigs(&graph);
        assert_eq!(contigs, vec!["ATGCGTA", "GCG"]);
        let rendered: usize = assembly.rendered_paths(&graph).iter().map(Vec::len).sum();
        assert_eq!(rendered, 6);
    }

    #[test]
    fn dead_end_after_splice_keeps_walk_contiguous() {
        // AC -> CG -> GT closes through the balancing edge GT -> AC; CG -> GA strands.
        let mut graph = DeBruijnGraph::from_kmers(["ACG", "CGT", "CGA"]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.paths.len(), 1);
        assert_eq!(assembly.dead_ends, 1);
        let path = &assembly.paths[0];
        assert!(!path.closed);
        assert_eq!(path.sub_cycles, 1);
        assert_eq!(path.edges.len(), 4);
        for pair in path.edges.windows(2) {
            assert_eq!(graph.edge(pair[0]).target, graph.edge(pair[1]).source);
        }

        // The balancing edge sits mid-walk, so the contig is cut around it.
        assert_eq!(assembly.contigs(&graph), vec!["CGT", "ACGA"]);
        let rendered: usize = assembly.rendered_paths(&graph).iter().map(Vec::len).sum();
        assert_eq!(rendered, 3);
    }

    #[test]
    fn homopolymer_self_loops_form_one_circuit() {
        let n = 100_000;
        let kmer = "A".repeat(31);
        let mut graph = DeBruijnGraph::from_kmers(vec![kmer.as_str(); n]);
        assert_eq!(graph.num_nodes(), 1);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.synthetic_edge, None);
        assert_eq!(assembly.paths.len(), 1);
        let path = &assembly.paths[0];
        assert!(path.closed);
        assert_eq!(path.sub_cycles, n);
        // Each one-edge sub-cycle goes in front of the previous one.
        assert_eq!(path.edges.first(), Some(&EdgeId(n - 1)));
        assert_eq!(path.edges.last(), Some(&EdgeId(0)));
        assert_eq!(assembly.contigs(&graph), vec!["A".repeat(31 + n - 1)]);
    }

    #[test]
    fn splice_follows_current_circuit_order() {
        // AA -> AC -> CA -> AA, then AC -> CA -> AG -> GA -> AC goes in before ACA,
        // so AC's first outgoing edge is now the second ACA. The last loop through
        // CT and TC must land in front of that one.
        let mut graph = DeBruijnGraph::from_kmers([
            "AAC", "ACA", "CAA", "CAG", "AGA", "GAC", "ACA", "ACT", "CTC", "TCA", "CAC",
        ]);
        let assembly = PathAssembler::new(&mut graph).run();

        assert_eq!(assembly.synthetic_edge, None);
        assert_eq!(assembly.paths.len(), 1);
        let path = &assembly.paths[0];
        assert!(path.closed);
        assert_eq!(path.sub_cycles, 3);
        assert_eq!(
            path.edges,
            [0, 7, 8, 9, 10, 6, 3, 4, 5, 1, 2].map(EdgeId).to_vec()
        );
        for pair in path.edges.windows(2) {
            assert_eq!(graph.edge(pair[0]).target, graph.edge(pair[1]).source);
        }
        assert_eq!(assembly.contigs(&graph), vec!["AACTCACAGACAA"]);
    }

    #[test]
    fn empty_graph_yields_no_contigs() {
        let mut graph = DeBruijnGraph::new();
        let assembly = PathAssembler::new(&mut graph).run();
        assert!(assembly.paths.is_empty());
        assert!(assembly.contigs(&graph).is_empty());
    }

    #[test]
    fn rotate_starts_at_first_edge_leaving_node() {
        let graph = DeBruijnGraph::from_kmers(["AAC", "ACA", "CAA"]);
        let path = vec![EdgeId(0), EdgeId(1), EdgeId(2)];
        let ca = graph.node_id("CA").unwrap();
        assert_eq!(rotate_to(&graph, &path, ca), vec![EdgeId(2), EdgeId(0), EdgeId(1)]);
    }
}
