//! De Bruijn graph construction over an arena of nodes and edges.
//!
//! Nodes are (k-1)-mers, edges are k-mers. Both live in vectors and refer to each
//! other through [`NodeId`] / [`EdgeId`], so the prefix node can record its outgoing
//! edges while each edge points back at its endpoints without ownership cycles.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;

/// Index of a node in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Index of an edge in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub usize);

/// A (k-1)-mer together with its degree counters and outgoing-edge record.
#[derive(Debug, Clone)]
pub struct Node {
    value: String,
    edges: Vec<EdgeId>,
    in_degree: usize,
    out_degree: usize,
}

impl Node {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            edges: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Outgoing edges in the order they were added, consumed or not.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    /// More incoming than outgoing edges: a candidate path end.
    pub fn is_parent(&self) -> bool {
        self.in_degree > self.out_degree
    }

    /// More outgoing than incoming edges: a candidate path start.
    pub fn is_child(&self) -> bool {
        self.out_degree > self.in_degree
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A directed edge. `synthetic` marks the temporary balancing edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub value: String,
    pub synthetic: bool,
}

/// Degree statistics over all nodes of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DegreeSummary {
    /// Nodes with out-degree > in-degree.
    pub start_candidates: usize,
    /// Nodes with in-degree > out-degree.
    pub end_candidates: usize,
    pub balanced: usize,
    /// Nodes with incoming edges only.
    pub sinks: usize,
    /// Nodes with outgoing edges only.
    pub sources: usize,
    /// True when at most one node has out = in + 1, at most one has in = out + 1
    /// and every other node is balanced.
    pub admits_eulerian_path: bool,
}

/// De Bruijn graph with destructively drained adjacency queues.
#[derive(Debug, Clone, Default)]
pub struct DeBruijnGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, NodeId>,
    adjacency: Vec<VecDeque<EdgeId>>,
    remaining: usize,
}

impl DeBruijnGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph with one edge per k-mer, in iteration order.
    pub fn from_kmers<I, S>(kmers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for kmer in kmers {
            graph.add_kmer(kmer.as_ref());
        }
        log::debug!(
            "Built de Bruijn graph with {} nodes and {} edges",
            graph.num_nodes(),
            graph.num_edges()
        );
        graph
    }

    /// Add the edge prefix(kmer) -> suffix(kmer). Duplicate k-mers become parallel edges.
    pub fn add_kmer(&mut self, kmer: &str) -> EdgeId {
        let prefix = match kmer.char_indices().last() {
            Some((last, _)) => &kmer[..last],
            None => "",
        };
        let suffix = match kmer.chars().next() {
            Some(first) => &kmer[first.len_utf8()..],
            None => "",
        };
        let source = self.resolve_node(prefix);
        let target = self.resolve_node(suffix);
        self.push_edge(source, target, kmer.to_owned(), false)
    }

    /// Return the node for `value`, creating it on first sight.
    pub fn resolve_node(&mut self, value: &str) -> NodeId {
        if let Some(&id) = self.index.get(value) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(value));
        self.adjacency.push(VecDeque::new());
        self.index.insert(value.to_owned(), id);
        id
    }

    /// Add the temporary balancing edge `parent -> child`.
    ///
    /// Its value is the parent's (k-1)-mer followed by the last character of the child.
    pub fn add_synthetic_edge(&mut self, parent: NodeId, child: NodeId) -> EdgeId {
        let mut value = self.nodes[parent.0].value.clone();
        if let Some(last) = self.nodes[child.0].value.chars().last() {
            value.push(last);
        }
        self.push_edge(parent, child, value, true)
    }

    fn push_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        value: String,
        synthetic: bool,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            value,
            synthetic,
        });
        self.adjacency[source.0].push_back(id);
        self.remaining += 1;
        self.nodes[source.0].edges.push(id);
        self.nodes[source.0].out_degree += 1;
        self.nodes[target.0].in_degree += 1;
        id
    }

    /// Pop the oldest unconsumed outgoing edge of `node`.
    pub fn take_next_edge(&mut self, node: NodeId) -> Option<EdgeId> {
        let edge = self.adjacency.get_mut(node.0)?.pop_front()?;
        self.remaining -= 1;
        Some(edge)
    }

    pub fn has_unconsumed(&self, node: NodeId) -> bool {
        self.adjacency
            .get(node.0)
            .map_or(false, |queue| !queue.is_empty())
    }

    /// Unconsumed outgoing edges of `node`, oldest first.
    pub fn unconsumed(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency
            .get(node.0)
            .into_iter()
            .flat_map(|queue| queue.iter().copied())
    }

    /// Edges not yet taken by a traversal.
    pub fn remaining_edges(&self) -> usize {
        self.remaining
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn node_id(&self, value: &str) -> Option<NodeId> {
        self.index.get(value).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(idx, edge)| (EdgeId(idx), edge))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Total edges including a synthetic edge if one was added.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn degree_summary(&self) -> DegreeSummary {
        let mut summary = DegreeSummary::default();
        let mut irregular = false;
        for node in &self.nodes {
            if node.is_child() {
                summary.start_candidates += 1;
                irregular |= node.out_degree - node.in_degree > 1;
            } else if node.is_parent() {
                summary.end_candidates += 1;
                irregular |= node.in_degree - node.out_degree > 1;
            } else {
                summary.balanced += 1;
            }
            if node.in_degree > 0 && node.out_degree == 0 {
                summary.sinks += 1;
            }
            if node.out_degree > 0 && node.in_degree == 0 {
                summary.sources += 1;
            }
        }
        summary.admits_eulerian_path =
            !irregular && summary.start_candidates <= 1 && summary.end_candidates <= 1;
        summary
    }

    /// One line per node with unconsumed edges: `node target target ...`.
    pub fn adjacency_listing(&self) -> String {
        let mut out = String::from("Adjacency list:\n");
        for (id, node) in self.nodes() {
            if !self.has_unconsumed(id) {
                continue;
            }
            out.push_str(&node.value);
            for edge in self.unconsumed(id) {
                out.push(' ');
                out.push_str(&self.node(self.edge(edge).target).value);
            }
            out.push('\n');
        }
        out
    }

    /// Every node value with its degrees, in creation order.
    pub fn node_listing(&self) -> String {
        let mut out = String::from("Node list:\n");
        for node in &self.nodes {
            out.push_str(&format!(
                "{} in={} out={}\n",
                node.value, node.in_degree, node.out_degree
            ));
        }
        out
    }
}
