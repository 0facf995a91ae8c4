//! Ordered edge sequence for splicing sub-cycles into a growing circuit.
//!
//! Backed by an implicit treap over an arena indexed by [`EdgeId`], so inserting a
//! block at a position and asking for the position of an edge both take
//! O(log n) expected time. Every edge can be placed at most once.

use crate::graph::EdgeId;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    left: Option<usize>,
    right: Option<usize>,
    parent: Option<usize>,
    size: usize,
    priority: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Circuit {
    slots: Vec<Slot>,
    root: Option<usize>,
}

/// Deterministic heap priority for an edge index.
fn priority(idx: usize) -> u64 {
    let mut z = (idx as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl Circuit {
    pub(crate) fn with_capacity(edges: usize) -> Self {
        Self {
            slots: vec![Slot::default(); edges],
            root: None,
        }
    }

    /// Forget the current sequence; slots of placed edges are reset on reuse.
    pub(crate) fn clear(&mut self) {
        self.root = None;
    }

    pub(crate) fn len(&self) -> usize {
        self.size(self.root)
    }

    /// Zero-based position of `edge`, which must have been placed.
    pub(crate) fn position(&self, edge: EdgeId) -> usize {
        let mut node = edge.0;
        let mut rank = self.size(self.slots[node].left);
        while let Some(parent) = self.slots[node].parent {
            if self.slots[parent].right == Some(node) {
                rank += self.size(self.slots[parent].left) + 1;
            }
            node = parent;
        }
        rank
    }

    /// Insert `block`, in order, so that its first edge ends up at position `at`.
    pub(crate) fn insert(&mut self, at: usize, block: &[EdgeId]) {
        let mut inserted = None;
        for &edge in block {
            let idx = self.place(edge);
            inserted = self.merge(inserted, Some(idx));
        }
        let at = at.min(self.len());
        let (before, after) = self.split(self.root, at);
        let joined = self.merge(before, inserted);
        self.root = self.merge(joined, after);
        self.detach(self.root);
    }

    /// Edges in sequence order.
    pub(crate) fn to_vec(&self) -> Vec<EdgeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = Vec::new();
        let mut cursor = self.root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = self.slots[node].left;
            }
            if let Some(node) = stack.pop() {
                out.push(EdgeId(node));
                cursor = self.slots[node].right;
            }
        }
        out
    }

    fn place(&mut self, edge: EdgeId) -> usize {
        if edge.0 >= self.slots.len() {
            self.slots.resize(edge.0 + 1, Slot::default());
        }
        self.slots[edge.0] = Slot {
            size: 1,
            priority: priority(edge.0),
            ..Slot::default()
        };
        edge.0
    }

    fn size(&self, node: Option<usize>) -> usize {
        node.map_or(0, |idx| self.slots[idx].size)
    }

    fn update(&mut self, idx: usize) {
        let size = 1 + self.size(self.slots[idx].left) + self.size(self.slots[idx].right);
        self.slots[idx].size = size;
    }

    fn detach(&mut self, node: Option<usize>) {
        if let Some(idx) = node {
            self.slots[idx].parent = None;
        }
    }

    fn set_left(&mut self, idx: usize, child: Option<usize>) {
        self.slots[idx].left = child;
        if let Some(child) = child {
            self.slots[child].parent = Some(idx);
        }
    }

    fn set_right(&mut self, idx: usize, child: Option<usize>) {
        self.slots[idx].right = child;
        if let Some(child) = child {
            self.slots[child].parent = Some(idx);
        }
    }

    /// Split into the first `k` elements and the rest.
    fn split(&mut self, node: Option<usize>, k: usize) -> (Option<usize>, Option<usize>) {
        let Some(idx) = node else {
            return (None, None);
        };
        let left_size = self.size(self.slots[idx].left);
        if k <= left_size {
            let (a, b) = self.split(self.slots[idx].left, k);
            self.set_left(idx, b);
            self.update(idx);
            self.detach(a);
            self.detach(Some(idx));
            (a, Some(idx))
        } else {
            let (a, b) = self.split(self.slots[idx].right, k - left_size - 1);
            self.set_right(idx, a);
            self.update(idx);
            self.detach(b);
            self.detach(Some(idx));
            (Some(idx), b)
        }
    }

    /// Concatenate two sequences, `a` first.
    fn merge(&mut self, a: Option<usize>, b: Option<usize>) -> Option<usize> {
        match (a, b) {
            (None, other) | (other, None) => other,
            (Some(a), Some(b)) => {
                if self.slots[a].priority > self.slots[b].priority {
                    let right = self.merge(self.slots[a].right, Some(b));
                    self.set_right(a, right);
                    self.update(a);
                    Some(a)
                } else {
                    let left = self.merge(Some(a), self.slots[b].left);
                    self.set_left(b, left);
                    self.update(b);
                    Some(b)
                }
            }
        }
    }
}
