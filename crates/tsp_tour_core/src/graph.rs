use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    hash::Hash,
};

use crate::{Error, Result};

/// TSPLIB node identifiers are 1-based integers.
pub type NodeId = usize;

/// Anything usable as a node identifier.
pub trait NodeKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> NodeKey for T {}

/// Node set plus a weight for each stored pair.
///
/// Undirected graphs answer `weight(a, b)` and `weight(b, a)` with the same
/// value; directed graphs keep the two orientations apart.
#[derive(Clone, Debug)]
pub struct WeightedGraph<N: NodeKey = NodeId> {
    directed: bool,
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl<N: NodeKey> WeightedGraph<N> {
    pub fn new_undirected() -> Self {
        Self::empty(false)
    }

    pub fn new_directed() -> Self {
        Self::empty(true)
    }

    fn empty(directed: bool) -> Self {
        Self {
            directed,
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Inserts `node` if absent and returns its dense index.
    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, idx);
        self.adjacency.push(BTreeMap::new());
        idx
    }

    /// Stores `weight` for `(from, to)`, replacing any earlier value.
    pub fn add_edge(&mut self, from: N, to: N, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::invalid_data(format!(
                "edge {from:?} -> {to:?} has weight {weight}; weights must be finite and non-negative"
            )));
        }
        let i = self.add_node(from);
        let j = self.add_node(to);
        self.adjacency[i].insert(j, weight);
        if !self.directed {
            self.adjacency[j].insert(i, weight);
        }
        Ok(())
    }

    pub fn weight(&self, from: N, to: N) -> Option<f64> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        self.weight_at(i, j)
    }

    pub fn weight_at(&self, i: usize, j: usize) -> Option<f64> {
        self.adjacency.get(i)?.get(&j).copied()
    }

    /// Like [`Self::weight_at`] but reports the missing pair by node id.
    pub fn require_weight_at(&self, i: usize, j: usize) -> Result<f64> {
        self.weight_at(i, j)
            .ok_or_else(|| Error::missing_edge(self.nodes[i], self.nodes[j]))
    }

    pub fn index_of(&self, node: N) -> Option<usize> {
        self.index.get(&node).copied()
    }

    pub fn node_at(&self, idx: usize) -> N {
        self.nodes[idx]
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outgoing `(neighbor index, weight)` pairs of the node at `idx`.
    pub fn neighbors_at(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[idx].iter().map(|(&j, &w)| (j, w))
    }

    /// Every stored edge once. Undirected edges are reported with the lower
    /// index first.
    pub fn edges(&self) -> Vec<(N, N, f64)> {
        let mut edges = Vec::new();
        for (i, row) in self.adjacency.iter().enumerate() {
            for (&j, &w) in row {
                if self.directed || i <= j {
                    edges.push((self.nodes[i], self.nodes[j], w));
                }
            }
        }
        edges
    }

    pub fn edge_count(&self) -> usize {
        if self.directed {
            return self.adjacency.iter().map(BTreeMap::len).sum();
        }
        self.adjacency
            .iter()
            .enumerate()
            .map(|(i, row)| row.keys().filter(|&&j| i <= j).count())
            .sum()
    }

    /// True when every ordered pair of distinct nodes has a weight.
    pub fn is_complete(&self) -> bool {
        let n = self.node_count();
        self.adjacency
            .iter()
            .enumerate()
            .all(|(i, row)| row.keys().filter(|&&j| j != i).count() == n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::WeightedGraph;

    #[test]
    fn undirected_edges_answer_both_orientations() {
        let mut graph = WeightedGraph::new_undirected();
        graph.add_edge(1, 2, 3.0).expect("add edge");

        assert_eq!(graph.weight(1, 2), Some(3.0));
        assert_eq!(graph.weight(2, 1), Some(3.0));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges(), vec![(1, 2, 3.0)]);
    }

    #[test]
    fn directed_edges_keep_orientations_apart() {
        let mut graph = WeightedGraph::new_directed();
        graph.add_edge('a', 'b', 1.0).expect("add edge");
        graph.add_edge('b', 'a', 9.0).expect("add edge");

        assert_eq!(graph.weight('a', 'b'), Some(1.0));
        assert_eq!(graph.weight('b', 'a'), Some(9.0));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn later_edge_replaces_earlier_weight() {
        let mut graph = WeightedGraph::new_undirected();
        graph.add_edge(1, 2, 3.0).expect("add edge");
        graph.add_edge(2, 1, 5.0).expect("add edge");

        assert_eq!(graph.weight(1, 2), Some(5.0));
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut graph: WeightedGraph<u32> = WeightedGraph::new_undirected();
        let first = graph.add_node(7);
        let second = graph.add_node(7);

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node_at(first), 7);
    }

    #[test]
    fn unknown_nodes_and_missing_pairs_have_no_weight() {
        let mut graph = WeightedGraph::new_undirected();
        graph.add_edge(1, 2, 3.0).expect("add edge");
        graph.add_node(3);

        assert_eq!(graph.weight(1, 3), None);
        assert_eq!(graph.weight(1, 42), None);
        let err = graph.require_weight_at(0, 2).expect_err("missing pair");
        assert!(err.is_lookup());
        assert!(err.to_string().contains("between 1 and 3"));
    }

    #[test]
    fn rejects_negative_and_non_finite_weights() {
        let mut graph = WeightedGraph::new_undirected();
        assert!(graph.add_edge(1, 2, -1.0).is_err());
        assert!(graph.add_edge(1, 2, f64::NAN).is_err());
        assert!(graph.add_edge(1, 2, f64::INFINITY).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn is_complete_ignores_self_loops() {
        let mut graph = WeightedGraph::new_undirected();
        graph.add_edge(1, 1, 0.0).expect("add edge");
        graph.add_edge(1, 2, 1.0).expect("add edge");
        graph.add_edge(2, 3, 1.0).expect("add edge");
        assert!(!graph.is_complete());

        graph.add_edge(1, 3, 1.0).expect("add edge");
        assert!(graph.is_complete());
    }
}
