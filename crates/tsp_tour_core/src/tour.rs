use std::fmt;

use crate::{
    Error, Result,
    graph::{NodeId, NodeKey, WeightedGraph},
};

/// Sum of the weights between consecutive nodes of `tour`.
///
/// The path is treated as open: no edge from the last node back to the first
/// is added, so a closed cycle must repeat its start node to be costed as one.
/// Tours with fewer than two nodes cost nothing.
pub fn tour_cost<N: NodeKey>(graph: &WeightedGraph<N>, tour: &[N]) -> Result<f64> {
    tour.windows(2).try_fold(0.0, |total, pair| {
        graph
            .weight(pair[0], pair[1])
            .map(|weight| total + weight)
            .ok_or_else(|| Error::missing_edge(pair[0], pair[1]))
    })
}

/// Visiting order produced by a solver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tour<N: NodeKey = NodeId> {
    pub nodes: Vec<N>,
}

impl<N: NodeKey> Tour<N> {
    pub fn new(nodes: Vec<N>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the last node repeats the first one.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }

    /// Nodes in visiting order without the repeated start of a closed cycle.
    pub fn distinct_nodes(&self) -> &[N] {
        if self.is_closed() {
            &self.nodes[..self.nodes.len() - 1]
        } else {
            &self.nodes
        }
    }

    /// Consecutive `(from, to)` pairs in visiting order.
    pub fn legs(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn cost(&self, graph: &WeightedGraph<N>) -> Result<f64> {
        tour_cost(graph, &self.nodes)
    }

    pub fn metrics(&self, graph: &WeightedGraph<N>) -> Result<TourMetrics> {
        if self.nodes.len() < 2 {
            log::info!("metrics: n < 2 so there's nothing to report");
            return Ok(TourMetrics::default());
        }

        let legs = self
            .legs()
            .map(|(from, to)| graph.weight(from, to).ok_or_else(|| Error::missing_edge(from, to)))
            .collect::<Result<Vec<f64>>>()?;
        let total: f64 = legs.iter().sum();
        let longest = legs.iter().copied().fold(0.0_f64, f64::max);
        let average = total / legs.len() as f64;

        log::info!(
            "metrics: n={} legs={} total={total} longest={longest} avg={average:.2}",
            self.nodes.len(),
            legs.len()
        );

        Ok(TourMetrics {
            total,
            longest,
            average,
            legs: legs.len(),
        })
    }
}

impl<N: NodeKey> From<Vec<N>> for Tour<N> {
    fn from(nodes: Vec<N>) -> Self {
        Self::new(nodes)
    }
}

impl<N: NodeKey + fmt::Display> fmt::Display for Tour<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, node) in self.nodes.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("]")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TourMetrics {
    pub total: f64,
    pub longest: f64,
    pub average: f64,
    pub legs: usize,
}
