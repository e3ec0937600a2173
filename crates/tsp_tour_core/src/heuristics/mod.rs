//! Heuristic tour construction behind the [`TourSolver`] seam.

pub mod annealing;
mod christofides;
mod greedy;

use tsp_tour_derive::CliValue;

use crate::{
    Error, Result,
    graph::{NodeKey, WeightedGraph},
    tour::Tour,
};

pub use annealing::{AnnealMove, AnnealingParams, SimulatedAnnealing};
pub use christofides::Christofides;
pub use greedy::Greedy;

/// Produces a tour for a weighted graph.
///
/// Solvers return closed cycles: the start node is repeated at the end, so
/// [`crate::tour::tour_cost`] includes the return leg.
pub trait TourSolver<N: NodeKey> {
    fn name(&self) -> &'static str;

    fn solve(&self, graph: &WeightedGraph<N>) -> Result<Tour<N>>;
}

/// Heuristics selectable from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "heuristics")]
pub enum Heuristic {
    #[cli(alias = "nearest-neighbor", alias = "nn")]
    Greedy,
    #[cli(alias = "simulated-annealing", alias = "sa")]
    Annealing,
    Christofides,
}

impl Heuristic {
    /// Human-readable label used in the printed results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Greedy => "Nearest Neighbor",
            Self::Annealing => "Simulated Annealing",
            Self::Christofides => "Christofides",
        }
    }

    /// Parses a comma separated list such as `greedy,annealing`.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        let heuristics = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;
        if heuristics.is_empty() {
            return Err(Error::invalid_input(
                "--heuristics needs at least one of greedy|annealing|christofides",
            ));
        }
        Ok(heuristics)
    }

    pub fn solver<N: NodeKey>(&self, params: &AnnealingParams) -> Box<dyn TourSolver<N>> {
        match self {
            Self::Greedy => Box::new(Greedy),
            Self::Annealing => Box::new(SimulatedAnnealing::new(params.clone())),
            Self::Christofides => Box::new(Christofides),
        }
    }
}

/// Rejects graphs no tour can be built on.
pub(crate) fn ensure_not_empty<N: NodeKey>(graph: &WeightedGraph<N>, solver: &str) -> Result<()> {
    if graph.is_empty() {
        return Err(Error::invalid_input(format!("{solver}: graph has no nodes")));
    }
    Ok(())
}
