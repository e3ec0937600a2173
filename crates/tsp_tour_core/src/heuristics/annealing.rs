use rand::{Rng, SeedableRng, rngs::StdRng};
use tsp_tour_derive::CliValue;

use crate::{
    Error, Result,
    graph::{NodeKey, WeightedGraph},
    heuristics::{TourSolver, greedy::greedy_cycle},
    tour::Tour,
};

pub const DEFAULT_TEMPERATURE: f64 = 100.0;
pub const DEFAULT_ALPHA: f64 = 0.01;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_INNER_ITERATIONS: usize = 100;
pub const DEFAULT_SEED: u64 = 12_345;

/// Neighbourhood move applied to the interior of a closed cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "sa-move")]
pub enum AnnealMove {
    /// Swap two nodes.
    #[cli(name = "1-1", alias = "swap")]
    Swap,
    /// Take one node out and reinsert it elsewhere.
    #[cli(name = "1-0", alias = "relocate")]
    Relocate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnealingParams {
    pub temperature: f64,
    /// Fraction of the temperature removed after every outer iteration.
    pub alpha: f64,
    /// Outer iterations allowed without improving the best cycle.
    pub max_iterations: usize,
    pub inner_iterations: usize,
    pub movement: AnnealMove,
    pub seed: u64,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            alpha: DEFAULT_ALPHA,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            inner_iterations: DEFAULT_INNER_ITERATIONS,
            movement: AnnealMove::Swap,
            seed: DEFAULT_SEED,
        }
    }
}

impl AnnealingParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(Error::invalid_input("sa-temperature must be > 0"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::invalid_input("sa-alpha must be in (0, 1)"));
        }
        if self.inner_iterations == 0 {
            return Err(Error::invalid_input("sa-inner-iterations must be > 0"));
        }
        Ok(())
    }
}

/// Simulated annealing over closed cycles, seeded with the greedy cycle.
#[derive(Clone, Debug, Default)]
pub struct SimulatedAnnealing {
    params: AnnealingParams,
}

impl SimulatedAnnealing {
    pub fn new(params: AnnealingParams) -> Self {
        Self { params }
    }

    /// Anneals from a caller-provided closed cycle covering every node once.
    pub fn solve_from<N: NodeKey>(
        &self,
        graph: &WeightedGraph<N>,
        initial: &Tour<N>,
    ) -> Result<Tour<N>> {
        let cycle = initial
            .nodes
            .iter()
            .map(|&node| {
                graph.index_of(node).ok_or_else(|| {
                    Error::invalid_input(format!("initial cycle visits unknown node {node:?}"))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        let best = self.anneal(graph, cycle)?;
        Ok(Tour::new(best.into_iter().map(|idx| graph.node_at(idx)).collect()))
    }

    fn anneal<N: NodeKey>(&self, graph: &WeightedGraph<N>, cycle: Vec<usize>) -> Result<Vec<usize>> {
        self.params.validate()?;
        let n = graph.node_count();
        validate_cycle(&cycle, n)?;
        if !graph.is_complete() {
            return Err(Error::invalid_input(
                "simulated annealing needs a complete graph",
            ));
        }
        if n < 3 {
            return Ok(cycle);
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut temp = self.params.temperature;
        let mut current = cycle;
        let mut cost = cycle_cost(graph, &current)?;
        let mut best = current.clone();
        let mut best_cost = cost;
        let initial_cost = cost;
        let mut count = 0;
        let mut outer = 0usize;

        while count <= self.params.max_iterations && temp > 0.0 {
            count += 1;
            outer += 1;
            for _ in 0..self.params.inner_iterations {
                let candidate = self.neighbour(&current, &mut rng);
                let candidate_cost = cycle_cost(graph, &candidate)?;
                let delta = candidate_cost - cost;

                if delta <= 0.0 {
                    current = candidate;
                    cost = candidate_cost;
                    if cost < best_cost {
                        count = 0;
                        best.clone_from(&current);
                        best_cost = cost;
                    }
                } else if (-delta / temp).exp() >= rng.random::<f64>() {
                    current = candidate;
                    cost = candidate_cost;
                }
            }
            temp -= temp * self.params.alpha;
        }

        log::debug!(
            "annealing: n={n} outer_iterations={outer} start_cost={initial_cost} best_cost={best_cost} final_temp={temp:.4}"
        );
        Ok(best)
    }

    fn neighbour(&self, cycle: &[usize], rng: &mut StdRng) -> Vec<usize> {
        let mut next = cycle.to_vec();
        // interior positions only; the start and the closing copy stay put
        let last = next.len() - 1;
        let a = rng.random_range(1..last);
        let mut b = rng.random_range(1..last - 1);
        if b >= a {
            b += 1;
        }
        match self.params.movement {
            AnnealMove::Swap => next.swap(a, b),
            AnnealMove::Relocate => {
                let node = next.remove(a);
                next.insert(b, node);
            }
        }
        next
    }
}

impl<N: NodeKey> TourSolver<N> for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn solve(&self, graph: &WeightedGraph<N>) -> Result<Tour<N>> {
        let seed = greedy_cycle(graph)?;
        let best = self.anneal(graph, seed)?;
        Ok(Tour::new(best.into_iter().map(|idx| graph.node_at(idx)).collect()))
    }
}

fn validate_cycle(cycle: &[usize], n: usize) -> Result<()> {
    if n == 1 && cycle == [0] {
        return Ok(());
    }
    let mut seen = vec![false; n];
    let closed = cycle.len() == n + 1 && cycle.first() == cycle.last();
    let covers = closed && cycle[..n].iter().all(|&idx| !std::mem::replace(&mut seen[idx], true));
    if !covers {
        return Err(Error::invalid_input(
            "initial cycle must be closed and visit every node exactly once",
        ));
    }
    Ok(())
}

fn cycle_cost<N: NodeKey>(graph: &WeightedGraph<N>, cycle: &[usize]) -> Result<f64> {
    cycle.windows(2).try_fold(0.0, |total, pair| -> Result<f64> {
        Ok(total + graph.require_weight_at(pair[0], pair[1])?)
    })
}

#[cfg(test)]
mod tests {
    use super::{AnnealMove, AnnealingParams, SimulatedAnnealing};
    use crate::{
        graph::WeightedGraph,
        heuristics::{Greedy, TourSolver, test_graphs},
        tour::Tour,
    };

    fn ring_points(n: usize) -> Vec<(f64, f64)> {
        // a shuffled-looking ring so greedy is not already optimal
        (0..n)
            .map(|i| {
                let k = (i * 7) % n;
                let angle = std::f64::consts::TAU * k as f64 / n as f64;
                (10.0 * angle.cos(), 10.0 * angle.sin() + if i % 3 == 0 { 1.5 } else { 0.0 })
            })
            .collect()
    }

    #[test]
    fn never_worse_than_the_greedy_seed() {
        let graph = test_graphs::plane(&ring_points(12));
        let greedy_cost = Greedy.solve(&graph).expect("greedy").cost(&graph).expect("cost");

        for movement in AnnealMove::ALL {
            let params = AnnealingParams {
                movement: *movement,
                ..AnnealingParams::default()
            };
            let tour = SimulatedAnnealing::new(params).solve(&graph).expect("anneal");
            test_graphs::assert_closed_cycle(&tour.nodes, 12);
            assert_eq!(tour.nodes[0], 0);
            assert!(tour.cost(&graph).expect("cost") <= greedy_cost + 1e-9);
        }
    }

    #[test]
    fn same_seed_same_tour() {
        let graph = test_graphs::plane(&ring_points(10));
        let params = AnnealingParams {
            seed: 7,
            ..AnnealingParams::default()
        };
        let first = SimulatedAnnealing::new(params.clone()).solve(&graph).expect("first");
        let second = SimulatedAnnealing::new(params).solve(&graph).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn small_graphs_return_the_seed() {
        let graph = test_graphs::line(&[0.0, 3.0]);
        let tour = SimulatedAnnealing::default().solve(&graph).expect("pair");
        assert_eq!(tour.nodes, vec![0, 1, 0]);
    }

    #[test]
    fn rejects_incomplete_graph_and_bad_initial_cycle() {
        let mut graph = WeightedGraph::new_undirected();
        graph.add_edge(0, 1, 1.0).expect("add edge");
        graph.add_edge(1, 2, 1.0).expect("add edge");
        let err = SimulatedAnnealing::default()
            .solve_from(&graph, &Tour::new(vec![0, 1, 2, 0]))
            .expect_err("not complete");
        assert!(err.to_string().contains("complete graph"));

        let graph = test_graphs::line(&[0.0, 1.0, 2.0]);
        let err = SimulatedAnnealing::default()
            .solve_from(&graph, &Tour::new(vec![0, 1, 1, 0]))
            .expect_err("repeats node 1");
        assert!(err.to_string().contains("exactly once"));
    }

    #[test]
    fn rejects_invalid_parameters() {
        let graph = test_graphs::line(&[0.0, 1.0, 2.0]);
        let params = AnnealingParams {
            alpha: 1.5,
            ..AnnealingParams::default()
        };
        let err = SimulatedAnnealing::new(params).solve(&graph).expect_err("alpha");
        assert!(err.to_string().contains("sa-alpha"));
    }

    #[test]
    fn improves_a_crossed_start() {
        // unit square visited in crossing order 0-2-1-3
        let graph = test_graphs::plane(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let tour = SimulatedAnnealing::default()
            .solve_from(&graph, &Tour::new(vec![0, 2, 1, 3, 0]))
            .expect("anneal");
        assert!((tour.cost(&graph).expect("cost") - 4.0).abs() < 1e-9);
    }
}
