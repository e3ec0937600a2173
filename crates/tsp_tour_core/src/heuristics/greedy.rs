use crate::{
    Result,
    graph::{NodeKey, WeightedGraph},
    heuristics::{TourSolver, ensure_not_empty},
    tour::Tour,
};

/// Nearest-neighbour construction starting at the graph's first node.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl<N: NodeKey> TourSolver<N> for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, graph: &WeightedGraph<N>) -> Result<Tour<N>> {
        let cycle = greedy_cycle(graph)?;
        Ok(Tour::new(cycle.into_iter().map(|idx| graph.node_at(idx)).collect()))
    }
}

/// Greedy cycle over dense node indices.
///
/// Ties go to the lowest index. A single node yields `[0]`, anything larger a
/// closed cycle `[0, ..., 0]`.
pub(crate) fn greedy_cycle<N: NodeKey>(graph: &WeightedGraph<N>) -> Result<Vec<usize>> {
    ensure_not_empty(graph, "greedy")?;
    let n = graph.node_count();
    if n == 1 {
        return Ok(vec![0]);
    }

    let mut visited = vec![false; n];
    let mut cycle = Vec::with_capacity(n + 1);
    let mut current = 0;
    visited[current] = true;
    cycle.push(current);

    for _ in 1..n {
        let mut best: Option<(usize, f64)> = None;
        for candidate in (0..n).filter(|&idx| !visited[idx]) {
            let weight = graph.require_weight_at(current, candidate)?;
            if best.is_none_or(|(_, best_weight)| weight < best_weight) {
                best = Some((candidate, weight));
            }
        }
        let Some((next, _)) = best else {
            break;
        };
        visited[next] = true;
        cycle.push(next);
        current = next;
    }

    cycle.push(0);
    log::debug!("greedy: built cycle over {n} nodes");
    Ok(cycle)
}
