//! Node placement for plots.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tsp_tour_derive::CliValue;

use crate::graph::{NodeId, NodeKey, WeightedGraph};

pub const DEFAULT_ITERATIONS: usize = 50;
const CONVERGENCE_THRESHOLD: f64 = 1e-4;
const MIN_DISTANCE: f64 = 0.01;
const MIN_DISPLACEMENT: f64 = 0.01;
const STALLED_DISPLACEMENT: f64 = 0.1;
const INITIAL_TEMPERATURE_SHARE: f64 = 0.1;

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "layout")]
pub enum LayoutKind {
    /// Force-directed placement from edge weights.
    #[cli(alias = "force")]
    Spring,
    /// Node coordinates or display data from the problem file.
    #[cli(alias = "coordinates")]
    Coords,
}

/// Positions indexed like the graph's dense node indices, scaled into
/// `[-1, 1]` around the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub points: Vec<[f64; 2]>,
}

impl Layout {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, idx: usize) -> [f64; 2] {
        self.points[idx]
    }

    /// Centres on the mean and scales the largest coordinate to 1.
    fn rescaled(mut self) -> Self {
        if self.points.is_empty() {
            return self;
        }
        let n = self.points.len() as f64;
        let mean_x = self.points.iter().map(|p| p[0]).sum::<f64>() / n;
        let mean_y = self.points.iter().map(|p| p[1]).sum::<f64>() / n;
        let mut lim = 0.0_f64;
        for p in &mut self.points {
            p[0] -= mean_x;
            p[1] -= mean_y;
            lim = lim.max(p[0].abs()).max(p[1].abs());
        }
        if lim > 0.0 {
            for p in &mut self.points {
                p[0] /= lim;
                p[1] /= lim;
            }
        }
        self
    }
}

/// Fruchterman-Reingold placement. Edge weights scale attraction; the start
/// positions come from `seed`, so equal seeds give equal layouts.
pub fn spring_layout<N: NodeKey>(graph: &WeightedGraph<N>, iterations: usize, seed: u64) -> Layout {
    let n = graph.node_count();
    if n <= 1 {
        return Layout {
            points: vec![[0.0, 0.0]; n],
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<[f64; 2]> = (0..n)
        .map(|_| [rng.random::<f64>(), rng.random::<f64>()])
        .collect();
    let mut adjacency = vec![0.0; n * n];
    for i in 0..n {
        for (j, w) in graph.neighbors_at(i) {
            adjacency[i * n + j] = w;
        }
    }

    let k = (1.0 / n as f64).sqrt();
    let mut t = span(&pos, 0).max(span(&pos, 1)) * INITIAL_TEMPERATURE_SHARE;
    let dt = t / (iterations as f64 + 1.0);

    let mut ran = 0;
    for _ in 0..iterations {
        ran += 1;
        let mut moves = vec![[0.0; 2]; n];
        for i in 0..n {
            let mut disp = [0.0; 2];
            for j in 0..n {
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = k * k / (distance * distance) - adjacency[i * n + j] * distance / k;
                disp[0] += dx * force;
                disp[1] += dy * force;
            }
            let mut length = (disp[0] * disp[0] + disp[1] * disp[1]).sqrt();
            if length < MIN_DISPLACEMENT {
                length = STALLED_DISPLACEMENT;
            }
            moves[i] = [disp[0] * t / length, disp[1] * t / length];
        }

        let mut moved = 0.0;
        for (p, m) in pos.iter_mut().zip(&moves) {
            p[0] += m[0];
            p[1] += m[1];
            moved += m[0] * m[0] + m[1] * m[1];
        }
        t -= dt;
        if moved.sqrt() / (n as f64) < CONVERGENCE_THRESHOLD {
            break;
        }
    }

    log::debug!("layout: spring n={n} iterations={ran}");
    Layout { points: pos }.rescaled()
}

fn span(points: &[[f64; 2]], axis: usize) -> f64 {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[axis]), hi.max(p[axis]))
        });
    hi - lo
}

/// Places nodes at problem coordinates. Returns `None` unless every graph
/// node has a position.
pub fn coordinate_layout(
    graph: &WeightedGraph<NodeId>,
    positions: &[(NodeId, f64, f64)],
) -> Option<Layout> {
    let mut points: Vec<Option<[f64; 2]>> = vec![None; graph.node_count()];
    for &(id, x, y) in positions {
        if let Some(idx) = graph.index_of(id) {
            points[idx] = Some([x, y]);
        }
    }
    let points = points.into_iter().collect::<Option<Vec<_>>>()?;
    Some(Layout { points }.rescaled())
}

#[cfg(test)]
mod tests {
    use super::{LayoutKind, coordinate_layout, spring_layout};
    use crate::graph::WeightedGraph;

    fn square() -> WeightedGraph {
        let mut graph = WeightedGraph::new_undirected();
        for (a, b) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
            graph.add_edge(a, b, 1.0).expect("add edge");
        }
        graph.add_edge(1, 3, 1.4).expect("add edge");
        graph.add_edge(2, 4, 1.4).expect("add edge");
        graph
    }

    #[test]
    fn spring_layout_is_seeded_and_rescaled() {
        let graph = square();
        let first = spring_layout(&graph, 50, 3);
        let second = spring_layout(&graph, 50, 3);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);

        let max = first
            .points
            .iter()
            .flat_map(|p| [p[0].abs(), p[1].abs()])
            .fold(0.0_f64, f64::max);
        assert!((max - 1.0).abs() < 1e-9);

        let mean_x: f64 = first.points.iter().map(|p| p[0]).sum::<f64>() / 4.0;
        assert!(mean_x.abs() < 1e-9);
    }

    #[test]
    fn spring_layout_separates_nodes() {
        let layout = spring_layout(&square(), 50, 11);
        for i in 0..4 {
            for j in (i + 1)..4 {
                let (a, b) = (layout.point(i), layout.point(j));
                let d = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
                assert!(d > 1e-3, "nodes {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn single_node_sits_at_origin() {
        let mut graph: WeightedGraph = WeightedGraph::new_undirected();
        graph.add_node(1);
        assert_eq!(spring_layout(&graph, 50, 0).points, vec![[0.0, 0.0]]);
    }

    #[test]
    fn coordinate_layout_needs_every_node() {
        let graph = square();
        let full = [(1, 0.0, 0.0), (2, 2.0, 0.0), (3, 2.0, 2.0), (4, 0.0, 2.0)];
        let layout = coordinate_layout(&graph, &full).expect("layout");
        let idx = graph.index_of(3).expect("node 3");
        assert_eq!(layout.point(idx), [1.0, 1.0]);

        assert!(coordinate_layout(&graph, &full[..3]).is_none());
    }

    #[test]
    fn layout_kind_parses_aliases() {
        assert_eq!(LayoutKind::parse("force").expect("alias"), LayoutKind::Spring);
        assert_eq!(LayoutKind::parse("COORDS").expect("name"), LayoutKind::Coords);
        assert!(LayoutKind::parse("circle").is_err());
    }
}
