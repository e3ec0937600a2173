use crate::{
    Error, Result,
    graph::{NodeKey, WeightedGraph},
    heuristics::{TourSolver, ensure_not_empty},
    tour::Tour,
};

const MAX_MATCHING_PASSES: usize = 64;

/// Christofides construction for complete undirected graphs: minimum spanning
/// tree, a matching on its odd-degree vertices, an Eulerian circuit of the
/// union and a shortcut to a Hamiltonian cycle.
///
/// The matching is a greedy pairing refined by pairwise exchanges rather than
/// an exact minimum-weight perfect matching.
#[derive(Clone, Copy, Debug, Default)]
pub struct Christofides;

impl<N: NodeKey> TourSolver<N> for Christofides {
    fn name(&self) -> &'static str {
        "christofides"
    }

    fn solve(&self, graph: &WeightedGraph<N>) -> Result<Tour<N>> {
        ensure_not_empty(graph, "christofides")?;
        if graph.is_directed() {
            return Err(Error::invalid_input(
                "christofides is not implemented for directed graphs",
            ));
        }
        if !graph.is_complete() {
            return Err(Error::invalid_input("christofides needs a complete graph"));
        }

        let n = graph.node_count();
        let cycle = match n {
            1 => vec![0],
            2 => vec![0, 1, 0],
            _ => {
                let tree = minimum_spanning_tree(graph)?;
                let odd = odd_degree_vertices(n, &tree);
                let matching = improve_matching(graph, greedy_matching(graph, &odd)?)?;
                log::debug!(
                    "christofides: n={n} tree_edges={} odd_vertices={} matched_pairs={}",
                    tree.len(),
                    odd.len(),
                    matching.len()
                );

                let mut multigraph = tree;
                multigraph.extend(matching);
                shortcut(&eulerian_circuit(n, &multigraph))
            }
        };

        Ok(Tour::new(cycle.into_iter().map(|idx| graph.node_at(idx)).collect()))
    }
}

/// Prim's algorithm on the dense graph, rooted at index 0.
fn minimum_spanning_tree<N: NodeKey>(graph: &WeightedGraph<N>) -> Result<Vec<(usize, usize)>> {
    let n = graph.node_count();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    best[0] = 0.0;
    for _ in 0..n {
        let Some(u) = (0..n)
            .filter(|&v| !in_tree[v])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
        else {
            break;
        };
        in_tree[u] = true;
        if u != 0 {
            edges.push((parent[u], u));
        }
        for v in (0..n).filter(|&v| !in_tree[v]) {
            let weight = graph.require_weight_at(u, v)?;
            if weight < best[v] {
                best[v] = weight;
                parent[v] = u;
            }
        }
    }
    Ok(edges)
}

fn odd_degree_vertices(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut degree = vec![0usize; n];
    for &(a, b) in edges {
        degree[a] += 1;
        degree[b] += 1;
    }
    (0..n).filter(|&v| degree[v] % 2 == 1).collect()
}

/// Pairs the cheapest available pair first.
fn greedy_matching<N: NodeKey>(
    graph: &WeightedGraph<N>,
    odd: &[usize],
) -> Result<Vec<(usize, usize)>> {
    let mut pairs = Vec::with_capacity(odd.len() * odd.len() / 2);
    for (i, &a) in odd.iter().enumerate() {
        for &b in &odd[i + 1..] {
            pairs.push((graph.require_weight_at(a, b)?, a, b));
        }
    }
    pairs.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut matched = vec![false; graph.node_count()];
    let mut matching = Vec::with_capacity(odd.len() / 2);
    for (_, a, b) in pairs {
        if !matched[a] && !matched[b] {
            matched[a] = true;
            matched[b] = true;
            matching.push((a, b));
        }
    }
    Ok(matching)
}

/// Re-pairs two matched edges whenever one of the two alternative pairings is
/// cheaper, until a full pass changes nothing.
fn improve_matching<N: NodeKey>(
    graph: &WeightedGraph<N>,
    mut matching: Vec<(usize, usize)>,
) -> Result<Vec<(usize, usize)>> {
    let w = |a: usize, b: usize| graph.require_weight_at(a, b);

    for _ in 0..MAX_MATCHING_PASSES {
        let mut improved = false;
        for i in 0..matching.len() {
            for j in (i + 1)..matching.len() {
                let (a, b) = matching[i];
                let (c, d) = matching[j];
                let current = w(a, b)? + w(c, d)?;
                let crossed = w(a, c)? + w(b, d)?;
                let swapped = w(a, d)? + w(b, c)?;
                if crossed < current && crossed <= swapped {
                    matching[i] = (a, c);
                    matching[j] = (b, d);
                    improved = true;
                } else if swapped < current {
                    matching[i] = (a, d);
                    matching[j] = (b, c);
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
    Ok(matching)
}

/// Hierholzer's algorithm over an edge list where every vertex has even degree.
fn eulerian_circuit(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (id, &(a, b)) in edges.iter().enumerate() {
        incident[a].push(id);
        incident[b].push(id);
    }

    let mut used = vec![false; edges.len()];
    let mut cursor = vec![0usize; n];
    let mut stack = vec![edges.first().map_or(0, |&(a, _)| a)];
    let mut circuit = Vec::with_capacity(edges.len() + 1);

    while let Some(&v) = stack.last() {
        let mut next = None;
        while cursor[v] < incident[v].len() {
            let id = incident[v][cursor[v]];
            cursor[v] += 1;
            if !used[id] {
                used[id] = true;
                let (a, b) = edges[id];
                next = Some(if a == v { b } else { a });
                break;
            }
        }
        match next {
            Some(u) => stack.push(u),
            None => {
                stack.pop();
                circuit.push(v);
            }
        }
    }

    circuit.reverse();
    circuit
}

/// Drops repeated vertices from a circuit and closes the cycle.
fn shortcut(circuit: &[usize]) -> Vec<usize> {
    let n = circuit.iter().copied().max().map_or(0, |m| m + 1);
    let mut seen = vec![false; n];
    let mut cycle = Vec::with_capacity(n + 1);
    for &v in circuit {
        if !std::mem::replace(&mut seen[v], true) {
            cycle.push(v);
        }
    }
    if let Some(&start) = cycle.first() {
        cycle.push(start);
    }
    cycle
}
