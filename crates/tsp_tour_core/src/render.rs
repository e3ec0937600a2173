//! SVG plots of a graph with one tour highlighted.

use std::{
    fmt::{Display, Write as _},
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    Error, Result,
    graph::{NodeKey, WeightedGraph},
    layout::Layout,
    tour::Tour,
};

const CANVAS_SIZE: f64 = 800.0;
const MARGIN: f64 = 48.0;
const TITLE_HEIGHT: f64 = 32.0;
const NODE_RADIUS: f64 = 6.0;
const MAX_BACKGROUND_EDGES: usize = 20_000;

const BACKGROUND_EDGE_COLOR: &str = "#c8c8c8";
const TOUR_EDGE_COLOR: &str = "red";
const TOUR_EDGE_WIDTH: f64 = 3.0;
const NODE_COLOR: &str = "#1f78b4";

/// Builds the SVG document: every graph edge in light grey, tour legs in red,
/// then labelled nodes on top.
pub fn tour_svg<N: NodeKey + Display>(
    graph: &WeightedGraph<N>,
    layout: &Layout,
    tour: &Tour<N>,
    title: &str,
) -> Result<String> {
    if layout.len() != graph.node_count() {
        return Err(Error::invalid_input(format!(
            "layout has {} points for {} nodes",
            layout.len(),
            graph.node_count()
        )));
    }

    let index = |node: N| {
        graph
            .index_of(node)
            .ok_or_else(|| Error::invalid_input(format!("tour visits unknown node {node:?}")))
    };
    let legs = tour
        .legs()
        .map(|(a, b)| -> Result<(usize, usize)> { Ok((index(a)?, index(b)?)) })
        .collect::<Result<Vec<_>>>()?;
    let points: Vec<(f64, f64)> = layout.points.iter().map(|&p| canvas_point(p)).collect();

    let mut svg = String::new();
    write_document(&mut svg, graph, &points, &legs, title)
        .map_err(|e| Error::other(format!("failed to format svg: {e}")))?;
    Ok(svg)
}

fn write_document<N: NodeKey + Display>(
    out: &mut String,
    graph: &WeightedGraph<N>,
    points: &[(f64, f64)],
    legs: &[(usize, usize)],
    title: &str,
) -> std::fmt::Result {
    let height = CANVAS_SIZE + TITLE_HEIGHT;
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CANVAS_SIZE}\" height=\"{height}\" viewBox=\"0 0 {CANVAS_SIZE} {height}\">"
    )?;
    writeln!(out, "<rect width=\"100%\" height=\"100%\" fill=\"white\"/>")?;
    writeln!(
        out,
        "<text x=\"{}\" y=\"24\" font-family=\"sans-serif\" font-size=\"18\" text-anchor=\"middle\">{}</text>",
        CANVAS_SIZE / 2.0,
        escape(title)
    )?;

    let edge_count = graph.edge_count();
    if edge_count <= MAX_BACKGROUND_EDGES {
        writeln!(out, "<g stroke=\"{BACKGROUND_EDGE_COLOR}\" stroke-width=\"1\">")?;
        for i in 0..graph.node_count() {
            for (j, _) in graph.neighbors_at(i) {
                if i == j || (!graph.is_directed() && j < i) {
                    continue;
                }
                line(out, points[i], points[j])?;
            }
        }
        writeln!(out, "</g>")?;
    } else {
        log::debug!("render: skipping {edge_count} background edges for {title}");
    }

    writeln!(
        out,
        "<g stroke=\"{TOUR_EDGE_COLOR}\" stroke-width=\"{TOUR_EDGE_WIDTH}\" stroke-linecap=\"round\">"
    )?;
    for &(a, b) in legs {
        line(out, points[a], points[b])?;
    }
    writeln!(out, "</g>")?;

    writeln!(
        out,
        "<g font-family=\"sans-serif\" font-size=\"10\" text-anchor=\"middle\">"
    )?;
    for (node, &(x, y)) in graph.nodes().iter().zip(points) {
        writeln!(
            out,
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{NODE_RADIUS}\" fill=\"{NODE_COLOR}\"/>"
        )?;
        writeln!(
            out,
            "<text x=\"{x:.2}\" y=\"{:.2}\">{}</text>",
            y - NODE_RADIUS - 2.0,
            escape(&node.to_string())
        )?;
    }
    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")
}

fn line(out: &mut String, from: (f64, f64), to: (f64, f64)) -> std::fmt::Result {
    writeln!(
        out,
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>",
        from.0, from.1, to.0, to.1
    )
}

/// Maps a layout point in `[-1, 1]` to canvas pixels, y pointing up.
fn canvas_point(p: [f64; 2]) -> (f64, f64) {
    let usable = CANVAS_SIZE - 2.0 * MARGIN;
    let x = MARGIN + (p[0] + 1.0) / 2.0 * usable;
    let y = TITLE_HEIGHT + MARGIN + (1.0 - p[1]) / 2.0 * usable;
    (x, y)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Writes plots to a directory and optionally opens each in a viewer.
#[derive(Clone, Debug)]
pub struct PlotWriter {
    plot_dir: PathBuf,
    /// Viewer command line; the plot path is appended as the last argument.
    viewer: Option<String>,
    /// Viewer failures are logged instead of returned.
    lenient_viewer: bool,
}

impl PlotWriter {
    pub fn new(plot_dir: impl Into<PathBuf>, viewer: Option<String>) -> Self {
        Self {
            plot_dir: plot_dir.into(),
            viewer: viewer.filter(|v| !v.trim().is_empty()),
            lenient_viewer: false,
        }
    }

    pub fn with_lenient_viewer(mut self, lenient: bool) -> Self {
        self.lenient_viewer = lenient;
        self
    }

    pub fn plot_path(&self, problem: &str, heuristic: &str) -> PathBuf {
        let stem = if problem.is_empty() { "problem" } else { problem };
        self.plot_dir
            .join(format!("{}-{heuristic}.svg", sanitize_file_stem(stem)))
    }

    /// Writes `svg` and, with a viewer configured, blocks until it exits.
    pub fn show(&self, problem: &str, heuristic: &str, svg: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.plot_dir)?;
        let path = self.plot_path(problem, heuristic);
        fs::write(&path, svg)?;
        log::info!("render: wrote {}", path.display());

        if let Some(viewer) = &self.viewer {
            match open_in_viewer(viewer, &path) {
                Ok(()) => {}
                Err(e) if self.lenient_viewer => {
                    log::warn!("render: could not show {} with '{viewer}': {e}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(path)
    }
}

fn open_in_viewer(viewer: &str, path: &Path) -> Result<()> {
    let mut parts = viewer.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };
    let output = Command::new(program)
        .args(parts)
        .arg(path)
        .output()
        .map_err(Error::from)?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::ProcessFailed {
            context: format!("viewer '{viewer}' failed on {}", path.display()),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
