//! TSPLIB problem model: header fields, data sections and pairwise weights.
//!
//! Problems are read with [`TsplibProblem::from_file`] / [`TsplibProblem::from_text`]
//! and written back with their `Display` impl. Weight lookup follows the
//! problem's `EDGE_WEIGHT_TYPE`: explicit matrices are indexed in whichever
//! `EDGE_WEIGHT_FORMAT` the file used, coordinate types go through
//! [`distance`].

pub mod distance;
mod reader;
pub mod tour;
mod writer;

use std::{
    fmt::{Display, Formatter},
    fs,
    path::Path,
};

use tsp_tour_derive::TsplibKeyword;

use crate::{
    Error, Result,
    graph::{NodeId, WeightedGraph},
};
use writer::TsplibWriter;

pub use tour::TsplibTour;

pub(crate) const SECTION_END_MARKER: isize = -1;
const WEIGHTS_PER_LINE: usize = 16;

/// TSPLIB `TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TsplibKeyword)]
pub enum TsplibProblemType {
    Tsp,
    Atsp,
    Sop,
    Hcp,
    Cvrp,
    Tour,
}

/// TSPLIB `EDGE_WEIGHT_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TsplibKeyword)]
pub enum EdgeWeightType {
    Explicit,
    #[tsplib("EUC_2D")]
    Euc2d,
    #[tsplib("EUC_3D")]
    Euc3d,
    #[tsplib("MAX_2D")]
    Max2d,
    #[tsplib("MAX_3D")]
    Max3d,
    #[tsplib("MAN_2D")]
    Man2d,
    #[tsplib("MAN_3D")]
    Man3d,
    #[tsplib("CEIL_2D")]
    Ceil2d,
    Geo,
    Att,
    Xray1,
    Xray2,
    Special,
}

/// TSPLIB `EDGE_WEIGHT_FORMAT` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TsplibKeyword)]
pub enum EdgeWeightFormat {
    Function,
    FullMatrix,
    UpperRow,
    LowerRow,
    UpperDiagRow,
    LowerDiagRow,
    UpperCol,
    LowerCol,
    UpperDiagCol,
    LowerDiagCol,
}

/// TSPLIB `NODE_COORD_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TsplibKeyword)]
pub enum NodeCoordType {
    TwodCoords,
    ThreedCoords,
    NoCoords,
}

/// TSPLIB `DISPLAY_DATA_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, TsplibKeyword)]
pub enum DisplayDataType {
    CoordDisplay,
    TwodDisplay,
    NoDisplay,
}

/// Entry in `NODE_COORD_SECTION`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeCoord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl NodeCoord {
    pub const fn twod(id: NodeId, x: f64, y: f64) -> Self {
        Self { id, x, y, z: None }
    }

    pub const fn threed(id: NodeId, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            x,
            y,
            z: Some(z),
        }
    }
}

impl Display for NodeCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.id, self.x, self.y)?;
        if let Some(z) = self.z {
            write!(f, " {z}")?;
        }
        Ok(())
    }
}

/// Entry in `DISPLAY_DATA_SECTION`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayDataEntry {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

impl Display for DisplayDataEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.id, self.x, self.y)
    }
}

/// Entry in `FIXED_EDGES_SECTION`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedEdge {
    pub from: NodeId,
    pub to: NodeId,
}

impl Display for FixedEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.from, self.to)
    }
}

/// A parsed TSPLIB instance.
#[derive(Clone, Debug, PartialEq)]
pub struct TsplibProblem {
    pub name: String,
    pub problem_type: TsplibProblemType,
    pub comment_lines: Vec<String>,
    pub dimension: Option<usize>,
    pub capacity: Option<i64>,
    pub edge_weight_type: Option<EdgeWeightType>,
    pub edge_weight_format: Option<EdgeWeightFormat>,
    pub node_coord_type: Option<NodeCoordType>,
    pub display_data_type: Option<DisplayDataType>,
    pub node_coord_section: Vec<NodeCoord>,
    pub display_data_section: Vec<DisplayDataEntry>,
    pub fixed_edges_section: Vec<FixedEdge>,
    /// `EDGE_WEIGHT_SECTION` values in file order, laid out per `edge_weight_format`.
    pub edge_weight_section: Vec<f64>,
    pub emit_eof: bool,
}

impl TsplibProblem {
    pub fn new(name: impl Into<String>, problem_type: TsplibProblemType) -> Self {
        Self {
            name: name.into(),
            problem_type,
            comment_lines: Vec::new(),
            dimension: None,
            capacity: None,
            edge_weight_type: None,
            edge_weight_format: None,
            node_coord_type: None,
            display_data_type: None,
            node_coord_section: Vec::new(),
            display_data_section: Vec::new(),
            fixed_edges_section: Vec::new(),
            edge_weight_section: Vec::new(),
            emit_eof: true,
        }
    }

    /// Reads and validates a problem file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_input("no problem file given"));
        }
        let text = fs::read_to_string(path).map_err(|e| {
            Error::other(format!("failed to read {}: {e}", path.display()))
        })?;
        let problem = Self::from_text(&text)?;
        log::debug!(
            "tsplib: loaded {} from {}",
            problem.name,
            path.display()
        );
        Ok(problem)
    }

    /// Parses and validates problem text.
    pub fn from_text(text: &str) -> Result<Self> {
        let problem = reader::parse_problem(text)?;
        problem.validate()?;
        Ok(problem)
    }

    /// Checks that the sections agree with the header.
    pub fn validate(&self) -> Result<()> {
        let n = self.dimension()?;

        match self.edge_weight_type {
            None => {
                return Err(Error::invalid_data("missing EDGE_WEIGHT_TYPE"));
            }
            Some(EdgeWeightType::Explicit) => {
                let format = self.explicit_format()?;
                let expected = expected_weight_count(format, n);
                if self.edge_weight_section.len() != expected {
                    return Err(Error::invalid_data(format!(
                        "EDGE_WEIGHT_SECTION has {} values but {format} with DIMENSION {n} needs {expected}",
                        self.edge_weight_section.len()
                    )));
                }
            }
            Some(kind @ (EdgeWeightType::Xray1 | EdgeWeightType::Xray2 | EdgeWeightType::Special)) => {
                return Err(Error::invalid_data(format!(
                    "EDGE_WEIGHT_TYPE {kind} is not supported"
                )));
            }
            Some(kind) => {
                if self.node_coord_section.len() != n {
                    return Err(Error::invalid_data(format!(
                        "EDGE_WEIGHT_TYPE {kind} needs {n} node coordinates but NODE_COORD_SECTION has {}",
                        self.node_coord_section.len()
                    )));
                }
            }
        }

        if !self.display_data_section.is_empty() && self.display_data_section.len() != n {
            return Err(Error::invalid_data(format!(
                "DISPLAY_DATA_SECTION has {} entries but DIMENSION is {n}",
                self.display_data_section.len()
            )));
        }

        Ok(())
    }

    pub fn dimension(&self) -> Result<usize> {
        match self.dimension {
            Some(0) | None => Err(Error::invalid_data("missing or zero DIMENSION")),
            Some(n) => Ok(n),
        }
    }

    pub fn is_asymmetric(&self) -> bool {
        self.problem_type == TsplibProblemType::Atsp
    }

    /// Node identifiers: coordinate ids when the problem has coordinates,
    /// `1..=DIMENSION` otherwise.
    pub fn nodes(&self) -> Vec<NodeId> {
        if !self.node_coord_section.is_empty() {
            return self.node_coord_section.iter().map(|c| c.id).collect();
        }
        (1..=self.dimension.unwrap_or(0)).collect()
    }

    /// Every ordered node pair, self pairs included.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let nodes = self.nodes();
        let outer = nodes.clone();
        outer
            .into_iter()
            .flat_map(move |a| nodes.clone().into_iter().map(move |b| (a, b)))
    }

    /// Weight of travelling from `from` to `to`.
    pub fn weight(&self, from: NodeId, to: NodeId) -> Result<f64> {
        match self.edge_weight_type {
            Some(EdgeWeightType::Explicit) => self.explicit_weight(from, to),
            Some(kind) => {
                let a = self.coord(from).ok_or_else(|| Error::missing_edge(from, to))?;
                let b = self.coord(to).ok_or_else(|| Error::missing_edge(from, to))?;
                coordinate_weight(kind, a, b)
            }
            None => Err(Error::invalid_data("missing EDGE_WEIGHT_TYPE")),
        }
    }

    /// Builds the weighted graph: directed for ATSP, undirected otherwise.
    pub fn to_graph(&self) -> Result<WeightedGraph> {
        let nodes = self.nodes();
        let mut graph = if self.is_asymmetric() {
            WeightedGraph::new_directed()
        } else {
            WeightedGraph::new_undirected()
        };

        for &node in &nodes {
            graph.add_node(node);
        }
        for (i, &a) in nodes.iter().enumerate() {
            let targets = if graph.is_directed() { &nodes[..] } else { &nodes[i..] };
            for &b in targets {
                graph.add_edge(a, b, self.weight(a, b)?)?;
            }
        }

        log::info!(
            "graph: name={} nodes={} edges={} directed={}",
            self.name,
            graph.node_count(),
            graph.edge_count(),
            graph.is_directed()
        );
        Ok(graph)
    }

    /// Plot positions from `NODE_COORD_SECTION`, else `DISPLAY_DATA_SECTION`.
    pub fn positions(&self) -> Option<Vec<(NodeId, f64, f64)>> {
        if !self.node_coord_section.is_empty() {
            return Some(
                self.node_coord_section
                    .iter()
                    .map(|c| (c.id, c.x, c.y))
                    .collect(),
            );
        }
        if !self.display_data_section.is_empty() {
            return Some(
                self.display_data_section
                    .iter()
                    .map(|d| (d.id, d.x, d.y))
                    .collect(),
            );
        }
        None
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    fn explicit_format(&self) -> Result<EdgeWeightFormat> {
        match self.edge_weight_format {
            None | Some(EdgeWeightFormat::Function) => Err(Error::invalid_data(
                "EXPLICIT weights need an EDGE_WEIGHT_FORMAT matrix layout",
            )),
            Some(format) => Ok(format),
        }
    }

    fn explicit_weight(&self, from: NodeId, to: NodeId) -> Result<f64> {
        let n = self.dimension()?;
        if !(1..=n).contains(&from) || !(1..=n).contains(&to) {
            return Err(Error::missing_edge(from, to));
        }
        let format = self.explicit_format()?;
        let offset = match explicit_offset(format, n, from - 1, to - 1) {
            Some(offset) => offset,
            None => return Ok(0.0),
        };
        self.edge_weight_section
            .get(offset)
            .copied()
            .ok_or_else(|| Error::missing_edge(from, to))
    }

    fn coord(&self, id: NodeId) -> Option<&NodeCoord> {
        match id.checked_sub(1).and_then(|idx| self.node_coord_section.get(idx)) {
            Some(coord) if coord.id == id => Some(coord),
            _ => self.node_coord_section.iter().find(|c| c.id == id),
        }
    }
}

fn coordinate_weight(kind: EdgeWeightType, a: &NodeCoord, b: &NodeCoord) -> Result<f64> {
    Ok(match kind {
        EdgeWeightType::Euc2d | EdgeWeightType::Euc3d => distance::euclidean(a, b),
        EdgeWeightType::Max2d | EdgeWeightType::Max3d => distance::maximum(a, b),
        EdgeWeightType::Man2d | EdgeWeightType::Man3d => distance::manhattan(a, b),
        EdgeWeightType::Ceil2d => distance::ceil_euclidean(a, b),
        EdgeWeightType::Geo => distance::geographical(a, b),
        EdgeWeightType::Att => distance::pseudo_euclidean(a, b),
        other => {
            return Err(Error::invalid_data(format!(
                "EDGE_WEIGHT_TYPE {other} has no coordinate distance"
            )));
        }
    })
}

fn expected_weight_count(format: EdgeWeightFormat, n: usize) -> usize {
    match format {
        EdgeWeightFormat::Function => 0,
        EdgeWeightFormat::FullMatrix => n * n,
        EdgeWeightFormat::UpperRow
        | EdgeWeightFormat::LowerRow
        | EdgeWeightFormat::UpperCol
        | EdgeWeightFormat::LowerCol => n * (n - 1) / 2,
        EdgeWeightFormat::UpperDiagRow
        | EdgeWeightFormat::LowerDiagRow
        | EdgeWeightFormat::UpperDiagCol
        | EdgeWeightFormat::LowerDiagCol => n * (n + 1) / 2,
    }
}

/// Position of the zero-based pair `(i, j)` in the flat weight list, or `None`
/// for a diagonal entry the format leaves out (weight 0).
///
/// Triangular formats are symmetric, so a column-wise upper triangle is laid
/// out exactly like a row-wise lower triangle and vice versa.
fn explicit_offset(format: EdgeWeightFormat, n: usize, i: usize, j: usize) -> Option<usize> {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    match format {
        EdgeWeightFormat::Function => None,
        EdgeWeightFormat::FullMatrix => Some(i * n + j),
        EdgeWeightFormat::UpperRow | EdgeWeightFormat::LowerCol => {
            (lo != hi).then(|| lo * (n - 1) - lo * lo.saturating_sub(1) / 2 + (hi - lo - 1))
        }
        EdgeWeightFormat::LowerRow | EdgeWeightFormat::UpperCol => {
            (lo != hi).then(|| hi * (hi - 1) / 2 + lo)
        }
        EdgeWeightFormat::UpperDiagRow | EdgeWeightFormat::LowerDiagCol => {
            Some(lo * n - lo * lo.saturating_sub(1) / 2 + (hi - lo))
        }
        EdgeWeightFormat::LowerDiagRow | EdgeWeightFormat::UpperDiagCol => {
            Some(hi * (hi + 1) / 2 + lo)
        }
    }
}

impl Display for TsplibProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = TsplibWriter::new(f);

        writer.kv("NAME", &self.name)?;
        writer.kv("TYPE", self.problem_type)?;
        for comment in &self.comment_lines {
            writer.kv("COMMENT", comment)?;
        }
        writer.opt_kv("DIMENSION", self.dimension)?;
        writer.opt_kv("CAPACITY", self.capacity)?;
        writer.opt_kv("EDGE_WEIGHT_TYPE", self.edge_weight_type)?;
        writer.opt_kv("EDGE_WEIGHT_FORMAT", self.edge_weight_format)?;
        writer.opt_kv("NODE_COORD_TYPE", self.node_coord_type)?;
        writer.opt_kv("DISPLAY_DATA_TYPE", self.display_data_type)?;

        writer.section("NODE_COORD_SECTION", &self.node_coord_section)?;
        if !self.fixed_edges_section.is_empty() {
            writer.section("FIXED_EDGES_SECTION", &self.fixed_edges_section)?;
            writer.line(SECTION_END_MARKER)?;
        }
        writer.section("DISPLAY_DATA_SECTION", &self.display_data_section)?;
        if !self.edge_weight_section.is_empty() {
            writer.line("EDGE_WEIGHT_SECTION")?;
            writer.wrapped(&self.edge_weight_section, WEIGHTS_PER_LINE)?;
        }

        if self.emit_eof {
            writer.line("EOF")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::{
        EdgeWeightFormat, EdgeWeightType, NodeCoord, TsplibProblem, TsplibProblemType,
        explicit_offset,
    };

    fn explicit(format: EdgeWeightFormat, n: usize, weights: Vec<f64>) -> TsplibProblem {
        let mut problem = TsplibProblem::new("m", TsplibProblemType::Tsp);
        problem.dimension = Some(n);
        problem.edge_weight_type = Some(EdgeWeightType::Explicit);
        problem.edge_weight_format = Some(format);
        problem.edge_weight_section = weights;
        problem.validate().expect("valid explicit problem");
        problem
    }

    /// Symmetric 4x4 matrix with w(i, j) = 10 * min + max (1-based ids).
    fn expected(i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        (10 * lo + hi) as f64
    }

    #[test]
    fn every_triangular_format_resolves_the_same_matrix() {
        let upper_row = vec![12.0, 13.0, 14.0, 23.0, 24.0, 34.0];
        let lower_row = vec![12.0, 13.0, 23.0, 14.0, 24.0, 34.0];
        let upper_diag_row = vec![0.0, 12.0, 13.0, 14.0, 0.0, 23.0, 24.0, 0.0, 34.0, 0.0];
        let lower_diag_row = vec![0.0, 12.0, 0.0, 13.0, 23.0, 0.0, 14.0, 24.0, 34.0, 0.0];

        let problems = [
            explicit(EdgeWeightFormat::UpperRow, 4, upper_row.clone()),
            explicit(EdgeWeightFormat::LowerCol, 4, upper_row),
            explicit(EdgeWeightFormat::LowerRow, 4, lower_row.clone()),
            explicit(EdgeWeightFormat::UpperCol, 4, lower_row),
            explicit(EdgeWeightFormat::UpperDiagRow, 4, upper_diag_row.clone()),
            explicit(EdgeWeightFormat::LowerDiagCol, 4, upper_diag_row),
            explicit(EdgeWeightFormat::LowerDiagRow, 4, lower_diag_row.clone()),
            explicit(EdgeWeightFormat::UpperDiagCol, 4, lower_diag_row),
        ];

        for problem in &problems {
            for i in 1..=4 {
                for j in 1..=4 {
                    assert_eq!(
                        problem.weight(i, j).expect("weight"),
                        expected(i, j),
                        "{:?} ({i}, {j})",
                        problem.edge_weight_format
                    );
                }
            }
        }
    }

    #[test]
    fn full_matrix_keeps_asymmetry() {
        let mut problem = explicit(
            EdgeWeightFormat::FullMatrix,
            3,
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0],
        );
        problem.problem_type = TsplibProblemType::Atsp;

        assert_eq!(problem.weight(1, 2).expect("weight"), 1.0);
        assert_eq!(problem.weight(2, 1).expect("weight"), 3.0);
        assert_eq!(problem.weight(3, 2).expect("weight"), 6.0);

        let graph = problem.to_graph().expect("graph");
        assert!(graph.is_directed());
        assert_eq!(graph.weight(2, 3), Some(4.0));
        assert_eq!(graph.weight(3, 2), Some(6.0));
    }

    #[test]
    fn offsets_stay_inside_the_section() {
        assert_eq!(explicit_offset(EdgeWeightFormat::UpperRow, 4, 2, 3), Some(5));
        assert_eq!(explicit_offset(EdgeWeightFormat::UpperRow, 4, 1, 1), None);
        assert_eq!(explicit_offset(EdgeWeightFormat::UpperDiagRow, 4, 3, 3), Some(9));
        assert_eq!(explicit_offset(EdgeWeightFormat::LowerDiagRow, 4, 3, 3), Some(9));
    }

    #[test]
    fn out_of_range_ids_are_lookup_errors() {
        let problem = explicit(EdgeWeightFormat::UpperRow, 4, vec![1.0; 6]);
        let err = problem.weight(1, 5).expect_err("id 5 is out of range");
        assert!(err.is_lookup());
    }

    #[test]
    fn validate_rejects_wrong_weight_count() {
        let mut problem = TsplibProblem::new("bad", TsplibProblemType::Tsp);
        problem.dimension = Some(4);
        problem.edge_weight_type = Some(EdgeWeightType::Explicit);
        problem.edge_weight_format = Some(EdgeWeightFormat::UpperRow);
        problem.edge_weight_section = vec![1.0; 5];

        let err = problem.validate().expect_err("five values for six slots");
        assert!(err.to_string().contains("needs 6"));
    }

    #[test]
    fn validate_rejects_missing_coordinates() {
        let mut problem = TsplibProblem::new("bad", TsplibProblemType::Tsp);
        problem.dimension = Some(3);
        problem.edge_weight_type = Some(EdgeWeightType::Euc2d);
        problem.node_coord_section = vec![NodeCoord::twod(1, 0.0, 0.0)];

        let err = problem.validate().expect_err("one coordinate for three nodes");
        assert!(err.to_string().contains("needs 3 node coordinates"));
    }

    #[test]
    fn coordinate_problem_builds_undirected_graph_with_self_loops() {
        let mut problem = TsplibProblem::new("tri", TsplibProblemType::Tsp);
        problem.dimension = Some(3);
        problem.edge_weight_type = Some(EdgeWeightType::Euc2d);
        problem.node_coord_section = vec![
            NodeCoord::twod(1, 0.0, 0.0),
            NodeCoord::twod(2, 3.0, 0.0),
            NodeCoord::twod(3, 3.0, 4.0),
        ];

        let graph = problem.to_graph().expect("graph");
        assert!(!graph.is_directed());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(graph.weight(1, 3), Some(5.0));
        assert_eq!(graph.weight(2, 2), Some(0.0));
        assert_eq!(problem.edges().count(), 9);
    }

    #[test]
    fn display_writes_headers_before_sections() {
        let problem = explicit(EdgeWeightFormat::UpperRow, 3, vec![1.0, 2.0, 3.0]);
        let text = problem.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "NAME: m");
        assert_eq!(lines[1], "TYPE: TSP");
        assert_eq!(lines[2], "DIMENSION: 3");
        assert_eq!(lines[3], "EDGE_WEIGHT_TYPE: EXPLICIT");
        assert_eq!(lines[4], "EDGE_WEIGHT_FORMAT: UPPER_ROW");
        assert_eq!(lines[5], "EDGE_WEIGHT_SECTION");
        assert_eq!(lines[6], "1 2 3");
        assert_eq!(lines[7], "EOF");
    }

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("tsp-tour-tests-{name}-{nanos}"))
    }

    #[test]
    fn written_file_reads_back_to_the_same_problem() {
        let dir = unique_temp_dir("tsplib-write");
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("m.tsp");

        let mut problem = explicit(EdgeWeightFormat::UpperRow, 3, vec![1.0, 2.0, 3.0]);
        problem.comment_lines.push("three nodes".to_string());
        problem.write_to_file(&path).expect("write problem");

        let read = TsplibProblem::from_file(&path).expect("read problem");
        assert_eq!(read, problem);
        assert_eq!(read.weight(2, 3).expect("weight"), 3.0);

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
