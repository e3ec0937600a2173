//! TSPLIB `.tour` files: writing solved tours and reading reference tours.

use std::{
    fmt::{Display, Formatter},
    fs,
    path::Path,
};

use super::{SECTION_END_MARKER, TsplibProblemType, writer::TsplibWriter};
use crate::{Error, Result, graph::NodeId, tour::Tour};

const TOUR_SECTION_HEADER: &str = "TOUR_SECTION";
const EOF_MARKER: &str = "EOF";

/// TSPLIB `.tour` file model. Node ids are stored as written (1-based) and
/// without a repeated start node.
#[derive(Clone, Debug, PartialEq)]
pub struct TsplibTour {
    pub name: Option<String>,
    pub comment_lines: Vec<String>,
    pub dimension: Option<usize>,
    /// Known optimum (`OPTIMUM`) when the file states one.
    pub optimum: Option<f64>,
    pub tour_section: Vec<NodeId>,
    pub emit_eof: bool,
}

impl TsplibTour {
    pub fn new() -> Self {
        Self {
            name: None,
            comment_lines: Vec::new(),
            dimension: None,
            optimum: None,
            tour_section: Vec::new(),
            emit_eof: true,
        }
    }

    /// Tour file for a solved tour; a closed cycle loses its repeated start.
    pub fn from_tour(name: impl Into<String>, tour: &Tour) -> Self {
        let nodes = tour.distinct_nodes().to_vec();
        Self {
            name: Some(name.into()),
            dimension: Some(nodes.len()),
            tour_section: nodes,
            ..Self::new()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment_lines.push(comment.into());
        self
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::other(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let mut tour = Self::new();
        tour.emit_eof = false;
        let mut in_tour_section = false;

        'lines: for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case(EOF_MARKER) {
                tour.emit_eof = true;
                break;
            }

            if !in_tour_section {
                if line.eq_ignore_ascii_case(TOUR_SECTION_HEADER) {
                    in_tour_section = true;
                    continue;
                }
                let Some((key, value)) = line
                    .split_once(':')
                    .or_else(|| line.split_once('='))
                    .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim()))
                else {
                    return Err(Error::parse(
                        line_no,
                        format!("expected 'KEY: value', got '{line}'"),
                    ));
                };
                match key.as_str() {
                    "NAME" => tour.name = Some(value.to_string()),
                    "COMMENT" => tour.comment_lines.push(value.to_string()),
                    "TYPE" => {
                        if TsplibProblemType::from_keyword(value) != Some(TsplibProblemType::Tour) {
                            return Err(Error::parse(
                                line_no,
                                format!("unsupported tour TYPE '{value}'"),
                            ));
                        }
                    }
                    "DIMENSION" => {
                        let parsed = value.parse::<usize>().map_err(|e| {
                            Error::parse(line_no, format!("bad DIMENSION value '{value}': {e}"))
                        })?;
                        tour.dimension = Some(parsed);
                    }
                    "OPTIMUM" => {
                        let parsed = value.parse::<f64>().map_err(|e| {
                            Error::parse(line_no, format!("bad OPTIMUM value '{value}': {e}"))
                        })?;
                        tour.optimum = Some(parsed);
                    }
                    _ => {}
                }
                continue;
            }

            for token in line.split_whitespace() {
                let id: isize = token.parse().map_err(|e| {
                    Error::parse(line_no, format!("bad tour token '{token}': {e}"))
                })?;
                if id == SECTION_END_MARKER {
                    break 'lines;
                }
                let id = NodeId::try_from(id).ok().filter(|&id| id >= 1).ok_or_else(|| {
                    Error::parse(line_no, format!("node id {id} is not a positive integer"))
                })?;
                tour.tour_section.push(id);
            }
        }

        if !in_tour_section {
            return Err(Error::invalid_data("missing TOUR_SECTION"));
        }
        if let Some(dimension) = tour.dimension
            && dimension != tour.tour_section.len()
        {
            return Err(Error::invalid_data(format!(
                "DIMENSION is {dimension}, but TOUR_SECTION has {} nodes",
                tour.tour_section.len()
            )));
        }

        Ok(tour)
    }

    /// The tour as a closed cycle `[a, ..., a]`, the shape solvers return.
    pub fn to_closed_tour(&self) -> Tour {
        let mut nodes = self.tour_section.clone();
        if let Some(&first) = nodes.first() {
            nodes.push(first);
        }
        Tour::new(nodes)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl Default for TsplibTour {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TsplibTour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = TsplibWriter::new(f);

        writer.opt_kv("NAME", self.name.as_deref())?;
        writer.kv("TYPE", TsplibProblemType::Tour)?;
        for comment in &self.comment_lines {
            writer.kv("COMMENT", comment)?;
        }
        writer.opt_kv("DIMENSION", self.dimension)?;
        writer.opt_kv("OPTIMUM", self.optimum)?;

        writer.line(TOUR_SECTION_HEADER)?;
        for id in &self.tour_section {
            writer.line(id)?;
        }
        writer.line(SECTION_END_MARKER)?;

        if self.emit_eof {
            writer.line(EOF_MARKER)?;
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

    use super::TsplibTour;
    use crate::tour::Tour;

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("tsp-tour-tests-{name}-{nanos}"))
    }

    #[test]
    fn closed_cycle_is_written_without_repeated_start() {
        let tour = Tour::new(vec![3, 1, 2, 3]);
        let file = TsplibTour::from_tour("tri.greedy", &tour).with_comment("Length = 12");

        assert_eq!(
            file.to_string(),
            "NAME: tri.greedy\nTYPE: TOUR\nCOMMENT: Length = 12\nDIMENSION: 3\n\
             TOUR_SECTION\n3\n1\n2\n-1\nEOF\n"
        );
    }

    #[test]
    fn reads_reference_tour_with_optimum() {
        let text = "NAME : gr4.opt.tour\nOPTIMUM = 61\nCOMMENT : best known\nTYPE : TOUR\n\
                    DIMENSION : 4\nTOUR_SECTION\n1 3\n2\n4\n-1\nEOF\n";
        let tour = TsplibTour::from_text(text).expect("parse tour");

        assert_eq!(tour.name.as_deref(), Some("gr4.opt.tour"));
        assert_eq!(tour.optimum, Some(61.0));
        assert_eq!(tour.comment_lines.len(), 1);
        assert_eq!(tour.tour_section, vec![1, 3, 2, 4]);
        assert_eq!(tour.to_closed_tour().nodes, vec![1, 3, 2, 4, 1]);
    }

    #[test]
    fn rejects_dimension_mismatch_and_missing_section() {
        let err = TsplibTour::from_text("DIMENSION: 3\nTOUR_SECTION\n1\n2\n-1\n")
            .expect_err("two ids for three nodes");
        assert!(err.to_string().contains("DIMENSION is 3"));

        let err = TsplibTour::from_text("NAME: empty\nEOF\n").expect_err("no section");
        assert!(err.to_string().contains("missing TOUR_SECTION"));

        let err = TsplibTour::from_text("TYPE: TSP\nTOUR_SECTION\n1\n-1\n").expect_err("wrong type");
        assert!(err.to_string().contains("unsupported tour TYPE"));
    }

    #[test]
    fn write_then_read_file() {
        let dir = unique_temp_dir("tour-file");
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("sample.tour");

        let written = TsplibTour::from_tour("sample", &Tour::new(vec![2, 4, 1, 3, 2]));
        written.write_to_file(&path).expect("write tour");
        let read = TsplibTour::from_file(&path).expect("read tour");

        assert_eq!(read, written);
        assert_eq!(read.to_closed_tour().nodes, vec![2, 4, 1, 3, 2]);

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
