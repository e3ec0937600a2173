use std::str::FromStr;

use super::{
    DisplayDataEntry, DisplayDataType, EdgeWeightFormat, EdgeWeightType, FixedEdge, NodeCoord,
    NodeCoordType, SECTION_END_MARKER, TsplibProblem, TsplibProblemType,
};
use crate::{Error, Result, graph::NodeId};

const EOF_MARKER: &str = "EOF";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    Header,
    NodeCoord,
    DisplayData,
    EdgeWeight,
    FixedEdges,
    /// Sections this reader does not model (DEMAND_SECTION, DEPOT_SECTION, ...).
    Skipped,
}

/// Parses TSPLIB problem text. Structural checks that need the whole file
/// (counts against DIMENSION) are left to [`TsplibProblem::validate`].
pub(super) fn parse_problem(text: &str) -> Result<TsplibProblem> {
    let mut problem = TsplibProblem::new("", TsplibProblemType::Tsp);
    problem.emit_eof = false;
    let mut section = Section::Header;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case(EOF_MARKER) {
            problem.emit_eof = true;
            break;
        }

        if starts_with_keyword(line) {
            if let Some(next) = section_for(line) {
                section = next;
                continue;
            }
            let (key, value) = split_header(line).ok_or_else(|| {
                Error::parse(line_no, format!("expected 'KEY: value', got '{line}'"))
            })?;
            apply_header(&mut problem, &key, value, line_no)?;
            section = Section::Header;
            continue;
        }

        match section {
            Section::Header => {
                return Err(Error::parse(
                    line_no,
                    format!("data line '{line}' outside of any section"),
                ));
            }
            Section::NodeCoord => {
                let coord = parse_node_coord(line, line_no)?;
                problem.node_coord_section.push(coord);
            }
            Section::DisplayData => {
                let values = parse_numbers::<f64>(line, line_no)?;
                let [id, x, y] = values[..] else {
                    return Err(Error::parse(
                        line_no,
                        format!("display data needs 'id x y', got '{line}'"),
                    ));
                };
                problem.display_data_section.push(DisplayDataEntry {
                    id: node_id(id, line_no)?,
                    x,
                    y,
                });
            }
            Section::EdgeWeight => {
                let weights = parse_numbers::<f64>(line, line_no)?;
                problem.edge_weight_section.extend(weights);
            }
            Section::FixedEdges => {
                let values = parse_numbers::<isize>(line, line_no)?;
                if values.first() == Some(&SECTION_END_MARKER) {
                    section = Section::Header;
                    continue;
                }
                let [from, to] = values[..] else {
                    return Err(Error::parse(
                        line_no,
                        format!("fixed edge needs 'from to', got '{line}'"),
                    ));
                };
                problem.fixed_edges_section.push(FixedEdge {
                    from: positive_id(from, line_no)?,
                    to: positive_id(to, line_no)?,
                });
            }
            Section::Skipped => {}
        }
    }

    if problem.node_coord_type.is_none() && !problem.node_coord_section.is_empty() {
        let threed = problem.node_coord_section.iter().any(|c| c.z.is_some());
        problem.node_coord_type = Some(if threed {
            NodeCoordType::ThreedCoords
        } else {
            NodeCoordType::TwodCoords
        });
    }

    Ok(problem)
}

fn starts_with_keyword(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Section headers are a bare name, optionally followed by `:`.
fn section_for(line: &str) -> Option<Section> {
    let name = line.trim_end_matches(':').trim();
    if name.contains([':', '=']) || name.contains(char::is_whitespace) {
        return None;
    }
    let name = name.to_ascii_uppercase();
    match name.as_str() {
        "NODE_COORD_SECTION" => Some(Section::NodeCoord),
        "DISPLAY_DATA_SECTION" => Some(Section::DisplayData),
        "EDGE_WEIGHT_SECTION" => Some(Section::EdgeWeight),
        "FIXED_EDGES_SECTION" => Some(Section::FixedEdges),
        other if other.ends_with("_SECTION") => {
            log::debug!("tsplib: skipping unsupported section {other}");
            Some(Section::Skipped)
        }
        _ => None,
    }
}

fn split_header(line: &str) -> Option<(String, &str)> {
    line.split_once(':')
        .or_else(|| line.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim()))
}

fn apply_header(
    problem: &mut TsplibProblem,
    key: &str,
    value: &str,
    line_no: usize,
) -> Result<()> {
    match key {
        "NAME" => problem.name = value.to_string(),
        "COMMENT" => problem.comment_lines.push(value.to_string()),
        "TYPE" => {
            let word = value.split_whitespace().next().unwrap_or(value);
            problem.problem_type =
                keyword(TsplibProblemType::from_keyword(word), key, value, line_no)?;
        }
        "DIMENSION" => problem.dimension = Some(number(value, key, line_no)?),
        "CAPACITY" => problem.capacity = Some(number(value, key, line_no)?),
        "EDGE_WEIGHT_TYPE" => {
            problem.edge_weight_type =
                Some(keyword(EdgeWeightType::from_keyword(value), key, value, line_no)?);
        }
        "EDGE_WEIGHT_FORMAT" => {
            problem.edge_weight_format =
                Some(keyword(EdgeWeightFormat::from_keyword(value), key, value, line_no)?);
        }
        "NODE_COORD_TYPE" => {
            problem.node_coord_type =
                Some(keyword(NodeCoordType::from_keyword(value), key, value, line_no)?);
        }
        "DISPLAY_DATA_TYPE" => {
            problem.display_data_type =
                Some(keyword(DisplayDataType::from_keyword(value), key, value, line_no)?);
        }
        other => log::debug!("tsplib: ignoring header {other} on line {line_no}"),
    }
    Ok(())
}

fn keyword<T>(parsed: Option<T>, key: &str, value: &str, line_no: usize) -> Result<T> {
    parsed.ok_or_else(|| Error::parse(line_no, format!("unknown {key} '{value}'")))
}

fn number<T: FromStr>(value: &str, key: &str, line_no: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| Error::parse(line_no, format!("bad {key} value '{value}': {e}")))
}

fn parse_numbers<T: FromStr>(line: &str, line_no: usize) -> Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|e| Error::parse(line_no, format!("bad number '{token}': {e}")))
        })
        .collect()
}

fn parse_node_coord(line: &str, line_no: usize) -> Result<NodeCoord> {
    let values = parse_numbers::<f64>(line, line_no)?;
    match values[..] {
        [id, x, y] => Ok(NodeCoord::twod(node_id(id, line_no)?, x, y)),
        [id, x, y, z] => Ok(NodeCoord::threed(node_id(id, line_no)?, x, y, z)),
        _ => Err(Error::parse(
            line_no,
            format!("node coordinate needs 'id x y [z]', got '{line}'"),
        )),
    }
}

fn node_id(raw: f64, line_no: usize) -> Result<NodeId> {
    if raw.fract() != 0.0 || raw < 1.0 {
        return Err(Error::parse(
            line_no,
            format!("node id {raw} is not a positive integer"),
        ));
    }
    Ok(raw as NodeId)
}

fn positive_id(raw: isize, line_no: usize) -> Result<NodeId> {
    NodeId::try_from(raw)
        .ok()
        .filter(|&id| id >= 1)
        .ok_or_else(|| Error::parse(line_no, format!("node id {raw} is not a positive integer")))
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        tsplib::{
            DisplayDataType, EdgeWeightFormat, EdgeWeightType, NodeCoordType, TsplibProblem,
            TsplibProblemType,
        },
    };

    const GR_SAMPLE: &str = "\
NAME: gr4
TYPE: TSP
COMMENT: four cities
DIMENSION: 4
EDGE_WEIGHT_TYPE: EXPLICIT
EDGE_WEIGHT_FORMAT: LOWER_DIAG_ROW
DISPLAY_DATA_TYPE: TWOD_DISPLAY
EDGE_WEIGHT_SECTION
0 12 0
13 23 0 14
24 34 0
DISPLAY_DATA_SECTION
1 0.0 0.0
2 1.0 0.0
3 1.0 1.0
4 0.0 1.0
EOF
";

    #[test]
    fn reads_explicit_problem_with_wrapped_weights() {
        let problem = TsplibProblem::from_text(GR_SAMPLE).expect("parse gr4");

        assert_eq!(problem.name, "gr4");
        assert_eq!(problem.problem_type, TsplibProblemType::Tsp);
        assert_eq!(problem.comment_lines, vec!["four cities".to_string()]);
        assert_eq!(problem.dimension, Some(4));
        assert_eq!(problem.edge_weight_type, Some(EdgeWeightType::Explicit));
        assert_eq!(
            problem.edge_weight_format,
            Some(EdgeWeightFormat::LowerDiagRow)
        );
        assert_eq!(problem.display_data_type, Some(DisplayDataType::TwodDisplay));
        assert_eq!(problem.edge_weight_section.len(), 10);
        assert_eq!(problem.display_data_section.len(), 4);
        assert!(problem.emit_eof);

        assert_eq!(problem.weight(2, 3).expect("weight"), 23.0);
        assert_eq!(problem.weight(4, 1).expect("weight"), 14.0);
        assert_eq!(problem.nodes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn reads_coordinates_with_equals_headers_and_lowercase_keys() {
        let text = "name = tri\ntype = tsp\ndimension = 3\nedge_weight_type = euc_2d\n\
                    NODE_COORD_SECTION\n1 0 0\n2 3 0\n3 3 4\n";
        let problem = TsplibProblem::from_text(text).expect("parse tri");

        assert_eq!(problem.name, "tri");
        assert_eq!(problem.edge_weight_type, Some(EdgeWeightType::Euc2d));
        assert_eq!(problem.node_coord_type, Some(NodeCoordType::TwodCoords));
        assert!(!problem.emit_eof);
        assert_eq!(problem.weight(1, 3).expect("weight"), 5.0);
    }

    #[test]
    fn fixed_edges_stop_at_terminator() {
        let text = "NAME: f\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EUC_2D\n\
                    NODE_COORD_SECTION\n1 0 0\n2 1 0\n3 2 0\n\
                    FIXED_EDGES_SECTION\n1 2\n-1\nEOF\n";
        let problem = TsplibProblem::from_text(text).expect("parse fixed edges");

        assert_eq!(problem.fixed_edges_section.len(), 1);
        assert_eq!(problem.fixed_edges_section[0].from, 1);
        assert_eq!(problem.fixed_edges_section[0].to, 2);
    }

    #[test]
    fn unknown_headers_and_sections_are_skipped() {
        let text = "NAME: c\nTYPE: CVRP\nVEHICLES: 2\nCAPACITY: 10\nDIMENSION: 2\n\
                    EDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 0 1\n\
                    DEMAND_SECTION\n1 0\n2 5\nDEPOT_SECTION\n1\n-1\nEOF\n";
        let problem = TsplibProblem::from_text(text).expect("parse cvrp");

        assert_eq!(problem.problem_type, TsplibProblemType::Cvrp);
        assert_eq!(problem.capacity, Some(10));
        assert_eq!(problem.node_coord_section.len(), 2);
    }

    #[test]
    fn header_values_naming_a_section_stay_headers() {
        let text = "NAME: c\nTYPE: TSP\nCOMMENT: coords in NODE_COORD_SECTION\nDIMENSION: 2\n\
                    EDGE_WEIGHT_TYPE = EUC_2D\nNODE_COORD_SECTION :\n1 0 0\n2 3 4\nEOF\n";
        let problem = TsplibProblem::from_text(text).expect("parse problem");

        assert_eq!(
            problem.comment_lines,
            vec!["coords in NODE_COORD_SECTION".to_string()]
        );
        assert_eq!(problem.node_coord_section.len(), 2);
        assert_eq!(problem.weight(1, 2).expect("weight"), 5.0);
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let text = "NAME: bad\nTYPE: TSP\nDIMENSION: four\n";
        match TsplibProblem::from_text(text) {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("DIMENSION"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let text = "NAME: bad\nDIMENSION: 2\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 x 1\n";
        match TsplibProblem::from_text(text) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_keywords_and_stray_data() {
        let err = TsplibProblem::from_text("NAME: x\nEDGE_WEIGHT_TYPE: EUC_9D\n")
            .expect_err("unknown weight type");
        assert!(err.to_string().contains("EDGE_WEIGHT_TYPE"));

        let err = TsplibProblem::from_text("NAME: x\n1 2 3\n").expect_err("stray data");
        assert!(err.to_string().contains("outside of any section"));
    }

    #[test]
    fn display_output_reads_back_to_the_same_problem() {
        let problem = TsplibProblem::from_text(GR_SAMPLE).expect("parse gr4");
        let reread = TsplibProblem::from_text(&problem.to_string()).expect("reparse gr4");
        assert_eq!(reread, problem);
    }
}
