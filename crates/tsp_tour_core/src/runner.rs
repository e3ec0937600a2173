//! The demo pipeline: pick a problem file, solve it with each configured
//! heuristic, plot the tours and print their costs.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    Error, Result,
    graph::WeightedGraph,
    heuristics::Heuristic,
    io::{
        dialog::{FileDialog, FileFilter, PresetDialog, ProcessDialog},
        options::RunOptions,
    },
    layout::{self, Layout, LayoutKind},
    render::{self, PlotWriter},
    tour::Tour,
    tsplib::{TsplibProblem, TsplibTour},
};

const OPEN_TITLE: &str = "Select a TSP problem file";
const SAVE_TITLE: &str = "Save As";
const TOUR_EXTENSION: &str = "tour";

/// One heuristic's result.
#[derive(Clone, Debug)]
pub struct HeuristicRun {
    pub heuristic: Heuristic,
    pub tour: Tour,
    pub cost: f64,
    pub plot: Option<PathBuf>,
    pub saved: Option<PathBuf>,
}

/// Everything a run produced, in heuristic order.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub problem: TsplibProblem,
    pub runs: Vec<HeuristicRun>,
    pub reference_cost: Option<f64>,
}

/// Runs the pipeline with the dialog the options select, printing to stdout.
pub fn run(options: &RunOptions) -> Result<RunReport> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match options.input_path() {
        Some(path) => {
            let dialog = PresetDialog::new(path.display().to_string());
            run_with_dialog(options, &dialog, &mut out)
        }
        None => {
            let dialog = ProcessDialog::new(options.dialog);
            run_with_dialog(options, &dialog, &mut out)
        }
    }
}

/// Runs the pipeline, asking `dialog` for paths and writing results to `out`.
pub fn run_with_dialog<W: Write>(
    options: &RunOptions,
    dialog: &dyn FileDialog,
    out: &mut W,
) -> Result<RunReport> {
    let selected = dialog.open(OPEN_TITLE, &FileFilter::problem_files(), &options.initial_dir)?;
    if selected.is_empty() {
        return Err(Error::Cancelled("no problem file selected".to_string()));
    }
    info!("runner: problem file {selected}");

    let problem = TsplibProblem::from_file(Path::new(&selected))?;
    let dimension = problem.dimension()?;
    writeln!(out, "Problem Name: {}", problem.name)?;
    writeln!(out, "Problem Type: {}", problem.problem_type)?;
    writeln!(out, "Number of Nodes: {dimension}")?;
    match problem.edge_weight_type {
        Some(kind) => writeln!(out, "Edge Weight Type: {kind}")?,
        None => writeln!(out, "Edge Weight Type: None")?,
    }

    let graph = problem.to_graph()?;
    let params = options.annealing_params();

    let mut solved = Vec::with_capacity(options.heuristics.len());
    for &heuristic in &options.heuristics {
        let solver = heuristic.solver(&params);
        let tour = solver.solve(&graph)?;
        info!("runner: {} finished with {} stops", solver.name(), tour.len());
        writeln!(out, "{} Tour: {tour}", heuristic.label())?;
        solved.push((heuristic, tour));
    }

    let plots = if options.plot {
        plot_tours(options, &problem, &graph, &solved, out)?
    } else {
        vec![None; solved.len()]
    };

    let reference_cost = match options.reference_tour_path() {
        Some(path) => Some(reference_cost(path, &graph)?),
        None => None,
    };

    let mut runs = Vec::with_capacity(solved.len());
    for ((heuristic, tour), plot) in solved.into_iter().zip(plots) {
        let cost = tour.cost(&graph)?;
        writeln!(out, "{} Tour Cost: {cost}", heuristic.label())?;
        if let Some(reference) = reference_cost {
            writeln!(
                out,
                "{} Gap: {:.2}%",
                heuristic.label(),
                gap_percent(cost, reference)
            )?;
        }
        tour.metrics(&graph)?;
        runs.push(HeuristicRun {
            heuristic,
            tour,
            cost,
            plot,
            saved: None,
        });
    }

    if options.save_tours {
        save_tours(options, dialog, &problem.name, &mut runs, out)?;
    }

    Ok(RunReport {
        problem,
        runs,
        reference_cost,
    })
}

fn plot_tours<W: Write>(
    options: &RunOptions,
    problem: &TsplibProblem,
    graph: &WeightedGraph,
    solved: &[(Heuristic, Tour)],
    out: &mut W,
) -> Result<Vec<Option<PathBuf>>> {
    let layout = choose_layout(options, problem, graph);
    let writer = PlotWriter::new(&options.plot_dir, options.viewer_command())
        .with_lenient_viewer(options.uses_default_viewer());

    let mut plots = Vec::with_capacity(solved.len());
    for (heuristic, tour) in solved {
        writeln!(out, "Visualizing {} Tour", heuristic.label())?;
        let cost = tour.cost(graph)?;
        let title = format!("{} - {} Tour (cost {cost})", problem.name, heuristic.label());
        let svg = render::tour_svg(graph, &layout, tour, &title)?;
        let path = writer.show(&problem.name, heuristic.as_str(), &svg)?;
        plots.push(Some(path));
    }
    Ok(plots)
}

fn choose_layout(options: &RunOptions, problem: &TsplibProblem, graph: &WeightedGraph) -> Layout {
    let spring = || layout::spring_layout(graph, options.layout_iterations, options.seed);
    match options.layout {
        LayoutKind::Spring => spring(),
        LayoutKind::Coords => {
            let coords = problem
                .positions()
                .and_then(|positions| layout::coordinate_layout(graph, &positions));
            coords.unwrap_or_else(|| {
                warn!(
                    "runner: {} has no coordinates for every node, using spring layout",
                    problem.name
                );
                spring()
            })
        }
    }
}

fn reference_cost(path: &Path, graph: &WeightedGraph) -> Result<f64> {
    let reference = TsplibTour::from_file(path)?;
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let covers = reference.tour_section.len() == n
        && reference.tour_section.iter().all(|&node| {
            graph
                .index_of(node)
                .is_some_and(|idx| !std::mem::replace(&mut seen[idx], true))
        });
    if !covers {
        return Err(Error::invalid_data(format!(
            "reference tour {} must visit each of the {n} problem nodes exactly once",
            path.display()
        )));
    }
    let cost = reference.to_closed_tour().cost(graph)?;
    info!("runner: reference tour {} cost={cost}", path.display());
    Ok(cost)
}

fn gap_percent(cost: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    (cost - reference) / reference * 100.0
}

fn save_tours<W: Write>(
    options: &RunOptions,
    dialog: &dyn FileDialog,
    problem_name: &str,
    runs: &mut [HeuristicRun],
    out: &mut W,
) -> Result<()> {
    let preset = PresetDialog::default();
    let (dialog, start_dir): (&dyn FileDialog, PathBuf) = match options.tour_dir_path() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            (&preset, dir.to_path_buf())
        }
        None => (dialog, options.initial_dir.clone()),
    };

    for run in runs.iter_mut() {
        let name = format!("{problem_name}.{}.{TOUR_EXTENSION}", run.heuristic.as_str());
        let selected = dialog.save(
            SAVE_TITLE,
            &start_dir,
            &name,
            TOUR_EXTENSION,
            &FileFilter::tour_files(),
        )?;
        if selected.is_empty() {
            info!("runner: not saving {name}");
            continue;
        }

        let path = PathBuf::from(selected);
        TsplibTour::from_tour(name, &run.tour)
            .with_comment(format!("Length = {}", run.cost))
            .write_to_file(&path)?;
        writeln!(out, "Saved {} Tour: {}", run.heuristic.label(), path.display())?;
        run.saved = Some(path);
    }
    Ok(())
}
