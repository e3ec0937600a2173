//! Heuristic TSP tours for TSPLIB problems: parsing, weighted graphs, tour
//! evaluation, greedy/annealing/Christofides solvers and SVG plots.

mod error;
pub mod graph;
pub mod heuristics;
mod io;
pub mod layout;
pub mod logging;
pub mod render;
mod runner;
pub mod tour;
pub mod tsplib;

pub use error::{Error, Result};
pub use graph::{NodeId, WeightedGraph};
pub use heuristics::{Heuristic, TourSolver};
pub use io::dialog::{self, FileDialog, FileFilter};
pub use io::options::{self, RunOptions};
pub use runner::{HeuristicRun, RunReport, run, run_with_dialog};
pub use tour::{Tour, tour_cost};
pub use tsplib::{TsplibProblem, TsplibTour};
