use std::{
    env,
    path::{Path, PathBuf},
};

use log::LevelFilter;
use tsp_tour_derive::{CliOptions, CliValue, KvDisplay};

use crate::{
    Error, Result,
    heuristics::{AnnealMove, AnnealingParams, Heuristic, annealing},
    io::dialog::DialogBackend,
    layout::{self, LayoutKind},
};

const DEFAULT_INITIAL_DIR: &str = "Example_problems";
const DEFAULT_PLOT_DIR: &str = "plots";
const NO_VIEWER: &str = "none";

/// Desktop opener used for plots unless `--viewer` says otherwise.
#[cfg(target_os = "macos")]
pub const DEFAULT_VIEWER: &str = "open -W";
#[cfg(windows)]
pub const DEFAULT_VIEWER: &str = "explorer";
#[cfg(not(any(target_os = "macos", windows)))]
pub const DEFAULT_VIEWER: &str = "xdg-open";

/// Runtime options for one run of the pipeline.
#[derive(Clone, Debug, CliOptions, KvDisplay)]
pub struct RunOptions {
    /// Problem file. Empty means ask with the open dialog.
    #[cli(long = "input")]
    pub input: String,
    /// Directory the open and save dialogs start in.
    #[cli(long = "initial-dir")]
    #[kv(fmt = "path")]
    pub initial_dir: PathBuf,
    /// Heuristics to run, in order.
    #[cli(long = "heuristics", parse_with = "Heuristic::parse_list")]
    #[kv(fmt = "list")]
    pub heuristics: Vec<Heuristic>,
    /// Seed for simulated annealing and the spring layout.
    #[cli(long = "seed")]
    pub seed: u64,
    #[cli(long = "sa-temperature")]
    pub sa_temperature: f64,
    #[cli(long = "sa-alpha")]
    pub sa_alpha: f64,
    #[cli(long = "sa-max-iterations")]
    pub sa_max_iterations: usize,
    #[cli(long = "sa-inner-iterations")]
    pub sa_inner_iterations: usize,
    #[cli(long = "sa-move", parse_with = "AnnealMove::parse")]
    pub sa_move: AnnealMove,
    #[cli(long = "layout", parse_with = "LayoutKind::parse")]
    pub layout: LayoutKind,
    #[cli(long = "layout-iterations")]
    pub layout_iterations: usize,
    /// Write an SVG plot per tour.
    #[cli(long = "plot", flag)]
    pub plot: bool,
    #[cli(long = "plot-dir")]
    #[kv(fmt = "path")]
    pub plot_dir: PathBuf,
    /// Command that opens each plot; the run waits for it to exit. Empty or
    /// `none` means plots are only written.
    #[cli(long = "viewer")]
    pub viewer: String,
    #[cli(long = "dialog", parse_with = "DialogBackend::parse")]
    pub dialog: DialogBackend,
    /// Save every tour as a TSPLIB `.tour` file.
    #[cli(long = "save-tours", flag)]
    pub save_tours: bool,
    /// Directory for saved tours. Empty means ask with the save dialog.
    #[cli(long = "tour-dir")]
    pub tour_dir: String,
    /// Known tour to compare every heuristic against.
    #[cli(long = "reference-tour")]
    pub reference_tour: String,
    /// Structured logging level.
    #[cli(long = "log-level", parse_with = "LogLevel::parse")]
    pub log_level: LogLevel,
    /// Logging output format.
    #[cli(long = "log-format", parse_with = "LogFormat::parse")]
    pub log_format: LogFormat,
    /// Include timestamps in log lines.
    #[cli(long = "log-timestamp", flag)]
    pub log_timestamp: bool,
    /// Optional output file path for logs. Empty means stderr.
    #[cli(long = "log-output")]
    pub log_output: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-level")]
pub enum LogLevel {
    Error,
    #[cli(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-format")]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            initial_dir: PathBuf::from(DEFAULT_INITIAL_DIR),
            heuristics: vec![Heuristic::Greedy, Heuristic::Annealing],
            seed: annealing::DEFAULT_SEED,
            sa_temperature: annealing::DEFAULT_TEMPERATURE,
            sa_alpha: annealing::DEFAULT_ALPHA,
            sa_max_iterations: annealing::DEFAULT_MAX_ITERATIONS,
            sa_inner_iterations: annealing::DEFAULT_INNER_ITERATIONS,
            sa_move: AnnealMove::Swap,
            layout: LayoutKind::Spring,
            layout_iterations: layout::DEFAULT_ITERATIONS,
            plot: true,
            plot_dir: PathBuf::from(DEFAULT_PLOT_DIR),
            viewer: DEFAULT_VIEWER.to_string(),
            dialog: DialogBackend::Zenity,
            save_tours: false,
            tour_dir: String::new(),
            reference_tour: String::new(),
            log_level: LogLevel::Warn,
            log_format: LogFormat::Compact,
            log_timestamp: true,
            log_output: String::new(),
        }
    }
}

impl RunOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse_from_iter(env::args().skip(1))
    }

    pub fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let Some(raw_name) = arg.strip_prefix("--") else {
                return Err(Error::invalid_input(format!(
                    "Unexpected argument: {arg}\n\n{}",
                    Self::usage()
                )));
            };

            if raw_name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Invalid option name: {arg}\n\n{}",
                    Self::usage()
                )));
            }

            let (name, value) = Self::split_arg(raw_name, &mut args);
            if !options.apply_cli_option(&name, value)? {
                return Err(Error::invalid_input(format!(
                    "Unknown option: --{name}\n\n{}",
                    Self::usage()
                )));
            }
        }

        options.annealing_params().validate()?;
        Ok(options)
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  tsp-tour [options]\n",
            "  tsp-tour [options] --input problem.tsp\n\n",
            "Options:\n",
            "  --input <path>\n",
            "  --initial-dir <path>\n",
            "  --heuristics <greedy,annealing,christofides>\n",
            "  --seed <u64>\n",
            "  --sa-temperature <f64>\n",
            "  --sa-alpha <f64>\n",
            "  --sa-max-iterations <usize>\n",
            "  --sa-inner-iterations <usize>\n",
            "  --sa-move <1-1|1-0>\n",
            "  --layout <spring|coords>\n",
            "  --layout-iterations <usize>\n",
            "  --plot[=<bool>]\n",
            "  --no-plot\n",
            "  --plot-dir <path>\n",
            "  --viewer <command|none>\n",
            "  --dialog <zenity|kdialog>\n",
            "  --save-tours[=<bool>]\n",
            "  --no-save-tours\n",
            "  --tour-dir <path>\n",
            "  --reference-tour <path>\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>]\n",
            "  --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  tsp-tour\n",
            "  tsp-tour --input Example_problems/gr17.tsp --heuristics greedy,christofides\n",
            "  tsp-tour --input br17.atsp --no-plot --log-level=info\n",
            "  tsp-tour --viewer eog --layout coords --seed 42\n",
            "  tsp-tour --save-tours --tour-dir tours --log-output run.log\n",
        )
    }

    pub fn annealing_params(&self) -> AnnealingParams {
        AnnealingParams {
            temperature: self.sa_temperature,
            alpha: self.sa_alpha,
            max_iterations: self.sa_max_iterations,
            inner_iterations: self.sa_inner_iterations,
            movement: self.sa_move,
            seed: self.seed,
        }
    }

    pub fn input_path(&self) -> Option<&Path> {
        optional_path(&self.input)
    }

    pub fn log_output_path(&self) -> Option<&Path> {
        optional_path(&self.log_output)
    }

    pub fn tour_dir_path(&self) -> Option<&Path> {
        optional_path(&self.tour_dir)
    }

    pub fn reference_tour_path(&self) -> Option<&Path> {
        optional_path(&self.reference_tour)
    }

    pub fn viewer_command(&self) -> Option<String> {
        let viewer = self.viewer.trim();
        (!viewer.is_empty() && !viewer.eq_ignore_ascii_case(NO_VIEWER))
            .then(|| viewer.to_string())
    }

    /// True while plots go to the desktop opener rather than a chosen viewer.
    pub fn uses_default_viewer(&self) -> bool {
        self.viewer.trim() == DEFAULT_VIEWER
    }
}

fn optional_path(raw: &str) -> Option<&Path> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        None
    } else {
        Some(Path::new(raw))
    }
}
