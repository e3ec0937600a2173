//! Open/save file pickers.
//!
//! Desktop dialogs run as child processes (`zenity` or `kdialog`) and the
//! call blocks until the user answers. Every dialog returns the chosen path as
//! a string, empty when the user cancels.

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tsp_tour_derive::CliValue;

use crate::{Error, Result};

/// Exit status both zenity and kdialog use for "Cancel" or a closed window.
const CANCELLED_EXIT_CODE: i32 = 1;

/// Pattern group shown in a dialog's filter list, e.g. `TSP files` / `*.tsp`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileFilter {
    pub label: String,
    pub patterns: Vec<String>,
}

impl FileFilter {
    pub fn new(label: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            label: label.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn all_files() -> Self {
        Self::new("All files", &["*"])
    }

    /// Filters for TSPLIB problem files.
    pub fn problem_files() -> Vec<Self> {
        vec![
            Self::new("TSP files", &["*.tsp"]),
            Self::new("ATSP files", &["*.atsp"]),
        ]
    }

    pub fn tour_files() -> Vec<Self> {
        vec![Self::new("Tour files", &["*.tour"])]
    }
}

/// File dialog service.
pub trait FileDialog {
    /// Asks for an existing file. Returns an empty string on cancel.
    fn open(&self, title: &str, filters: &[FileFilter], initial_dir: &Path) -> Result<String>;

    /// Asks for a path to save to. `default_extension` is appended when the
    /// chosen name has none. Returns an empty string on cancel.
    fn save(
        &self,
        title: &str,
        initial_dir: &Path,
        default_name: &str,
        default_extension: &str,
        filters: &[FileFilter],
    ) -> Result<String>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "dialog")]
pub enum DialogBackend {
    #[cli(alias = "gtk")]
    Zenity,
    #[cli(alias = "kde")]
    Kdialog,
}

impl DialogBackend {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Zenity => "zenity",
            Self::Kdialog => "kdialog",
        }
    }
}

/// Dialog backed by a desktop dialog program.
#[derive(Clone, Debug)]
pub struct ProcessDialog {
    backend: DialogBackend,
    program: PathBuf,
}

impl ProcessDialog {
    pub fn new(backend: DialogBackend) -> Self {
        Self {
            backend,
            program: PathBuf::from(backend.program()),
        }
    }

    /// Uses `program` instead of looking the backend up on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn open_args(&self, title: &str, filters: &[FileFilter], initial_dir: &Path) -> Vec<String> {
        let start = dir_with_separator(initial_dir);
        match self.backend {
            DialogBackend::Zenity => {
                let mut args = vec![
                    "--file-selection".to_string(),
                    format!("--title={title}"),
                    format!("--filename={start}"),
                ];
                args.extend(zenity_filters(filters));
                args
            }
            DialogBackend::Kdialog => vec![
                "--title".to_string(),
                title.to_string(),
                "--getopenfilename".to_string(),
                start,
                kdialog_filter(filters),
            ],
        }
    }

    fn save_args(
        &self,
        title: &str,
        initial_dir: &Path,
        default_name: &str,
        filters: &[FileFilter],
    ) -> Vec<String> {
        let start = initial_dir.join(default_name).display().to_string();
        match self.backend {
            DialogBackend::Zenity => {
                let mut args = vec![
                    "--file-selection".to_string(),
                    "--save".to_string(),
                    "--confirm-overwrite".to_string(),
                    format!("--title={title}"),
                    format!("--filename={start}"),
                ];
                args.extend(zenity_filters(filters));
                args
            }
            DialogBackend::Kdialog => vec![
                "--title".to_string(),
                title.to_string(),
                "--getsavefilename".to_string(),
                start,
                kdialog_filter(filters),
            ],
        }
    }

    fn run(&self, args: &[String], context: &str) -> Result<String> {
        log::debug!(
            "dialog: {} {}",
            self.program.display(),
            args.join(" ")
        );
        let output = Command::new(&self.program).args(args).output().map_err(|e| {
            Error::other(format!(
                "failed to launch {} for {context}: {e}",
                self.program.display()
            ))
        })?;
        selection_from_output(output, context)
    }
}

impl FileDialog for ProcessDialog {
    fn open(&self, title: &str, filters: &[FileFilter], initial_dir: &Path) -> Result<String> {
        let args = self.open_args(title, filters, initial_dir);
        self.run(&args, "open dialog")
    }

    fn save(
        &self,
        title: &str,
        initial_dir: &Path,
        default_name: &str,
        default_extension: &str,
        filters: &[FileFilter],
    ) -> Result<String> {
        let args = self.save_args(title, initial_dir, default_name, filters);
        let selected = self.run(&args, "save dialog")?;
        Ok(with_default_extension(selected, default_extension))
    }
}

/// Non-interactive dialog: `open` answers with a fixed path and `save`
/// accepts the suggested name inside the suggested directory.
#[derive(Clone, Debug, Default)]
pub struct PresetDialog {
    path: String,
}

impl PresetDialog {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl FileDialog for PresetDialog {
    fn open(&self, _title: &str, _filters: &[FileFilter], _initial_dir: &Path) -> Result<String> {
        Ok(self.path.clone())
    }

    fn save(
        &self,
        _title: &str,
        initial_dir: &Path,
        default_name: &str,
        default_extension: &str,
        _filters: &[FileFilter],
    ) -> Result<String> {
        let path = initial_dir.join(default_name).display().to_string();
        Ok(with_default_extension(path, default_extension))
    }
}

fn selection_from_output(output: Output, context: &str) -> Result<String> {
    if output.status.success() {
        let selected = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Ok(selected);
    }
    if output.status.code() == Some(CANCELLED_EXIT_CODE) {
        log::info!("dialog: {context} cancelled");
        return Ok(String::new());
    }
    Err(Error::ProcessFailed {
        context: format!("{context} exited with {}", output.status),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn dir_with_separator(dir: &Path) -> String {
    let mut start = dir.display().to_string();
    if !start.ends_with(std::path::MAIN_SEPARATOR) {
        start.push(std::path::MAIN_SEPARATOR);
    }
    start
}

fn zenity_filters(filters: &[FileFilter]) -> Vec<String> {
    filters
        .iter()
        .cloned()
        .chain(std::iter::once(FileFilter::all_files()))
        .map(|f| format!("--file-filter={} | {}", f.label, f.patterns.join(" ")))
        .collect()
}

fn kdialog_filter(filters: &[FileFilter]) -> String {
    filters
        .iter()
        .cloned()
        .chain(std::iter::once(FileFilter::all_files()))
        .map(|f| format!("{}|{}", f.patterns.join(" "), f.label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends `.ext` to a non-empty path whose file name has no extension.
fn with_default_extension(path: String, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if path.is_empty() || extension.is_empty() || Path::new(&path).extension().is_some() {
        return path;
    }
    format!("{path}.{extension}")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{
        DialogBackend, FileDialog, FileFilter, PresetDialog, ProcessDialog, with_default_extension,
    };

    #[test]
    fn zenity_open_args_carry_title_start_dir_and_filters() {
        let dialog = ProcessDialog::new(DialogBackend::Zenity);
        let args = dialog.open_args(
            "Select a problem",
            &FileFilter::problem_files(),
            Path::new("Example_problems"),
        );

        assert_eq!(args[0], "--file-selection");
        assert_eq!(args[1], "--title=Select a problem");
        assert_eq!(
            args[2],
            format!("--filename=Example_problems{}", std::path::MAIN_SEPARATOR)
        );
        assert_eq!(args[3], "--file-filter=TSP files | *.tsp");
        assert_eq!(args[4], "--file-filter=ATSP files | *.atsp");
        assert_eq!(args[5], "--file-filter=All files | *");
    }

    #[test]
    fn kdialog_save_args_use_one_filter_argument() {
        let dialog = ProcessDialog::new(DialogBackend::Kdialog);
        let args = dialog.save_args(
            "Save As",
            Path::new("out"),
            "gr17.tour",
            &FileFilter::tour_files(),
        );

        assert_eq!(args[0], "--title");
        assert_eq!(args[2], "--getsavefilename");
        assert_eq!(args[3], Path::new("out").join("gr17.tour").display().to_string());
        assert_eq!(args[4], "*.tour|Tour files\n*|All files");
    }

    #[test]
    fn cancelled_dialog_returns_empty_string() {
        // `false` exits with status 1, the code dialogs use for Cancel
        let dialog = ProcessDialog::new(DialogBackend::Zenity).with_program("false");
        let selected = dialog
            .open("t", &[], Path::new("."))
            .expect("cancel is not an error");
        assert_eq!(selected, "");
    }

    #[test]
    fn missing_dialog_program_is_an_error() {
        let dialog =
            ProcessDialog::new(DialogBackend::Kdialog).with_program("/nonexistent/kdialog-binary");
        let err = dialog
            .open("t", &[], Path::new("."))
            .expect_err("program does not exist");
        assert!(err.to_string().contains("failed to launch"));
    }

    #[test]
    fn preset_dialog_answers_without_prompting() {
        let dialog = PresetDialog::new("problems/gr17.tsp");
        assert_eq!(
            dialog
                .open("t", &FileFilter::problem_files(), Path::new("."))
                .expect("open"),
            "problems/gr17.tsp"
        );
        assert_eq!(
            dialog
                .save("t", Path::new("tours"), "gr17", "tour", &[])
                .expect("save"),
            Path::new("tours").join("gr17.tour").display().to_string()
        );
    }

    #[test]
    fn default_extension_only_fills_missing_extensions() {
        assert_eq!(with_default_extension("a/b".to_string(), "tour"), "a/b.tour");
        assert_eq!(with_default_extension("a/b.txt".to_string(), ".tour"), "a/b.txt");
        assert_eq!(with_default_extension(String::new(), "tour"), "");
    }

    #[test]
    fn backend_parses_program_names() {
        assert_eq!(DialogBackend::parse("KDE").expect("alias"), DialogBackend::Kdialog);
        assert_eq!(DialogBackend::Zenity.program(), "zenity");
    }
}
