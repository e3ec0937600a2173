use std::{process::ExitCode, time::Instant};

use log::info;

use tsp_tour_core::{Result, RunOptions, logging, run};

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let now = Instant::now();
    let options = RunOptions::from_args()?;
    logging::init_logger(&options)?;

    info!("options: {options}");

    let report = run(&options)?;

    info!(
        "output: problem={} heuristics={} time={:.2}s",
        report.problem.name,
        report.runs.len(),
        now.elapsed().as_secs_f32()
    );

    Ok(())
}
