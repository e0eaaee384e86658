use std::env;
use std::path::PathBuf;

use ctt_estimator::config::{self, RunConfig};
use ctt_estimator::{LoadError, Solution, parser};
use log::info;

fn main() -> Result<(), LoadError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // no arguments: run against the local test dataset
    let mut paths: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        paths = config::local_dataset();
    }

    let problem = parser::load_problem(&paths)?;
    let run = RunConfig::from_env();
    info!(
        "{} courses, {} rooms, {} lectures, {} attempts",
        problem.no_of_courses(),
        problem.no_of_rooms(),
        problem.total_lectures(),
        run.iterations
    );

    let mut solution = Solution::new(&problem, &run);
    let report = solution.run(run.iterations);
    println!("{report}");
    Ok(())
}
