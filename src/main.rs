use std::env;
use std::process::ExitCode;

use tracing_subscriber::filter::LevelFilter;

use pit_strategy_lib::{run_season, RaceOutcome, ResultsLog, SeasonConfig};

fn main() -> ExitCode {
    let config = match env::args().nth(1) {
        Some(path) => match SeasonConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SeasonConfig::default(),
    };

    // Also bridges records from the `log` facade used by the library
    let level = config.log_level.parse().unwrap_or(LevelFilter::INFO);
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .try_init()
    {
        eprintln!("Failed to init logging. {e}");
    }

    let results_log = match ResultsLog::open(&config.results_path) {
        Ok(results_log) => results_log,
        Err(e) => {
            eprintln!("Failed to open {}: {e}", config.results_path.display());
            return ExitCode::FAILURE;
        }
    };

    let report = match run_season(&config, &results_log) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Season could not start: {e}");
            return ExitCode::FAILURE;
        }
    };

    for (race_number, outcome) in &report.outcomes {
        match outcome {
            RaceOutcome::Finished(result) => match result.skipped {
                Some(fault) => println!("Race {race_number}: skipped ({fault:?})"),
                None => println!("Race {race_number}: finished {} laps", result.laps),
            },
            RaceOutcome::Failed(e) => println!("Race {race_number}: failed - {e}"),
        }
    }

    println!();
    println!("Season Standings (seed {})", report.seed);
    println!("{:>8}  {:<12} {:>8}", "Position", "Driver", "Points");
    for (position, (driver, points)) in report.standings.sorted().iter().enumerate() {
        println!("{:>8}  {:<12} {:>8}", position + 1, driver, points);
    }

    if results_log.failed_writes() > 0 {
        eprintln!(
            "{} lap tables could not be written to {}",
            results_log.failed_writes(),
            results_log.path().display()
        );
    }

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
