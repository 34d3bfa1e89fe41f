//! Pit Strategy Sim - Season simulator for tire-strategy races
//!
//! Drivers run laps on degrading tires and pit on a schedule or when a tire
//! wears out. A season runs each race on its own thread and totals the points.

pub mod config;
pub mod error;
pub mod results_log;
pub mod sim;

pub use config::SeasonConfig;
pub use error::{ConfigError, ResultsLogError, SimError};
pub use results_log::ResultsLog;
pub use sim::{
    Compounds, DriverState, LapObserver, LapSnapshot, RaceOutcome, RaceResult, Season,
    SeasonReport, SeasonStandings,
};

/// Run a season on the standard compounds and strategy described by `config`.
///
/// Fails only if the compounds cannot be built; race faults are reported
/// per race in the returned [`SeasonReport`].
pub fn run_season<O>(config: &SeasonConfig, observer: &O) -> Result<SeasonReport, SimError>
where
    O: LapObserver + ?Sized,
{
    let compounds = Compounds::standard()?;
    let season = Season::from_config(config);
    let report = season.run(
        |_| sim::default_roster(config.driver_count, &compounds),
        observer,
    );
    Ok(report)
}
