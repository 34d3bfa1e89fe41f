//! Simulation Module
//!
//! Tire wear, driver pit logic, the race lap loop and the season runner that
//! drives one race per thread.

pub mod driver;
pub mod race;
pub mod roster;
pub mod season;
pub mod tire;

pub use driver::{DriverEngine, DriverState, LapOutcome, PitStop, StrategyEntry};
pub use race::{
    ClassifiedDriver, LapObserver, LapSnapshot, Race, RaceResult, RaceStatus, RosterFault,
    SnapshotRow, MAX_GRID_SIZE, POINTS_TABLE,
};
pub use roster::{default_roster, Compounds};
pub use season::{race_seed, RaceOutcome, Season, SeasonReport, SeasonStandings};
pub use tire::{TireInstance, TireSpec};
