//! Race - Lap loop, classification and scoring
//!
//! Runs a fixed grid through a fixed number of laps, ranks the field by total
//! time after every lap and publishes a snapshot of the table.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::driver::{DriverEngine, DriverState};

/// Points for positions 1..=7, awarded after every lap
pub const POINTS_TABLE: [u32; 7] = [7, 8, 5, 4, 3, 2, 1];

/// Cars admitted to a race; later roster entries are left out
pub const MAX_GRID_SIZE: usize = POINTS_TABLE.len();

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    NotStarted,
    Racing,
    Finished,
    /// A driver fault stopped the race
    Faulted,
}

/// Why a race completed without running any laps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterFault {
    NoDrivers,
    NoLaps,
}

/// One line of a lap table, also the row layout of the results log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    #[serde(rename = "Position")]
    pub position: u32,
    #[serde(rename = "Driver")]
    pub driver: String,
    #[serde(rename = "TotalTime")]
    pub total_time: f64,
    #[serde(rename = "PitStops")]
    pub pit_stops: u32,
    #[serde(rename = "Points")]
    pub points: u32,
    #[serde(rename = "TireDescriptor")]
    pub tire: String,
    #[serde(rename = "Lap")]
    pub lap: u32,
}

impl SnapshotRow {
    pub fn from_driver(driver: &DriverState, lap: u32) -> Self {
        Self {
            position: driver.position,
            driver: driver.name.clone(),
            total_time: driver.total_time,
            pit_stops: driver.pit_stop_count,
            points: driver.points,
            tire: driver.current_tire.descriptor(),
            lap,
        }
    }
}

/// Ranked table of the field after one lap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSnapshot {
    pub race_number: u32,
    pub lap: u32,
    /// Rows in classification order
    pub rows: Vec<SnapshotRow>,
}

/// Final line for one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDriver {
    pub position: u32,
    pub name: String,
    pub total_time: f64,
    pub pit_stops: u32,
    pub points: u32,
    pub lap_times: Vec<f64>,
}

impl From<&DriverState> for ClassifiedDriver {
    fn from(driver: &DriverState) -> Self {
        Self {
            position: driver.position,
            name: driver.name.clone(),
            total_time: driver.total_time,
            pit_stops: driver.pit_stop_count,
            points: driver.points,
            lap_times: driver.lap_times.clone(),
        }
    }
}

/// Outcome of a completed race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_number: u32,
    /// Laps actually run
    pub laps: u32,
    pub classification: Vec<ClassifiedDriver>,
    /// Set when the race completed without running
    pub skipped: Option<RosterFault>,
}

impl RaceResult {
    /// Points scored by `driver` in this race
    pub fn points_for(&self, driver: &str) -> Option<u32> {
        self.classification
            .iter()
            .find(|c| c.name == driver)
            .map(|c| c.points)
    }
}

/// Receives a snapshot after every lap of every race.
///
/// Races run on separate threads, so calls can arrive concurrently and
/// interleaved across race numbers.
pub trait LapObserver: Sync {
    fn on_lap(&self, race_number: u32, snapshot: &LapSnapshot);
}

impl<F> LapObserver for F
where
    F: Fn(u32, &LapSnapshot) + Sync,
{
    fn on_lap(&self, race_number: u32, snapshot: &LapSnapshot) {
        self(race_number, snapshot)
    }
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race {
    pub race_number: u32,
    pub total_laps: u32,
    pub status: RaceStatus,
    /// The grid in roster order; drivers always step in this order
    drivers: Vec<DriverState>,
    /// Indices into `drivers`, leader first
    classification: Vec<usize>,
    laps_run: u32,
}

impl Race {
    /// Create a race owning `roster`
    pub fn new(race_number: u32, mut roster: Vec<DriverState>, total_laps: u32) -> Self {
        if roster.len() > MAX_GRID_SIZE {
            log::warn!(
                "Race {}: grid holds {} cars, leaving out {} drivers",
                race_number,
                MAX_GRID_SIZE,
                roster.len() - MAX_GRID_SIZE
            );
            roster.truncate(MAX_GRID_SIZE);
        }

        // Starting grid in roster order
        for (i, driver) in roster.iter_mut().enumerate() {
            driver.position = (i + 1) as u32;
        }

        Self {
            race_number,
            total_laps,
            status: RaceStatus::NotStarted,
            classification: (0..roster.len()).collect(),
            drivers: roster,
            laps_run: 0,
        }
    }

    /// Drivers in roster order
    pub fn drivers(&self) -> &[DriverState] {
        &self.drivers
    }

    /// Drivers in classification order, leader first
    pub fn classified(&self) -> impl Iterator<Item = &DriverState> {
        self.classification.iter().map(|&i| &self.drivers[i])
    }

    /// Run every lap, publishing a snapshot after each one.
    ///
    /// A driver fault stops the race and is returned; snapshots already
    /// published stay published.
    pub fn run<R, O>(&mut self, rng: &mut R, observer: &O) -> Result<RaceResult, SimError>
    where
        R: Rng + ?Sized,
        O: LapObserver + ?Sized,
    {
        let skipped = if self.drivers.is_empty() {
            Some(RosterFault::NoDrivers)
        } else if self.total_laps == 0 {
            Some(RosterFault::NoLaps)
        } else {
            None
        };
        if let Some(fault) = skipped {
            log::warn!("Race {} skipped: {:?}", self.race_number, fault);
            self.status = RaceStatus::Finished;
            return Ok(self.result(Some(fault)));
        }

        log::info!("Starting Race {}", self.race_number);
        self.status = RaceStatus::Racing;

        for lap in 1..=self.total_laps {
            for driver in &mut self.drivers {
                match DriverEngine::step(driver, rng) {
                    Ok(outcome) => log::trace!(
                        "Race {} lap {}: {} {:.3}{}",
                        self.race_number,
                        lap,
                        driver.name,
                        outcome.lap_time,
                        if outcome.pit_stop.is_some() { " (pit)" } else { "" }
                    ),
                    Err(e) => {
                        log::warn!(
                            "Race {}: {} retired on lap {}: {}",
                            self.race_number,
                            driver.name,
                            lap,
                            e
                        );
                        self.status = RaceStatus::Faulted;
                        return Err(e);
                    }
                }
            }
            self.laps_run = lap;

            self.classify();
            self.award_points();

            observer.on_lap(self.race_number, &self.snapshot(lap));
        }

        self.status = RaceStatus::Finished;
        log::info!("Race {} finished.", self.race_number);
        Ok(self.result(None))
    }

    /// Rank by total time and assign positions. Ties go to the earlier
    /// roster entry.
    fn classify(&mut self) {
        let drivers = &self.drivers;
        self.classification = (0..drivers.len()).collect();
        self.classification
            .sort_by(|&a, &b| drivers[a].total_time.total_cmp(&drivers[b].total_time));
        for (rank, &i) in self.classification.iter().enumerate() {
            self.drivers[i].position = (rank + 1) as u32;
        }
    }

    /// Add this lap's points to positions 1..=7
    fn award_points(&mut self) {
        for (&i, points) in self.classification.iter().zip(POINTS_TABLE) {
            self.drivers[i].points += points;
        }
    }

    /// Table of the field after `lap`
    pub fn snapshot(&self, lap: u32) -> LapSnapshot {
        LapSnapshot {
            race_number: self.race_number,
            lap,
            rows: self.classified().map(|d| SnapshotRow::from_driver(d, lap)).collect(),
        }
    }

    fn result(&self, skipped: Option<RosterFault>) -> RaceResult {
        RaceResult {
            race_number: self.race_number,
            laps: self.laps_run,
            classification: self.classified().map(ClassifiedDriver::from).collect(),
            skipped,
        }
    }
}
