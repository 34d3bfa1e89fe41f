//! Season - Concurrent race runner and standings
//!
//! Every race gets a freshly built roster and its own seeded RNG, then runs on
//! a dedicated thread. Finished races come back over a channel and are merged
//! into the standings as they arrive. A fault or panic in one race is recorded
//! against that race only.

use std::any::Any;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SeasonConfig;
use crate::error::SimError;
use crate::sim::driver::DriverState;
use crate::sim::race::{LapObserver, Race, RaceResult};

/// Cumulative points per driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStandings {
    points: BTreeMap<String, u32>,
}

impl SeasonStandings {
    /// Add every classified driver's points from `result`
    pub fn merge(&mut self, result: &RaceResult) {
        for driver in &result.classification {
            *self.points.entry(driver.name.clone()).or_insert(0) += driver.points;
        }
    }

    pub fn points_for(&self, driver: &str) -> Option<u32> {
        self.points.get(driver).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Standings table, most points first; ties by name
    pub fn sorted(&self) -> Vec<(String, u32)> {
        let mut table: Vec<(String, u32)> = self
            .points
            .iter()
            .map(|(name, points)| (name.clone(), *points))
            .collect();
        // BTreeMap order already breaks ties by name
        table.sort_by(|a, b| b.1.cmp(&a.1));
        table
    }
}

/// How a single race ended
#[derive(Debug, Clone, PartialEq)]
pub enum RaceOutcome {
    Finished(RaceResult),
    Failed(SimError),
}

/// Everything a season run produced
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonReport {
    /// Base seed the per-race RNGs were derived from
    pub seed: u64,
    pub standings: SeasonStandings,
    /// Outcome per race number, written once when the race completes
    pub outcomes: BTreeMap<u32, RaceOutcome>,
}

impl SeasonReport {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            standings: SeasonStandings::default(),
            outcomes: BTreeMap::new(),
        }
    }

    fn record(&mut self, race_number: u32, result: Result<RaceResult, SimError>) {
        let Entry::Vacant(slot) = self.outcomes.entry(race_number) else {
            log::error!("Race {} reported more than once, keeping the first outcome", race_number);
            return;
        };

        match result {
            Ok(result) => {
                self.standings.merge(&result);
                slot.insert(RaceOutcome::Finished(result));
            }
            Err(e) => {
                log::error!("Race {} failed: {}", race_number, e);
                slot.insert(RaceOutcome::Failed(e));
            }
        }
    }

    pub fn finished(&self) -> impl Iterator<Item = &RaceResult> {
        self.outcomes.values().filter_map(|outcome| match outcome {
            RaceOutcome::Finished(result) => Some(result),
            RaceOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (u32, &SimError)> {
        self.outcomes.iter().filter_map(|(race_number, outcome)| match outcome {
            RaceOutcome::Failed(e) => Some((*race_number, e)),
            RaceOutcome::Finished(_) => None,
        })
    }

    /// True when no race failed
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Seed for one race's RNG, derived from the season seed
pub fn race_seed(base_seed: u64, race_number: u32) -> u64 {
    base_seed ^ u64::from(race_number).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Season runner
#[derive(Debug, Clone)]
pub struct Season {
    pub num_races: u32,
    pub total_laps: u32,
    seed: u64,
}

impl Season {
    /// Create a season; without a seed one is drawn at random
    pub fn new(num_races: u32, total_laps: u32, seed: Option<u64>) -> Self {
        Self {
            num_races,
            total_laps,
            seed: seed.unwrap_or_else(rand::random),
        }
    }

    pub fn from_config(config: &SeasonConfig) -> Self {
        Self::new(config.num_races, config.total_laps, config.seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run every race on its own thread and wait for all of them.
    ///
    /// `roster_factory` is called once per race, on the calling thread, before
    /// that race is spawned; the roster it returns is moved into the race.
    pub fn run<F, O>(&self, roster_factory: F, observer: &O) -> SeasonReport
    where
        F: Fn(u32) -> Result<Vec<DriverState>, SimError>,
        O: LapObserver + ?Sized,
    {
        log::info!(
            "Starting season: {} races of {} laps (seed {})",
            self.num_races,
            self.total_laps,
            self.seed
        );
        let mut report = SeasonReport::new(self.seed);
        let (tx, rx) = crossbeam_channel::unbounded();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.num_races as usize);

            for race_number in 1..=self.num_races {
                let roster = match roster_factory(race_number) {
                    Ok(roster) => roster,
                    Err(e) => {
                        report.record(race_number, Err(e));
                        continue;
                    }
                };

                let tx = tx.clone();
                let total_laps = self.total_laps;
                let seed = race_seed(self.seed, race_number);
                let spawned = thread::Builder::new()
                    .name(format!("race-{race_number}"))
                    .spawn_scoped(scope, move || {
                        let result = run_race(race_number, roster, total_laps, seed, observer);
                        if tx.send((race_number, result)).is_err() {
                            log::error!("Race {} finished after the season closed", race_number);
                        }
                    });

                match spawned {
                    Ok(handle) => handles.push((race_number, handle)),
                    Err(e) => report.record(
                        race_number,
                        Err(SimError::RaceAborted {
                            race_number,
                            message: format!("could not spawn race thread: {e}"),
                        }),
                    ),
                }
            }
            // Only the race threads hold senders now
            drop(tx);

            for (race_number, result) in rx.iter() {
                report.record(race_number, result);
            }

            for (race_number, handle) in handles {
                if let Err(panic) = handle.join() {
                    report.record(
                        race_number,
                        Err(SimError::RaceAborted {
                            race_number,
                            message: panic_message(panic.as_ref()),
                        }),
                    );
                }
            }
        });

        log::info!(
            "Season finished: {} of {} races completed",
            report.finished().count(),
            self.num_races
        );
        report
    }

    /// Run the same races one after another on the calling thread, with the
    /// same per-race seeds as [`Season::run`].
    pub fn run_sequential<F, O>(&self, roster_factory: F, observer: &O) -> SeasonReport
    where
        F: Fn(u32) -> Result<Vec<DriverState>, SimError>,
        O: LapObserver + ?Sized,
    {
        let mut report = SeasonReport::new(self.seed);
        for race_number in 1..=self.num_races {
            let result = roster_factory(race_number).and_then(|roster| {
                run_race(
                    race_number,
                    roster,
                    self.total_laps,
                    race_seed(self.seed, race_number),
                    observer,
                )
            });
            report.record(race_number, result);
        }
        report
    }
}

fn run_race<O>(
    race_number: u32,
    roster: Vec<DriverState>,
    total_laps: u32,
    seed: u64,
    observer: &O,
) -> Result<RaceResult, SimError>
where
    O: LapObserver + ?Sized,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Race::new(race_number, roster, total_laps).run(&mut rng, observer)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "race thread panicked".to_string()
    }
}
