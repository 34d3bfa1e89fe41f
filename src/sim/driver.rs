//! Driver - Individual driver state and per-lap behavior
//!
//! Each driver carries a tire strategy, the tire currently mounted and the
//! race data accumulated so far (lap times, pit stops, points).
//! The race advances every driver one lap at a time through [`DriverEngine::step`].

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::tire::{TireInstance, TireSpec};

/// Scheduled pit stop: switch to `tire` once `trigger_lap` laps are completed
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEntry {
    pub tire: Arc<TireSpec>,
    pub trigger_lap: u32,
}

impl StrategyEntry {
    pub fn new(tire: &Arc<TireSpec>, trigger_lap: u32) -> Self {
        Self {
            tire: Arc::clone(tire),
            trigger_lap,
        }
    }
}

/// Why a driver came into the pits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitStop {
    /// Planned by the strategy for this lap
    Scheduled,
    /// Forced because the tire ran its full life
    Unscheduled,
}

/// What happened to a driver during one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapOutcome {
    pub lap_time: f64,
    pub pit_stop: Option<PitStop>,
}

/// Complete race state for a single driver
#[derive(Debug, Clone)]
pub struct DriverState {
    /// Driver name, also the key in season standings
    pub name: String,
    /// Compounds the team can fit at an unplanned stop
    pub available_tires: Vec<Arc<TireSpec>>,
    /// Ordered pit plan; the first entry's tire is the starting tire
    pub strategy: Vec<StrategyEntry>,
    /// Tire currently mounted
    pub current_tire: TireInstance,
    /// Time of every completed lap, pit penalties excluded
    pub lap_times: Vec<f64>,
    /// Accumulated race time including pit penalties
    pub total_time: f64,
    pub pit_stop_count: u32,
    pub points: u32,
    pub laps_completed: u32,
    /// Classification position (1-based)
    pub position: u32,
}

impl DriverState {
    /// Create a driver on the grid with a validated strategy
    pub fn new(
        name: impl Into<String>,
        available_tires: Vec<Arc<TireSpec>>,
        strategy: Vec<StrategyEntry>,
    ) -> Result<Self, SimError> {
        let name = name.into();
        let starting_tire = Self::validate_strategy(&name, &available_tires, &strategy)?;

        Ok(Self {
            name,
            available_tires,
            strategy,
            current_tire: TireInstance::new(starting_tire),
            lap_times: Vec::new(),
            total_time: 0.0,
            pit_stop_count: 0,
            points: 0,
            laps_completed: 0,
            position: 0,
        })
    }

    /// Replace the strategy and fit its starting tire
    pub fn choose_strategy(&mut self, strategy: Vec<StrategyEntry>) -> Result<(), SimError> {
        let starting_tire = Self::validate_strategy(&self.name, &self.available_tires, &strategy)?;
        self.strategy = strategy;
        self.current_tire = TireInstance::new(starting_tire);
        Ok(())
    }

    /// Strategy entry planned for the current lap count, if any
    pub fn scheduled_entry(&self) -> Option<&StrategyEntry> {
        self.strategy
            .iter()
            .find(|entry| entry.trigger_lap == self.laps_completed)
    }

    fn validate_strategy(
        name: &str,
        available_tires: &[Arc<TireSpec>],
        strategy: &[StrategyEntry],
    ) -> Result<Arc<TireSpec>, SimError> {
        let invalid = |reason: String| SimError::InvalidStrategy {
            driver: name.to_string(),
            reason,
        };

        if available_tires.is_empty() {
            return Err(invalid("no tires available".into()));
        }
        let first = strategy
            .first()
            .ok_or_else(|| invalid("no strategy provided".into()))?;

        // Every planned compound must be one the team actually brought
        if let Some(unknown) = strategy
            .iter()
            .find(|entry| !available_tires.iter().any(|t| **t == *entry.tire))
        {
            return Err(invalid(format!(
                "tire {:?} at lap {} is not an available compound",
                unknown.tire.name(),
                unknown.trigger_lap
            )));
        }

        Ok(Arc::clone(&first.tire))
    }
}

/// Driver simulation logic
pub struct DriverEngine;

impl DriverEngine {
    /// Constants
    pub const BASE_LAP_TIME: f64 = 60.0;
    pub const PIT_TIME_PENALTY: f64 = 20.0;

    /// Advance a driver by one lap, pitting first if the strategy or the
    /// tire demands it. A blown tire is returned to the caller.
    pub fn step<R: Rng + ?Sized>(
        driver: &mut DriverState,
        rng: &mut R,
    ) -> Result<LapOutcome, SimError> {
        // Pit decision
        let pit_stop = if driver.scheduled_entry().is_some() {
            Some(PitStop::Scheduled)
        } else if driver.current_tire.is_worn_out() {
            Some(PitStop::Unscheduled)
        } else {
            None
        };
        if let Some(kind) = pit_stop {
            Self::pit_stop(driver, kind, rng);
        }

        // Lap advance
        let additional_time = driver.current_tire.degrade()?;
        let lap_time = Self::BASE_LAP_TIME + additional_time;
        driver.lap_times.push(lap_time);
        driver.total_time += lap_time;
        driver.laps_completed += 1;

        Ok(LapOutcome { lap_time, pit_stop })
    }

    /// Change tires and charge the pit penalty.
    ///
    /// A scheduled stop fits the compound planned for the current lap; an
    /// unscheduled stop, or a scheduled one with nothing planned, fits a random
    /// available compound drawn from `rng`. Either way the new tire starts at
    /// zero laps.
    pub fn pit_stop<R: Rng + ?Sized>(driver: &mut DriverState, kind: PitStop, rng: &mut R) {
        driver.pit_stop_count += 1;

        let planned = match kind {
            PitStop::Scheduled => driver.scheduled_entry().map(|entry| Arc::clone(&entry.tire)),
            PitStop::Unscheduled => None,
        };
        let next = planned.or_else(|| driver.available_tires.choose(rng).cloned());

        match next {
            Some(spec) => driver.current_tire = TireInstance::new(spec),
            None => driver.current_tire.reset(),
        }

        driver.total_time += Self::PIT_TIME_PENALTY;

        log::debug!(
            "{} pitted ({:?}) after {} laps, fitted {}",
            driver.name,
            kind,
            driver.laps_completed,
            driver.current_tire.name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::sim::roster::Compounds;

    fn compounds() -> Compounds {
        Compounds::standard().unwrap()
    }

    fn three_stop_driver(c: &Compounds) -> DriverState {
        DriverState::new("Driver 1", c.all(), c.standard_strategy()).unwrap()
    }

    #[test]
    fn empty_strategy_is_rejected() {
        let c = compounds();
        let err = DriverState::new("Driver 1", vec![c.soft.clone()], Vec::new()).unwrap_err();
        assert!(matches!(err, SimError::InvalidStrategy { .. }));
    }

    #[test]
    fn unknown_compound_is_rejected() {
        let c = compounds();
        let err = DriverState::new(
            "Driver 1",
            vec![c.soft.clone()],
            vec![StrategyEntry::new(&c.soft, 10), StrategyEntry::new(&c.hard, 20)],
        )
        .unwrap_err();
        match err {
            SimError::InvalidStrategy { driver, reason } => {
                assert_eq!(driver, "Driver 1");
                assert!(reason.contains("Hard"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn same_name_with_different_rating_is_rejected() {
        let c = compounds();
        let long_soft = TireSpec::shared("Soft", 40, 0.2).unwrap();
        let err = DriverState::new(
            "Driver 1",
            c.all(),
            vec![StrategyEntry::new(&long_soft, 10)],
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidStrategy { .. }));
    }

    #[test]
    fn choose_strategy_fits_starting_tire() {
        let c = compounds();
        let mut driver = three_stop_driver(&c);
        assert_eq!(driver.current_tire.name(), "Soft");

        driver.choose_strategy(vec![StrategyEntry::new(&c.hard, 25)]).unwrap();
        assert_eq!(driver.current_tire.name(), "Hard");
        assert_eq!(driver.current_tire.current_lap(), 0);
        assert!(driver.choose_strategy(Vec::new()).is_err());
        // A rejected strategy leaves the previous one in place
        assert_eq!(driver.strategy.len(), 1);
    }

    #[test]
    fn pit_stop_resets_wear_and_charges_penalty() {
        let c = compounds();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for kind in [PitStop::Scheduled, PitStop::Unscheduled] {
            let mut driver = three_stop_driver(&c);
            for _ in 0..3 {
                DriverEngine::step(&mut driver, &mut rng).unwrap();
            }
            let before_time = driver.total_time;
            let before_laps = driver.lap_times.len();

            DriverEngine::pit_stop(&mut driver, kind, &mut rng);

            assert_eq!(driver.pit_stop_count, 1);
            assert_eq!(driver.current_tire.current_lap(), 0);
            assert_eq!(driver.total_time - before_time, DriverEngine::PIT_TIME_PENALTY);
            assert_eq!(driver.lap_times.len(), before_laps);
        }
    }

    #[test]
    fn scheduled_stops_follow_strategy() {
        let c = compounds();
        let mut driver = three_stop_driver(&c);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut fitted = Vec::new();
        for _ in 0..35 {
            let outcome = DriverEngine::step(&mut driver, &mut rng).unwrap();
            if outcome.pit_stop.is_some() {
                assert_eq!(outcome.pit_stop, Some(PitStop::Scheduled));
                fitted.push((driver.laps_completed - 1, driver.current_tire.name().to_string()));
            }
        }

        assert_eq!(
            fitted,
            vec![
                (10, "Soft".to_string()),
                (20, "Medium".to_string()),
                (30, "Hard".to_string()),
            ]
        );
        assert_eq!(driver.pit_stop_count, 3);
        assert_eq!(driver.lap_times.len(), 35);
    }

    #[test]
    fn worn_tire_forces_unscheduled_stop() {
        let c = compounds();
        let mut driver = DriverState::new(
            "Driver 2",
            vec![c.soft.clone()],
            vec![StrategyEntry::new(&c.soft, 999)],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..10 {
            let outcome = DriverEngine::step(&mut driver, &mut rng).unwrap();
            assert_eq!(outcome.pit_stop, None);
        }
        assert!(driver.current_tire.is_worn_out());

        let outcome = DriverEngine::step(&mut driver, &mut rng).unwrap();
        assert_eq!(outcome.pit_stop, Some(PitStop::Unscheduled));
        assert_eq!(driver.current_tire.current_lap(), 1);
        assert_eq!(driver.pit_stop_count, 1);
    }

    #[test]
    fn lap_time_and_total_accumulate() {
        let c = compounds();
        let mut driver = DriverState::new(
            "Driver 3",
            vec![c.soft.clone()],
            vec![StrategyEntry::new(&c.soft, 999)],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..6 {
            DriverEngine::step(&mut driver, &mut rng).unwrap();
        }
        // Lap 6 is the first one with wear above half life
        assert_eq!(driver.lap_times[..5], [60.0; 5]);
        assert!((driver.lap_times[5] - 60.04).abs() < 1e-9);
        let sum: f64 = driver.lap_times.iter().sum();
        assert!((driver.total_time - sum).abs() < 1e-9);
        assert_eq!(driver.laps_completed, 6);
    }

    #[test]
    fn random_fallback_is_reproducible() {
        let c = compounds();
        let picks = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut driver = three_stop_driver(&c);
            (0..20)
                .map(|_| {
                    DriverEngine::pit_stop(&mut driver, PitStop::Unscheduled, &mut rng);
                    driver.current_tire.name().to_string()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));
    }
}
