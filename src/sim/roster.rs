//! Roster - Standard compounds and the default grid
//!
//! Every race gets its own roster built from these helpers. The compounds
//! themselves are shared between rosters; driver state never is.

use std::sync::Arc;

use crate::error::SimError;
use crate::sim::driver::{DriverState, StrategyEntry};
use crate::sim::tire::TireSpec;

/// The three dry compounds available to every team
#[derive(Debug, Clone)]
pub struct Compounds {
    pub soft: Arc<TireSpec>,
    pub medium: Arc<TireSpec>,
    pub hard: Arc<TireSpec>,
}

impl Compounds {
    /// Soft (10 laps, 0.2), Medium (20 laps, 0.1), Hard (30 laps, 0.05)
    pub fn standard() -> Result<Self, SimError> {
        Ok(Self {
            soft: TireSpec::shared("Soft", 10, 0.2)?,
            medium: TireSpec::shared("Medium", 20, 0.1)?,
            hard: TireSpec::shared("Hard", 30, 0.05)?,
        })
    }

    pub fn all(&self) -> Vec<Arc<TireSpec>> {
        vec![self.soft.clone(), self.medium.clone(), self.hard.clone()]
    }

    /// Stops after 10, 20 and 30 laps onto soft, medium and hard
    pub fn standard_strategy(&self) -> Vec<StrategyEntry> {
        vec![
            StrategyEntry::new(&self.soft, 10),
            StrategyEntry::new(&self.medium, 20),
            StrategyEntry::new(&self.hard, 30),
        ]
    }
}

/// Build `driver_count` fresh drivers named `Driver 1..=N`, all on the
/// standard strategy.
pub fn default_roster(
    driver_count: usize,
    compounds: &Compounds,
) -> Result<Vec<DriverState>, SimError> {
    (1..=driver_count)
        .map(|i| {
            DriverState::new(
                format!("Driver {i}"),
                compounds.all(),
                compounds.standard_strategy(),
            )
        })
        .collect()
}
