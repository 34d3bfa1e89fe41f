//! Tire - Compound specifications and per-driver wear tracking
//!
//! A tire runs at nominal pace for the first half of its rated life and then
//! loses time linearly with wear, scaled by its degradation rate.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::SimError;

/// Immutable tire compound, shared read-only between rosters and races
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TireSpec {
    name: String,
    max_laps: u32,
    degradation_rate: f64,
}

impl TireSpec {
    /// Create a validated compound. `max_laps` must be positive and the
    /// degradation rate finite and non-negative.
    pub fn new(
        name: impl Into<String>,
        max_laps: u32,
        degradation_rate: f64,
    ) -> Result<Self, SimError> {
        let name = name.into();
        if max_laps == 0 {
            return Err(SimError::InvalidTire {
                name,
                reason: "max laps must be greater than zero".into(),
            });
        }
        if !degradation_rate.is_finite() || degradation_rate < 0.0 {
            return Err(SimError::InvalidTire {
                name,
                reason: format!("degradation rate {degradation_rate} must be finite and >= 0"),
            });
        }
        Ok(Self {
            name,
            max_laps,
            degradation_rate,
        })
    }

    /// Same as [`TireSpec::new`], wrapped for sharing
    pub fn shared(
        name: impl Into<String>,
        max_laps: u32,
        degradation_rate: f64,
    ) -> Result<Arc<Self>, SimError> {
        Self::new(name, max_laps, degradation_rate).map(Arc::new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_laps(&self) -> u32 {
        self.max_laps
    }

    pub fn degradation_rate(&self) -> f64 {
        self.degradation_rate
    }
}

/// A set of tires mounted on one car
#[derive(Debug, Clone, PartialEq)]
pub struct TireInstance {
    spec: Arc<TireSpec>,
    current_lap: u32,
}

impl TireInstance {
    /// Fresh tire with zero laps on it
    pub fn new(spec: Arc<TireSpec>) -> Self {
        Self { spec, current_lap: 0 }
    }

    pub fn spec(&self) -> &Arc<TireSpec> {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    /// Fraction of rated life used so far
    pub fn wear(&self) -> f64 {
        self.current_lap as f64 / self.spec.max_laps() as f64
    }

    /// True once the tire has run its full rated life
    pub fn is_worn_out(&self) -> bool {
        self.current_lap >= self.spec.max_laps()
    }

    pub fn reset(&mut self) {
        self.current_lap = 0;
    }

    /// Run one lap on this tire and return the time lost to wear.
    pub fn degrade(&mut self) -> Result<f64, SimError> {
        self.current_lap += 1;
        let wear = self.wear();
        if wear > 1.0 {
            return Err(SimError::TireBlown {
                tire: self.spec.name().to_string(),
                lap: self.current_lap,
                max_laps: self.spec.max_laps(),
            });
        }

        if wear >= 0.5 {
            Ok((wear - 0.5) * 2.0 * self.spec.degradation_rate())
        } else {
            Ok(0.0)
        }
    }

    /// Text shown in lap tables, e.g. `Soft - Lap 4`
    pub fn descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TireInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - Lap {}", self.spec.name, self.current_lap)
    }
}
