//! Error types shared across the simulator.

use thiserror::Error;

/// Faults raised while building or running a race
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A tire was driven past its rated life without a pit stop
    #[error("{tire} tire is completely worn out (lap {lap} of {max_laps})")]
    TireBlown {
        tire: String,
        lap: u32,
        max_laps: u32,
    },

    #[error("invalid strategy for {driver}: {reason}")]
    InvalidStrategy { driver: String, reason: String },

    #[error("invalid tire specification {name:?}: {reason}")]
    InvalidTire { name: String, reason: String },

    /// The race thread panicked before reporting a result
    #[error("race {race_number} aborted: {message}")]
    RaceAborted { race_number: u32, message: String },
}

/// Failures loading a season configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures appending to the results log
#[derive(Debug, Error)]
pub enum ResultsLogError {
    #[error("results log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("results log CSV error: {0}")]
    Csv(#[from] csv::Error),
}
