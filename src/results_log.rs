//! Results Log - Append-only CSV of every lap table
//!
//! Races deliver snapshots from several threads at once; the writer sits
//! behind a mutex so rows from one snapshot are never split.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::ResultsLogError;
use crate::sim::race::{LapObserver, LapSnapshot};

/// CSV sink for lap snapshots
pub struct ResultsLog {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
    failed_writes: AtomicU64,
}

impl ResultsLog {
    /// Open `path` for appending, writing the header only to an empty file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ResultsLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            failed_writes: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every row of `snapshot` and flush
    pub fn append(&self, snapshot: &LapSnapshot) -> Result<(), ResultsLogError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        for row in &snapshot.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Snapshots that could not be written
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}

impl LapObserver for ResultsLog {
    fn on_lap(&self, race_number: u32, snapshot: &LapSnapshot) {
        if let Err(e) = self.append(snapshot) {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            log::error!(
                "Could not log race {} lap {} to {}: {}",
                race_number,
                snapshot.lap,
                self.path.display(),
                e
            );
        }
    }
}
