//! Report counters
//!
//! Per-interval unique/duplicate counts. Unlike the dedup store these are
//! zeroed every time a report is taken.

use std::fmt;

/// Counts accumulated since the last report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportCounters {
    pub unique: u64,
    pub duplicates: u64,
}

impl ReportCounters {
    pub fn record_unique(&mut self) {
        self.unique += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    /// Capture the counters together with the cumulative `total`, then reset
    /// them to zero.
    pub fn take(&mut self, total: u64) -> ReportSnapshot {
        let snapshot = ReportSnapshot {
            unique: self.unique,
            duplicates: self.duplicates,
            total,
        };
        *self = Self::default();
        snapshot
    }
}

/// One emitted report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportSnapshot {
    /// New tokens accepted during the interval
    pub unique: u64,
    /// Already-seen tokens received during the interval
    pub duplicates: u64,
    /// Distinct tokens accepted since start
    pub total: u64,
}

impl fmt::Display for ReportSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Received {} unique numbers, {} duplicates. Unique total: {}.",
            self.unique, self.duplicates, self.total
        )
    }
}
