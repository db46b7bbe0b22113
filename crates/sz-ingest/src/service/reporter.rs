//! Periodic reporter
//!
//! Every period, takes a report from the ingestion API (which resets the
//! interval counters) and hands it to a sink.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::domain::invariants::invariant_total_monotonic;
use crate::domain::ReportSnapshot;
use crate::ports::IngestionApi;

/// Emits and resets the report counters.
pub struct Reporter<A: IngestionApi + ?Sized> {
    api: Arc<A>,
    last: Option<ReportSnapshot>,
}

impl<A: IngestionApi + ?Sized> Reporter<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api, last: None }
    }

    /// Take one report now.
    pub fn emit(&mut self) -> ReportSnapshot {
        let snapshot = self.api.take_report();
        if let Some(previous) = &self.last {
            if !invariant_total_monotonic(previous, &snapshot) {
                warn!(
                    previous = previous.total,
                    current = snapshot.total,
                    "Unique total decreased between reports"
                );
            }
        }
        self.last = Some(snapshot);
        snapshot
    }

    /// Last emitted report, if any
    pub fn last(&self) -> Option<&ReportSnapshot> {
        self.last.as_ref()
    }

    /// Emit a report every `period` until `stop` flips to `true` or its
    /// sender is dropped.
    ///
    /// The first report fires one full period after start.
    pub async fn run<F>(mut self, period: Duration, mut stop: watch::Receiver<bool>, mut sink: F)
    where
        F: FnMut(&ReportSnapshot) + Send,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.emit();
                    sink(&snapshot);
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        info!("Reporter stopped");
                        return;
                    }
                }
            }
        }
    }
}
