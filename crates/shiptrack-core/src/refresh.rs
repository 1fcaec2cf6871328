//! Periodic background refresh.
//!
//! A `RefreshTicker` drives any `Refresh` target (the public lookup cache or
//! the admin listing) on a fixed interval and reports each run through an
//! MPSC channel. Targets own a `RefreshGuard`, so a timer tick that lands
//! while a manual refresh is still in flight is skipped instead of issuing
//! an overlapping fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::TrackError;

/// In-flight flag for one refreshable component.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    in_flight: AtomicBool,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. Returns `None` while another refresh holds it.
    pub fn try_acquire(&self) -> Option<RefreshPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit { guard: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the guard on drop.
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    guard: &'a RefreshGuard,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A full fetch completed with this many records.
    Refreshed(usize),
    /// Another refresh of the same target was already running.
    Skipped,
}

/// A component whose data can be reloaded from the store.
#[async_trait]
pub trait Refresh: Send + Sync {
    /// Short name used in logs and events.
    fn name(&self) -> &'static str;

    async fn refresh(&self) -> Result<RefreshOutcome, TrackError>;
}

/// Result of one ticker run, sent to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    Refreshed { target: &'static str, records: usize },
    Skipped { target: &'static str },
    Failed { target: &'static str, error: String },
}

pub struct RefreshTicker;

impl RefreshTicker {
    /// Spawn a task that refreshes `target` every `period`, starting one
    /// period from now. The task ends when `events` is closed or the returned
    /// handle is aborted.
    pub fn spawn<T>(
        target: Arc<T>,
        period: Duration,
        events: mpsc::Sender<RefreshEvent>,
    ) -> JoinHandle<()>
    where
        T: Refresh + ?Sized + 'static,
    {
        // tokio::time::interval panics on a zero period
        let period = period.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let name = target.name();
            info!(target_name = name, period_ms = period.as_millis() as u64, "Refresh ticker started");

            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let event = match target.refresh().await {
                    Ok(RefreshOutcome::Refreshed(records)) => {
                        debug!(target_name = name, records, "Scheduled refresh complete");
                        RefreshEvent::Refreshed { target: name, records }
                    }
                    Ok(RefreshOutcome::Skipped) => {
                        debug!(target_name = name, "Refresh already in flight, skipping tick");
                        RefreshEvent::Skipped { target: name }
                    }
                    Err(e) => {
                        warn!(target_name = name, error = %e, "Scheduled refresh failed");
                        RefreshEvent::Failed {
                            target: name,
                            error: e.to_string(),
                        }
                    }
                };

                if events.send(event).await.is_err() {
                    debug!(target_name = name, "Refresh event receiver dropped, stopping ticker");
                    break;
                }
            }
        })
    }
}
