//! Core poll loop
//!
//! The Watcher is responsible for:
//! - Acquiring and re-acquiring the bearer token via Authenticator
//! - Querying every exam center via SlotSource, once per cycle
//! - Reconciling results against observation state
//! - Emitting events for shells to consume
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐      ┌──────────────┐      ┌─────────────┐
//! │ Authenticator │◄─────│   Watcher    │─────►│ SlotSource  │
//! └───────────────┘      └──────────────┘      └─────────────┘
//!                               │
//!                               ▼
//!                        WatcherEvent channel (FIFO, bounded)
//! ```
//!
//! ## State machine
//!
//! Authenticating → Polling ⇄ ReAuthenticating → Stopped
//!
//! Only two conditions end the loop: the cooperative stop flag, and a failed
//! (re-)authentication. Per-partition request failures are absorbed, logged,
//! and retried on the next cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::WatcherConfig;
use crate::error::Result;
use crate::reconcile::{ObservationState, reconcile};
use crate::traits::{Authenticator, FetchError, SlotSource};
use crate::types::{Center, Credentials, Slot};

/// Events emitted by the watcher
///
/// Delivery is one-directional and FIFO; the watcher never calls into
/// presentation code directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// Poll session started
    Started {
        centers: usize,
    },

    /// Genuinely new slots found. Center name → ascending list of
    /// `YYYY-MM-DD` date strings; centers ordered by name.
    NewSlots {
        centers: BTreeMap<String, Vec<String>>,
    },

    /// One full pass over all centers finished (clean or failed)
    CycleCompleted {
        centers_ok: usize,
        centers_failed: usize,
        seen_total: usize,
    },

    /// Mid-cycle 401; attempting to re-acquire the token
    Reauthenticating,

    /// Authentication failed; the session is over and the operator must
    /// re-enter credentials
    StoppedAuthFailure {
        detail: String,
    },

    /// Cooperative stop observed; no further network activity
    Stopped,
}

/// Outcome of one pass over the centers
enum CycleEnd {
    Clean(HashMap<Center, Vec<Slot>>),
    Failed { fetched: usize, failed: usize },
    AuthExpired,
    StopRequested,
}

/// Core poll loop controller
///
/// Constructed once per process; [`Watcher::run`] drives one poll session and
/// may be called again after it returns; every run starts with a fresh token
/// and empty observation state.
///
/// ## Threading
///
/// `run` is a single async task. It must never block a presentation thread;
/// shells spawn it and drain the event receiver.
pub struct Watcher {
    authenticator: Box<dyn Authenticator>,
    slot_source: Box<dyn SlotSource>,
    config: WatcherConfig,
    event_tx: mpsc::Sender<WatcherEvent>,
}

impl Watcher {
    /// Create a new watcher
    ///
    /// # Returns
    ///
    /// A tuple of (watcher, event_receiver) where event_receiver yields
    /// watcher events in emission order.
    pub fn new(
        authenticator: Box<dyn Authenticator>,
        slot_source: Box<dyn SlotSource>,
        config: WatcherConfig,
    ) -> Result<(Self, mpsc::Receiver<WatcherEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let watcher = Self {
            authenticator,
            slot_source,
            config,
            event_tx: tx,
        };

        Ok((watcher, rx))
    }

    /// Run one poll session
    ///
    /// Returns when the stop flag is raised or authentication is exhausted.
    /// Neither is an `Err`: both are ordinary session endings, reported
    /// through the event channel. `Err` is reserved for conditions the
    /// caller could act on, of which there are currently none during a run.
    pub async fn run(
        &self,
        credentials: Credentials,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        self.emit(WatcherEvent::Started {
            centers: self.config.centers.len(),
        });

        // Authenticating (initial)
        let mut token = match self.authenticator.authenticate(&credentials).await {
            Ok(token) => {
                info!("authentication successful");
                token
            }
            Err(e) => {
                warn!("initial authentication failed: {}", e);
                self.emit(WatcherEvent::StoppedAuthFailure {
                    detail: e.to_string(),
                });
                return Ok(());
            }
        };

        let mut state = ObservationState::new();
        info!(
            "starting exam check loop over {} centers",
            self.config.centers.len()
        );

        loop {
            if stop_requested(&stop) {
                break;
            }

            match self.run_cycle(&token, &stop).await {
                CycleEnd::Clean(cycle) => {
                    let centers_ok = cycle.len();
                    let report = reconcile(&cycle, &mut state);
                    if report.is_empty() {
                        debug!("nothing new, {} keys seen so far", state.seen_count());
                    } else {
                        let centers = format_report(&report);
                        for (center, dates) in &centers {
                            info!("new dates at {}: {}", center, dates.join(", "));
                        }
                        self.emit(WatcherEvent::NewSlots { centers });
                    }
                    self.emit(WatcherEvent::CycleCompleted {
                        centers_ok,
                        centers_failed: 0,
                        seen_total: state.seen_count(),
                    });
                }
                CycleEnd::Failed { fetched, failed } => {
                    // Keep the previous baseline untouched; partial data must
                    // not produce a false "nothing new" conclusion.
                    warn!(
                        "cycle completed with {} failed centers, will retry with the same baseline",
                        failed
                    );
                    self.emit(WatcherEvent::CycleCompleted {
                        centers_ok: fetched,
                        centers_failed: failed,
                        seen_total: state.seen_count(),
                    });
                }
                CycleEnd::AuthExpired => {
                    // ReAuthenticating: the cycle's partial data is discarded.
                    self.emit(WatcherEvent::Reauthenticating);
                    match self.authenticator.authenticate(&credentials).await {
                        Ok(new_token) => {
                            info!("re-authentication successful, resuming checks");
                            token = new_token;
                            let pause = Duration::from_secs(self.config.reauth_pause_secs);
                            if !self.sleep_interruptible(pause, &mut stop).await {
                                break;
                            }
                            // Back to Polling without a full cadence sleep
                            continue;
                        }
                        Err(e) => {
                            warn!("re-authentication failed: {}", e);
                            self.emit(WatcherEvent::StoppedAuthFailure {
                                detail: e.to_string(),
                            });
                            return Ok(());
                        }
                    }
                }
                CycleEnd::StopRequested => break,
            }

            let cadence = self.config.cadence.sleep_duration(Utc::now());
            debug!("sleeping for {:?}", cadence);
            if !self.sleep_interruptible(cadence, &mut stop).await {
                break;
            }
        }

        info!("checking loop stopped");
        self.emit(WatcherEvent::Stopped);
        Ok(())
    }

    /// One pass over all centers in fixed order
    async fn run_cycle(&self, token: &str, stop: &watch::Receiver<bool>) -> CycleEnd {
        let mut cycle: HashMap<Center, Vec<Slot>> = HashMap::new();
        let mut failed = 0usize;

        for center in &self.config.centers {
            if stop_requested(stop) {
                return CycleEnd::StopRequested;
            }

            match self
                .slot_source
                .fetch(token, center, &self.config.query)
                .await
            {
                Ok(slots) => {
                    if !slots.is_empty() {
                        debug!("{} returned {} slots", center.name, slots.len());
                    }
                    cycle.insert(center.clone(), slots);
                }
                Err(FetchError::AuthExpired) => {
                    info!(
                        "authorization token expired or invalid (checking {}), re-authenticating",
                        center.name
                    );
                    return CycleEnd::AuthExpired;
                }
                Err(FetchError::Request(detail)) => {
                    warn!("error checking {}: {}", center.name, detail);
                    failed += 1;
                    // Partial results from other centers still matter for
                    // logging; the cycle as a whole is marked failed.
                }
            }
        }

        if stop_requested(stop) {
            CycleEnd::StopRequested
        } else if failed > 0 {
            CycleEnd::Failed {
                fetched: cycle.len(),
                failed,
            }
        } else {
            CycleEnd::Clean(cycle)
        }
    }

    /// Sleep that wakes promptly when the stop flag is raised.
    ///
    /// Returns `true` if the full duration elapsed, `false` on stop.
    async fn sleep_interruptible(
        &self,
        duration: Duration,
        stop: &mut watch::Receiver<bool>,
    ) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = wait_for_stop(stop) => false,
        }
    }

    /// Emit a watcher event
    fn emit(&self, event: WatcherEvent) {
        // Send without blocking the loop; if no shell is draining the
        // channel, drop the event with a warning rather than grow unbounded.
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full or closed, dropping event");
        }
    }
}

fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow()
}

/// Resolves once the stop flag is raised. A dropped sender counts as a stop:
/// a watcher nobody can reach should not keep polling.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Flatten a reconcile report into the notification payload: center name →
/// ascending, de-duplicated date strings.
fn format_report(report: &HashMap<Center, Vec<Slot>>) -> BTreeMap<String, Vec<String>> {
    report
        .iter()
        .map(|(center, slots)| {
            let dates: BTreeSet<chrono::NaiveDate> = slots.iter().filter_map(Slot::date).collect();
            (
                center.name.clone(),
                dates
                    .into_iter()
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .collect(),
            )
        })
        .collect()
}
