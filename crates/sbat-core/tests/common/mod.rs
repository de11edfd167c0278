//! Test doubles and common utilities for watcher contract tests
//!
//! The doubles script responses ahead of time. Because the watcher queries
//! centers in fixed registry order, a flat response queue lines up with
//! (cycle, center) pairs without any bookkeeping.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use sbat_core::traits::{Authenticator, FetchError, SlotSource};
use sbat_core::types::{Center, Credentials, QueryTemplate, Slot};
use sbat_core::{CadenceConfig, Error, WatcherConfig, WatcherEvent};

/// An authenticator that replays a scripted sequence of outcomes.
/// Once the script is exhausted it keeps succeeding with generated tokens.
pub struct ScriptedAuthenticator {
    script: Mutex<VecDeque<Result<String, String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedAuthenticator {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait]
impl Authenticator for ScriptedAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<String, Error> {
        let calls = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(token)) => Ok(token),
            Some(Err(detail)) => Err(Error::authentication(Some(401), detail)),
            None => Ok(format!("token-{calls}")),
        }
    }
}

/// One scripted per-center fetch outcome
pub enum FetchScript {
    Slots(Vec<Slot>),
    AuthExpired,
    Fail(&'static str),
}

/// A slot source that replays scripted outcomes in fetch order and records
/// the token and center of every call. Once exhausted it returns empty
/// results, so later cycles are quiet rather than noisy.
pub struct ScriptedSlotSource {
    script: Arc<Mutex<VecDeque<FetchScript>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedSlotSource {
    pub fn new(script: Vec<FetchScript>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of (token, center name) per fetch call, in call order
    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.calls)
    }

    /// Handle for appending further scripted outcomes while the watcher runs
    pub fn script_handle(&self) -> Arc<Mutex<VecDeque<FetchScript>>> {
        Arc::clone(&self.script)
    }
}

#[async_trait]
impl SlotSource for ScriptedSlotSource {
    async fn fetch(
        &self,
        token: &str,
        center: &Center,
        _template: &QueryTemplate,
    ) -> Result<Vec<Slot>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_string(), center.name.clone()));

        match self.script.lock().unwrap().pop_front() {
            Some(FetchScript::Slots(slots)) => Ok(slots),
            Some(FetchScript::AuthExpired) => Err(FetchError::AuthExpired),
            Some(FetchScript::Fail(detail)) => Err(FetchError::Request(detail.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

/// Two-center config with no re-auth pause and a short cadence.
///
/// The 1s cadence matters under `start_paused`: the auto-advancing clock
/// jumps to the earliest pending timer, so the cadence sleep must be shorter
/// than the event-wait timeout in [`next_event`].
pub fn two_center_config() -> WatcherConfig {
    WatcherConfig {
        centers: vec![Center::new(7, "Brakel"), Center::new(8, "Eeklo")],
        cadence: CadenceConfig {
            burst_secs: 1,
            idle_secs: 1,
            ..Default::default()
        },
        reauth_pause_secs: 0,
        ..Default::default()
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("operator", "secret")
}

/// Receive the next event, failing the test after a wall-clock timeout
pub async fn next_event(rx: &mut mpsc::Receiver<WatcherEvent>) -> WatcherEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for watcher event")
        .expect("event channel closed unexpectedly")
}

/// Skip events until one matches the predicate
pub async fn next_matching(
    rx: &mut mpsc::Receiver<WatcherEvent>,
    pred: impl Fn(&WatcherEvent) -> bool,
) -> WatcherEvent {
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}
