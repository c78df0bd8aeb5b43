//! Off-thread position probing
//!
//! Probes run on a worker thread so a slow terminal never blocks the event
//! path. Every outcome carries the key it was computed for, and only the
//! outcome for the most recently requested key is written to the cache;
//! anything older is dropped.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::geometry;
use super::{BoundTerminal, PositionCache, PositionKey, ProbeError, ScreenPosition};

struct ProbeRequest {
    key: PositionKey,
    terminal: Arc<dyn BoundTerminal>,
}

/// Result of one background probe
#[derive(Debug)]
pub struct ProbeOutcome {
    pub key: PositionKey,
    pub result: Result<ScreenPosition, ProbeError>,
}

/// Worker thread plus the bookkeeping that decides which results count
pub struct BackgroundProbe {
    cache: Arc<PositionCache>,
    requests: Option<Sender<ProbeRequest>>,
    outcomes: Receiver<ProbeOutcome>,
    /// Most recently requested key; only its outcome is accepted
    latest: Option<PositionKey>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundProbe {
    /// Start the worker thread
    pub fn spawn(cache: Arc<PositionCache>) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ProbeRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<ProbeOutcome>();

        let worker = thread::Builder::new()
            .name("position-probe".into())
            .spawn(move || {
                for request in request_rx {
                    let result = geometry::probe(request.terminal.as_ref(), &request.key);
                    let outcome = ProbeOutcome {
                        key: request.key,
                        result,
                    };
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
                debug!("position probe worker exiting");
            })?;

        Ok(Self {
            cache,
            requests: Some(request_tx),
            outcomes: outcome_rx,
            latest: None,
            worker: Some(worker),
        })
    }

    /// Queue a probe for `key`, superseding any earlier request.
    pub fn request(&mut self, key: PositionKey, terminal: Arc<dyn BoundTerminal>) -> Result<(), ProbeError> {
        let sender = self.requests.as_ref().ok_or(ProbeError::WorkerGone)?;
        self.latest = Some(key);
        sender
            .send(ProbeRequest { key, terminal })
            .map_err(|_| ProbeError::WorkerGone)
    }

    /// Key whose outcome is still awaited
    pub fn latest(&self) -> Option<PositionKey> {
        self.latest
    }

    /// Stop waiting for the outstanding request; its outcome will be dropped
    pub fn cancel(&mut self) {
        if let Some(key) = self.latest.take() {
            debug!(key = ?key, "background request cancelled");
        }
    }

    /// Handle finished probes without blocking.
    ///
    /// Returns the position for the latest request once it has arrived.
    pub fn poll(&mut self) -> Option<ScreenPosition> {
        let mut fresh = None;
        loop {
            match self.outcomes.try_recv() {
                Ok(outcome) => {
                    if let Some(pos) = self.accept(outcome) {
                        fresh = Some(pos);
                    }
                }
                Err(TryRecvError::Empty) => return fresh,
                Err(TryRecvError::Disconnected) => {
                    warn!("position probe worker disconnected");
                    return fresh;
                }
            }
        }
    }

    /// Block until the latest request resolves or `timeout` elapses.
    ///
    /// A failed probe resolves to [`ScreenPosition::UNKNOWN`].
    pub fn wait(&mut self, timeout: Duration) -> Option<ScreenPosition> {
        let deadline = Instant::now() + timeout;
        while self.latest.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcomes.recv_timeout(remaining) {
                Ok(outcome) => {
                    let is_latest = self.latest == Some(outcome.key);
                    let pos = self.accept(outcome);
                    if is_latest {
                        return Some(pos.unwrap_or(ScreenPosition::UNKNOWN));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("position probe worker disconnected");
                    return None;
                }
            }
        }
        None
    }

    /// Write an outcome to the cache if it belongs to the latest request
    fn accept(&mut self, outcome: ProbeOutcome) -> Option<ScreenPosition> {
        if self.latest != Some(outcome.key) {
            debug!(key = ?outcome.key, "dropping stale probe result");
            return None;
        }
        self.latest = None;

        match outcome.result {
            Ok(pos) => {
                self.cache.set(outcome.key, pos.row, pos.column);
                Some(pos)
            }
            Err(err) => {
                warn!(key = ?outcome.key, error = %err, "background position probe failed");
                None
            }
        }
    }
}

impl Drop for BackgroundProbe {
    fn drop(&mut self) {
        // closing the request channel ends the worker loop
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
