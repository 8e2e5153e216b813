// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background status polling and fire-and-forget start requests.
//!
//! The poller fetches the status once immediately and then on a fixed
//! interval. Each tick runs its request in its own task tagged with a
//! sequence number, so a slow backend never delays the next tick and the
//! consumer can discard responses that arrive out of order. There is no
//! backoff: a failed tick is reported and the next one runs on schedule.
//!
//! Status results are offered to the event channel without waiting. When the
//! consumer falls behind and the channel is full, the result is dropped; the
//! next tick carries newer data anyway.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::http::{ActionKind, ClientError, HttpBackend};
use crate::status::ServerStatusSnapshot;

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between status requests. Values below [`MIN_POLL_INTERVAL`] are
    /// raised to it.
    pub interval: Duration,
    /// Channel buffer size for events.
    pub buffer_size: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            buffer_size: 64,
        }
    }
}

/// Events emitted by the poller.
#[derive(Debug)]
pub enum PanelEvent {
    /// A status request finished.
    Status {
        seq: u64,
        result: Result<ServerStatusSnapshot, ClientError>,
    },
    /// A start request finished.
    ActionFinished {
        kind: ActionKind,
        result: Result<(), ClientError>,
    },
}

/// Handle to the background poll loop.
pub struct Poller {
    event_rx: mpsc::Receiver<PanelEvent>,
    event_tx: mpsc::Sender<PanelEvent>,
    backend: Arc<HttpBackend>,
    handle: Handle,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("base_url", &self.backend.base_url().as_str())
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Start polling on the given runtime.
    #[must_use]
    pub fn spawn(backend: HttpBackend, config: &PollerConfig, handle: &Handle) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size.max(1));
        let backend = Arc::new(backend);
        let cancel_token = CancellationToken::new();
        let interval = config.interval.max(MIN_POLL_INTERVAL);

        info!(
            "Polling {} every {} ms",
            backend.base_url(),
            interval.as_millis()
        );

        handle.spawn(poll_loop(
            Arc::clone(&backend),
            event_tx.clone(),
            cancel_token.clone(),
            interval,
        ));

        Self {
            event_rx,
            event_tx,
            backend,
            handle: handle.clone(),
            cancel_token,
        }
    }

    /// Issue a start request in the background. The outcome arrives as
    /// [`PanelEvent::ActionFinished`].
    pub fn start(&self, kind: ActionKind) {
        let backend = Arc::clone(&self.backend);
        let event_tx = self.event_tx.clone();

        self.handle.spawn(async move {
            let result = backend.start(kind).await;
            if event_tx
                .send(PanelEvent::ActionFinished { kind, result })
                .await
                .is_err()
            {
                debug!("Start result for {} dropped, receiver closed", kind);
            }
        });
    }

    /// Take the next pending event without waiting.
    pub fn try_recv(&mut self) -> Option<PanelEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<PanelEvent> {
        self.event_rx.recv().await
    }

    /// Stop polling. Requests already in flight are abandoned.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop(
    backend: Arc<HttpBackend>,
    event_tx: mpsc::Sender<PanelEvent>,
    cancel_token: CancellationToken,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                tokio::spawn(poll_once(
                    seq,
                    Arc::clone(&backend),
                    event_tx.clone(),
                    cancel_token.clone(),
                ));
            }

            () = cancel_token.cancelled() => {
                info!("Status polling stopped after {} requests", seq);
                return;
            }
        }
    }
}

async fn poll_once(
    seq: u64,
    backend: Arc<HttpBackend>,
    event_tx: mpsc::Sender<PanelEvent>,
    cancel_token: CancellationToken,
) {
    let result = tokio::select! {
        result = backend.fetch_status() => result,
        () = cancel_token.cancelled() => return,
    };

    if let Err(e) = &result {
        debug!("Poll #{} failed: {}", seq, e);
    }

    match event_tx.try_send(PanelEvent::Status { seq, result }) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("Poll #{} result dropped, event channel full", seq);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("Poll #{} result dropped, receiver closed", seq);
        }
    }
}
