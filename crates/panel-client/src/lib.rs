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

//! Client library for a remote server-management panel.
//!
//! The backend exposes three endpoints: `GET /serverstatus` describing the
//! primary host and the game server on it, and `POST /startserver` /
//! `POST /startmcserver` to start either of them. This crate keeps a
//! presentation model of that status up to date and gates the start actions.
//!
//! - **Status layer**: payload decoding and label tables ([`status`])
//! - **Controller layer**: render step, cooldown gate, copy tooltip and poll
//!   diagnostics, driven by an injectable clock ([`controller`])
//! - **Transport layer**: HTTP requests with a bounded timeout ([`http`]) and
//!   the fixed-interval background poller ([`poller`])
//!
//! # Quick Start
//!
//! ```no_run
//! use panel_client::{ActionKind, ClientConfig, PanelClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = PanelClient::spawn(
//!         ClientConfig::default(),
//!         &tokio::runtime::Handle::current(),
//!     )
//!     .unwrap();
//!
//!     loop {
//!         client.pump();
//!         let view = client.view();
//!         println!("{} / {} @ {}", view.main_status, view.mc_status, view.server_ip);
//!         if view.main_start_enabled {
//!             client.start(ActionKind::Primary);
//!         }
//!         tokio::time::sleep(Duration::from_secs(1)).await;
//!     }
//! }
//! ```
//!
//! # Using the Controller Alone
//!
//! ```
//! use panel_client::controller::{ControllerConfig, ManualClock, PanelController};
//! use panel_client::status::ServerStatusSnapshot;
//!
//! let mut controller = PanelController::new(ManualClock::new(), &ControllerConfig::default());
//! let snapshot = ServerStatusSnapshot::from_json(br#"{"main":"stopped","mc":null,"ip":null}"#).unwrap();
//! controller.render(&snapshot);
//!
//! assert!(controller.view().main_start_enabled);
//! assert_eq!(controller.view().mc_status, "Unreachable");
//! ```

pub mod controller;
pub mod http;
pub mod poller;
pub mod status;


use tokio::runtime::Handle;

pub use controller::{
    Clock, ControllerConfig, PanelController, PanelView, PlayerTag, PollDiagnostics, PollOutcome,
    SystemClock,
};
pub use http::{ActionKind, BackendConfig, ClientError, HttpBackend};
pub use poller::{PanelEvent, Poller, PollerConfig};
pub use status::{MainState, McState, ServerStatusSnapshot};

/// Configuration for the full-stack client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub poller: PollerConfig,
    pub controller: ControllerConfig,
}

/// Poller and controller wired together.
///
/// The poller runs on the runtime passed to [`PanelClient::spawn`]; the
/// controller lives with the caller and is updated by [`PanelClient::pump`].
#[derive(Debug)]
pub struct PanelClient {
    controller: PanelController<SystemClock>,
    poller: Poller,
}

impl PanelClient {
    /// Validate the backend address and start polling.
    pub fn spawn(config: ClientConfig, handle: &Handle) -> Result<Self, ClientError> {
        let backend = HttpBackend::new(&config.backend)?;
        let poller = Poller::spawn(backend, &config.poller, handle);
        let controller = PanelController::new(SystemClock, &config.controller);

        Ok(Self { controller, poller })
    }

    /// Apply every event received since the last call. Returns how many
    /// status responses were rendered.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.poller.try_recv() {
            if self.controller.handle_event(event) == Some(PollOutcome::Applied) {
                applied += 1;
            }
        }
        applied
    }

    /// Gate the buttons and send the start request.
    pub fn start(&mut self, kind: ActionKind) {
        self.controller.trigger_action(kind);
        self.poller.start(kind);
    }

    /// Text to place on the clipboard for the address field.
    pub fn copy_ip(&mut self) -> String {
        self.controller.copy_ip()
    }

    #[must_use]
    pub fn view(&self) -> &PanelView {
        self.controller.view()
    }

    #[must_use]
    pub fn controller(&self) -> &PanelController<SystemClock> {
        &self.controller
    }

    /// Stop the background poll loop.
    pub fn shutdown(&self) {
        self.poller.shutdown();
    }
}
