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

//! Status payload model for the `/serverstatus` endpoint.
//!
//! The backend reports two lifecycles: the primary host (`main`) and the
//! game server running on it (`mc`). Both decode leniently so that a state
//! string this client does not know about shows up as "Unknown" instead of
//! failing the whole poll.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Suffix appended to the main status label while an SSH session is open.
pub const REMOTE_CONNECTED_SUFFIX: &str = " (Remote connected)";

/// Lifecycle state of the primary host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MainState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    StoppedSsh,
    /// Any state string not listed above.
    #[serde(other)]
    Unknown,
}

impl MainState {
    /// Display label for the main status field.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MainState::Pending => "Starting up",
            MainState::Running => "Online",
            MainState::ShuttingDown | MainState::Stopped | MainState::StoppedSsh => "Offline",
            MainState::Terminated => "Deleted",
            MainState::Stopping => "Shutting down",
            MainState::Unknown => "Unknown",
        }
    }

    /// Whether the primary start action makes sense in this state.
    #[must_use]
    pub fn is_startable(self) -> bool {
        matches!(self, MainState::Stopped | MainState::StoppedSsh)
    }
}

/// Lifecycle state of the game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McState {
    Stopped,
    StartingBlank,
    StartingLaunching,
    StartingPreparing,
    Running,
    StoppedSsh,
    Stopping,
    /// Reported as `"unknown"` by the host agent, also used for unrecognised strings.
    #[serde(other)]
    Unknown,
}

impl McState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            McState::Stopped => "Offline",
            McState::StartingBlank => "(1/3) Warming up",
            McState::StartingLaunching => "(2/3) Launching",
            McState::StartingPreparing => "(3/3) Preparing world",
            McState::Running => "Online",
            McState::StoppedSsh => "Offline (SSH Connected)",
            McState::Stopping => "Shutting down",
            McState::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub fn is_startable(self) -> bool {
        matches!(self, McState::Stopped | McState::StoppedSsh)
    }
}

/// One decoded `/serverstatus` response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ServerStatusSnapshot {
    /// Primary host state. `None` when the backend could not describe the host.
    #[serde(default)]
    pub main: Option<MainState>,

    /// Game server state. `None` means unreachable or not provisioned.
    #[serde(default)]
    pub mc: Option<McState>,

    /// Whether a remote administrative session is active.
    #[serde(default)]
    pub ssh: bool,

    /// Public address of the primary host.
    #[serde(default)]
    pub ip: Option<String>,

    /// Player name to online flag, ordered by name. Only meaningful when `mc` is set.
    #[serde(default)]
    pub players: Option<BTreeMap<String, bool>>,
}

impl ServerStatusSnapshot {
    /// Decode a snapshot from a raw JSON body.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Label for the main status field, including the remote-session suffix.
    #[must_use]
    pub fn main_label(&self) -> String {
        let base = self.main.map_or("Unknown", MainState::label);
        if self.ssh {
            format!("{base}{REMOTE_CONNECTED_SUFFIX}")
        } else {
            base.to_string()
        }
    }

    /// Label for the game server status field.
    #[must_use]
    pub fn mc_label(&self) -> &'static str {
        self.mc.map_or("Unreachable", McState::label)
    }

    #[must_use]
    pub fn main_startable(&self) -> bool {
        self.main.is_some_and(MainState::is_startable)
    }

    #[must_use]
    pub fn mc_startable(&self) -> bool {
        self.mc.is_some_and(McState::is_startable)
    }
}
