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

//! Application configuration management.
//!
//! Persistent settings are stored in TOML via `confy`. Missing fields fall
//! back to their defaults so older config files keep loading.

use std::time::Duration;

use log::info;
use panel_client::{BackendConfig, ClientConfig, ControllerConfig, PollerConfig};
use serde::{Deserialize, Serialize};

/// Name used for the config directory and file lookup
pub const APP_NAME: &str = "mcpanel-desktop";

/// Default backend address
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the management backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Milliseconds between status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milliseconds the start buttons stay disabled after a press
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Milliseconds the "Copied!" tooltip stays up
    #[serde(default = "default_tooltip_ms")]
    pub tooltip_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Initial window width in pixels
    #[serde(default = "default_window_width")]
    pub window_width: f32,

    /// Initial window height in pixels
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_tooltip_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_window_width() -> f32 {
    440.0
}

fn default_window_height() -> f32 {
    340.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            backend_url: default_backend_url(),
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_ms: default_cooldown_ms(),
            tooltip_ms: default_tooltip_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load(APP_NAME, "config")?;
        info!("Loaded configuration (version {})", config.config_version);
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// Backend connection settings
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    /// Full client settings derived from this config
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            backend: self.backend_config(),
            poller: PollerConfig {
                // A zero period would make tokio's interval panic
                interval: Duration::from_millis(self.poll_interval_ms.max(100)),
                ..Default::default()
            },
            controller: ControllerConfig {
                cooldown: Duration::from_millis(self.cooldown_ms),
                tooltip: Duration::from_millis(self.tooltip_ms),
            },
        }
    }
}
