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

//! Command line flags. Anything given here overrides the config file for
//! the current run only, unless `--save-config` is passed.

use clap::{Parser, ValueEnum};
use panel_client::ActionKind;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "mcpanel-desktop", version, about = "Control panel for a remote game server host")]
pub struct Args {
    /// Base URL of the management backend
    #[arg(long, env = "MCPANEL_URL")]
    pub url: Option<String>,

    /// Milliseconds between status polls
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Milliseconds the start buttons stay disabled after a press
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Fetch the status once, print it and exit
    #[arg(long, conflicts_with = "start")]
    pub once: bool,

    /// Send a start request and exit
    #[arg(long, value_enum)]
    pub start: Option<StartTarget>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    pub save_config: bool,
}

/// Service selector for `--start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StartTarget {
    /// The primary host
    Primary,
    /// The game server
    Secondary,
}

impl From<StartTarget> for ActionKind {
    fn from(target: StartTarget) -> Self {
        match target {
            StartTarget::Primary => ActionKind::Primary,
            StartTarget::Secondary => ActionKind::Secondary,
        }
    }
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.backend_url.clone_from(url);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = self.cooldown_ms {
            config.cooldown_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "mcpanel-desktop",
            "--url",
            "http://10.0.0.2:5000/",
            "--poll-interval-ms",
            "500",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.backend_url, "http://10.0.0.2:5000/");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.cooldown_ms, 5000);
    }

    #[test]
    fn test_start_target_maps_to_action() {
        let args = Args::try_parse_from(["mcpanel-desktop", "--start", "secondary"]).unwrap();
        assert_eq!(args.start.map(ActionKind::from), Some(ActionKind::Secondary));
    }

    #[test]
    fn test_once_conflicts_with_start() {
        let result = Args::try_parse_from(["mcpanel-desktop", "--once", "--start", "primary"]);
        assert!(result.is_err());
    }
}
