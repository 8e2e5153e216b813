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

//! One-shot console commands (`--once`, `--start`).

use log::error;
use panel_client::{
    ActionKind, HttpBackend, PanelController, PanelView, PollOutcome, SystemClock,
};
use tokio::runtime::Runtime;

use crate::config::AppConfig;

/// Fetch the status once and print the panel. Returns the process exit code.
pub fn run_once(runtime: &Runtime, config: &AppConfig) -> i32 {
    let backend = match HttpBackend::new(&config.backend_config()) {
        Ok(backend) => backend,
        Err(e) => {
            error!("{}", e);
            return 2;
        }
    };

    let result = runtime.block_on(backend.fetch_status());
    let mut controller = PanelController::new(SystemClock, &config.client_config().controller);

    if let PollOutcome::Failed(message) = controller.apply(1, result) {
        eprintln!("Status unavailable: {message}");
        return 1;
    }

    for line in format_view(controller.view()) {
        println!("{line}");
    }
    0
}

/// Send one start request and wait for the backend to answer.
pub fn run_start(runtime: &Runtime, config: &AppConfig, kind: ActionKind) -> i32 {
    let backend = match HttpBackend::new(&config.backend_config()) {
        Ok(backend) => backend,
        Err(e) => {
            error!("{}", e);
            return 2;
        }
    };

    match runtime.block_on(backend.start(kind)) {
        Ok(()) => {
            println!("Start request for {kind} service sent");
            0
        }
        Err(e) => {
            eprintln!("Start request for {kind} service failed: {e}");
            1
        }
    }
}

/// Plain-text rendering of the panel.
pub fn format_view(view: &PanelView) -> Vec<String> {
    let mut lines = vec![
        format!("Server:    {}", view.main_status),
        format!("Minecraft: {}", view.mc_status),
        format!("IP:        {}", view.server_ip),
    ];

    if let Some(players) = &view.players {
        let names: Vec<String> = players
            .iter()
            .map(|p| {
                if p.online {
                    format!("{} (online)", p.name)
                } else {
                    format!("{} (offline)", p.name)
                }
            })
            .collect();
        let list = if names.is_empty() { "none".to_string() } else { names.join(", ") };
        lines.push(format!("Players:   {list}"));
    }

    lines.push(format!(
        "Actions:   start server {}, start minecraft {}",
        enabled_word(view.main_start_enabled),
        enabled_word(view.mc_start_enabled)
    ));

    lines
}

fn enabled_word(enabled: bool) -> &'static str {
    if enabled {
        "available"
    } else {
        "unavailable"
    }
}
