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

mod cli;
mod config;
mod console;
mod panel_window;

use std::time::Duration;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use panel_client::PanelClient;
use tokio::runtime::Runtime;

use cli::Args;
use config::AppConfig;
use panel_window::{PanelAction, PanelWindow};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    args.apply_to(&mut config);

    if args.save_config {
        match config.save() {
            Ok(()) => {
                if let Ok(path) = AppConfig::get_config_path() {
                    info!("Configuration saved to {}", path.display());
                }
            }
            Err(e) => error!("Failed to save configuration: {}", e),
        }
    }

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if args.once {
        std::process::exit(console::run_once(&runtime, &config));
    }
    if let Some(target) = args.start {
        std::process::exit(console::run_start(&runtime, &config, target.into()));
    }

    let client = match PanelClient::spawn(config.client_config(), runtime.handle()) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot start panel: {}", e);
            std::process::exit(2);
        }
    };

    info!("Starting MC Panel Desktop against {}", config.backend_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([360.0, 240.0])
            .with_title("MC Panel"),
        ..Default::default()
    };

    let backend_url = config.backend_url.clone();
    eframe::run_native(
        "MC Panel",
        options,
        Box::new(move |_cc| Ok(Box::new(PanelApp::new(client, runtime, backend_url)))),
    )
}

struct PanelApp {
    client: PanelClient,
    _runtime: Runtime,
    window: PanelWindow,
    backend_url: String,
}

impl PanelApp {
    fn new(client: PanelClient, runtime: Runtime, backend_url: String) -> Self {
        Self {
            client,
            _runtime: runtime,
            window: PanelWindow::new(),
            backend_url,
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: PanelAction) {
        match action {
            PanelAction::Start(kind) => self.client.start(kind),
            PanelAction::CopyIp => {
                let text = self.client.copy_ip();
                info!("Copied server address to clipboard");
                ctx.copy_text(text);
            }
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll results and tooltip/gate expiry are all time driven
        ctx.request_repaint_after(REPAINT_INTERVAL);

        self.client.pump();

        let actions = self.window.render(ctx, self.client.controller(), &self.backend_url);

        for action in actions {
            self.handle_action(ctx, action);
        }
    }
}

impl Drop for PanelApp {
    fn drop(&mut self) {
        info!("Shutting down status polling");
        self.client.shutdown();
    }
}

impl std::fmt::Debug for PanelApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelApp")
            .field("client", &self.client)
            .field("backend_url", &self.backend_url)
            .finish_non_exhaustive()
    }
}
