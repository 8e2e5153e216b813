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

use egui::Color32;
use panel_client::{ActionKind, Clock, PanelController, PanelView, PollDiagnostics, PlayerTag};

const HEADER_COLOR: Color32 = Color32::from_rgb(100, 180, 220);
const LABEL_COLOR: Color32 = Color32::from_rgb(130, 130, 130);
const VALUE_COLOR: Color32 = Color32::from_rgb(200, 200, 200);
const ERROR_COLOR: Color32 = Color32::from_rgb(255, 100, 100);

/// Something the user did in the panel this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Start(ActionKind),
    CopyIp,
}

#[derive(Debug)]
pub struct PanelWindow {
    pub show_diagnostics: bool,
}

impl PanelWindow {
    pub fn new() -> Self {
        Self {
            show_diagnostics: false,
        }
    }

    /// Render the panel into the central area and collect user actions.
    pub fn render<C: Clock>(
        &mut self,
        ctx: &egui::Context,
        controller: &PanelController<C>,
        backend_url: &str,
    ) -> Vec<PanelAction> {
        let mut actions = Vec::new();
        let view = controller.view();

        egui::CentralPanel::default()
            .frame(egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgb(25, 30, 35))
                .stroke(egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0)
                .inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("◈ SERVER CONTROL")
                        .color(HEADER_COLOR)
                        .size(14.0)
                        .strong());

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let icon = if self.show_diagnostics { "▲" } else { "▼" };
                        if ui.button(egui::RichText::new(icon).size(10.0))
                            .on_hover_text(if self.show_diagnostics { "Hide diagnostics" } else { "Show diagnostics" })
                            .clicked() {
                            self.show_diagnostics = !self.show_diagnostics;
                        }
                    });
                });

                ui.label(egui::RichText::new(backend_url)
                    .color(LABEL_COLOR)
                    .size(9.0)
                    .monospace());

                ui.separator();

                Self::render_services(ui, view, &mut actions);

                ui.add_space(6.0);

                Self::render_address(ui, view, controller.tooltip(), &mut actions);

                if let Some(players) = &view.players {
                    ui.add_space(6.0);
                    Self::render_players(ui, players);
                }

                if controller.gate_active() {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(format!(
                        "Start requested, buttons unlock in {:.1}s",
                        controller.gate_remaining().as_secs_f32()
                    ))
                        .color(Color32::from_rgb(255, 200, 100))
                        .size(10.0));
                }

                if self.show_diagnostics {
                    ui.separator();
                    Self::render_diagnostics(ui, controller.diagnostics());
                }
            });

        actions
    }

    fn render_services(ui: &mut egui::Ui, view: &PanelView, actions: &mut Vec<PanelAction>) {
        egui::Grid::new("services")
            .num_columns(3)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Server").color(LABEL_COLOR));
                ui.label(egui::RichText::new(&view.main_status)
                    .color(status_color(&view.main_status))
                    .strong());
                if ui.add_enabled(view.main_start_enabled, egui::Button::new("Start Server"))
                    .clicked() {
                    actions.push(PanelAction::Start(ActionKind::Primary));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Minecraft").color(LABEL_COLOR));
                ui.label(egui::RichText::new(&view.mc_status)
                    .color(status_color(&view.mc_status))
                    .strong());
                if ui.add_enabled(view.mc_start_enabled, egui::Button::new("Start Minecraft"))
                    .clicked() {
                    actions.push(PanelAction::Start(ActionKind::Secondary));
                }
                ui.end_row();
            });
    }

    fn render_address(ui: &mut egui::Ui, view: &PanelView, tooltip: &str, actions: &mut Vec<PanelAction>) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("IP").color(LABEL_COLOR));

            let response = ui.add(egui::Label::new(egui::RichText::new(&view.server_ip)
                    .color(VALUE_COLOR)
                    .monospace())
                .sense(egui::Sense::click()))
                .on_hover_cursor(egui::CursorIcon::PointingHand)
                .on_hover_text(tooltip);

            if response.clicked() {
                actions.push(PanelAction::CopyIp);
            }
        });
    }

    fn render_players(ui: &mut egui::Ui, players: &[PlayerTag]) {
        ui.label(egui::RichText::new("Players").color(LABEL_COLOR));

        if players.is_empty() {
            ui.label(egui::RichText::new("Nobody has joined yet")
                .color(LABEL_COLOR)
                .italics()
                .size(10.0));
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for player in players {
                let (fill, text) = player_colors(player.online);
                egui::Frame::new()
                    .fill(fill)
                    .corner_radius(4.0)
                    .inner_margin(egui::Margin::symmetric(6, 2))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&player.name).color(text).size(11.0));
                    });
            }
        });
    }

    fn render_diagnostics(ui: &mut egui::Ui, diagnostics: &PollDiagnostics) {
        let last_update = diagnostics.last_success.map_or_else(
            || "never".to_string(),
            |at| format!("{} ago", format_age((chrono::Utc::now() - at).num_seconds())),
        );
        ui.label(egui::RichText::new(format!("Last update: {last_update}"))
            .color(VALUE_COLOR)
            .size(9.0)
            .monospace());

        if let Some(error) = &diagnostics.last_error {
            ui.label(egui::RichText::new(format!(
                "Poll failing ({}x): {}",
                diagnostics.consecutive_failures, error
            ))
                .color(ERROR_COLOR)
                .size(9.0)
                .monospace());
        }

        if diagnostics.stale_discarded > 0 {
            ui.label(egui::RichText::new(format!(
                "Out-of-order responses dropped: {}",
                diagnostics.stale_discarded
            ))
                .color(LABEL_COLOR)
                .size(9.0)
                .monospace());
        }

        if let Some(action) = &diagnostics.last_action {
            let state = match (&action.error, action.completed) {
                (_, false) => "pending".to_string(),
                (None, true) => "accepted".to_string(),
                (Some(error), true) => format!("failed: {error}"),
            };
            ui.label(egui::RichText::new(format!(
                "Last start ({}) at {}: {}",
                action.kind,
                action.at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                state
            ))
                .color(if action.error.is_some() { ERROR_COLOR } else { VALUE_COLOR })
                .size(9.0)
                .monospace());
        }
    }
}

impl Default for PanelWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Label color by rough state: green when online, amber while transitioning,
/// grey otherwise.
fn status_color(label: &str) -> Color32 {
    if label.starts_with("Online") {
        Color32::from_rgb(100, 255, 100)
    } else if label.starts_with('(') || label.starts_with("Starting") || label.starts_with("Shutting") {
        Color32::from_rgb(255, 200, 100)
    } else if label.starts_with("Unreachable") || label.starts_with("Deleted") {
        ERROR_COLOR
    } else {
        Color32::from_rgb(150, 150, 150)
    }
}

/// (fill, text) for a player tag
fn player_colors(online: bool) -> (Color32, Color32) {
    if online {
        (Color32::from_rgb(30, 90, 40), Color32::from_rgb(180, 255, 180))
    } else {
        (Color32::from_rgb(50, 50, 55), Color32::from_rgb(140, 140, 140))
    }
}

fn format_age(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let minutes = seconds / 60;
    let secs = seconds % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_color() {
        assert_eq!(status_color("Online (Remote connected)"), Color32::from_rgb(100, 255, 100));
        assert_eq!(status_color("(2/3) Launching"), Color32::from_rgb(255, 200, 100));
        assert_eq!(status_color("Unreachable"), ERROR_COLOR);
        assert_eq!(status_color("Offline"), Color32::from_rgb(150, 150, 150));
    }

    #[test]
    fn test_player_colors_differ() {
        assert_ne!(player_colors(true), player_colors(false));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-3), "0s");
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(125), "2m 5s");
    }
}
