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

//! Panel state and the render step.
//!
//! [`PanelController`] owns everything the window shows: button enablement,
//! status labels, the server address, the player list and the copy tooltip.
//! It applies poll results in sequence order, holds the cooldown gate that
//! keeps buttons disabled right after a press, and tracks poll diagnostics.
//! All time-dependent behavior reads from an injected [`Clock`].

mod gate;

pub use gate::{Clock, CooldownGate, ManualClock, SystemClock};

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::http::{ActionKind, ClientError};
use crate::poller::PanelEvent;
use crate::status::ServerStatusSnapshot;

/// Shown for the address when the host has none, and for every field before the first poll.
pub const PLACEHOLDER: &str = "-";
pub const TOOLTIP_IDLE: &str = "Click to copy";
pub const TOOLTIP_COPIED: &str = "Copied!";

/// Timing knobs for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long buttons stay under the gate after a press.
    pub cooldown: Duration,
    /// How long the tooltip reads "Copied!" after a copy.
    pub tooltip: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(5000),
            tooltip: Duration::from_millis(1000),
        }
    }
}

/// One entry in the player list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerTag {
    pub name: String,
    pub online: bool,
}

/// Everything the panel displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub main_start_enabled: bool,
    pub mc_start_enabled: bool,
    pub main_status: String,
    pub mc_status: String,
    pub server_ip: String,
    /// `None` hides the players section entirely.
    pub players: Option<Vec<PlayerTag>>,
}

impl Default for PanelView {
    fn default() -> Self {
        Self {
            main_start_enabled: false,
            mc_start_enabled: false,
            main_status: PLACEHOLDER.to_string(),
            mc_status: PLACEHOLDER.to_string(),
            server_ip: PLACEHOLDER.to_string(),
            players: None,
        }
    }
}

/// Result of handing one poll response to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Snapshot rendered.
    Applied,
    /// A newer response was already applied; this one was dropped.
    Stale,
    /// The request failed. The display keeps its previous contents.
    Failed(String),
}

/// Record of the most recent start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub at: DateTime<Utc>,
    /// Failure reason once completed.
    pub error: Option<String>,
    pub completed: bool,
}

/// Poll health surfaced alongside the panel.
#[derive(Debug, Clone, Default)]
pub struct PollDiagnostics {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub stale_discarded: u64,
    pub last_action: Option<ActionRecord>,
}

/// Owns the panel view and applies poll results to it.
#[derive(Debug)]
pub struct PanelController<C: Clock = SystemClock> {
    clock: C,
    gate: CooldownGate,
    tooltip_window: Duration,
    copied_until: Option<Instant>,
    view: PanelView,
    last_applied_seq: Option<u64>,
    diagnostics: PollDiagnostics,
}

impl<C: Clock> PanelController<C> {
    pub fn new(clock: C, config: &ControllerConfig) -> Self {
        Self {
            clock,
            gate: CooldownGate::new(config.cooldown),
            tooltip_window: config.tooltip,
            copied_until: None,
            view: PanelView::default(),
            last_applied_seq: None,
            diagnostics: PollDiagnostics::default(),
        }
    }

    #[must_use]
    pub fn view(&self) -> &PanelView {
        &self.view
    }

    #[must_use]
    pub fn diagnostics(&self) -> &PollDiagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn gate_active(&self) -> bool {
        self.gate.is_active(self.clock.now())
    }

    #[must_use]
    pub fn gate_remaining(&self) -> Duration {
        self.gate.remaining(self.clock.now())
    }

    /// Route an event from the poller.
    pub fn handle_event(&mut self, event: PanelEvent) -> Option<PollOutcome> {
        match event {
            PanelEvent::Status { seq, result } => Some(self.apply(seq, result)),
            PanelEvent::ActionFinished { kind, result } => {
                self.record_action_result(kind, result);
                None
            }
        }
    }

    /// Apply the response to poll number `seq`.
    ///
    /// Responses at or below the last applied sequence number are discarded,
    /// so a slow request can never overwrite newer data. Failures leave the
    /// display untouched.
    pub fn apply(
        &mut self,
        seq: u64,
        result: Result<ServerStatusSnapshot, ClientError>,
    ) -> PollOutcome {
        if self.last_applied_seq.is_some_and(|last| seq <= last) {
            debug!(
                "Discarding poll #{} (already applied #{:?})",
                seq, self.last_applied_seq
            );
            self.diagnostics.stale_discarded += 1;
            return PollOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.render(&snapshot);
                self.last_applied_seq = Some(seq);
                if self.diagnostics.consecutive_failures > 0 {
                    info!(
                        "Status polling recovered after {} failed attempts",
                        self.diagnostics.consecutive_failures
                    );
                }
                self.diagnostics.last_success = Some(Utc::now());
                self.diagnostics.last_error = None;
                self.diagnostics.consecutive_failures = 0;
                PollOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Status poll #{} failed: {}", seq, message);
                self.diagnostics.last_error = Some(message.clone());
                self.diagnostics.consecutive_failures += 1;
                PollOutcome::Failed(message)
            }
        }
    }

    /// Update the view from a snapshot.
    pub fn render(&mut self, snapshot: &ServerStatusSnapshot) {
        if !self.gate_active() {
            self.view.main_start_enabled = snapshot.main_startable();
            self.view.mc_start_enabled = snapshot.mc_startable();
        }

        self.view.main_status = snapshot.main_label();
        self.view.mc_status = snapshot.mc_label().to_string();
        self.view.server_ip = snapshot
            .ip
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        self.view.players = snapshot.mc.map(|_| {
            snapshot
                .players
                .iter()
                .flatten()
                .map(|(name, online)| PlayerTag {
                    name: name.clone(),
                    online: *online,
                })
                .collect()
        });
    }

    /// Handle a start button press: disable both buttons and open the gate.
    ///
    /// The caller is responsible for issuing the request itself.
    pub fn trigger_action(&mut self, kind: ActionKind) {
        info!("Start requested for {} service", kind);
        self.view.main_start_enabled = false;
        self.view.mc_start_enabled = false;
        self.gate.activate(self.clock.now());
        self.diagnostics.last_action = Some(ActionRecord {
            kind,
            at: Utc::now(),
            error: None,
            completed: false,
        });
    }

    /// Note the outcome of a start request. Button state is not affected.
    pub fn record_action_result(&mut self, kind: ActionKind, result: Result<(), ClientError>) {
        let error = match result {
            Ok(()) => {
                info!("Start request for {} service accepted", kind);
                None
            }
            Err(e) => {
                warn!("Start request for {} service failed: {}", kind, e);
                Some(e.to_string())
            }
        };

        match self.diagnostics.last_action.as_mut() {
            Some(record) if record.kind == kind && !record.completed => {
                record.error = error;
                record.completed = true;
            }
            _ => {
                self.diagnostics.last_action = Some(ActionRecord {
                    kind,
                    at: Utc::now(),
                    error,
                    completed: true,
                });
            }
        }
    }

    /// Begin a copy of the displayed address and return the text to put on
    /// the clipboard. The tooltip reports success regardless of what the
    /// address is.
    pub fn copy_ip(&mut self) -> String {
        self.copied_until = Some(self.clock.now() + self.tooltip_window);
        self.view.server_ip.clone()
    }

    #[must_use]
    pub fn tooltip(&self) -> &'static str {
        match self.copied_until {
            Some(until) if self.clock.now() < until => TOOLTIP_COPIED,
            _ => TOOLTIP_IDLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{MainState, McState};
    use std::collections::BTreeMap;

    fn controller() -> (PanelController<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let controller = PanelController::new(clock.clone(), &ControllerConfig::default());
        (controller, clock)
    }

    fn snapshot(main: MainState, mc: Option<McState>) -> ServerStatusSnapshot {
        ServerStatusSnapshot {
            main: Some(main),
            mc,
            ..Default::default()
        }
    }

    fn players(entries: &[(&str, bool)]) -> Option<BTreeMap<String, bool>> {
        Some(
            entries
                .iter()
                .map(|(name, online)| ((*name).to_string(), *online))
                .collect(),
        )
    }

    #[test]
    fn test_initial_view() {
        let (controller, _) = controller();
        let view = controller.view();
        assert!(!view.main_start_enabled);
        assert!(!view.mc_start_enabled);
        assert_eq!(view.server_ip, "-");
        assert!(view.players.is_none());
        assert_eq!(controller.tooltip(), TOOLTIP_IDLE);
    }

    #[test]
    fn test_primary_button_follows_main_state() {
        let (mut controller, _) = controller();
        let cases = [
            (MainState::Pending, false),
            (MainState::Running, false),
            (MainState::ShuttingDown, false),
            (MainState::Terminated, false),
            (MainState::Stopping, false),
            (MainState::Stopped, true),
            (MainState::StoppedSsh, true),
            (MainState::Unknown, false),
        ];

        for (main, enabled) in cases {
            controller.render(&snapshot(main, None));
            assert_eq!(controller.view().main_start_enabled, enabled, "{main:?}");
        }
    }

    #[test]
    fn test_secondary_button_follows_mc_state() {
        let (mut controller, _) = controller();
        let cases = [
            (None, false),
            (Some(McState::Stopped), true),
            (Some(McState::StartingBlank), false),
            (Some(McState::StartingLaunching), false),
            (Some(McState::StartingPreparing), false),
            (Some(McState::Running), false),
            (Some(McState::StoppedSsh), true),
            (Some(McState::Stopping), false),
            (Some(McState::Unknown), false),
        ];

        for (mc, enabled) in cases {
            controller.render(&snapshot(MainState::Running, mc));
            assert_eq!(controller.view().mc_start_enabled, enabled, "{mc:?}");
        }
    }

    #[test]
    fn test_reference_snapshot() {
        let (mut controller, _) = controller();
        controller.render(&ServerStatusSnapshot {
            main: Some(MainState::Stopped),
            mc: Some(McState::Running),
            ssh: true,
            ip: Some("1.2.3.4".to_string()),
            players: players(&[("Alice", true), ("Bob", false)]),
        });

        let view = controller.view();
        assert!(view.main_start_enabled);
        assert!(!view.mc_start_enabled);
        assert_eq!(view.main_status, "Offline (Remote connected)");
        assert_eq!(view.mc_status, "Online");
        assert_eq!(view.server_ip, "1.2.3.4");
        assert_eq!(
            view.players,
            Some(vec![
                PlayerTag { name: "Alice".to_string(), online: true },
                PlayerTag { name: "Bob".to_string(), online: false },
            ])
        );
    }

    #[test]
    fn test_players_hidden_when_mc_unreachable() {
        let (mut controller, _) = controller();
        controller.render(&ServerStatusSnapshot {
            main: Some(MainState::Running),
            mc: None,
            players: players(&[("Ghost", true)]),
            ..Default::default()
        });

        assert!(controller.view().players.is_none());
        assert_eq!(controller.view().mc_status, "Unreachable");
    }

    #[test]
    fn test_players_section_shown_but_empty_without_player_map() {
        let (mut controller, _) = controller();
        controller.render(&snapshot(MainState::Running, Some(McState::Running)));
        assert_eq!(controller.view().players, Some(Vec::new()));
    }

    #[test]
    fn test_missing_ip_uses_placeholder() {
        let (mut controller, _) = controller();
        controller.render(&ServerStatusSnapshot {
            ip: Some("5.6.7.8".to_string()),
            ..snapshot(MainState::Running, None)
        });
        assert_eq!(controller.view().server_ip, "5.6.7.8");

        controller.render(&snapshot(MainState::Stopped, None));
        assert_eq!(controller.view().server_ip, "-");
    }

    #[test]
    fn test_press_disables_buttons_until_gate_expires() {
        let (mut controller, clock) = controller();
        let offline = snapshot(MainState::Stopped, Some(McState::Stopped));
        controller.render(&offline);
        assert!(controller.view().main_start_enabled);

        controller.trigger_action(ActionKind::Primary);
        assert!(!controller.view().main_start_enabled);
        assert!(!controller.view().mc_start_enabled);
        assert!(controller.gate_active());

        // Backend still reports stopped while the start is being processed
        clock.advance(Duration::from_millis(2000));
        controller.render(&offline);
        assert!(!controller.view().main_start_enabled);
        assert!(!controller.view().mc_start_enabled);

        clock.advance(Duration::from_millis(3000));
        assert!(!controller.gate_active());
        controller.render(&offline);
        assert!(controller.view().main_start_enabled);
        assert!(controller.view().mc_start_enabled);
    }

    #[test]
    fn test_gate_freezes_buttons_for_any_snapshot() {
        let (mut controller, clock) = controller();
        controller.trigger_action(ActionKind::Secondary);

        for main in [MainState::Stopped, MainState::Running] {
            controller.render(&snapshot(main, Some(McState::Stopped)));
            assert!(!controller.view().main_start_enabled);
            assert!(!controller.view().mc_start_enabled);
        }

        // Labels still update while the gate is active
        assert_eq!(controller.view().main_status, "Online");

        clock.advance(Duration::from_millis(5000));
        controller.render(&snapshot(MainState::Pending, Some(McState::Stopped)));
        assert!(!controller.view().main_start_enabled);
        assert!(controller.view().mc_start_enabled);
    }

    #[test]
    fn test_stale_responses_are_discarded() {
        let (mut controller, _) = controller();

        let newer = ServerStatusSnapshot {
            ip: Some("9.9.9.9".to_string()),
            ..snapshot(MainState::Running, None)
        };
        let older = ServerStatusSnapshot {
            ip: Some("1.1.1.1".to_string()),
            ..snapshot(MainState::Stopped, None)
        };

        assert_eq!(controller.apply(2, Ok(newer)), PollOutcome::Applied);
        assert_eq!(controller.apply(1, Ok(older.clone())), PollOutcome::Stale);
        assert_eq!(controller.apply(2, Ok(older)), PollOutcome::Stale);

        assert_eq!(controller.view().server_ip, "9.9.9.9");
        assert_eq!(controller.diagnostics().stale_discarded, 2);
    }

    #[test]
    fn test_failure_keeps_display_and_counts() {
        let (mut controller, _) = controller();
        controller.apply(1, Ok(snapshot(MainState::Running, Some(McState::Running))));

        let error = ServerStatusSnapshot::from_json(b"nope").unwrap_err();
        let outcome = controller.apply(2, Err(ClientError::Decode(error)));
        assert!(matches!(outcome, PollOutcome::Failed(_)));

        let error = ServerStatusSnapshot::from_json(b"nope").unwrap_err();
        controller.apply(3, Err(ClientError::Decode(error)));

        assert_eq!(controller.view().main_status, "Online");
        assert_eq!(controller.diagnostics().consecutive_failures, 2);
        assert!(controller.diagnostics().last_error.is_some());

        // A failed poll does not advance the applied sequence
        assert_eq!(
            controller.apply(2, Ok(snapshot(MainState::Stopping, None))),
            PollOutcome::Applied
        );
        assert_eq!(controller.diagnostics().consecutive_failures, 0);
        assert!(controller.diagnostics().last_error.is_none());
    }

    #[test]
    fn test_action_result_does_not_touch_buttons() {
        let (mut controller, clock) = controller();
        controller.trigger_action(ActionKind::Primary);
        clock.advance(Duration::from_secs(6));

        controller.handle_event(PanelEvent::ActionFinished {
            kind: ActionKind::Primary,
            result: Err(ClientError::Status {
                status: reqwest::StatusCode::BAD_REQUEST,
                body: "Function already called".to_string(),
            }),
        });

        assert!(!controller.view().main_start_enabled);
        let record = controller.diagnostics().last_action.as_ref().unwrap();
        assert!(record.completed);
        assert_eq!(record.kind, ActionKind::Primary);
        assert!(record.error.as_deref().unwrap().contains("Function already called"));
    }

    #[test]
    fn test_copy_placeholder_still_reports_copied() {
        let (mut controller, clock) = controller();
        assert_eq!(controller.view().server_ip, "-");

        let copied = controller.copy_ip();
        assert_eq!(copied, "-");
        assert_eq!(controller.tooltip(), TOOLTIP_COPIED);

        clock.advance(Duration::from_millis(999));
        assert_eq!(controller.tooltip(), TOOLTIP_COPIED);

        clock.advance(Duration::from_millis(1));
        assert_eq!(controller.tooltip(), TOOLTIP_IDLE);
    }
}
