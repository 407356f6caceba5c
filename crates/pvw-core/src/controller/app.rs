//! Controller state machine.
//!
//! ## Model Contract
//!
//! - `init()` returns the startup command (an initial refresh)
//! - `update(msg)` applies one [`Msg`] and returns the [`Cmd`] to execute
//! - accessors expose read-only state to the presenter
//!
//! All state lives here and is touched only by the loop thread. Refresh and
//! terminate run elsewhere and report back through `update`.
//!
//! Nothing guards against overlapping operations: a second refresh can be
//! issued while one is in flight, and whichever result arrives last wins.

use super::keys::{KeyAction, KeyMap};
use super::msg::{Cmd, Msg};
use crate::format::Snapshot;
use ftui::{KeyEvent, KeyEventKind};

/// Whether a refresh has been issued and not yet answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

/// Interactive controller.
#[derive(Debug)]
pub struct Controller {
    state: LoadState,
    snapshot: Snapshot,
    /// Most recent failure, kept until a newer one replaces it.
    last_error: Option<String>,
    cursor: usize,
    help_visible: bool,
    read_only: bool,
    keys: KeyMap,
    /// Outstanding task count, for display only.
    in_flight: usize,
    quitting: bool,
}

impl Controller {
    pub fn new(keys: KeyMap, read_only: bool) -> Self {
        Self {
            state: LoadState::Idle,
            snapshot: Snapshot::default(),
            last_error: None,
            cursor: 0,
            help_visible: false,
            read_only,
            keys,
            in_flight: 0,
            quitting: false,
        }
    }

    /// Startup command: load the first snapshot.
    pub fn init(&mut self) -> Cmd {
        self.begin_refresh()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    /// Apply one message.
    pub fn update(&mut self, msg: Msg) -> Cmd {
        match msg {
            Msg::KeyPressed(key) => self.handle_key(&key),
            Msg::Resized { width, height } => {
                tracing::debug!(target: "pvw.controller", width, height, "Terminal resized");
                Cmd::None
            }
            Msg::Noop => Cmd::None,
            Msg::Tick => {
                tracing::trace!(target: "pvw.controller", "refresh timer fired");
                self.begin_refresh()
            }

            Msg::CursorUp => {
                self.cursor = self.cursor.saturating_sub(1);
                Cmd::None
            }
            Msg::CursorDown => {
                if self.cursor + 1 < self.snapshot.row_count() {
                    self.cursor += 1;
                }
                Cmd::None
            }

            Msg::RefreshRequested => {
                tracing::info!(target: "pvw.controller", action = "refresh_requested", "Refresh requested");
                self.begin_refresh()
            }
            Msg::TerminateRequested { cursor } => self.begin_terminate(cursor),
            Msg::ToggleHelp => {
                self.help_visible = !self.help_visible;
                Cmd::None
            }

            Msg::DataLoaded(snapshot) => {
                self.finish_task();
                tracing::info!(
                    target: "pvw.controller",
                    processes = snapshot.processes.len(),
                    rows = snapshot.row_count(),
                    "Snapshot loaded"
                );
                self.snapshot = snapshot;
                self.cursor = self.cursor.min(self.snapshot.row_count().saturating_sub(1));
                self.state = LoadState::Idle;
                Cmd::None
            }
            Msg::OperationFailed(error) => {
                self.finish_task();
                tracing::error!(
                    target: "pvw.controller",
                    category = %error.category(),
                    error = %error,
                    "Operation failed"
                );
                self.last_error = Some(error.to_string());
                self.state = LoadState::Idle;
                Cmd::None
            }
            Msg::TerminationSucceeded { pid } => {
                self.finish_task();
                tracing::info!(target: "pvw.controller", pid, "Termination delivered, reloading");
                self.begin_refresh()
            }

            Msg::Quit => {
                tracing::info!(target: "pvw.controller", action = "quit", "Quit requested");
                self.quitting = true;
                Cmd::Quit
            }
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Cmd {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return Cmd::None;
        }
        let Some(action) = self.keys.action_for(key) else {
            tracing::trace!(target: "pvw.controller", key_code = ?key.code, "unbound key");
            return Cmd::None;
        };
        let msg = match action {
            KeyAction::Up => Msg::CursorUp,
            KeyAction::Down => Msg::CursorDown,
            KeyAction::Terminate => Msg::TerminateRequested {
                cursor: self.cursor,
            },
            KeyAction::Refresh => Msg::RefreshRequested,
            KeyAction::Help => Msg::ToggleHelp,
            KeyAction::Quit => Msg::Quit,
        };
        self.update(msg)
    }

    fn begin_refresh(&mut self) -> Cmd {
        self.state = LoadState::Loading;
        self.in_flight += 1;
        Cmd::Refresh
    }

    fn begin_terminate(&mut self, cursor: usize) -> Cmd {
        if self.read_only {
            tracing::debug!(target: "pvw.controller", cursor, "terminate ignored in read-only mode");
            return Cmd::None;
        }
        let Some(process) = self.snapshot.process_for_row(cursor) else {
            tracing::debug!(target: "pvw.controller", cursor, "no process under cursor");
            return Cmd::None;
        };
        let pid = process.id;
        tracing::info!(
            target: "pvw.controller",
            pid,
            name = %process.name,
            cursor,
            "Termination requested"
        );
        self.in_flight += 1;
        Cmd::Terminate { pid }
    }

    fn finish_task(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}
