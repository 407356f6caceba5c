//! Messages into the controller and commands out of it.
//!
//! Every transition is an explicit `match` arm on [`Msg`]; every side effect
//! is a [`Cmd`] value executed by the view. Task completions come back as
//! exactly one `Msg` each.

use crate::format::Snapshot;
use ftui::{Event, KeyEvent};
use pvw_common::Error;

/// Single message type for the controller update loop.
#[derive(Debug)]
pub enum Msg {
    // Input messages
    KeyPressed(KeyEvent),
    Resized { width: u16, height: u16 },
    /// Refresh timer.
    Tick,
    Noop,

    // Navigation messages
    CursorUp,
    CursorDown,

    // Action messages
    RefreshRequested,
    /// Terminate the process owning row `cursor`.
    TerminateRequested { cursor: usize },
    ToggleHelp,

    // Async result messages
    DataLoaded(Snapshot),
    OperationFailed(Error),
    TerminationSucceeded { pid: u32 },

    // System messages
    Quit,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key) => Msg::KeyPressed(key),
            Event::Resize { width, height } => Msg::Resized { width, height },
            // Refresh ticks come from our own subscription, not the runtime's.
            _ => Msg::Noop,
        }
    }
}

/// Side effect requested by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    None,
    /// Run the collect/parse/format pipeline off-loop.
    Refresh,
    /// Send SIGTERM to `pid` off-loop.
    Terminate { pid: u32 },
    Quit,
}
