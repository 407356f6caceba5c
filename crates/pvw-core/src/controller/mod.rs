//! Interactive controller.
//!
//! Elm-style: a [`Controller`] model updated by [`Msg`] values, returning
//! [`Cmd`] effects. [`PortView`] runs it inside an ftui program.

mod app;
mod keys;
mod msg;
mod view;

pub use app::{Controller, LoadState};
pub use keys::{KeyAction, KeyBinding, KeyMap};
pub use msg::{Cmd, Msg};
pub use view::{refresh_task, run_view, terminate_task, PortView, REFRESH_TICK_ID};
