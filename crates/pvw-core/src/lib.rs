//! pvw core library.
//!
//! Live view of the processes holding network ports:
//! - collection: lsof invocation through a timeout-aware tool runner
//! - parsing: lsof field output into filtered process records
//! - formatting: records into display rows with per-process row offsets
//! - control: an Elm-style controller driving refresh and terminate, run
//!   as an ftui program
//! - presentation: table layout for the terminal view and `--once` output

pub mod action;
pub mod collect;
pub mod config;
pub mod controller;
pub mod exit_codes;
pub mod format;
pub mod logging;
pub mod parse;
pub mod pipeline;
pub mod present;

#[cfg(test)]
mod test_utils;

pub use format::Snapshot;
pub use pipeline::Pipeline;
