//! Port enumeration.
//!
//! This module provides the collection layer:
//! - Tool runner for external command execution
//! - lsof invocation for socket enumeration and working-directory lookup
//!
//! The raw text it returns is turned into records by [`crate::parse`].

mod lsof;
pub mod tool_runner;

pub use lsof::{extract_working_directory, LsofSource, PortSource, LSOF_NO_RESULTS_EXIT};
pub use tool_runner::{ToolConfig, ToolOutput, ToolRunner};
