//! Parse-time filter configuration.

use serde::{Deserialize, Serialize};

/// Filters applied during a single parse pass.
///
/// Empty allow-lists disable that filter. The value is cloned into each
/// refresh task and never mutated while a parse is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Process names to keep (exact match).
    pub names: Vec<String>,
    /// Ports to keep; a connection matches on either its local or remote port.
    pub ports: Vec<String>,
    /// Keep only connections in the listening state.
    pub listen_only: bool,
    /// Keep connections in the closed state.
    pub show_closed: bool,
    /// Look up each kept process's working directory.
    pub resolve_working_directory: bool,
}

impl FilterConfig {
    /// Whether the name allow-list admits `name`.
    pub fn admits_name(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }

    /// Whether the port allow-list admits a connection with these ports.
    pub fn admits_ports(&self, local: &str, remote: &str) -> bool {
        self.ports.is_empty() || self.ports.iter().any(|p| p == local || p == remote)
    }
}
