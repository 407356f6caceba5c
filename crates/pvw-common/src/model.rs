//! Process and connection records produced by the parser.

use serde::{Deserialize, Serialize};

/// Connection state token reported for listening sockets.
pub const STATUS_LISTEN: &str = "LISTEN";

/// Connection state token reported for closed sockets.
pub const STATUS_CLOSED: &str = "CLOSED";

/// One observed socket.
///
/// Ports stay strings so wildcard tokens such as `*` survive unchanged.
/// A `Connection` held by a [`Process`] has already passed every active
/// filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Transport protocol (`TCP`, `UDP`), may be empty.
    pub protocol: String,
    /// Connection state (`LISTEN`, `ESTABLISHED`, ...), may be empty.
    pub status: String,
    pub local_address: String,
    pub local_port: String,
    /// Empty when the socket has no peer.
    pub remote_address: String,
    /// Empty when the socket has no peer.
    pub remote_port: String,
}

impl Connection {
    /// Peer address if there is one, otherwise the local address.
    pub fn display_address(&self) -> &str {
        if self.remote_address.is_empty() {
            &self.local_address
        } else {
            &self.remote_address
        }
    }

    /// Peer port if there is one, otherwise the local port.
    pub fn display_port(&self) -> &str {
        if self.remote_port.is_empty() {
            &self.local_port
        } else {
            &self.remote_port
        }
    }

    pub fn is_listening(&self) -> bool {
        self.status == STATUS_LISTEN
    }
}

/// A process holding at least one surviving connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: u32,
    /// Executable name.
    pub name: String,
    /// Login name of the owning user.
    pub owner: String,
    /// Populated only when working-directory resolution is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Never empty.
    pub connections: Vec<Connection>,
}
