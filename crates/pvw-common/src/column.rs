//! Display columns and the schema that selects them.

use serde::{Deserialize, Serialize};

/// One display row; cells line up with the schema's columns.
pub type Row = Vec<String>;

/// Every column the formatter knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Pid,
    Name,
    Directory,
    Owner,
    Protocol,
    /// Remote address, or local when there is no peer.
    Address,
    /// Remote port, or local when there is no peer.
    Port,
    LocalAddress,
    LocalPort,
    RemoteAddress,
    RemotePort,
    Status,
}

impl Column {
    /// Canonical display order.
    pub const ALL: [Column; 12] = [
        Column::Pid,
        Column::Name,
        Column::Directory,
        Column::Owner,
        Column::Protocol,
        Column::Address,
        Column::Port,
        Column::LocalAddress,
        Column::LocalPort,
        Column::RemoteAddress,
        Column::RemotePort,
        Column::Status,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Pid => "PID",
            Column::Name => "Name",
            Column::Directory => "Directory",
            Column::Owner => "Owner",
            Column::Protocol => "Protocol",
            Column::Address => "Address",
            Column::Port => "Port",
            Column::LocalAddress => "Local Address",
            Column::LocalPort => "Local Port",
            Column::RemoteAddress => "Remote Address",
            Column::RemotePort => "Remote Port",
            Column::Status => "Status",
        }
    }

    /// Preferred cell width in characters.
    pub fn width(self) -> usize {
        match self {
            Column::Pid | Column::Port | Column::LocalPort | Column::RemotePort => 5,
            Column::Name => 10,
            Column::Directory => 16,
            Column::Owner => 8,
            Column::Protocol => 3,
            Column::Address | Column::LocalAddress | Column::RemoteAddress => 15,
            Column::Status => 11,
        }
    }

    /// Process-level columns appear only on the first row of a process's block.
    pub fn is_process_level(self) -> bool {
        matches!(
            self,
            Column::Pid | Column::Name | Column::Directory | Column::Owner
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Column visibility switches, as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnToggles {
    pub status: bool,
    pub protocol: bool,
    pub addresses: bool,
    pub full_connection: bool,
    pub owner: bool,
    pub name: bool,
    pub pid: bool,
    pub directory: bool,
}

impl Default for ColumnToggles {
    fn default() -> Self {
        Self {
            status: true,
            protocol: false,
            addresses: false,
            full_connection: false,
            owner: false,
            name: false,
            pid: true,
            directory: false,
        }
    }
}

/// Ordered set of enabled columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build the schema from toggles, keeping the canonical column order.
    ///
    /// Full-connection mode swaps the composite Address/Port pair for the
    /// four explicit local/remote columns.
    pub fn from_toggles(t: &ColumnToggles) -> Self {
        let columns = Column::ALL
            .into_iter()
            .filter(|column| match column {
                Column::Pid => t.pid,
                Column::Name => t.name,
                Column::Directory => t.directory,
                Column::Owner => t.owner,
                Column::Protocol => t.protocol,
                Column::Address => t.addresses && !t.full_connection,
                Column::Port => !t.full_connection,
                Column::LocalAddress
                | Column::LocalPort
                | Column::RemoteAddress
                | Column::RemotePort => t.full_connection,
                Column::Status => t.status,
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::from_toggles(&ColumnToggles::default())
    }
}
