//! Row formatting for the process table.
//!
//! Each process contributes one row per connection. Process-level cells
//! (PID, name, directory, owner) are filled only on the first row of the
//! process's block, which the presenter relies on to draw grouped rows.
//! The start offset of every block is returned alongside the rows so a row
//! cursor can be mapped back to its process.

use pvw_common::{Column, ColumnSchema, Connection, Process, Row};
use serde::Serialize;

/// One refresh result: processes, their rows, and row-block offsets.
///
/// Immutable once built; the controller replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub processes: Vec<Process>,
    pub rows: Vec<Row>,
    /// `row_starts[i]` is the index of the first row of `processes[i]`.
    pub row_starts: Vec<usize>,
}

impl Snapshot {
    /// Format `processes` under `schema` and bundle the result.
    pub fn build(processes: Vec<Process>, schema: &ColumnSchema) -> Self {
        let (rows, row_starts) = format(&processes, schema);
        Self {
            processes,
            rows,
            row_starts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the process whose row block contains `row`.
    ///
    /// Binary search for the last block starting at or before `row`.
    pub fn process_index_for_row(&self, row: usize) -> Option<usize> {
        if row >= self.rows.len() {
            return None;
        }
        let after = self.row_starts.partition_point(|&start| start <= row);
        after.checked_sub(1)
    }

    /// Process owning `row`, if the row exists.
    pub fn process_for_row(&self, row: usize) -> Option<&Process> {
        self.process_index_for_row(row)
            .and_then(|index| self.processes.get(index))
    }
}

/// Format processes into table rows.
///
/// Returns the rows and, per process, the index of its first row.
pub fn format(processes: &[Process], schema: &ColumnSchema) -> (Vec<Row>, Vec<usize>) {
    let total: usize = processes.iter().map(|p| p.connections.len()).sum();
    let mut rows = Vec::with_capacity(total);
    let mut row_starts = Vec::with_capacity(processes.len());

    for process in processes {
        row_starts.push(rows.len());
        for (index, conn) in process.connections.iter().enumerate() {
            let first = index == 0;
            let row: Row = schema
                .columns()
                .iter()
                .map(|&column| cell(column, process, conn, first))
                .collect();
            rows.push(row);
        }
    }

    (rows, row_starts)
}

fn cell(column: Column, process: &Process, conn: &Connection, first: bool) -> String {
    if column.is_process_level() && !first {
        return String::new();
    }
    match column {
        Column::Pid => process.id.to_string(),
        Column::Name => process.name.clone(),
        Column::Directory => process.working_directory.clone().unwrap_or_default(),
        Column::Owner => process.owner.clone(),
        Column::Protocol => conn.protocol.clone(),
        Column::Address => conn.display_address().to_string(),
        Column::Port => conn.display_port().to_string(),
        Column::LocalAddress => conn.local_address.clone(),
        Column::LocalPort => conn.local_port.clone(),
        Column::RemoteAddress => conn.remote_address.clone(),
        Column::RemotePort => conn.remote_port.clone(),
        Column::Status => conn.status.to_uppercase(),
    }
}
