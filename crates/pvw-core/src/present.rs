//! Rendering of snapshots and controller state.
//!
//! The controller never draws. [`draw`] paints its state into an ftui frame
//! after every update; [`write_snapshot`] prints one snapshot for `--once`.

use crate::controller::{Controller, KeyBinding};
use crate::format::Snapshot;
use ftui::{Cell, Frame};
use pvw_common::{ColumnSchema, Result};
use std::fmt::Write as _;
use std::io::Write;

const COLUMN_GAP: &str = "  ";
const CURSOR_MARKER: &str = "> ";
const NO_MARKER: &str = "  ";

/// Paint the interactive screen.
pub fn draw(frame: &mut Frame, controller: &Controller, schema: &ColumnSchema) {
    let lines = screen_lines(controller, schema, usize::from(frame.height()));
    for (y, line) in lines.iter().enumerate() {
        let Ok(y) = u16::try_from(y) else { break };
        draw_text(frame, 0, y, line);
    }
}

fn draw_text(frame: &mut Frame, x: u16, y: u16, text: &str) {
    if y >= frame.height() || x >= frame.width() {
        return;
    }
    let mut col = x;
    for ch in text.chars() {
        if col >= frame.width() {
            break;
        }
        frame.buffer.set(col, y, Cell::from_char(ch));
        col = col.saturating_add(1);
    }
}

/// Lines of the interactive screen, fitted to `height` rows.
///
/// The table scrolls so the cursor row stays visible; the status and help
/// lines always stay at the bottom.
pub fn screen_lines(controller: &Controller, schema: &ColumnSchema, height: usize) -> Vec<String> {
    let snapshot = controller.snapshot();

    let mut footer = Vec::new();
    if snapshot.rows.is_empty() && !controller.is_loading() {
        footer.push("No processes with open ports.".to_string());
    }
    footer.push(String::new());
    let mut status = Vec::new();
    if controller.is_loading() {
        status.push("Loading…");
    }
    if controller.read_only() {
        status.push("read-only");
    }
    if !status.is_empty() {
        footer.push(format!("[{}]", status.join(" | ")));
    }
    if let Some(err) = controller.last_error() {
        footer.push(format!("Error: {err}"));
    }
    let keys = controller.keys();
    if controller.help_visible() {
        footer.extend(keys.full_help().iter().map(|group| help_line(group)));
    } else {
        footer.push(help_line(&keys.short_help()));
    }

    let mut table = table_lines(snapshot, schema, Some(controller.cursor()));
    if !table.is_empty() {
        let body = height.saturating_sub(footer.len() + 1).max(1);
        let offset = (controller.cursor() + 1).saturating_sub(body);
        let header = table.remove(0);
        table = std::iter::once(header)
            .chain(table.into_iter().skip(offset).take(body))
            .collect();
    }
    table.extend(footer);
    table
}

fn help_line(bindings: &[&KeyBinding]) -> String {
    bindings
        .iter()
        .map(|b| format!("{} {}", b.label, b.description))
        .collect::<Vec<_>>()
        .join(" • ")
}

/// Render a snapshot as a plain table, without cursor or help.
pub fn render_snapshot_text(snapshot: &Snapshot, schema: &ColumnSchema) -> String {
    let mut out = String::new();
    for line in table_lines(snapshot, schema, None) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Print one snapshot, as a table or as pretty JSON.
///
/// # Errors
/// * [`pvw_common::Error::Json`] if JSON serialization fails
/// * [`pvw_common::Error::Io`] if the writer fails
pub fn write_snapshot<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    schema: &ColumnSchema,
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, snapshot)?;
        writeln!(out)?;
    } else {
        out.write_all(render_snapshot_text(snapshot, schema).as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Header line followed by one line per row.
fn table_lines(snapshot: &Snapshot, schema: &ColumnSchema, cursor: Option<usize>) -> Vec<String> {
    if schema.is_empty() {
        return Vec::new();
    }
    let widths: Vec<usize> = schema
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            snapshot
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain([column.width(), column.title().chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let gutter = if cursor.is_some() { NO_MARKER } else { "" };
    let header: Vec<&str> = schema.columns().iter().map(|c| c.title()).collect();
    let mut lines = vec![table_line(gutter, &header, &widths)];

    for (index, row) in snapshot.rows.iter().enumerate() {
        let marker = match cursor {
            Some(c) if c == index => CURSOR_MARKER,
            Some(_) => NO_MARKER,
            None => "",
        };
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(table_line(marker, &cells, &widths));
    }
    lines
}

fn table_line(prefix: &str, cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::from(prefix);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(COLUMN_GAP);
        }
        let _ = write!(line, "{cell:<width$}");
    }
    line.trim_end().to_string()
}
