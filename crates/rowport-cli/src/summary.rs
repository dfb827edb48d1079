use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rowport_cli::pipeline::ImportOutcome;
use rowport_core::store::LedgerEntry;
use rowport_core::{RecordPreview, SessionState, SessionStatus, WriteMode};

/// Longest title or body shown in a preview cell.
const PREVIEW_WIDTH: usize = 48;

pub fn print_report(outcome: &ImportOutcome) {
    let report = &outcome.report;
    println!("Source: {}", outcome.source.display());
    println!("Session: {}", outcome.key);
    let mode = match report.mode {
        WriteMode::DryRun => "dry run (nothing written)",
        WriteMode::Persisted => "persisted",
    };
    println!("Mode: {mode}");
    if report.source_changed {
        println!("Note: the source changed since the previous run");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Title"),
        header_cell("Body"),
        header_cell("Kind"),
        header_cell("Status"),
        header_cell("Attributes"),
        header_cell("Id"),
    ]);
    apply_report_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);
    for (index, preview) in report.previews.iter().enumerate() {
        let id_cell = match report.created.get(index) {
            Some(id) => Cell::new(id).fg(Color::Green),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(preview.row + 1),
            text_cell(&preview.title),
            text_cell(&preview.body),
            Cell::new(&preview.kind),
            Cell::new(&preview.status),
            attribute_cell(preview),
            id_cell,
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} rows", report.previews.len())).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(report.created.len()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    if !report.deleted.is_empty() {
        println!("Deleted {} records from the previous run", report.deleted.len());
    }
}

pub fn print_report_json(outcome: &ImportOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    println!("{json}");
    Ok(())
}

pub fn print_status(status: &SessionStatus) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Session"),
        header_cell("State"),
        header_cell("Records"),
        header_cell("Saved"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(&status.key),
        state_cell(status.state),
        record_count_cell(status.entry.as_ref()),
        saved_cell(status.entry.as_ref()),
    ]);
    println!("{table}");
}

pub fn print_sessions(sessions: &[(String, LedgerEntry)]) {
    if sessions.is_empty() {
        println!("No recorded sessions");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Session"),
        header_cell("Source"),
        header_cell("Records"),
        header_cell("Saved"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (key, entry) in sessions {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(&entry.source),
            record_count_cell(Some(entry)),
            saved_cell(Some(entry)),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_report_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn state_cell(state: SessionState) -> Cell {
    let cell = Cell::new(state);
    match state {
        SessionState::Clean => cell.fg(Color::Green),
        SessionState::PendingDecision => cell.fg(Color::Yellow).add_attribute(Attribute::Bold),
        SessionState::Force => cell.fg(Color::Red),
        SessionState::Continue => cell.fg(Color::Blue),
    }
}

fn record_count_cell(entry: Option<&LedgerEntry>) -> Cell {
    match entry {
        Some(entry) => Cell::new(entry.record_ids.len()),
        None => dim_cell("-"),
    }
}

fn saved_cell(entry: Option<&LedgerEntry>) -> Cell {
    match entry.and_then(LedgerEntry::saved_at) {
        Some(saved_at) => Cell::new(saved_at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => dim_cell("-"),
    }
}

fn attribute_cell(preview: &RecordPreview) -> Cell {
    if preview.attributes.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(preview.attributes.len())
    }
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        return dim_cell("-");
    }
    let mut chars = value.chars();
    let shown: String = chars.by_ref().take(PREVIEW_WIDTH).collect();
    if chars.next().is_some() {
        Cell::new(format!("{shown}…"))
    } else {
        Cell::new(shown)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
