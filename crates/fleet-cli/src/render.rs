//! Terminal tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fleet_import::{CommitReport, CommitStatus, ValidationReport};
use fleet_model::CellValue;
use fleet_table::{SortDirection, TableView};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

/// Cut `text` to at most `max_width` characters, marking the cut with `…`.
pub fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 || text.chars().count() <= max_width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn value_cell(value: &CellValue, max_width: usize) -> Cell {
    match value {
        CellValue::Null => dim_cell("-"),
        CellValue::Number(_) => {
            Cell::new(value.display_text()).set_alignment(CellAlignment::Right)
        }
        _ => Cell::new(truncate(&value.display_text(), max_width)),
    }
}

/// One page of a table view, sort arrow on the active column.
pub fn view_table(view: &TableView, max_width: usize) -> Table {
    let mut table = Table::new();
    table.set_header(view.headers.iter().map(|header| {
        let label = match header.sort {
            Some(SortDirection::Ascending) => format!("{} ▲", header.label),
            Some(SortDirection::Descending) => format!("{} ▼", header.label),
            None => header.label.clone(),
        };
        header_cell(&label)
    }));
    apply_table_style(&mut table);
    for row in &view.rows {
        table.add_row(row.cells.iter().map(|cell| value_cell(cell, max_width)));
    }
    table
}

pub fn page_footer(view: &TableView) -> String {
    if view.filtered_count == view.total_count {
        format!(
            "Page {} of {} ({} records)",
            view.page, view.total_pages, view.total_count
        )
    } else {
        format!(
            "Page {} of {} ({} of {} records match)",
            view.page, view.total_pages, view.filtered_count, view.total_count
        )
    }
}

pub fn validation_summary<T>(report: &ValidationReport<T>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Valid"),
        header_cell("Invalid"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(report.total_rows),
        count_cell(report.valid_count, Color::Green),
        count_cell(report.invalid_count, Color::Red),
    ]);
    table
}

pub fn commit_summary<T>(report: &CommitReport<T>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Submitted"),
        header_cell("Succeeded"),
        header_cell("Failed"),
        header_cell("Result"),
    ]);
    apply_table_style(&mut table);
    let status_color = match report.status() {
        CommitStatus::CleanSuccess => Color::Green,
        CommitStatus::CleanFailure => Color::Red,
        CommitStatus::Mixed => Color::Yellow,
    };
    let mut status = report.status().to_string();
    if report.cancelled {
        status.push_str(" (cancelled)");
    }
    table.add_row(vec![
        Cell::new(report.total()),
        count_cell(report.succeeded, Color::Green),
        count_cell(report.failed, Color::Red),
        Cell::new(status).fg(status_color),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use fleet_import::CommitReport;
    use fleet_model::{CommitOutcome, SubmitResponse};
    use fleet_table::{ColumnHeader, TableRow};

    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("Zürich Depot", 6), "Züric…");
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("unbounded", 0), "unbounded");
    }

    #[test]
    fn view_table_cuts_cells_at_the_given_width() {
        let view = TableView {
            headers: vec![ColumnHeader {
                key: "errors".to_string(),
                label: "Errors".to_string(),
                sortable: false,
                sort: None,
            }],
            rows: vec![TableRow {
                id: "line-2".to_string(),
                cells: vec![CellValue::from("plate: does not match pattern ^[A-Z]{2}-[0-9]+$")],
            }],
            page: 1,
            total_pages: 1,
            items_per_page: 20,
            filtered_count: 1,
            total_count: 1,
        };
        let rendered = view_table(&view, 12).to_string();
        assert!(rendered.contains("plate: does…"));
        assert!(!rendered.contains("pattern"));
    }

    #[test]
    fn commit_summary_lists_counts() {
        let report = CommitReport::from_outcomes(
            vec![
                CommitOutcome::from_response(1, SubmitResponse::accepted("created")),
                CommitOutcome::failed(2, "duplicate"),
            ],
            false,
        );
        let mut table = commit_summary(&report);
        table.force_no_tty();
        let rendered = table.to_string();
        assert!(rendered.contains("mixed result"));
        assert!(rendered.contains("Succeeded"));
    }
}
