use std::{borrow::Cow, fmt::Write as _};

use crate::frame::Table;

/// Renders the first `limit` rows of `columns` (all when empty) as an aligned
/// ASCII grid with a kind line under the header.
pub fn render_head(table: &Table, columns: &[String], limit: usize) -> String {
    let selected: Vec<usize> = if columns.is_empty() {
        (0..table.column_count()).collect()
    } else {
        columns
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect()
    };
    let source = table.columns();
    let headers: Vec<String> = selected.iter().map(|&i| source[i].name.clone()).collect();
    let kinds: Vec<String> = selected
        .iter()
        .map(|&i| format!("<{}>", source[i].kind))
        .collect();
    let rows: Vec<Vec<String>> = (0..table.row_count().min(limit))
        .map(|row| selected.iter().map(|&i| source[i].display_at(row)).collect())
        .collect();

    let mut widths: Vec<usize> = headers
        .iter()
        .zip(&kinds)
        .map(|(h, k)| display_width(h).max(display_width(k)).max(3))
        .collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let _ = writeln!(output, "{}", format_row(&kinds, &widths));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
