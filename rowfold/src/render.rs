//! Template rendering for CLI output using outstanding

use anyhow::anyhow;
use console::{measure_text_width, Style};
use outstanding::{render_auto, render_with_output, Theme};
use rowfoldlib::{Cell, OrderDirection, ResultTable};
use serde::Serialize;

/// Include template at compile time
const RESULT_TABLE_TEMPLATE: &str = include_str!("../templates/result_table.jinja");

/// Re-export OutputMode for callers
pub use outstanding::OutputMode;

/// Widest a single cell line may render before it is truncated
const MAX_CELL_WIDTH: usize = 60;

/// Gap between columns
const GUTTER: &str = "  ";

/// Data context for the result table template
#[derive(Debug, Serialize)]
struct ResultTableContext {
    /// Pre-padded header line, sorted column marked
    header: String,
    /// Separator line (dashes)
    separator: String,
    /// Pre-padded body lines; a row with list cells spans several
    lines: Vec<String>,
    /// Row count
    footer: String,
}

/// Truncate text to fit within max_len, adding a ".." suffix if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let kept: String = text.chars().take(max_len.saturating_sub(2)).collect();
        format!("{}..", kept)
    } else {
        text.to_string()
    }
}

/// Lines a cell occupies: lists get one bulleted line per entry
fn cell_lines(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Text(text) => vec![truncate_text(text, MAX_CELL_WIDTH)],
        Cell::List(items) if items.is_empty() => vec![String::new()],
        Cell::List(items) => items
            .iter()
            .map(|item| format!("• {}", truncate_text(item, MAX_CELL_WIDTH - 2)))
            .collect(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(measure_text_width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn join_line(parts: &[String]) -> String {
    parts.join(GUTTER).trim_end().to_string()
}

/// Create the theme with styles
fn create_theme() -> Theme {
    Theme::new().add("header", Style::new().bold())
}

/// Lay the table out as pre-padded lines for the template
fn to_context(table: &ResultTable) -> ResultTableContext {
    // Mark the sorted column
    let headers: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, header)| match table.sort {
            Some(state) if state.column == i => {
                let arrow = match state.direction {
                    OrderDirection::Ascending => "▲",
                    OrderDirection::Descending => "▼",
                };
                format!("{} {}", header, arrow)
            }
            _ => header.clone(),
        })
        .collect();

    let rows: Vec<Vec<Vec<String>>> = table
        .rows
        .iter()
        .map(|row| row.cells.iter().map(cell_lines).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
    for row in &rows {
        for (i, lines) in row.iter().enumerate() {
            let widest = lines.iter().map(|l| measure_text_width(l)).max();
            if let (Some(width), Some(widest)) = (widths.get_mut(i), widest) {
                *width = (*width).max(widest);
            }
        }
    }

    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();

    let separator_width =
        widths.iter().sum::<usize>() + GUTTER.len() * widths.len().saturating_sub(1);

    let mut lines = Vec::new();
    for row in &rows {
        let height = row.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, width)| {
                    let text = row
                        .get(i)
                        .and_then(|lines| lines.get(line))
                        .map(String::as_str)
                        .unwrap_or("");
                    pad(text, *width)
                })
                .collect();
            lines.push(join_line(&parts));
        }
    }

    let noun = if table.rows.len() == 1 { "row" } else { "rows" };
    ResultTableContext {
        header: join_line(&header_cells),
        separator: "-".repeat(separator_width),
        lines,
        footer: format!("{} {}", table.rows.len(), noun),
    }
}

/// Render a result table using outstanding.
///
/// JSON mode serializes the table itself; every other mode renders the
/// text layout, styled or plain as the mode decides.
pub fn render_table(table: &ResultTable, output_mode: OutputMode) -> anyhow::Result<String> {
    let theme = create_theme();

    let rendered = if matches!(output_mode, OutputMode::Json) {
        render_auto(RESULT_TABLE_TEMPLATE, table, &theme, output_mode)
    } else {
        render_with_output(RESULT_TABLE_TEMPLATE, &to_context(table), &theme, output_mode)
    }
    .map_err(|e| anyhow!("failed to render table: {e}"))?;

    Ok(format!("{}\n", rendered.trim_end_matches('\n')))
}

fn csv_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Render a table as CSV; list entries are joined with "; "
pub fn render_csv(table: &ResultTable) -> String {
    let mut output = String::new();

    let header: Vec<String> = table.headers.iter().map(|h| csv_field(h)).collect();
    output.push_str(&header.join(","));
    output.push('\n');

    for row in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| match cell {
                Cell::Text(text) => csv_field(text),
                Cell::List(items) => csv_field(&items.join("; ")),
            })
            .collect();
        output.push_str(&cells.join(","));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowfoldlib::{serialize_by, Record, ResultSet};

    fn sample() -> ResultTable {
        let rs = ResultSet::new(
            ["id", "name", "tag"],
            vec![
                Record::new().with("id", 1).with("name", "Ann").with("tag", "a"),
                Record::new().with("id", 1).with("name", "Ann").with("tag", "b"),
                Record::new().with("id", 2).with("name", "Bo \"B\"").with("tag", "c"),
            ],
        );
        ResultTable::from_merged(&serialize_by(&rs, "id", &[]), &[])
    }

    fn text(table: &ResultTable) -> String {
        render_table(table, OutputMode::Text).unwrap()
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 6), "abcd..");
        assert_eq!(truncate_text("ééééé", 4), "éé..");
    }

    #[test]
    fn test_context_layout() {
        let context = to_context(&sample());

        assert_eq!(context.header, "id  name    tag");
        assert_eq!(context.separator, "-".repeat(15));
        assert_eq!(
            context.lines,
            vec!["1   Ann     • a", "            • b", "2   Bo \"B\"  c"]
        );
        assert_eq!(context.footer, "2 rows");
    }

    #[test]
    fn test_render_table_layout() {
        let output = text(&sample());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "id  name    tag");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "1   Ann     • a");
        assert_eq!(lines[3], "            • b");
        assert_eq!(lines[4], "2   Bo \"B\"  c");
        assert_eq!(lines.last(), Some(&"2 rows"));
    }

    #[test]
    fn test_render_table_marks_sorted_column() {
        let mut table = sample();
        table.click(1).unwrap();
        assert!(text(&table).lines().next().unwrap().contains("name ▲"));

        table.click(1).unwrap();
        assert!(text(&table).lines().next().unwrap().contains("name ▼"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = ResultTable::from_result_set(&ResultSet::new(["a"], Vec::new()), &[]);
        assert_eq!(text(&table), "a\n-\n-\n0 rows\n");
    }

    #[test]
    fn test_render_json_mode() {
        let output = render_table(&sample(), OutputMode::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["headers"], serde_json::json!(["id", "name", "tag"]));
        assert_eq!(parsed["rows"][0]["cells"][2], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_render_csv() {
        let output = render_csv(&sample());
        assert_eq!(
            output,
            "\"id\",\"name\",\"tag\"\n\"1\",\"Ann\",\"a; b\"\n\"2\",\"Bo \"\"B\"\"\",\"c\"\n"
        );
    }
}
