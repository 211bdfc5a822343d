//! Result rendering: aligned tables for dataframes, colored scalar lines.

use owo_colors::OwoColorize;
use unicode_width::UnicodeWidthStr;

use crate::engine::{DataFrame, ExecutionResult};

pub fn print_result(result: &ExecutionResult) {
    match result {
        ExecutionResult::DataFrame(frame) => print!("{}", render_frame(frame)),
        ExecutionResult::Scalar { label, value } => {
            println!("{} = {}", label, value.to_string().green());
        }
        ExecutionResult::Text(text) => println!("{}", text),
    }
}

/// Plain aligned table. Row labels, when present, render as a leading
/// unnamed column.
pub fn render_frame(frame: &DataFrame) -> String {
    let has_index = frame.index.is_some();
    let mut header: Vec<String> = Vec::new();
    if has_index {
        header.push(String::new());
    }
    header.extend(frame.columns.iter().cloned());

    let mut grid: Vec<Vec<String>> = vec![header];
    for (r, row) in frame.rows.iter().enumerate() {
        let mut line = Vec::new();
        if let Some(index) = &frame.index {
            line.push(index.get(r).cloned().unwrap_or_default());
        }
        line.extend(row.iter().map(|v| v.to_string()));
        grid.push(line);
    }

    let cols = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| grid.iter().filter_map(|r| r.get(c)).map(|s| s.width()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in &grid {
        let mut line = String::new();
        for (c, cell) in row.iter().enumerate() {
            if c > 0 {
                line.push_str("  ");
            }
            let pad = widths[c].saturating_sub(cell.width());
            // First column left-aligned, the rest right-aligned like numbers.
            if c == 0 {
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
            } else {
                line.push_str(&" ".repeat(pad));
                line.push_str(cell);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    #[test]
    fn renders_labeled_frame_with_alignment() {
        let frame = DataFrame {
            index: Some(vec!["count".into(), "mean".into()]),
            columns: vec!["age".into()],
            rows: vec![vec![Value::Int(4)], vec![Value::Float(35.0)]],
        };
        let text = render_frame(&frame);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("age"));
        assert!(lines[1].starts_with("count"));
        assert!(lines[2].starts_with("mean"));
        // Values right-align under the header.
        assert!(lines[1].ends_with("4"));
        assert!(lines[2].ends_with("35.0"));
    }

    #[test]
    fn renders_plain_frame_without_index_column() {
        let frame = DataFrame {
            index: None,
            columns: vec!["city".into(), "count".into()],
            rows: vec![vec![Value::Str("Boston".into()), Value::Int(2)]],
        };
        let text = render_frame(&frame);
        assert!(text.starts_with("city"));
        assert!(text.contains("Boston"));
    }
}
