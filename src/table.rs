use std::fmt::Write as _;

/// Renders rows under a header line and a dashed rule. Cells are padded to
/// the widest value in their column; columns holding only digits are
/// right-aligned.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().max(3)).collect();
    let mut numeric = vec![true; headers.len()];
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(headers.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
            numeric[idx] &= !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit());
        }
    }
    if rows.is_empty() {
        numeric.fill(false);
    }

    let mut output = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(&mut output, &header_cells, &widths, &numeric);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut output, &rule, &widths, &vec![false; widths.len()]);
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| sanitize(cell)).collect();
        push_line(&mut output, &cells, &widths, &numeric);
    }
    output
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize], right: &[bool]) {
    let line = cells
        .iter()
        .zip(widths)
        .zip(right)
        .map(|((cell, width), right)| {
            if *right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(output, "{}", line.trim_end());
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
