/// Column width floor so short headers still line up.
const MIN_WIDTH: usize = 4;

/// Render an aligned table. With `color`, status words are highlighted.
#[must_use]
pub fn render(headers: &[&str], rows: &[Vec<String>], color: bool) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|value| value.chars().count())
                .chain([header.chars().count(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();

    let header_line = join_cells(headers.iter().copied(), &widths, false);
    let divider = "-".repeat(header_line.trim_end().chars().count());

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header_line.trim_end().to_string());
    lines.push(divider);
    for row in rows {
        let line = join_cells(row.iter().map(String::as_str), &widths, color);
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], color: bool) -> String {
    cells
        .zip(widths)
        .map(|(value, width)| {
            let pad = " ".repeat(width.saturating_sub(value.chars().count()));
            match highlight(value).filter(|_| color) {
                Some(code) => format!("\u{1b}[{code}m{value}\u{1b}[0m{pad}"),
                None => format!("{value}{pad}"),
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn highlight(value: &str) -> Option<&'static str> {
    match value {
        "approved" | "available" | "pass" => Some("32"),
        "pending" | "in_operation" | "unreachable" | "offline" => Some("33"),
        "rejected" | "under_maintenance" | "fail" => Some("31"),
        _ => None,
    }
}
