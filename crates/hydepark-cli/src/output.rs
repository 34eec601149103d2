use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Left-aligned columns sized to the widest cell.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .fold(headers[col].len(), usize::max)
        })
        .collect();

    println!("{}", render_row(headers.iter().copied(), &widths));
    println!(
        "{}",
        widths.iter().map(|&w| "-".repeat(w)).collect::<Vec<_>>().join("  ")
    );
    for row in rows {
        println!("{}", render_row(row.iter().map(String::as_str), &widths));
    }
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:w$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// A framed headline, e.g. the deploy/verify verdict.
pub fn print_banner(title: &str) {
    let rule = "=".repeat(title.chars().count().max(40));
    println!("{rule}");
    println!("{title}");
    println!("{rule}");
}

/// Heading followed by indented lines. Prints nothing for an empty list.
pub fn print_section<S: AsRef<str>>(heading: &str, lines: &[S]) {
    if lines.is_empty() {
        return;
    }
    println!("\n{heading}:");
    for line in lines {
        println!("  {}", line.as_ref());
    }
}
