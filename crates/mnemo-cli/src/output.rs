use serde::Serialize;
use std::io::{self, Write};

/// Titles longer than this are cut so one verbose note does not stretch
/// every row of a listing.
const MAX_TITLE_WIDTH: usize = 48;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    emit(&json)
}

/// A reader that hangs up early (`mnemo list | head`) is not an error.
fn emit(text: &str) -> anyhow::Result<()> {
    match io::stdout().lock().write_all(text.as_bytes()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(Into::into),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Column-aligned listing of notes, tags, and the like. Empty cells show as
/// `-` and a `TITLE` column is capped at [`MAX_TITLE_WIDTH`].
pub struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &'static [&'static str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = cells
            .into_iter()
            .zip(self.headers)
            .map(|(cell, header)| {
                let cell: String = cell.into();
                if cell.is_empty() {
                    "-".to_string()
                } else if *header == "TITLE" {
                    clip(cell, MAX_TITLE_WIDTH)
                } else {
                    cell
                }
            })
            .collect();
        self.rows.push(row);
    }

    pub fn print(&self) -> anyhow::Result<()> {
        emit(&self.render())
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, self.headers.iter().copied(), &widths);
        let rules: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        push_line(&mut out, rules.iter().map(String::as_str), &widths);
        for row in &self.rows {
            push_line(&mut out, row.iter().map(String::as_str), &widths);
        }
        out
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:w$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

fn clip(cell: String, max: usize) -> String {
    if cell.chars().count() <= max {
        return cell;
    }
    let kept: String = cell.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

// ---------------------------------------------------------------------------
// Detail view
// ---------------------------------------------------------------------------

/// `Label:` lines with values aligned one space past the longest label.
/// `None` values are skipped; empty ones show as `-`.
pub fn print_fields(fields: &[(&str, Option<String>)]) -> anyhow::Result<()> {
    emit(&render_fields(fields))
}

fn render_fields(fields: &[(&str, Option<String>)]) -> String {
    let width = fields.iter().map(|(l, _)| l.len() + 2).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in fields {
        let Some(value) = value else { continue };
        let value = if value.is_empty() { "-" } else { value.as_str() };
        let label = format!("{label}:");
        out.push_str(&format!("{label:width$}{value}\n"));
    }
    out
}
