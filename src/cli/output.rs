//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::{Color, Colorize};

use crate::domain::{Level, Tabular};
use crate::infrastructure::traits::Reporter;

/// Prints messages at or above a threshold; warning and above go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalReporter {
    threshold: Level,
}

impl TerminalReporter {
    pub fn new(threshold: Level) -> Self {
        Self { threshold }
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, level: Level, message: &str) {
        if !level.shown_at(self.threshold) {
            return;
        }
        let rendered = match color_of(level) {
            Some(color) => message.color(color).to_string(),
            None => message.to_string(),
        };
        if level.to_stderr() {
            eprintln!("{rendered}");
        } else {
            println!("{rendered}");
        }
    }
}

fn color_of(level: Level) -> Option<Color> {
    match level {
        Level::VerboseDebug | Level::Debug => Some(Color::Green),
        Level::Warning => Some(Color::Yellow),
        Level::Error | Level::Fatal => Some(Color::Red),
        Level::Info | Level::Notify => None,
    }
}

/// Render rows under headers as left-aligned columns separated by two spaces.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.iter().map(|h| h.to_string()).collect()));
    out.push('\n');
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.clone()));
        out.push('\n');
    }
    out
}

/// Print uniform records as a table on stdout.
pub fn print_records<T: Tabular>(records: &[T]) {
    let rows: Vec<Vec<String>> = records.iter().map(Tabular::row).collect();
    info(&table(T::HEADERS, &rows).trim_end());
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}
