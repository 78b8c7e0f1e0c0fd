//! Terminal output.
//!
//! Status lines use short colored prefixes. Detail lines only show up with
//! `--verbose`. [`Table`] renders the `--deps` listing.

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Prints a dimmed detail line when verbose output is enabled.
pub fn verbose(msg: impl AsRef<str>) {
    if is_verbose() {
        println!("   {} {}", "·".dimmed(), msg.as_ref().dimmed());
    }
}

/// Echoes a command line right before it is executed.
pub fn executing(line: impl AsRef<str>) {
    println!("{} {}", "▶".green(), line.as_ref().green());
}

pub fn success(msg: impl AsRef<str>) {
    println!("{} {}", "✓".green(), msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    eprintln!("{} {}", "!".yellow(), msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    eprintln!("{} {}", "x".red(), msg.as_ref().red());
}

/// Box-drawn table that shrinks its widest columns to fit the terminal.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(console::measure_text_width(cell));
            }
        }

        // Indent plus one separator and two spaces of padding per column.
        let overhead = 3 + 3 * widths.len();
        let mut total: usize = widths.iter().sum();
        while total + overhead > max_width {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
            total -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let rule = |left: &str, mid: &str, right: &str| -> String {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let flat = cell.replace(['\n', '\r', '\t'], " ");
                let shown = console::truncate_str(&flat, *width, "...").to_string();
                let pad = width.saturating_sub(console::measure_text_width(&shown));
                let shown = if bold { shown.bold().to_string() } else { shown };
                out.push_str(&format!(" {}{} │", shown, " ".repeat(pad)));
            }
            out
        };

        let mut lines = vec![rule("┌", "┬", "┐"), line(&self.headers, true), rule("├", "┼", "┤")];
        for row in &self.rows {
            lines.push(line(row, false));
        }
        lines.push(rule("└", "┴", "┘"));
        lines
    }
}
