//! Table rendering and stdout helpers.

use std::io::{self, IsTerminal, Write};

use owo_colors::{AnsiColors, OwoColorize};
use tabled::{Table, Tabled, settings::Style};

/// Render derive-tabled rows as a rounded table.
pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print to stdout, respecting quiet mode. Swallows broken pipes.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Color `text` when stdout is an interactive terminal and `NO_COLOR`
/// is unset.
pub fn paint(text: &str, color: AnsiColors) -> String {
    if io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err() {
        text.color(color).to_string()
    } else {
        text.to_owned()
    }
}
