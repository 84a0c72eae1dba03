// src/output/style.rs

//! Label prefixes, colour palette and status-line formatting.

use std::time::Duration;

use console::{Color, Style};

/// Label colours, assigned by Group creation order.
pub const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Red,
];

/// Colour for the Group created at `creation_index`.
pub fn color_for(creation_index: usize) -> Color {
    PALETTE[creation_index % PALETTE.len()]
}

/// Decide whether labels get ANSI colours.
///
/// A non-empty `NO_COLOR` always disables colour. Otherwise a non-empty
/// `FORCE_COLOR` other than `"0"` forces it on, and failing both we colour
/// only when stdout is a terminal.
pub fn color_enabled(no_color: Option<&str>, force_color: Option<&str>, is_terminal: bool) -> bool {
    if no_color.is_some_and(|v| !v.is_empty()) {
        return false;
    }
    match force_color {
        Some(v) if !v.is_empty() => v != "0",
        _ => is_terminal,
    }
}

/// Read the colour decision from the real environment and stdout.
pub fn detect_color() -> bool {
    let no_color = std::env::var("NO_COLOR").ok();
    let force_color = std::env::var("FORCE_COLOR").ok();
    color_enabled(
        no_color.as_deref(),
        force_color.as_deref(),
        console::Term::stdout().is_term(),
    )
}

/// Builds the `label | ` prefix shared by every line of a Group.
///
/// The width is fixed once from all labels of the run so every prefix lines
/// up, whatever Group a line belongs to.
#[derive(Debug, Clone)]
pub struct LabelFormatter {
    width: usize,
    colored: bool,
}

impl LabelFormatter {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>, colored: bool) -> Self {
        let width = labels
            .into_iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        Self { width, colored }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `<label padded to width> | `, with label and separator coloured when
    /// colour is on. Content is appended after the trailing space uncoloured.
    pub fn prefix(&self, label: &str, color_index: usize) -> Vec<u8> {
        let head = format!("{label:<width$} |", width = self.width);
        let head = if self.colored {
            Style::new()
                .fg(color_for(color_index))
                .force_styling(true)
                .apply_to(head)
                .to_string()
        } else {
            head
        };

        let mut prefix = head.into_bytes();
        prefix.push(b' ');
        prefix
    }
}

/// `Done in` duration: whole milliseconds below one second, otherwise
/// seconds with one decimal.
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
