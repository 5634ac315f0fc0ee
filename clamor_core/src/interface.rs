use terminal_size::{terminal_size, Width};
use tracing::debug;

/// Where `clamor` writes help and error messages.
pub trait Shell {
    /// Write a line of regular output.
    fn say(&self, message: &str);

    /// Write a line of error output.
    fn error(&self, message: &str);

    /// The width available for rendering tables, if known.
    fn terminal_width(&self) -> Option<usize> {
        None
    }
}

/// A [`Shell`] over stdout/stderr.
#[derive(Debug, Default)]
pub struct ConsoleShell {}

impl Shell for ConsoleShell {
    fn say(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }

    fn terminal_width(&self) -> Option<usize> {
        if let Some((Width(terminal_width), _)) = terminal_size() {
            Some(terminal_width as usize)
        } else {
            None
        }
    }
}

/// The width of the whole terminal, in characters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TotalWidth(pub usize);

/// Renders a two column table: a left column padded to a fixed width, and a wrapped middle column.
#[derive(Debug)]
pub(crate) struct ColumnRenderer {
    indent: usize,
    left: usize,
    middle: usize,
}

// Tables occupy at most this share of the terminal width.
const USABLE_FRACTION: f64 = 0.95;

// The middle column never narrows below three short words.
pub(crate) const MINIMUM_MIDDLE_WIDTH: usize = 17;

// Spaces between the left and middle columns.
const GAP: usize = 2;

// Descriptions carry this marker, repeated on each wrapped line.
const DESCRIPTION_MARKER: &str = "# ";

const DEFAULT_TOTAL_WIDTH: usize = 80;

impl ColumnRenderer {
    /// Size the middle column to fit the terminal.
    /// The full `middle` is used when the whole row fits, otherwise whatever is left after the indent and left columns.
    pub(crate) fn guided(indent: usize, left: usize, middle: usize, total: TotalWidth) -> Self {
        let non_middle = indent + left + GAP;
        let usable = (total.0 as f64 * USABLE_FRACTION) as usize;
        let wanted = middle.max(MINIMUM_MIDDLE_WIDTH);
        let selected = if non_middle + wanted <= usable {
            wanted
        } else {
            total.0.saturating_sub(non_middle).max(MINIMUM_MIDDLE_WIDTH)
        };
        debug!(non_middle, usable, selected, "Sized the middle column.");
        Self::new(indent, left, selected)
    }

    pub(crate) fn new(indent: usize, left: usize, middle: usize) -> Self {
        Self {
            indent,
            left: left.max(1),
            middle: middle.max(2),
        }
    }

    /// Lay out one row.
    /// A `left` wider than its column pushes the middle column right.
    pub(crate) fn render(&self, left: &str, middle: &str) -> Vec<String> {
        let (indent, left_width, gap) = (self.indent, self.left, GAP);
        let (marker, text) = match middle.strip_prefix(DESCRIPTION_MARKER) {
            Some(text) => (DESCRIPTION_MARKER, text),
            None => ("", middle),
        };
        let lines = wrap(text, self.middle.saturating_sub(marker.len()));

        if lines.is_empty() {
            return vec![format!("{:indent$}{left}", "").trim_end().to_string()];
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let left = if i == 0 { left } else { "" };
                format!("{:indent$}{left:left_width$}{:gap$}{marker}{part}", "", "")
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

/// Render `rows` as an aligned two column table, writing each line to `shell`.
pub(crate) fn print_table(shell: &dyn Shell, rows: &[(String, String)], indent: usize) {
    let left = rows.iter().map(|(left, _)| left.chars().count()).max();
    let middle = rows.iter().map(|(_, middle)| middle.chars().count()).max();

    if let (Some(left), Some(middle)) = (left, middle) {
        let total = TotalWidth(shell.terminal_width().unwrap_or(DEFAULT_TOTAL_WIDTH));
        let renderer = ColumnRenderer::guided(indent, left, middle, total);

        for (left, middle) in rows {
            for line in renderer.render(left, middle) {
                shell.say(&line);
            }
        }
    }
}

/// Write `paragraph` wrapped to the shell's width, indented by `indent` spaces.
pub(crate) fn print_wrapped(shell: &dyn Shell, paragraph: &str, indent: usize) {
    let width = shell.terminal_width().unwrap_or(DEFAULT_TOTAL_WIDTH);
    let width = width.saturating_sub(indent).max(MINIMUM_MIDDLE_WIDTH);

    for line in paragraph.lines() {
        if line.trim().is_empty() {
            shell.say("");
            continue;
        }

        for part in wrap(line, width) {
            shell.say(&format!("{:indent$}{part}", ""));
        }
    }
}

/// Break `paragraph` into lines of at most `width` characters.
/// Words longer than a line are split with a trailing `-`.
fn wrap(paragraph: &str, width: usize) -> Vec<String> {
    let width = width.max(2);
    let mut lines = Vec::default();
    let mut line = String::default();
    let mut line_length = 0;

    for word in paragraph.split_whitespace() {
        let characters: Vec<char> = word.chars().collect();
        let mut rest = &characters[..];

        if line_length > 0 && line_length + 1 + rest.len() > width {
            lines.push(std::mem::take(&mut line));
            line_length = 0;
        }

        while rest.len() > width {
            let (head, tail) = rest.split_at(width - 1);
            lines.push(format!("{}-", head.iter().collect::<String>()));
            rest = tail;
        }

        if line_length > 0 {
            line.push(' ');
            line_length += 1;
        }

        line.extend(rest);
        line_length += rest.len();
    }

    if line_length > 0 {
        lines.push(line);
    }

    lines
}

/// *Available using 'unit_test' crate feature only.*
/// A [`Shell`] that records everything written to it.
#[cfg(any(test, feature = "unit_test"))]
pub use self::util::CapturedShell;

#[cfg(any(test, feature = "unit_test"))]
mod util {
    use super::Shell;
    use std::cell::RefCell;

    /// *Available using 'unit_test' crate feature only.*
    /// A [`Shell`] that records everything written to it.
    #[derive(Debug, Default)]
    pub struct CapturedShell {
        message: RefCell<Vec<String>>,
        error: RefCell<Vec<String>>,
        width: Option<usize>,
    }

    impl CapturedShell {
        /// Record output as if rendered to a terminal `width` columns wide.
        pub fn with_width(width: usize) -> Self {
            Self {
                width: Some(width),
                ..Self::default()
            }
        }

        /// The regular output, joined by newlines.
        pub fn output(&self) -> String {
            self.message.borrow().join("\n")
        }

        /// The error output, joined by newlines.
        pub fn errors(&self) -> String {
            self.error.borrow().join("\n")
        }

        /// Take the recorded output and error output, leaving both empty.
        pub fn consume(&self) -> (Option<String>, Option<String>) {
            let message = self.message.take();
            let error = self.error.take();
            (
                (!message.is_empty()).then(|| message.join("\n")),
                (!error.is_empty()).then(|| error.join("\n")),
            )
        }
    }

    impl Shell for CapturedShell {
        fn say(&self, message: &str) {
            self.message.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.error.borrow_mut().push(message.to_string());
        }

        fn terminal_width(&self) -> Option<usize> {
            self.width
        }
    }
}
