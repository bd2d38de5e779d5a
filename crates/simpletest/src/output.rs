//! Output sinks for run reports
//!
//! The runner formats complete lines and hands each one to an [`Output`]
//! with a single call. Sinks decide where the text goes:
//! - [`StdoutOutput`]: standard output, optionally coloured
//! - [`BufferOutput`]: in-memory capture, shareable across threads
//! - [`FnOutput`]: any `FnMut(&str)` closure

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Kind of line being printed, used by sinks that style their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Ordinary text
    #[default]
    Plain,
    /// A fixture or run that passed
    Pass,
    /// A fixture or run that failed
    Fail,
    /// A recorded failure message
    Detail,
}

impl Status {
    /// Get the color for this status
    pub fn color(&self) -> Option<Color> {
        match self {
            Status::Plain => None,
            Status::Pass => Some(Color::Green),
            Status::Fail => Some(Color::Red),
            Status::Detail => Some(Color::Yellow),
        }
    }
}

/// Destination for report lines.
pub trait Output {
    /// Print one line of text.
    fn print(&mut self, text: &str);

    /// Print one line with a status hint. Sinks without styling ignore it.
    fn print_status(&mut self, _status: Status, text: &str) {
        self.print(text);
    }
}

impl<O: Output + ?Sized> Output for &mut O {
    fn print(&mut self, text: &str) {
        (**self).print(text);
    }

    fn print_status(&mut self, status: Status, text: &str) {
        (**self).print_status(status, text);
    }
}

impl<O: Output + ?Sized> Output for Box<O> {
    fn print(&mut self, text: &str) {
        (**self).print(text);
    }

    fn print_status(&mut self, status: Status, text: &str) {
        (**self).print_status(status, text);
    }
}

/// Writes lines to standard output.
pub struct StdoutOutput {
    stream: StandardStream,
    colors: bool,
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutOutput {
    /// Standard output, coloured when the terminal supports it
    pub fn new() -> Self {
        Self::with_color_choice(ColorChoice::Auto)
    }

    /// Standard output without any escape sequences
    pub fn plain() -> Self {
        Self::with_color_choice(ColorChoice::Never)
    }

    /// Standard output with an explicit colour choice
    pub fn with_color_choice(choice: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stdout(choice),
            colors: choice != ColorChoice::Never,
        }
    }

    fn write_line(&mut self, status: Status, text: &str) -> io::Result<()> {
        match status.color().filter(|_| self.colors) {
            Some(color) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(color)).set_bold(status == Status::Fail);
                self.stream.set_color(&spec)?;
                write!(self.stream, "{text}")?;
                self.stream.reset()?;
                writeln!(self.stream)?;
            }
            None => writeln!(self.stream, "{text}")?,
        }
        self.stream.flush()
    }
}

impl Output for StdoutOutput {
    fn print(&mut self, text: &str) {
        // Report output is fire-and-forget.
        let _ = self.write_line(Status::Plain, text);
    }

    fn print_status(&mut self, status: Status, text: &str) {
        let _ = self.write_line(status, text);
    }
}

/// Captures lines in memory, one entry per print call.
///
/// Clones share the same buffer, so a clone can be handed to a runner and
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct BufferOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferOutput {
    /// An empty capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every captured line
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Captured lines joined with newlines
    pub fn contents(&self) -> String {
        let lines = self.lines.lock();
        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Discard every captured line
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Output for BufferOutput {
    fn print(&mut self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}

/// Adapts a closure into an [`Output`].
pub struct FnOutput<F>(pub F);

impl<F: FnMut(&str)> Output for FnOutput<F> {
    fn print(&mut self, text: &str) {
        (self.0)(text);
    }
}
