//! Consistent color theme and styling for terminal output.

use console::Style;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::sync::LazyLock;

/// Theme for messages printed to stdout.
pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Theme for diagnostics printed to stderr.
pub static ERROR_THEME: LazyLock<Theme> =
    LazyLock::new(|| Theme::for_stream(OutputStream::Stderr));

/// Stream a theme's output is written to; colors follow that stream's TTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => std::io::stdout().is_terminal(),
            Self::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

/// Color theme for terminal output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Success/positive indicators
    pub success: Style,
    /// Error/failure indicators
    pub error: Style,
    /// Warning/caution indicators
    pub warning: Style,
    stream: OutputStream,
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_stream(OutputStream::Stdout)
    }
}

impl Theme {
    pub fn for_stream(stream: OutputStream) -> Self {
        Self {
            success: Style::new().green().bright(),
            error: Style::new().red().bright(),
            warning: Style::new().yellow().bright(),
            stream,
        }
    }

    pub fn stream(&self) -> OutputStream {
        self.stream
    }

    /// Format a success message with checkmark.
    pub fn success_with_icon(&self, text: &str) -> String {
        if self.colors_disabled() {
            format!("✓ {text}")
        } else {
            format!("{} {}", "✓".green(), self.success.apply_to(text))
        }
    }

    /// Format an error message with X mark.
    pub fn error_with_icon(&self, text: &str) -> String {
        if self.colors_disabled() {
            format!("✗ {text}")
        } else {
            format!("{} {}", "✗".red(), self.error.apply_to(text))
        }
    }

    /// Format a warning message with warning sign.
    pub fn warning_with_icon(&self, text: &str) -> String {
        if self.colors_disabled() {
            format!("⚠ {text}")
        } else {
            format!("{} {}", "⚠".yellow(), self.warning.apply_to(text))
        }
    }

    /// Check if color output should be disabled for `stream`.
    pub fn should_disable_colors(stream: OutputStream) -> bool {
        std::env::var("NO_COLOR").is_ok() || !stream.is_terminal()
    }

    fn colors_disabled(&self) -> bool {
        Self::should_disable_colors(self.stream)
    }
}
