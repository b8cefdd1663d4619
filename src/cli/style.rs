//! Terminal styling for CLI output
//!
//! Colors are applied through owo-colors and stripped by anstream when the
//! output isn't a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark used for passing candidates
pub const CHECK: &str = "✓";

/// Cross used for skipped candidates
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Bold, for headings and important values
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Cyan, for identifiers like PR numbers and labels
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    /// Dimmed, for secondary detail
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    /// Green
    fn success(&self) -> String {
        self.green().to_string()
    }

    /// Yellow
    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    /// Red
    fn error(&self) -> String {
        self.red().to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled cross
pub fn cross() -> String {
    CROSS.warn()
}
