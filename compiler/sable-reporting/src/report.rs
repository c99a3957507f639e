//! Data structures for a single compiler diagnostic.
use std::fmt;

use sable_utils::highlight::{Colour, Modifier, highlight};

/// The severity of a [Report].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// A fatal problem with the input.
    Error,

    /// A problem that does not stop compilation.
    Warning,

    /// Purely informational output.
    Info,

    /// A broken compiler invariant.
    Internal,
}

impl ReportKind {
    /// Check whether the kind stops compilation.
    pub fn is_fatal(self) -> bool {
        matches!(self, ReportKind::Error | ReportKind::Internal)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportKind::Error => highlight(Colour::Red | Modifier::Bold, "error"),
            ReportKind::Warning => highlight(Colour::Yellow | Modifier::Bold, "warn"),
            ReportKind::Info => highlight(Colour::Blue | Modifier::Bold, "info"),
            ReportKind::Internal => highlight(Colour::Red | Modifier::Bold, "internal"),
        };

        write!(f, "{label}")
    }
}

/// An additional note that is attached to a [Report].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNote {
    /// The kind of the note, e.g. `note` or `help`.
    pub label: String,

    /// The content of the note.
    pub message: String,
}

/// A single diagnostic, built through the fluent setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The severity of the report.
    pub kind: ReportKind,

    /// The headline of the report.
    pub title: String,

    /// Notes printed beneath the title.
    pub notes: Vec<ReportNote>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    /// Create an empty error [Report].
    pub fn new() -> Self {
        Self { kind: ReportKind::Error, title: String::new(), notes: Vec::new() }
    }

    /// Set the [ReportKind] of the report.
    pub fn kind(&mut self, kind: ReportKind) -> &mut Self {
        self.kind = kind;
        self
    }

    /// Set the title of the report.
    pub fn title(&mut self, title: impl ToString) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Attach a `note` to the report.
    pub fn add_note(&mut self, message: impl ToString) -> &mut Self {
        self.notes.push(ReportNote { label: "note".to_string(), message: message.to_string() });
        self
    }

    /// Attach a `help` message to the report.
    pub fn add_help(&mut self, message: impl ToString) -> &mut Self {
        self.notes.push(ReportNote { label: "help".to_string(), message: message.to_string() });
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.title)?;

        for note in &self.notes {
            write!(f, "\n  = {}: {}", note.label, note.message)?;
        }

        Ok(())
    }
}
