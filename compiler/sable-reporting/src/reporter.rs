//! A diagnostic reporter for the Sable compiler.
//!
//! Has a fluent API for creating reports in a declarative way.
use crate::report::{Report, ReportKind};

pub type Reports = Vec<Report>;

/// Facilitates the creation of lists of [Report]s in a declarative way.
#[derive(Debug, Default)]
pub struct Reporter {
    reports: Vec<Report>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report of the given kind, returning it for further building.
    pub fn report(&mut self, kind: ReportKind) -> &mut Report {
        let mut report = Report::new();
        report.kind(kind);

        let index = self.reports.len();
        self.reports.push(report);
        &mut self.reports[index]
    }

    /// Add an error report to the builder.
    pub fn error(&mut self) -> &mut Report {
        self.report(ReportKind::Error)
    }

    /// Add an info report to the builder.
    pub fn info(&mut self) -> &mut Report {
        self.report(ReportKind::Info)
    }

    /// Add a warning report to the builder.
    pub fn warning(&mut self) -> &mut Report {
        self.report(ReportKind::Warning)
    }

    /// Add an internal report to the builder.
    pub fn internal(&mut self) -> &mut Report {
        self.report(ReportKind::Internal)
    }

    /// Append already constructed reports.
    pub fn extend(&mut self, reports: impl IntoIterator<Item = Report>) {
        self.reports.extend(reports);
    }

    /// Check whether any fatal reports have been made.
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|report| report.kind.is_fatal())
    }

    /// Count the reports of a particular [ReportKind].
    pub fn count(&self, kind: ReportKind) -> usize {
        self.reports.iter().filter(|report| report.kind == kind).count()
    }

    /// Get the reports made so far.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Consume the [`Reporter`], producing a [`Vec<Report>`].
    pub fn into_reports(self) -> Reports {
        self.reports
    }
}
