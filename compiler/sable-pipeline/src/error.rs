//! Defines the error type for the Sable pipeline. These errors can originate
//! from the parsing of compiler arguments, describing the target, or reading
//! the signature manifest that is to be lowered.

use std::{io, path::PathBuf};

use clap::error::ErrorKind;
use derive_more::From;
use sable_abi::error::AbiError;
use sable_reporting::report::{Report, ReportKind};
use sable_target::TargetError;

use crate::manifest::ManifestError;

/// Errors that might occur when running the pipeline.
#[derive(Debug, From)]
pub enum PipelineError {
    /// Some parsing error that clap emits, it could be benign.
    #[from]
    ParseError(clap::Error),

    /// The requested target could not be described.
    InvalidTarget(TargetError),

    /// The manifest could not be read from disk.
    ResourceRead {
        /// The item that was being read.
        path: PathBuf,

        /// The specific [io::Error] that occurred.
        error: io::Error,
    },

    /// The manifest is malformed.
    #[from]
    Manifest(ManifestError),

    /// The lowering cannot express a function of the manifest on the target.
    #[from]
    Abi(AbiError),

    /// When a configuration key value is not a valid option for the
    /// specified key.
    InvalidValue(String, String),

    /// A configuration key that does not exist.
    UnknownOption(String),
}

impl From<PipelineError> for Report {
    fn from(value: PipelineError) -> Self {
        let mut report = Report::new();

        match value {
            PipelineError::ParseError(error) => {
                match error.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        report.kind(ReportKind::Info);
                    }
                    _ => {
                        report.kind(ReportKind::Error);
                    }
                }

                report.title(error.to_string());
            }
            PipelineError::InvalidTarget(error) => {
                report.kind(ReportKind::Error).title(error.to_string());
            }
            PipelineError::ResourceRead { path, error } => {
                let message = error.raw_os_error().map_or_else(
                    || format!("couldn't read `{}`, {}", path.to_string_lossy(), error.kind()),
                    |code| {
                        format!(
                            "couldn't read `{}`, {} (code: {code})",
                            path.to_string_lossy(),
                            error.kind()
                        )
                    },
                );

                report.kind(ReportKind::Error).title(message);
            }
            PipelineError::Manifest(error) => {
                report.kind(ReportKind::Error).title(error.to_string());

                if let ManifestError::UnknownType { .. } = error {
                    report.add_help("structs must be declared before they are used");
                }
            }
            PipelineError::Abi(error) => {
                report.kind(ReportKind::Error).title(error.to_string());
            }
            PipelineError::InvalidValue(key, value) => {
                report
                    .kind(ReportKind::Error)
                    .title(format!("invalid value `{value}` for configuration key `{key}`"));
            }
            PipelineError::UnknownOption(key) => {
                report.kind(ReportKind::Error).title(format!("unknown configuration key `{key}`"));
            }
        };

        report
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn configuration_errors_become_error_reports() {
        let report = Report::from(PipelineError::InvalidValue("dump-abi".into(), "2".into()));

        assert_eq!(report.kind, ReportKind::Error);
        assert_eq!(report.title, "invalid value `2` for configuration key `dump-abi`");
    }

    #[test]
    fn unknown_types_carry_a_hint() {
        let error = ManifestError::UnknownType { name: "Vec3".to_string() };
        let report = Report::from(PipelineError::from(error));

        assert_eq!(report.title, "unknown type `Vec3`");
        assert_eq!(report.notes.len(), 1);
    }
}
