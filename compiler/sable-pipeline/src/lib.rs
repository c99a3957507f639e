//! The Sable compiler pipeline: the settings that a compilation is configured
//! with, the signature manifests that describe what to lower and the driver
//! that runs the lowering for a target.

pub mod driver;
pub mod error;
pub mod manifest;
pub mod settings;
