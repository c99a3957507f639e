//! Errors that are raised when lowering function types.

use derive_more::{Display, Error};

/// An error that the caller must treat as fatal. Internal invariant
/// violations of the lowering are not represented here, they abort through
/// the crash handler instead.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum AbiError {
    /// An Objective-C message dispatch was requested on a target which has
    /// no Objective-C runtime convention.
    #[display("Objective-C message dispatch is not supported on target `{target}`")]
    UnsupportedObjcAbi { target: String },
}
