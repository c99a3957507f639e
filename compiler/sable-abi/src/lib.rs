//! Lowering of source-level function types into the calling conventions of
//! the native targets. A [TargetAbi] policy decides how every parameter and
//! the return value of a function is passed, producing an [FnAbi] which the
//! code generator follows when emitting definitions and calls.
//!
//! [TargetAbi]: crate::targets::TargetAbi
//! [FnAbi]: crate::fn_abi::FnAbi

pub mod builder;
pub mod classify;
pub mod cx;
pub mod error;
pub mod flatten;
pub mod fn_abi;
pub mod generic;
pub mod lower;
pub mod policy;
pub mod rewrite;
pub mod targets;
pub mod ty;
