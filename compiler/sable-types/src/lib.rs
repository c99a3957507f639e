//! The source-level type system that the calling-convention lowering
//! consumes. Types are interned in a [ctx::TyCtx] which is created once per
//! compilation target and is safe to share between threads.

pub mod arg_types;
pub mod ctx;
pub mod homogeneous;
pub mod sig;
pub mod structs;
pub mod ty;
