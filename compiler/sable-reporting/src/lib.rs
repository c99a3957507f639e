//! Sable compiler diagnostic reporting. Reports are collected by a
//! [reporter::Reporter] and rendered once the caller decides to emit them.
pub mod report;
pub mod reporter;
