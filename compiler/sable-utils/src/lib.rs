//! Sable compiler general utilities.

pub mod crash;
pub mod highlight;
pub mod logging;
pub mod stream;

// Re-export commonly used collection packages
pub use dashmap;
pub use fxhash;
pub use index_vec;
pub use itertools;
// Re-export logging utility
pub use log;
pub use parking_lot;
pub use smallvec;
