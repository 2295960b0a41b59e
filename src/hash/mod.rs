//! Integrity verification module
//!
//! XXHash3 digests of element ranges, used to check a copy after the join.

mod integrity;

pub use integrity::*;
