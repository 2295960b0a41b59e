//! Core copy engine module
//!
//! Worker-count policies, partition planning, and the fork-join copier
//! that ties them together.

mod copier;
mod partition;
mod policy;

pub use copier::*;
pub use partition::*;
pub use policy::*;

/// Element type copied by HyperCopy
pub type Element = i64;
