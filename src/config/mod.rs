//! Configuration module for HyperCopy
//!
//! Copier options and their sources: JSON config files, `HYPERCOPY_*`
//! environment variables and CLI arguments.

mod settings;

pub use settings::*;
