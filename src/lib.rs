//! # HyperCopy - Parallel Range Copy for Integer Buffers
//!
//! HyperCopy copies a contiguous block of 64-bit integers from one buffer to
//! another by splitting the range into partitions and copying each partition
//! on its own worker. It backs a native entry point for managed array APIs
//! and is also usable directly from Rust.
//!
//! ## Features
//!
//! - **Fork-join copying**: One worker per partition, joined before return
//! - **Pluggable worker policies**: Logarithmic (default), fixed, hardware-aware
//! - **Exact coverage**: The remainder always lands in the last partition,
//!   with a legacy mode that applies the old parity rule (and, together with
//!   the legacy-logarithmic strategy, the old worker count)
//! - **Disjoint writes**: Workers own non-overlapping destination slices
//! - **Integrity Verification**: XXHash3 digest of the copied range
//! - **Native entry point**: `hyper_iterator_cpy_UNMANAGED` in the cdylib
//!
//! ## Quick Start
//!
//! ```
//! use hypercopy::core::copy_range;
//!
//! let src: Vec<i64> = (1..=10).collect();
//! let mut dst = vec![0i64; 10];
//!
//! let report = copy_range(&src, 0, &mut dst, 0, 10).unwrap();
//! assert_eq!(dst, src);
//! assert_eq!(report.workers, 4);
//! ```
//!
//! ## Advanced Usage
//!
//! ```
//! use hypercopy::config::{CopierConfig, ExecutionBackend, RemainderPolicy};
//! use hypercopy::core::{FixedPolicy, ParallelCopier};
//!
//! let config = CopierConfig {
//!     backend: ExecutionBackend::Rayon,
//!     remainder: RemainderPolicy::FoldIntoLast,
//!     verify: true,
//!     ..Default::default()
//! };
//!
//! let copier = ParallelCopier::new(config).with_policy(FixedPolicy::new(4, 50));
//!
//! let src: Vec<i64> = (0..1_000).collect();
//! let mut dst = vec![0i64; 1_000];
//! let report = copier.copy(&src, 0, &mut dst, 0, 1_000).unwrap();
//! assert!(report.digest.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ffi;
pub mod hash;
pub mod logging;

// Re-export commonly used types
pub use crate::config::{CopierConfig, ExecutionBackend, RemainderPolicy, WriteSync};
pub use crate::core::{copy_range, CopyReport, Element, ParallelCopier, PartitionPlan};
pub use crate::error::{CopyError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```
    //! use hypercopy::prelude::*;
    //! ```

    pub use crate::config::{
        CopierConfig, ExecutionBackend, RemainderPolicy, SourceIndexMode, WorkerStrategy,
        WriteSync,
    };
    pub use crate::core::{
        copy_range, CopyReport, Element, FixedPolicy, HardwarePolicy, LegacyLogarithmicPolicy,
        LogarithmicPolicy, ParallelCopier, Partition, PartitionPlan, WorkerPolicy,
    };
    pub use crate::error::{CopyError, Result};
    pub use crate::hash::{digest_elements, verify_ranges, RangeDigest};
}
