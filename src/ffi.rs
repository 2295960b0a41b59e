//! Native entry points
//!
//! Exported unmangled with the platform "system" calling convention
//! (stdcall on 32-bit Windows, C elsewhere) for hosts that load the cdylib
//! through a platform-invoke layer. No error or panic crosses the boundary:
//! failures are logged and the call returns.

use crate::config::CopierConfig;
use crate::core::{CopyReport, Element, ParallelCopier};
use crate::error::{CopyError, Result};
use std::ffi::{c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

/// Environment variable holding the native library's log filter
pub const LOG_ENV: &str = "HYPERCOPY_LOG";

static NATIVE_COPIER: OnceLock<ParallelCopier> = OnceLock::new();

/// Process-wide copier configured from `HYPERCOPY_*` on first use
fn native_copier() -> &'static ParallelCopier {
    NATIVE_COPIER.get_or_init(|| {
        let config = CopierConfig::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring invalid HYPERCOPY_* settings");
            CopierConfig::default()
        });
        ParallelCopier::new(config)
    })
}

fn to_index(name: &str, value: c_int) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        CopyError::InvalidArgument(format!("{} must be non-negative, got {}", name, value))
    })
}

fn check_handle(name: &'static str, ptr: *const c_void) -> Result<()> {
    if ptr.is_null() {
        return Err(CopyError::NullPointer(name));
    }
    if (ptr as usize) % std::mem::align_of::<Element>() != 0 {
        return Err(CopyError::InvalidArgument(format!(
            "{} pointer {:p} is not aligned for 64-bit elements",
            name, ptr
        )));
    }
    Ok(())
}

/// Validate native arguments, form slices over exactly the copied ranges
/// and copy.
///
/// Only `[effective_src_idx, +len)` of `src` and `[dst_idx, +len)` of `dst`
/// are borrowed, so both ranges may lie in the same caller array as long as
/// they do not overlap each other.
///
/// # Safety
///
/// For non-negative arguments, `src` must be valid for reads of
/// `effective_src_idx + len` elements and `dst` valid for writes of
/// `dst_idx + len` elements, and the two copied ranges must not overlap.
unsafe fn copy_native(
    copier: &ParallelCopier,
    src: *const c_void,
    src_idx: c_int,
    dst: *mut c_void,
    dst_idx: c_int,
    len: c_int,
) -> Result<CopyReport> {
    let src_idx = to_index("src_idx", src_idx)?;
    let dst_idx = to_index("dst_idx", dst_idx)?;
    let len = to_index("len", len)?;

    if len == 0 {
        return copier.copy(&[], 0, &mut [], 0, 0);
    }

    check_handle("source", src)?;
    check_handle("destination", dst as *const c_void)?;

    let src_start = copier.config().source_index.effective(src_idx);

    // Elements before each start index belong to the caller and stay unborrowed
    let src = std::slice::from_raw_parts((src as *const Element).add(src_start), len);
    let dst = std::slice::from_raw_parts_mut((dst as *mut Element).add(dst_idx), len);

    copier.copy(src, 0, dst, 0, len)
}

/// Copy `len` 64-bit integers from `src[src_idx..]` to `dst[dst_idx..]` in
/// parallel.
///
/// # Safety
///
/// `src` must point to at least `src_idx + len` readable `i64` values (or
/// `len` values when the source index is ignored), `dst` to at least
/// `dst_idx + len` writable `i64` values, both 8-byte aligned. `src` and
/// `dst` may point into the same array when the source and destination
/// ranges do not overlap.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn hyper_iterator_cpy_UNMANAGED(
    src: *const c_void,
    src_idx: c_int,
    dst: *mut c_void,
    dst_idx: c_int,
    len: c_int,
) {
    let outcome = catch_unwind(AssertUnwindSafe(|| unsafe {
        copy_native(native_copier(), src, src_idx, dst, dst_idx, len)
    }));

    match outcome {
        Ok(Ok(report)) => tracing::debug!(
            elements = report.elements_copied,
            workers = report.workers,
            "native copy complete"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, src_idx, dst_idx, len, "native copy failed"),
        Err(_) => tracing::error!(src_idx, dst_idx, len, "native copy panicked"),
    }
}

/// Install a log subscriber filtered by `HYPERCOPY_LOG` (default `warn`).
///
/// Set `HYPERCOPY_LOG_FORMAT=json` for JSON lines. Returns 1 if the
/// subscriber was installed, 0 if one was already present.
#[no_mangle]
pub extern "system" fn hyper_iterator_init_logging() -> c_int {
    let json = std::env::var("HYPERCOPY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = crate::logging::filter_from_env(LOG_ENV, "warn");

    c_int::from(crate::logging::init(filter, json))
}
