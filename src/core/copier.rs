//! Parallel range copier
//!
//! Fork-join copy of an element range: plan one partition per worker,
//! snapshot each partition of the source on the calling thread, launch one
//! worker per partition, and join them all before returning.
//!
//! Destination slices handed to workers are split from the destination range
//! front to back along the plan, so no two workers can reach the same
//! element. The `Serialized` write mode adds a per-call lock on top of that
//! for callers that depend on writes never overlapping in time.

use crate::config::{CopierConfig, ExecutionBackend, WriteSync};
use crate::core::{policy_from_config, Element, Partition, PartitionPlan, WorkerPolicy};
use crate::error::{CopyError, Result};
use crate::hash::{verify_ranges, RangeDigest};
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Copy operation result
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    /// Elements the caller asked for
    pub elements_requested: usize,
    /// Elements written to the destination
    pub elements_copied: usize,
    /// Tail elements left uncopied by the legacy remainder policy
    pub elements_skipped: usize,
    /// Workers launched
    pub workers: usize,
    /// Worker policy name
    pub policy: &'static str,
    /// Execution backend
    pub backend: ExecutionBackend,
    /// Write synchronization
    pub write_sync: WriteSync,
    /// Partitions, relative to the start of the copied range
    pub partitions: Vec<Partition>,
    /// Wall-clock duration
    pub duration: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
    /// Digest of the copied range (if verification enabled)
    pub digest: Option<RangeDigest>,
}

impl CopyReport {
    /// Check if every requested element was copied
    pub fn is_complete(&self) -> bool {
        self.elements_skipped == 0
    }

    /// Bytes written to the destination
    pub fn bytes_copied(&self) -> u64 {
        (self.elements_copied * std::mem::size_of::<Element>()) as u64
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Copy Summary ===");
        println!("Elements copied: {} of {}", self.elements_copied, self.elements_requested);
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied(), humansize::BINARY));
        println!("Workers:         {} ({}, {})", self.workers, self.policy, self.backend.name());
        println!("Write sync:      {:?}", self.write_sync);
        println!("Duration:        {}", humantime::format_duration(self.duration));
        println!("Throughput:      {}/s", humansize::format_size(self.throughput as u64, humansize::BINARY));

        if self.elements_skipped > 0 {
            println!("\nSkipped: {} tail elements (legacy remainder policy)", self.elements_skipped);
        }

        if let Some(digest) = &self.digest {
            println!("\nVerification:");
            println!("  XXHash3:   {}", digest);
        }
    }
}

/// Source side of one worker: a private snapshot or a shared borrow
enum PartitionInput<'a> {
    Snapshot(Vec<Element>),
    Borrowed(&'a [Element]),
}

impl PartitionInput<'_> {
    fn as_slice(&self) -> &[Element] {
        match self {
            Self::Snapshot(buffer) => buffer,
            Self::Borrowed(slice) => slice,
        }
    }
}

/// One worker's share of the copy
struct WorkerJob<'a> {
    partition: Partition,
    input: PartitionInput<'a>,
    output: &'a mut [Element],
}

impl WorkerJob<'_> {
    /// Write phase; returns the number of elements written
    fn run(self, lock: Option<&Mutex<()>>) -> usize {
        let _guard = lock.map(|m| m.lock().unwrap_or_else(PoisonError::into_inner));

        self.output.copy_from_slice(self.input.as_slice());

        tracing::trace!(
            worker = self.partition.index,
            offset = self.partition.offset,
            count = self.partition.count,
            "partition written"
        );
        self.partition.count
    }
}

/// Parallel range copier
pub struct ParallelCopier {
    /// Configuration
    config: CopierConfig,
    /// Worker-count policy
    policy: Box<dyn WorkerPolicy>,
}

impl ParallelCopier {
    /// Create a copier with the policy selected by `config`
    pub fn new(config: CopierConfig) -> Self {
        let policy = policy_from_config(&config);
        Self { config, policy }
    }

    /// Replace the worker policy
    pub fn with_policy(mut self, policy: impl WorkerPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &CopierConfig {
        &self.config
    }

    /// Get the worker policy
    pub fn policy(&self) -> &dyn WorkerPolicy {
        self.policy.as_ref()
    }

    /// Partition plan for a copy of `len` elements
    pub fn plan(&self, len: usize) -> PartitionPlan {
        PartitionPlan::new(len, self.policy.worker_count(len), self.config.remainder)
    }

    /// Copy `len` elements from `src[src_idx..]` into `dst[dst_idx..]`.
    ///
    /// With [`crate::config::SourceIndexMode::Ignore`] the source index is
    /// accepted but reads start at `src[0]`.
    pub fn copy(
        &self,
        src: &[Element],
        src_idx: usize,
        dst: &mut [Element],
        dst_idx: usize,
        len: usize,
    ) -> Result<CopyReport> {
        let start_time = Instant::now();
        let src_idx = self.config.source_index.effective(src_idx);

        let src_end = src_idx
            .checked_add(len)
            .ok_or(CopyError::RangeOverflow { index: src_idx, len })?;
        if src_end > src.len() {
            return Err(CopyError::SourceOutOfBounds {
                index: src_idx,
                len,
                available: src.len(),
            });
        }

        let dst_end = dst_idx
            .checked_add(len)
            .ok_or(CopyError::RangeOverflow { index: dst_idx, len })?;
        if dst_end > dst.len() {
            return Err(CopyError::DestinationOutOfBounds {
                index: dst_idx,
                len,
                available: dst.len(),
            });
        }

        let plan = self.plan(len);
        let source = &src[src_idx..src_end];
        let target = &mut dst[dst_idx..dst_end];

        tracing::debug!(
            len,
            workers = plan.workers,
            policy = self.policy.name(),
            backend = ?self.config.backend,
            write_sync = ?self.config.write_sync,
            "planned copy"
        );

        if plan.uncovered() > 0 {
            tracing::warn!(
                len,
                uncovered = plan.uncovered(),
                "legacy remainder policy leaves tail elements uncopied"
            );
        }

        let elements_copied = if len == 0 {
            0
        } else {
            let lock = match self.config.write_sync {
                WriteSync::Serialized => Some(Mutex::new(())),
                WriteSync::Disjoint => None,
            };
            let jobs = self.prepare_jobs(&plan, source, &mut *target);

            match self.config.backend {
                ExecutionBackend::Threads => run_scoped(jobs, lock.as_ref())?,
                ExecutionBackend::Rayon => run_pool(jobs, plan.workers, lock.as_ref())?,
            }
        };

        let digest = if self.config.verify {
            let covered = plan.covered();
            Some(verify_ranges(&source[..covered], &target[..covered])?)
        } else {
            None
        };

        let duration = start_time.elapsed();
        let bytes = elements_copied * std::mem::size_of::<Element>();
        let throughput = if duration.is_zero() {
            0.0
        } else {
            bytes as f64 / duration.as_secs_f64()
        };

        tracing::debug!(elements_copied, ?duration, "copy finished");

        Ok(CopyReport {
            elements_requested: len,
            elements_copied,
            elements_skipped: plan.uncovered(),
            workers: plan.workers,
            policy: self.policy.name(),
            backend: self.config.backend,
            write_sync: self.config.write_sync,
            partitions: plan.partitions,
            duration,
            throughput,
            digest,
        })
    }

    /// Snapshot phase: pair each partition with its source data and its
    /// exclusive destination slice
    fn prepare_jobs<'a>(
        &self,
        plan: &PartitionPlan,
        source: &'a [Element],
        mut target: &'a mut [Element],
    ) -> Vec<WorkerJob<'a>> {
        let mut jobs = Vec::with_capacity(plan.partitions.len());

        for partition in plan {
            let (output, rest) = std::mem::take(&mut target).split_at_mut(partition.count);
            target = rest;

            let slice = &source[partition.range()];
            let input = if self.config.snapshot {
                PartitionInput::Snapshot(slice.to_vec())
            } else {
                PartitionInput::Borrowed(slice)
            };

            jobs.push(WorkerJob {
                partition: *partition,
                input,
                output,
            });
        }

        jobs
    }
}

impl Default for ParallelCopier {
    fn default() -> Self {
        Self::new(CopierConfig::default())
    }
}

/// One scoped OS thread per job, all joined before returning
fn run_scoped(jobs: Vec<WorkerJob<'_>>, lock: Option<&Mutex<()>>) -> Result<usize> {
    crossbeam::scope(|scope| {
        let mut handles = Vec::with_capacity(jobs.len());
        let mut spawn_error = None;

        for job in jobs {
            let worker = job.partition.index;
            let spawned = scope
                .builder()
                .name(format!("hypercopy-{}", worker))
                .spawn(move |_| job.run(lock));

            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(e) => {
                    spawn_error = Some(CopyError::ThreadPoolError(format!(
                        "failed to spawn worker {}: {}",
                        worker, e
                    )));
                    break;
                }
            }
        }

        let mut copied = 0;
        let mut panicked = None;

        for (worker, handle) in handles {
            match handle.join() {
                Ok(count) => copied += count,
                Err(_) => {
                    tracing::error!(worker, "worker panicked");
                    panicked.get_or_insert(CopyError::WorkerPanicked { worker });
                }
            }
        }

        match spawn_error.or(panicked) {
            Some(err) => Err(err),
            None => Ok(copied),
        }
    })
    .map_err(|_| CopyError::ThreadPoolError("scoped worker panicked".to_string()))?
}

/// Jobs on a rayon pool built for this call and sized to the worker count
fn run_pool(jobs: Vec<WorkerJob<'_>>, workers: usize, lock: Option<&Mutex<()>>) -> Result<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("hypercopy-pool-{}", i))
        .build()
        .map_err(|e| CopyError::ThreadPoolError(e.to_string()))?;

    let counts: Vec<usize> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                let worker = job.partition.index;
                catch_unwind(AssertUnwindSafe(|| job.run(lock)))
                    .map_err(|_| CopyError::WorkerPanicked { worker })
            })
            .collect::<Result<Vec<usize>>>()
    })?;

    Ok(counts.into_iter().sum())
}

/// Copy with default settings
pub fn copy_range(
    src: &[Element],
    src_idx: usize,
    dst: &mut [Element],
    dst_idx: usize,
    len: usize,
) -> Result<CopyReport> {
    ParallelCopier::default().copy(src, src_idx, dst, dst_idx, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RemainderPolicy, SourceIndexMode};
    use crate::core::FixedPolicy;
    use proptest::prelude::*;

    fn all_modes() -> Vec<CopierConfig> {
        let mut configs = Vec::new();
        for backend in [ExecutionBackend::Threads, ExecutionBackend::Rayon] {
            for write_sync in [WriteSync::Disjoint, WriteSync::Serialized] {
                for snapshot in [true, false] {
                    configs.push(CopierConfig {
                        backend,
                        write_sync,
                        snapshot,
                        ..Default::default()
                    });
                }
            }
        }
        configs
    }

    #[test]
    fn test_copy_ten_elements() {
        let src: Vec<Element> = (1..=10).collect();

        for config in all_modes() {
            let mut dst = vec![0; 10];
            let report = ParallelCopier::new(config.clone())
                .copy(&src, 0, &mut dst, 0, 10)
                .unwrap();

            assert_eq!(dst, src, "mode {:?}", config);
            assert_eq!(report.workers, 4);
            assert_eq!(report.elements_copied, 10);
            assert!(report.is_complete());
        }
    }

    #[test]
    fn test_zero_length_is_noop() {
        let src: Vec<Element> = (1..=10).collect();
        let mut dst = vec![-7; 10];

        let report = copy_range(&src, 0, &mut dst, 0, 0).unwrap();

        assert_eq!(dst, vec![-7; 10]);
        assert_eq!(report.workers, 1);
        assert_eq!(report.elements_copied, 0);
        assert_eq!(report.bytes_copied(), 0);
    }

    #[test]
    fn test_single_element() {
        let src = vec![42];
        let mut dst = vec![0];

        let report = copy_range(&src, 0, &mut dst, 0, 1).unwrap();

        assert_eq!(dst, vec![42]);
        assert_eq!(report.workers, 1);
        assert_eq!(report.partitions.len(), 1);
    }

    #[test]
    fn test_offsets() {
        let src: Vec<Element> = (0..100).collect();
        let mut dst = vec![-1; 60];

        copy_range(&src, 30, &mut dst, 5, 50).unwrap();

        assert!(dst[..5].iter().all(|&v| v == -1));
        assert_eq!(&dst[5..55], &src[30..80]);
        assert!(dst[55..].iter().all(|&v| v == -1));
    }

    #[test]
    fn test_ignore_source_index() {
        let src: Vec<Element> = (0..20).collect();
        let mut dst = vec![0; 10];

        let config = CopierConfig {
            source_index: SourceIndexMode::Ignore,
            ..Default::default()
        };
        ParallelCopier::new(config)
            .copy(&src, 7, &mut dst, 0, 10)
            .unwrap();

        assert_eq!(&dst, &src[..10]);
    }

    #[test]
    fn test_legacy_tail_left_untouched() {
        let src: Vec<Element> = (1..=11).collect();
        let mut dst = vec![0; 11];

        let config = CopierConfig {
            remainder: RemainderPolicy::Legacy,
            ..Default::default()
        };
        let report = ParallelCopier::new(config)
            .copy(&src, 0, &mut dst, 0, 11)
            .unwrap();

        assert_eq!(report.elements_copied, 8);
        assert_eq!(report.elements_skipped, 3);
        assert!(!report.is_complete());
        assert_eq!(&dst[..8], &src[..8]);
        assert_eq!(&dst[8..], &[0, 0, 0]);
    }

    #[test]
    fn test_legacy_even_split_copies_everything() {
        let src: Vec<Element> = (1..=10).collect();
        let mut dst = vec![0; 10];

        let config = CopierConfig {
            remainder: RemainderPolicy::Legacy,
            ..Default::default()
        };
        let report = ParallelCopier::new(config)
            .copy(&src, 0, &mut dst, 0, 10)
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(dst, src);
    }

    #[test]
    fn test_bounds_errors() {
        let src = vec![1; 10];
        let mut dst = vec![0; 10];

        let err = copy_range(&src, 5, &mut dst, 0, 6).unwrap_err();
        assert!(matches!(err, CopyError::SourceOutOfBounds { available: 10, .. }));

        let err = copy_range(&src, 0, &mut dst, 8, 3).unwrap_err();
        assert!(matches!(err, CopyError::DestinationOutOfBounds { available: 10, .. }));

        let err = copy_range(&src, usize::MAX, &mut dst, 0, 2).unwrap_err();
        assert!(matches!(err, CopyError::RangeOverflow { .. }));
        assert!(err.is_caller_error());

        assert_eq!(dst, vec![0; 10]);
    }

    #[test]
    fn test_idempotent() {
        let src: Vec<Element> = (0..5_000).map(|i| i * 31 - 7).collect();
        let mut first = vec![0; 5_000];
        let mut second = vec![0; 5_000];

        let copier = ParallelCopier::default();
        copier.copy(&src, 0, &mut first, 0, 5_000).unwrap();
        copier.copy(&src, 0, &mut second, 0, 5_000).unwrap();
        copier.copy(&src, 0, &mut second, 0, 5_000).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_attaches_digest() {
        let src: Vec<Element> = (0..1_000).collect();
        let mut dst = vec![0; 1_000];

        let config = CopierConfig {
            verify: true,
            ..Default::default()
        };
        let report = ParallelCopier::new(config)
            .copy(&src, 0, &mut dst, 0, 1_000)
            .unwrap();

        let digest = report.digest.unwrap();
        assert_eq!(digest, crate::hash::digest_elements(&src));
    }

    #[test]
    fn test_custom_policy() {
        let src: Vec<Element> = (0..100).collect();
        let mut dst = vec![0; 100];

        let copier = ParallelCopier::default().with_policy(FixedPolicy::new(7, 50));
        let report = copier.copy(&src, 0, &mut dst, 0, 100).unwrap();

        assert_eq!(report.policy, "fixed");
        assert_eq!(report.workers, 7);
        assert_eq!(report.partitions.last().unwrap().count, 100 - 6 * 14);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_large_copy_partitions_land_in_place() {
        const LEN: usize = 10_000_000;
        let src: Vec<Element> = (0..LEN as Element).collect();
        let mut dst = vec![-1; LEN];

        let report = copy_range(&src, 0, &mut dst, 0, LEN).unwrap();

        assert_eq!(report.workers, 32);
        assert_eq!(report.partitions.len(), 32);

        let mut next = 0;
        for p in &report.partitions {
            assert_eq!(p.offset, next);
            assert_eq!(&dst[p.range()], &src[p.range()]);
            next = p.end();
        }
        assert_eq!(next, LEN);
        assert_eq!(report.elements_copied, LEN);
    }

    #[test]
    fn test_report_serializes() {
        let src: Vec<Element> = (0..64).collect();
        let mut dst = vec![0; 64];

        let report = copy_range(&src, 0, &mut dst, 0, 64).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["elements_copied"], 64);
        assert_eq!(json["backend"], "threads");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_copy_matches_sequential(
            len in 0usize..4_000,
            src_pad in 0usize..50,
            dst_pad in 0usize..50,
            workers in 1usize..20,
            rayon in any::<bool>(),
        ) {
            let src: Vec<Element> = (0..(len + src_pad) as Element).map(|i| i * 3 + 1).collect();
            let mut dst = vec![-5; len + dst_pad];
            let mut expected = dst.clone();
            expected[dst_pad..dst_pad + len].copy_from_slice(&src[src_pad..src_pad + len]);

            let config = CopierConfig {
                backend: if rayon { ExecutionBackend::Rayon } else { ExecutionBackend::Threads },
                ..Default::default()
            };
            let copier = ParallelCopier::new(config).with_policy(FixedPolicy::new(workers, 50));
            copier.copy(&src, src_pad, &mut dst, dst_pad, len).unwrap();

            prop_assert_eq!(dst, expected);
        }
    }
}
