//! Worker-count policies
//!
//! A policy maps a copy length to the number of workers that copy it. It is
//! kept apart from partitioning and copying so it can be swapped without
//! touching either.

use crate::config::{CopierConfig, WorkerStrategy, DEFAULT_MAX_WORKERS};
use std::fmt::Debug;

/// Smallest worker count any policy returns
pub const MIN_WORKERS: usize = 1;

/// Strategy function `len -> worker_count`
pub trait WorkerPolicy: Debug + Send + Sync {
    /// Number of workers for a copy of `len` elements, in `[1, cap]`
    fn worker_count(&self, len: usize) -> usize;

    /// Short name used in logs and reports
    fn name(&self) -> &'static str;
}

/// Clamp a raw worker count into `[MIN_WORKERS, cap]`
pub fn clamp_workers(raw: usize, cap: usize) -> usize {
    raw.clamp(MIN_WORKERS, cap.max(MIN_WORKERS))
}

/// `floor(ln(len) * 2)`, clamped to `[1, cap]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogarithmicPolicy {
    cap: usize,
}

impl LogarithmicPolicy {
    /// Create a policy with the given cap
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }
}

impl Default for LogarithmicPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl WorkerPolicy for LogarithmicPolicy {
    fn worker_count(&self, len: usize) -> usize {
        // ln(0) is -inf and ln(1) is 0; both land on the minimum
        if len <= 1 {
            return MIN_WORKERS;
        }
        let raw = ((len as f64).ln() * 2.0).floor() as usize;
        clamp_workers(raw, self.cap)
    }

    fn name(&self) -> &'static str {
        "logarithmic"
    }
}

/// `floor(ln(len)) * 2`, clamped to `[1, cap]`
///
/// Truncates the logarithm before doubling, so counts are always even.
/// Paired with [`RemainderPolicy::Legacy`](crate::config::RemainderPolicy)
/// it plans exactly what the old native library did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyLogarithmicPolicy {
    cap: usize,
}

impl LegacyLogarithmicPolicy {
    /// Create a policy with the given cap
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }
}

impl Default for LegacyLogarithmicPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl WorkerPolicy for LegacyLogarithmicPolicy {
    fn worker_count(&self, len: usize) -> usize {
        if len <= 1 {
            return MIN_WORKERS;
        }
        let raw = (len as f64).ln().floor() as usize * 2;
        clamp_workers(raw, self.cap)
    }

    fn name(&self) -> &'static str {
        "legacy-logarithmic"
    }
}

/// Always the same worker count, clamped to `[1, cap]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPolicy {
    workers: usize,
    cap: usize,
}

impl FixedPolicy {
    /// Create a policy that always returns `workers`
    pub fn new(workers: usize, cap: usize) -> Self {
        Self { workers, cap }
    }
}

impl WorkerPolicy for FixedPolicy {
    fn worker_count(&self, _len: usize) -> usize {
        clamp_workers(self.workers, self.cap)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Available CPUs, but never less than `min_partition` elements per worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwarePolicy {
    cpus: usize,
    min_partition: usize,
    cap: usize,
}

impl HardwarePolicy {
    /// Create a policy sized to the CPUs of this machine
    pub fn new(min_partition: usize, cap: usize) -> Self {
        Self::with_cpus(num_cpus::get(), min_partition, cap)
    }

    /// Create a policy for an explicit CPU count
    pub fn with_cpus(cpus: usize, min_partition: usize, cap: usize) -> Self {
        Self {
            cpus,
            min_partition: min_partition.max(1),
            cap,
        }
    }
}

impl WorkerPolicy for HardwarePolicy {
    fn worker_count(&self, len: usize) -> usize {
        let by_size = len / self.min_partition;
        clamp_workers(self.cpus.min(by_size), self.cap)
    }

    fn name(&self) -> &'static str {
        "hardware"
    }
}

/// Build the policy selected by a config
pub fn policy_from_config(config: &CopierConfig) -> Box<dyn WorkerPolicy> {
    match config.strategy {
        WorkerStrategy::Logarithmic => Box::new(LogarithmicPolicy::new(config.max_workers)),
        WorkerStrategy::LegacyLogarithmic => {
            Box::new(LegacyLogarithmicPolicy::new(config.max_workers))
        }
        WorkerStrategy::Fixed => {
            Box::new(FixedPolicy::new(config.fixed_workers(), config.max_workers))
        }
        WorkerStrategy::Hardware => {
            Box::new(HardwarePolicy::new(config.min_partition, config.max_workers))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_logarithmic_small_lengths() {
        let policy = LogarithmicPolicy::default();
        assert_eq!(policy.worker_count(0), 1);
        assert_eq!(policy.worker_count(1), 1);
        // 2 * ln(2) = 1.38
        assert_eq!(policy.worker_count(2), 1);
        // 2 * ln(10) = 4.60
        assert_eq!(policy.worker_count(10), 4);
        // 2 * ln(11) = 4.79
        assert_eq!(policy.worker_count(11), 4);
    }

    #[test]
    fn test_logarithmic_large_lengths() {
        let policy = LogarithmicPolicy::default();
        // 2 * ln(1e7) = 32.2
        assert_eq!(policy.worker_count(10_000_000), 32);
        // 2 * ln(i32::MAX) = 42.9
        assert_eq!(policy.worker_count(i32::MAX as usize), 42);
        // 2 * ln(1e12) = 55.3, over the cap
        assert_eq!(policy.worker_count(1_000_000_000_000), 50);
        assert_eq!(policy.worker_count(usize::MAX), 50);
    }

    #[test]
    fn test_logarithmic_custom_cap() {
        let policy = LogarithmicPolicy::new(8);
        assert_eq!(policy.worker_count(10_000_000), 8);
        assert_eq!(policy.worker_count(10), 4);
    }

    #[test]
    fn test_legacy_logarithmic_truncates_first() {
        let policy = LegacyLogarithmicPolicy::default();
        assert_eq!(policy.worker_count(0), 1);
        // ln(2) = 0.69 truncates to 0
        assert_eq!(policy.worker_count(2), 1);
        // ln(10) = 2.30
        assert_eq!(policy.worker_count(10), 4);
        // ln(100) = 4.60, where floor(2 ln) would give 9
        assert_eq!(policy.worker_count(100), 8);
        assert_eq!(LogarithmicPolicy::default().worker_count(100), 9);
        // ln(1e7) = 16.1
        assert_eq!(policy.worker_count(10_000_000), 32);
        assert_eq!(policy.worker_count(usize::MAX), 50);
    }

    #[test]
    fn test_legacy_plan_drops_tail() {
        use crate::config::RemainderPolicy;
        use crate::core::PartitionPlan;

        let workers = LegacyLogarithmicPolicy::default().worker_count(100);
        let plan = PartitionPlan::new(100, workers, RemainderPolicy::Legacy);
        // base 12; 100 / 12 = 8 is even, so the last worker keeps 12
        assert_eq!(plan.workers, 8);
        assert_eq!(plan.covered(), 96);
        assert_eq!(plan.uncovered(), 4);
    }

    #[test]
    fn test_fixed_policy() {
        assert_eq!(FixedPolicy::new(6, 50).worker_count(3), 6);
        assert_eq!(FixedPolicy::new(0, 50).worker_count(100), 1);
        assert_eq!(FixedPolicy::new(80, 50).worker_count(100), 50);
    }

    #[test]
    fn test_hardware_policy() {
        let policy = HardwarePolicy::with_cpus(8, 1000, 50);
        assert_eq!(policy.worker_count(0), 1);
        assert_eq!(policy.worker_count(2_500), 2);
        assert_eq!(policy.worker_count(1_000_000), 8);

        let capped = HardwarePolicy::with_cpus(128, 1, 50);
        assert_eq!(capped.worker_count(1_000_000), 50);
    }

    #[test]
    fn test_policy_from_config() {
        let config = CopierConfig {
            strategy: WorkerStrategy::Fixed,
            workers: 3,
            ..Default::default()
        };
        let policy = policy_from_config(&config);
        assert_eq!(policy.name(), "fixed");
        assert_eq!(policy.worker_count(1_000), 3);

        let policy = policy_from_config(&CopierConfig::default());
        assert_eq!(policy.name(), "logarithmic");

        let config = CopierConfig {
            strategy: WorkerStrategy::LegacyLogarithmic,
            ..Default::default()
        };
        assert_eq!(policy_from_config(&config).name(), "legacy-logarithmic");
    }

    proptest! {
        #[test]
        fn prop_logarithmic_bounds(len in any::<usize>()) {
            let workers = LogarithmicPolicy::default().worker_count(len);
            prop_assert!((1..=50).contains(&workers));
        }

        #[test]
        fn prop_logarithmic_never_exceeds_len(len in 1usize..10_000_000) {
            prop_assert!(LogarithmicPolicy::default().worker_count(len) <= len);
        }
    }
}
