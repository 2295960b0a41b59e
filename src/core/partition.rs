//! Partition planning
//!
//! Splits the logical copy range `[0, len)` into one contiguous partition per
//! worker. Partitions are assigned in increasing offset order with no gaps,
//! so the destination can be split into disjoint mutable slices by walking
//! the plan front to back.

use crate::config::RemainderPolicy;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous sub-range of the logical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Worker index
    pub index: usize,
    /// Offset within the logical copy
    pub offset: usize,
    /// Number of elements
    pub count: usize,
}

impl Partition {
    /// End offset (exclusive)
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    /// Range within the logical copy
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Ordered partitions for one copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    /// Requested element count
    pub len: usize,
    /// Effective worker count (one partition per worker)
    pub workers: usize,
    /// Remainder policy used to size the last partition
    pub remainder: RemainderPolicy,
    /// Partitions in increasing offset order
    pub partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Plan `len` elements across `workers` workers.
    ///
    /// The worker count is clamped to `[1, len]` (1 when `len` is 0) so
    /// every worker but the last receives at least one element.
    pub fn new(len: usize, workers: usize, remainder: RemainderPolicy) -> Self {
        let workers = if len == 0 { 1 } else { workers.clamp(1, len) };
        let base = len / workers;

        let last_absorbs = match remainder {
            RemainderPolicy::FoldIntoLast => true,
            // base >= 1 here whenever len > 0
            RemainderPolicy::Legacy => len % 2 == 0 && base > 0 && (len / base) % 2 == 1,
        };

        let mut partitions = Vec::with_capacity(workers);
        let mut offset = 0;

        for index in 0..workers {
            let count = if index == workers - 1 && last_absorbs {
                len - offset
            } else {
                base
            };

            partitions.push(Partition { index, offset, count });
            offset += count;
        }

        Self {
            len,
            workers,
            remainder,
            partitions,
        }
    }

    /// Elements assigned to some partition
    pub fn covered(&self) -> usize {
        self.partitions.iter().map(|p| p.count).sum()
    }

    /// Tail elements no partition copies
    pub fn uncovered(&self) -> usize {
        self.len - self.covered()
    }

    /// Check whether the partitions cover `[0, len)` exactly
    pub fn is_complete(&self) -> bool {
        self.uncovered() == 0
    }

    /// Iterate over partitions
    pub fn iter(&self) -> std::slice::Iter<'_, Partition> {
        self.partitions.iter()
    }

    /// Print plan summary
    pub fn print_summary(&self) {
        println!("Partition Plan:");
        println!("  Elements:  {}", self.len);
        println!("  Workers:   {}", self.workers);
        println!("  Remainder: {:?}", self.remainder);
        for p in &self.partitions {
            println!("  [{:>2}] offset {:>12}  count {:>12}", p.index, p.offset, p.count);
        }
        if !self.is_complete() {
            println!(
                "  Uncovered: {} elements at offset {}",
                self.uncovered(),
                self.covered()
            );
        }
    }
}

impl<'a> IntoIterator for &'a PartitionPlan {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
