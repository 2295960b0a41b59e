//! Configuration settings for HyperCopy
//!
//! Defines the copier options, the CLI arguments of the `hypercopy` tool,
//! and the layering of defaults, JSON config files, environment variables
//! and command-line flags.

use crate::error::{CopyError, IoResultExt, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default worker cap, shared by every worker policy
pub const DEFAULT_MAX_WORKERS: usize = 50;

/// Default minimum partition size for the hardware policy (elements)
pub const DEFAULT_MIN_PARTITION: usize = 4096;

/// HyperCopy - parallel range copier for 64-bit integer buffers
#[derive(Parser, Debug, Clone)]
#[command(name = "hypercopy")]
#[command(author = "HyperCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fork-join parallel copy of integer ranges")]
#[command(long_about = r#"
HyperCopy splits a bulk copy of 64-bit integers into contiguous partitions
and copies each partition on its own worker.

Examples:
  hypercopy plan 10M                          # Show worker count and partitions
  hypercopy plan 11 --remainder legacy        # Show the legacy tail gap
  hypercopy plan 100 --strategy legacy-logarithmic --remainder legacy
  hypercopy bench 10M --backend rayon --verify
  hypercopy config --config hypercopy.json    # Print the effective config
"#)]
pub struct CliArgs {
    /// Worker-count strategy
    #[arg(long, value_enum, global = true, value_name = "STRATEGY")]
    pub strategy: Option<WorkerStrategy>,

    /// Worker count for the fixed strategy (0 = number of CPUs)
    #[arg(short = 't', long, global = true, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Upper bound on the worker count
    #[arg(long, global = true, value_name = "NUM")]
    pub max_workers: Option<usize>,

    /// Minimum elements per worker for the hardware strategy (e.g., 4K)
    #[arg(long, global = true, value_name = "COUNT")]
    pub min_partition: Option<String>,

    /// What to do with elements left over by an uneven split
    #[arg(long, value_enum, global = true, value_name = "POLICY")]
    pub remainder: Option<RemainderPolicy>,

    /// Destination write synchronization
    #[arg(long, value_enum, global = true, value_name = "MODE")]
    pub write_sync: Option<WriteSync>,

    /// Worker execution backend
    #[arg(long, value_enum, global = true, value_name = "BACKEND")]
    pub backend: Option<ExecutionBackend>,

    /// Read the source directly instead of through per-worker snapshots
    #[arg(long, global = true)]
    pub no_snapshot: bool,

    /// How the source index is applied to reads
    #[arg(long, value_enum, global = true, value_name = "MODE")]
    pub source_index: Option<SourceIndexMode>,

    /// Verify the copied range with XXHash3
    #[arg(long, global = true)]
    pub verify: bool,

    /// JSON config file
    #[arg(short = 'c', long, global = true, env = "HYPERCOPY_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the worker count and partition plan for a copy length
    #[command(name = "plan")]
    Plan {
        /// Number of elements to copy (e.g., 10, 64K, 10M)
        len: String,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Copy a generated buffer repeatedly and report throughput
    #[command(name = "bench")]
    Benchmark {
        /// Number of elements to copy (e.g., 10, 64K, 10M)
        len: String,
        /// Number of copies to run
        #[arg(short = 'n', long, default_value = "5")]
        iterations: usize,
        /// Start index in the source buffer
        #[arg(long, default_value = "0")]
        src_offset: usize,
        /// Start index in the destination buffer
        #[arg(long, default_value = "0")]
        dst_offset: usize,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as JSON
    #[command(name = "config")]
    Config,
}

/// How the number of workers is derived from the copy length
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerStrategy {
    /// floor(ln(len) * 2), clamped to [1, max_workers]
    #[default]
    Logarithmic,
    /// floor(ln(len)) * 2, clamped to [1, max_workers], as the old native
    /// library computed it
    LegacyLogarithmic,
    /// A fixed worker count
    Fixed,
    /// Available CPUs, limited by a minimum partition size
    Hardware,
}

/// Handling of elements that do not divide evenly among workers
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RemainderPolicy {
    /// The last partition always absorbs the remainder
    #[default]
    FoldIntoLast,
    /// Parity rule of the old native library: the last partition absorbs
    /// the remainder only when len is even and len / base is odd; otherwise
    /// the tail is left uncopied. Combine with the legacy-logarithmic
    /// strategy to reproduce its plans exactly.
    Legacy,
}

/// Synchronization of destination writes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WriteSync {
    /// Each worker writes its own disjoint slice without locking
    #[default]
    Disjoint,
    /// Every write phase runs under one shared lock
    Serialized,
}

/// Where worker tasks run
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionBackend {
    /// One freshly spawned scoped thread per partition
    #[default]
    Threads,
    /// A rayon pool built for the call, sized to the worker count
    Rayon,
}

impl ExecutionBackend {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threads => "scoped threads",
            Self::Rayon => "rayon pool",
        }
    }
}

/// Whether the source start index is applied to reads
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SourceIndexMode {
    /// Read from src[src_idx ..]
    #[default]
    Apply,
    /// Accept src_idx but always read from src[0 ..]
    Ignore,
}

impl SourceIndexMode {
    /// Source index actually used for reads
    pub fn effective(&self, src_idx: usize) -> usize {
        match self {
            Self::Apply => src_idx,
            Self::Ignore => 0,
        }
    }
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration of a [`crate::core::ParallelCopier`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopierConfig {
    /// Worker-count strategy
    pub strategy: WorkerStrategy,
    /// Worker count for the fixed strategy (0 = number of CPUs)
    pub workers: usize,
    /// Upper bound on the worker count
    pub max_workers: usize,
    /// Minimum elements per worker for the hardware strategy
    pub min_partition: usize,
    /// Remainder handling
    pub remainder: RemainderPolicy,
    /// Destination write synchronization
    pub write_sync: WriteSync,
    /// Worker execution backend
    pub backend: ExecutionBackend,
    /// Copy each partition into a private buffer before launching its worker
    pub snapshot: bool,
    /// Source index handling
    pub source_index: SourceIndexMode,
    /// Verify the copied range after the join
    pub verify: bool,
}

impl Default for CopierConfig {
    fn default() -> Self {
        Self {
            strategy: WorkerStrategy::Logarithmic,
            workers: 0,
            max_workers: DEFAULT_MAX_WORKERS,
            min_partition: DEFAULT_MIN_PARTITION,
            remainder: RemainderPolicy::FoldIntoLast,
            write_sync: WriteSync::Disjoint,
            backend: ExecutionBackend::Threads,
            snapshot: true,
            source_index: SourceIndexMode::Apply,
            verify: false,
        }
    }
}

impl CopierConfig {
    /// Check option ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(CopyError::config("max_workers must be at least 1"));
        }
        if self.min_partition == 0 {
            return Err(CopyError::config("min_partition must be at least 1"));
        }
        Ok(())
    }

    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `HYPERCOPY_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `HYPERCOPY_*` variables from the given set; others are ignored
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let value = value.trim();
            match key.as_str() {
                "HYPERCOPY_STRATEGY" => self.strategy = parse_enum(&key, value)?,
                "HYPERCOPY_WORKERS" => self.workers = parse_env_count(&key, value)?,
                "HYPERCOPY_MAX_WORKERS" => self.max_workers = parse_env_count(&key, value)?,
                "HYPERCOPY_MIN_PARTITION" => self.min_partition = parse_env_count(&key, value)?,
                "HYPERCOPY_REMAINDER" => self.remainder = parse_enum(&key, value)?,
                "HYPERCOPY_WRITE_SYNC" => self.write_sync = parse_enum(&key, value)?,
                "HYPERCOPY_BACKEND" => self.backend = parse_enum(&key, value)?,
                "HYPERCOPY_SNAPSHOT" => self.snapshot = parse_bool(&key, value)?,
                "HYPERCOPY_SOURCE_INDEX" => self.source_index = parse_enum(&key, value)?,
                "HYPERCOPY_VERIFY" => self.verify = parse_bool(&key, value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Create config from CLI arguments: file, then environment, then flags
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        Self::from_cli_with_env(args, std::env::vars())
    }

    /// Like [`CopierConfig::from_cli`], with an explicit variable set in
    /// place of the process environment
    pub fn from_cli_with_env<I>(args: &CliArgs, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(vars)?;

        if let Some(strategy) = args.strategy {
            config.strategy = strategy;
        }
        if let Some(workers) = args.workers {
            config.workers = workers;
        }
        if let Some(max_workers) = args.max_workers {
            config.max_workers = max_workers;
        }
        if let Some(min_partition) = &args.min_partition {
            config.min_partition = parse_count(min_partition)
                .map_err(|e| CopyError::config(format!("Invalid min partition: {}", e)))?;
        }
        if let Some(remainder) = args.remainder {
            config.remainder = remainder;
        }
        if let Some(write_sync) = args.write_sync {
            config.write_sync = write_sync;
        }
        if let Some(backend) = args.backend {
            config.backend = backend;
        }
        if args.no_snapshot {
            config.snapshot = false;
        }
        if let Some(source_index) = args.source_index {
            config.source_index = source_index;
        }
        if args.verify {
            config.verify = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Worker count for the fixed strategy
    pub fn fixed_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

fn parse_enum<T: ValueEnum>(key: &str, value: &str) -> Result<T> {
    T::from_str(value, true).map_err(|e| CopyError::config(format!("{}: {}", key, e)))
}

fn parse_env_count(key: &str, value: &str) -> Result<usize> {
    parse_count(value).map_err(|e| CopyError::config(format!("{}: {}", key, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CopyError::config(format!("{}: expected a boolean, got '{}'", key, other))),
    }
}

/// Parse an element count with an optional decimal suffix (K, M, G)
pub fn parse_count(count: &str) -> std::result::Result<usize, String> {
    let count = count.trim().replace('_', "").to_uppercase();

    if count.is_empty() {
        return Err("Empty count string".to_string());
    }

    let (num_str, multiplier) = if let Some(num) = count.strip_suffix('G') {
        (num, 1_000_000_000u64)
    } else if let Some(num) = count.strip_suffix('M') {
        (num, 1_000_000u64)
    } else if let Some(num) = count.strip_suffix('K') {
        (num, 1_000u64)
    } else {
        (count.as_str(), 1u64)
    };

    if let Ok(whole) = num_str.trim().parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| format!("Count too large: {}", count));
    }

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if num < 0.0 || !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }

    Ok((num * multiplier as f64) as usize)
}
