//! Command implementations for the `hypercopy` binary

use crate::config::{parse_count, CliArgs, Commands, CopierConfig, OutputFormat};
use crate::core::{CopyReport, Element, ParallelCopier};
use crate::error::{CopyError, Result};
use crate::hash::{digest_elements, RangeDigest};

/// Resolve the configuration for `args` and run its command
pub fn run(args: &CliArgs) -> Result<()> {
    let config = CopierConfig::from_cli(args)?;
    execute(&args.command, &config)
}

/// Run one command against an already resolved configuration
pub fn execute(command: &Commands, config: &CopierConfig) -> Result<()> {
    match command {
        Commands::Plan { len, format } => cmd_plan(config, len, *format),
        Commands::Benchmark {
            len,
            iterations,
            src_offset,
            dst_offset,
            format,
        } => cmd_benchmark(config, len, *iterations, *src_offset, *dst_offset, *format),
        Commands::Config => cmd_config(config),
    }
}

fn parse_len(len: &str) -> Result<usize> {
    parse_count(len).map_err(|e| CopyError::config(format!("Invalid length: {}", e)))
}

fn cmd_plan(config: &CopierConfig, len: &str, format: OutputFormat) -> Result<()> {
    let len = parse_len(len)?;
    let copier = ParallelCopier::new(config.clone());
    let plan = copier.plan(len);

    match format {
        OutputFormat::Text => {
            println!("Policy: {}", copier.policy().name());
            plan.print_summary();
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}

/// Copy `len` elements `iterations` times into the same destination.
///
/// Fails if any run leaves the destination range different from the first.
pub fn benchmark(
    config: &CopierConfig,
    len: usize,
    iterations: usize,
    src_offset: usize,
    dst_offset: usize,
) -> Result<Vec<CopyReport>> {
    if iterations == 0 {
        return Err(CopyError::config("iterations must be at least 1"));
    }

    let src: Vec<Element> = (0..(src_offset + len) as Element)
        .map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15_u64 as Element))
        .collect();
    let mut dst: Vec<Element> = vec![0; dst_offset + len];

    let copier = ParallelCopier::new(config.clone());
    let mut reports = Vec::with_capacity(iterations);
    let mut first_digest: Option<RangeDigest> = None;

    for iteration in 0..iterations {
        let report = copier.copy(&src, src_offset, &mut dst, dst_offset, len)?;

        let digest = digest_elements(&dst[dst_offset..dst_offset + len]);
        if let Some(first) = &first_digest {
            if !first.verify(&digest) {
                return Err(CopyError::integrity_mismatch(first.hash.clone(), digest.hash));
            }
        } else {
            first_digest = Some(digest);
        }

        tracing::info!(
            iteration,
            workers = report.workers,
            duration = ?report.duration,
            "benchmark iteration"
        );
        reports.push(report);
    }

    Ok(reports)
}

fn cmd_benchmark(
    config: &CopierConfig,
    len: &str,
    iterations: usize,
    src_offset: usize,
    dst_offset: usize,
    format: OutputFormat,
) -> Result<()> {
    let len = parse_len(len)?;
    let reports = benchmark(config, len, iterations, src_offset, dst_offset)?;

    match format {
        OutputFormat::Text => {
            if let Some(last) = reports.last() {
                last.print_summary();
            }
            let mean = reports.iter().map(|r| r.throughput).sum::<f64>() / reports.len() as f64;
            println!(
                "\nMean throughput over {} runs: {}/s",
                reports.len(),
                humansize::format_size(mean as u64, humansize::BINARY)
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    Ok(())
}

fn cmd_config(config: &CopierConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
