//! Count command - count valid combos over ranges in parallel
//!
//! The command space is split into contiguous ranges by integer arithmetic
//! alone. Each rayon worker drives its own handle through its range; the
//! configuration is shared read-only.

use anyhow::{Result, bail};
use clap::Args;
use rayon::prelude::*;
use shadercompile_core::{ComboHandle, ComboError, Configuration};
use std::ops::Range;
use std::path::PathBuf;

/// Arguments for the count command
#[derive(Args)]
pub struct CountArgs {
    /// Path to the shader configuration file
    pub config: PathBuf,

    /// Number of ranges to split the command space into
    #[arg(short, long, default_value = "8")]
    pub jobs: u64,
}

/// Split `[0, total)` into `jobs` contiguous ranges of near-equal length.
pub fn split_ranges(total: u64, jobs: u64) -> Vec<Range<u64>> {
    let jobs = jobs.max(1);
    let (base, extra) = (total / jobs, total % jobs);
    let mut start = 0;
    (0..jobs)
        .map(|job| {
            let len = base + u64::from(job < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Count valid combos in `range` the way a compile worker walks it.
pub fn count_range(config: &Configuration, range: Range<u64>) -> Result<u64, ComboError> {
    let mut command = range.start;
    let mut combo = ComboHandle::unbound();
    let mut count = 0;
    while config.next_combo(&mut command, &mut combo, range.end)? {
        count += 1;
    }
    combo.free()?;
    Ok(count)
}

/// Execute the count command
pub fn execute(args: CountArgs) -> Result<()> {
    if args.jobs == 0 {
        bail!("--jobs must be at least 1");
    }
    let config = crate::load_config(&args.config)?;
    let ranges = split_ranges(config.total_command_count(), args.jobs);

    let counts = ranges
        .par_iter()
        .map(|range| count_range(&config, range.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    for (range, count) in ranges.iter().zip(&counts) {
        println!("[{}, {}) valid={}", range.start, range.end, count);
    }
    println!(
        "{} of {} combos valid",
        counts.iter().sum::<u64>(),
        config.total_command_count()
    );

    Ok(())
}
