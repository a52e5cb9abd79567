//! Commands command - print one compiler command line per valid combo
//!
//! This is the loop a compile worker runs over its assigned range: a single
//! handle is advanced with `next_combo` from `start` to `end`, and each combo
//! is formatted into a fixed-size buffer.

use anyhow::{Context, Result, bail};
use clap::Args;
use shadercompile_core::{ComboHandle, Configuration};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Arguments for the commands command
#[derive(Args)]
pub struct CommandsArgs {
    /// Path to the shader configuration file
    pub config: PathBuf,

    /// First command number (inclusive)
    #[arg(long, default_value = "0")]
    pub start: u64,

    /// Last command number (exclusive, defaults to the total command count)
    #[arg(long)]
    pub end: Option<u64>,

    /// Print human-readable descriptions instead of compiler command lines
    #[arg(long)]
    pub human: bool,

    /// Size of the formatting buffer in bytes
    #[arg(long, default_value = "4096")]
    pub buffer_size: usize,
}

/// Write one formatted line per valid combo in `[start, end)`.
///
/// Returns the number of combos written.
pub fn write_commands(
    config: &Configuration,
    start: u64,
    end: u64,
    human: bool,
    buffer_size: usize,
    out: &mut impl Write,
) -> Result<u64> {
    if start > end {
        bail!("Start command {start} is past end command {end}");
    }

    let mut buffer = vec![0u8; buffer_size];
    let mut command = start;
    let mut combo = ComboHandle::unbound();
    let mut written = 0;

    while config.next_combo(&mut command, &mut combo, end)? {
        let formatted = if human {
            combo.format_command_human_readable(&mut buffer)
        } else {
            combo.format_command(&mut buffer)
        };
        let len = formatted.with_context(|| format!("Failed to format command {command}"))?;

        out.write_all(&buffer[..len])?;
        out.write_all(b"\n")?;
        written += 1;
    }

    Ok(written)
}

/// Execute the commands command
pub fn execute(args: CommandsArgs) -> Result<()> {
    let config = crate::load_config(&args.config)?;
    let end = args.end.unwrap_or_else(|| config.total_command_count());

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = write_commands(
        &config,
        args.start,
        end,
        args.human,
        args.buffer_size,
        &mut out,
    )?;
    out.flush()?;

    tracing::info!(
        start = args.start,
        end,
        combos = written,
        "Formatted commands"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadercompile_core::{ComboParam, EntryDef};

    fn config() -> Configuration {
        Configuration::from_entries([
            EntryDef::new("a_ps30", "a.fxc", "ps_3_0")
                .with_static(ComboParam::new("X", 0, 2))
                .with_validity(|s: u64| s != 1),
            EntryDef::new("b_vs30", "b.fxc", "vs_3_0").with_dynamic(ComboParam::new("Y", 0, 1)),
        ])
        .unwrap()
    }

    #[test]
    fn test_write_commands() {
        let mut out = Vec::new();
        let written = write_commands(&config(), 0, 5, false, 256, &mut out).unwrap();
        assert_eq!(written, 4);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("a.fxc "));
        assert!(lines[1].ends_with("/DX=2"));
        assert!(lines[3].starts_with("b.fxc "));
        assert!(lines[3].ends_with("/DY=1"));
    }

    #[test]
    fn test_write_commands_human() {
        let mut out = Vec::new();
        write_commands(&config(), 3, 4, true, 256, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "b_vs30 (b.fxc, vs_3_0) combo 0 [command 3]: static() dynamic(Y=0)\n"
        );
    }

    #[test]
    fn test_small_buffer_fails() {
        let mut out = Vec::new();
        let err = write_commands(&config(), 0, 5, false, 8, &mut out).unwrap_err();
        assert!(err.to_string().contains("command 0"), "{err}");
        assert!(out.is_empty());
    }

    #[test]
    fn test_start_past_end() {
        let mut out = Vec::new();
        assert!(write_commands(&config(), 4, 2, false, 256, &mut out).is_err());
    }
}
