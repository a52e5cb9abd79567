//! Lookup command - resolve a command number to its entry and combo

use anyhow::Result;
use clap::Args;
use shadercompile_core::Configuration;
use std::path::PathBuf;

/// Arguments for the lookup command
#[derive(Args)]
pub struct LookupArgs {
    /// Path to the shader configuration file
    pub config: PathBuf,

    /// Global command number
    pub command: u64,

    /// Also print the compiler command line
    #[arg(long)]
    pub command_line: bool,
}

/// Describe what `command` resolves to.
pub fn lookup(config: &Configuration, command: u64, command_line: bool) -> Result<Vec<String>> {
    let Some(info) = config.get_section(command) else {
        return Ok(vec![format!(
            "{command}: out of range (total {} commands)",
            config.total_command_count()
        )]);
    };

    let mut lines = vec![format!(
        "{command}: {} ({}) commands [{}, {})",
        info.name, info.shader_file_name, info.command_start, info.command_end
    )];
    match config.combo(command) {
        Some(combo) => {
            lines.push(format!("  {}", combo.description()?));
            if command_line {
                lines.push(format!("  {}", combo.command_line()?));
            }
        }
        None => lines.push(format!(
            "  combo {} is skipped",
            command - info.command_start
        )),
    }
    Ok(lines)
}

/// Execute the lookup command
pub fn execute(args: LookupArgs) -> Result<()> {
    let config = crate::load_config(&args.config)?;
    for line in lookup(&config, args.command, args.command_line)? {
        println!("{line}");
    }
    Ok(())
}
