//! Describe command - print the entry table

use anyhow::Result;
use clap::Args;
use shadercompile_core::CfgEntryInfo;
use std::path::PathBuf;

/// Arguments for the describe command
#[derive(Args)]
pub struct DescribeArgs {
    /// Path to the shader configuration file
    pub config: PathBuf,
}

/// One manifest line for an entry.
pub fn describe_line(info: &CfgEntryInfo) -> String {
    format!(
        "{:<32} {:<32} {:<8} static={:<8} dynamic={:<6} combos={:<10} commands=[{}, {}) centroid=0x{:x}",
        info.name,
        info.shader_file_name,
        info.shader_version,
        info.num_static_combos,
        info.num_dynamic_combos,
        info.num_combos,
        info.command_start,
        info.command_end,
        info.centroid_mask,
    )
}

/// Execute the describe command
pub fn execute(args: DescribeArgs) -> Result<()> {
    let config = crate::load_config(&args.config)?;

    for info in config.describe() {
        println!("{}", describe_line(info));
    }
    println!(
        "{} entries, {} commands",
        config.describe().len(),
        config.total_command_count()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_line() {
        let info = CfgEntryInfo {
            name: "sky_ps30".to_string(),
            shader_file_name: "sky_ps2x.fxc".to_string(),
            shader_version: "ps_3_0".to_string(),
            num_combos: 8,
            num_dynamic_combos: 2,
            num_static_combos: 4,
            command_start: 100,
            command_end: 108,
            centroid_mask: 3,
        };
        let line = describe_line(&info);
        assert!(line.starts_with("sky_ps30 "));
        assert!(line.contains("static=4 "));
        assert!(line.contains("dynamic=2 "));
        assert!(line.contains("commands=[100, 108)"));
        assert!(line.ends_with("centroid=0x3"));
    }
}
