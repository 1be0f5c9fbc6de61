// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use std::process::Command;

/// The library has no binary of its own; size is measured on the functional
/// test harness, which links every driver.
const HARNESS: &str = "functional";
const CRATE_FILTER: &str = "m5_hub_drivers";

fn bloat_command(release: bool, target: Option<&str>) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["bloat", "--test", HARNESS, "--filter", CRATE_FILTER]);

    if release {
        cmd.arg("--release");
    }
    if let Some(target) = target {
        cmd.args(["--target", target]);
    }
    cmd
}

/// Run cargo bloat over the driver code and print the result
pub fn analyze_bloat(release: bool, target: Option<&str>, format: BloatFormat) -> Result<()> {
    println!("Running binary size analysis...");

    let mut cmd = bloat_command(release, target);
    match format {
        BloatFormat::Table => {}
        BloatFormat::Json => {
            cmd.arg("--message-format=json");
        }
    }

    let output = cmd.output().context(
        "Failed to run cargo bloat - make sure it's installed with 'cargo install cargo-bloat'",
    )?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("cargo bloat failed: {}", stderr);
    }

    println!("{}", String::from_utf8_lossy(&output.stdout));
    Ok(())
}

/// Write per-function and per-crate size reports into `output_dir`
pub fn generate_report(release: bool, target: Option<&str>, output_dir: &str) -> Result<()> {
    println!("Generating binary size report...");

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    let reports: [(&str, &[&str]); 2] = [("functions", &["-n", "50"]), ("crates", &["--crates"])];

    for (name, flags) in reports {
        let output_file = format!("{}/bloat_{}.txt", output_dir, name);

        let output = bloat_command(release, target)
            .args(flags)
            .output()
            .with_context(|| format!("Failed to generate {} report", name))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("cargo bloat ({}) failed: {}", name, stderr);
        }

        std::fs::write(&output_file, &output.stdout)
            .with_context(|| format!("Failed to write report to {}", output_file))?;
        println!("Generated {}", output_file);
    }

    println!("Binary size report generated in {}", output_dir);
    Ok(())
}

#[derive(Clone, Copy)]
pub enum BloatFormat {
    Table,
    Json,
}

impl BloatFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "table" => Ok(BloatFormat::Table),
            "json" => Ok(BloatFormat::Json),
            other => anyhow::bail!("unknown bloat format '{}' (table, json)", other),
        }
    }
}
