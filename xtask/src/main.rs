// Licensed under the Apache-2.0 license

mod bloat;

use anyhow::{Context, Result};
use std::process::Command;

const USAGE: &str = "\
cargo xtask <command> [options]

commands:
  test                       run unit, integration and functional tests
  clippy                     lint the workspace, warnings are errors
  bloat [--release] [--target <triple>] [--format table|json] [--report <dir>]
                             size of the driver code in the functional harness";

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}

fn run_bloat(args: &[String]) -> Result<()> {
    let mut release = false;
    let mut target = None;
    let mut format = bloat::BloatFormat::Table;
    let mut report_dir = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--release" => release = true,
            "--target" => target = Some(args.next().context("--target needs a value")?.as_str()),
            "--format" => {
                format = bloat::BloatFormat::parse(args.next().context("--format needs a value")?)?;
            }
            "--report" => {
                report_dir = Some(args.next().context("--report needs a directory")?.as_str());
            }
            other => anyhow::bail!("unknown bloat option '{}'\n\n{}", other, USAGE),
        }
    }

    match report_dir {
        Some(dir) => bloat::generate_report(release, target, dir),
        None => bloat::analyze_bloat(release, target, format),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "test" => cargo(&["test", "--package", "m5-hub-drivers"]),
        "clippy" => cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
        "bloat" => run_bloat(rest),
        other => anyhow::bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}
