//! Automation tasks for the sqlq workspace.
//!
//! Run with `cargo xtask <command>`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "Automation for the sqlq workspace")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every check: format, lint, tests, docs
    Ci,
    /// Check formatting
    Fmt,
    /// Run clippy on all targets, warnings denied
    Clippy,
    /// Run tests
    Test {
        /// Only test this package
        #[arg(short, long)]
        package: Option<String>,
        /// Only run tests whose name contains this string
        filter: Option<String>,
    },
    /// Run the pool and client scenario suites against the mock transport
    Scenarios,
    /// Build documentation, warnings denied
    Doc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.command {
        Command::Ci => {
            println!("Running CI checks...");
            fmt(&sh)?;
            clippy(&sh)?;
            test(&sh, None, None)?;
            doc(&sh)?;
            println!("All CI checks passed!");
        }
        Command::Fmt => fmt(&sh)?,
        Command::Clippy => clippy(&sh)?,
        Command::Test { package, filter } => test(&sh, package.as_deref(), filter.as_deref())?,
        Command::Scenarios => scenarios(&sh)?,
        Command::Doc => doc(&sh)?,
    }

    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let output = std::process::Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("failed to run cargo locate-project")?;

    let manifest = String::from_utf8(output.stdout).context("invalid UTF-8 in cargo output")?;

    Ok(PathBuf::from(manifest.trim())
        .parent()
        .context("manifest path has no parent")?
        .to_path_buf())
}

fn fmt(sh: &Shell) -> Result<()> {
    println!("Checking formatting...");
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    println!("Running clippy...");
    cmd!(sh, "cargo clippy --workspace --all-features --all-targets -- -D warnings").run()?;
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>, filter: Option<&str>) -> Result<()> {
    let scope = match package {
        Some(package) => vec!["--package".to_string(), package.to_string()],
        None => vec!["--workspace".to_string()],
    };
    let filter = filter.map(str::to_string);

    println!("Running tests...");
    cmd!(sh, "cargo test {scope...} --all-features {filter...}").run()?;
    Ok(())
}

fn scenarios(sh: &Shell) -> Result<()> {
    println!("Running scenario suites...");
    cmd!(sh, "cargo test --package sqlq-testing --test scheduler --test client").run()?;
    Ok(())
}

fn doc(sh: &Shell) -> Result<()> {
    println!("Building documentation...");
    cmd!(sh, "cargo doc --workspace --all-features --no-deps")
        .env("RUSTDOCFLAGS", "-D warnings")
        .run()?;
    Ok(())
}
