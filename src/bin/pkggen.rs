//! pkggen CLI - upstream version and checksum generator
//!
//! Usage:
//!   pkggen generate <package.json>    Resolve a package and print the result
//!   pkggen generate -                 Read the package metadata from stdin
//!
//! The resolution result is printed as JSON on stdout; progress and errors
//! go to stderr so the output can be piped into a build pipeline.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pkggen::{output, Package};

#[derive(Parser)]
#[command(name = "pkggen")]
#[command(about = "Upstream version resolver and artifact checksum generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a package's upstream version and artifact checksums
    Generate {
        /// Path to the package metadata JSON document ("-" for stdin)
        package: PathBuf,

        /// Pretty-print the resulting JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { package, pretty } => {
            let pkg = if package.as_os_str() == "-" {
                Package::from_reader(std::io::stdin().lock())?
            } else {
                let file = File::open(&package)
                    .with_context(|| format!("cannot open {}", package.display()))?;
                Package::from_reader(file)?
            };

            output::action(&format!("Generating {}", pkg.name));
            let resolution = pkggen::resolve(&pkg)?;
            output::success(&format!("{} resolved to {}", pkg.name, resolution.version));

            let document = if pretty {
                serde_json::to_string_pretty(&resolution)?
            } else {
                serde_json::to_string(&resolution)?
            };
            println!("{document}");
        }
    }

    Ok(())
}
