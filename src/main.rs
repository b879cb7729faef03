//! EdgeGlide - Seamless cursor crossing between monitors
//!
//! Intercepts global mouse motion and, when the cursor crosses between
//! monitors of different sizes, replaces the OS position with one that
//! preserves the percentage along the shared edge.

mod geometry;
mod hook;
mod platform;
mod topology;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hook::CrossingPipeline;

/// EdgeGlide - Seamless cursor crossing between monitors
#[derive(Parser)]
#[command(name = "edgeglide")]
#[command(version = "0.1.0")]
#[command(about = "Keep the cursor's relative position when crossing monitor edges", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cursor mapper (default)
    Run,

    /// Show the detected monitor layout
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_mapper(),
        Commands::Info => print_monitor_info(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Startup diagnostics go to stdout so they are visible without a
            // configured log level.
            println!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_mapper() -> anyhow::Result<()> {
    println!(
        "edgeglide running on {}. Press Ctrl+C to exit.",
        platform::platform_name()
    );

    platform::run(CrossingPipeline::new())?;

    println!("edgeglide stopped.");
    Ok(())
}

fn print_monitor_info() -> anyhow::Result<()> {
    let monitors = platform::monitors()?;

    println!("Monitors ({} detected):", monitors.len());
    for (i, m) in monitors.iter().enumerate() {
        let primary = if m.primary { "  [primary]" } else { "" };
        println!(
            "  {}. {}  {}x{} at ({}, {}){}",
            i + 1,
            m.device,
            m.rect.width(),
            m.rect.height(),
            m.rect.left,
            m.rect.top,
            primary
        );
    }
    println!("\nSignature: {}", topology::signature_of(&monitors));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        assert!(Cli::try_parse_from(["edgeglide"]).is_ok());
        assert!(Cli::try_parse_from(["edgeglide", "info"]).is_ok());
        assert!(Cli::try_parse_from(["edgeglide", "run", "--verbose"]).is_ok());
    }
}
