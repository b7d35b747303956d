//! Apogee - Sounding-rocket flight simulator

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "apogee")]
#[command(about = "Sounding-rocket trajectory, stability and recovery simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one flight from a rocket configuration
    Simulate {
        /// Arguments passed to the simulator (see `apogee simulate --help`)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print the rocket's aerodynamic and stability summary
    Info {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let (program, args, run): (&str, Vec<String>, fn(&[&str]) -> anyhow::Result<()>) =
        match cli.command {
            Commands::Simulate { args } => ("apogee simulate", args, apogee_cli::run_cli_main),
            Commands::Info { args } => ("apogee info", args, apogee_cli::run_info_main),
        };

    // The sub-command parsers expect a program name first.
    let mut full_args = vec![program];
    full_args.extend(args.iter().map(|s| s.as_str()));

    tracing::debug!(command = program, "dispatching");
    if let Err(e) = run(&full_args) {
        eprintln!("apogee error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
