//! Command line front end: run a flight or report a rocket's stability
//! from a JSON configuration.

pub mod config;
pub mod io;

use std::path::PathBuf;

use anyhow::Result;
use apogee_sim::{Flight, FlightResult, FlightSummary};
use clap::{Parser, ValueEnum};

use crate::config::RocketConfig;
use crate::io::{write_flight_csv, write_json};

/// Entry point of `apogee simulate`.
pub fn run_cli_main(args: &[&str]) -> Result<()> {
    let args = Args::parse_from(args);
    run_simulate(&args).map(|_| ())
}

/// Entry point of `apogee info`.
pub fn run_info_main(args: &[&str]) -> Result<()> {
    let args = InfoArgs::parse_from(args);
    let config = RocketConfig::load(&args.config)?;
    let rocket = config.build_rocket()?;
    println!("{}", serde_json::to_string_pretty(&rocket.summary())?);
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "apogee-simulate")]
#[command(about = "Simulate one flight of a sounding rocket")]
#[command(version)]
pub struct Args {
    /// Rocket configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Output file format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    // ── Flight overrides ──────────────────────────────────────
    #[arg(long)]
    time_step: Option<f64>,

    #[arg(long)]
    max_time: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    rail_length: Option<f64>,

    #[arg(long)]
    inclination: Option<f64>,

    #[arg(long)]
    heading: Option<f64>,

    // ── Environment overrides ────────────────────────────────
    #[arg(long)]
    wind_east: Option<f64>,

    #[arg(long)]
    wind_north: Option<f64>,

    #[arg(long)]
    elevation: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(name = "apogee-info")]
#[command(about = "Print CP, lift slope and static margin of a rocket")]
pub struct InfoArgs {
    /// Rocket configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn run_simulate(args: &Args) -> Result<FlightResult> {
    let mut config = RocketConfig::load(&args.config)?;
    apply_overrides(args, &mut config);

    let rocket = config.build_rocket()?;
    let flight = Flight::new(&rocket, &config.environment, config.flight)?;
    let result = flight.run()?;

    print_summary(&result.summary);
    write_output(args, &result)?;
    Ok(result)
}

fn apply_overrides(args: &Args, config: &mut RocketConfig) {
    let flight = &mut config.flight;
    if let Some(v) = args.time_step {
        flight.time_step = v;
    }
    if let Some(v) = args.max_time {
        flight.max_time = v;
    }
    if let Some(v) = args.seed {
        flight.seed = v;
    }
    if let Some(v) = args.rail_length {
        flight.rail_length = v;
    }
    if let Some(v) = args.inclination {
        flight.inclination = v;
    }
    if let Some(v) = args.heading {
        flight.heading = v;
    }

    let env = &mut config.environment;
    if let Some(v) = args.wind_east {
        env.wind_east = v;
    }
    if let Some(v) = args.wind_north {
        env.wind_north = v;
    }
    if let Some(v) = args.elevation {
        env.elevation = v;
    }
}

fn print_summary(s: &FlightSummary) {
    let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

    println!("\nFlight Summary ({:?}):", s.outcome);
    println!("  Rail exit:   t = {} s, v = {} m/s", opt(s.rail_exit_time), opt(s.rail_exit_speed));
    println!("  Burn-out:    t = {:.2} s", s.burn_out_time);
    println!("  Apogee:      {} m at t = {} s", opt(s.apogee_altitude), opt(s.apogee_time));
    println!("  Max speed:   {:.2} m/s (Mach {:.2})", s.max_speed, s.max_mach);
    println!("  Impact:      t = {} s, v = {} m/s", opt(s.impact_time), opt(s.impact_velocity));
    println!("-----------------------------");
}

fn write_output(args: &Args, result: &FlightResult) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir)?;

    let path = match args.format {
        OutputFormat::Csv => {
            let path = args.output_dir.join("flight.csv");
            write_flight_csv(&path, result)?;
            path
        }
        OutputFormat::Json => {
            let path = args.output_dir.join("flight.json");
            write_json(&path, result)?;
            path
        }
    };
    write_json(&args.output_dir.join("summary.json"), &result.summary)?;

    tracing::info!(path = %path.display(), samples = result.samples.len(), "flight written");
    println!("Data written to {:?}", path);
    Ok(())
}
