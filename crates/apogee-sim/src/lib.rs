//! Apogee Simulation Library
//!
//! Integrates a configured rocket from ignition to ground impact and runs
//! the parachute trigger engine along the way.

pub mod dynamics;
pub mod flight;
pub mod ode;
pub mod params;
pub mod trigger;

// Re-export main types
pub use flight::{Flight, FlightOutcome, FlightResult, FlightSummary, Sample};
pub use params::*;
pub use trigger::{ChuteState, ParachuteEvent, TriggerEngine};
