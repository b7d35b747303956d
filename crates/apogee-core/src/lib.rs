//! # Apogee Core
//!
//! Aerodynamic configuration and stability model of a sounding rocket:
//! - Lifting surfaces (nose cone, fin set, tail) and their CP / Cl_alpha
//! - The aggregate center of pressure and lift-coefficient derivative
//! - Time-varying mass, center of mass and inertia
//! - Static margin, eccentricities, rail buttons and parachutes
//! - The flight-phase tracker driven by the integrator
//!
//! Positions are measured along the rocket axis from the dry center of
//! mass, positive towards the nose. Nothing here performs I/O or draws
//! random numbers; see `apogee-sim` for the integrator.

pub mod aero;
pub mod aggregate;
pub mod drag;
pub mod environment;
pub mod error;
pub mod mass;
pub mod motor;
pub mod parachute;
pub mod rocket;
pub mod state;
pub mod state_machine;
pub mod table;

// Re-export core types
pub use aero::{AeroContribution, AeroSurface, FinSet, NoseCone, NoseKind, Tail};
pub use aggregate::{AeroAggregate, InstalledSurface};
pub use drag::DragCurve;
pub use environment::{Environment, StandardAtmosphere};
pub use error::{Error, Result};
pub use mass::{CmInterpolation, Inertia, MassModel, MassQuery};
pub use motor::{GrainGeometry, Motor, ThrustCurveMotor};
pub use parachute::{NoiseSpec, Parachute, ParachuteSummary, Trigger};
pub use rocket::{RailButtons, Rocket, RocketParams, RocketSummary};
pub use state::{FlightState, StateVector, STATE_LEN};
pub use state_machine::{FlightPhase, PhaseEvent, PhaseTracker, NUM_PHASES};
pub use table::{Extrapolation, Interpolation, Table1D};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
