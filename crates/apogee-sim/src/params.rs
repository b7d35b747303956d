//! Integrator settings and their admissible ranges.

use apogee_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameter specification with bounds and default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Human-readable label.
    pub label: &'static str,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Value used when the setting is not given.
    pub default: f64,
}

impl ParamSpec {
    /// Create a new parameter specification.
    pub const fn new(label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            label,
            min,
            max,
            default,
        }
    }

    /// Reject values outside `[min, max]` (and NaN).
    pub fn check(&self, value: f64) -> Result<()> {
        if value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(Error::config(format!(
                "{} must lie in [{}, {}], got {value}",
                self.label, self.min, self.max
            )))
        }
    }
}

/// Launch and integration parameters.
pub mod flight {
    use super::ParamSpec;

    pub const RAIL_LENGTH: ParamSpec = ParamSpec::new("Rail Length (m)", 0.0, 100.0, 5.2);
    pub const INCLINATION: ParamSpec = ParamSpec::new("Inclination (°)", 1.0, 90.0, 85.0);
    pub const HEADING: ParamSpec = ParamSpec::new("Heading (°)", 0.0, 360.0, 0.0);
    pub const TIME_STEP: ParamSpec = ParamSpec::new("Time Step (s)", 1e-5, 0.1, 0.005);
    pub const DESCENT_TIME_STEP: ParamSpec =
        ParamSpec::new("Descent Time Step (s)", 1e-4, 1.0, 0.05);
    pub const MAX_TIME: ParamSpec = ParamSpec::new("Max Time (s)", 0.1, 1e5, 600.0);
    pub const EVENT_TOLERANCE: ParamSpec =
        ParamSpec::new("Event Tolerance (s)", 1e-12, 1e-2, 1e-6);
}

/// Default seed of the trigger noise generators.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Length of the launch rail (m).
    pub rail_length: f64,
    /// Rail angle above the horizontal (degrees).
    pub inclination: f64,
    /// Rail azimuth, clockwise from north (degrees).
    pub heading: f64,
    /// Step used until the first parachute opens (s).
    pub time_step: f64,
    /// Step used under canopy (s).
    pub descent_time_step: f64,
    /// Simulated time after which the run stops (s).
    pub max_time: f64,
    /// Time resolution of rail exit, apogee and impact (s).
    pub event_tolerance: f64,
    pub seed: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            rail_length: flight::RAIL_LENGTH.default,
            inclination: flight::INCLINATION.default,
            heading: flight::HEADING.default,
            time_step: flight::TIME_STEP.default,
            descent_time_step: flight::DESCENT_TIME_STEP.default,
            max_time: flight::MAX_TIME.default,
            event_tolerance: flight::EVENT_TOLERANCE.default,
            seed: DEFAULT_SEED,
        }
    }
}

impl FlightConfig {
    pub fn validate(&self) -> Result<()> {
        flight::RAIL_LENGTH.check(self.rail_length)?;
        flight::INCLINATION.check(self.inclination)?;
        flight::HEADING.check(self.heading)?;
        flight::TIME_STEP.check(self.time_step)?;
        flight::DESCENT_TIME_STEP.check(self.descent_time_step)?;
        flight::MAX_TIME.check(self.max_time)?;
        flight::EVENT_TOLERANCE.check(self.event_tolerance)?;
        Ok(())
    }
}
