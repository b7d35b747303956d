//! Error type shared by the core models and the integrator.

use std::fmt;

use crate::state::FlightState;

/// Everything that can stop a rocket from being configured or flown.
///
/// Non-fatal conditions (an unrecognised nose-cone shape, for instance) are
/// not errors; they are logged through `tracing` and the computation
/// continues with a fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid geometry or parameter, detected at configuration time.
    Configuration(String),
    /// Interpolation method name that is not supported.
    UnknownInterpolation(String),
    /// The integrator produced a non-finite state.
    IntegrationDivergence {
        time: f64,
        last_state: Box<FlightState>,
    },
    /// A user-supplied parachute trigger failed.
    TriggerEvaluation {
        parachute: String,
        time: f64,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Error::UnknownInterpolation(name) => {
                write!(f, "unknown interpolation method '{name}'")
            }
            Error::IntegrationDivergence { time, last_state } => write!(
                f,
                "integration diverged at t = {time:.4} s (last valid altitude {:.2} m)",
                last_state.altitude()
            ),
            Error::TriggerEvaluation {
                parachute,
                time,
                reason,
            } => write!(
                f,
                "trigger of parachute '{parachute}' failed at t = {time:.4} s: {reason}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Reject non-finite or non-positive lengths, masses and the like.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be positive, got {value}")))
    }
}
