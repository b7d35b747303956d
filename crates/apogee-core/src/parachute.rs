//! Recovery devices and their deployment predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::state::FlightState;

type Predicate = dyn Fn(f64, &FlightState) -> std::result::Result<bool, String> + Send + Sync;

/// Deployment predicate over `(pressure, state)`.
///
/// `pressure` is the (noisy) barometric reading in Pa; `state` follows the
/// layout documented in [`crate::state`].
pub struct Trigger(Box<Predicate>);

impl Trigger {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64, &FlightState) -> bool + Send + Sync + 'static,
    {
        Self(Box::new(move |p, s| Ok(f(p, s))))
    }

    /// A predicate that may fail. The failure aborts the flight.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(f64, &FlightState) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// Fires as soon as the rocket is descending.
    pub fn apogee() -> Self {
        Self::new(|_, s| s.vertical_velocity() < 0.0)
    }

    /// Fires when descending below `altitude` (m above the launch site).
    pub fn descending_below(altitude: f64) -> Self {
        Self::new(move |_, s| s.vertical_velocity() < 0.0 && s.altitude() < altitude)
    }

    pub fn evaluate(&self, pressure: f64, state: &FlightState) -> std::result::Result<bool, String> {
        (self.0)(pressure, state)
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Trigger(..)")
    }
}

/// Additive barometer noise: mean, standard deviation and the lag-one
/// correlation of consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoiseSpec {
    pub mean: f64,
    pub std_dev: f64,
    pub time_correlation: f64,
}

impl NoiseSpec {
    pub fn new(mean: f64, std_dev: f64, time_correlation: f64) -> Result<Self> {
        if !(std_dev.is_finite() && std_dev >= 0.0) || !mean.is_finite() {
            return Err(Error::config(format!(
                "noise mean must be finite and std dev non-negative, got ({mean}, {std_dev})"
            )));
        }
        if !(0.0..1.0).contains(&time_correlation) {
            return Err(Error::config(format!(
                "noise time correlation must be in [0, 1), got {time_correlation}"
            )));
        }
        Ok(Self {
            mean,
            std_dev,
            time_correlation,
        })
    }
}

#[derive(Debug)]
pub struct Parachute {
    pub name: String,
    /// Drag coefficient times reference area (m²).
    pub cd_s: f64,
    pub trigger: Trigger,
    /// Trigger evaluations per second.
    pub sampling_rate: f64,
    /// Delay between trigger and full deployment (s).
    pub lag: f64,
    pub noise: NoiseSpec,
}

impl Parachute {
    pub fn new(
        name: impl Into<String>,
        cd_s: f64,
        trigger: Trigger,
        sampling_rate: f64,
        lag: f64,
        noise: NoiseSpec,
    ) -> Result<Self> {
        let name = name.into();
        ensure_positive(&format!("parachute '{name}' CdS"), cd_s)?;
        ensure_positive(&format!("parachute '{name}' sampling rate"), sampling_rate)?;
        if !(lag.is_finite() && lag >= 0.0) {
            return Err(Error::config(format!(
                "parachute '{name}' lag must be non-negative, got {lag}"
            )));
        }
        Ok(Self {
            name,
            cd_s,
            trigger,
            sampling_rate,
            lag,
            noise,
        })
    }

    pub fn sampling_period(&self) -> f64 {
        1.0 / self.sampling_rate
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParachuteSummary {
    pub name: String,
    pub cd_s: f64,
    pub sampling_rate: f64,
    pub lag: f64,
    pub noise: NoiseSpec,
}

impl From<&Parachute> for ParachuteSummary {
    fn from(p: &Parachute) -> Self {
        Self {
            name: p.name.clone(),
            cd_s: p.cd_s,
            sampling_rate: p.sampling_rate,
            lag: p.lag,
            noise: p.noise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{STATE_LEN, VZ, Z};

    fn state(z: f64, vz: f64) -> FlightState {
        let mut s = [0.0; STATE_LEN];
        s[Z] = z;
        s[VZ] = vz;
        FlightState(s)
    }

    #[test]
    fn test_standard_triggers() {
        let drogue = Trigger::apogee();
        let main = Trigger::descending_below(800.0);

        assert_eq!(drogue.evaluate(90_000.0, &state(1500.0, 3.0)), Ok(false));
        assert_eq!(drogue.evaluate(90_000.0, &state(1500.0, -0.1)), Ok(true));
        assert_eq!(main.evaluate(90_000.0, &state(1500.0, -20.0)), Ok(false));
        assert_eq!(main.evaluate(95_000.0, &state(799.0, -20.0)), Ok(true));
        assert_eq!(main.evaluate(95_000.0, &state(700.0, 2.0)), Ok(false));
    }

    #[test]
    fn test_fallible_trigger_reports_reason() {
        let t = Trigger::fallible(|p, _| {
            if p.is_nan() {
                Err("no pressure reading".to_string())
            } else {
                Ok(p < 80_000.0)
            }
        });
        assert!(t.evaluate(f64::NAN, &state(0.0, 0.0)).is_err());
        assert_eq!(t.evaluate(70_000.0, &state(0.0, 0.0)), Ok(true));
    }

    #[test]
    fn test_parachute_validation() {
        let noise = NoiseSpec::new(0.0, 8.3, 0.5).unwrap();
        assert!(Parachute::new("Main", 10.0, Trigger::apogee(), 105.0, 1.5, noise).is_ok());
        assert!(Parachute::new("Main", 0.0, Trigger::apogee(), 105.0, 1.5, noise).is_err());
        assert!(Parachute::new("Main", 10.0, Trigger::apogee(), 0.0, 1.5, noise).is_err());
        assert!(Parachute::new("Main", 10.0, Trigger::apogee(), 105.0, -1.0, noise).is_err());
        assert!(NoiseSpec::new(0.0, 8.3, 1.0).is_err());
        assert!(NoiseSpec::new(0.0, -1.0, 0.5).is_err());
    }
}
