//! Atmosphere and gravity collaborator.

use serde::{Deserialize, Serialize};

/// Conditions along the trajectory. `altitude` is measured above the
/// launch site.
pub trait Environment: Send + Sync {
    fn air_density(&self, altitude: f64) -> f64;
    fn speed_of_sound(&self, altitude: f64) -> f64;
    fn gravity(&self, altitude: f64) -> f64;
    /// Wind velocity (east, north) in m/s.
    fn wind(&self, altitude: f64, t: f64) -> (f64, f64);
    fn pressure(&self, altitude: f64) -> f64;
}

const R_AIR: f64 = 287.05287;
const GAMMA: f64 = 1.4;
const LAPSE_RATE: f64 = 0.0065;
const TROPOPAUSE: f64 = 11_000.0;

/// International Standard Atmosphere, troposphere and lower stratosphere,
/// with constant gravity and a constant wind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardAtmosphere {
    /// Launch site elevation above sea level (m).
    pub elevation: f64,
    pub sea_level_temperature: f64,
    pub sea_level_pressure: f64,
    pub gravity: f64,
    pub wind_east: f64,
    pub wind_north: f64,
}

impl Default for StandardAtmosphere {
    fn default() -> Self {
        Self {
            elevation: 0.0,
            sea_level_temperature: 288.15,
            sea_level_pressure: 101_325.0,
            gravity: 9.80665,
            wind_east: 0.0,
            wind_north: 0.0,
        }
    }
}

impl StandardAtmosphere {
    fn geometric(&self, altitude: f64) -> f64 {
        (self.elevation + altitude).max(0.0)
    }

    pub fn temperature(&self, altitude: f64) -> f64 {
        let h = self.geometric(altitude).min(TROPOPAUSE);
        self.sea_level_temperature - LAPSE_RATE * h
    }
}

impl Environment for StandardAtmosphere {
    fn air_density(&self, altitude: f64) -> f64 {
        self.pressure(altitude) / (R_AIR * self.temperature(altitude))
    }

    fn speed_of_sound(&self, altitude: f64) -> f64 {
        (GAMMA * R_AIR * self.temperature(altitude)).sqrt()
    }

    fn gravity(&self, _altitude: f64) -> f64 {
        self.gravity
    }

    fn wind(&self, _altitude: f64, _t: f64) -> (f64, f64) {
        (self.wind_east, self.wind_north)
    }

    fn pressure(&self, altitude: f64) -> f64 {
        let h = self.geometric(altitude);
        let exponent = self.gravity / (R_AIR * LAPSE_RATE);
        let t0 = self.sea_level_temperature;
        if h <= TROPOPAUSE {
            self.sea_level_pressure * (1.0 - LAPSE_RATE * h / t0).powf(exponent)
        } else {
            let t11 = t0 - LAPSE_RATE * TROPOPAUSE;
            let p11 = self.sea_level_pressure * (t11 / t0).powf(exponent);
            p11 * (-self.gravity * (h - TROPOPAUSE) / (R_AIR * t11)).exp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_level_values() {
        let atm = StandardAtmosphere::default();
        assert!((atm.air_density(0.0) - 1.225).abs() < 1e-3);
        assert!((atm.speed_of_sound(0.0) - 340.29).abs() < 0.05);
        assert_eq!(atm.pressure(0.0), 101_325.0);
    }

    #[test]
    fn test_pressure_decreases_with_altitude() {
        let atm = StandardAtmosphere::default();
        let mut last = atm.pressure(0.0);
        for h in [500.0, 1000.0, 5000.0, 11_000.0, 15_000.0] {
            let p = atm.pressure(h);
            assert!(p < last, "pressure not decreasing at {h} m");
            last = p;
        }
        assert!((atm.pressure(11_000.0) - 22_632.0).abs() < 5.0);
    }

    #[test]
    fn test_elevation_offsets_altitude() {
        let site = StandardAtmosphere {
            elevation: 1400.0,
            ..Default::default()
        };
        let sea = StandardAtmosphere::default();
        assert_eq!(site.pressure(0.0), sea.pressure(1400.0));
    }
}
