//! Time-varying mass, center of mass and inertia.
//!
//! Positions are measured along the rocket axis from the center of mass of
//! the dry rocket (motor casing included, propellant excluded), positive
//! towards the nose. The dry CM is therefore 0 by construction.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::motor::Motor;

/// How the CM travels from its wet to its dry position during the burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmInterpolation {
    /// True barycenter of dry rocket and remaining propellant.
    #[default]
    Barycentric,
    /// Linear in the remaining propellant fraction.
    MassFraction,
    /// Linear in time between ignition and burn-out.
    Time,
}

/// A point in the burn at which mass properties are evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MassQuery {
    /// Seconds after ignition. Times before ignition read as ignition.
    At(f64),
    /// Burned out.
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Inertia {
    pub lateral: f64,
    pub axial: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MassModel {
    pub dry_mass: f64,
    pub inertia_i: f64,
    pub inertia_z: f64,
    pub distance_rocket_nozzle: f64,
    pub distance_rocket_propellant: f64,
    pub cm_interpolation: CmInterpolation,
}

impl MassModel {
    pub fn new(
        dry_mass: f64,
        inertia_i: f64,
        inertia_z: f64,
        distance_rocket_nozzle: f64,
        distance_rocket_propellant: f64,
        cm_interpolation: CmInterpolation,
    ) -> Result<Self> {
        ensure_positive("rocket mass", dry_mass)?;
        ensure_positive("rocket lateral inertia", inertia_i)?;
        ensure_positive("rocket axial inertia", inertia_z)?;
        if !distance_rocket_nozzle.is_finite() || !distance_rocket_propellant.is_finite() {
            return Err(Error::config("nozzle and propellant distances must be finite"));
        }
        Ok(Self {
            dry_mass,
            inertia_i,
            inertia_z,
            distance_rocket_nozzle,
            distance_rocket_propellant,
            cm_interpolation,
        })
    }

    pub fn propellant_mass(&self, motor: &dyn Motor, q: MassQuery) -> f64 {
        match q {
            MassQuery::At(t) => motor.propellant_mass(t.max(0.0)),
            MassQuery::Final => motor.propellant_mass(motor.burn_out_time()),
        }
    }

    pub fn total_mass(&self, motor: &dyn Motor, q: MassQuery) -> f64 {
        self.dry_mass + self.propellant_mass(motor, q)
    }

    /// Reduced mass of the dry rocket / propellant pair.
    pub fn reduced_mass(&self, motor: &dyn Motor, q: MassQuery) -> f64 {
        let mp = self.propellant_mass(motor, q);
        mp * self.dry_mass / (mp + self.dry_mass)
    }

    /// CM with the full propellant load.
    pub fn wet_center_of_mass(&self, motor: &dyn Motor) -> f64 {
        let mp0 = motor.initial_propellant_mass();
        self.distance_rocket_propellant * mp0 / (mp0 + self.dry_mass)
    }

    pub fn center_of_mass(&self, motor: &dyn Motor, q: MassQuery) -> f64 {
        let t = match q {
            MassQuery::Final => return self.final_center_of_mass(motor),
            MassQuery::At(t) => t.max(0.0),
        };
        if t >= motor.burn_out_time() {
            return self.final_center_of_mass(motor);
        }
        let mp = motor.propellant_mass(t);
        match self.cm_interpolation {
            CmInterpolation::Barycentric => {
                self.distance_rocket_propellant * mp / (mp + self.dry_mass)
            }
            CmInterpolation::MassFraction => {
                let mp0 = motor.initial_propellant_mass();
                if mp0 > 0.0 {
                    self.wet_center_of_mass(motor) * mp / mp0
                } else {
                    0.0
                }
            }
            CmInterpolation::Time => {
                let fraction = 1.0 - t / motor.burn_out_time();
                self.wet_center_of_mass(motor) * fraction.clamp(0.0, 1.0)
            }
        }
    }

    fn final_center_of_mass(&self, motor: &dyn Motor) -> f64 {
        let mp = motor.propellant_mass(motor.burn_out_time());
        self.distance_rocket_propellant * mp / (mp + self.dry_mass)
    }

    /// Inertia about the instantaneous CM: dry rocket, propellant about its
    /// own CM, and the parallel-axis term of the pair.
    pub fn inertia(&self, motor: &dyn Motor, q: MassQuery) -> Inertia {
        let (prop_lateral, prop_axial) = match q {
            MassQuery::At(t) => motor.propellant_inertia(t.max(0.0)),
            MassQuery::Final => motor.propellant_inertia(motor.burn_out_time()),
        };
        let mu = self.reduced_mass(motor, q);
        Inertia {
            lateral: self.inertia_i
                + prop_lateral
                + mu * self.distance_rocket_propellant.powi(2),
            axial: self.inertia_z + prop_axial,
        }
    }
}
