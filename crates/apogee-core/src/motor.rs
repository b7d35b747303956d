//! Propulsion collaborator.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::table::{Extrapolation, Interpolation, Table1D};

/// What the flight model needs from a motor. All quantities are pure
/// functions of time since ignition.
pub trait Motor: Send + Sync {
    /// Thrust (N).
    fn thrust(&self, t: f64) -> f64;
    /// Remaining propellant mass (kg).
    fn propellant_mass(&self, t: f64) -> f64;
    /// Time derivative of the propellant mass (kg/s, non-positive).
    fn propellant_mass_flow(&self, t: f64) -> f64;
    /// Propellant moments of inertia about its own CM: (lateral, axial).
    fn propellant_inertia(&self, t: f64) -> (f64, f64);
    fn burn_out_time(&self) -> f64;
    fn nozzle_radius(&self) -> f64;
    fn total_impulse(&self) -> f64;

    fn initial_propellant_mass(&self) -> f64 {
        self.propellant_mass(0.0)
    }
}

/// Solid grain stack geometry, used for the propellant inertia.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrainGeometry {
    pub number: u32,
    pub separation: f64,
    pub outer_radius: f64,
    pub initial_inner_radius: f64,
    pub initial_height: f64,
}

impl GrainGeometry {
    pub fn volume(&self) -> f64 {
        f64::from(self.number)
            * PI
            * (self.outer_radius.powi(2) - self.initial_inner_radius.powi(2))
            * self.initial_height
    }

    fn stack_height(&self) -> f64 {
        f64::from(self.number) * self.initial_height
            + f64::from(self.number.saturating_sub(1)) * self.separation
    }
}

/// Motor defined by a tabulated thrust curve.
///
/// Propellant mass is consumed in proportion to the delivered impulse
/// (constant effective exhaust velocity).
#[derive(Debug, Clone)]
pub struct ThrustCurveMotor {
    thrust: Table1D,
    interpolation: Interpolation,
    /// Delivered impulse at each curve node.
    impulse_nodes: Vec<(f64, f64)>,
    total_impulse: f64,
    propellant_mass: f64,
    burn_out_time: f64,
    nozzle_radius: f64,
    grains: Option<GrainGeometry>,
}

impl ThrustCurveMotor {
    pub fn new(
        curve: &[(f64, f64)],
        propellant_mass: f64,
        nozzle_radius: f64,
        interpolation: Interpolation,
    ) -> Result<Self> {
        ensure_positive("propellant mass", propellant_mass)?;
        ensure_positive("nozzle radius", nozzle_radius)?;
        if curve.iter().any(|(t, _)| *t < 0.0) {
            return Err(Error::config("thrust curve times must be non-negative"));
        }
        let (thrust, impulse_nodes, total_impulse) = tabulate(curve, interpolation)?;
        let burn_out_time = thrust.domain().1;

        Ok(Self {
            thrust,
            interpolation,
            impulse_nodes,
            total_impulse,
            propellant_mass,
            burn_out_time,
            nozzle_radius,
            grains: None,
        })
    }

    /// Cut the burn short (or stretch the declared burn) at `t`.
    ///
    /// A shorter burn crops the curve at `t`, so the whole propellant load
    /// is spent over the cropped impulse and the mass stays continuous.
    pub fn with_burn_out_time(mut self, t: f64) -> Result<Self> {
        ensure_positive("burn out time", t)?;
        let (start, end) = self.thrust.domain();
        if t <= start {
            return Err(Error::config(format!(
                "burn out time {t} is not after the start of the thrust curve ({start})"
            )));
        }
        if t < end {
            let mut cropped: Vec<(f64, f64)> =
                self.thrust.points().take_while(|&(ti, _)| ti < t).collect();
            cropped.push((t, self.thrust.eval(t)));
            let (thrust, impulse_nodes, total_impulse) = tabulate(&cropped, self.interpolation)?;
            self.thrust = thrust;
            self.impulse_nodes = impulse_nodes;
            self.total_impulse = total_impulse;
        }
        self.burn_out_time = t;
        Ok(self)
    }

    pub fn with_grains(mut self, grains: GrainGeometry) -> Result<Self> {
        ensure_positive("grain outer radius", grains.outer_radius)?;
        ensure_positive("grain height", grains.initial_height)?;
        if grains.number == 0 || grains.initial_inner_radius >= grains.outer_radius {
            return Err(Error::config("grain geometry is inconsistent"));
        }
        self.grains = Some(grains);
        Ok(self)
    }

    fn delivered_impulse(&self, t: f64) -> f64 {
        let (start, end) = self.thrust.domain();
        if t <= start {
            return 0.0;
        }
        if t >= end {
            return self.total_impulse;
        }
        let i = self
            .impulse_nodes
            .partition_point(|&(ti, _)| ti <= t)
            .saturating_sub(1);
        let (t0, acc) = self.impulse_nodes[i];
        // Trapezoid over the partial segment.
        let partial = 0.5 * (self.thrust.eval(t0) + self.thrust.eval(t)) * (t - t0);
        (acc + partial).min(self.total_impulse)
    }
}

/// Thrust table, impulse delivered at each node, and total impulse.
fn tabulate(
    curve: &[(f64, f64)],
    interpolation: Interpolation,
) -> Result<(Table1D, Vec<(f64, f64)>, f64)> {
    let thrust = Table1D::new(curve, interpolation, Extrapolation::Zero)?;
    let cumulative = thrust.cumulative_integral();
    let total_impulse = cumulative.last().copied().unwrap_or(0.0);
    if total_impulse <= 0.0 {
        return Err(Error::config("thrust curve delivers no impulse"));
    }
    let impulse_nodes = thrust
        .points()
        .map(|(t, _)| t)
        .zip(cumulative)
        .collect();
    Ok((thrust, impulse_nodes, total_impulse))
}

impl Motor for ThrustCurveMotor {
    fn thrust(&self, t: f64) -> f64 {
        if t > self.burn_out_time {
            0.0
        } else {
            self.thrust.eval(t)
        }
    }

    fn propellant_mass(&self, t: f64) -> f64 {
        self.propellant_mass * (1.0 - self.delivered_impulse(t) / self.total_impulse)
    }

    fn propellant_mass_flow(&self, t: f64) -> f64 {
        if t < 0.0 || t > self.burn_out_time {
            return 0.0;
        }
        -self.thrust(t) * self.propellant_mass / self.total_impulse
    }

    fn propellant_inertia(&self, t: f64) -> (f64, f64) {
        let m = self.propellant_mass(t);
        match self.grains {
            Some(g) => {
                // Grains burn from the bore outwards; the stack height is kept.
                let fraction = m / self.propellant_mass;
                let inner_sq = g.outer_radius.powi(2)
                    - fraction * (g.outer_radius.powi(2) - g.initial_inner_radius.powi(2));
                let h = g.stack_height();
                let axial = 0.5 * m * (g.outer_radius.powi(2) + inner_sq);
                let lateral = m * ((g.outer_radius.powi(2) + inner_sq) / 4.0 + h * h / 12.0);
                (lateral, axial)
            }
            None => (0.0, 0.0),
        }
    }

    fn burn_out_time(&self) -> f64 {
        self.burn_out_time
    }

    fn nozzle_radius(&self) -> f64 {
        self.nozzle_radius
    }

    fn total_impulse(&self) -> f64 {
        self.total_impulse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_motor() -> ThrustCurveMotor {
        ThrustCurveMotor::new(
            &[(0.0, 1000.0), (2.0, 1000.0)],
            2.0,
            0.033,
            Interpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_mass_follows_impulse() {
        let m = square_motor();
        assert_eq!(m.total_impulse(), 2000.0);
        assert_eq!(m.propellant_mass(0.0), 2.0);
        assert!((m.propellant_mass(1.0) - 1.0).abs() < 1e-12);
        assert_eq!(m.propellant_mass(2.0), 0.0);
        assert_eq!(m.propellant_mass(10.0), 0.0);
        assert!((m.propellant_mass_flow(1.0) + 1.0).abs() < 1e-12);
        assert_eq!(m.propellant_mass_flow(3.0), 0.0);
    }

    #[test]
    fn test_early_burn_out_crops_the_curve() {
        let m = square_motor().with_burn_out_time(1.5).unwrap();
        assert_eq!(m.burn_out_time(), 1.5);
        assert_eq!(m.total_impulse(), 1500.0);
        assert_eq!(m.thrust(1.0), 1000.0);
        assert_eq!(m.thrust(1.6), 0.0);
        assert_eq!(m.thrust(-0.1), 0.0);

        // The whole load burns over the shorter curve, without a jump.
        assert_eq!(m.propellant_mass(0.0), 2.0);
        assert!((m.propellant_mass(0.75) - 1.0).abs() < 1e-12);
        assert!(m.propellant_mass(1.5 - 1e-6) < 1e-5);
        assert_eq!(m.propellant_mass(1.5), 0.0);
        assert!((m.propellant_mass_flow(1.0) + 2.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_late_burn_out_keeps_the_curve() {
        let m = square_motor().with_burn_out_time(3.0).unwrap();
        assert_eq!(m.burn_out_time(), 3.0);
        assert_eq!(m.total_impulse(), 2000.0);
        assert_eq!(m.thrust(2.5), 0.0);
        assert_eq!(m.propellant_mass(2.5), 0.0);
    }

    #[test]
    fn test_burn_out_before_curve_start_is_rejected() {
        let m = ThrustCurveMotor::new(
            &[(0.5, 1000.0), (2.0, 1000.0)],
            2.0,
            0.033,
            Interpolation::Linear,
        )
        .unwrap();
        assert!(m.with_burn_out_time(0.4).is_err());
    }

    #[test]
    fn test_late_ignition_curve_keeps_full_load() {
        let m = ThrustCurveMotor::new(
            &[(0.5, 1000.0), (2.0, 1000.0)],
            2.0,
            0.033,
            Interpolation::Linear,
        )
        .unwrap();
        assert_eq!(m.thrust(0.1), 0.0);
        assert_eq!(m.propellant_mass(0.0), 2.0);
        assert_eq!(m.propellant_mass(0.1), 2.0);
        assert_eq!(m.propellant_mass(0.5), 2.0);
        assert!((m.propellant_mass(1.25) - 1.0).abs() < 1e-12);
        assert_eq!(m.propellant_mass(2.0), 0.0);
    }

    #[test]
    fn test_grain_inertia_shrinks_with_mass() {
        let grains = GrainGeometry {
            number: 5,
            separation: 0.005,
            outer_radius: 0.033,
            initial_inner_radius: 0.015,
            initial_height: 0.12,
        };
        let density = 1815.0;
        assert!((grains.volume() * density - 2.956).abs() < 1e-3);

        let m = square_motor().with_grains(grains).unwrap();
        let (lat0, ax0) = m.propellant_inertia(0.0);
        let (lat1, ax1) = m.propellant_inertia(1.0);
        assert!(lat0 > lat1 && ax0 > ax1);
        assert_eq!(m.propellant_inertia(5.0), (0.0, 0.0));
    }

    #[test]
    fn test_rejects_empty_impulse() {
        let r = ThrustCurveMotor::new(&[(0.0, 0.0), (1.0, 0.0)], 1.0, 0.03, Interpolation::Linear);
        assert!(r.is_err());
    }
}
