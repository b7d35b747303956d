//! The 13-element flight state vector.
//!
//! Layout (fixed, shared with trigger predicates):
//!
//! | index | field | meaning                                   |
//! |-------|-------|-------------------------------------------|
//! | 0..3  | x y z | position, east / north / up (m)           |
//! | 3..6  | vx vy vz | velocity in the launch frame (m/s)     |
//! | 6..10 | e0 e1 e2 e3 | attitude quaternion, scalar first   |
//! | 10..13| w1 w2 w3 | body angular rates (rad/s)             |
//!
//! Body axis 3 points from the nozzle towards the nose.

use nalgebra::{Matrix3, Quaternion, SVector, UnitQuaternion, Vector3};
use serde::Serialize;

pub const STATE_LEN: usize = 13;

pub const X: usize = 0;
pub const Y: usize = 1;
pub const Z: usize = 2;
pub const VX: usize = 3;
pub const VY: usize = 4;
pub const VZ: usize = 5;
pub const E0: usize = 6;
pub const E1: usize = 7;
pub const E2: usize = 8;
pub const E3: usize = 9;
pub const W1: usize = 10;
pub const W2: usize = 11;
pub const W3: usize = 12;

pub type StateVector = SVector<f64, STATE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlightState(pub [f64; STATE_LEN]);

impl FlightState {
    /// Rocket at rest at the origin with the given attitude.
    pub fn at_rest(attitude: UnitQuaternion<f64>) -> Self {
        let q = attitude.quaternion();
        let mut s = [0.0; STATE_LEN];
        s[E0] = q.w;
        s[E1] = q.i;
        s[E2] = q.j;
        s[E3] = q.k;
        Self(s)
    }

    pub fn from_vector(v: &StateVector) -> Self {
        let mut s = [0.0; STATE_LEN];
        s.copy_from_slice(v.as_slice());
        Self(s)
    }

    pub fn to_vector(&self) -> StateVector {
        StateVector::from_column_slice(&self.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.0[X], self.0[Y], self.0[Z])
    }

    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.0[VX], self.0[VY], self.0[VZ])
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        Vector3::new(self.0[W1], self.0[W2], self.0[W3])
    }

    pub fn altitude(&self) -> f64 {
        self.0[Z]
    }

    pub fn vertical_velocity(&self) -> f64 {
        self.0[VZ]
    }

    pub fn speed(&self) -> f64 {
        self.velocity().norm()
    }

    /// Attitude as a unit quaternion (renormalised).
    pub fn attitude(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(Quaternion::new(
            self.0[E0], self.0[E1], self.0[E2], self.0[E3],
        ))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl std::ops::Index<usize> for FlightState {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Body (1,2,3) to launch frame (x,y,z) rotation built from raw Euler
/// parameters. The parameters are used as-is so the derivative stays
/// smooth between renormalisations.
pub fn body_to_world(e0: f64, e1: f64, e2: f64, e3: f64) -> Matrix3<f64> {
    Matrix3::new(
        1.0 - 2.0 * (e2 * e2 + e3 * e3),
        2.0 * (e1 * e2 - e0 * e3),
        2.0 * (e1 * e3 + e0 * e2),
        2.0 * (e1 * e2 + e0 * e3),
        1.0 - 2.0 * (e1 * e1 + e3 * e3),
        2.0 * (e2 * e3 - e0 * e1),
        2.0 * (e1 * e3 - e0 * e2),
        2.0 * (e2 * e3 + e0 * e1),
        1.0 - 2.0 * (e1 * e1 + e2 * e2),
    )
}

/// Attitude of a rocket on a rail with the given inclination from the
/// horizontal and heading from north, both in degrees.
pub fn launch_attitude(inclination_deg: f64, heading_deg: f64) -> UnitQuaternion<f64> {
    let psi = -heading_deg.to_radians();
    let theta = (inclination_deg - 90.0).to_radians();
    UnitQuaternion::from_quaternion(Quaternion::new(
        (psi / 2.0).cos() * (theta / 2.0).cos(),
        (psi / 2.0).cos() * (theta / 2.0).sin(),
        (psi / 2.0).sin() * (theta / 2.0).sin(),
        (psi / 2.0).sin() * (theta / 2.0).cos(),
    ))
}
