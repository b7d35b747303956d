use apogee_core::environment::Environment;
use apogee_core::rocket::Rocket;
use apogee_core::state::{body_to_world, StateVector, E0, E1, E2, E3, VX, VY, VZ, W1, W2, W3, Z};
use nalgebra::{Matrix3, Vector3};

use crate::ode::OdeSystem;

// ---------------------------------------------------------------------------
// Force Models
// ---------------------------------------------------------------------------

/// Equations of motion for one flight regime.
pub enum Dynamics<'a> {
    /// Constrained to the rail: one translational degree of freedom.
    Rail(Regime<'a>),
    /// Free 6-DoF flight.
    Free(Regime<'a>),
    /// Point mass under canopy; attitude is frozen.
    Parachute { regime: Regime<'a>, cd_s: f64 },
}

/// Borrowed models shared by every regime.
#[derive(Clone, Copy)]
pub struct Regime<'a> {
    pub rocket: &'a Rocket,
    pub env: &'a dyn Environment,
}

/// Quantities of the air around the rocket at one instant.
struct Freestream {
    rho: f64,
    /// Air velocity relative to the rocket, launch frame.
    stream: Vector3<f64>,
    speed: f64,
}

impl<'a> Regime<'a> {
    fn freestream(&self, t: f64, y: &StateVector) -> Freestream {
        let z = y[Z];
        let (wind_e, wind_n) = self.env.wind(z, t);
        let stream = Vector3::new(wind_e - y[VX], wind_n - y[VY], -y[VZ]);
        Freestream {
            rho: self.env.air_density(z),
            speed: stream.norm(),
            stream,
        }
    }

    fn drag_coefficient(&self, t: f64, speed: f64, z: f64) -> f64 {
        let mach = speed / self.env.speed_of_sound(z);
        let powered = t < self.rocket.motor().burn_out_time();
        self.rocket.drag_coefficient(mach, powered)
    }

    /// Axial aerodynamic force along body axis 3 (negative: drag).
    fn axial_force(&self, t: f64, y: &StateVector, air: &Freestream) -> f64 {
        let cd = self.drag_coefficient(t, air.speed, y[Z]);
        -0.5 * air.rho * air.speed * air.speed * self.rocket.area() * cd
    }

    fn rail(&self, t: f64, y: &StateVector) -> StateVector {
        let (e0, e1, e2, e3) = (y[E0], y[E1], y[E2], y[E3]);
        let air = self.freestream(t, y);

        let mass = self.rocket.total_mass(t);
        let thrust = self.rocket.motor().thrust(t);
        let r3 = self.axial_force(t, y, &air);
        let g = self.env.gravity(y[Z]);

        // Acceleration along the rail; the rail holds the rocket back.
        let mut a3 = (r3 + thrust) / mass - (e0 * e0 - e1 * e1 - e2 * e2 + e3 * e3) * g;
        if a3 < 0.0 {
            a3 = 0.0;
        }
        let k = body_to_world(e0, e1, e2, e3);
        let a = k.column(2) * a3;

        let mut dy = StateVector::zeros();
        dy[0] = y[VX];
        dy[1] = y[VY];
        dy[2] = y[VZ];
        dy[VX] = a.x;
        dy[VY] = a.y;
        dy[VZ] = a.z;
        dy
    }

    fn free(&self, t: f64, y: &StateVector) -> StateVector {
        let rocket = self.rocket;
        let (e0, e1, e2, e3) = (y[E0], y[E1], y[E2], y[E3]);
        let omega = Vector3::new(y[W1], y[W2], y[W3]);
        let k = body_to_world(e0, e1, e2, e3);
        let kt = k.transpose();

        let mass = rocket.total_mass(t);
        let inertia = rocket.inertia(t);
        let thrust = rocket.motor().thrust(t);

        let mut force = Vector3::<f64>::zeros();
        let mut moment = Vector3::<f64>::zeros();

        // Thrust and its offset from the axis.
        force.z += thrust;
        moment.x += rocket.thrust_eccentricity_x() * thrust;
        moment.y -= rocket.thrust_eccentricity_y() * thrust;

        // Drag, applied at an eccentric CP. It opposes the axial part of the
        // motion, so a rocket falling tail first is slowed as well.
        let air = self.freestream(t, y);
        let stream_body = kt * air.stream;
        let cd = self.drag_coefficient(t, air.speed, y[Z]);
        let r3 = 0.5 * air.rho * air.speed * rocket.area() * cd * stream_body.z;
        force.z += r3;
        moment.x += rocket.cp_eccentricity_y() * r3;
        moment.y -= rocket.cp_eccentricity_x() * r3;

        // Normal force at the CP from the aggregate lift slope.
        let cl_alpha = rocket.total_lift_coeff_der();
        if cl_alpha != 0.0 {
            let arm = rocket.cp_position() - rocket.center_of_mass(t);
            // Air seen by the CP, body frame. The rotation term damps pitch.
            let stream_b = stream_body - omega.cross(&Vector3::new(0.0, 0.0, arm));
            let lateral = stream_b.x.hypot(stream_b.y);
            let speed = stream_b.norm();
            if lateral > 0.0 && speed > 0.0 {
                let attack_angle = (-stream_b.z / speed).clamp(-1.0, 1.0).acos();
                let lift = 0.5 * air.rho * speed * speed * rocket.area() * cl_alpha * attack_angle;
                let lift_x = lift * stream_b.x / lateral;
                let lift_y = lift * stream_b.y / lateral;
                force.x += lift_x;
                force.y += lift_y;
                moment.x -= arm * lift_y;
                moment.y += arm * lift_x;
            }
        }

        // Rotation: I ω' = M − ω × (I ω)
        let i_mat = Matrix3::from_diagonal(&Vector3::new(
            inertia.lateral,
            inertia.lateral,
            inertia.axial,
        ));
        let i_inv = Matrix3::from_diagonal(&Vector3::new(
            1.0 / inertia.lateral,
            1.0 / inertia.lateral,
            1.0 / inertia.axial,
        ));
        let gyroscopic = omega.cross(&(i_mat * omega));
        let alpha = i_inv * (moment - gyroscopic);

        // Translation in the launch frame.
        let mut accel = k * (force / mass);
        accel.z -= self.env.gravity(y[Z]);

        let (w1, w2, w3) = (omega.x, omega.y, omega.z);
        let mut dy = StateVector::zeros();
        dy[0] = y[VX];
        dy[1] = y[VY];
        dy[2] = y[VZ];
        dy[VX] = accel.x;
        dy[VY] = accel.y;
        dy[VZ] = accel.z;
        dy[E0] = 0.5 * (-w1 * e1 - w2 * e2 - w3 * e3);
        dy[E1] = 0.5 * (w1 * e0 + w3 * e2 - w2 * e3);
        dy[E2] = 0.5 * (w2 * e0 - w3 * e1 + w1 * e3);
        dy[E3] = 0.5 * (w3 * e0 + w2 * e1 - w1 * e2);
        dy[W1] = alpha.x;
        dy[W2] = alpha.y;
        dy[W3] = alpha.z;
        dy
    }

    fn parachute(&self, t: f64, y: &StateVector, cd_s: f64) -> StateVector {
        let air = self.freestream(t, y);
        let mass = self.rocket.total_mass(t);

        // Drag opposes the velocity relative to the air.
        let drag = air.stream * (0.5 * air.rho * cd_s * air.speed);
        let mut accel = drag / mass;
        accel.z -= self.env.gravity(y[Z]);

        let mut dy = StateVector::zeros();
        dy[0] = y[VX];
        dy[1] = y[VY];
        dy[2] = y[VZ];
        dy[VX] = accel.x;
        dy[VY] = accel.y;
        dy[VZ] = accel.z;
        dy
    }
}

impl<'a> OdeSystem<13> for Dynamics<'a> {
    fn rhs(&self, t: f64, y: &StateVector) -> StateVector {
        match self {
            Dynamics::Rail(r) => r.rail(t, y),
            Dynamics::Free(r) => r.free(t, y),
            Dynamics::Parachute { regime, cd_s } => regime.parachute(t, y, *cd_s),
        }
    }
}
