//! The rocket: geometry, installed surfaces, mass properties, stability.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::aero::{AeroSurface, FinSet, NoseCone, NoseKind, Tail};
use crate::aggregate::{AeroAggregate, InstalledSurface};
use crate::drag::DragCurve;
use crate::error::{ensure_positive, Error, Result};
use crate::mass::{CmInterpolation, Inertia, MassModel, MassQuery};
use crate::motor::Motor;
use crate::parachute::{Parachute, ParachuteSummary};

/// Angular separation of the rail buttons (degrees).
pub const RAIL_BUTTON_ANGULAR_POSITION: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocketParams {
    /// Body radius (m), also the aerodynamic reference radius.
    pub radius: f64,
    /// Mass without propellant (kg).
    pub mass: f64,
    /// Dry lateral moment of inertia (kg m²).
    pub inertia_i: f64,
    /// Dry axial moment of inertia (kg m²).
    pub inertia_z: f64,
    /// Nozzle exit position relative to the dry CM (m).
    pub distance_rocket_nozzle: f64,
    /// Propellant CM relative to the dry CM (m).
    pub distance_rocket_propellant: f64,
    #[serde(default)]
    pub cm_interpolation: CmInterpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RailButtons {
    /// Button positions relative to the dry CM, nose-ward button first.
    pub positions: [f64; 2],
    pub angular_position: f64,
}

impl RailButtons {
    pub fn upper(&self) -> f64 {
        self.positions[0]
    }

    pub fn lower(&self) -> f64 {
        self.positions[1]
    }

    pub fn as_tuple(&self) -> ([f64; 2], f64) {
        (self.positions, self.angular_position)
    }
}

pub struct Rocket {
    radius: f64,
    mass: MassModel,
    motor: Box<dyn Motor>,
    power_off_drag: DragCurve,
    power_on_drag: DragCurve,
    aero: AeroAggregate,
    cp_eccentricity_x: f64,
    cp_eccentricity_y: f64,
    thrust_eccentricity_x: f64,
    thrust_eccentricity_y: f64,
    rail_buttons: Option<RailButtons>,
    parachutes: Vec<Parachute>,
}

impl std::fmt::Debug for Rocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rocket")
            .field("radius", &self.radius)
            .field("mass", &self.mass)
            .field("power_off_drag", &self.power_off_drag)
            .field("power_on_drag", &self.power_on_drag)
            .field("aero", &self.aero)
            .field("cp_eccentricity_x", &self.cp_eccentricity_x)
            .field("cp_eccentricity_y", &self.cp_eccentricity_y)
            .field("thrust_eccentricity_x", &self.thrust_eccentricity_x)
            .field("thrust_eccentricity_y", &self.thrust_eccentricity_y)
            .field("rail_buttons", &self.rail_buttons)
            .field("parachutes", &self.parachutes)
            .finish_non_exhaustive()
    }
}

impl Rocket {
    pub fn new(
        params: RocketParams,
        motor: Box<dyn Motor>,
        power_off_drag: DragCurve,
        power_on_drag: DragCurve,
    ) -> Result<Self> {
        ensure_positive("rocket radius", params.radius)?;
        let mass = MassModel::new(
            params.mass,
            params.inertia_i,
            params.inertia_z,
            params.distance_rocket_nozzle,
            params.distance_rocket_propellant,
            params.cm_interpolation,
        )?;
        tracing::debug!(
            radius = params.radius,
            mass = params.mass,
            burn_out = motor.burn_out_time(),
            "rocket configured"
        );
        Ok(Self {
            radius: params.radius,
            mass,
            motor,
            power_off_drag,
            power_on_drag,
            aero: AeroAggregate::new(params.radius),
            cp_eccentricity_x: 0.0,
            cp_eccentricity_y: 0.0,
            thrust_eccentricity_x: 0.0,
            thrust_eccentricity_y: 0.0,
            rail_buttons: None,
            parachutes: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Surfaces
    // -----------------------------------------------------------------------

    pub fn add_nose(&mut self, length: f64, kind: &str, distance_to_cm: f64) -> Result<&InstalledSurface> {
        if self.aero.has_nose() {
            return Err(Error::config("the rocket already has a nose cone"));
        }
        let nose = NoseCone::new(length, NoseKind::from_name(kind), distance_to_cm)?;
        Ok(self.aero.install(AeroSurface::NoseCone(nose)))
    }

    pub fn add_fins(
        &mut self,
        count: u32,
        span: f64,
        root_chord: f64,
        tip_chord: f64,
        distance_to_cm: f64,
    ) -> Result<&InstalledSurface> {
        let fins = FinSet::new(count, span, root_chord, tip_chord, distance_to_cm)?;
        Ok(self.aero.install(AeroSurface::FinSet(fins)))
    }

    pub fn add_tail(
        &mut self,
        top_radius: f64,
        bottom_radius: f64,
        length: f64,
        distance_to_cm: f64,
    ) -> Result<&InstalledSurface> {
        let tail = Tail::new(top_radius, bottom_radius, length, distance_to_cm)?;
        Ok(self.aero.install(AeroSurface::Tail(tail)))
    }

    pub fn aerodynamic_surfaces(&self) -> &[InstalledSurface] {
        self.aero.surfaces()
    }

    pub fn cp_position(&self) -> f64 {
        self.aero.cp_position()
    }

    pub fn total_lift_coeff_der(&self) -> f64 {
        self.aero.total_lift_coeff_der()
    }

    // -----------------------------------------------------------------------
    // Mass and stability
    // -----------------------------------------------------------------------

    /// CM at `t` seconds after ignition. Times before ignition read as
    /// ignition; use [`Rocket::center_of_mass_final`] for the dry value.
    pub fn center_of_mass(&self, t: f64) -> f64 {
        self.mass.center_of_mass(self.motor.as_ref(), MassQuery::At(t))
    }

    pub fn center_of_mass_final(&self) -> f64 {
        self.mass.center_of_mass(self.motor.as_ref(), MassQuery::Final)
    }

    /// Static margin at `t` seconds after ignition. A negative `t` is
    /// clamped to ignition, not read as "after burn-out": the burn-out
    /// margin is [`Rocket::static_margin_final`].
    pub fn static_margin(&self, t: f64) -> f64 {
        self.static_margin_for(MassQuery::At(t))
    }

    pub fn static_margin_final(&self) -> f64 {
        self.static_margin_for(MassQuery::Final)
    }

    /// `(CM − CP) / (2R)`; zero when no lifting surface is installed.
    pub fn static_margin_for(&self, q: MassQuery) -> f64 {
        if self.aero.is_empty() {
            return 0.0;
        }
        let cm = self.mass.center_of_mass(self.motor.as_ref(), q);
        (cm - self.cp_position()) / (2.0 * self.radius)
    }

    pub fn total_mass(&self, t: f64) -> f64 {
        self.mass.total_mass(self.motor.as_ref(), MassQuery::At(t))
    }

    pub fn reduced_mass(&self, t: f64) -> f64 {
        self.mass.reduced_mass(self.motor.as_ref(), MassQuery::At(t))
    }

    pub fn inertia(&self, t: f64) -> Inertia {
        self.mass.inertia(self.motor.as_ref(), MassQuery::At(t))
    }

    pub fn mass_model(&self) -> &MassModel {
        &self.mass
    }

    pub fn dry_mass(&self) -> f64 {
        self.mass.dry_mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Aerodynamic reference area.
    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    pub fn motor(&self) -> &dyn Motor {
        self.motor.as_ref()
    }

    pub fn drag_coefficient(&self, mach: f64, powered: bool) -> f64 {
        if powered {
            self.power_on_drag.drag_coefficient(mach)
        } else {
            self.power_off_drag.drag_coefficient(mach)
        }
    }

    // -----------------------------------------------------------------------
    // Eccentricities and rail buttons
    // -----------------------------------------------------------------------

    /// Model a CM offset by moving both the CP and the thrust line the
    /// opposite way.
    pub fn add_cm_eccentricity(&mut self, x: f64, y: f64) -> &mut Self {
        self.cp_eccentricity_x = -x;
        self.cp_eccentricity_y = -y;
        self.thrust_eccentricity_y = -x;
        self.thrust_eccentricity_x = -y;
        self
    }

    pub fn add_thrust_eccentricity(&mut self, x: f64, y: f64) -> &mut Self {
        self.thrust_eccentricity_y = x;
        self.thrust_eccentricity_x = y;
        self
    }

    pub fn add_cp_eccentricity(&mut self, x: f64, y: f64) -> &mut Self {
        self.cp_eccentricity_x = x;
        self.cp_eccentricity_y = y;
        self
    }

    pub fn cp_eccentricity_x(&self) -> f64 {
        self.cp_eccentricity_x
    }

    pub fn cp_eccentricity_y(&self) -> f64 {
        self.cp_eccentricity_y
    }

    pub fn thrust_eccentricity_x(&self) -> f64 {
        self.thrust_eccentricity_x
    }

    pub fn thrust_eccentricity_y(&self) -> f64 {
        self.thrust_eccentricity_y
    }

    /// Store the two rail-button positions, nose-ward button first.
    pub fn set_rail_buttons(&mut self, distances: [f64; 2]) -> Result<RailButtons> {
        let [a, b] = distances;
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::config("rail button positions must be finite"));
        }
        let buttons = RailButtons {
            positions: if a < b { [b, a] } else { [a, b] },
            angular_position: RAIL_BUTTON_ANGULAR_POSITION,
        };
        self.rail_buttons = Some(buttons);
        Ok(buttons)
    }

    pub fn rail_buttons(&self) -> Option<RailButtons> {
        self.rail_buttons
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    pub fn add_parachute(&mut self, parachute: Parachute) -> Result<&Parachute> {
        if self.parachutes.iter().any(|p| p.name == parachute.name) {
            return Err(Error::config(format!(
                "a parachute named '{}' already exists",
                parachute.name
            )));
        }
        self.parachutes.push(parachute);
        Ok(&self.parachutes[self.parachutes.len() - 1])
    }

    pub fn parachutes(&self) -> &[Parachute] {
        &self.parachutes
    }

    pub fn summary(&self) -> RocketSummary {
        let motor = self.motor();
        RocketSummary {
            radius: self.radius,
            reference_area: self.area(),
            dry_mass: self.mass.dry_mass,
            wet_mass: self.total_mass(0.0),
            inertia_initial: self.inertia(0.0),
            inertia_final: self.mass.inertia(motor, MassQuery::Final),
            burn_out_time: motor.burn_out_time(),
            total_impulse: motor.total_impulse(),
            center_of_mass_initial: self.center_of_mass(0.0),
            center_of_mass_final: self.center_of_mass_final(),
            cp_position: self.cp_position(),
            total_lift_coeff_der: self.total_lift_coeff_der(),
            static_margin_initial: self.static_margin(0.0),
            static_margin_final: self.static_margin_final(),
            surfaces: self.aero.surfaces().to_vec(),
            cp_eccentricity: [self.cp_eccentricity_x, self.cp_eccentricity_y],
            thrust_eccentricity: [self.thrust_eccentricity_x, self.thrust_eccentricity_y],
            rail_buttons: self.rail_buttons,
            parachutes: self.parachutes.iter().map(ParachuteSummary::from).collect(),
        }
    }
}

/// Read-only report of the configured rocket.
#[derive(Debug, Clone, Serialize)]
pub struct RocketSummary {
    pub radius: f64,
    pub reference_area: f64,
    pub dry_mass: f64,
    pub wet_mass: f64,
    pub inertia_initial: Inertia,
    pub inertia_final: Inertia,
    pub burn_out_time: f64,
    pub total_impulse: f64,
    pub center_of_mass_initial: f64,
    pub center_of_mass_final: f64,
    pub cp_position: f64,
    pub total_lift_coeff_der: f64,
    pub static_margin_initial: f64,
    pub static_margin_final: f64,
    pub surfaces: Vec<InstalledSurface>,
    pub cp_eccentricity: [f64; 2],
    pub thrust_eccentricity: [f64; 2],
    pub rail_buttons: Option<RailButtons>,
    pub parachutes: Vec<ParachuteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::ThrustCurveMotor;
    use crate::parachute::{NoiseSpec, Trigger};
    use crate::table::Interpolation;

    fn motor(scale: f64) -> Box<dyn Motor> {
        Box::new(
            ThrustCurveMotor::new(
                &[(0.0, 0.0), (0.1, 2000.0), (3.0, 1700.0), (3.9, 0.0)],
                2.956,
                0.033 * scale,
                Interpolation::Linear,
            )
            .unwrap(),
        )
    }

    /// Calisto-like rocket with every length multiplied by `m`.
    fn rocket_in(m: f64) -> Rocket {
        Rocket::new(
            RocketParams {
                radius: 0.0635 * m,
                mass: 16.241,
                inertia_i: 6.60 * m * m,
                inertia_z: 0.0351 * m * m,
                distance_rocket_nozzle: -1.255 * m,
                distance_rocket_propellant: -0.85704 * m,
                cm_interpolation: CmInterpolation::default(),
            },
            motor(m),
            DragCurve::constant(0.5),
            DragCurve::constant(0.45),
        )
        .unwrap()
    }

    fn rocket() -> Rocket {
        rocket_in(1.0)
    }

    fn rel_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1e-300)
    }

    #[test]
    fn test_bare_rocket_has_no_margin() {
        let r = rocket();
        assert_eq!(r.total_lift_coeff_der(), 0.0);
        assert_eq!(r.cp_position(), 0.0);
        for t in [0.0, 1.0, 3.9, 50.0] {
            assert_eq!(r.static_margin(t), 0.0);
        }
        assert_eq!(r.static_margin_final(), 0.0);
    }

    #[test]
    fn test_nose_static_margin_matches_closed_form() {
        let cases = [
            (1.0 - 1.0 / 3.0, "conical"),
            (1.0 - 0.534, "ogive"),
            (1.0 - 0.437, "lvhaack"),
            (0.5, "default"),
            (0.5, "not a mapped string, to show default case"),
        ];
        for m in [1.0, 1000.0] {
            for (k, kind) in cases {
                let mut r = rocket_in(m);
                r.add_nose(0.55829 * m, kind, 0.71971 * m).unwrap();
                let cpz = (0.71971 + k * 0.55829) * m;

                let initial = (r.center_of_mass(0.0) - cpz) / (2.0 * r.radius());
                let fin = (r.center_of_mass_final() - cpz) / (2.0 * r.radius());
                assert!(rel_eq(initial, r.static_margin(0.0)), "{kind} at scale {m}");
                assert!(rel_eq(fin, r.static_margin_final()), "{kind} at scale {m}");
                assert!(rel_eq(r.total_lift_coeff_der(), 2.0));
                assert!(rel_eq(r.cp_position(), cpz));
            }
        }
    }

    #[test]
    fn test_margin_is_unit_independent() {
        let mut metres = rocket_in(1.0);
        let mut millimetres = rocket_in(1000.0);
        for (r, m) in [(&mut metres, 1.0), (&mut millimetres, 1000.0)] {
            r.add_nose(0.55829 * m, "ogive", 0.71971 * m).unwrap();
            r.add_fins(4, 0.1 * m, 0.12 * m, 0.04 * m, -1.04956 * m).unwrap();
        }
        assert!((metres.static_margin(0.0) - millimetres.static_margin(0.0)).abs() < 1e-9);
        assert!((metres.static_margin_final() - millimetres.static_margin_final()).abs() < 1e-9);
    }

    #[test]
    fn test_tail_static_margin() {
        let mut r = rocket();
        r.add_tail(0.0635, 0.0435, 0.060, -1.194656).unwrap();

        let ratio: f64 = 0.0635 / 0.0435;
        let clalpha = -2.0 * (1.0 - ratio.powi(-2)) * (0.0635 / r.radius()).powi(2);
        let cpz = -1.194656 - (0.06 / 3.0) * (1.0 + (1.0 - ratio) / (1.0 - ratio * ratio));

        let initial = (r.center_of_mass(0.0) - cpz) / (2.0 * r.radius());
        assert!(rel_eq(initial, r.static_margin(0.0)));
        let fin = (r.center_of_mass_final() - cpz) / (2.0 * r.radius());
        assert!(rel_eq(fin, r.static_margin_final()));
        assert!((clalpha.abs() - r.total_lift_coeff_der().abs()).abs() < 1e-8);
        assert_eq!(r.cp_position(), cpz);
    }

    #[test]
    fn test_fins_static_margin() {
        let mut r = rocket();
        r.add_fins(4, 0.100, 0.120, 0.040, -1.04956).unwrap();

        let cpz = -1.04956
            - (((0.120 - 0.040) / 3.0) * ((0.120 + 2.0 * 0.040) / (0.120 + 0.040))
                + (1.0 / 6.0) * (0.120 + 0.040 - 0.120 * 0.040 / (0.120 + 0.040)));
        let initial = (r.center_of_mass(0.0) - cpz) / (2.0 * r.radius());
        assert!(rel_eq(initial, r.static_margin(0.0)));
        assert!(rel_eq(r.cp_position(), cpz));
        assert!(r.static_margin(0.0) > 0.0);
    }

    #[test]
    fn test_each_add_refreshes_the_margin() {
        let mut r = rocket();
        r.add_nose(0.55829, "vonKarman", 0.71971).unwrap();
        let nose_only = r.static_margin(0.0);
        r.add_fins(4, 0.1, 0.12, 0.04, -1.04956).unwrap();
        let with_fins = r.static_margin(0.0);
        r.add_tail(0.0635, 0.0435, 0.06, -1.194656).unwrap();
        let with_tail = r.static_margin(0.0);

        assert!(nose_only < 0.0, "a nose alone is unstable");
        assert!(with_fins > 1.0);
        assert!(with_tail < with_fins, "a boat tail costs margin");
        // Propellant sits aft, so burning it moves the CM forward.
        assert!(r.static_margin_final() > r.static_margin(0.0));
        assert_eq!(r.aerodynamic_surfaces().len(), 3);
    }

    #[test]
    fn test_negative_time_reads_as_ignition() {
        let mut r = rocket();
        r.add_fins(4, 0.1, 0.12, 0.04, -1.04956).unwrap();
        assert_eq!(r.center_of_mass(-1.0), r.center_of_mass(0.0));
        assert_eq!(r.static_margin(-1.0), r.static_margin(0.0));
        assert!(r.static_margin(-1.0) != r.static_margin_final());
    }

    #[test]
    fn test_second_nose_is_rejected() {
        let mut r = rocket();
        r.add_nose(0.5, "ogive", 0.7).unwrap();
        assert!(matches!(
            r.add_nose(0.5, "ogive", 0.7),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_non_positive_radius_is_rejected() {
        let params = RocketParams {
            radius: 0.0,
            mass: 10.0,
            inertia_i: 1.0,
            inertia_z: 0.1,
            distance_rocket_nozzle: -1.0,
            distance_rocket_propellant: -0.5,
            cm_interpolation: CmInterpolation::Barycentric,
        };
        let r = Rocket::new(params, motor(1.0), DragCurve::constant(0.5), DragCurve::constant(0.5));
        assert!(matches!(r, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_cm_eccentricity() {
        let mut r = rocket();
        r.add_cm_eccentricity(4.0, 5.0);
        assert_eq!(r.cp_eccentricity_x(), -4.0);
        assert_eq!(r.cp_eccentricity_y(), -5.0);
        assert_eq!(r.thrust_eccentricity_y(), -4.0);
        assert_eq!(r.thrust_eccentricity_x(), -5.0);
    }

    #[test]
    fn test_thrust_eccentricity() {
        let mut r = rocket();
        r.add_thrust_eccentricity(4.0, 5.0);
        assert_eq!(r.thrust_eccentricity_y(), 4.0);
        assert_eq!(r.thrust_eccentricity_x(), 5.0);
    }

    #[test]
    fn test_cp_eccentricity_overwrites() {
        let mut r = rocket();
        r.add_cm_eccentricity(1.0, 2.0).add_cp_eccentricity(4.0, 5.0);
        assert_eq!(r.cp_eccentricity_x(), 4.0);
        assert_eq!(r.cp_eccentricity_y(), 5.0);
        // Thrust eccentricity from the CM call is untouched.
        assert_eq!(r.thrust_eccentricity_x(), -2.0);
    }

    #[test]
    fn test_rail_buttons_order() {
        let mut r = rocket();
        assert_eq!(r.set_rail_buttons([-0.5, 0.2]).unwrap().as_tuple(), ([0.2, -0.5], 45.0));
        assert_eq!(r.set_rail_buttons([0.2, -0.5]).unwrap().as_tuple(), ([0.2, -0.5], 45.0));
        assert_eq!(r.rail_buttons().map(|b| b.upper()), Some(0.2));
    }

    #[test]
    fn test_duplicate_parachute_names() {
        let mut r = rocket();
        let noise = NoiseSpec::default();
        r.add_parachute(Parachute::new("Drogue", 1.0, Trigger::apogee(), 105.0, 1.5, noise).unwrap())
            .unwrap();
        let again = Parachute::new("Drogue", 2.0, Trigger::apogee(), 105.0, 1.5, noise).unwrap();
        assert!(r.add_parachute(again).is_err());
        assert_eq!(r.parachutes().len(), 1);
    }

    #[test]
    fn test_summary_reports_aggregates() {
        let mut r = rocket();
        r.add_nose(0.55829, "ogive", 0.71971).unwrap();
        r.add_fins(4, 0.1, 0.12, 0.04, -1.04956).unwrap();
        let s = r.summary();
        assert_eq!(s.cp_position, r.cp_position());
        assert_eq!(s.static_margin_initial, r.static_margin(0.0));
        assert_eq!(s.surfaces.len(), 2);
        assert!((s.wet_mass - (16.241 + 2.956)).abs() < 1e-12);
    }
}
