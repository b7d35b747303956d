//! JSON description of a rocket and its flight.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use apogee_core::{
    DragCurve, GrainGeometry, Interpolation, NoiseSpec, Parachute, Rocket, RocketParams,
    StandardAtmosphere, ThrustCurveMotor, Trigger,
};
use apogee_sim::FlightConfig;
use serde::Deserialize;

use crate::io::{read_drag_csv, read_eng};

#[derive(Debug, Clone, Deserialize)]
pub struct RocketConfig {
    pub rocket: RocketParams,
    pub motor: MotorConfig,
    pub power_off_drag: DragSource,
    pub power_on_drag: DragSource,
    /// Interpolation of thrust and drag tables: "linear" or "spline".
    #[serde(default)]
    pub interpolation: Option<String>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceConfig>,
    #[serde(default)]
    pub cm_eccentricity: Option<[f64; 2]>,
    #[serde(default)]
    pub thrust_eccentricity: Option<[f64; 2]>,
    #[serde(default)]
    pub cp_eccentricity: Option<[f64; 2]>,
    #[serde(default)]
    pub rail_buttons: Option<[f64; 2]>,
    #[serde(default)]
    pub parachutes: Vec<ParachuteConfig>,
    #[serde(default)]
    pub environment: StandardAtmosphere,
    #[serde(default)]
    pub flight: FlightConfig,

    /// Directory that relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    pub thrust: ThrustSource,
    #[serde(default)]
    pub propellant_mass: Option<f64>,
    /// Used with `grains` when no propellant mass is given (kg/m³).
    #[serde(default)]
    pub grain_density: Option<f64>,
    pub nozzle_radius: f64,
    #[serde(default)]
    pub burn_out_time: Option<f64>,
    #[serde(default)]
    pub grains: Option<GrainGeometry>,
}

/// A RASP `.eng` file or inline `(time, thrust)` points.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThrustSource {
    File(PathBuf),
    Points(Vec<(f64, f64)>),
}

/// A constant Cd, inline `(mach, cd)` points, or a CSV file of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DragSource {
    Constant(f64),
    Points(Vec<(f64, f64)>),
    File(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceConfig {
    Nose {
        length: f64,
        kind: String,
        distance_to_cm: f64,
    },
    Fins {
        count: u32,
        span: f64,
        root_chord: f64,
        tip_chord: f64,
        distance_to_cm: f64,
    },
    Tail {
        top_radius: f64,
        bottom_radius: f64,
        length: f64,
        distance_to_cm: f64,
    },
}

/// Declarative trigger. Both kinds only fire while descending.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerConfig {
    Apogee,
    AltitudeBelow(f64),
}

impl TriggerConfig {
    pub fn build(self) -> Trigger {
        match self {
            TriggerConfig::Apogee => Trigger::apogee(),
            TriggerConfig::AltitudeBelow(h) => Trigger::descending_below(h),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParachuteConfig {
    pub name: String,
    pub cd_s: f64,
    pub trigger: TriggerConfig,
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    #[serde(default)]
    pub lag: f64,
    #[serde(default)]
    pub noise: NoiseSpec,
}

fn default_sampling_rate() -> f64 {
    100.0
}

impl RocketConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading rocket configuration {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&text, base_dir)
            .with_context(|| format!("parsing rocket configuration {}", path.display()))
    }

    pub fn from_json(text: &str, base_dir: PathBuf) -> Result<Self> {
        let mut config: RocketConfig = serde_json::from_str(text)?;
        config.base_dir = base_dir;
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn interpolation(&self) -> Result<Interpolation> {
        match &self.interpolation {
            Some(name) => Ok(Interpolation::from_name(name)?),
            None => Ok(Interpolation::default()),
        }
    }

    fn build_motor(&self, interpolation: Interpolation) -> Result<ThrustCurveMotor> {
        let m = &self.motor;
        let (points, eng_mass) = match &m.thrust {
            ThrustSource::Points(points) => (points.clone(), None),
            ThrustSource::File(path) => {
                let eng = read_eng(&self.resolve(path))?;
                tracing::debug!(motor = %eng.name, points = eng.points.len(), "loaded thrust curve");
                (eng.points, Some(eng.propellant_mass))
            }
        };

        let propellant_mass = match (m.propellant_mass, m.grain_density, &m.grains, eng_mass) {
            (Some(mass), ..) => mass,
            (None, Some(density), Some(grains), _) => density * grains.volume(),
            (None, _, _, Some(mass)) => mass,
            _ => bail!("motor needs a propellant mass, grains with a density, or an .eng file"),
        };

        let mut motor =
            ThrustCurveMotor::new(&points, propellant_mass, m.nozzle_radius, interpolation)?;
        if let Some(t) = m.burn_out_time {
            motor = motor.with_burn_out_time(t)?;
        }
        if let Some(grains) = m.grains {
            motor = motor.with_grains(grains)?;
        }
        Ok(motor)
    }

    fn build_drag(&self, source: &DragSource, interpolation: Interpolation) -> Result<DragCurve> {
        Ok(match source {
            DragSource::Constant(cd) => DragCurve::constant(*cd),
            DragSource::Points(points) => DragCurve::from_points(points, interpolation)?,
            DragSource::File(path) => {
                let points = read_drag_csv(&self.resolve(path))?;
                DragCurve::from_points(&points, interpolation)?
            }
        })
    }

    /// Assemble the rocket: motor, drag curves, surfaces, offsets and chutes.
    pub fn build_rocket(&self) -> Result<Rocket> {
        let interpolation = self.interpolation()?;
        let motor = self.build_motor(interpolation)?;
        let power_off = self
            .build_drag(&self.power_off_drag, interpolation)
            .context("power-off drag curve")?;
        let power_on = self
            .build_drag(&self.power_on_drag, interpolation)
            .context("power-on drag curve")?;

        let mut rocket = Rocket::new(self.rocket, Box::new(motor), power_off, power_on)?;

        for surface in &self.surfaces {
            match surface {
                SurfaceConfig::Nose {
                    length,
                    kind,
                    distance_to_cm,
                } => rocket.add_nose(*length, kind, *distance_to_cm)?,
                SurfaceConfig::Fins {
                    count,
                    span,
                    root_chord,
                    tip_chord,
                    distance_to_cm,
                } => rocket.add_fins(*count, *span, *root_chord, *tip_chord, *distance_to_cm)?,
                SurfaceConfig::Tail {
                    top_radius,
                    bottom_radius,
                    length,
                    distance_to_cm,
                } => rocket.add_tail(*top_radius, *bottom_radius, *length, *distance_to_cm)?,
            };
        }

        if let Some([x, y]) = self.cm_eccentricity {
            rocket.add_cm_eccentricity(x, y);
        }
        if let Some([x, y]) = self.thrust_eccentricity {
            rocket.add_thrust_eccentricity(x, y);
        }
        if let Some([x, y]) = self.cp_eccentricity {
            rocket.add_cp_eccentricity(x, y);
        }
        if let Some(buttons) = self.rail_buttons {
            rocket.set_rail_buttons(buttons)?;
        }

        for chute in &self.parachutes {
            let parachute = Parachute::new(
                chute.name.clone(),
                chute.cd_s,
                chute.trigger.build(),
                chute.sampling_rate,
                chute.lag,
                chute.noise,
            )?;
            rocket.add_parachute(parachute)?;
        }

        Ok(rocket)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CALISTO: &str = r#"{
        "rocket": {
            "radius": 0.0635,
            "mass": 16.241,
            "inertia_i": 6.60,
            "inertia_z": 0.0351,
            "distance_rocket_nozzle": -1.255,
            "distance_rocket_propellant": -0.85704
        },
        "motor": {
            "thrust": [[0.0, 0.0], [0.1, 2000.0], [3.0, 1700.0], [3.4, 350.0], [3.9, 0.0]],
            "grain_density": 1815.0,
            "grains": {
                "number": 5,
                "separation": 0.005,
                "outer_radius": 0.033,
                "initial_inner_radius": 0.015,
                "initial_height": 0.12
            },
            "nozzle_radius": 0.033
        },
        "power_off_drag": [[0.0, 0.45], [1.0, 0.65], [2.0, 0.5]],
        "power_on_drag": 0.4,
        "surfaces": [
            {"type": "nose", "length": 0.55829, "kind": "vonKarman", "distance_to_cm": 0.71971},
            {"type": "fins", "count": 4, "span": 0.1, "root_chord": 0.12, "tip_chord": 0.04, "distance_to_cm": -1.04956},
            {"type": "tail", "top_radius": 0.0635, "bottom_radius": 0.0435, "length": 0.06, "distance_to_cm": -1.194656}
        ],
        "rail_buttons": [-0.5, 0.2],
        "parachutes": [
            {"name": "Main", "cd_s": 10.0, "trigger": {"altitude_below": 800.0}, "sampling_rate": 105.0, "lag": 1.5,
             "noise": {"mean": 0.0, "std_dev": 8.3, "time_correlation": 0.5}},
            {"name": "Drogue", "cd_s": 1.0, "trigger": "apogee", "sampling_rate": 105.0, "lag": 1.5}
        ],
        "flight": {"inclination": 84.0}
    }"#;

    #[test]
    fn test_builds_rocket_from_json() {
        let config = RocketConfig::from_json(CALISTO, PathBuf::new()).unwrap();
        let rocket = config.build_rocket().unwrap();

        assert_eq!(rocket.aerodynamic_surfaces().len(), 3);
        assert_eq!(rocket.parachutes().len(), 2);
        assert_eq!(rocket.rail_buttons().map(|b| b.as_tuple()), Some(([0.2, -0.5], 45.0)));
        assert!(rocket.static_margin(0.0) > 1.5);
        // 5 grains of 0.12 m, 15-33 mm radius, at 1815 kg/m³.
        let grain_mass = rocket.total_mass(0.0) - 16.241;
        assert!((grain_mass - 2.956).abs() < 0.01, "{grain_mass}");

        assert_eq!(config.flight.inclination, 84.0);
        assert_eq!(config.flight.rail_length, 5.2);
        assert_eq!(config.environment, StandardAtmosphere::default());
    }

    #[test]
    fn test_trigger_spellings() {
        let apogee: TriggerConfig = serde_json::from_str(r#""apogee""#).unwrap();
        let below: TriggerConfig = serde_json::from_str(r#"{"altitude_below": 450}"#).unwrap();
        assert_eq!(apogee, TriggerConfig::Apogee);
        assert_eq!(below, TriggerConfig::AltitudeBelow(450.0));
        assert!(serde_json::from_str::<TriggerConfig>(r#""timer""#).is_err());
    }

    #[test]
    fn test_unknown_interpolation_is_an_error() {
        let text = CALISTO.replacen("\"surfaces\"", "\"interpolation\": \"akima\", \"surfaces\"", 1);
        let config = RocketConfig::from_json(&text, PathBuf::new()).unwrap();
        let err = config.build_rocket().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<apogee_core::Error>(),
            Some(apogee_core::Error::UnknownInterpolation(name)) if name == "akima"
        ));
    }

    #[test]
    fn test_missing_propellant_mass() {
        let text = CALISTO.replacen("\"grain_density\": 1815.0,", "", 1);
        let config = RocketConfig::from_json(&text, PathBuf::new()).unwrap();
        assert!(config.build_rocket().is_err());
    }
}
