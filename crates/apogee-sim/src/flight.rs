use apogee_core::environment::Environment;
use apogee_core::error::{Error, Result};
use apogee_core::rocket::Rocket;
use apogee_core::state::{launch_attitude, FlightState, StateVector, E0, VZ, Z};
use apogee_core::state_machine::{FlightPhase, PhaseEvent, PhaseTracker};
use nalgebra::Vector3;
use serde::Serialize;

use crate::dynamics::{Dynamics, Regime};
use crate::ode::{locate_event, rk4_step, EventDirection};
use crate::params::FlightConfig;
use crate::trigger::{ParachuteEvent, TriggerEngine};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightOutcome {
    Landed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Sample {
    pub time: f64,
    pub state: FlightState,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub outcome: FlightOutcome,
    pub rail_exit_time: Option<f64>,
    pub rail_exit_speed: Option<f64>,
    pub rail_exit_static_margin: Option<f64>,
    pub burn_out_time: f64,
    pub apogee_time: Option<f64>,
    pub apogee_altitude: Option<f64>,
    pub apogee_x: Option<f64>,
    pub apogee_y: Option<f64>,
    pub max_speed: f64,
    pub max_speed_time: f64,
    pub max_mach: f64,
    pub impact_time: Option<f64>,
    pub impact_x: Option<f64>,
    pub impact_y: Option<f64>,
    pub impact_velocity: Option<f64>,
    pub final_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightResult {
    pub samples: Vec<Sample>,
    /// `(phase, time entered)` for every phase that was reached.
    pub phase_times: Vec<(FlightPhase, f64)>,
    pub parachutes: Vec<ParachuteEvent>,
    pub summary: FlightSummary,
}

impl FlightResult {
    pub fn final_state(&self) -> Option<&FlightState> {
        self.samples.last().map(|s| &s.state)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Integrator
// ---------------------------------------------------------------------------

pub struct Flight<'a> {
    rocket: &'a Rocket,
    env: &'a dyn Environment,
    config: FlightConfig,
}

/// Running extrema and event data collected while stepping.
struct Tracking {
    summary: FlightSummary,
}

impl Tracking {
    fn new(burn_out_time: f64) -> Self {
        Self {
            summary: FlightSummary {
                outcome: FlightOutcome::TimedOut,
                rail_exit_time: None,
                rail_exit_speed: None,
                rail_exit_static_margin: None,
                burn_out_time,
                apogee_time: None,
                apogee_altitude: None,
                apogee_x: None,
                apogee_y: None,
                max_speed: 0.0,
                max_speed_time: 0.0,
                max_mach: 0.0,
                impact_time: None,
                impact_x: None,
                impact_y: None,
                impact_velocity: None,
                final_time: 0.0,
            },
        }
    }

    fn observe(&mut self, t: f64, s: &FlightState, env: &dyn Environment) {
        let z = s.altitude();
        let (we, wn) = env.wind(z, t);
        let airspeed = (s.velocity() - Vector3::new(we, wn, 0.0)).norm();
        let speed = s.speed();
        if speed > self.summary.max_speed {
            self.summary.max_speed = speed;
            self.summary.max_speed_time = t;
        }
        let mach = airspeed / env.speed_of_sound(z);
        if mach > self.summary.max_mach {
            self.summary.max_mach = mach;
        }
        self.summary.final_time = t;
    }
}

impl<'a> Flight<'a> {
    pub fn new(rocket: &'a Rocket, env: &'a dyn Environment, config: FlightConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { rocket, env, config })
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Distance the rocket travels before the upper rail button leaves the
    /// rail.
    pub fn effective_rail_length(&self) -> f64 {
        let nozzle = self.rocket.mass_model().distance_rocket_nozzle;
        let length = match self.rocket.rail_buttons() {
            Some(buttons) => self.config.rail_length - (buttons.upper() - nozzle),
            None => self.config.rail_length,
        };
        length.max(0.0)
    }

    fn dynamics(&self, phase: FlightPhase, engine: &TriggerEngine<'a>) -> Dynamics<'a> {
        let regime = Regime {
            rocket: self.rocket,
            env: self.env,
        };
        match (phase, engine.active()) {
            (FlightPhase::OnRail, _) => Dynamics::Rail(regime),
            (_, Some(chute)) => Dynamics::Parachute {
                regime,
                cd_s: chute.cd_s,
            },
            (_, None) => Dynamics::Free(regime),
        }
    }

    /// Integrate from ignition until ground impact or `max_time`.
    pub fn run(&self) -> Result<FlightResult> {
        let cfg = &self.config;
        let env = self.env;
        let burn_out = self.rocket.motor().burn_out_time();
        let rail_length = self.effective_rail_length();

        let mut tracker = PhaseTracker::new();
        let mut engine = TriggerEngine::new(self.rocket.parachutes(), cfg.seed)?;
        let mut track = Tracking::new(burn_out);

        let mut t = 0.0;
        let mut y = FlightState::at_rest(launch_attitude(cfg.inclination, cfg.heading)).to_vector();
        let mut samples = vec![Sample {
            time: t,
            state: FlightState::from_vector(&y),
        }];
        let mut burn_out_reported = false;

        tracing::debug!(
            rail_length,
            inclination = cfg.inclination,
            heading = cfg.heading,
            burn_out,
            parachutes = self.rocket.parachutes().len(),
            "starting flight"
        );

        if rail_length <= 0.0 {
            self.leave_rail(t, &y, &mut tracker, &mut engine, &mut track);
        }

        while t < cfg.max_time {
            let phase = tracker.current_phase();
            let sys = self.dynamics(phase, &engine);

            // Step size, clipped so that burn-out and deployments are hit exactly.
            let nominal = if engine.active().is_some() {
                cfg.descent_time_step
            } else {
                cfg.time_step
            };
            let mut t_next = (t + nominal).min(cfg.max_time);
            if t < burn_out && t_next > burn_out {
                t_next = burn_out;
            }
            if let Some(deploy_at) = engine.next_deployment(t) {
                t_next = t_next.min(deploy_at);
            }
            let h = t_next - t;

            let mut y_next = rk4_step(&sys, t, &y, h);
            normalize_attitude(&mut y_next);
            if !y_next.iter().all(|v| v.is_finite()) {
                return Err(Error::IntegrationDivergence {
                    time: t_next,
                    last_state: Box::new(FlightState::from_vector(&y)),
                });
            }

            // Events inside the step, earliest first.
            let mut event = None;
            if phase == FlightPhase::OnRail {
                let g = |_: f64, s: &StateVector| s.fixed_rows::<3>(0).norm() - rail_length;
                if EventDirection::Rising.crossed(g(t, &y), g(t_next, &y_next)) {
                    let burning = t < burn_out;
                    event = Some((PhaseEvent::RailExit { burning }, g_locate(&sys, t, &y, h, g, cfg)));
                }
            } else {
                let apogee = |_: f64, s: &StateVector| s[VZ];
                let ground = |_: f64, s: &StateVector| s[Z];
                if matches!(phase, FlightPhase::Burning | FlightPhase::Coasting)
                    && EventDirection::Falling.crossed(y[VZ], y_next[VZ])
                {
                    event = Some((PhaseEvent::Apogee, g_locate(&sys, t, &y, h, apogee, cfg)));
                } else if EventDirection::Falling.crossed(y[Z], y_next[Z]) {
                    event = Some((PhaseEvent::Impact, g_locate(&sys, t, &y, h, ground, cfg)));
                }
            }

            match event {
                Some((_, (te, ye))) => {
                    t = te;
                    y = ye;
                    normalize_attitude(&mut y);
                }
                None => {
                    t = t_next;
                    y = y_next;
                }
            }
            let state = FlightState::from_vector(&y);
            samples.push(Sample { time: t, state });
            track.observe(t, &state, env);

            if !burn_out_reported && t >= burn_out {
                burn_out_reported = true;
                tracker.update(PhaseEvent::BurnOut, burn_out);
                tracing::info!(time = burn_out, altitude = state.altitude(), "motor burn-out");
            }

            if let Some((ev, _)) = event {
                match ev {
                    PhaseEvent::RailExit { .. } => {
                        self.leave_rail(t, &y, &mut tracker, &mut engine, &mut track);
                    }
                    PhaseEvent::Apogee => {
                        tracker.update(PhaseEvent::Apogee, t);
                        let s = &mut track.summary;
                        s.apogee_time = Some(t);
                        s.apogee_altitude = Some(state.altitude());
                        s.apogee_x = Some(state[0]);
                        s.apogee_y = Some(state[1]);
                        tracing::info!(time = t, altitude = state.altitude(), "apogee");
                    }
                    PhaseEvent::Impact => {
                        tracker.update(PhaseEvent::Impact, t);
                        let s = &mut track.summary;
                        s.outcome = FlightOutcome::Landed;
                        s.impact_time = Some(t);
                        s.impact_x = Some(state[0]);
                        s.impact_y = Some(state[1]);
                        s.impact_velocity = Some(state.vertical_velocity());
                        tracing::info!(
                            time = t,
                            x = state[0],
                            y = state[1],
                            velocity = state.vertical_velocity(),
                            "ground impact"
                        );
                        break;
                    }
                    PhaseEvent::BurnOut => {}
                }
            }

            if engine.is_armed() {
                engine.sample(t, &state, env.pressure(state.altitude()))?;
                engine.deploy_due(t);
            }
        }

        if track.summary.outcome == FlightOutcome::TimedOut {
            tracing::warn!(max_time = cfg.max_time, "flight reached the time limit before impact");
        }

        let phase_times = FlightPhase::ALL
            .iter()
            .map(|&p| (p, tracker.transition_time(p)))
            .filter(|(_, time)| !time.is_nan())
            .collect();

        Ok(FlightResult {
            samples,
            phase_times,
            parachutes: engine.events(),
            summary: track.summary,
        })
    }

    fn leave_rail(
        &self,
        t: f64,
        y: &StateVector,
        tracker: &mut PhaseTracker,
        engine: &mut TriggerEngine<'a>,
        track: &mut Tracking,
    ) {
        let burning = t < self.rocket.motor().burn_out_time();
        tracker.update(PhaseEvent::RailExit { burning }, t);
        engine.arm(t);

        let speed = y.fixed_rows::<3>(3).norm();
        let margin = self.rocket.static_margin(t);
        track.summary.rail_exit_time = Some(t);
        track.summary.rail_exit_speed = Some(speed);
        track.summary.rail_exit_static_margin = Some(margin);
        tracing::info!(time = t, speed, static_margin = margin, "rail exit");
    }
}

fn g_locate<G>(
    sys: &Dynamics<'_>,
    t: f64,
    y: &StateVector,
    h: f64,
    g: G,
    cfg: &FlightConfig,
) -> (f64, StateVector)
where
    G: Fn(f64, &StateVector) -> f64,
{
    locate_event(sys, t, y, h, g, cfg.event_tolerance)
}

fn normalize_attitude(y: &mut StateVector) {
    let mut q = y.fixed_rows_mut::<4>(E0);
    let n = q.norm();
    if n > 0.0 && n.is_finite() {
        q /= n;
    }
}
