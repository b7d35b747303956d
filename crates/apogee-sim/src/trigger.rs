//! Parachute trigger engine: scheduled sampling, barometer noise,
//! deployment lag.

use apogee_core::error::{Error, Result};
use apogee_core::parachute::{NoiseSpec, Parachute};
use apogee_core::state::FlightState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// Slack when comparing a deployment time with the integrator clock.
const TIME_EPS: f64 = 1e-9;

/// One-way deployment state of a parachute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChuteState {
    Armed,
    Triggered { at: f64, deploy_at: f64 },
    Deployed { triggered_at: f64, at: f64 },
}

/// Correlated pressure noise: `n_k = α n_{k-1} + √(1-α²) N(mean, std)`.
struct NoiseGenerator {
    rng: StdRng,
    normal: Normal<f64>,
    alpha: f64,
    beta: f64,
    last: f64,
}

impl NoiseGenerator {
    fn new(spec: &NoiseSpec, seed: u64) -> Result<Self> {
        let normal = Normal::new(spec.mean, spec.std_dev)
            .map_err(|e| Error::config(format!("invalid noise distribution: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);
        let last = normal.sample(&mut rng);
        Ok(Self {
            rng,
            normal,
            alpha: spec.time_correlation,
            beta: (1.0 - spec.time_correlation.powi(2)).sqrt(),
            last,
        })
    }

    fn next(&mut self) -> f64 {
        self.last = self.alpha * self.last + self.beta * self.normal.sample(&mut self.rng);
        self.last
    }
}

struct Channel<'r> {
    parachute: &'r Parachute,
    state: ChuteState,
    next_sample: f64,
    noise: NoiseGenerator,
    noise_signal: Vec<(f64, f64)>,
    pressure_at_trigger: Option<f64>,
}

/// What happened to one parachute during a flight.
#[derive(Debug, Clone, Serialize)]
pub struct ParachuteEvent {
    pub name: String,
    pub trigger_time: Option<f64>,
    pub deploy_time: Option<f64>,
    /// Noisy pressure reading (Pa) that fired the trigger.
    pub pressure_at_trigger: Option<f64>,
    /// `(time, noise)` for every evaluation of the trigger.
    pub noise_signal: Vec<(f64, f64)>,
}

pub struct TriggerEngine<'r> {
    channels: Vec<Channel<'r>>,
    deployment_order: Vec<usize>,
    armed: bool,
}

impl<'r> TriggerEngine<'r> {
    /// Channel `i` draws its noise from a generator seeded with `seed + i`.
    pub fn new(parachutes: &'r [Parachute], seed: u64) -> Result<Self> {
        let channels = parachutes
            .iter()
            .enumerate()
            .map(|(i, parachute)| {
                Ok(Channel {
                    parachute,
                    state: ChuteState::Armed,
                    next_sample: f64::INFINITY,
                    noise: NoiseGenerator::new(&parachute.noise, seed.wrapping_add(i as u64))?,
                    noise_signal: Vec::new(),
                    pressure_at_trigger: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            channels,
            deployment_order: Vec::new(),
            armed: false,
        })
    }

    /// Start sampling at `t` (rail exit).
    pub fn arm(&mut self, t: f64) {
        self.armed = true;
        for ch in &mut self.channels {
            ch.next_sample = t;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Evaluate every armed trigger whose sample is due. Each channel is
    /// evaluated at most once per call; missed samples are skipped.
    ///
    /// Returns the indices of parachutes that fired.
    pub fn sample(&mut self, t: f64, state: &FlightState, pressure: f64) -> Result<Vec<usize>> {
        let mut fired = Vec::new();
        for (i, ch) in self.channels.iter_mut().enumerate() {
            if ch.state != ChuteState::Armed || t + TIME_EPS < ch.next_sample {
                continue;
            }
            let period = ch.parachute.sampling_period();
            while ch.next_sample <= t + TIME_EPS {
                ch.next_sample += period;
            }

            let noise = ch.noise.next();
            ch.noise_signal.push((t, noise));
            let reading = pressure + noise;

            let triggered = ch.parachute.trigger.evaluate(reading, state).map_err(|reason| {
                Error::TriggerEvaluation {
                    parachute: ch.parachute.name.clone(),
                    time: t,
                    reason,
                }
            })?;
            if triggered {
                let deploy_at = t + ch.parachute.lag;
                ch.state = ChuteState::Triggered { at: t, deploy_at };
                ch.pressure_at_trigger = Some(reading);
                tracing::info!(
                    parachute = %ch.parachute.name,
                    time = t,
                    deploy_at,
                    pressure = reading,
                    "parachute triggered"
                );
                fired.push(i);
            }
        }
        Ok(fired)
    }

    /// Earliest pending deployment strictly after `t`.
    pub fn next_deployment(&self, t: f64) -> Option<f64> {
        self.channels
            .iter()
            .filter_map(|ch| match ch.state {
                ChuteState::Triggered { deploy_at, .. } if deploy_at > t + TIME_EPS => {
                    Some(deploy_at)
                }
                _ => None,
            })
            .reduce(f64::min)
    }

    /// Open every parachute whose lag has elapsed by `t`.
    pub fn deploy_due(&mut self, t: f64) -> Vec<usize> {
        let mut opened = Vec::new();
        for (i, ch) in self.channels.iter_mut().enumerate() {
            if let ChuteState::Triggered { at, deploy_at } = ch.state {
                if deploy_at <= t + TIME_EPS {
                    ch.state = ChuteState::Deployed {
                        triggered_at: at,
                        at: deploy_at,
                    };
                    tracing::info!(parachute = %ch.parachute.name, time = deploy_at, "parachute deployed");
                    opened.push(i);
                }
            }
        }
        // Simultaneous openings keep declaration order.
        self.deployment_order.extend(&opened);
        opened
    }

    /// The most recently opened parachute, which sets the descent drag.
    pub fn active(&self) -> Option<&'r Parachute> {
        self.deployment_order
            .last()
            .map(|&i| self.channels[i].parachute)
    }

    pub fn state(&self, index: usize) -> Option<ChuteState> {
        self.channels.get(index).map(|ch| ch.state)
    }

    pub fn events(&self) -> Vec<ParachuteEvent> {
        self.channels
            .iter()
            .map(|ch| {
                let (trigger_time, deploy_time) = match ch.state {
                    ChuteState::Armed => (None, None),
                    ChuteState::Triggered { at, .. } => (Some(at), None),
                    ChuteState::Deployed { triggered_at, at } => (Some(triggered_at), Some(at)),
                };
                ParachuteEvent {
                    name: ch.parachute.name.clone(),
                    trigger_time,
                    deploy_time,
                    pressure_at_trigger: ch.pressure_at_trigger,
                    noise_signal: ch.noise_signal.clone(),
                }
            })
            .collect()
    }
}
