use serde::Serialize;

// ---------------------------------------------------------------------------
// Phases & Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FlightPhase {
    OnRail = 0,
    Burning = 1,        // Powered, off the rail
    Coasting = 2,       // Unpowered ascent
    ApogeeReached = 3,  // Instantaneous
    Descending = 4,     // Ballistic or under canopy
    GroundImpact = 5,   // Terminal
}

impl FlightPhase {
    pub const ALL: [FlightPhase; NUM_PHASES] = [
        Self::OnRail,
        Self::Burning,
        Self::Coasting,
        Self::ApogeeReached,
        Self::Descending,
        Self::GroundImpact,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::OnRail => "On rail",
            Self::Burning => "Burning",
            Self::Coasting => "Coasting",
            Self::ApogeeReached => "Apogee",
            Self::Descending => "Descending",
            Self::GroundImpact => "Ground impact",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::GroundImpact
    }
}

pub const NUM_PHASES: usize = 6;

/// Events reported by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The rocket left the rail; `burning` tells whether the motor still fires.
    RailExit { burning: bool },
    BurnOut,
    Apogee,
    Impact,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: FlightPhase,

    /// Time when the current phase was entered.
    phase_start_time: f64,

    /// Transition timestamps, NaN while a phase has not been reached.
    transition_times: [f64; NUM_PHASES],
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        let mut transition_times = [f64::NAN; NUM_PHASES];
        transition_times[FlightPhase::OnRail as usize] = 0.0;

        Self {
            phase: FlightPhase::OnRail,
            phase_start_time: 0.0,
            transition_times,
        }
    }

    /// Apply an event and return the resulting phase. Events that do not
    /// apply to the current phase are ignored.
    pub fn update(&mut self, event: PhaseEvent, time: f64) -> FlightPhase {
        let next_phase = match (self.phase, event) {
            (FlightPhase::OnRail, PhaseEvent::RailExit { burning: true }) => {
                Some(FlightPhase::Burning)
            }
            (FlightPhase::OnRail, PhaseEvent::RailExit { burning: false }) => {
                Some(FlightPhase::Coasting)
            }
            (FlightPhase::Burning, PhaseEvent::BurnOut) => Some(FlightPhase::Coasting),
            (FlightPhase::Burning | FlightPhase::Coasting, PhaseEvent::Apogee) => {
                Some(FlightPhase::ApogeeReached)
            }
            (FlightPhase::GroundImpact, _) => None,
            (_, PhaseEvent::Impact) => Some(FlightPhase::GroundImpact),
            _ => None,
        };

        if let Some(new_phase) = next_phase {
            self.transition_to(new_phase, time);
            // Apogee is an instant, not a phase one can stay in.
            if new_phase == FlightPhase::ApogeeReached {
                self.transition_to(FlightPhase::Descending, time);
            }
        }

        self.phase
    }

    fn transition_to(&mut self, new_phase: FlightPhase, time: f64) {
        tracing::debug!(
            from = self.phase.label(),
            to = new_phase.label(),
            time,
            "phase transition"
        );
        self.phase = new_phase;
        self.phase_start_time = time;
        self.transition_times[new_phase as usize] = time;
    }

    pub fn current_phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn phase_start_time(&self) -> f64 {
        self.phase_start_time
    }

    pub fn transition_time(&self, phase: FlightPhase) -> f64 {
        self.transition_times[phase as usize]
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_sequence() {
        let mut sm = PhaseTracker::new();
        assert_eq!(sm.current_phase(), FlightPhase::OnRail);
        assert!(sm.transition_time(FlightPhase::Burning).is_nan());

        assert_eq!(sm.update(PhaseEvent::RailExit { burning: true }, 0.4), FlightPhase::Burning);
        assert_eq!(sm.update(PhaseEvent::BurnOut, 3.9), FlightPhase::Coasting);
        assert_eq!(sm.update(PhaseEvent::Apogee, 26.0), FlightPhase::Descending);
        assert_eq!(sm.transition_time(FlightPhase::ApogeeReached), 26.0);
        assert_eq!(sm.transition_time(FlightPhase::Descending), 26.0);
        assert_eq!(sm.update(PhaseEvent::Impact, 300.0), FlightPhase::GroundImpact);
        assert!(sm.is_terminal());
    }

    #[test]
    fn test_burn_out_on_rail_skips_burning() {
        let mut sm = PhaseTracker::new();
        assert_eq!(sm.update(PhaseEvent::BurnOut, 0.2), FlightPhase::OnRail);
        assert_eq!(sm.update(PhaseEvent::RailExit { burning: false }, 0.5), FlightPhase::Coasting);
        assert!(sm.transition_time(FlightPhase::Burning).is_nan());
    }

    #[test]
    fn test_terminal_phase_ignores_events() {
        let mut sm = PhaseTracker::new();
        sm.update(PhaseEvent::Impact, 1.0);
        assert_eq!(sm.update(PhaseEvent::Apogee, 2.0), FlightPhase::GroundImpact);
        assert_eq!(sm.update(PhaseEvent::Impact, 3.0), FlightPhase::GroundImpact);
        assert_eq!(sm.transition_time(FlightPhase::GroundImpact), 1.0);
    }

    #[test]
    fn test_apogee_needs_to_be_airborne() {
        let mut sm = PhaseTracker::new();
        assert_eq!(sm.update(PhaseEvent::Apogee, 0.1), FlightPhase::OnRail);
    }
}
