//! Aggregation of installed surfaces into one CP and one lift slope.

use serde::Serialize;

use crate::aero::{AeroContribution, AeroSurface};

#[derive(Debug, Clone, Serialize)]
pub struct InstalledSurface {
    pub surface: AeroSurface,
    pub contribution: AeroContribution,
}

/// Installed surfaces, in insertion order, plus the cached totals.
///
/// The cache is rebuilt by every mutator before it returns, so reads never
/// see stale totals.
#[derive(Debug, Clone)]
pub struct AeroAggregate {
    radius: f64,
    surfaces: Vec<InstalledSurface>,
    cp_position: f64,
    total_lift_coeff_der: f64,
}

impl AeroAggregate {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            surfaces: Vec::new(),
            cp_position: 0.0,
            total_lift_coeff_der: 0.0,
        }
    }

    pub fn install(&mut self, surface: AeroSurface) -> &InstalledSurface {
        let contribution = surface.cp_contribution(self.radius);
        self.surfaces.push(InstalledSurface {
            surface,
            contribution,
        });
        self.recompute();
        &self.surfaces[self.surfaces.len() - 1]
    }

    fn recompute(&mut self) {
        let (moment, total) = self
            .surfaces
            .iter()
            .fold((0.0, 0.0), |(m, c), s| {
                (m + s.contribution.cp * s.contribution.cl_alpha, c + s.contribution.cl_alpha)
            });
        self.total_lift_coeff_der = total;
        self.cp_position = if total == 0.0 { 0.0 } else { moment / total };
    }

    pub fn cp_position(&self) -> f64 {
        self.cp_position
    }

    pub fn total_lift_coeff_der(&self) -> f64 {
        self.total_lift_coeff_der
    }

    pub fn surfaces(&self) -> &[InstalledSurface] {
        &self.surfaces
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn has_nose(&self) -> bool {
        self.surfaces
            .iter()
            .any(|s| matches!(s.surface, AeroSurface::NoseCone(_)))
    }
}
