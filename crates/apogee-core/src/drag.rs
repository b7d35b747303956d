//! Mach-dependent drag coefficient lookup.

use crate::error::{Error, Result};
use crate::table::{Extrapolation, Interpolation, Table1D};

#[derive(Debug, Clone)]
pub struct DragCurve {
    table: Table1D,
}

impl DragCurve {
    /// Build from (Mach, Cd) pairs. Values beyond the table ends are held.
    pub fn from_points(points: &[(f64, f64)], interpolation: Interpolation) -> Result<Self> {
        if points.iter().any(|&(mach, cd)| mach < 0.0 || cd < 0.0) {
            return Err(Error::config("drag curve Mach numbers and Cd must be non-negative"));
        }
        Ok(Self {
            table: Table1D::new(points, interpolation, Extrapolation::Constant)?,
        })
    }

    pub fn constant(cd: f64) -> Self {
        Self {
            table: Table1D::constant(cd),
        }
    }

    pub fn drag_coefficient(&self, mach: f64) -> f64 {
        self.table.eval(mach)
    }
}
