//! Barrowman-style aerodynamic surface models.
//!
//! Every surface reports where its normal force acts (`cp`, measured along
//! the rocket axis from the dry center of mass, positive towards the nose)
//! and its normal-force coefficient slope `cl_alpha` (per radian, referred
//! to the body cross-section of radius `R`).

use serde::Serialize;

use crate::error::{ensure_positive, Error, Result};

/// Nose-cone profile. Unknown names are kept and use the default
/// coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoseKind {
    Conical,
    Ogive,
    LvHaack,
    Default,
    Other(String),
}

impl NoseKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "conical" => Self::Conical,
            "ogive" => Self::Ogive,
            "lvhaack" => Self::LvHaack,
            "default" => Self::Default,
            _ => {
                tracing::warn!(
                    kind = name,
                    "unknown nose cone shape, using default CP coefficient 0.5"
                );
                Self::Other(name.to_string())
            }
        }
    }

    /// Fraction of the nose length between its base and its CP.
    pub fn cp_coefficient(&self) -> f64 {
        match self {
            Self::Conical => 1.0 - 1.0 / 3.0,
            Self::Ogive => 1.0 - 0.534,
            Self::LvHaack => 1.0 - 0.437,
            Self::Default | Self::Other(_) => 0.5,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AeroContribution {
    pub cp: f64,
    pub cl_alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoseCone {
    pub length: f64,
    pub kind: NoseKind,
    pub distance_to_cm: f64,
}

impl NoseCone {
    pub fn new(length: f64, kind: NoseKind, distance_to_cm: f64) -> Result<Self> {
        ensure_positive("nose cone length", length)?;
        ensure_finite("nose cone distance to CM", distance_to_cm)?;
        Ok(Self {
            length,
            kind,
            distance_to_cm,
        })
    }

    pub fn shape_recognized(&self) -> bool {
        self.kind.is_recognized()
    }

    pub fn cp_contribution(&self, _radius: f64) -> AeroContribution {
        AeroContribution {
            cp: self.distance_to_cm + self.kind.cp_coefficient() * self.length,
            // Slender-body value, independent of geometry.
            cl_alpha: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinSet {
    pub count: u32,
    pub span: f64,
    pub root_chord: f64,
    pub tip_chord: f64,
    pub distance_to_cm: f64,
}

impl FinSet {
    pub fn new(
        count: u32,
        span: f64,
        root_chord: f64,
        tip_chord: f64,
        distance_to_cm: f64,
    ) -> Result<Self> {
        if count == 0 {
            return Err(Error::config("a fin set needs at least one fin"));
        }
        ensure_positive("fin span", span)?;
        ensure_positive("fin root chord", root_chord)?;
        ensure_positive("fin tip chord", tip_chord)?;
        ensure_finite("fin set distance to CM", distance_to_cm)?;
        Ok(Self {
            count,
            span,
            root_chord,
            tip_chord,
            distance_to_cm,
        })
    }

    pub fn cp_contribution(&self, radius: f64) -> AeroContribution {
        let (cr, ct, s) = (self.root_chord, self.tip_chord, self.span);
        let sum = cr + ct;

        let cp = self.distance_to_cm
            - (((cr - ct) / 3.0) * ((cr + 2.0 * ct) / sum)
                + (1.0 / 6.0) * (sum - cr * ct / sum));

        let mid_chord_line = ((cr / 2.0 - ct / 2.0).powi(2) + s * s).sqrt();
        let base = 4.0 * f64::from(self.count) * (s / (2.0 * radius)).powi(2)
            / (1.0 + (1.0 + (2.0 * mid_chord_line / sum).powi(2)).sqrt());
        // Fin-body interference.
        let cl_alpha = base * (1.0 + radius / (s + radius));

        AeroContribution { cp, cl_alpha }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tail {
    pub top_radius: f64,
    pub bottom_radius: f64,
    pub length: f64,
    pub distance_to_cm: f64,
}

impl Tail {
    pub fn new(top_radius: f64, bottom_radius: f64, length: f64, distance_to_cm: f64) -> Result<Self> {
        ensure_positive("tail top radius", top_radius)?;
        ensure_positive("tail bottom radius", bottom_radius)?;
        ensure_positive("tail length", length)?;
        ensure_finite("tail distance to CM", distance_to_cm)?;
        if top_radius == bottom_radius {
            return Err(Error::config(
                "tail top and bottom radii are equal; that is a body tube, not a transition",
            ));
        }
        Ok(Self {
            top_radius,
            bottom_radius,
            length,
            distance_to_cm,
        })
    }

    pub fn cp_contribution(&self, radius: f64) -> AeroContribution {
        let r = self.top_radius / self.bottom_radius;
        // Aft of the reference: the offset is subtracted.
        let cp = self.distance_to_cm - (self.length / 3.0) * (1.0 + (1.0 - r) / (1.0 - r * r));
        let cl_alpha = -2.0 * (1.0 - r.powi(-2)) * (self.top_radius / radius).powi(2);
        AeroContribution { cp, cl_alpha }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AeroSurface {
    NoseCone(NoseCone),
    FinSet(FinSet),
    Tail(Tail),
}

impl AeroSurface {
    pub fn cp_contribution(&self, radius: f64) -> AeroContribution {
        match self {
            Self::NoseCone(n) => n.cp_contribution(radius),
            Self::FinSet(f) => f.cp_contribution(radius),
            Self::Tail(t) => t.cp_contribution(radius),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoseCone(_) => "Nose Cone",
            Self::FinSet(_) => "Fin Set",
            Self::Tail(_) => "Tail",
        }
    }
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must be finite, got {value}")))
    }
}
