//! One-dimensional tabulated functions.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How values between table nodes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Natural cubic spline.
    Spline,
}

impl Interpolation {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "spline" => Ok(Self::Spline),
            _ => Err(Error::UnknownInterpolation(name.to_string())),
        }
    }
}

/// What a table returns outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Hold the first / last value.
    Constant,
    Zero,
}

#[derive(Debug, Clone)]
pub struct Table1D {
    x: Vec<f64>,
    y: Vec<f64>,
    interpolation: Interpolation,
    extrapolation: Extrapolation,
    /// Second derivatives at the nodes, only filled for splines.
    y2: Vec<f64>,
}

impl Table1D {
    pub fn new(
        points: &[(f64, f64)],
        interpolation: Interpolation,
        extrapolation: Extrapolation,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::config("a table needs at least one point"));
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(Error::config("table points must be finite"));
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(Error::config("table abscissae must be strictly increasing"));
        }

        let x: Vec<f64> = points.iter().map(|p| p.0).collect();
        let y: Vec<f64> = points.iter().map(|p| p.1).collect();
        let y2 = match interpolation {
            Interpolation::Spline if x.len() > 2 => natural_spline(&x, &y),
            _ => vec![0.0; x.len()],
        };

        Ok(Self {
            x,
            y,
            interpolation,
            extrapolation,
            y2,
        })
    }

    pub fn constant(value: f64) -> Self {
        Self {
            x: vec![0.0],
            y: vec![value],
            interpolation: Interpolation::Linear,
            extrapolation: Extrapolation::Constant,
            y2: vec![0.0],
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        let (lo, hi) = self.domain();
        if t < lo || t > hi || n == 1 {
            return match self.extrapolation {
                Extrapolation::Zero if t < lo || t > hi => 0.0,
                _ if t <= lo => self.y[0],
                _ => self.y[n - 1],
            };
        }

        // Index of the segment [x[i], x[i+1]] that contains t.
        let i = match self.x.partition_point(|&xi| xi <= t) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        let linear = a * self.y[i] + b * self.y[i + 1];

        match self.interpolation {
            Interpolation::Linear => linear,
            Interpolation::Spline => {
                linear
                    + ((a * a * a - a) * self.y2[i] + (b * b * b - b) * self.y2[i + 1]) * h * h
                        / 6.0
            }
        }
    }

    /// Cumulative trapezoidal integral from the first node, tabulated at
    /// the same nodes.
    pub fn cumulative_integral(&self) -> Vec<f64> {
        let mut acc = Vec::with_capacity(self.x.len());
        let mut total = 0.0;
        acc.push(0.0);
        for i in 1..self.x.len() {
            total += 0.5 * (self.y[i] + self.y[i - 1]) * (self.x[i] - self.x[i - 1]);
            acc.push(total);
        }
        acc
    }
}

fn natural_spline(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut y2 = vec![0.0; n];
    let mut u = vec![0.0; n];
    for i in 1..n - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * y2[i - 1] + 2.0;
        y2[i] = (sig - 1.0) / p;
        let slope = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        u[i] = (6.0 * slope / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
    }
    for k in (0..n - 1).rev() {
        y2[k] = y2[k] * y2[k + 1] + u[k];
    }
    y2
}
