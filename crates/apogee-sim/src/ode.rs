//! Fixed-step RK4 stepper with zero-crossing refinement.

use nalgebra::SVector;

/// Right-hand side of `dy/dt = f(t, y)`.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N>;
}

pub fn rk4_step<S, const N: usize>(sys: &S, t: f64, y: &SVector<f64, N>, h: f64) -> SVector<f64, N>
where
    S: OdeSystem<N> + ?Sized,
{
    let k1 = sys.rhs(t, y);
    let k2 = sys.rhs(t + h * 0.5, &(y + k1 * (h * 0.5)));
    let k3 = sys.rhs(t + h * 0.5, &(y + k2 * (h * 0.5)));
    let k4 = sys.rhs(t + h, &(y + k3 * h));

    y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Which sign changes of an event function count as an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    Rising,
    Falling,
}

impl EventDirection {
    pub fn crossed(self, before: f64, after: f64) -> bool {
        match self {
            Self::Rising => before < 0.0 && after >= 0.0,
            Self::Falling => before > 0.0 && after <= 0.0,
        }
    }
}

const MAX_BISECTIONS: usize = 200;

/// Locate the zero of `g` inside `[t0, t0 + h]`, where `g(t0, y0)` and
/// `g(t0 + h, ·)` are known to straddle it.
///
/// Each probe re-integrates a single RK4 step of the probed length from
/// `(t0, y0)`. The returned point lies at or just past the crossing, never
/// further than `tol` from it.
pub fn locate_event<S, G, const N: usize>(
    sys: &S,
    t0: f64,
    y0: &SVector<f64, N>,
    h: f64,
    g: G,
    tol: f64,
) -> (f64, SVector<f64, N>)
where
    S: OdeSystem<N> + ?Sized,
    G: Fn(f64, &SVector<f64, N>) -> f64,
{
    let g_start = g(t0, y0);
    let (mut lo, mut hi) = (0.0, h);

    for _ in 0..MAX_BISECTIONS {
        if hi - lo <= tol {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let g_mid = g(t0 + mid, &rk4_step(sys, t0, y0, mid));
        if g_mid * g_start > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    (t0 + hi, rk4_step(sys, t0, y0, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    /// z'' = -g
    struct Ballistic {
        g: f64,
    }

    impl OdeSystem<2> for Ballistic {
        fn rhs(&self, _t: f64, y: &Vector2<f64>) -> Vector2<f64> {
            Vector2::new(y[1], -self.g)
        }
    }

    struct Decay;

    impl OdeSystem<1> for Decay {
        fn rhs(&self, _t: f64, y: &SVector<f64, 1>) -> SVector<f64, 1> {
            -*y
        }
    }

    #[test]
    fn test_rk4_is_fourth_order() {
        let mut y = SVector::<f64, 1>::new(1.0);
        let h = 0.01;
        for i in 0..100 {
            y = rk4_step(&Decay, i as f64 * h, &y, h);
        }
        assert!((y[0] - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_locates_apogee() {
        let sys = Ballistic { g: 9.81 };
        let y0 = Vector2::new(0.0, 10.0);
        let h = 2.0;
        let end = rk4_step(&sys, 0.0, &y0, h);
        assert!(EventDirection::Falling.crossed(y0[1], end[1]));

        let (t, y) = locate_event(&sys, 0.0, &y0, h, |_, y| y[1], 1e-9);
        let expected = 10.0 / 9.81;
        assert!((t - expected).abs() < 1e-8);
        assert!(y[1] <= 0.0 && y[1] > -1e-7);
        assert!((y[0] - 100.0 / (2.0 * 9.81)).abs() < 1e-6);
    }

    #[test]
    fn test_direction_filters_crossings() {
        assert!(EventDirection::Rising.crossed(-1.0, 0.5));
        assert!(!EventDirection::Rising.crossed(1.0, -0.5));
        assert!(EventDirection::Falling.crossed(1.0, 0.0));
        assert!(!EventDirection::Falling.crossed(0.0, -1.0));
    }
}
