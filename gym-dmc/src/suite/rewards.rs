//! Soft indicator functions used to shape rewards.

/// Shape of the decay of [`tolerance`] outside the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigmoid {
    /// `exp(-(d * s)^2 / 2)`.
    Gaussian,

    /// `1 - d * s`, clipped at zero.
    Linear,

    /// `1 - (d * s)^2`, clipped at zero.
    Quadratic,
}

impl Sigmoid {
    /// Value of the sigmoid at normalized distance `d`, scaled so that the value at `d = 1`
    /// is `value_at_1`.
    fn apply(self, d: f64, value_at_1: f64) -> f64 {
        match self {
            Sigmoid::Gaussian => {
                let scale = (-2.0 * value_at_1.ln()).sqrt();
                (-0.5 * (d * scale).powi(2)).exp()
            }
            Sigmoid::Linear => {
                let scaled = d * (1.0 - value_at_1);
                if scaled.abs() < 1.0 {
                    1.0 - scaled
                } else {
                    0.0
                }
            }
            Sigmoid::Quadratic => {
                let scaled = d * (1.0 - value_at_1).sqrt();
                if scaled.abs() < 1.0 {
                    1.0 - scaled * scaled
                } else {
                    0.0
                }
            }
        }
    }
}

/// Options of [`tolerance`].
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Interval in which the value is 1.
    pub bounds: (f64, f64),

    /// Distance from the bounds at which the value is `value_at_margin`.
    pub margin: f64,

    /// Decay outside the bounds.
    pub sigmoid: Sigmoid,

    /// Value at `margin` from the bounds.
    pub value_at_margin: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            bounds: (0.0, 0.0),
            margin: 0.0,
            sigmoid: Sigmoid::Gaussian,
            value_at_margin: 0.1,
        }
    }
}

impl Tolerance {
    /// Sets the bounds.
    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = (lower, upper);
        self
    }

    /// Sets the margin.
    pub fn margin(mut self, v: f64) -> Self {
        self.margin = v;
        self
    }

    /// Sets the sigmoid.
    pub fn sigmoid(mut self, v: Sigmoid) -> Self {
        self.sigmoid = v;
        self
    }

    /// Sets the value at the margin.
    pub fn value_at_margin(mut self, v: f64) -> Self {
        self.value_at_margin = v;
        self
    }
}

/// Returns 1 when `x` lies in `opts.bounds` and decays with the distance to the bounds otherwise.
///
/// With a zero margin the function is the indicator of the bounds.
pub fn tolerance(x: f64, opts: Tolerance) -> f64 {
    let (lower, upper) = opts.bounds;
    if lower <= x && x <= upper {
        return 1.0;
    }
    if opts.margin <= 0.0 {
        return 0.0;
    }
    let d = (if x < lower { lower - x } else { x - upper }) / opts.margin;
    opts.sigmoid.apply(d, opts.value_at_margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_bounds() {
        let opts = Tolerance::default().bounds(-1.0, 1.0).margin(1.0);
        assert_eq!(tolerance(0.5, opts), 1.0);
        assert_eq!(tolerance(1.0, opts), 1.0);
    }

    #[test]
    fn test_value_at_margin() {
        for sigmoid in [Sigmoid::Gaussian, Sigmoid::Linear, Sigmoid::Quadratic] {
            let opts = Tolerance::default()
                .margin(2.0)
                .sigmoid(sigmoid)
                .value_at_margin(0.5);
            assert!((tolerance(2.0, opts) - 0.5).abs() < 1e-9, "{:?}", sigmoid);
            assert!((tolerance(-2.0, opts) - 0.5).abs() < 1e-9, "{:?}", sigmoid);
        }
    }

    #[test]
    fn test_zero_margin_is_indicator() {
        let opts = Tolerance::default().bounds(0.0, 0.1);
        assert_eq!(tolerance(0.05, opts), 1.0);
        assert_eq!(tolerance(0.2, opts), 0.0);
    }

    #[test]
    fn test_quadratic_vanishes() {
        let opts = Tolerance::default()
            .margin(1.0)
            .sigmoid(Sigmoid::Quadratic)
            .value_at_margin(0.0);
        assert_eq!(tolerance(1.0, opts), 0.0);
        assert!((tolerance(0.5, opts) - 0.75).abs() < 1e-9);
    }
}
