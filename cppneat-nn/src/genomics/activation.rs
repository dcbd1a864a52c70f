use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Smallest parameter drawn for parametrized functions.
pub const MIN_POWER: u32 = 2;
/// Largest parameter drawn for parametrized functions.
pub const MAX_POWER: u32 = 8;

/// An ActivationKind is a factory of activation
/// functions. Kinds are listed in the configuration,
/// and [instantiated] every time a new neuron needs
/// an activation function, so parametrized kinds
/// give each neuron its own random parameter.
///
/// [instantiated]: ActivationKind::instantiate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationKind {
    // x
    Linear,
    // x^a
    Polynomial,
    // log_a(|x|)
    Logarithmic,
    // a^x
    Exponential,
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // exp(-(2.5x)²)
    Gaussian,
    // sin(x)
    Sine,
    // exp(x)
    Euler,
    // tanh(x)
    Tanh,
}

impl ActivationKind {
    /// All available kinds.
    pub const ALL: [ActivationKind; 9] = [
        ActivationKind::Linear,
        ActivationKind::Polynomial,
        ActivationKind::Logarithmic,
        ActivationKind::Exponential,
        ActivationKind::Sigmoid,
        ActivationKind::Gaussian,
        ActivationKind::Sine,
        ActivationKind::Euler,
        ActivationKind::Tanh,
    ];

    /// Returns a new activation function of this kind.
    /// Parametrized kinds draw their parameter uniformly
    /// from [`MIN_POWER`]`..=`[`MAX_POWER`].
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{ActivationFunction, ActivationKind};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// assert_eq!(ActivationKind::Tanh.instantiate(&mut rng), ActivationFunction::Tanh);
    ///
    /// match ActivationKind::Polynomial.instantiate(&mut rng) {
    ///     ActivationFunction::Polynomial(a) => assert!((2..=8).contains(&a)),
    ///     other => panic!("unexpected function {}", other),
    /// }
    /// ```
    pub fn instantiate<R: Rng + ?Sized>(&self, rng: &mut R) -> ActivationFunction {
        match self {
            Self::Linear => ActivationFunction::Linear,
            Self::Polynomial => ActivationFunction::Polynomial(random_power(rng)),
            Self::Logarithmic => ActivationFunction::Logarithmic(random_power(rng)),
            Self::Exponential => ActivationFunction::Exponential(random_power(rng)),
            Self::Sigmoid => ActivationFunction::Sigmoid,
            Self::Gaussian => ActivationFunction::Gaussian,
            Self::Sine => ActivationFunction::Sine,
            Self::Euler => ActivationFunction::Euler,
            Self::Tanh => ActivationFunction::Tanh,
        }
    }
}

fn random_power<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(MIN_POWER..=MAX_POWER)
}

/// A concrete activation function of a hidden
/// or output neuron, with its parameter fixed.
///
/// Functions are compared by their [label], so
/// `Polynomial(2)` and `Polynomial(3)` are different
/// functions for the purposes of compatibility.
///
/// [label]: ActivationFunction::label
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    Linear,
    Polynomial(u32),
    Logarithmic(u32),
    Exponential(u32),
    Sigmoid,
    Gaussian,
    Sine,
    Euler,
    Tanh,
}

impl ActivationFunction {
    /// Applies the function to `x`.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::ActivationFunction;
    ///
    /// assert_eq!(ActivationFunction::Polynomial(3).apply(2.0), 8.0);
    /// assert_eq!(ActivationFunction::Exponential(2).apply(3.0), 8.0);
    /// assert_eq!(ActivationFunction::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationFunction::Tanh.apply(0.0), 0.0);
    /// ```
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Self::Linear => x,
            Self::Polynomial(a) => x.powi(a as i32),
            Self::Logarithmic(a) => x.abs().log(a as f64),
            Self::Exponential(a) => (a as f64).powf(x),
            Self::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            Self::Gaussian => (-(x * 2.5).powi(2)).exp(),
            Self::Sine => x.sin(),
            Self::Euler => x.exp(),
            Self::Tanh => x.tanh(),
        }
    }

    /// Returns the kind that produced this function.
    pub fn kind(&self) -> ActivationKind {
        match self {
            Self::Linear => ActivationKind::Linear,
            Self::Polynomial(_) => ActivationKind::Polynomial,
            Self::Logarithmic(_) => ActivationKind::Logarithmic,
            Self::Exponential(_) => ActivationKind::Exponential,
            Self::Sigmoid => ActivationKind::Sigmoid,
            Self::Gaussian => ActivationKind::Gaussian,
            Self::Sine => ActivationKind::Sine,
            Self::Euler => ActivationKind::Euler,
            Self::Tanh => ActivationKind::Tanh,
        }
    }

    /// Returns the function's human-readable label,
    /// e.g. `"tanh(x)"` or `"x^3"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "x"),
            Self::Polynomial(a) => write!(f, "x^{}", a),
            Self::Logarithmic(a) => write!(f, "log{}(x)", a),
            Self::Exponential(a) => write!(f, "{}^x", a),
            Self::Sigmoid => write!(f, "sig(x)"),
            Self::Gaussian => write!(f, "gauss(x)"),
            Self::Sine => write!(f, "sin(x)"),
            Self::Euler => write!(f, "e^x"),
            Self::Tanh => write!(f, "tanh(x)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn instantiation_preserves_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for kind in ActivationKind::ALL {
            for _ in 0..20 {
                assert_eq!(kind.instantiate(&mut rng).kind(), kind);
            }
        }
    }

    #[test]
    fn parameters_are_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            match ActivationKind::Logarithmic.instantiate(&mut rng) {
                ActivationFunction::Logarithmic(a) => assert!((MIN_POWER..=MAX_POWER).contains(&a)),
                other => panic!("unexpected function {}", other),
            }
        }
    }

    #[test]
    fn function_values() {
        assert_approx_eq!(ActivationFunction::Logarithmic(2).apply(-8.0), 3.0);
        assert_approx_eq!(ActivationFunction::Gaussian.apply(0.4), (-1.0f64).exp());
        assert_approx_eq!(ActivationFunction::Euler.apply(1.0), std::f64::consts::E);
        assert_approx_eq!(ActivationFunction::Sine.apply(std::f64::consts::FRAC_PI_2), 1.0);
        assert_eq!(ActivationFunction::Linear.apply(-1.25), -1.25);
    }

    #[test]
    fn labels() {
        assert_eq!(ActivationFunction::Polynomial(4).label(), "x^4");
        assert_eq!(ActivationFunction::Logarithmic(3).label(), "log3(x)");
        assert_eq!(ActivationFunction::Exponential(5).label(), "5^x");
        assert_eq!(ActivationFunction::Sigmoid.label(), "sig(x)");
        assert_eq!(ActivationFunction::Tanh.label(), "tanh(x)");
    }
}
