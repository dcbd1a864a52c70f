use crate::genomics::ActivationFunction;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NeuronRole indicates the function of
/// the neuron's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronRole {
    /// Constant 1.0 signal.
    Bias,
    /// Input neurons.
    Input,
    /// Hidden neurons.
    Hidden,
    /// The output neuron.
    Output,
}

impl NeuronRole {
    /// Returns whether links may target neurons of this role.
    pub fn accepts_links(&self) -> bool {
        matches!(self, NeuronRole::Hidden | NeuronRole::Output)
    }
}

/// Neurons are the structural elements of genomes
/// between which link genes are created.
///
/// Neurons are immutable once created by the [`History`],
/// and identified by their innovation number.
///
/// [`History`]: crate::genomics::History
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronGene {
    id: Innovation,
    level: f64,
    role: NeuronRole,
    activation: Option<ActivationFunction>,
}

impl NeuronGene {
    /// Returns a new neuron with the specified parameters.
    ///
    /// # Panics
    /// Panics if an activation function is given for a
    /// bias or input neuron, or is missing for a hidden
    /// or output neuron.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{ActivationFunction, NeuronGene, NeuronRole};
    ///
    /// let neuron = NeuronGene::new(7, 0.5, NeuronRole::Hidden, Some(ActivationFunction::Tanh));
    /// assert_eq!(neuron.to_string(), "hidden7:tanh(x)");
    ///
    /// let input = NeuronGene::new(2, 0.0, NeuronRole::Input, None);
    /// assert_eq!(input.to_string(), "in2");
    /// ```
    pub fn new(
        id: Innovation,
        level: f64,
        role: NeuronRole,
        activation: Option<ActivationFunction>,
    ) -> NeuronGene {
        assert_eq!(
            role.accepts_links(),
            activation.is_some(),
            "{:?} neuron {} has a mismatched activation function",
            role,
            id
        );
        NeuronGene {
            id,
            level,
            role,
            activation,
        }
    }

    /// Returns the neuron's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the neuron's level: 0 for bias and inputs,
    /// 1 for the output, and in between for hidden neurons.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Returns the neuron's role.
    pub fn role(&self) -> NeuronRole {
        self.role
    }

    /// Returns the neuron's activation function,
    /// or `None` for bias and input neurons.
    pub fn activation(&self) -> Option<ActivationFunction> {
        self.activation
    }
}

impl fmt::Display for NeuronGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.role, self.activation) {
            (NeuronRole::Bias, _) => write!(f, "bias"),
            (NeuronRole::Input, _) => write!(f, "in{}", self.id),
            (NeuronRole::Hidden, Some(function)) => write!(f, "hidden{}:{}", self.id, function),
            (NeuronRole::Output, Some(function)) => write!(f, "out{}:{}", self.id, function),
            (role, None) => write!(f, "{:?}{}", role, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(NeuronGene::new(1, 0.0, NeuronRole::Bias, None).to_string(), "bias");
        assert_eq!(
            NeuronGene::new(0, 1.0, NeuronRole::Output, Some(ActivationFunction::Sigmoid)).to_string(),
            "out0:sig(x)"
        );
    }

    #[test]
    #[should_panic]
    fn input_with_activation() {
        NeuronGene::new(2, 0.0, NeuronRole::Input, Some(ActivationFunction::Tanh));
    }

    #[test]
    #[should_panic]
    fn hidden_without_activation() {
        NeuronGene::new(5, 0.5, NeuronRole::Hidden, None);
    }
}
