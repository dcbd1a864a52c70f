use crate::genomics::{GeneticConfig, NeuronGene};
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Link genes are the principal components of genomes.
/// They are created between two neurons, and become
/// synapses in the genome's phenotype.
///
/// A link's endpoints never change. Its weight
/// and enabled state are mutable.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LinkGene {
    id: Innovation,
    from: NeuronGene,
    to: NeuronGene,
    weight: f64,
    enabled: bool,
}

impl LinkGene {
    /// Returns a new _enabled_ link with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{ActivationFunction, LinkGene, NeuronGene, NeuronRole};
    ///
    /// let from = NeuronGene::new(2, 0.0, NeuronRole::Input, None);
    /// let to = NeuronGene::new(0, 1.0, NeuronRole::Output, Some(ActivationFunction::Tanh));
    /// let link = LinkGene::new(1, from, to, 0.5);
    ///
    /// assert!(link.enabled());
    /// assert_eq!(link.to_string(), "in2 – 0.50 -> out0:tanh(x)");
    /// ```
    pub fn new(id: Innovation, from: NeuronGene, to: NeuronGene, weight: f64) -> LinkGene {
        LinkGene {
            id,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight. Uses a uniform distribution
    /// over the range ±[`max_weight`].
    ///
    /// [`max_weight`]: GeneticConfig::max_weight
    pub fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f64 {
        if config.max_weight == 0.0 {
            0.0
        } else {
            rng.gen_range(-config.max_weight..=config.max_weight)
        }
    }

    /// Mutates the gene's weight: with probability
    /// [`weight_perturbation_rate`] it is nudged by a uniform
    /// amount in ±[`max_perturbation`], and otherwise reset to a
    /// [random weight]. Weights are not clamped.
    ///
    /// [`weight_perturbation_rate`]: GeneticConfig::weight_perturbation_rate
    /// [`max_perturbation`]: GeneticConfig::max_perturbation
    /// [random weight]: LinkGene::random_weight
    pub(super) fn mutate_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        if rng.gen::<f64>() < config.weight_perturbation_rate {
            if config.max_perturbation > 0.0 {
                self.weight += rng.gen_range(-config.max_perturbation..=config.max_perturbation);
            }
        } else {
            self.weight = Self::random_weight(config, rng);
        }
    }

    /// Returns the link's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the link's source neuron.
    pub fn from(&self) -> &NeuronGene {
        &self.from
    }

    /// Returns the link's target neuron.
    pub fn to(&self) -> &NeuronGene {
        &self.to
    }

    /// Returns the `(source, target)` innovation numbers.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.from.id(), self.to.id())
    }

    /// Returns the link's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the link's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the link is expressed.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for LinkGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {:.2} -> {}", self.from, self.weight, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationFunction, NeuronRole};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn link() -> LinkGene {
        LinkGene::new(
            4,
            NeuronGene::new(1, 0.0, NeuronRole::Bias, None),
            NeuronGene::new(0, 1.0, NeuronRole::Output, Some(ActivationFunction::Tanh)),
            1.0,
        )
    }

    #[test]
    fn perturbation_is_bounded() {
        let config = GeneticConfig {
            weight_perturbation_rate: 1.0,
            max_perturbation: 0.25,
            max_weight: 100.0,
            ..GeneticConfig::zero()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let mut gene = link();
            gene.mutate_weight(&config, &mut rng);
            assert!((gene.weight() - 1.0).abs() <= 0.25);
        }
    }

    #[test]
    fn reset_is_bounded() {
        let config = GeneticConfig {
            weight_perturbation_rate: 0.0,
            max_weight: 2.0,
            ..GeneticConfig::zero()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..100 {
            let mut gene = link();
            gene.mutate_weight(&config, &mut rng);
            assert!(gene.weight().abs() <= 2.0);
        }
    }

    #[test]
    fn endpoints() {
        assert_eq!(link().endpoints(), (1, 0));
        assert_eq!(link().to_string(), "bias – 1.00 -> out0:tanh(x)");
    }
}
