use crate::genomics::ActivationKind;
use cppneat::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Genomes with at most this many links are compared
/// without normalizing by their size.
pub const DEFAULT_SMALL_GENOME_THRESHOLD: usize = 20;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0], which
/// is checked by [`validate`].
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Whether links must go from lower to higher
    /// neuron levels, forbidding cycles.
    pub feed_forward_only: bool,
    /// Activation function kinds assigned to new neurons.
    /// If an empty vector is given, neurons will default
    /// to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: ActivationKind::Sigmoid
    pub activation_functions: Vec<ActivationKind>,
    /// Activation function kind of the output neuron.
    /// If `None`, one is chosen from [`activation_functions`].
    ///
    /// [`activation_functions`]: GeneticConfig::activation_functions
    pub output_activation: Option<ActivationKind>,
    /// Chance of each link's weight being mutated
    /// when a genome mutates.
    pub weight_mutation_rate: f64,
    /// Chance of a link being split by a new neuron
    /// when a genome mutates.
    pub new_neuron_rate: f64,
    /// Chance of a new link being added when a genome mutates.
    pub new_link_rate: f64,
    /// Chance that a common gene is disabled in a child
    /// if it was disabled in either parent.
    pub disable_gene_rate: f64,
    /// Chance of a mutated weight being nudged instead of reset.
    pub weight_perturbation_rate: f64,
    /// Chance that common gene weights are averaged during crossover,
    /// instead of copying the weight from a randomly chosen parent.
    pub mate_by_averaging_rate: f64,
    /// Magnitude of bound on weight nudges.
    pub max_perturbation: f64,
    /// Magnitude of bound on new and reset weights.
    pub max_weight: f64,
    /// Weight of excess genes in compatibility distance.
    pub excess_genes_weight: f64,
    /// Weight of disjoint genes in compatibility distance.
    pub disjoint_genes_weight: f64,
    /// Weight of the average common gene weight
    /// difference in compatibility distance.
    pub matching_genes_weight: f64,
    /// Weight of the activation function difference
    /// in compatibility distance.
    pub function_difference_weight: f64,
    /// Number of generations after which the history
    /// forgets link innovations. 0 never forgets.
    pub iterations_to_clear_link_cache: usize,
    /// Genomes with at most this many links are compared
    /// without normalizing excess and disjoint counts.
    pub small_genome_threshold: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `false`, empty, or `None`, except
    /// `input_count`, which is 1, and `small_genome_threshold`,
    /// which is [`DEFAULT_SMALL_GENOME_THRESHOLD`].
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     new_link_rate: 0.1,
    ///     max_weight: 3.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(cfg2.validate().is_ok());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            feed_forward_only: false,
            activation_functions: vec![],
            output_activation: None,
            weight_mutation_rate: 0.0,
            new_neuron_rate: 0.0,
            new_link_rate: 0.0,
            disable_gene_rate: 0.0,
            weight_perturbation_rate: 0.0,
            mate_by_averaging_rate: 0.0,
            max_perturbation: 0.0,
            max_weight: 0.0,
            excess_genes_weight: 0.0,
            disjoint_genes_weight: 0.0,
            matching_genes_weight: 0.0,
            function_difference_weight: 0.0,
            iterations_to_clear_link_cache: 0,
            small_genome_threshold: DEFAULT_SMALL_GENOME_THRESHOLD,
        }
    }

    /// Checks that all probabilities lie in [0, 1]
    /// and that bounds and coefficients are not negative.
    ///
    /// # Errors
    /// Returns the first offending field.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     max_weight: -1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("weight_mutation_rate", self.weight_mutation_rate),
            ("new_neuron_rate", self.new_neuron_rate),
            ("new_link_rate", self.new_link_rate),
            ("disable_gene_rate", self.disable_gene_rate),
            ("weight_perturbation_rate", self.weight_perturbation_rate),
            ("mate_by_averaging_rate", self.mate_by_averaging_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("max_perturbation", self.max_perturbation),
            ("max_weight", self.max_weight),
            ("excess_genes_weight", self.excess_genes_weight),
            ("disjoint_genes_weight", self.disjoint_genes_weight),
            ("matching_genes_weight", self.matching_genes_weight),
            ("function_difference_weight", self.function_difference_weight),
        ] {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::NegativeValue { name, value });
            }
        }
        Ok(())
    }

    /// Returns the activation kinds new neurons choose from.
    pub(crate) fn canonical_functions(&self) -> &[ActivationKind] {
        if self.activation_functions.is_empty() {
            &[ActivationKind::Sigmoid]
        } else {
            &self.activation_functions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_are_checked() {
        let cfg = GeneticConfig {
            disable_gene_rate: 1.5,
            ..GeneticConfig::zero()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "disable_gene_rate",
                value: 1.5
            })
        );
    }

    #[test]
    fn empty_function_list_defaults_to_sigmoid() {
        assert_eq!(GeneticConfig::zero().canonical_functions(), &[ActivationKind::Sigmoid]);
        let cfg = GeneticConfig {
            activation_functions: vec![ActivationKind::Tanh, ActivationKind::Sine],
            ..GeneticConfig::zero()
        };
        assert_eq!(cfg.canonical_functions().len(), 2);
    }

    #[test]
    fn config_deserializes() {
        let cfg: GeneticConfig = serde_json::from_str(
            r#"{
                "input_count": 2,
                "feed_forward_only": true,
                "activation_functions": ["Tanh", "Gaussian"],
                "output_activation": "Sigmoid",
                "weight_mutation_rate": 0.8,
                "new_neuron_rate": 0.03,
                "new_link_rate": 0.05,
                "disable_gene_rate": 0.75,
                "weight_perturbation_rate": 0.9,
                "mate_by_averaging_rate": 0.4,
                "max_perturbation": 0.5,
                "max_weight": 5.0,
                "excess_genes_weight": 1.0,
                "disjoint_genes_weight": 1.0,
                "matching_genes_weight": 0.4,
                "function_difference_weight": 0.2,
                "iterations_to_clear_link_cache": 1,
                "small_genome_threshold": 20
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.input_count.get(), 2);
        assert_eq!(cfg.output_activation, Some(ActivationKind::Sigmoid));
        assert!(cfg.validate().is_ok());
    }
}
