use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0], which
/// is checked by [`validate`].
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Compatibility distance up to which (inclusive)
    /// a genome is accepted into a species.
    pub compatibility_distance_threshold: f64,
    /// Number of consecutive generations without an
    /// improvement of a species' best score after which
    /// the species stops breeding.
    pub no_innovation_threshold: NonZeroUsize,
    /// Top % of each species which can participate
    /// in reproduction.
    pub survival_threshold: f64,
    /// Chance that the partner of a crossover is chosen
    /// from the whole population instead of the species.
    pub inter_species_mating_rate: f64,
    /// Fraction of a species' offspring produced by
    /// crossover (as opposed to mutated copies).
    pub crossover_rate: f64,
    /// Species with more members than this keep
    /// an unmodified copy of their best genome.
    pub species_champion_threshold: usize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use cppneat::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     survival_threshold: 0.2,
    ///     crossover_rate: 0.75,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(cfg.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            compatibility_distance_threshold: 0.0,
            no_innovation_threshold: NonZeroUsize::MIN,
            survival_threshold: 0.0,
            inter_species_mating_rate: 0.0,
            crossover_rate: 0.0,
            species_champion_threshold: 0,
        }
    }

    /// Checks that all probabilities lie in [0, 1]
    /// and that the distance threshold is not negative.
    ///
    /// # Errors
    /// Returns the first offending field.
    ///
    /// # Examples
    /// ```
    /// use cppneat::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     crossover_rate: 1.5,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("survival_threshold", self.survival_threshold),
            ("inter_species_mating_rate", self.inter_species_mating_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        if self.compatibility_distance_threshold < 0.0 {
            return Err(ConfigError::NegativeValue {
                name: "compatibility_distance_threshold",
                value: self.compatibility_distance_threshold,
            });
        }
        Ok(())
    }
}
