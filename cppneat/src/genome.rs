use rand::Rng;

use std::error::Error;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// Every operation that needs randomness receives the population's
/// random source explicitly, so that a population seeded with a
/// fixed value always evolves the same way.
///
/// [`Population`]: crate::Population
pub trait Genome: Clone {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Checks a genetic configuration before a population is built with it.
    fn validate_config(_config: &Self::Config) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    /// Returns a genome with the default (minimal) topology and random weights.
    fn new<R: Rng + ?Sized>(
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Returns the compatibility distance between two genomes.
    fn compatibility_distance(first: &Self, second: &Self, config: &Self::Config) -> f64;

    /// Combines two genomes and returns a child genome.
    /// `parent` and `partner` may be the same genome.
    fn crossover<R: Rng + ?Sized>(
        parent: &Self,
        partner: &Self,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Applies a single random mutation to the genome.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Sets the genome's fitness value, which should be non-negative.
    fn set_fitness(&mut self, fitness: f64);

    /// Returns the genome's last assigned fitness value.
    fn fitness(&self) -> f64;

    /// Returns whether the genome changed since its fitness was last set.
    fn fitness_expired(&self) -> bool;
}

/// An Innovation History keeps track of structural
/// innovations throughout successive generations of genomes.
///
/// The exact function and utility of the
/// InnovationHistory is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Called by the population once a generation has been completed.
    fn generation_complete(&mut self, _generation: usize, _config: &Self::Config) {}
}
