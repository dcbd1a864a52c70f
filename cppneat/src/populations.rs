//! A Population is a collection of genomes.
//! These are grouped into species, which are
//! evolved generation by generation using a genome
//! score function as the source of selective pressure.
mod config;
mod errors;
mod events;
pub mod logging;
mod offspring_factory;
mod species;

use crate::{Genome, InnovationHistory};
pub use config::PopulationConfig;
pub use errors::{ConfigError, PopulationError};
pub use events::{Listener, PopulationEvent};
use offspring_factory::OffspringFactory;
pub use species::{Species, SpeciesID};

use rand::prelude::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

/// The score function of a population.
pub type ScoreFunction<G> = Box<dyn FnMut(&mut G) -> f64 + Send>;

/// A speciated population of genomes, evolved
/// generationally.
///
/// A population starts out empty, and is filled
/// with default genomes by [`initialise`]. Each call
/// to [`generational_iterate`] then replaces the whole
/// population with the next generation.
///
/// All randomness is drawn from a [`ChaCha8Rng`] seeded
/// at construction, so populations built with the same
/// seed, configurations and score function evolve identically.
///
/// [`initialise`]: Population::initialise
/// [`generational_iterate`]: Population::generational_iterate
pub struct Population<C, H, G> {
    species: Vec<Species<G>>,
    history: H,
    generation: usize,
    historical_species_count: usize,
    initialised: bool,
    population_config: PopulationConfig,
    genetic_config: C,
    score: ScoreFunction<G>,
    listeners: Vec<Listener<G>>,
    rng: ChaCha8Rng,
}

impl<C, H, G> Population<C, H, G>
where
    H: InnovationHistory<Config = C>,
    G: Genome<InnovationHistory = H, Config = C>,
{
    /// Creates a new, empty population using the passed
    /// configurations and score function.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{CppnGenome as G, GeneticConfig};
    /// use cppneat::{Population, PopulationConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     ..PopulationConfig::zero()
    /// };
    /// # let genetic_config = GeneticConfig::zero();
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(
    ///     pop_config,
    ///     genetic_config,
    ///     |_genome| 1.0,
    ///     42,
    /// ).unwrap();
    /// assert_eq!(population.genomes().count(), 0);
    /// ```
    pub fn new<S>(
        population_config: PopulationConfig,
        genetic_config: C,
        score: S,
        seed: u64,
    ) -> Result<Population<C, H, G>, PopulationError>
    where
        S: FnMut(&mut G) -> f64 + Send + 'static,
    {
        population_config.validate()?;
        G::validate_config(&genetic_config).map_err(PopulationError::InvalidGeneticConfig)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Population {
            species: vec![],
            history: H::new(&genetic_config, &mut rng),
            generation: 0,
            historical_species_count: 0,
            initialised: false,
            population_config,
            genetic_config,
            score: Box::new(score),
            listeners: vec![],
            rng,
        })
    }

    /// Registers a listener for the population's lifecycle events.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{CppnGenome as G, GeneticConfig};
    /// use cppneat::{Population, PopulationConfig, PopulationEvent};
    /// use std::sync::{Arc, Mutex};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    ///     |_genome| 1.0,
    ///     0,
    /// ).unwrap();
    ///
    /// let added = Arc::new(Mutex::new(0));
    /// let counter = Arc::clone(&added);
    /// population.subscribe(move |event| {
    ///     if let PopulationEvent::GenomeAdded(_) = event {
    ///         *counter.lock().unwrap() += 1;
    ///     }
    /// });
    /// population.initialise();
    /// assert_eq!(*added.lock().unwrap(), 1);
    /// ```
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: FnMut(&PopulationEvent<'_, G>) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Fills the population with [`size`] default genomes,
    /// scoring and speciating each of them. Any previous
    /// contents are discarded, and the generation count is reset.
    ///
    /// [`size`]: PopulationConfig::size
    pub fn initialise(&mut self) {
        self.species.clear();
        self.generation = 0;
        for _ in 0..self.population_config.size.get() {
            let genome = G::new(&mut self.history, &self.genetic_config, &mut self.rng);
            self.add_genome(genome);
        }
        self.initialised = true;
        debug!(species = self.species.len(), "population initialised");
    }

    /// Produces the next generation: selects parents from
    /// every breeding species, replaces the population with
    /// species champions, mutated copies and mutated crossover
    /// children, and updates each species' stagnation record.
    ///
    /// # Errors
    /// Returns [`Uninitialised`] if [`initialise`] was never called,
    /// and [`Failed`] without doing anything if no species is able
    /// to breed with a positive average fitness.
    ///
    /// [`Uninitialised`]: PopulationError::Uninitialised
    /// [`Failed`]: PopulationError::Failed
    /// [`initialise`]: Population::initialise
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{CppnGenome as G, GeneticConfig};
    /// use cppneat::{Population, PopulationConfig, PopulationError};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(10).unwrap(),
    ///         survival_threshold: 0.5,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    ///     |_genome| 1.0,
    ///     7,
    /// ).unwrap();
    ///
    /// assert!(matches!(
    ///     population.generational_iterate(),
    ///     Err(PopulationError::Uninitialised)
    /// ));
    /// population.initialise();
    /// population.generational_iterate().unwrap();
    /// assert_eq!(population.generation(), 1);
    /// ```
    pub fn generational_iterate(&mut self) -> Result<(), PopulationError> {
        if !self.initialised {
            return Err(PopulationError::Uninitialised);
        }
        if self.failed() {
            return Err(PopulationError::Failed {
                generation: self.generation,
            });
        }

        self.notify(PopulationEvent::IterationBegin(self.generation));

        let offspring = OffspringFactory::new(
            &self.species,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
        )
        .generate_offspring(&mut self.rng);

        self.clear_species();
        self.notify(PopulationEvent::SelectionComplete);

        for genome in offspring
            .champions
            .into_iter()
            .chain(offspring.mutants)
            .chain(offspring.children)
        {
            self.add_genome(genome);
        }

        self.update_species();
        self.history
            .generation_complete(self.generation, &self.genetic_config);
        self.notify(PopulationEvent::IterationComplete(self.generation));

        info!(
            generation = self.generation,
            species = self.species.len(),
            best = self.champion().map_or(0.0, |g| g.fitness()),
            average = self.average_score(),
            "generation complete"
        );
        if self.failed() {
            warn!(generation = self.generation, "population failed");
        }
        self.generation += 1;
        Ok(())
    }

    /// Scores `genome` if needed and places it in the
    /// first compatible species, or in a new one.
    fn add_genome(&mut self, mut genome: G) {
        if genome.fitness_expired() {
            let fitness = (self.score)(&mut genome);
            assert!(!fitness.is_nan(), "score function returned NaN");
            genome.set_fitness(fitness);
        }

        let index = match self.species.iter().position(|s| {
            s.accepts(&genome, &self.genetic_config, &self.population_config)
        }) {
            Some(index) => {
                self.species[index].add_genome(genome);
                index
            }
            None => {
                let id = SpeciesID(self.historical_species_count);
                self.historical_species_count += 1;
                trace!(species = id.0, "new species founded");
                self.species.push(Species::new(id, genome));
                self.species.len() - 1
            }
        };
        trace!(species = self.species[index].id().0, "genome speciated");

        let species = &self.species[index];
        let genome = species.representative();
        for listener in &mut self.listeners {
            listener(&PopulationEvent::GenomeAdded(genome));
        }
    }

    /// Empties every species, keeping their
    /// representatives and stagnation records.
    fn clear_species(&mut self) {
        for species in &mut self.species {
            for genome in species.clear() {
                for listener in &mut self.listeners {
                    listener(&PopulationEvent::GenomeRemoved(&genome));
                }
            }
        }
    }

    /// Updates stagnation records and
    /// removes species left without members.
    fn update_species(&mut self) {
        for species in &mut self.species {
            if species.record_generation(&self.population_config) {
                debug!(
                    species = species.id().0,
                    best = species.previous_score(),
                    "species stagnated"
                );
            }
        }
        self.species.retain(|s| !s.is_empty());
    }

    fn notify(&mut self, event: PopulationEvent<'_, G>) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Returns whether no species is able to breed with
    /// a positive average fitness. Iterating a failed
    /// population does nothing.
    pub fn failed(&self) -> bool {
        !self
            .species
            .iter()
            .any(|s| s.can_breed() && s.average_fitness() > 0.0)
    }

    /// Returns whether [`initialise`] has been called.
    ///
    /// [`initialise`]: Population::initialise
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Returns the currently best-performing genome,
    /// or `None` if the population is empty.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{CppnGenome as G, GeneticConfig};
    /// use cppneat::{Genome, Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut score = 0.0;
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    ///     move |_genome| {
    ///         score += 10.0;
    ///         score
    ///     },
    ///     0,
    /// ).unwrap();
    ///
    /// assert!(population.champion().is_none());
    /// population.initialise();
    /// assert_eq!(population.champion().unwrap().fitness(), 20.0 * 10.0);
    /// ```
    pub fn champion(&self) -> Option<&G> {
        self.genomes()
            .max_by(|g1, g2| species::compare_fitness(g1.fitness(), g2.fitness()))
    }

    /// Returns the mean score of all genomes,
    /// or 0 if the population is empty or failed.
    pub fn average_score(&self) -> f64 {
        let count = self.genomes().count();
        if count == 0 || self.failed() {
            return 0.0;
        }
        self.genomes().map(G::fitness).sum::<f64>() / count as f64
    }

    /// Returns an iterator over all current genomes.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{CppnGenome as G, GeneticConfig};
    /// use cppneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    ///     |_genome| 1.0,
    ///     0,
    /// ).unwrap();
    /// population.initialise();
    ///
    /// for genome in population.genomes() {
    ///     println!("{}", genome);
    /// }
    /// ```
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.species.iter().flat_map(|s| s.genomes())
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the configuration shared by all genomes.
    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::num::NonZeroUsize;
    use std::sync::{Arc, Mutex};

    /// A one-dimensional genome whose score is set
    /// directly by the tests' score functions.
    #[derive(Clone, Debug)]
    pub(crate) struct TestGenome {
        pub value: f64,
        fitness: f64,
        expired: bool,
    }

    impl TestGenome {
        pub(crate) fn with(value: f64, fitness: f64) -> TestGenome {
            TestGenome {
                value,
                fitness,
                expired: false,
            }
        }
    }

    pub(crate) struct TestHistory {
        pub completed_generations: Vec<usize>,
    }

    impl InnovationHistory for TestHistory {
        type Config = ();

        fn new<R: Rng + ?Sized>(_config: &(), _rng: &mut R) -> Self {
            TestHistory {
                completed_generations: vec![],
            }
        }

        fn generation_complete(&mut self, generation: usize, _config: &()) {
            self.completed_generations.push(generation);
        }
    }

    impl Genome for TestGenome {
        type Config = ();
        type InnovationHistory = TestHistory;

        fn new<R: Rng + ?Sized>(_history: &mut TestHistory, _config: &(), rng: &mut R) -> Self {
            TestGenome {
                value: rng.gen_range(0.0..1.0),
                fitness: 0.0,
                expired: true,
            }
        }

        fn compatibility_distance(first: &Self, second: &Self, _config: &()) -> f64 {
            (first.value - second.value).abs()
        }

        fn crossover<R: Rng + ?Sized>(parent: &Self, partner: &Self, _config: &(), _rng: &mut R) -> Self {
            TestGenome {
                value: (parent.value + partner.value) / 2.0,
                fitness: 0.0,
                expired: true,
            }
        }

        fn mutate<R: Rng + ?Sized>(&mut self, _history: &mut TestHistory, _config: &(), rng: &mut R) {
            self.value += rng.gen_range(-0.1..0.1);
            self.expired = true;
        }

        fn set_fitness(&mut self, fitness: f64) {
            self.fitness = fitness;
            self.expired = false;
        }

        fn fitness(&self) -> f64 {
            self.fitness
        }

        fn fitness_expired(&self) -> bool {
            self.expired
        }
    }

    fn config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            compatibility_distance_threshold: 0.25,
            no_innovation_threshold: NonZeroUsize::new(15).unwrap(),
            survival_threshold: 0.5,
            inter_species_mating_rate: 0.1,
            crossover_rate: 0.5,
            species_champion_threshold: 5,
        }
    }

    pub(crate) fn population(size: usize, seed: u64) -> Population<(), TestHistory, TestGenome> {
        Population::new(config(size), (), |g: &mut TestGenome| 1.0 + g.value.abs(), seed).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Population::<(), TestHistory, TestGenome>::new(
            PopulationConfig {
                survival_threshold: -0.5,
                ..config(10)
            },
            (),
            |_| 1.0,
            0,
        );
        assert!(matches!(
            result,
            Err(PopulationError::InvalidPopulationConfig(ConfigError::ProbabilityOutOfRange { .. }))
        ));
    }

    #[test]
    fn iterate_requires_initialisation() {
        let mut population = population(10, 0);
        assert!(matches!(
            population.generational_iterate(),
            Err(PopulationError::Uninitialised)
        ));
    }

    #[test]
    fn initialise_fills_population() {
        let mut population = population(30, 1);
        population.initialise();
        assert!(population.is_initialised());
        assert_eq!(population.genomes().count(), 30);
        assert!(population.species().count() >= 1);
        assert!(population.genomes().all(|g| !g.fitness_expired()));
        assert_eq!(population.generation(), 0);
    }

    #[test]
    fn population_size_never_grows() {
        let mut population = population(40, 2);
        population.initialise();
        for generation in 0..20 {
            population.generational_iterate().unwrap();
            assert!(population.genomes().count() <= 40);
            assert_eq!(population.generation(), generation + 1);
            assert!(population.species().all(|s| !s.is_empty()));
        }
        assert_eq!(population.history().completed_generations, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn events_are_emitted_in_order() {
        let log = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&log);
        let mut population = population(10, 3);
        population.subscribe(move |event| {
            let name = match event {
                PopulationEvent::IterationBegin(n) => format!("begin{}", n),
                PopulationEvent::SelectionComplete => "selected".to_string(),
                PopulationEvent::GenomeAdded(_) => "added".to_string(),
                PopulationEvent::GenomeRemoved(_) => "removed".to_string(),
                PopulationEvent::IterationComplete(n) => format!("complete{}", n),
            };
            sink.lock().unwrap().push(name);
        });
        population.initialise();
        population.generational_iterate().unwrap();

        let log = log.lock().unwrap();
        assert!(log[..10].iter().all(|e| e == "added"));
        assert_eq!(log[10], "begin0");
        assert!(log[11..21].iter().all(|e| e == "removed"));
        assert_eq!(log[21], "selected");
        let added = log[22..].iter().take_while(|e| *e == "added").count();
        assert!(added > 0 && added <= 10);
        assert_eq!(log[22 + added], "complete0");
        assert_eq!(log.len(), 23 + added);
    }

    #[test]
    fn zero_scores_fail_the_population() {
        let mut population =
            Population::<(), TestHistory, TestGenome>::new(config(10), (), |_| 0.0, 4).unwrap();
        population.initialise();
        assert!(population.failed());
        assert_eq!(population.average_score(), 0.0);
        assert!(matches!(
            population.generational_iterate(),
            Err(PopulationError::Failed { generation: 0 })
        ));
        assert_eq!(population.generation(), 0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed| {
            let mut population = population(25, seed);
            population.initialise();
            for _ in 0..10 {
                population.generational_iterate().unwrap();
            }
            population.genomes().map(|g| g.value).collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
