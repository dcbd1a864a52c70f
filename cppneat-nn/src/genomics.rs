//! Genetic encoding of CPPN networks.
//!
//! A [`CppnGenome`] owns a [`GeneCollection`] of link genes,
//! whose neurons are created and numbered by a shared
//! [`History`]. Genomes are compared through their
//! [`DifferenceAnalysis`], and express themselves as a
//! [`Network`].
//!
//! [`Network`]: crate::networks::Network
mod activation;
mod config;
mod difference;
mod errors;
mod gene_collection;
mod genes;
mod history;
mod nodes;

pub use activation::{ActivationFunction, ActivationKind, MAX_POWER, MIN_POWER};
pub use config::{GeneticConfig, DEFAULT_SMALL_GENOME_THRESHOLD};
pub use cppneat::ConfigError;
pub use difference::{compatibility_distance, function_difference, DifferenceAnalysis};
pub use errors::GeneError;
pub use gene_collection::{GeneCollection, NeuronSplit};
pub use genes::LinkGene;
pub use history::History;
pub use nodes::{NeuronGene, NeuronRole};

use crate::networks::{Network, NetworkError};

use cppneat::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// A CPPN genome, usable in `cppneat` [`Population`]s.
///
/// The genome's phenotype is built the first time it is
/// needed, and rebuilt after any change to the genes.
///
/// [`Population`]: cppneat::Population
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CppnGenome {
    genes: GeneCollection,
    fitness: f64,
    fitness_expired: bool,
    #[serde(skip)]
    network: Option<Network>,
}

impl CppnGenome {
    /// Returns a genome over `genes`, with an expired fitness.
    pub fn from_genes(genes: GeneCollection) -> CppnGenome {
        CppnGenome {
            genes,
            fitness: 0.0,
            fitness_expired: true,
            network: None,
        }
    }

    /// Returns the genome's genes.
    pub fn genes(&self) -> &GeneCollection {
        &self.genes
    }

    /// Returns the genome's genes for modification.
    /// The genome's fitness and phenotype are invalidated.
    pub fn genes_mut(&mut self) -> &mut GeneCollection {
        self.invalidate();
        &mut self.genes
    }

    /// Returns the genome's phenotype, building it if needed.
    ///
    /// # Examples
    /// ```
    /// use cppneat::Genome;
    /// use cppneat_nn::genomics::{CppnGenome, GeneticConfig, History};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let mut history = History::new(&config, &mut rng);
    /// let mut genome = CppnGenome::new(&mut history, &config, &mut rng);
    ///
    /// // Zero weights: the sigmoid output sees no input.
    /// assert_eq!(genome.network().get_activation(&[1.0]), Ok(0.5));
    /// ```
    pub fn network(&mut self) -> &mut Network {
        let genes = &self.genes;
        self.network.get_or_insert_with(|| Network::from(genes))
    }

    /// Evaluates the genome's phenotype for `inputs`.
    ///
    /// # Errors
    /// Returns an error if the number of inputs is wrong.
    pub fn get_activation(&mut self, inputs: &[f64]) -> Result<f64, NetworkError> {
        self.network().get_activation(inputs)
    }

    /// Adds a link between a random pair of unlinked neurons.
    /// Returns the new link's id, if one was added.
    pub fn mutate_add_link<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<crate::Innovation> {
        let link = self.genes.try_create_link(history, config, rng)?;
        self.invalidate();
        Some(link)
    }

    /// Splits a random enabled link with a hidden neuron.
    pub fn mutate_add_neuron<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<NeuronSplit> {
        let split = self.genes.try_create_neuron(history, config, rng)?;
        self.invalidate();
        Some(split)
    }

    /// Mutates the genome's link weights.
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.genes.mutate_weights(config, rng);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.fitness_expired = true;
        self.network = None;
    }
}

impl Genome for CppnGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    fn validate_config(config: &GeneticConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(config.validate()?)
    }

    fn new<R: Rng + ?Sized>(history: &mut History, config: &GeneticConfig, rng: &mut R) -> CppnGenome {
        let mut genes = GeneCollection::new(config.feed_forward_only);
        genes.initialise(history, config, rng);
        CppnGenome::from_genes(genes)
    }

    fn compatibility_distance(first: &CppnGenome, second: &CppnGenome, config: &GeneticConfig) -> f64 {
        compatibility_distance(&first.genes, &second.genes, config)
    }

    /// Matching genes are inherited with weights either averaged
    /// or picked from either parent, and stay disabled with
    /// probability [`disable_gene_rate`] if disabled in either.
    /// Disjoint and excess genes are inherited from the fitter
    /// parent, or from a random one if both are equally fit.
    ///
    /// [`disable_gene_rate`]: GeneticConfig::disable_gene_rate
    fn crossover<R: Rng + ?Sized>(
        parent: &CppnGenome,
        partner: &CppnGenome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> CppnGenome {
        let analysis = DifferenceAnalysis::new(&parent.genes, &partner.genes);
        let average = rng.gen::<f64>() < config.mate_by_averaging_rate;

        let mut children = Vec::with_capacity(parent.genes.len().max(partner.genes.len()));
        for (own, other) in &analysis.matches {
            let weight = if average {
                (own.weight() + other.weight()) / 2.0
            } else if rng.gen::<bool>() {
                own.weight()
            } else {
                other.weight()
            };
            let mut gene = LinkGene::new(own.id(), *own.from(), *own.to(), weight);
            if (!own.enabled() || !other.enabled()) && rng.gen::<f64>() < config.disable_gene_rate {
                gene.set_enabled(false);
            }
            children.push(gene);
        }

        let parent_is_fitter = match parent.fitness.partial_cmp(&partner.fitness) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) => false,
            _ => rng.gen(),
        };
        let (disjoint, excess) = if parent_is_fitter {
            (&analysis.first_disjoint, &analysis.first_excess)
        } else {
            (&analysis.second_disjoint, &analysis.second_excess)
        };
        children.extend(disjoint.iter().chain(excess).map(|gene| **gene));

        let mut genes = GeneCollection::new(config.feed_forward_only);
        genes.extend(children);
        CppnGenome::from_genes(genes)
    }

    /// Adds a link with probability [`new_link_rate`], then
    /// splits a link with probability [`new_neuron_rate`], then
    /// mutates each link's weight with probability
    /// [`weight_mutation_rate`].
    ///
    /// [`new_link_rate`]: GeneticConfig::new_link_rate
    /// [`new_neuron_rate`]: GeneticConfig::new_neuron_rate
    /// [`weight_mutation_rate`]: GeneticConfig::weight_mutation_rate
    fn mutate<R: Rng + ?Sized>(&mut self, history: &mut History, config: &GeneticConfig, rng: &mut R) {
        if rng.gen::<f64>() < config.new_link_rate
            && self.mutate_add_link(history, config, rng).is_none()
        {
            debug!("no link could be added");
        }
        if rng.gen::<f64>() < config.new_neuron_rate
            && self.mutate_add_neuron(history, config, rng).is_none()
        {
            debug!("no link could be split");
        }
        self.mutate_weights(config, rng);
    }

    /// # Panics
    /// Panics if `fitness` is negative or NaN.
    fn set_fitness(&mut self, fitness: f64) {
        assert!(fitness >= 0.0, "fitness function returned {}", fitness);
        self.fitness = fitness;
        self.fitness_expired = false;
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn fitness_expired(&self) -> bool {
        self.fitness_expired
    }
}

impl fmt::Display for CppnGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for link in self.genes.valid_links() {
            writeln!(f, "{}", link)?;
        }
        Ok(())
    }
}
