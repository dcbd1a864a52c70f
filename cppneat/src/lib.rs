//! A generational NeuroEvolution of Augmenting Topologies
//! engine, geared towards evolving Compositional Pattern
//! Producing Networks (CPPNs).
//!
//! The engine is generic over genomes via the [`Genome`] and
//! [`InnovationHistory`] traits. A [`Population`] speciates its
//! genomes by compatibility distance, scores them with a
//! caller-supplied function, and breeds each new generation with
//! fitness sharing, elitism and stagnation tracking. All randomness
//! comes from a single seeded generator, so runs are reproducible.
//!
//! A CPPN genome representation is supplied by the `cppneat-nn` crate.
//!
//! # Example usage: Evolution of XOR function approximator, using `cppneat-nn`
//! ```
//! use cppneat::{Genome, Population, PopulationConfig};
//! use cppneat_nn::genomics::{ActivationKind, CppnGenome, GeneticConfig};
//! use std::num::NonZeroUsize;
//!
//! const CASES: [([f64; 2], f64); 4] = [
//!     ([0.0, 0.0], 0.0),
//!     ([0.0, 1.0], 1.0),
//!     ([1.0, 0.0], 1.0),
//!     ([1.0, 1.0], 0.0),
//! ];
//!
//! fn score_xor(genome: &mut CppnGenome) -> f64 {
//!     let network = genome.network();
//!     let mut error = 0.0;
//!     for (input, expected) in CASES {
//!         network.reset();
//!         error += match network.get_activation(&input) {
//!             Ok(output) => (output - expected).abs(),
//!             Err(_) => 1.0,
//!         };
//!     }
//!     (4.0 - error).powi(2)
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         activation_functions: vec![ActivationKind::Sigmoid, ActivationKind::Gaussian],
//!         output_activation: Some(ActivationKind::Sigmoid),
//!         weight_mutation_rate: 0.8,
//!         new_neuron_rate: 0.03,
//!         new_link_rate: 0.05,
//!         disable_gene_rate: 0.75,
//!         weight_perturbation_rate: 0.9,
//!         mate_by_averaging_rate: 0.4,
//!         max_perturbation: 0.5,
//!         max_weight: 5.0,
//!         excess_genes_weight: 1.0,
//!         disjoint_genes_weight: 1.0,
//!         matching_genes_weight: 0.4,
//!         function_difference_weight: 0.5,
//!         iterations_to_clear_link_cache: 1,
//!         ..GeneticConfig::zero()
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(50).unwrap(),
//!         compatibility_distance_threshold: 3.0,
//!         no_innovation_threshold: NonZeroUsize::new(15).unwrap(),
//!         survival_threshold: 0.2,
//!         inter_species_mating_rate: 0.001,
//!         crossover_rate: 0.75,
//!         species_champion_threshold: 5,
//!     };
//!
//!     let mut population =
//!         Population::new(population_config, genetic_config, score_xor, 7).unwrap();
//!     population.initialise();
//!     for _ in 0..20 {
//!         if let Err(e) = population.generational_iterate() {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//!     if let Some(champion) = population.champion() {
//!         println!("Best score {}:\n{}", champion.fitness(), champion);
//!     }
//! }
//! ```

mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
