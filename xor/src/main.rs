use cppneat::{logging::Stats, Genome, Population, PopulationConfig};
use cppneat_nn::genomics::{ActivationKind, CppnGenome, GeneticConfig};

use std::env;
use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ERROR_MARGIN: f64 = 0.3;
const PERFECT_SCORE: f64 = 16.0;

const CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Settings of an experiment, read from a RON file.
#[derive(Clone, Debug, Deserialize)]
struct Settings {
    genetic: GeneticConfig,
    population: PopulationConfig,
    replicates: usize,
    generations: usize,
    seed: u64,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            genetic: GeneticConfig {
                input_count: NonZeroUsize::new(2).unwrap(),
                feed_forward_only: false,
                activation_functions: vec![ActivationKind::Sigmoid],
                output_activation: Some(ActivationKind::Sigmoid),
                weight_mutation_rate: 0.8,
                new_neuron_rate: 0.03,
                new_link_rate: 0.05,
                disable_gene_rate: 0.75,
                weight_perturbation_rate: 0.9,
                mate_by_averaging_rate: 0.4,
                max_perturbation: 2.5,
                max_weight: 5.0,
                excess_genes_weight: 1.0,
                disjoint_genes_weight: 1.0,
                matching_genes_weight: 0.4,
                function_difference_weight: 0.0,
                iterations_to_clear_link_cache: 1,
                ..GeneticConfig::zero()
            },
            population: PopulationConfig {
                size: NonZeroUsize::new(150).unwrap(),
                compatibility_distance_threshold: 3.0,
                no_innovation_threshold: NonZeroUsize::new(15).unwrap(),
                survival_threshold: 0.2,
                inter_species_mating_rate: 0.001,
                crossover_rate: 0.75,
                species_champion_threshold: 5,
            },
            replicates: 100,
            generations: 100,
            seed: 0,
        }
    }
}

fn score_xor(genome: &mut CppnGenome) -> f64 {
    let network = genome.network();

    let mut errors = [0.0; 4];
    for (error, (input, expected)) in errors.iter_mut().zip(CASES) {
        network.reset();
        *error = match network.get_activation(&input) {
            Ok(output) => (output - expected).abs(),
            Err(_) => 1.0,
        };
        if *error < ERROR_MARGIN {
            *error = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f64>()).powi(2)
}

/// Evolves one population, returning the generation
/// at which XOR was solved, if it was.
fn run(settings: &Settings, seed: u64) -> Result<Option<usize>, cppneat::PopulationError> {
    let mut population = Population::new(
        settings.population.clone(),
        settings.genetic.clone(),
        score_xor,
        seed,
    )?;
    population.initialise();

    for _ in 0..settings.generations {
        if let Some(champion) = population.champion() {
            if (champion.fitness() - PERFECT_SCORE).abs() < f64::EPSILON {
                info!(seed, generation = population.generation(), "solved:\n{}", champion);
                return Ok(Some(population.generation()));
            }
        }
        if let Err(e) = population.generational_iterate() {
            warn!(seed, "{}", e);
            break;
        }
    }
    Ok(None)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = match env::args().nth(1) {
        Some(path) => ron::from_str(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    let generations = (0..settings.replicates)
        .into_par_iter()
        .map(|replicate| run(&settings, settings.seed + replicate as u64))
        .collect::<Result<Vec<_>, _>>()?;

    let failures = generations.iter().filter(|g| g.is_none()).count();
    println!(
        "Successful run generation count {:?}, {}% failure rate over {} replicates",
        Stats::from(generations.iter().flatten().map(|g| *g as f64)),
        failures as f64 * 100.0 / settings.replicates.max(1) as f64,
        settings.replicates
    );
    Ok(())
}
