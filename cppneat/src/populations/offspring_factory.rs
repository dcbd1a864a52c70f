use super::*;

use rand::seq::SliceRandom;
use tracing::debug;

/// The genomes making up the next generation,
/// in insertion order.
pub(super) struct Offspring<G> {
    /// Unmodified copies of species champions.
    pub champions: Vec<G>,
    /// Mutated copies of single breeders.
    pub mutants: Vec<G>,
    /// Mutated children of two breeders.
    pub children: Vec<G>,
}

impl<G> Offspring<G> {
    fn len(&self) -> usize {
        self.champions.len() + self.mutants.len() + self.children.len()
    }
}

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs.
pub(super) struct OffspringFactory<'a, C, H, G> {
    species: &'a [Species<G>],
    history: &'a mut H,
    genetic_config: &'a C,
    population_config: &'a PopulationConfig,
}

impl<'a, C, H, G> OffspringFactory<'a, C, H, G>
where
    G: Genome<InnovationHistory = H, Config = C>,
{
    pub(super) fn new(
        species: &'a [Species<G>],
        history: &'a mut H,
        genetic_config: &'a C,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a, C, H, G> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
        }
    }

    /// Generate the next generation, never exceeding
    /// the current population size.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Offspring<G> {
        let all_species: &'a [Species<G>] = self.species;
        let population: Vec<&G> = all_species.iter().flat_map(|s| s.genomes()).collect();
        let limit = population.len();
        let mut offspring = Offspring {
            champions: self.species_champions(),
            mutants: vec![],
            children: vec![],
        };
        offspring.champions.truncate(limit);

        let total_average_fitness: f64 = all_species
            .iter()
            .filter(|s| s.can_breed())
            .map(Species::average_fitness)
            .sum();
        let available = limit - offspring.champions.len();

        for species in all_species.iter().filter(|s| s.can_breed()) {
            if offspring.len() == limit {
                break;
            }
            let breeders = species.breeders(self.population_config);
            if breeders.is_empty() {
                debug!(species = species.id().0, "no breeders survived selection");
                continue;
            }
            let quota = (species.average_fitness() / total_average_fitness * available as f64)
                .ceil() as usize;
            let crossovers = (quota as f64 * self.population_config.crossover_rate).floor() as usize;
            let mutations =
                (quota as f64 * (1.0 - self.population_config.crossover_rate)).ceil() as usize;

            for _ in 0..crossovers {
                if offspring.len() == limit {
                    break;
                }
                let child = self.mate(&breeders, &population, rng);
                offspring.children.push(child);
            }
            for _ in 0..mutations {
                if offspring.len() == limit {
                    break;
                }
                let mut mutant = (*breeders.choose(rng).expect("breeders are not empty")).clone();
                mutant.mutate(self.history, self.genetic_config, rng);
                offspring.mutants.push(mutant);
            }
        }

        offspring
    }

    /// Copies the best member of every species large
    /// enough to keep its champion.
    fn species_champions(&self) -> Vec<G> {
        self.species
            .iter()
            .filter(|s| s.len() > self.population_config.species_champion_threshold)
            .map(|s| s.champion().clone())
            .collect()
    }

    /// Choose two parents, one from the species' breeders
    /// and the other from the breeders or, by chance, from
    /// the whole population, and mutate their child.
    fn mate<R: Rng + ?Sized>(&mut self, breeders: &[&G], population: &[&G], rng: &mut R) -> G {
        let parent = *breeders.choose(rng).expect("breeders are not empty");
        let partner = if rng.gen::<f64>() < self.population_config.inter_species_mating_rate {
            *population.choose(rng).expect("population is not empty")
        } else {
            *breeders.choose(rng).expect("breeders are not empty")
        };
        let mut child = G::crossover(parent, partner, self.genetic_config, rng);
        child.mutate(self.history, self.genetic_config, rng);
        child
    }
}
