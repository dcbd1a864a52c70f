use crate::populations::PopulationConfig;
use crate::Genome;

use std::cmp::Ordering;

/// Species identifier, assigned in order of creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeciesID(pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [compatibility distance])
/// genomes. Membership is determined by calculating
/// the distance to a _representative_, which is
/// the most recent genome to join the species.
///
/// Species stop breeding after [`no_innovation_threshold`]
/// consecutive generations without improving their best score.
/// They are kept while they still have members.
///
/// [compatibility distance]: PopulationConfig::compatibility_distance_threshold
/// [`no_innovation_threshold`]: PopulationConfig::no_innovation_threshold
#[derive(Debug, Clone)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) genomes: Vec<G>,
    representative: G,
    previous_score: f64,
    iterations_without_innovation: usize,
    can_breed: bool,
}

impl<G: Genome> Species<G> {
    /// Creates a new species with the specified ID and
    /// founding member, which is also its representative.
    pub fn new(id: SpeciesID, founder: G) -> Species<G> {
        Species {
            id,
            previous_score: founder.fitness(),
            representative: founder.clone(),
            genomes: vec![founder],
            iterations_without_innovation: 0,
            can_breed: true,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns whether `genome` is close enough to the
    /// representative to join the species.
    pub fn accepts(&self, genome: &G, genetic_config: &G::Config, config: &PopulationConfig) -> bool {
        G::compatibility_distance(&self.representative, genome, genetic_config)
            <= config.compatibility_distance_threshold
    }

    /// Adds a genome to the species, making it the new representative.
    pub fn add_genome(&mut self, genome: G) {
        self.representative = genome.clone();
        self.genomes.push(genome);
    }

    /// Removes all members, keeping the representative
    /// and the stagnation record.
    pub(super) fn clear(&mut self) -> Vec<G> {
        std::mem::take(&mut self.genomes)
    }

    /// Updates the stagnation record with the current best score.
    /// Returns `true` if the species stopped breeding as a result.
    pub(super) fn record_generation(&mut self, config: &PopulationConfig) -> bool {
        if !self.can_breed || self.genomes.is_empty() {
            return false;
        }
        let best = self.champion().fitness();
        let mut stagnated = false;
        if best <= self.previous_score {
            self.iterations_without_innovation += 1;
            if self.iterations_without_innovation >= config.no_innovation_threshold.get() {
                self.can_breed = false;
                stagnated = true;
            }
        } else {
            self.iterations_without_innovation = 0;
        }
        self.previous_score = best;
        stagnated
    }

    /// Returns the species' _fitness-shared_ average score:
    /// the mean of each member's fitness divided by the
    /// member count.
    ///
    /// Returns 0 for an empty species.
    pub fn average_fitness(&self) -> f64 {
        if self.genomes.is_empty() {
            return 0.0;
        }
        let count = self.genomes.len() as f64;
        self.genomes.iter().map(|g| g.fitness() / count).sum::<f64>() / count
    }

    /// Returns whether the species still takes part in reproduction.
    pub fn can_breed(&self) -> bool {
        self.can_breed
    }

    /// Returns the number of consecutive generations
    /// in which the best score has not improved.
    pub fn time_stagnated(&self) -> usize {
        self.iterations_without_innovation
    }

    /// Returns the best score recorded at the end of the last generation.
    pub fn previous_score(&self) -> f64 {
        self.previous_score
    }

    /// Returns an iterator over the species' members.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.genomes.iter()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    /// Returns whether the species has no members.
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the currently best-performing genome.
    ///
    /// # Panics
    /// Panics if the species is empty.
    pub fn champion(&self) -> &G {
        self.genomes
            .iter()
            .max_by(|g1, g2| compare_fitness(g1.fitness(), g2.fitness()))
            .expect("empty species has no champion")
    }

    /// Returns the top `ceil(len × survival_threshold)` members,
    /// best first.
    pub(super) fn breeders(&self, config: &PopulationConfig) -> Vec<&G> {
        let mut ranked: Vec<&G> = self.genomes.iter().collect();
        ranked.sort_by(|g1, g2| compare_fitness(g2.fitness(), g1.fitness()));
        let survivors = (ranked.len() as f64 * config.survival_threshold).ceil() as usize;
        ranked.truncate(survivors);
        ranked
    }
}

pub(super) fn compare_fitness(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::tests::TestGenome;

    fn config() -> PopulationConfig {
        PopulationConfig {
            compatibility_distance_threshold: 1.0,
            survival_threshold: 0.5,
            no_innovation_threshold: std::num::NonZeroUsize::new(2).unwrap(),
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn representative_follows_latest_member() {
        let mut species = Species::new(SpeciesID(0), TestGenome::with(0.0, 1.0));
        species.add_genome(TestGenome::with(0.5, 2.0));
        assert_eq!(species.representative().value, 0.5);
        assert!(species.accepts(&TestGenome::with(1.5, 0.0), &(), &config()));
        assert!(!species.accepts(&TestGenome::with(1.6, 0.0), &(), &config()));
    }

    #[test]
    fn average_fitness_is_shared() {
        let mut species = Species::new(SpeciesID(0), TestGenome::with(0.0, 2.0));
        species.add_genome(TestGenome::with(0.0, 4.0));
        // (2/2 + 4/2) / 2
        assert_eq!(species.average_fitness(), 1.5);
    }

    #[test]
    fn breeders_are_top_fraction() {
        let mut species = Species::new(SpeciesID(0), TestGenome::with(0.0, 1.0));
        species.add_genome(TestGenome::with(0.0, 3.0));
        species.add_genome(TestGenome::with(0.0, 2.0));
        let breeders = species.breeders(&config());
        assert_eq!(breeders.len(), 2);
        assert_eq!(breeders[0].fitness(), 3.0);
        assert_eq!(breeders[1].fitness(), 2.0);
    }

    #[test]
    fn stagnation_stops_breeding() {
        let config = config();
        let mut species = Species::new(SpeciesID(0), TestGenome::with(0.0, 1.0));
        assert!(!species.record_generation(&config));
        assert_eq!(species.time_stagnated(), 1);
        assert!(species.record_generation(&config));
        assert!(!species.can_breed());

        let mut improving = Species::new(SpeciesID(1), TestGenome::with(0.0, 1.0));
        improving.record_generation(&config);
        improving.add_genome(TestGenome::with(0.0, 5.0));
        improving.record_generation(&config);
        assert_eq!(improving.time_stagnated(), 0);
        assert!(improving.can_breed());
        assert_eq!(improving.previous_score(), 5.0);
    }
}
