use super::{Population, SpeciesID};

use crate::genome::{Genome, InnovationHistory};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub species_count: usize,
    pub average_score: f64,
    pub genome_stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        writeln!(f, "\taverage_score: {:.4}", self.average_score)?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All statistics of an empty sequence are 0.
    ///
    /// # Examples
    /// ```
    /// use cppneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        data.sort_unstable_by(f64::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesID, Vec<G>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesID, G, usize)>),
    /// Only population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome> EvolutionLogger<G> {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::CppnGenome as G;
    /// use cppneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::{GeneticConfig, CppnGenome as G};
    /// use cppneat::{Genome, Population, PopulationConfig};
    /// use cppneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut logger = EvolutionLogger::<G>::new(ReportingLevel::PopulationChampion);
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    ///     |_genome: &mut G| 1.0,
    ///     0,
    /// ).unwrap();
    /// population.initialise();
    ///
    /// // Do something with the population...
    /// // Then log a snapshot.
    /// logger.log(&population, &|g: &G| [g.fitness()], ["fitness"]);
    /// assert_eq!(logger.iter().count(), 1);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f64; N],
    {
        let stats: Vec<[f64; N]> = population.genomes().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(stats))
            .map(|(name, data)| (name, Stats::from(data.into_iter())))
            .collect();

        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| (s.id(), s.genomes().cloned().collect(), s.time_stagnated()))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .map(|s| (s.id(), s.champion().clone(), s.time_stagnated()))
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            species_count: population.species().count(),
            average_score: population.average_score(),
            genome_stats,
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// # use cppneat_nn::genomics::CppnGenome as G;
    /// use cppneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log<G>> {
        self.logs.last()
    }
}

fn unzip_n_vecs<T, const N: usize>(rows: Vec<[T; N]>) -> Vec<Vec<T>> {
    let mut columns: Vec<Vec<T>> = (0..N).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (column, item) in columns.iter_mut().zip(row) {
            column.push(item);
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::tests::{population, TestGenome};

    #[test]
    fn even_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn empty_stats() {
        assert_eq!(Stats::from(std::iter::empty()).maximum, 0.0);
    }

    #[test]
    fn logs_follow_generations() {
        let mut population = population(30, 5);
        let mut logger = EvolutionLogger::<TestGenome>::new(ReportingLevel::SpeciesChampions);
        population.initialise();
        for _ in 0..3 {
            logger.log(&population, &|g: &TestGenome| [g.fitness(), g.value], ["fitness", "value"]);
            population.generational_iterate().unwrap();
        }

        let generations: Vec<usize> = logger.iter().map(|l| l.generation_number).collect();
        assert_eq!(generations, [0, 1, 2]);
        let last = logger.last().unwrap();
        assert_eq!(last.genome_stats.len(), 2);
        assert_eq!(last.genome_stats[0].0, "fitness");
        match &last.generation_sample {
            GenerationMemberRecord::SpeciesChampions(champions) => {
                assert_eq!(champions.len(), last.species_count)
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }
}
