use crate::genomics::{ActivationKind, GeneCollection, GeneticConfig, LinkGene};

use ahash::RandomState;

use std::cmp::Ordering;
use std::collections::HashMap;

/// The alignment of two gene collections by innovation number.
///
/// Genes present in both collections are _matches_. An unmatched
/// gene is _excess_ if its id is greater than every id in the other
/// collection, and _disjoint_ otherwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DifferenceAnalysis<'a> {
    /// Pairs of genes with the same id, `(first, second)`.
    pub matches: Vec<(&'a LinkGene, &'a LinkGene)>,
    pub first_disjoint: Vec<&'a LinkGene>,
    pub first_excess: Vec<&'a LinkGene>,
    pub second_disjoint: Vec<&'a LinkGene>,
    pub second_excess: Vec<&'a LinkGene>,
}

impl<'a> DifferenceAnalysis<'a> {
    /// Aligns the links of both collections, disabled ones included,
    /// in a single ordered pass.
    pub fn new(first: &'a GeneCollection, second: &'a GeneCollection) -> DifferenceAnalysis<'a> {
        let mut analysis = DifferenceAnalysis::default();
        let mut first = first.links().peekable();
        let mut second = second.links().peekable();

        while let (Some(a), Some(b)) = (first.peek().copied(), second.peek().copied()) {
            match a.id().cmp(&b.id()) {
                Ordering::Equal => {
                    analysis.matches.push((a, b));
                    first.next();
                    second.next();
                }
                Ordering::Less => {
                    analysis.first_disjoint.push(a);
                    first.next();
                }
                Ordering::Greater => {
                    analysis.second_disjoint.push(b);
                    second.next();
                }
            }
        }
        analysis.first_excess.extend(first);
        analysis.second_excess.extend(second);

        analysis
    }

    /// Returns the total number of disjoint genes.
    pub fn disjoint_count(&self) -> usize {
        self.first_disjoint.len() + self.second_disjoint.len()
    }

    /// Returns the total number of excess genes.
    pub fn excess_count(&self) -> usize {
        self.first_excess.len() + self.second_excess.len()
    }

    /// Returns the mean absolute weight difference of
    /// matching genes, or 0 if there are none.
    pub fn average_weight_difference(&self) -> f64 {
        if self.matches.is_empty() {
            return 0.0;
        }
        self.matches
            .iter()
            .map(|(a, b)| (a.weight() - b.weight()).abs())
            .sum::<f64>()
            / self.matches.len() as f64
    }
}

/// Returns the compatibility distance between two gene collections:
///
/// `c_e·E/N + c_d·D/N + c_m·W + c_f·F`
///
/// where `E` and `D` are the excess and disjoint gene counts, `W` is the
/// average weight difference of matching genes, `F` is the
/// [function difference], and `N` is the link count of the larger
/// collection, or 1 if that is at most [`small_genome_threshold`].
///
/// [function difference]: function_difference
/// [`small_genome_threshold`]: GeneticConfig::small_genome_threshold
pub fn compatibility_distance(
    first: &GeneCollection,
    second: &GeneCollection,
    config: &GeneticConfig,
) -> f64 {
    let analysis = DifferenceAnalysis::new(first, second);
    let size = first.len().max(second.len());
    let normalizer = if size <= config.small_genome_threshold {
        1.0
    } else {
        size as f64
    };

    config.excess_genes_weight * analysis.excess_count() as f64 / normalizer
        + config.disjoint_genes_weight * analysis.disjoint_count() as f64 / normalizer
        + config.matching_genes_weight * analysis.average_weight_difference()
        + config.function_difference_weight * function_difference(first, second, config)
}

/// Returns the average, over the [canonical activation functions],
/// of the difference in how many neurons of each collection use them.
///
/// Functions are counted by [kind], so parametrized functions with
/// different parameters fall in the same bucket. Functions whose kind
/// is not canonical are ignored.
///
/// [canonical activation functions]: GeneticConfig::activation_functions
/// [kind]: crate::genomics::ActivationFunction::kind
pub fn function_difference(first: &GeneCollection, second: &GeneCollection, config: &GeneticConfig) -> f64 {
    let canonical = config.canonical_functions();
    let first = kind_counts(first);
    let second = kind_counts(second);

    let total: usize = canonical
        .iter()
        .map(|kind| {
            let count = |counts: &HashMap<ActivationKind, usize, RandomState>| {
                counts.get(kind).copied().unwrap_or(0)
            };
            count(&first).abs_diff(count(&second))
        })
        .sum();
    total as f64 / canonical.len() as f64
}

fn kind_counts(genes: &GeneCollection) -> HashMap<ActivationKind, usize, RandomState> {
    let mut counts: HashMap<ActivationKind, usize, RandomState> = HashMap::default();
    for function in genes.activation_functions() {
        *counts.entry(function.kind()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationFunction, NeuronGene, NeuronRole};
    use crate::Innovation;
    use assert_approx_eq::assert_approx_eq;

    fn output(activation: ActivationFunction) -> NeuronGene {
        NeuronGene::new(0, 1.0, NeuronRole::Output, Some(activation))
    }

    fn collection(ids: &[Innovation], weight: f64) -> GeneCollection {
        let bias = NeuronGene::new(1, 0.0, NeuronRole::Bias, None);
        let mut genes = GeneCollection::default();
        for &id in ids {
            assert!(genes.try_add_link(LinkGene::new(id, bias, output(ActivationFunction::Tanh), weight)));
        }
        genes
    }

    fn ids(genes: &[&LinkGene]) -> Vec<Innovation> {
        genes.iter().map(|g| g.id()).collect()
    }

    #[test]
    fn excess_in_second() {
        let (a, b) = (collection(&[0, 1, 2], 1.0), collection(&[0, 1, 2, 4], 1.0));
        let analysis = DifferenceAnalysis::new(&a, &b);
        assert_eq!(analysis.matches.len(), 3);
        assert_eq!(ids(&analysis.second_excess), [4]);
        assert_eq!(analysis.disjoint_count(), 0);
        assert!(analysis.first_excess.is_empty());
    }

    #[test]
    fn disjoint_in_first() {
        let (a, b) = (collection(&[0, 1, 2, 4], 1.0), collection(&[2, 4], 1.0));
        let analysis = DifferenceAnalysis::new(&a, &b);
        assert_eq!(ids(&analysis.first_disjoint), [0, 1]);
        assert_eq!(analysis.matches.len(), 2);
        assert_eq!(analysis.excess_count(), 0);
    }

    #[test]
    fn analysis_is_symmetric() {
        let (a, b) = (collection(&[0, 3, 5, 9], 1.0), collection(&[1, 3, 6], 1.0));
        let (ab, ba) = (DifferenceAnalysis::new(&a, &b), DifferenceAnalysis::new(&b, &a));
        assert_eq!(ids(&ab.first_disjoint), ids(&ba.second_disjoint));
        assert_eq!(ids(&ab.second_disjoint), ids(&ba.first_disjoint));
        assert_eq!(ids(&ab.first_excess), ids(&ba.second_excess));
        assert_eq!(ab.matches.len(), ba.matches.len());
    }

    #[test]
    fn interleaved() {
        let (a, b) = (collection(&[0, 3, 5, 9], 1.0), collection(&[1, 3, 6], 1.0));
        let analysis = DifferenceAnalysis::new(&a, &b);
        assert_eq!(ids(&analysis.first_disjoint), [0, 5]);
        assert_eq!(ids(&analysis.second_disjoint), [1, 6]);
        assert_eq!(ids(&analysis.first_excess), [9]);
        assert!(analysis.second_excess.is_empty());
    }

    #[test]
    fn empty_collections() {
        let (a, b) = (GeneCollection::default(), collection(&[0, 1], 1.0));
        let analysis = DifferenceAnalysis::new(&a, &b);
        assert_eq!(ids(&analysis.second_excess), [0, 1]);
        assert_eq!(analysis.average_weight_difference(), 0.0);
    }

    #[test]
    fn distance_of_identical_genomes_is_zero() {
        let config = GeneticConfig {
            excess_genes_weight: 1.0,
            disjoint_genes_weight: 1.0,
            matching_genes_weight: 1.0,
            function_difference_weight: 1.0,
            ..GeneticConfig::zero()
        };
        let a = collection(&[0, 1, 2], 0.5);
        assert_eq!(compatibility_distance(&a, &a.clone(), &config), 0.0);
    }

    #[test]
    fn distance_terms() {
        let config = GeneticConfig {
            excess_genes_weight: 1.5,
            disjoint_genes_weight: 0.5,
            matching_genes_weight: 0.25,
            ..GeneticConfig::zero()
        };
        let (a, b) = (collection(&[0, 2, 3, 7], 1.0), collection(&[1, 2, 3], -1.0));
        // Disjoint: 0, 1. Excess: 7. Weight difference 2.0.
        assert_approx_eq!(compatibility_distance(&a, &b, &config), 0.5 * 2.0 + 1.5 + 0.25 * 2.0);
    }

    #[test]
    fn large_genomes_are_normalized() {
        let config = GeneticConfig {
            excess_genes_weight: 1.0,
            small_genome_threshold: 2,
            ..GeneticConfig::zero()
        };
        let (a, b) = (collection(&[0, 1, 2, 3], 1.0), collection(&[0], 1.0));
        assert_approx_eq!(compatibility_distance(&a, &b, &config), 3.0 / 4.0);
    }

    #[test]
    fn function_differences() {
        let config = GeneticConfig {
            activation_functions: vec![
                ActivationKind::Tanh,
                ActivationKind::Sigmoid,
                ActivationKind::Sine,
                ActivationKind::Gaussian,
            ],
            ..GeneticConfig::zero()
        };
        let bias = NeuronGene::new(1, 0.0, NeuronRole::Bias, None);
        let hidden = |id, f| NeuronGene::new(id, 0.5, NeuronRole::Hidden, Some(f));

        let mut a = GeneCollection::default();
        a.try_add_link(LinkGene::new(0, bias, output(ActivationFunction::Tanh), 1.0));
        let mut b = GeneCollection::default();
        b.try_add_link(LinkGene::new(0, bias, output(ActivationFunction::Sigmoid), 1.0));
        // tanh: 1, sig: 1, sin: 0, gauss: 0.
        assert_approx_eq!(function_difference(&a, &b, &config), 0.5);

        a.try_add_link(LinkGene::new(1, bias, hidden(5, ActivationFunction::Tanh), 1.0));
        b.try_add_link(LinkGene::new(2, bias, hidden(6, ActivationFunction::Sine), 1.0));
        // tanh: 2, sig: 1, sin: 1, gauss: 0.
        assert_approx_eq!(function_difference(&a, &b, &config), 1.0);
        assert_eq!(function_difference(&a, &a, &config), 0.0);

        let empty = GeneCollection::default();
        assert_eq!(function_difference(&empty, &empty, &config), 0.0);
    }

    #[test]
    fn parametrized_functions_share_a_bucket() {
        let config = GeneticConfig {
            activation_functions: vec![ActivationKind::Polynomial, ActivationKind::Linear],
            ..GeneticConfig::zero()
        };
        let bias = NeuronGene::new(1, 0.0, NeuronRole::Bias, None);
        let mut a = GeneCollection::default();
        a.try_add_link(LinkGene::new(0, bias, output(ActivationFunction::Polynomial(2)), 1.0));
        let mut b = GeneCollection::default();
        b.try_add_link(LinkGene::new(0, bias, output(ActivationFunction::Polynomial(7)), 1.0));
        assert_eq!(function_difference(&a, &b, &config), 0.0);

        // Kinds outside the canonical list are not counted.
        let mut c = GeneCollection::default();
        c.try_add_link(LinkGene::new(0, bias, output(ActivationFunction::Tanh), 1.0));
        assert_approx_eq!(function_difference(&a, &c, &config), 0.5);
    }
}
