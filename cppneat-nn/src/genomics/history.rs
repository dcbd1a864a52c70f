use crate::genomics::{GeneError, GeneticConfig, LinkGene, NeuronGene, NeuronRole};
use crate::Innovation;

use ahash::RandomState;
use cppneat::InnovationHistory;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::hash_map::{Entry, HashMap};

/// A `History` keeps track of link and neuron innovations in a
/// population, in order to make sure identical mutations
/// are assigned the same innovation numbers.
///
/// For link innovations the source and target neurons are used to
/// identify identical mutations. This memo may be periodically
/// [cleared], after which a repeated mutation receives a new number.
///
/// For neuron innovations the split link is used to identify
/// identical mutations, and the resulting hidden neuron is
/// recorded for the lifetime of the history.
///
/// The history also owns the default topology shared by all
/// newly created genomes: the output neuron (id 0), the bias
/// neuron (id 1), one input neuron per configured input (ids 2
/// and up), and one link from each of bias and inputs to the
/// output (link ids 0 and up, in the same order).
///
/// [cleared]: History::clear_cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    next_link_innovation: Innovation,
    next_neuron_innovation: Innovation,
    link_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    link_endpoints: Vec<(NeuronGene, NeuronGene)>,
    hidden_neurons: HashMap<Innovation, NeuronGene, RandomState>,
    default_neurons: Vec<NeuronGene>,
    default_links: Vec<LinkGene>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> History {
        Self::new(config, rng)
    }

    fn generation_complete(&mut self, generation: usize, config: &GeneticConfig) {
        if config.iterations_to_clear_link_cache != 0
            && generation % config.iterations_to_clear_link_cache == 0
        {
            self.clear_cache();
        }
    }
}

impl History {
    /// Creates a new History using the specified configuration,
    /// registering the default topology.
    ///
    /// The output neuron uses the configured [`output_activation`],
    /// or a random kind from the [`activation_functions`].
    ///
    /// [`output_activation`]: GeneticConfig::output_activation
    /// [`activation_functions`]: GeneticConfig::activation_functions
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{GeneticConfig, History, NeuronRole};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let history = History::new(&config, &mut ChaCha8Rng::seed_from_u64(0));
    ///
    /// // 1 output + 1 bias + 2 inputs.
    /// assert_eq!(history.default_neurons().len(), 4);
    /// assert_eq!(history.default_neurons()[0].role(), NeuronRole::Output);
    /// // Bias and both inputs are linked to the output.
    /// assert_eq!(history.default_links().len(), 3);
    /// assert_eq!(history.max_link_innovation(), Some(2));
    /// ```
    pub fn new<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> History {
        let mut history = History {
            next_link_innovation: 0,
            next_neuron_innovation: 0,
            link_innovations: HashMap::default(),
            link_endpoints: vec![],
            hidden_neurons: HashMap::default(),
            default_neurons: vec![],
            default_links: vec![],
        };

        let output_kind = match config.output_activation {
            Some(kind) => kind,
            None => *config
                .canonical_functions()
                .choose(rng)
                .unwrap_or_else(|| panic!("no canonical activation functions")),
        };
        let output = history.new_neuron(1.0, NeuronRole::Output, Some(output_kind.instantiate(rng)));
        let bias = history.new_neuron(0.0, NeuronRole::Bias, None);
        let inputs: Vec<NeuronGene> = (0..config.input_count.get())
            .map(|_| history.new_neuron(0.0, NeuronRole::Input, None))
            .collect();

        for from in std::iter::once(bias).chain(inputs.iter().copied()) {
            let id = history.register_or_get_link(&from, &output);
            history.default_links.push(LinkGene::new(id, from, output, 0.0));
            history.default_neurons.push(from);
        }
        history.default_neurons.insert(0, output);

        history
    }

    fn new_neuron(
        &mut self,
        level: f64,
        role: NeuronRole,
        activation: Option<crate::genomics::ActivationFunction>,
    ) -> NeuronGene {
        let neuron = NeuronGene::new(self.next_neuron_innovation, level, role, activation);
        self.next_neuron_innovation += 1;
        neuron
    }

    /// Returns the innovation number of the link between
    /// `from` and `to`, registering a new one if the pair is
    /// not in the memo.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{GeneticConfig, History};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut history = History::new(&GeneticConfig::zero(), &mut ChaCha8Rng::seed_from_u64(0));
    /// let output = history.default_neurons()[0];
    /// let input = history.default_neurons()[2];
    ///
    /// // Default links are already registered.
    /// assert_eq!(history.register_or_get_link(&input, &output), 1);
    /// // New pairs get the next number.
    /// assert_eq!(history.register_or_get_link(&output, &output), 2);
    /// assert_eq!(history.register_or_get_link(&output, &output), 2);
    /// ```
    pub fn register_or_get_link(&mut self, from: &NeuronGene, to: &NeuronGene) -> Innovation {
        match self.link_innovations.entry((from.id(), to.id())) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_link_innovation;
                entry.insert(id);
                self.link_endpoints.push((*from, *to));
                self.next_link_innovation += 1;
                id
            }
        }
    }

    /// Returns the hidden neuron created by splitting the
    /// link `link_id`, creating it on first request. Its level
    /// is the mean of the link's endpoint levels, and its
    /// activation function is instantiated from a random
    /// canonical kind.
    ///
    /// # Errors
    /// Returns [`UnregisteredLink`] if `link_id` was never issued.
    ///
    /// [`UnregisteredLink`]: GeneError::UnregisteredLink
    pub fn register_or_get_hidden_neuron<R: Rng + ?Sized>(
        &mut self,
        link_id: Innovation,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<NeuronGene, GeneError> {
        if let Some(neuron) = self.hidden_neurons.get(&link_id) {
            return Ok(*neuron);
        }
        let (from, to) = self
            .link_endpoints
            .get(link_id)
            .copied()
            .ok_or(GeneError::UnregisteredLink(link_id))?;
        let kind = *config
            .canonical_functions()
            .choose(rng)
            .unwrap_or_else(|| panic!("no canonical activation functions"));
        let neuron = self.new_neuron(
            (from.level() + to.level()) / 2.0,
            NeuronRole::Hidden,
            Some(kind.instantiate(rng)),
        );
        self.hidden_neurons.insert(link_id, neuron);
        Ok(neuron)
    }

    /// Forgets all memoized link pairs. Link innovation
    /// numbers keep increasing, and hidden neurons are
    /// still remembered.
    pub fn clear_cache(&mut self) {
        debug!(
            forgotten = self.link_innovations.len(),
            "clearing link innovation cache"
        );
        self.link_innovations.clear();
    }

    /// Returns the endpoints of a registered link.
    pub fn link_endpoints(&self, link_id: Innovation) -> Option<(NeuronGene, NeuronGene)> {
        self.link_endpoints.get(link_id).copied()
    }

    /// Returns the highest link innovation number issued.
    pub fn max_link_innovation(&self) -> Option<Innovation> {
        self.next_link_innovation.checked_sub(1)
    }

    /// Returns the highest neuron innovation number issued.
    pub fn max_neuron_innovation(&self) -> Option<Innovation> {
        self.next_neuron_innovation.checked_sub(1)
    }

    /// Returns the default neurons: output, bias, then inputs.
    pub fn default_neurons(&self) -> &[NeuronGene] {
        &self.default_neurons
    }

    /// Returns the default links, with zero weights.
    pub fn default_links(&self) -> &[LinkGene] {
        &self.default_links
    }
}
