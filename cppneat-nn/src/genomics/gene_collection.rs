use crate::genomics::{
    ActivationFunction, GeneError, GeneticConfig, History, LinkGene, NeuronGene, NeuronRole,
};
use crate::Innovation;

use rand::prelude::{IteratorRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{BTreeMap, BTreeSet};

/// The result of splitting a link with a new hidden neuron.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeuronSplit {
    /// The link that was disabled.
    pub split_link: Innovation,
    /// The hidden neuron placed in the middle.
    pub neuron: Innovation,
    /// The new link from the split link's source to the neuron.
    pub incoming_link: Innovation,
    /// The new link from the neuron to the split link's target.
    pub outgoing_link: Innovation,
}

/// A mutable collection of link genes, and of the
/// neurons they connect.
///
/// Besides the links themselves, the collection
/// keeps two derived sets up to date:
/// - The _possible connections_: ordered pairs of known
///   neurons that may be linked and currently have no
///   enabled link between them.
/// - The _orphaned neurons_: hidden neurons that are not
///   reachable from the bias or an input, or from which
///   the output cannot be reached, over enabled links.
///
/// Links are never removed, only disabled. All iteration
/// is in innovation number order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneCollection {
    links: BTreeMap<Innovation, LinkGene>,
    neurons: BTreeMap<Innovation, NeuronGene>,
    possible_connections: BTreeSet<(Innovation, Innovation)>,
    orphans: BTreeSet<Innovation>,
    feed_forward_only: bool,
}

impl GeneCollection {
    /// Returns an empty collection. If `feed_forward_only`
    /// is set, only links from lower to higher neuron levels
    /// are considered possible.
    pub fn new(feed_forward_only: bool) -> GeneCollection {
        GeneCollection {
            feed_forward_only,
            ..GeneCollection::default()
        }
    }

    /// Resets the collection to the default topology of
    /// `history`, with random weights in ±[`max_weight`].
    ///
    /// [`max_weight`]: GeneticConfig::max_weight
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{GeneCollection, GeneticConfig, History, NeuronRole};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     max_weight: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let history = History::new(&config, &mut rng);
    ///
    /// let mut genes = GeneCollection::default();
    /// genes.initialise(&history, &config, &mut rng);
    ///
    /// assert_eq!(genes.links().count(), 3);
    /// assert!(genes.links().all(|l| l.enabled() && l.weight().abs() <= 1.0));
    /// assert_eq!(genes.neurons().filter(|n| n.role() == NeuronRole::Input).count(), 2);
    /// ```
    pub fn initialise<R: Rng + ?Sized>(
        &mut self,
        history: &History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        *self = GeneCollection::new(config.feed_forward_only);
        for link in history.default_links() {
            self.insert_link(LinkGene::new(
                link.id(),
                *link.from(),
                *link.to(),
                LinkGene::random_weight(config, rng),
            ));
        }
        self.update_orphans();
    }

    /// Adds `gene` to the collection, registering its endpoints.
    /// An existing disabled link with the same id is overwritten.
    ///
    /// Returns `false`, changing nothing, if an enabled link
    /// with the same id is already present.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{ActivationFunction, GeneCollection, LinkGene, NeuronGene, NeuronRole};
    ///
    /// let bias = NeuronGene::new(1, 0.0, NeuronRole::Bias, None);
    /// let output = NeuronGene::new(0, 1.0, NeuronRole::Output, Some(ActivationFunction::Tanh));
    ///
    /// let mut genes = GeneCollection::default();
    /// assert!(genes.try_add_link(LinkGene::new(0, bias, output, 0.5)));
    /// assert!(!genes.try_add_link(LinkGene::new(0, bias, output, -0.5)));
    /// assert_eq!(genes.link(0).unwrap().weight(), 0.5);
    /// ```
    pub fn try_add_link(&mut self, gene: LinkGene) -> bool {
        let added = self.insert_link(gene);
        if added {
            self.update_orphans();
        }
        added
    }

    fn insert_link(&mut self, gene: LinkGene) -> bool {
        if self.links.get(&gene.id()).map_or(false, LinkGene::enabled) {
            return false;
        }
        self.add_neuron(*gene.from());
        self.add_neuron(*gene.to());
        if gene.enabled() {
            self.possible_connections.remove(&gene.endpoints());
        }
        self.links.insert(gene.id(), gene);
        true
    }

    /// Registers a neuron, and every possible
    /// connection from or to it.
    fn add_neuron(&mut self, neuron: NeuronGene) {
        if self.neurons.contains_key(&neuron.id()) {
            return;
        }
        self.neurons.insert(neuron.id(), neuron);
        for other in self.neurons.values() {
            if legal_pair(self.feed_forward_only, &neuron, other) {
                self.possible_connections.insert((neuron.id(), other.id()));
            }
            if legal_pair(self.feed_forward_only, other, &neuron) {
                self.possible_connections.insert((other.id(), neuron.id()));
            }
        }
    }

    /// Links a random possible connection, with a random weight.
    ///
    /// Returns the new link's innovation number, or `None`
    /// if no connection is possible or the resolved link is
    /// already enabled.
    ///
    /// # Panics
    /// Panics if the chosen pair targets a bias or input neuron,
    /// or goes backwards in a feed-forward-only collection.
    pub fn try_create_link<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let (from_id, to_id) = match self.possible_connections.iter().choose(rng) {
            Some(pair) => *pair,
            None => {
                debug!("no possible connections left");
                return None;
            }
        };
        let (from, to) = (self.neurons[&from_id], self.neurons[&to_id]);
        assert!(
            to.role().accepts_links(),
            "links should not go into {:?} neuron {}",
            to.role(),
            to.id()
        );
        assert!(
            !self.feed_forward_only || from.level() < to.level(),
            "cannot link {} -> {} in a feed-forward-only genome",
            from,
            to
        );

        let id = history.register_or_get_link(&from, &to);
        let weight = LinkGene::random_weight(config, rng);
        if self.try_add_link(LinkGene::new(id, from, to, weight)) {
            Some(id)
        } else {
            debug!(link = id, "link already present");
            None
        }
    }

    /// Splits a random enabled link: it is disabled, and
    /// the hidden neuron registered for it in `history` is
    /// linked in its place, with an incoming weight of 1.0 and
    /// an outgoing weight equal to the split link's weight.
    ///
    /// Returns `None` if there are no enabled links, or if the
    /// chosen link was already split and both of the links
    /// replacing it are still enabled. The collection is left
    /// unchanged in either case.
    ///
    /// # Panics
    /// Panics if the chosen link was not registered by `history`.
    ///
    /// # Examples
    /// ```
    /// use cppneat_nn::genomics::{GeneCollection, GeneticConfig, History};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut history = History::new(&config, &mut rng);
    /// let mut genes = GeneCollection::default();
    /// genes.initialise(&history, &config, &mut rng);
    ///
    /// let split = genes.try_create_neuron(&mut history, &config, &mut rng).unwrap();
    /// assert!(!genes.link(split.split_link).unwrap().enabled());
    /// assert_eq!(genes.link(split.incoming_link).unwrap().weight(), 1.0);
    /// assert_eq!(genes.valid_links().count(), 3);
    /// ```
    pub fn try_create_neuron<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<NeuronSplit> {
        let link = match self.links.values().filter(|l| l.enabled()).choose(rng) {
            Some(link) => *link,
            None => {
                debug!("no enabled link to split");
                return None;
            }
        };
        let neuron = history
            .register_or_get_hidden_neuron(link.id(), config, rng)
            .unwrap_or_else(|e| panic!("{} while splitting {}", e, link));

        let incoming_link = history.register_or_get_link(link.from(), &neuron);
        let outgoing_link = history.register_or_get_link(&neuron, link.to());
        let enabled = |id: Innovation| self.links.get(&id).map_or(false, LinkGene::enabled);
        if enabled(incoming_link) && enabled(outgoing_link) {
            debug!(link = link.id(), neuron = neuron.id(), "link already split");
            return None;
        }

        self.set_disabled(link.id());
        self.insert_link(LinkGene::new(incoming_link, *link.from(), neuron, 1.0));
        self.insert_link(LinkGene::new(outgoing_link, neuron, *link.to(), link.weight()));
        self.update_orphans();

        Some(NeuronSplit {
            split_link: link.id(),
            neuron: neuron.id(),
            incoming_link,
            outgoing_link,
        })
    }

    /// Disables a random enabled link. Returns its
    /// innovation number, or `None` if there are no
    /// enabled links.
    pub fn try_disable_link<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Innovation> {
        let id = self
            .links
            .values()
            .filter(|l| l.enabled())
            .map(LinkGene::id)
            .choose(rng)?;
        self.set_disabled(id);
        self.update_orphans();
        Some(id)
    }

    /// Disables the link with the specified id.
    ///
    /// # Errors
    /// Returns [`UnknownLink`] if there is no such link.
    ///
    /// [`UnknownLink`]: GeneError::UnknownLink
    pub fn disable_link(&mut self, id: Innovation) -> Result<(), GeneError> {
        if !self.links.contains_key(&id) {
            return Err(GeneError::UnknownLink(id));
        }
        self.set_disabled(id);
        self.update_orphans();
        Ok(())
    }

    /// Enables the link with the specified id.
    ///
    /// # Errors
    /// Returns [`UnknownLink`] if there is no such link.
    ///
    /// [`UnknownLink`]: GeneError::UnknownLink
    pub fn enable_link(&mut self, id: Innovation) -> Result<(), GeneError> {
        let link = self.links.get_mut(&id).ok_or(GeneError::UnknownLink(id))?;
        link.set_enabled(true);
        let endpoints = link.endpoints();
        self.possible_connections.remove(&endpoints);
        self.update_orphans();
        Ok(())
    }

    /// Disables a link, making its pair possible again
    /// unless a parallel enabled link remains.
    fn set_disabled(&mut self, id: Innovation) {
        let link = match self.links.get_mut(&id) {
            Some(link) => link,
            None => return,
        };
        link.set_enabled(false);
        let (from, to) = (*link.from(), *link.to());
        let parallel = self
            .links
            .values()
            .any(|l| l.enabled() && l.endpoints() == (from.id(), to.id()));
        if !parallel && legal_pair(self.feed_forward_only, &from, &to) {
            self.possible_connections.insert((from.id(), to.id()));
        }
    }

    /// Recomputes the orphaned neuron set from the
    /// enabled links.
    fn update_orphans(&mut self) {
        let mut forward: BTreeMap<Innovation, Vec<Innovation>> = BTreeMap::new();
        let mut backward: BTreeMap<Innovation, Vec<Innovation>> = BTreeMap::new();
        for (from, to) in self.links.values().filter(|l| l.enabled()).map(LinkGene::endpoints) {
            forward.entry(from).or_default().push(to);
            backward.entry(to).or_default().push(from);
        }

        let sources = self
            .neurons
            .values()
            .filter(|n| matches!(n.role(), NeuronRole::Bias | NeuronRole::Input))
            .map(NeuronGene::id);
        let fed = reachable(sources, &forward);
        let sinks = self
            .neurons
            .values()
            .filter(|n| n.role() == NeuronRole::Output)
            .map(NeuronGene::id);
        let feeding = reachable(sinks, &backward);

        self.orphans = self
            .neurons
            .values()
            .filter(|n| n.role() == NeuronRole::Hidden)
            .map(NeuronGene::id)
            .filter(|id| !fed.contains(id) || !feeding.contains(id))
            .collect();
    }

    /// Returns the enabled links between non-orphaned neurons,
    /// which make up the genome's phenotype.
    pub fn valid_links(&self) -> impl Iterator<Item = &LinkGene> {
        self.links.values().filter(move |l| {
            l.enabled() && !self.orphans.contains(&l.from().id()) && !self.orphans.contains(&l.to().id())
        })
    }

    /// Mutates the weights of the collection's links, each with
    /// probability [`weight_mutation_rate`].
    ///
    /// [`weight_mutation_rate`]: GeneticConfig::weight_mutation_rate
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for link in self.links.values_mut() {
            if rng.gen::<f64>() < config.weight_mutation_rate {
                link.mutate_weight(config, rng);
            }
        }
    }

    /// Sets the weight of the link with the specified id.
    ///
    /// # Errors
    /// Returns [`UnknownLink`] if there is no such link.
    ///
    /// [`UnknownLink`]: GeneError::UnknownLink
    pub fn set_weight(&mut self, id: Innovation, weight: f64) -> Result<(), GeneError> {
        self.links
            .get_mut(&id)
            .ok_or(GeneError::UnknownLink(id))?
            .set_weight(weight);
        Ok(())
    }

    /// Returns all links, in innovation number order.
    pub fn links(&self) -> impl Iterator<Item = &LinkGene> {
        self.links.values()
    }

    /// Returns the link with the specified id.
    pub fn link(&self, id: Innovation) -> Option<&LinkGene> {
        self.links.get(&id)
    }

    /// Returns the number of links, enabled or not.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns whether the collection has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns all neurons referenced by links,
    /// in innovation number order.
    pub fn neurons(&self) -> impl Iterator<Item = &NeuronGene> {
        self.neurons.values()
    }

    /// Returns the neuron with the specified id.
    pub fn neuron(&self, id: Innovation) -> Option<&NeuronGene> {
        self.neurons.get(&id)
    }

    /// Returns the `(source, target)` pairs that
    /// may currently be linked.
    pub fn possible_connections(&self) -> &BTreeSet<(Innovation, Innovation)> {
        &self.possible_connections
    }

    /// Returns the ids of orphaned hidden neurons.
    pub fn orphaned_neurons(&self) -> &BTreeSet<Innovation> {
        &self.orphans
    }

    /// Returns the activation functions of all
    /// hidden and output neurons.
    pub fn activation_functions(&self) -> impl Iterator<Item = ActivationFunction> + '_ {
        self.neurons.values().filter_map(NeuronGene::activation)
    }
}

impl Extend<LinkGene> for GeneCollection {
    /// Adds every gene as with [`try_add_link`], skipping
    /// ids that are already enabled.
    ///
    /// [`try_add_link`]: GeneCollection::try_add_link
    fn extend<I: IntoIterator<Item = LinkGene>>(&mut self, genes: I) {
        for gene in genes {
            self.insert_link(gene);
        }
        self.update_orphans();
    }
}

fn legal_pair(feed_forward_only: bool, from: &NeuronGene, to: &NeuronGene) -> bool {
    to.role().accepts_links() && (!feed_forward_only || from.level() < to.level())
}

/// Returns all neurons reachable from `roots`
/// by following `edges`.
fn reachable(
    roots: impl Iterator<Item = Innovation>,
    edges: &BTreeMap<Innovation, Vec<Innovation>>,
) -> BTreeSet<Innovation> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<Innovation> = roots.collect();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(next) = edges.get(&id) {
            stack.extend(next.iter().filter(|n| !visited.contains(*n)));
        }
    }
    visited
}
