//! A Network is the phenotype of a [`CppnGenome`]: one
//! node per expressed neuron and one synapse per valid
//! link. Disabled links and orphaned neurons are left out.
//!
//! Networks may contain cycles and parallel synapses.
//! They are evaluated on demand from the output node,
//! remembering each node's activation from the previous
//! evaluation to break cycles.
//!
//! [`CppnGenome`]: crate::genomics::CppnGenome
mod synapse;

pub use synapse::Synapse;

use crate::genomics::{ActivationFunction, GeneCollection, NeuronRole};
use crate::Innovation;

use ahash::RandomState;
use thiserror::Error;

use std::collections::{HashMap, HashSet};

/// Position of a node in its [`Network`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

/// Errors returned by network evaluation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    #[error("expected {expected} inputs, got {actual}")]
    InputSizeMismatch { expected: usize, actual: usize },
    #[error("the network has no output node")]
    MissingOutput,
}

#[derive(Clone, Debug)]
struct Node {
    role: NeuronRole,
    activation: Option<ActivationFunction>,
    incoming: Vec<Synapse>,
    previous: f64,
}

/// A single-output network of arbitrary topology.
///
/// # Examples
/// ```
/// use cppneat_nn::genomics::{ActivationFunction, NeuronRole};
/// use cppneat_nn::networks::Network;
///
/// let mut network = Network::default();
/// let bias = network.add_neuron(NeuronRole::Bias, None);
/// let input = network.add_neuron(NeuronRole::Input, None);
/// let output = network.add_neuron(NeuronRole::Output, Some(ActivationFunction::Linear));
/// network.add_link(bias, output, 0.5);
/// network.add_link(input, output, 2.0);
///
/// assert_eq!(network.get_activation(&[3.0]), Ok(6.5));
/// assert!(network.get_activation(&[1.0, 2.0]).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
    inputs: Vec<NodeIndex>,
    output: Option<NodeIndex>,
}

/// A node pending resolution.
struct Frame {
    node: usize,
    next_synapse: usize,
    sum: f64,
}

impl Network {
    /// Adds a node to the network, and returns its index.
    /// Input nodes receive inputs in the order they are added.
    ///
    /// # Panics
    /// Panics if a second output node is added, or if `activation`
    /// is missing for a hidden or output node.
    pub fn add_neuron(
        &mut self,
        role: NeuronRole,
        activation: Option<ActivationFunction>,
    ) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        assert!(
            !role.accepts_links() || activation.is_some(),
            "{:?} node needs an activation function",
            role
        );
        match role {
            NeuronRole::Input => self.inputs.push(index),
            NeuronRole::Output => {
                assert!(self.output.is_none(), "network already has an output node");
                self.output = Some(index);
            }
            NeuronRole::Bias | NeuronRole::Hidden => {}
        }
        self.nodes.push(Node {
            role,
            activation,
            incoming: vec![],
            previous: 0.0,
        });
        index
    }

    /// Adds a synapse between two nodes. Repeated
    /// pairs each contribute to the target's input.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn add_link(&mut self, from: NodeIndex, to: NodeIndex, weight: f64) {
        assert!(from.0 < self.nodes.len(), "no node at index {}", from.0);
        assert!(to.0 < self.nodes.len(), "no node at index {}", to.0);
        self.nodes[to.0].incoming.push(Synapse::new(from, weight));
    }

    /// Evaluates the network for the given inputs, which are
    /// assigned to input nodes in order.
    ///
    /// Every node is resolved at most once per call. A node
    /// reached again while its own value is still being
    /// computed contributes its activation from the previous
    /// call (0 on the first call).
    ///
    /// # Errors
    /// Returns an error if the number of inputs does not match,
    /// or if the network has no output node.
    pub fn get_activation(&mut self, inputs: &[f64]) -> Result<f64, NetworkError> {
        if inputs.len() != self.inputs.len() {
            return Err(NetworkError::InputSizeMismatch {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }
        let output = self.output.ok_or(NetworkError::MissingOutput)?;

        let mut values: Vec<Option<f64>> = self
            .nodes
            .iter()
            .map(|n| (n.role == NeuronRole::Bias).then(|| 1.0))
            .collect();
        for (index, value) in self.inputs.iter().zip(inputs) {
            values[index.0] = Some(*value);
        }
        let mut in_progress = vec![false; self.nodes.len()];

        let mut stack = vec![Frame {
            node: output.0,
            next_synapse: 0,
            sum: 0.0,
        }];
        in_progress[output.0] = true;

        while let Some(frame) = stack.last_mut() {
            let node = &self.nodes[frame.node];
            match node.incoming.get(frame.next_synapse) {
                Some(synapse) => {
                    let source = synapse.source.0;
                    if let Some(value) = values[source] {
                        frame.sum += synapse.weight * value;
                        frame.next_synapse += 1;
                    } else if in_progress[source] {
                        frame.sum += synapse.weight * self.nodes[source].previous;
                        frame.next_synapse += 1;
                    } else {
                        in_progress[source] = true;
                        stack.push(Frame {
                            node: source,
                            next_synapse: 0,
                            sum: 0.0,
                        });
                    }
                }
                None => {
                    let value = node.activation.map_or(frame.sum, |f| f.apply(frame.sum));
                    values[frame.node] = Some(value);
                    in_progress[frame.node] = false;
                    stack.pop();
                }
            }
        }

        for (node, value) in self.nodes.iter_mut().zip(&values) {
            if let Some(value) = value {
                node.previous = *value;
            }
        }
        values[output.0].ok_or(NetworkError::MissingOutput)
    }

    /// Forgets all activations remembered from previous calls.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.previous = 0.0;
        }
    }

    /// Returns the number of nodes in the network.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of inputs the network expects.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the incoming synapses of a node.
    pub fn synapses(&self, node: NodeIndex) -> &[Synapse] {
        &self.nodes[node.0].incoming
    }
}

impl From<&GeneCollection> for Network {
    /// Builds the phenotype of a gene collection. Nodes are
    /// created in neuron id order, so inputs are fed to input
    /// neurons by increasing id.
    fn from(genes: &GeneCollection) -> Network {
        let valid_links: Vec<_> = genes.valid_links().collect();
        let expressed: HashSet<Innovation, RandomState> = valid_links
            .iter()
            .flat_map(|l| [l.from().id(), l.to().id()])
            .collect();

        let mut network = Network::default();
        let mut indices: HashMap<Innovation, NodeIndex, RandomState> = HashMap::default();
        for neuron in genes.neurons() {
            if neuron.role() == NeuronRole::Hidden && !expressed.contains(&neuron.id()) {
                continue;
            }
            let index = network.add_neuron(neuron.role(), neuron.activation());
            indices.insert(neuron.id(), index);
        }
        for link in valid_links {
            network.add_link(indices[&link.from().id()], indices[&link.to().id()], link.weight());
        }

        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const BIAS: f64 = -0.5;
    const W1: f64 = 0.5;
    const W2: f64 = -0.5;
    const W3: f64 = 2.0;
    const W4: f64 = 1.5;

    const TANH: Option<ActivationFunction> = Some(ActivationFunction::Tanh);

    struct Fixture {
        network: Network,
        bias: NodeIndex,
        inputs: [NodeIndex; 2],
        output: NodeIndex,
    }

    fn fixture() -> Fixture {
        let mut network = Network::default();
        let bias = network.add_neuron(NeuronRole::Bias, None);
        let inputs = [
            network.add_neuron(NeuronRole::Input, None),
            network.add_neuron(NeuronRole::Input, None),
        ];
        let output = network.add_neuron(NeuronRole::Output, TANH);
        Fixture {
            network,
            bias,
            inputs,
            output,
        }
    }

    /// Links bias and both inputs into `to`.
    fn link_first_layer(f: &mut Fixture, to: NodeIndex) {
        f.network.add_link(f.bias, to, BIAS);
        f.network.add_link(f.inputs[0], to, W1);
        f.network.add_link(f.inputs[1], to, W2);
    }

    fn first_layer(i1: f64, i2: f64) -> f64 {
        BIAS + W1 * i1 + W2 * i2
    }

    #[test]
    fn connected() {
        let mut f = fixture();
        let output = f.output;
        link_first_layer(&mut f, output);
        assert_approx_eq!(f.network.get_activation(&[1.0, 0.5]).unwrap(), first_layer(1.0, 0.5).tanh());
    }

    #[test]
    fn parallel_synapses() {
        let mut f = fixture();
        let output = f.output;
        link_first_layer(&mut f, output);
        f.network.add_link(f.inputs[0], output, W4);
        let expected = (first_layer(0.3, -0.7) + W4 * 0.3).tanh();
        assert_approx_eq!(f.network.get_activation(&[0.3, -0.7]).unwrap(), expected);
    }

    #[test]
    fn two_hidden_layers() {
        let mut f = fixture();
        let h2 = f.network.add_neuron(NeuronRole::Hidden, TANH);
        let h1 = f.network.add_neuron(NeuronRole::Hidden, TANH);
        link_first_layer(&mut f, h2);
        link_first_layer(&mut f, h1);
        f.network.add_link(h2, h1, W4);
        f.network.add_link(h1, f.output, W3);
        f.network.add_link(h2, f.output, W3);

        let l1 = first_layer(1.0, 1.0);
        let h2_value = l1.tanh();
        let h1_value = (l1 + W4 * h2_value).tanh();
        let expected = (W3 * h1_value + W3 * h2_value).tanh();
        assert_approx_eq!(f.network.get_activation(&[1.0, 1.0]).unwrap(), expected);

        // Feed-forward networks give the same answer every time.
        assert_approx_eq!(f.network.get_activation(&[1.0, 1.0]).unwrap(), expected);
    }

    #[test]
    fn two_hidden_layers_with_direct_links() {
        let mut f = fixture();
        let output = f.output;
        let h2 = f.network.add_neuron(NeuronRole::Hidden, TANH);
        let h1 = f.network.add_neuron(NeuronRole::Hidden, TANH);
        link_first_layer(&mut f, h2);
        link_first_layer(&mut f, h1);
        link_first_layer(&mut f, output);
        f.network.add_link(h2, h1, W4);
        f.network.add_link(h1, output, W3);
        f.network.add_link(h2, output, W3);

        let l1 = first_layer(-1.0, 0.25);
        let h2_value = l1.tanh();
        let h1_value = (l1 + W4 * h2_value).tanh();
        let expected = (l1 + W3 * h1_value + W3 * h2_value).tanh();
        assert_approx_eq!(f.network.get_activation(&[-1.0, 0.25]).unwrap(), expected);
    }

    #[test]
    fn recurrent() {
        let mut f = fixture();
        let hidden = f.network.add_neuron(NeuronRole::Hidden, TANH);
        link_first_layer(&mut f, hidden);
        f.network.add_link(hidden, f.output, W3);
        f.network.add_link(f.output, hidden, W4);

        let l1 = first_layer(0.5, 1.0);
        let out1 = (W3 * l1.tanh()).tanh();
        assert_approx_eq!(f.network.get_activation(&[0.5, 1.0]).unwrap(), out1);
        let out2 = (W3 * (l1 + W4 * out1).tanh()).tanh();
        assert_approx_eq!(f.network.get_activation(&[0.5, 1.0]).unwrap(), out2);

        f.network.reset();
        assert_approx_eq!(f.network.get_activation(&[0.5, 1.0]).unwrap(), out1);
    }

    #[test]
    fn self_loop() {
        let mut f = fixture();
        let output = f.output;
        f.network.add_link(f.bias, output, 1.0);
        f.network.add_link(output, output, 1.0);
        let first = f.network.get_activation(&[0.0, 0.0]).unwrap();
        assert_approx_eq!(first, 1f64.tanh());
        assert_approx_eq!(f.network.get_activation(&[0.0, 0.0]).unwrap(), (1.0 + first).tanh());
    }

    #[test]
    fn long_chain() {
        let mut f = fixture();
        let first = f.network.add_neuron(NeuronRole::Hidden, Some(ActivationFunction::Linear));
        f.network.add_link(f.inputs[0], first, 1.0);
        let mut previous = first;
        for _ in 1..10_000 {
            let hidden = f.network.add_neuron(NeuronRole::Hidden, Some(ActivationFunction::Linear));
            f.network.add_link(previous, hidden, 1.0);
            previous = hidden;
        }
        // Close the cycle, with a weight that leaves values unchanged.
        f.network.add_link(previous, first, 0.0);
        let output = f.output;
        f.network.add_link(previous, output, 1.0);
        assert_approx_eq!(f.network.get_activation(&[0.25, 0.0]).unwrap(), 0.25f64.tanh());
        assert_approx_eq!(f.network.get_activation(&[0.5, 0.0]).unwrap(), 0.5f64.tanh());
    }

    #[test]
    fn input_mismatch() {
        let mut f = fixture();
        assert_eq!(
            f.network.get_activation(&[1.0]),
            Err(NetworkError::InputSizeMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn missing_output() {
        let mut network = Network::default();
        network.add_neuron(NeuronRole::Input, None);
        assert_eq!(network.get_activation(&[1.0]), Err(NetworkError::MissingOutput));
    }

    #[test]
    fn unlinked_output() {
        let mut f = fixture();
        assert_eq!(f.network.get_activation(&[1.0, 1.0]), Ok(0.0));
    }

    #[test]
    #[should_panic(expected = "no node at index 9")]
    fn link_to_missing_node() {
        let mut f = fixture();
        f.network.add_link(f.bias, NodeIndex(9), W1);
    }
}
