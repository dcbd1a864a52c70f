use crate::networks::NodeIndex;

use std::fmt;

/// A weighted incoming edge of a network node.
#[derive(Clone, Copy, PartialEq)]
pub struct Synapse {
    pub source: NodeIndex,
    pub weight: f64,
}

impl Synapse {
    /// Creates a new Synapse with the specified
    /// source node and weight.
    pub fn new(source: NodeIndex, weight: f64) -> Synapse {
        Synapse { source, weight }
    }
}

impl fmt::Debug for Synapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.9}", self.source.0, self.weight)
    }
}
