use thiserror::Error;

/// An invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    NegativeValue { name: &'static str, value: f64 },
}

/// Errors returned by [`Population`] operations.
///
/// [`Population`]: crate::Population
#[derive(Debug, Error)]
pub enum PopulationError {
    /// The population has not been filled with genomes yet.
    #[error("cannot iterate before the population is initialised")]
    Uninitialised,
    /// No species is able to breed with a positive average fitness.
    #[error("population failed at generation {generation}: no breeding species with positive fitness")]
    Failed { generation: usize },
    #[error("invalid population configuration: {0}")]
    InvalidPopulationConfig(#[from] ConfigError),
    #[error("invalid genetic configuration: {0}")]
    InvalidGeneticConfig(Box<dyn std::error::Error + Send + Sync>),
}
