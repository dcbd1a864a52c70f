/// Lifecycle notifications emitted by a [`Population`]
/// while it is initialised and iterated.
///
/// Listeners run synchronously, inside the call that
/// triggered the event.
///
/// [`Population`]: crate::Population
#[derive(Debug)]
pub enum PopulationEvent<'a, G> {
    /// A generation is about to be produced.
    IterationBegin(usize),
    /// Parents have been selected and the previous
    /// generation has been discarded.
    SelectionComplete,
    /// A genome was scored and placed into a species.
    GenomeAdded(&'a G),
    /// A genome of the previous generation was discarded.
    GenomeRemoved(&'a G),
    /// A generation has been completed.
    IterationComplete(usize),
}

/// A registered event callback.
pub type Listener<G> = Box<dyn FnMut(&PopulationEvent<'_, G>) + Send>;
