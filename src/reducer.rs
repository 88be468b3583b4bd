//! Reducer contract for the feedback runtime.

/// Computes the next state from the current state and an event.
///
/// The reducer is the only place where state transitions happen.
/// It must be a pure, total function: defined for every (state, event)
/// pair, no side effects, no blocking, no panics. An event that does not
/// apply to the current state returns the state unchanged — a no-op
/// transition, not an error.
///
/// Determinism is part of the contract: identical inputs always yield
/// equal outputs, so transitions can be unit-tested and replayed.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: Clone + Send + Sync + 'static;

    /// The event type this reducer folds.
    type Event: Send + 'static;

    /// Apply one event and return the new state.
    fn reduce(state: Self::State, event: Self::Event) -> Self::State;
}
