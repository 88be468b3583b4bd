//! Movie-list fixture: the canonical consumer of the feedback runtime.

#![allow(dead_code)]

use feedback_loop::{Feedback, Reducer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("network unreachable")]
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: u32,
    pub title: String,
}

impl Movie {
    pub fn new(id: u32, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoviesState {
    Idle,
    Loading,
    Loaded(Vec<Movie>),
    Error(LoadError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoviesEvent {
    OnAppear,
    OnSelectMovie(u32),
    OnMoviesLoaded(Vec<Movie>),
    OnFailedToLoad(LoadError),
}

pub struct MoviesReducer;

impl Reducer for MoviesReducer {
    type State = MoviesState;
    type Event = MoviesEvent;

    fn reduce(state: Self::State, event: Self::Event) -> Self::State {
        match state {
            MoviesState::Idle => match event {
                MoviesEvent::OnAppear => MoviesState::Loading,
                _ => MoviesState::Idle,
            },
            MoviesState::Loading => match event {
                MoviesEvent::OnMoviesLoaded(movies) => MoviesState::Loaded(movies),
                MoviesEvent::OnFailedToLoad(err) => MoviesState::Error(err),
                _ => MoviesState::Loading,
            },
            // Terminal for this feature: further events are absorbed.
            other @ (MoviesState::Loaded(_) | MoviesState::Error(_)) => other,
        }
    }
}

/// Conditional-effect feedback: while the state is `Loading`, run the stub
/// fetch and map its outcome to an event.
pub fn when_loading(
    outcome: Result<Vec<Movie>, LoadError>,
) -> Feedback<MoviesState, MoviesEvent> {
    Feedback::from_try_effects(
        move |state| {
            if !matches!(state, MoviesState::Loading) {
                return None;
            }
            let outcome = outcome.clone();
            Some(async move { outcome.map(MoviesEvent::OnMoviesLoaded) })
        },
        MoviesEvent::OnFailedToLoad,
    )
}

pub fn catalog() -> Vec<Movie> {
    vec![Movie::new(1, "A"), Movie::new(2, "B")]
}
