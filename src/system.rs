//! The scheduler: merge feedback events, fold, broadcast.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, SelectAll};
use futures_core::Stream;
use tokio::sync::watch;

use crate::feedback::Feedback;

/// Start a feedback system and return its state stream.
///
/// The stream yields `initial` first, then one state per folded event.
/// Events from a single feedback are folded in emission order; across
/// feedbacks the interleaving is whatever the merge delivers, and callers
/// must not rely on any particular one.
///
/// The loop runs for as long as the returned stream is held: dropping it
/// releases every feedback subscription and any in-flight effect.
///
/// # Example
///
/// ```
/// use feedback_loop::{input_channel, system};
/// use futures::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (events, input) = input_channel();
/// let mut states = system(0u32, |state, event: u32| state + event, vec![input]);
/// events.send(2);
/// assert_eq!(states.next().await, Some(0));
/// assert_eq!(states.next().await, Some(2));
/// # }
/// ```
pub fn system<S, E, R>(
    initial: S,
    reduce: R,
    feedbacks: Vec<Feedback<S, E>>,
) -> StateStream<S, E, R>
where
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
    R: FnMut(S, E) -> S,
{
    let (cell, _) = watch::channel(initial.clone());
    let mut events = SelectAll::new();
    for feedback in feedbacks {
        events.push(feedback.into_events(cell.subscribe()));
    }
    tracing::debug!(feedbacks = events.len(), "feedback system started");
    StateStream {
        cell,
        events,
        reduce,
        state: initial,
        primed: false,
    }
}

/// Ordered stream of states produced by [`system`].
///
/// The current-state cell lives here and has exactly one writer: the fold
/// step below. Feedbacks read it through their own subscriptions, so every
/// value they observe is a committed fold result, never an intermediate.
pub struct StateStream<S, E, R> {
    cell: watch::Sender<S>,
    events: SelectAll<BoxStream<'static, E>>,
    reduce: R,
    state: S,
    primed: bool,
}

impl<S, E, R> Stream for StateStream<S, E, R>
where
    S: Clone + Send + Sync + Unpin + 'static,
    E: Send + 'static,
    R: FnMut(S, E) -> S + Unpin,
{
    type Item = S;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Subscribers observe the starting state before any transition.
        if !this.primed {
            this.primed = true;
            return Poll::Ready(Some(this.state.clone()));
        }

        match Pin::new(&mut this.events).poll_next(cx) {
            Poll::Ready(Some(event)) => {
                let next = (this.reduce)(this.state.clone(), event);
                this.state = next.clone();
                // Commit to the cell before yielding, so a feedback never
                // reads a state older than the one the subscriber holds.
                this.cell.send_replace(next.clone());
                tracing::trace!("state transition committed");
                Poll::Ready(Some(next))
            }
            // Every feedback stream has terminated; no further events can
            // ever arrive, so the state stream ends too.
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
