//! Asynchronous event sources conditioned on the current state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use futures_core::Stream;
use tokio::sync::{mpsc, watch};

/// Live read-only view of the current-state cell.
///
/// Yields the state as of subscription, then every state the fold commits
/// afterwards. A reader that falls behind is caught up to the latest
/// committed state; intermediate states are not buffered.
pub struct StateUpdates<S> {
    inner: BoxStream<'static, S>,
}

impl<S> StateUpdates<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(rx: watch::Receiver<S>) -> Self {
        let inner = futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let state = rx.borrow_and_update().clone();
            Some((state, (rx, false)))
        });
        Self {
            inner: inner.boxed(),
        }
    }
}

impl<S> Stream for StateUpdates<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// One asynchronous source of events for a feedback system.
///
/// A feedback observes the live state stream and emits events back into
/// the loop. It holds no state of its own; it closes over whatever
/// external dependencies its effects need (e.g. an API client).
pub struct Feedback<S, E> {
    run: Box<dyn FnOnce(StateUpdates<S>) -> BoxStream<'static, E> + Send>,
}

impl<S, E> Feedback<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// General form: map the live state stream to any event stream.
    ///
    /// [`Feedback::from_effects`] and [`Feedback::from_stream`] cover the
    /// common shapes; use this seam for anything custom.
    pub fn new<F, ES>(run: F) -> Self
    where
        F: FnOnce(StateUpdates<S>) -> ES + Send + 'static,
        ES: Stream<Item = E> + Send + 'static,
    {
        Self {
            run: Box::new(move |states| run(states).boxed()),
        }
    }

    /// Conditional-effect feedback with switch-to-latest semantics.
    ///
    /// For every observed state, `effects` either starts an asynchronous
    /// effect whose result becomes an event, or returns `None` to emit
    /// nothing for that state. A newer state supersedes the in-flight
    /// effect: its future is dropped, so a stale result can never reach
    /// the fold.
    pub fn from_effects<F, Fut>(mut effects: F) -> Self
    where
        F: FnMut(&S) -> Option<Fut> + Send + 'static,
        Fut: Future<Output = E> + Send + 'static,
    {
        Self::new(move |states| SwitchLatest {
            states,
            effects: Box::new(move |state| effects(state).map(FutureExt::boxed)),
            in_flight: None,
            states_done: false,
        })
    }

    /// Like [`Feedback::from_effects`], for effects that can fail.
    ///
    /// `catch` maps the effect's error to an ordinary event, so a failed
    /// effect surfaces as state like any other outcome and the loop keeps
    /// running.
    pub fn from_try_effects<F, Fut, Err, C>(mut effects: F, catch: C) -> Self
    where
        F: FnMut(&S) -> Option<Fut> + Send + 'static,
        Fut: Future<Output = Result<E, Err>> + Send + 'static,
        Err: Send + 'static,
        C: Fn(Err) -> E + Send + Sync + 'static,
    {
        let catch = Arc::new(catch);
        Self::from_effects(move |state| {
            let effect = effects(state)?;
            let catch = Arc::clone(&catch);
            Some(async move {
                match effect.await {
                    Ok(event) => event,
                    Err(err) => catch(err),
                }
            })
        })
    }

    /// External-input feedback: relay an event stream, ignoring state.
    ///
    /// This is how user actions and other out-of-loop stimuli enter the
    /// system; see [`input_channel`] for the wired pair.
    pub fn from_stream<ES>(events: ES) -> Self
    where
        ES: Stream<Item = E> + Send + 'static,
    {
        Self::new(move |_states| events)
    }

    pub(crate) fn into_events(self, rx: watch::Receiver<S>) -> BoxStream<'static, E> {
        (self.run)(StateUpdates::new(rx))
    }
}

/// Maps each state to at most one pending effect, keeping only the latest.
struct SwitchLatest<S, E> {
    states: StateUpdates<S>,
    effects: Box<dyn FnMut(&S) -> Option<BoxFuture<'static, E>> + Send>,
    in_flight: Option<BoxFuture<'static, E>>,
    states_done: bool,
}

impl<S, E> Stream for SwitchLatest<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        let this = self.get_mut();

        // State changes take priority over effect completion: once a newer
        // state arrives, the previous effect is superseded and dropped
        // before its result can be observed.
        while !this.states_done {
            match Pin::new(&mut this.states).poll_next(cx) {
                Poll::Ready(Some(state)) => {
                    this.in_flight = (this.effects)(&state);
                }
                Poll::Ready(None) => this.states_done = true,
                Poll::Pending => break,
            }
        }

        if let Some(effect) = this.in_flight.as_mut() {
            if let Poll::Ready(event) = effect.as_mut().poll(cx) {
                this.in_flight = None;
                return Poll::Ready(Some(event));
            }
        }

        if this.states_done && this.in_flight.is_none() {
            return Poll::Ready(None);
        }
        Poll::Pending
    }
}

/// Fire-and-forget handle for injecting events into a running system.
pub struct EventSender<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventSender<E> {
    /// Enqueue an event for the next fold cycle. Non-blocking; an event
    /// sent after the subscriber detached is silently dropped.
    pub fn send(&self, event: E) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped (system detached)");
        }
    }
}

/// Wired pair for external input: the sender injects events, the feedback
/// relays them into the loop.
pub fn input_channel<S, E>() -> (EventSender<E>, Feedback<S, E>)
where
    S: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let relay = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    });
    (EventSender { tx }, Feedback::from_stream(relay))
}
