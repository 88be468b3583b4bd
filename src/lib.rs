//! Feedback-driven state machine runtime.
//!
//! Drives application state through a pure reducer and a set of
//! asynchronous feedbacks.
//!
//! # Architecture
//!
//! ```text
//! Feedback ──→ Event ──→ Reducer ──→ State
//!    ↑                                 │
//!    └─────────────────────────────────┘
//! ```
//!
//! - **State**: immutable snapshot of the feature's current condition
//! - **Event**: a discrete stimulus that may transition the state
//! - **Reducer**: pure function folding events into new states
//! - **Feedback**: asynchronous event source conditioned on the state
//!
//! [`system`] wires these together and returns an ordered stream of
//! states. Dropping the stream detaches the subscriber and tears the
//! whole loop down.

mod feedback;
mod reducer;
mod system;

pub use feedback::{input_channel, EventSender, Feedback, StateUpdates};
pub use reducer::Reducer;
pub use system::{system, StateStream};
