//! In-memory SQS-compatible queue broker
//!
//! Provides:
//! - the queue engine (create, tag, send, receive, delete, purge)
//! - JSON and HTML wire codecs
//! - the action router serving the `x-amz-target` JSON protocol and the
//!   browsable `/queues` pages

pub mod codec;
pub mod engine;
pub mod model;
pub mod protocol;
pub mod router;

pub use engine::{QueueEngine, QueueError};
pub use router::{handle_request, routes, SqsState};
