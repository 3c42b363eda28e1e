//! Cooperative cancellation primitives shared by Vega request handlers.
//!
//! Requests run on a single worker; long-running steps (parsing, type
//! checking, tree traversals) poll the request's [`RequestContext`] and bail
//! out with [`Cancelled`] as soon as the client has lost interest.

mod context;

pub use context::RequestContext;
pub use tokio_util::sync::CancellationToken;

/// Sentinel error returned when a request was cancelled (or ran past its deadline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request cancelled")]
pub struct Cancelled;
