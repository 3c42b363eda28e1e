use std::time::{Duration, Instant};

use crate::{CancellationToken, Cancelled};

/// Canonical per-request context passed through Vega's request layer.
///
/// This type is small and `Clone` so callers can cheaply hand it to nested
/// work. Cancellation is cooperative via [`CancellationToken`]; the deadline is
/// checked lazily whenever [`RequestContext::check`] runs.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            request_id: request_id.into(),
            cancel,
            deadline: None,
        }
    }

    /// A context that is never cancelled; handy for tests and synchronous tools.
    pub fn detached() -> Self {
        Self::new("detached", CancellationToken::new())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Clone the context, but replace the cancellation token with a child token.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                tracing::debug!(
                    target: "vega.scheduler",
                    request = %self.request_id,
                    "request deadline reached"
                );
                self.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Returns `Err(Cancelled)` once the request has been cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_tokens_observe_parent_cancellation() {
        let ctx = RequestContext::detached();
        let child = ctx.child();
        assert_eq!(child.check(), Ok(()));
        ctx.token().cancel();
        assert_eq!(child.check(), Err(Cancelled));
    }

    #[test]
    fn expired_deadline_cancels() {
        let ctx = RequestContext::detached().with_deadline(Instant::now());
        assert!(ctx.is_cancelled());
        assert!(ctx.token().is_cancelled());
    }
}
