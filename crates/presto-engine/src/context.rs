//! # Sale Context & Session Readiness
//!
//! Every engine call takes an explicit [`SaleContext`] - the resolved store
//! and authenticated actor - instead of reaching into ambient globals.
//! This keeps the engines deterministic under test and makes the
//! "who/where" of every write visible at the call site.
//!
//! ## Session Readiness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  App startup                         Engine caller                  │
//! │      │                                    │                         │
//! │      │ session resolved                   │ wait_ready(5s)          │
//! │      ▼                                    ▼                         │
//! │  gate.set_ready(ctx) ───────────► future resolves with SaleContext  │
//! │                                                                     │
//! │  Not resolved within the timeout → one typed PreconditionFailed.    │
//! │  No sleep-and-recheck loops at call sites; callers await the gate   │
//! │  once and then pass the context around by value.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Sale Context
// =============================================================================

/// The resolved operating context for one engine call:
/// which store, and which authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleContext {
    pub store_id: String,
    pub user_id: String,
}

impl SaleContext {
    /// Creates a new context.
    pub fn new(store_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        SaleContext {
            store_id: store_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Checks that both halves of the context are present.
    ///
    /// Engines call this first; a missing store or actor is a
    /// `PreconditionFailed` before anything is read or written.
    pub fn validate(&self) -> EngineResult<()> {
        if self.store_id.trim().is_empty() {
            return Err(EngineError::precondition("no store resolved"));
        }
        if self.user_id.trim().is_empty() {
            return Err(EngineError::precondition("no authenticated user"));
        }
        Ok(())
    }
}

// =============================================================================
// Session Gate
// =============================================================================

/// Readiness gate bridging the identity/store providers and the engines.
///
/// The providers publish the resolved context once via [`set_ready`];
/// engine callers await [`wait_ready`] with a bounded timeout. Logout
/// clears the gate so stale contexts cannot leak across sessions.
///
/// [`set_ready`]: SessionGate::set_ready
/// [`wait_ready`]: SessionGate::wait_ready
#[derive(Debug)]
pub struct SessionGate {
    tx: watch::Sender<Option<SaleContext>>,
}

impl SessionGate {
    /// Creates a gate with no context resolved yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        SessionGate { tx }
    }

    /// Publishes the resolved context, waking every waiter.
    pub fn set_ready(&self, ctx: SaleContext) {
        self.tx.send_replace(Some(ctx));
    }

    /// Clears the context (logout / store switch).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Returns the current context without waiting.
    pub fn current(&self) -> Option<SaleContext> {
        self.tx.borrow().clone()
    }

    /// Waits until a context is resolved, up to `timeout`.
    ///
    /// A single typed failure on timeout - callers never loop on this.
    pub async fn wait_ready(&self, timeout: Duration) -> EngineResult<SaleContext> {
        let mut rx = self.tx.subscribe();

        let wait = async move {
            loop {
                let current = rx.borrow().clone();
                if let Some(ctx) = current {
                    return Ok(ctx);
                }
                if rx.changed().await.is_err() {
                    return Err(EngineError::precondition("session gate closed"));
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::precondition(
                "session and store context not ready within timeout",
            )),
        }
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use presto_core::CoreError;

    #[test]
    fn test_context_validation() {
        assert!(SaleContext::new("store-1", "user-1").validate().is_ok());

        let err = SaleContext::new("", "user-1").validate().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::PreconditionFailed { .. })
        ));

        assert!(SaleContext::new("store-1", "  ").validate().is_err());
    }

    #[tokio::test]
    async fn test_wait_resolves_immediately_when_ready() {
        let gate = SessionGate::new();
        gate.set_ready(SaleContext::new("store-1", "user-1"));

        let ctx = gate.wait_ready(Duration::from_millis(50)).await.unwrap();
        assert_eq!(ctx.store_id, "store-1");
        assert_eq!(gate.current().unwrap().user_id, "user-1");
    }

    #[tokio::test]
    async fn test_wait_resolves_when_published_later() {
        let gate = std::sync::Arc::new(SessionGate::new());

        let publisher = gate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.set_ready(SaleContext::new("store-1", "user-1"));
        });

        let ctx = gate.wait_ready(Duration::from_secs(2)).await.unwrap();
        assert_eq!(ctx.store_id, "store-1");
    }

    #[tokio::test]
    async fn test_wait_times_out_with_typed_failure() {
        let gate = SessionGate::new();

        let err = gate.wait_ready(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::PreconditionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_blocks_new_waiters() {
        let gate = SessionGate::new();
        gate.set_ready(SaleContext::new("store-1", "user-1"));
        gate.clear();

        assert!(gate.current().is_none());
        assert!(gate.wait_ready(Duration::from_millis(20)).await.is_err());
    }
}
