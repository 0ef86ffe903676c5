//! Predicate-driven waiting on a mutating document.
//!
//! [`ConditionWaiter::wait`] resolves once a selector's matches satisfy a
//! [`Condition`], optionally clicking a trigger first. This is the only way
//! the rest of the crate waits on the document; nothing sleeps for a fixed
//! delay.
//!
//! # Observation
//!
//! 1. Invoke the trigger, if any (failure → [`Error::TriggerFailed`])
//! 2. Check immediately; resolve without subscribing if satisfied
//! 3. Subscribe to changes in scope and re-check on every notification
//! 4. Give up with [`Error::Timeout`] once the timeout elapses
//!
//! The trigger and the observation share one deadline.
//!
//! The subscription is a stream owned by the wait future, so it is released
//! on every exit path, including cancellation.
//!
//! # Example
//!
//! ```ignore
//! let waiter = ConditionWaiter::new(&document);
//! let lines = waiter
//!     .wait(
//!         "span[data-purpose='cue-text']",
//!         WaitOptions::new(Duration::from_secs(10)).with_trigger(toggle),
//!     )
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

use crate::document::{Document, Scope};
use crate::error::{Error, Result};
use crate::identifiers::NodeId;

// ============================================================================
// Submodules
// ============================================================================

/// Condition trait and built-in conditions.
pub mod condition;

// ============================================================================
// Re-exports
// ============================================================================

pub use condition::{
    AnyMatch, AttributeEquals, Condition, FirstChanged, FnCondition, NthAttributeEquals, from_fn,
};

// ============================================================================
// WaitOptions
// ============================================================================

/// Parameters of a single wait.
pub struct WaitOptions<'a> {
    /// Element to click before observing.
    pub trigger: Option<NodeId>,
    /// Condition over the matches; [`AnyMatch`] when absent.
    pub condition: Option<&'a dyn Condition>,
    /// Upper bound on the wait.
    pub timeout: Duration,
    /// Subtree queried and observed.
    pub scope: Scope,
}

impl<'a> WaitOptions<'a> {
    /// Creates options that wait for any match in the whole document.
    #[inline]
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            trigger: None,
            condition: None,
            timeout,
            scope: Scope::Document,
        }
    }

    /// Clicks `node` before observing.
    #[inline]
    #[must_use]
    pub fn with_trigger(mut self, node: NodeId) -> Self {
        self.trigger = Some(node);
        self
    }

    /// Replaces the default condition.
    #[inline]
    #[must_use]
    pub fn with_condition(mut self, condition: &'a dyn Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Limits the wait to the subtree under `scope`.
    #[inline]
    #[must_use]
    pub fn within(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

// ============================================================================
// ConditionWaiter
// ============================================================================

/// Waits for document state described by a selector and a condition.
#[derive(Clone, Copy)]
pub struct ConditionWaiter<'a> {
    document: &'a dyn Document,
}

impl<'a> ConditionWaiter<'a> {
    /// Creates a waiter over `document`.
    #[inline]
    #[must_use]
    pub fn new(document: &'a dyn Document) -> Self {
        Self { document }
    }

    /// Waits until `selector` has matches satisfying the condition.
    ///
    /// Returns the satisfying match set.
    ///
    /// # Errors
    ///
    /// - [`Error::TriggerFailed`] if the trigger could not be clicked
    /// - [`Error::Timeout`] if the condition did not hold in time
    /// - [`Error::Document`] if the document rejected a query
    pub async fn wait(&self, selector: &str, options: WaitOptions<'_>) -> Result<Vec<NodeId>> {
        let deadline = Instant::now() + options.timeout;
        let timeout_ms = options.timeout.as_millis() as u64;

        if let Some(node) = &options.trigger {
            match timeout_at(deadline, self.document.trigger(node)).await {
                Ok(result) => {
                    result.map_err(|e| Error::trigger_failed(node.as_str(), e.to_string()))?;
                }
                Err(_) => {
                    debug!(selector, node = %node, "Trigger timed out");
                    return Err(Error::timeout(selector, timeout_ms));
                }
            }
        }

        let condition: &dyn Condition = options.condition.unwrap_or(&AnyMatch);

        debug!(
            selector,
            timeout_ms,
            triggered = options.trigger.is_some(),
            "Waiting for condition"
        );

        match timeout_at(deadline, self.observe(selector, condition, &options.scope)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(selector, "Wait timed out");
                Err(Error::timeout(selector, timeout_ms))
            }
        }
    }

    /// Checks, subscribes if needed, and re-checks on every change.
    async fn observe(
        &self,
        selector: &str,
        condition: &dyn Condition,
        scope: &Scope,
    ) -> Result<Vec<NodeId>> {
        if let Some(matches) = self.check(selector, condition, scope).await? {
            trace!(selector, "Condition already satisfied");
            return Ok(matches);
        }

        let mut changes = self.document.subscribe(scope).await?;

        // Changes between the first check and the subscription are not
        // delivered; check once more now that we are listening.
        if let Some(matches) = self.check(selector, condition, scope).await? {
            return Ok(matches);
        }

        while let Some(notice) = changes.next().await {
            trace!(selector, node = %notice.node, kind = ?notice.kind, "Re-checking");
            if let Some(matches) = self.check(selector, condition, scope).await? {
                return Ok(matches);
            }
        }

        Err(Error::document("change notifications ended"))
    }

    async fn check(
        &self,
        selector: &str,
        condition: &dyn Condition,
        scope: &Scope,
    ) -> Result<Option<Vec<NodeId>>> {
        let matches = self.document.query(selector, scope).await?;
        if matches.is_empty() {
            return Ok(None);
        }

        if condition.holds(self.document, &matches).await? {
            Ok(Some(matches))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
