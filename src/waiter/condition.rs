//! Conditions evaluated by the [`ConditionWaiter`](super::ConditionWaiter).
//!
//! A condition sees the current matches of the observed selector and may
//! read the document to decide. The waiter only evaluates it when there is
//! at least one match.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;
use crate::identifiers::NodeId;

// ============================================================================
// Condition
// ============================================================================

/// Predicate over the current matches of a selector.
#[async_trait]
pub trait Condition: Send + Sync {
    /// Returns `true` once the awaited state has been reached.
    async fn holds(&self, document: &dyn Document, matches: &[NodeId]) -> Result<bool>;
}

// ============================================================================
// Built-in Conditions
// ============================================================================

/// Satisfied by any non-empty match set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyMatch;

#[async_trait]
impl Condition for AnyMatch {
    async fn holds(&self, _document: &dyn Document, matches: &[NodeId]) -> Result<bool> {
        Ok(!matches.is_empty())
    }
}

/// Satisfied when a fixed node carries `name="value"`.
///
/// The node need not be one of the matches.
#[derive(Debug, Clone)]
pub struct AttributeEquals {
    /// Node to inspect.
    pub node: NodeId,
    /// Attribute name.
    pub name: String,
    /// Expected value.
    pub value: String,
}

#[async_trait]
impl Condition for AttributeEquals {
    async fn holds(&self, document: &dyn Document, _matches: &[NodeId]) -> Result<bool> {
        let actual = document.attribute(&self.node, &self.name).await?;
        Ok(actual.as_deref() == Some(self.value.as_str()))
    }
}

/// Satisfied when the match at `index` carries `name="value"`.
#[derive(Debug, Clone)]
pub struct NthAttributeEquals {
    /// Position within the match set.
    pub index: usize,
    /// Attribute name.
    pub name: String,
    /// Expected value.
    pub value: String,
}

#[async_trait]
impl Condition for NthAttributeEquals {
    async fn holds(&self, document: &dyn Document, matches: &[NodeId]) -> Result<bool> {
        let Some(node) = matches.get(self.index) else {
            return Ok(false);
        };
        let actual = document.attribute(node, &self.name).await?;
        Ok(actual.as_deref() == Some(self.value.as_str()))
    }
}

/// Satisfied once the first match is no longer `previous`.
///
/// Used as a proxy for "the environment has re-rendered this control".
#[derive(Debug, Clone)]
pub struct FirstChanged {
    /// Handle observed before the triggering action.
    pub previous: NodeId,
}

#[async_trait]
impl Condition for FirstChanged {
    async fn holds(&self, _document: &dyn Document, matches: &[NodeId]) -> Result<bool> {
        Ok(matches.first().is_some_and(|first| first != &self.previous))
    }
}

/// Condition backed by a synchronous closure over the matches.
pub struct FnCondition<F>(F);

/// Wraps a closure as a [`Condition`].
pub fn from_fn<F>(predicate: F) -> FnCondition<F>
where
    F: Fn(&[NodeId]) -> bool + Send + Sync,
{
    FnCondition(predicate)
}

#[async_trait]
impl<F> Condition for FnCondition<F>
where
    F: Fn(&[NodeId]) -> bool + Send + Sync,
{
    async fn holds(&self, _document: &dyn Document, matches: &[NodeId]) -> Result<bool> {
        Ok((self.0)(matches))
    }
}

// ============================================================================
// Tests
// ============================================================================
