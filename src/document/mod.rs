//! Rendering-environment interface.
//!
//! The collector never owns the document it reads. Everything it needs from
//! the environment goes through [`Document`]:
//!
//! | Capability | Method |
//! |------------|--------|
//! | Query elements matching a selector within a scope | [`Document::query`] |
//! | Subscribe to structural/attribute changes in a scope | [`Document::subscribe`] |
//! | Invoke a UI trigger (click) on an element | [`Document::trigger`] |
//! | Read an element's text / attribute | [`Document::text`], [`Document::attribute`] |
//!
//! [`MemoryDocument`] is an in-process implementation whose nodes declare
//! the selectors they match.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::identifiers::NodeId;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory document tree.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{ElementSpec, MemoryDocument};

// ============================================================================
// Scope
// ============================================================================

/// Subtree a query or subscription is limited to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// The whole document.
    #[default]
    Document,
    /// Descendants of the given node (the node itself excluded from queries).
    Node(NodeId),
}

// ============================================================================
// ChangeNotice
// ============================================================================

/// What changed on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Children were added or removed.
    ChildList,
    /// The named attribute changed.
    Attribute(String),
    /// Text content changed.
    Text,
    /// Notifications were dropped; re-read everything.
    Overflow,
}

/// A change notification from the observed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    /// Node the change happened on (the parent, for child-list changes).
    pub node: NodeId,
    /// Kind of change.
    pub kind: ChangeKind,
}

/// Stream of change notifications. Dropping it releases the subscription.
pub type ChangeStream = BoxStream<'static, ChangeNotice>;

// ============================================================================
// Document
// ============================================================================

/// A live, externally mutated document.
///
/// Implementations must tolerate concurrent mutation by the environment;
/// handles returned by [`query`](Self::query) may go stale at any time.
#[async_trait]
pub trait Document: Send + Sync {
    /// Returns nodes matching `selector` within `scope`, in document order.
    async fn query(&self, selector: &str, scope: &Scope) -> Result<Vec<NodeId>>;

    /// Subscribes to change notifications within `scope`.
    async fn subscribe(&self, scope: &Scope) -> Result<ChangeStream>;

    /// Clicks `node`.
    async fn trigger(&self, node: &NodeId) -> Result<()>;

    /// Returns the text content of `node`.
    async fn text(&self, node: &NodeId) -> Result<String>;

    /// Returns the value of attribute `name` on `node`, if set.
    async fn attribute(&self, node: &NodeId, name: &str) -> Result<Option<String>>;

    /// Returns the first node matching `selector` within `scope`.
    async fn query_first(&self, selector: &str, scope: &Scope) -> Result<Option<NodeId>> {
        Ok(self.query(selector, scope).await?.into_iter().next())
    }
}
