//! In-memory document tree.
//!
//! Each node lists the selectors it matches instead of carrying tag names
//! and classes; a query for `selector` returns the nodes that declared it.
//! Click behavior is attached per node and may mutate the tree immediately
//! or from a spawned task, the way a real page reacts asynchronously.
//!
//! # Example
//!
//! ```ignore
//! let doc = MemoryDocument::new();
//! let button = doc.append(
//!     &doc.root(),
//!     ElementSpec::new()
//!         .matching("button.toggle")
//!         .attribute("aria-expanded", "false")
//!         .on_click(|doc| {
//!             let doc = doc.clone();
//!             tokio::spawn(async move {
//!                 tokio::time::sleep(Duration::from_millis(50)).await;
//!                 let _ = doc.append(&doc.root(), ElementSpec::new().matching("li"));
//!             });
//!             Ok(())
//!         }),
//! )?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::NodeId;

use super::{ChangeKind, ChangeNotice, ChangeStream, Document, Scope};

// ============================================================================
// Constants
// ============================================================================

/// Buffered notifications per subscriber before it observes an overflow.
const CHANGE_CAPACITY: usize = 256;

/// Handle of the implicit root node.
const ROOT_ID: &str = "root";

// ============================================================================
// Types
// ============================================================================

/// Click behavior attached to a node.
pub type ClickHandler = Arc<dyn Fn(&MemoryDocument) -> Result<()> + Send + Sync>;

// ============================================================================
// ElementSpec
// ============================================================================

/// Description of a node (and its subtree) to insert.
#[derive(Default, Clone)]
pub struct ElementSpec {
    selectors: Vec<String>,
    attributes: Vec<(String, String)>,
    text: String,
    on_click: Option<ClickHandler>,
    children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// Creates an empty element.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a selector this element matches.
    #[inline]
    #[must_use]
    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Sets an attribute.
    #[inline]
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Sets the text content.
    #[inline]
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the click behavior.
    #[inline]
    #[must_use]
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MemoryDocument) -> Result<()> + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Appends a child element.
    #[inline]
    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

// ============================================================================
// Tree
// ============================================================================

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    selectors: Vec<String>,
    attributes: FxHashMap<String, String>,
    text: String,
    on_click: Option<ClickHandler>,
}

impl Node {
    fn empty(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            selectors: Vec::new(),
            attributes: FxHashMap::default(),
            text: String::new(),
            on_click: None,
        }
    }
}

struct Tree {
    nodes: FxHashMap<NodeId, Node>,
    next_id: u64,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(NodeId::new(ROOT_ID), Node::empty(None));
        Self { nodes, next_id: 1 }
    }

    fn node(&self, id: &NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::document(format!("unknown node {id}")))
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::document(format!("unknown node {id}")))
    }

    fn insert(&mut self, parent: &NodeId, spec: ElementSpec) -> NodeId {
        let id = NodeId::new(format!("node-{}", self.next_id));
        self.next_id += 1;

        let mut node = Node::empty(Some(parent.clone()));
        node.selectors = spec.selectors;
        node.attributes = spec.attributes.into_iter().collect();
        node.text = spec.text;
        node.on_click = spec.on_click;
        self.nodes.insert(id.clone(), node);

        for child in spec.children {
            let child_id = self.insert(&id, child);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.children.push(child_id);
            }
        }

        id
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }

    /// Returns `true` if `node` is `ancestor` or lies beneath it.
    fn is_within(&self, node: &NodeId, ancestor: &NodeId) -> bool {
        let mut cursor = Some(node.clone());
        while let Some(current) = cursor {
            if &current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent.clone());
        }
        false
    }

    /// Collects matching descendants of `start` in document order.
    fn collect(&self, start: &NodeId, selector: &str, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(start) else {
            return;
        };
        for child in &node.children {
            if let Some(child_node) = self.nodes.get(child)
                && child_node.selectors.iter().any(|s| s == selector)
            {
                out.push(child.clone());
            }
            self.collect(child, selector, out);
        }
    }
}

// ============================================================================
// MemoryDocument
// ============================================================================

struct Inner {
    tree: Mutex<Tree>,
    changes: broadcast::Sender<ChangeNotice>,
    subscriptions_opened: AtomicUsize,
}

/// Shared handle to an in-memory document.
///
/// Cloning yields another handle to the same tree.
#[derive(Clone)]
pub struct MemoryDocument {
    inner: Arc<Inner>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tree: Mutex::new(Tree::new()),
                changes,
                subscriptions_opened: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the root node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(ROOT_ID)
    }

    /// Inserts `spec` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if `parent` does not exist.
    pub fn append(&self, parent: &NodeId, spec: ElementSpec) -> Result<NodeId> {
        let id = {
            let mut tree = self.inner.tree.lock();
            tree.node(parent)?;
            let id = tree.insert(parent, spec);
            tree.node_mut(parent)?.children.push(id.clone());
            id
        };
        self.notify(parent.clone(), ChangeKind::ChildList);
        Ok(id)
    }

    /// Removes `node` and its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if `node` does not exist or is the root.
    pub fn remove(&self, node: &NodeId) -> Result<()> {
        let parent = {
            let mut tree = self.inner.tree.lock();
            let parent = tree
                .node(node)?
                .parent
                .clone()
                .ok_or_else(|| Error::document("cannot remove the root node"))?;
            tree.node_mut(&parent)?.children.retain(|c| c != node);
            tree.remove_subtree(node);
            parent
        };
        self.notify(parent, ChangeKind::ChildList);
        Ok(())
    }

    /// Removes every child of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if `node` does not exist.
    pub fn clear_children(&self, node: &NodeId) -> Result<()> {
        {
            let mut tree = self.inner.tree.lock();
            let children = std::mem::take(&mut tree.node_mut(node)?.children);
            for child in &children {
                tree.remove_subtree(child);
            }
        }
        self.notify(node.clone(), ChangeKind::ChildList);
        Ok(())
    }

    /// Sets attribute `name` on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if `node` does not exist.
    pub fn set_attribute(
        &self,
        node: &NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        self.inner
            .tree
            .lock()
            .node_mut(node)?
            .attributes
            .insert(name.clone(), value.into());
        self.notify(node.clone(), ChangeKind::Attribute(name));
        Ok(())
    }

    /// Replaces the text content of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if `node` does not exist.
    pub fn set_text(&self, node: &NodeId, text: impl Into<String>) -> Result<()> {
        self.inner.tree.lock().node_mut(node)?.text = text.into();
        self.notify(node.clone(), ChangeKind::Text);
        Ok(())
    }

    /// Returns `true` if `node` is still attached.
    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.inner.tree.lock().nodes.contains_key(node)
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    /// Returns the number of subscriptions ever opened.
    #[must_use]
    pub fn subscriptions_opened(&self) -> usize {
        self.inner.subscriptions_opened.load(Ordering::Relaxed)
    }

    fn notify(&self, node: NodeId, kind: ChangeKind) {
        trace!(%node, ?kind, "Document changed");
        // No receivers is fine: nobody is observing.
        let _ = self.inner.changes.send(ChangeNotice { node, kind });
    }
}

// ============================================================================
// Document Implementation
// ============================================================================

#[async_trait]
impl Document for MemoryDocument {
    async fn query(&self, selector: &str, scope: &Scope) -> Result<Vec<NodeId>> {
        let tree = self.inner.tree.lock();
        let start = match scope {
            Scope::Document => self.root(),
            Scope::Node(node) => {
                tree.node(node)?;
                node.clone()
            }
        };

        let mut matches = Vec::new();
        tree.collect(&start, selector, &mut matches);
        Ok(matches)
    }

    async fn subscribe(&self, scope: &Scope) -> Result<ChangeStream> {
        let scope_node = match scope {
            Scope::Document => self.root(),
            Scope::Node(node) => {
                self.inner.tree.lock().node(node)?;
                node.clone()
            }
        };

        let receiver = self.inner.changes.subscribe();
        self.inner
            .subscriptions_opened
            .fetch_add(1, Ordering::Relaxed);

        // The stream ends once the document is dropped.
        let weak = Arc::downgrade(&self.inner);

        let changes = stream::unfold(
            (receiver, weak, scope_node),
            |(mut receiver, weak, scope_node)| async move {
                loop {
                    match receiver.recv().await {
                        Ok(notice) => {
                            let inner = weak.upgrade()?;
                            let in_scope = inner.tree.lock().is_within(&notice.node, &scope_node);
                            drop(inner);
                            if in_scope {
                                return Some((notice, (receiver, weak, scope_node)));
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            trace!(skipped, "Subscriber lagged");
                            let notice = ChangeNotice {
                                node: scope_node.clone(),
                                kind: ChangeKind::Overflow,
                            };
                            return Some((notice, (receiver, weak, scope_node)));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        );

        Ok(changes.boxed())
    }

    async fn trigger(&self, node: &NodeId) -> Result<()> {
        let handler = self.inner.tree.lock().node(node)?.on_click.clone();
        trace!(%node, has_handler = handler.is_some(), "Click");

        match handler {
            Some(handler) => handler(self),
            None => Ok(()),
        }
    }

    async fn text(&self, node: &NodeId) -> Result<String> {
        Ok(self.inner.tree.lock().node(node)?.text.clone())
    }

    async fn attribute(&self, node: &NodeId, name: &str) -> Result<Option<String>> {
        Ok(self
            .inner
            .tree
            .lock()
            .node(node)?
            .attributes
            .get(name)
            .cloned())
    }
}

// ============================================================================
// Tests
// ============================================================================
