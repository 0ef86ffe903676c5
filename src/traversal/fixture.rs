//! Simulated course page for traversal tests.
//!
//! Builds a [`MemoryDocument`] laid out like a course player: a curriculum of
//! collapsible sections with items, and a player area whose transcript toggle
//! and next-item control behave asynchronously.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;

use crate::config::{SelectorTable, Timeouts};
use crate::document::{Document, ElementSpec, MemoryDocument, Scope};
use crate::error::Result;
use crate::identifiers::NodeId;

/// Delay before the page reacts to a click.
const REACTION: Duration = Duration::from_millis(10);

/// One item: title and transcript lines (`None` for no transcript control).
pub(crate) type ItemSpec = (&'static str, Option<Vec<&'static str>>);

/// Timeouts small enough for tests, large enough for the page reactions.
pub(crate) fn test_timeouts() -> Timeouts {
    Timeouts {
        connect: Duration::from_secs(2),
        element_wait: Duration::from_millis(500),
        transcript_reveal: Duration::from_millis(150),
        navigation: Duration::from_millis(400),
        transcript_text: Duration::from_millis(800),
        response: Duration::from_secs(2),
    }
}

/// A rendered course.
pub(crate) struct Course {
    pub doc: MemoryDocument,
    pub sections: Vec<NodeId>,
    pub state: Arc<PlayerState>,
}

/// Mutable player state shared with click handlers.
pub(crate) struct PlayerState {
    selectors: SelectorTable,
    player: NodeId,
    items: Vec<NodeId>,
    transcripts: Vec<Option<Vec<String>>>,
    current: Mutex<Option<usize>>,
    /// When set, the next control moves the current marker without
    /// re-rendering itself.
    stale_next: Mutex<bool>,
    /// When set, transcript toggles accept clicks but render no lines.
    mute_transcripts: Mutex<bool>,
}

impl Course {
    /// Builds a course; `current` is the flat index of the current item.
    pub(crate) async fn build(sections: &[(&str, Vec<ItemSpec>)], current: Option<usize>) -> Self {
        let selectors = SelectorTable::default();
        let doc = MemoryDocument::new();
        let curriculum = doc
            .append(&doc.root(), ElementSpec::new().matching("div.curriculum"))
            .unwrap();

        let mut section_nodes = Vec::new();
        let mut items = Vec::new();
        let mut transcripts = Vec::new();

        for (index, (title, section_items)) in sections.iter().enumerate() {
            let mut spec = ElementSpec::new()
                .matching(&selectors.section)
                .child(
                    ElementSpec::new()
                        .matching(&selectors.section_title)
                        .text(format!("  {title} ")),
                )
                .child(expand_toggle(&selectors, index));

            for (item_title, lines) in section_items {
                let flat = transcripts.len();
                let marker = if current == Some(flat) { "true" } else { "false" };
                spec = spec.child(
                    ElementSpec::new()
                        .matching(&selectors.item)
                        .attribute(&selectors.current_attribute, marker)
                        .child(
                            ElementSpec::new()
                                .matching(&selectors.item_title)
                                .text(*item_title),
                        ),
                );
                transcripts.push(
                    lines
                        .as_ref()
                        .map(|lines| lines.iter().map(|l| l.to_string()).collect()),
                );
            }

            let section = doc.append(&curriculum, spec).unwrap();
            items.extend(
                doc.query(&selectors.item, &Scope::Node(section.clone()))
                    .await
                    .unwrap(),
            );
            section_nodes.push(section);
        }

        let player = doc
            .append(&doc.root(), ElementSpec::new().matching("div.player"))
            .unwrap();

        let state = Arc::new(PlayerState {
            selectors,
            player,
            items,
            transcripts,
            current: Mutex::new(current),
            stale_next: Mutex::new(false),
            mute_transcripts: Mutex::new(false),
        });
        render_player(&doc, &state).unwrap();

        Self {
            doc,
            sections: section_nodes,
            state,
        }
    }

    /// Makes the next control stop re-rendering itself.
    pub(crate) fn freeze_next_control(&self) {
        *self.state.stale_next.lock() = true;
    }

    /// Makes transcript toggles stop rendering their lines.
    pub(crate) fn mute_transcripts(&self) {
        *self.state.mute_transcripts.lock() = true;
    }

    /// Removes the next control from the page.
    pub(crate) async fn remove_next_control(&self) {
        let nodes = self
            .doc
            .query(&self.state.selectors.next_item, &Scope::Document)
            .await
            .unwrap();
        for node in nodes {
            self.doc.remove(&node).unwrap();
        }
    }

    /// Returns the flat index of the current item.
    pub(crate) fn current(&self) -> Option<usize> {
        *self.state.current.lock()
    }
}

/// Section expand control that flips `aria-expanded` after a delay.
fn expand_toggle(selectors: &SelectorTable, index: usize) -> ElementSpec {
    let toggle_selector = format!("button.toggle-{index}");
    let attribute = selectors.expanded_attribute.clone();

    ElementSpec::new()
        .matching(&selectors.expand_toggle)
        .matching(&toggle_selector)
        .attribute(&selectors.expanded_attribute, "false")
        .on_click(move |doc| {
            let doc = doc.clone();
            let toggle_selector = toggle_selector.clone();
            let attribute = attribute.clone();
            tokio::spawn(async move {
                sleep(REACTION).await;
                let toggles = doc
                    .query(&toggle_selector, &Scope::Document)
                    .await
                    .unwrap_or_default();
                for toggle in toggles {
                    let _ = doc.set_attribute(&toggle, &attribute, "true");
                }
            });
            Ok(())
        })
}

/// Replaces the player contents for the current item.
fn render_player(doc: &MemoryDocument, state: &Arc<PlayerState>) -> Result<()> {
    doc.clear_children(&state.player)?;

    let current = *state.current.lock();

    if let Some(Some(lines)) = current.and_then(|c| state.transcripts.get(c)) {
        let lines = lines.clone();
        let handle = Arc::clone(state);
        doc.append(
            &state.player,
            ElementSpec::new()
                .matching(&state.selectors.transcript_toggle)
                .on_click(move |doc| {
                    let doc = doc.clone();
                    let lines = lines.clone();
                    let state = Arc::clone(&handle);
                    tokio::spawn(async move {
                        sleep(REACTION).await;
                        if *state.mute_transcripts.lock() {
                            return;
                        }
                        let player = &state.player;
                        let text_selector = &state.selectors.transcript_text;
                        for line in lines {
                            let _ = doc.append(
                                player,
                                ElementSpec::new().matching(text_selector).text(line),
                            );
                        }
                    });
                    Ok(())
                }),
        )?;
    }

    let handle = Arc::clone(state);
    doc.append(
        &state.player,
        ElementSpec::new()
            .matching(&state.selectors.next_item)
            .on_click(move |doc| {
                let doc = doc.clone();
                let state = Arc::clone(&handle);
                tokio::spawn(async move {
                    sleep(REACTION).await;
                    let _ = advance(&doc, &state);
                });
                Ok(())
            }),
    )?;

    Ok(())
}

/// Moves the current marker to the next item and re-renders the player.
fn advance(doc: &MemoryDocument, state: &Arc<PlayerState>) -> Result<()> {
    let next = {
        let mut current = state.current.lock();
        let next = current.map_or(0, |c| c + 1);
        if next >= state.items.len() {
            return Ok(());
        }
        let previous = current.replace(next);
        if let Some(previous) = previous {
            doc.set_attribute(
                &state.items[previous],
                &state.selectors.current_attribute,
                "false",
            )?;
        }
        next
    };

    doc.set_attribute(&state.items[next], &state.selectors.current_attribute, "true")?;

    if *state.stale_next.lock() {
        return Ok(());
    }
    render_player(doc, state)
}
