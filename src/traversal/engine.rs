//! Resumable walk over one section's items.
//!
//! Every read goes to the live document; nothing is cached between steps
//! because the page re-renders underneath us.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::config::{CollectorConfig, SelectorTable, Timeouts};
use crate::document::{Document, Scope};
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::protocol::{Request, TranscriptUnit};
use crate::transport::CollectorClient;
use crate::waiter::{AttributeEquals, ConditionWaiter, FirstChanged, NthAttributeEquals, WaitOptions};

use super::report::{ItemOutcome, SectionInfo, SectionReport};

// ============================================================================
// Constants
// ============================================================================

/// Section title used when the title element is missing or blank.
pub const UNKNOWN_SECTION: &str = "Unknown Section";

/// Item title used when the title element is missing or blank.
pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Attribute value marking a flag as set.
const TRUE: &str = "true";

/// Attribute value marking a flag as cleared.
const FALSE: &str = "false";

// ============================================================================
// TraversalEngine
// ============================================================================

/// Walks a section item by item, extracting and sending transcripts.
///
/// Issues one operation at a time: each unit is acknowledged before the
/// next item is touched.
///
/// # Example
///
/// ```ignore
/// let engine = TraversalEngine::new(&document, &client, &config);
/// let index = engine.resume_section().await?;
/// let report = engine.collect_section(index).await?;
/// println!("{} sent, {} skipped", report.sent(), report.skipped());
/// ```
pub struct TraversalEngine<'a> {
    document: &'a dyn Document,
    client: &'a CollectorClient,
    selectors: &'a SelectorTable,
    timeouts: &'a Timeouts,
}

impl<'a> TraversalEngine<'a> {
    /// Creates an engine over `document` sending through `client`.
    #[inline]
    #[must_use]
    pub fn new(
        document: &'a dyn Document,
        client: &'a CollectorClient,
        config: &'a CollectorConfig,
    ) -> Self {
        Self {
            document,
            client,
            selectors: &config.selectors,
            timeouts: &config.timeouts,
        }
    }

    #[inline]
    fn waiter(&self) -> ConditionWaiter<'a> {
        ConditionWaiter::new(self.document)
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Lists every section with its display title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if the document rejects a read.
    pub async fn sections(&self) -> Result<Vec<SectionInfo>> {
        let sections = self
            .document
            .query(&self.selectors.section, &Scope::Document)
            .await?;

        let mut infos = Vec::with_capacity(sections.len());
        for (index, section) in sections.iter().enumerate() {
            infos.push(SectionInfo {
                index,
                title: self.section_title(section).await?,
            });
        }
        Ok(infos)
    }

    /// Returns the index of the section holding the current item, or 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Document`] if the document rejects a read.
    pub async fn resume_section(&self) -> Result<usize> {
        let sections = self
            .document
            .query(&self.selectors.section, &Scope::Document)
            .await?;

        for (index, section) in sections.iter().enumerate() {
            let items = self.items(section).await?;
            if self.current_position(&items).await?.is_some() {
                debug!(index, "Resuming at section with current item");
                return Ok(index);
            }
        }

        debug!("No current item; starting at first section");
        Ok(0)
    }

    /// Expands `section` unless it already reports itself expanded.
    ///
    /// # Errors
    ///
    /// - [`Error::TriggerFailed`] if the expand control could not be clicked
    /// - [`Error::Timeout`] if the control never reported expanded
    pub async fn expand_section(&self, section: &NodeId) -> Result<()> {
        let scope = Scope::Node(section.clone());
        let Some(toggle) = self
            .document
            .query_first(&self.selectors.expand_toggle, &scope)
            .await?
        else {
            return Ok(());
        };

        let expanded = self
            .document
            .attribute(&toggle, &self.selectors.expanded_attribute)
            .await?;
        if expanded.as_deref() != Some(FALSE) {
            return Ok(());
        }

        debug!(%section, "Expanding section");

        let condition = AttributeEquals {
            node: toggle.clone(),
            name: self.selectors.expanded_attribute.clone(),
            value: TRUE.to_string(),
        };
        self.waiter()
            .wait(
                &self.selectors.expand_toggle,
                WaitOptions::new(self.timeouts.element_wait)
                    .with_trigger(toggle)
                    .with_condition(&condition)
                    .within(scope),
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Collects every item of section `index` from the resume point on.
    ///
    /// Starts at the current item if it belongs to this section, otherwise
    /// at the first item. Per-item problems are recorded in the report and
    /// never stop the walk; navigation problems do.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSection`] if `index` is out of range
    /// - [`Error::NavigationUnavailable`] / [`Error::NavigationTimeout`] if
    ///   advancing failed and the next item did not become current
    /// - [`Error::Timeout`] if the section could not be expanded
    pub async fn collect_section(&self, index: usize) -> Result<SectionReport> {
        let sections = self
            .document
            .query(&self.selectors.section, &Scope::Document)
            .await?;
        let section = sections
            .get(index)
            .cloned()
            .ok_or_else(|| Error::invalid_section(index, sections.len()))?;

        self.expand_section(&section).await?;

        let section_title = self.section_title(&section).await?;
        let items = self.items(&section).await?;
        let start = self.current_position(&items).await?.unwrap_or(0);

        info!(
            section = %section_title,
            index,
            items = items.len(),
            start,
            "Processing section"
        );

        let mut report = SectionReport::new(&section_title);
        let mut position = start;

        loop {
            let items = self.items(&section).await?;
            let Some(item) = items.get(position) else {
                break;
            };

            let title = self.item_title(item).await;
            let outcome = self
                .process_item(&section, &section_title, position, &title)
                .await;
            report.push(title, outcome);

            if position + 1 >= items.len() {
                break;
            }

            if let Err(e) = self.advance().await {
                if self.next_is_current(&section, position + 1).await {
                    warn!(error = %e, "Navigation reported failure but next item is current");
                } else {
                    warn!(section = %section_title, error = %e, "Navigation failed");
                    return Err(e);
                }
            }

            self.expand_section(&section).await?;
            position += 1;
        }

        info!(
            section = %section_title,
            sent = report.sent(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Section completed"
        );

        Ok(report)
    }

    /// Extracts and sends one item; never fails.
    async fn process_item(
        &self,
        section: &NodeId,
        section_title: &str,
        position: usize,
        title: &str,
    ) -> ItemOutcome {
        let outcome = match self.extract_and_send(section_title, title).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(item = %title, error = %e, "Error processing item");
                return ItemOutcome::Failed(e.to_string());
            }
        };

        if matches!(outcome, ItemOutcome::Sent | ItemOutcome::Rejected(_)) {
            self.confirm_current(section, position, title).await;
        }

        outcome
    }

    async fn extract_and_send(&self, section_title: &str, title: &str) -> Result<ItemOutcome> {
        let toggles = match self
            .waiter()
            .wait(
                &self.selectors.transcript_toggle,
                WaitOptions::new(self.timeouts.transcript_reveal),
            )
            .await
        {
            Ok(toggles) => toggles,
            Err(e) if e.is_timeout() => {
                warn!(item = %title, "No transcript found, skipping");
                return Ok(ItemOutcome::NoTranscript);
            }
            Err(e) => return Err(e),
        };

        let Some(toggle) = toggles.into_iter().next() else {
            return Ok(ItemOutcome::NoTranscript);
        };

        debug!(item = %title, "Found transcript control");

        let cues = self
            .waiter()
            .wait(
                &self.selectors.transcript_text,
                WaitOptions::new(self.timeouts.transcript_text).with_trigger(toggle),
            )
            .await?;

        let mut lines = Vec::with_capacity(cues.len());
        for cue in &cues {
            let text = self.document.text(cue).await?;
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }

        if lines.is_empty() {
            warn!(item = %title, "Transcript is empty, skipping");
            return Ok(ItemOutcome::EmptyTranscript);
        }

        let line_count = lines.len();
        let request = Request::SaveTranscript(TranscriptUnit::new(section_title, title, lines));
        let reply = self
            .client
            .send_with_response(&request, self.timeouts.response)
            .await?;

        if reply.is_error() {
            let reason = reply
                .message
                .unwrap_or_else(|| "collector reported an error".to_string());
            warn!(item = %title, reason = %reason, "Collector rejected transcript");
            return Ok(ItemOutcome::Rejected(reason));
        }

        info!(item = %title, lines = line_count, "Sent transcript");
        Ok(ItemOutcome::Sent)
    }

    /// Best-effort wait for the item at `position` to be marked current.
    async fn confirm_current(&self, section: &NodeId, position: usize, title: &str) {
        let condition = NthAttributeEquals {
            index: position,
            name: self.selectors.current_attribute.clone(),
            value: TRUE.to_string(),
        };

        if let Err(e) = self
            .waiter()
            .wait(
                &self.selectors.item,
                WaitOptions::new(self.timeouts.element_wait)
                    .with_condition(&condition)
                    .within(Scope::Node(section.clone())),
            )
            .await
        {
            debug!(item = %title, error = %e, "Current item not confirmed");
        }
    }

    /// Clicks the next-item control and waits for it to be replaced.
    ///
    /// # Errors
    ///
    /// - [`Error::NavigationUnavailable`] if there is no next-item control
    /// - [`Error::NavigationTimeout`] if the control was not replaced in time
    pub async fn advance(&self) -> Result<()> {
        let Some(next) = self
            .document
            .query_first(&self.selectors.next_item, &Scope::Document)
            .await?
        else {
            return Err(Error::navigation_unavailable(&self.selectors.next_item));
        };

        let condition = FirstChanged {
            previous: next.clone(),
        };
        let result = self
            .waiter()
            .wait(
                &self.selectors.next_item,
                WaitOptions::new(self.timeouts.navigation)
                    .with_trigger(next)
                    .with_condition(&condition),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_timeout() => Err(Error::navigation_timeout(
                self.timeouts.navigation.as_millis() as u64,
            )),
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    async fn items(&self, section: &NodeId) -> Result<Vec<NodeId>> {
        self.document
            .query(&self.selectors.item, &Scope::Node(section.clone()))
            .await
    }

    async fn is_current(&self, item: &NodeId) -> Result<bool> {
        let value = self
            .document
            .attribute(item, &self.selectors.current_attribute)
            .await?;
        Ok(value.as_deref() == Some(TRUE))
    }

    async fn current_position(&self, items: &[NodeId]) -> Result<Option<usize>> {
        for (position, item) in items.iter().enumerate() {
            if self.is_current(item).await? {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    async fn next_is_current(&self, section: &NodeId, position: usize) -> bool {
        let Ok(items) = self.items(section).await else {
            return false;
        };
        match items.get(position) {
            Some(item) => self.is_current(item).await.unwrap_or(false),
            None => false,
        }
    }

    async fn section_title(&self, section: &NodeId) -> Result<String> {
        let title = self
            .document
            .query_first(&self.selectors.section_title, &Scope::Node(section.clone()))
            .await?;

        let text = match title {
            Some(node) => self.document.text(&node).await?,
            None => String::new(),
        };
        Ok(non_blank_or(text, UNKNOWN_SECTION))
    }

    async fn item_title(&self, item: &NodeId) -> String {
        let text = match self
            .document
            .query_first(&self.selectors.item_title, &Scope::Node(item.clone()))
            .await
        {
            Ok(Some(node)) => self.document.text(&node).await.unwrap_or_default(),
            _ => String::new(),
        };
        non_blank_or(text, UNKNOWN_ITEM)
    }
}

fn non_blank_or(text: String, fallback: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    use crate::document::ElementSpec;
    use crate::protocol::MESSAGE_ID_KEY;
    use crate::transport::{CollectorServer, ServerHandle};

    use super::super::fixture::{Course, ItemSpec, test_timeouts};

    struct Harness {
        course: Course,
        config: CollectorConfig,
        client: CollectorClient,
        _server: ServerHandle,
        units: mpsc::UnboundedReceiver<TranscriptUnit>,
    }

    impl Harness {
        async fn new(sections: &[(&str, Vec<ItemSpec>)], current: Option<usize>) -> Self {
            let (server, units) = CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
                .await
                .unwrap()
                .spawn();
            let config = CollectorConfig::default()
                .with_endpoint(server.ws_url())
                .with_timeouts(test_timeouts());
            let client = CollectorClient::new(&config);
            client.connect().await.unwrap();

            Self {
                course: Course::build(sections, current).await,
                config,
                client,
                _server: server,
                units,
            }
        }

        fn engine(&self) -> TraversalEngine<'_> {
            TraversalEngine::new(&self.course.doc, &self.client, &self.config)
        }

        fn drain_titles(&mut self) -> Vec<String> {
            let mut titles = Vec::new();
            while let Ok(unit) = self.units.try_recv() {
                titles.push(unit.item_title().to_string());
            }
            titles
        }
    }

    fn five_items() -> Vec<ItemSpec> {
        vec![
            ("1. One", Some(vec!["a"])),
            ("2. Two", Some(vec!["b"])),
            ("3. Three", Some(vec!["c"])),
            ("4. Four", Some(vec!["d"])),
            ("5. Five", Some(vec!["e"])),
        ]
    }

    #[tokio::test]
    async fn test_sections_lists_titles() {
        let harness = Harness::new(
            &[("Section 1: Intro", vec![]), ("Section 2: Basics", vec![])],
            None,
        )
        .await;
        harness
            .course
            .doc
            .append(
                &harness.course.doc.root(),
                ElementSpec::new().matching(&harness.config.selectors.section),
            )
            .unwrap();

        let sections = harness.engine().sections().await.unwrap();

        assert_eq!(
            sections,
            vec![
                SectionInfo { index: 0, title: "Section 1: Intro".into() },
                SectionInfo { index: 1, title: "Section 2: Basics".into() },
                SectionInfo { index: 2, title: UNKNOWN_SECTION.into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_resume_section_finds_current() {
        let harness = Harness::new(
            &[("A", five_items()), ("B", five_items())],
            Some(7),
        )
        .await;
        assert_eq!(harness.engine().resume_section().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resume_section_defaults_to_first() {
        let harness = Harness::new(&[("A", five_items()), ("B", five_items())], None).await;
        assert_eq!(harness.engine().resume_section().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expand_section_is_noop_when_expanded() {
        let harness = Harness::new(&[("A", five_items())], Some(0)).await;
        let engine = harness.engine();
        let section = &harness.course.sections[0];

        engine.expand_section(section).await.unwrap();
        let toggle = harness
            .course
            .doc
            .query_first(&harness.config.selectors.expand_toggle, &Scope::Node(section.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            harness.course.doc.attribute(&toggle, "aria-expanded").await.unwrap().as_deref(),
            Some("true")
        );

        let opened = harness.course.doc.subscriptions_opened();
        engine.expand_section(section).await.unwrap();
        assert_eq!(harness.course.doc.subscriptions_opened(), opened);
    }

    #[tokio::test]
    async fn test_resume_mid_section() {
        let mut harness = Harness::new(&[("Section 1: Intro", five_items())], Some(2)).await;

        let report = harness.engine().collect_section(0).await.unwrap();

        assert_eq!(report.section_title, "Section 1: Intro");
        assert_eq!(
            report.titles().collect::<Vec<_>>(),
            ["3. Three", "4. Four", "5. Five"]
        );
        assert_eq!(report.sent(), 3);
        assert_eq!(
            harness.drain_titles(),
            ["3. Three", "4. Four", "5. Five"]
        );
        assert_eq!(harness.course.current(), Some(4));
    }

    #[tokio::test]
    async fn test_intro_section_sends_in_order() {
        let mut harness = Harness::new(
            &[(
                "Intro",
                vec![
                    ("A", Some(vec!["Hi", "Bye"])),
                    ("B", None),
                    ("C", Some(vec!["Ok"])),
                ],
            )],
            Some(0),
        )
        .await;

        let report = harness.engine().collect_section(0).await.unwrap();

        assert_eq!(report.items[0].outcome, ItemOutcome::Sent);
        assert_eq!(report.items[1].outcome, ItemOutcome::NoTranscript);
        assert_eq!(report.items[2].outcome, ItemOutcome::Sent);

        let first = harness.units.try_recv().unwrap();
        let second = harness.units.try_recv().unwrap();
        assert!(harness.units.try_recv().is_err());
        assert_eq!(first.section_title(), "Intro");
        assert_eq!(first.item_title(), "A");
        assert_eq!(first.lines(), ["Hi".to_string(), "Bye".to_string()]);
        assert_eq!(second.item_title(), "C");
        assert_eq!(second.lines(), ["Ok".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_skipped() {
        let mut harness = Harness::new(
            &[(
                "Intro",
                vec![("A", Some(vec!["  ", ""])), ("B", Some(vec![" Ok "]))],
            )],
            Some(0),
        )
        .await;

        let report = harness.engine().collect_section(0).await.unwrap();

        assert_eq!(report.items[0].outcome, ItemOutcome::EmptyTranscript);
        assert_eq!(report.items[1].outcome, ItemOutcome::Sent);
        let unit = harness.units.try_recv().unwrap();
        assert_eq!(unit.item_title(), "B");
        assert_eq!(unit.lines(), ["Ok".to_string()]);
    }

    #[tokio::test]
    async fn test_starts_at_first_item_without_current() {
        let mut harness = Harness::new(
            &[("First", vec![("A", None), ("B", None)]), ("Next", five_items())],
            None,
        )
        .await;

        let report = harness.engine().collect_section(0).await.unwrap();

        assert_eq!(report.titles().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(report.skipped(), 2);
        assert!(harness.drain_titles().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_section() {
        let harness = Harness::new(&[("Intro", five_items())], Some(0)).await;

        let err = harness.engine().collect_section(3).await.unwrap_err();

        assert!(matches!(err, Error::InvalidSection { index: 3, count: 1 }));
    }

    #[tokio::test]
    async fn test_missing_next_control_stops_section() {
        let mut harness = Harness::new(&[("Intro", five_items())], Some(0)).await;
        harness.course.remove_next_control().await;

        let err = harness.engine().collect_section(0).await.unwrap_err();

        assert!(matches!(err, Error::NavigationUnavailable { .. }));
        assert_eq!(harness.drain_titles(), ["1. One"]);
    }

    #[tokio::test]
    async fn test_navigation_timeout_tolerated_when_next_is_current() {
        let mut harness = Harness::new(
            &[("Intro", vec![("A", None), ("B", None)])],
            Some(0),
        )
        .await;
        harness.course.freeze_next_control();

        let report = harness.engine().collect_section(0).await.unwrap();

        assert_eq!(report.titles().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(harness.course.current(), Some(1));
        assert!(harness.drain_titles().is_empty());
    }

    #[tokio::test]
    async fn test_advance_times_out_when_control_never_changes() {
        let harness = Harness::new(&[("Intro", vec![("A", None), ("B", None)])], Some(1)).await;

        let err = harness.engine().advance().await.unwrap_err();

        assert!(matches!(err, Error::NavigationTimeout { timeout_ms: 400 }));
        assert!(err.is_navigation_error());
    }

    #[tokio::test]
    async fn test_rejected_unit_is_recorded() {
        let listener = TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: serde_json::Value = serde_json::from_str(&text).unwrap();
                let reply = serde_json::json!({
                    "status": "error",
                    "message": "disk full",
                    "messageId": request[MESSAGE_ID_KEY],
                });
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            }
        });

        let config = CollectorConfig::default()
            .with_endpoint(format!("ws://127.0.0.1:{port}"))
            .with_timeouts(test_timeouts());
        let client = CollectorClient::new(&config);
        client.connect().await.unwrap();
        let course = Course::build(&[("Intro", vec![("A", Some(vec!["Hi"]))])], Some(0)).await;

        let report = TraversalEngine::new(&course.doc, &client, &config)
            .collect_section(0)
            .await
            .unwrap();

        assert_eq!(report.items[0].outcome, ItemOutcome::Rejected("disk full".into()));
        assert_eq!(report.failed(), 1);
        client.close().await;
    }

    #[tokio::test]
    async fn test_response_timeout_does_not_abort_section() {
        let listener = TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        let (seen_tx, mut seen) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut first = true;
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: serde_json::Value = serde_json::from_str(&text).unwrap();
                let title = request["title"].as_str().unwrap_or_default().to_string();
                let _ = seen_tx.send(title);
                if std::mem::take(&mut first) {
                    continue;
                }
                let reply = serde_json::json!({
                    "status": "success",
                    "messageId": request[MESSAGE_ID_KEY],
                });
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            }
        });

        let timeouts = Timeouts {
            response: std::time::Duration::from_millis(200),
            ..test_timeouts()
        };
        let config = CollectorConfig::default()
            .with_endpoint(format!("ws://127.0.0.1:{port}"))
            .with_timeouts(timeouts);
        let client = CollectorClient::new(&config);
        client.connect().await.unwrap();
        let course = Course::build(
            &[("Intro", vec![("A", Some(vec!["one"])), ("B", Some(vec!["two"]))])],
            Some(0),
        )
        .await;

        let report = TraversalEngine::new(&course.doc, &client, &config)
            .collect_section(0)
            .await
            .unwrap();

        assert!(matches!(&report.items[0].outcome, ItemOutcome::Failed(_)));
        assert_eq!(report.items[1].outcome, ItemOutcome::Sent);
        assert_eq!(seen.recv().await.unwrap(), "A");
        assert_eq!(seen.recv().await.unwrap(), "B");
        assert_eq!(client.pending_count(), 0);
        client.close().await;
    }

    #[tokio::test]
    async fn test_transcript_that_never_renders_does_not_abort_section() {
        let mut harness = Harness::new(
            &[("Intro", vec![("A", Some(vec!["x"])), ("B", None)])],
            Some(0),
        )
        .await;
        harness.course.mute_transcripts();

        let report = harness.engine().collect_section(0).await.unwrap();

        assert!(matches!(&report.items[0].outcome, ItemOutcome::Failed(_)));
        assert_eq!(report.items[1].outcome, ItemOutcome::NoTranscript);
        assert_eq!(harness.course.current(), Some(1));
        assert!(harness.drain_titles().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_abort_section() {
        let mut harness = Harness::new(
            &[("Intro", vec![("A", Some(vec!["x"])), ("B", None)])],
            Some(0),
        )
        .await;
        harness.client.close().await;

        let report = harness.engine().collect_section(0).await.unwrap();

        assert!(matches!(report.items[0].outcome, ItemOutcome::Failed(_)));
        assert_eq!(report.items[1].outcome, ItemOutcome::NoTranscript);
        assert!(harness.drain_titles().is_empty());
    }
}
