//! Entry point for one collection run.

// ============================================================================
// Imports
// ============================================================================

use tracing::{error, info};

use crate::config::CollectorConfig;
use crate::document::Document;
use crate::error::Result;
use crate::transport::CollectorClient;

use super::engine::TraversalEngine;
use super::report::SectionReport;

// ============================================================================
// Entry Point
// ============================================================================

/// Collects the section holding the current item.
///
/// Connects to the collector, locates the resume point, walks that one
/// section and closes the connection. The connection is closed on every
/// path; a fatal error is logged once before it is returned.
///
/// # Errors
///
/// - [`Error::Config`](crate::Error::Config) if `config` is invalid
/// - [`Error::ConnectionFailed`](crate::Error::ConnectionFailed) if the
///   collector is unreachable
/// - Any error [`TraversalEngine::collect_section`] propagates
pub async fn collect_current_section(
    document: &dyn Document,
    config: &CollectorConfig,
) -> Result<SectionReport> {
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e);
    }

    let client = CollectorClient::new(config);
    let result = run(document, &client, config).await;
    client.close().await;

    match &result {
        Ok(report) => info!(
            section = %report.section_title,
            sent = report.sent(),
            "Collection finished"
        ),
        Err(e) => error!(error = %e, "Fatal error"),
    }

    result
}

async fn run(
    document: &dyn Document,
    client: &CollectorClient,
    config: &CollectorConfig,
) -> Result<SectionReport> {
    client.connect().await?;

    let engine = TraversalEngine::new(document, client, config);
    let index = engine.resume_section().await?;
    engine.collect_section(index).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    use crate::error::Error;
    use crate::transport::CollectorServer;

    use super::super::fixture::{Course, test_timeouts};

    #[tokio::test]
    async fn test_collects_current_section() {
        let (server, mut units) = CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .unwrap()
            .spawn();
        let config = CollectorConfig::default()
            .with_endpoint(server.ws_url())
            .with_timeouts(test_timeouts());
        let course = Course::build(
            &[
                ("Section 1: Intro", vec![("1. Welcome", Some(vec!["Hello"]))]),
                (
                    "Section 2: Basics",
                    vec![("2. Setup", Some(vec!["Install"])), ("3. Run", Some(vec!["Go"]))],
                ),
            ],
            Some(1),
        )
        .await;

        let report = assert_ok!(collect_current_section(&course.doc, &config).await);

        assert_eq!(report.section_title, "Section 2: Basics");
        assert_eq!(report.sent(), 2);
        assert_eq!(units.recv().await.unwrap().item_title(), "2. Setup");
        assert_eq!(units.recv().await.unwrap().item_title(), "3. Run");
        assert!(units.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connection_failure_is_fatal() {
        let listener = TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = CollectorConfig::default()
            .with_endpoint(format!("ws://127.0.0.1:{port}"))
            .with_max_retries(2)
            .with_retry_base_delay(Duration::from_millis(10))
            .with_timeouts(test_timeouts());
        let course = Course::build(&[("Intro", vec![("A", Some(vec!["Hi"]))])], Some(0)).await;

        let err = assert_err!(collect_current_section(&course.doc, &config).await);

        assert!(matches!(err, Error::ConnectionFailed { attempts: 2, .. }));
        assert_eq!(course.doc.subscriptions_opened(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_connecting() {
        let config = CollectorConfig::default().with_endpoint("http://localhost:8765");
        let course = Course::build(&[("Intro", vec![])], None).await;

        let err = assert_err!(collect_current_section(&course.doc, &config).await);

        assert!(matches!(err, Error::Config { .. }));
    }
}
