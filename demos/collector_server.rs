//! Reference collector.
//!
//! Listens for `save_transcript` requests and prints every received unit
//! with its parsed section and item headings.
//!
//! Usage:
//!   cargo run --example collector_server
//!   cargo run --example collector_server -- --port=9000
//!   cargo run --example collector_server -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};

use common::Args;
use transcript_collector::{CollectorServer, Result};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let server = CollectorServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port).await?;
    println!("Collector listening on {}", server.ws_url());
    println!("Press Ctrl+C to stop");

    let (handle, mut units) = server.spawn();

    loop {
        tokio::select! {
            unit = units.recv() => {
                let Some(unit) = unit else { break };
                let section = unit.section_heading();
                let item = unit.item_heading();

                println!(
                    "\n[section {}] {} / [item {}] {}",
                    section.number.map_or_else(|| "-".to_string(), |n| n.to_string()),
                    section.name,
                    item.number.map_or_else(|| "-".to_string(), |n| n.to_string()),
                    item.name,
                );
                for line in unit.lines() {
                    println!("  {line}");
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down");
                break;
            }
        }
    }

    handle.shutdown();
    Ok(())
}
