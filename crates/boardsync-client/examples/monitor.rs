//! Minimal console monitor: connects to a local engine and prints the
//! delta stream. A stand-in for a real renderer.
//!
//! Run with:
//! ```sh
//! RUST_LOG=boardsync_client=debug cargo run --example monitor
//! ```

use boardsync_client::{ClientConfig, Session};
use boardsync_core::Severity;
use boardsync_protocol::HardwareDelta;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> boardsync_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let session = Session::connect(ClientConfig::for_host("localhost")?);
    let mut connectivity = session.connectivity();
    let mut deltas = session.subscribe_deltas();

    loop {
        tokio::select! {
            Ok(()) = connectivity.changed() => {
                println!("[connection: {}]", *connectivity.borrow());
            }
            delta = deltas.recv() => match delta {
                Ok(HardwareDelta::ConsoleLine { text, severity }) => match severity {
                    Severity::Info => println!("{text}"),
                    Severity::Warning => println!("[warn] {text}"),
                    Severity::Error => println!("[error] {text}"),
                },
                Ok(delta) => println!("[delta] {delta:?}"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    println!("[lagged, {n} deltas coalesced]");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    session.close().await;
    Ok(())
}
