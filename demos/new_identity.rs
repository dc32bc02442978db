//! Demo: New identity (circuit rotation)
//!
//! Connects with settings from `TOR_CONTROL_*` environment variables,
//! requests a new identity, and disconnects.
//!
//! Run with: cargo run --example new_identity

use tor_control_session::{Result, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SessionConfig::from_env()?;
    println!("Connecting to {}...", config.resolved_address());

    let reply = Session::scoped(config, |session| async move {
        println!("Connected and authenticated ({})", session.state());
        session.get_new_identity().await
    })
    .await?;

    // NEWNYM is rate limited by the daemon; a second request within a few
    // seconds is accepted but deferred.
    println!("NEWNYM: {} {}", reply.code, reply.message);
    Ok(())
}
