//! Demo: Basic connection and queries
//!
//! Run with: cargo run --example basic -- [host:port | unix:/path] [password]

use tor_control_session::{ControlAddress, Result, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = SessionConfig::from_env()?;
    if let Some(address) = args.next() {
        config = config.address(ControlAddress::parse(&address)?);
    }
    if let Some(password) = args.next() {
        config = config.password(password);
    }

    let session = Session::new(config);
    let mut state = session.subscribe();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            println!("[session is now {}]", *state.borrow());
        }
    });

    session.connect().await?;

    for line in session.send_command(["GETINFO", "version"]).await? {
        println!("{} {}", line.code, line.message);
    }

    match session.get_config("SocksPort").await {
        Ok(port) => println!("SocksPort: {}", port),
        Err(e) => println!("SocksPort unavailable: {}", e),
    }

    if let Ok(read) = session.get_info("traffic/read").await {
        println!("Traffic read: {}", read.message);
    }

    session.disconnect().await;
    println!("Disconnected.");
    Ok(())
}
