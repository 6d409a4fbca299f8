use clap::Parser;
use log::{error, info};
use server::connection;
use server::hub::BroadcastHub;
use server::registry::ConnectionRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8765")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {}", address);

    let registry = Arc::new(ConnectionRegistry::new());
    let hub = Arc::new(BroadcastHub::new(Arc::clone(&registry)));

    tokio::select! {
        result = connection::serve(listener, registry, hub) => {
            if let Err(e) = result {
                error!("Accept loop failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
