use clap::Parser;
use client::config::{ClientConfig, CONFIG_PATH};
use client::input::WanderInput;
use client::render::LogFrameSink;
use client::session;
use log::{error, info};
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to (overrides the persisted config)
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Delay between reconnection attempts, in seconds
    #[arg(long, default_value = "2")]
    retry_delay: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let file_config = ClientConfig::load(Path::new(CONFIG_PATH))?;
    let config = ClientConfig::resolve(file_config, args.server);
    info!("Starting client, server address {}", config.server_address);

    // Any transport-level failure ends the session; the whole thing is
    // re-established from scratch here.
    loop {
        let result = session::run(
            &config.server_address,
            Box::new(WanderInput::new()),
            Box::new(LogFrameSink::new(60)),
        )
        .await;

        match result {
            Ok(()) => {
                info!("Session closed by server, reconnecting in {}s", args.retry_delay);
            }
            Err(e) => {
                error!("Connection failed: {}. Retrying in {}s", e, args.retry_delay);
            }
        }

        tokio::time::sleep(Duration::from_secs(args.retry_delay)).await;
    }
}
