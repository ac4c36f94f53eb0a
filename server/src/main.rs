use arcade_server::network::{Server, ServerConfig, ServerMessage};
use arcade_shared::DEFAULT_PORT;
use clap::Parser;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum concurrent sessions
    #[arg(short, long, default_value = "32")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    // Tick rate and reload delay are fixed; only the socket side is configurable
    let config = ServerConfig {
        addr: format!("{}:{}", args.host, args.port),
        max_clients: args.max_clients,
        ..ServerConfig::default()
    };

    info!("Starting server on {}", config.addr);
    let server = Server::new(config).await?;

    let shutdown = server.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = shutdown.send(ServerMessage::Shutdown);
        }
    });

    if let Err(e) = server.run().await {
        error!("Server stopped: {}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["arcade-server"]).unwrap();
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.max_clients, 32);
    }

    #[test]
    fn test_tick_rate_is_not_configurable() {
        assert!(Args::try_parse_from(["arcade-server", "--tick-rate", "60"]).is_err());
    }
}
