use bifrost::{
    config::{CliArgs, DnsConfig},
    resolver::Resolver,
    server::UdpServer,
};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config = DnsConfig::from_env()?.with_args(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let resolver = Resolver::from_config(&config);
    match &resolver {
        Resolver::Forward(forwarder) => {
            info!("Forwarding questions to {}", forwarder.upstream())
        }
        Resolver::Static(answers) => info!(
            "Answering A questions with {} (ttl {})",
            answers.address, answers.ttl
        ),
    }

    let server = UdpServer::bind(config.bind_addr, resolver).await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await
            }
        }
    });

    server.run(shutdown_rx).await?;
    Ok(())
}
