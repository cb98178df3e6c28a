use order_server::{Server, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env, logging) and configuration
    let config = setup_environment();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.http_port,
        "Order server starting..."
    );

    // 2. Serve until Ctrl-C
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
