/**
 * Chessroom Relay Entry Point
 *
 * Starts the room relay that classroom clients connect to.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use chessroom::backend::server::{create_app, RelayConfig};

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = RelayConfig::from_env();
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_app(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Relay] Listening on {}", addr);
    tracing::info!("[Relay] Clients connect to ws://127.0.0.1:{}/rooms/<room>/ws", addr.port());
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("chessroom-relay requires the `ssr` feature");
}
