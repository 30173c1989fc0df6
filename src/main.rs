use chess_engine::api::router::create_router;
use chess_engine::api::state::AppState;
use chess_engine::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --health-check queries a running server and exits (container HEALTHCHECK).
    if std::env::args().any(|a| a == "--health-check") {
        match health_check().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("Health check failed: {e}");
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_engine=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr();
    tracing::info!(
        default_difficulty = %config.default_difficulty,
        ai_timeout_ms = config.ai_timeout_ms,
        hint_depth = config.hint_depth,
        "configuration loaded"
    );

    let state = AppState::new(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| {
            tracing::error!(%bind_addr, error = %e, "failed to bind");
            e
        })?;

    tracing::info!(
        "chess-engine v{} listening on {bind_addr}",
        env!("CARGO_PKG_VERSION")
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Send a raw HTTP/1.1 request to /health and expect 200 OK.
async fn health_check() -> Result<(), Box<dyn std::error::Error>> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let port = std::env::var("PORT").unwrap_or_else(|_| "8082".to_string());
    let mut stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{port}")).await?;
    let request =
        format!("GET /health HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf[..n]);
    match response.lines().next() {
        Some(line) if line.starts_with("HTTP/1.1 200") => Ok(()),
        other => Err(format!("Unexpected response: {}", other.unwrap_or("")).into()),
    }
}
