use financial_doc_qa::{api::start_server, AppConfig, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    info!("🚀 Financial Document Q&A - API Server");
    info!("📍 Port: {}", config.port);
    info!("🤖 Model: {} at {}", config.model_name, config.ollama_base_url);

    let session = Session::from_config(&config)?;

    if session.dispatcher().is_model_available().await {
        info!("✅ Model server reachable");
    } else {
        info!("⚠️  Model server unreachable, answering with pattern matching");
    }

    info!("📡 Starting API server...");
    start_server(session, config.port).await?;

    Ok(())
}
