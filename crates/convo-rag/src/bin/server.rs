//! Chat server binary
//!
//! Run with: cargo run -p convo-rag --bin convo-rag-server -- --config convo-rag.toml

use clap::Parser;

use convo_rag::{cli::ServerArgs, config::RagConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convo_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       Convo RAG                           ║
║         Conversational Q&A over an indexed document       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let mut config = RagConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Top K: {}", config.retrieval.top_k);
    tracing::info!(
        "  - Retries: {} (timeout {}s)",
        config.resilience.max_retries,
        config.resilience.request_timeout_secs
    );

    let server = ChatServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Info: http://{}/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /ask          - Ask a question");
    println!("  GET    /sessions/:id - Session history");
    println!("  DELETE /sessions/:id - Forget a session");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
