use clap::Parser;
use commentscope_history::HistoryStore;
use commentscope_models::{create_model_folders, ModelRegistry, ModelsConfig};
use commentscope_server::cli::{Cli, Commands, ServeArgs};
use commentscope_server::telemetry::{init_metrics, init_tracing};
use commentscope_server::{run_server, AppState, ServerConfig};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,

        Commands::InitModels { models_dir } => {
            init_tracing(false);

            let config = ModelsConfig::rooted_at(&models_dir);
            let report = create_model_folders(&config)?;

            println!("Model folders ready under {}", models_dir.display());
            for dir in &report.created {
                println!("  created  {}", dir.display());
            }
            for dir in &report.existing {
                println!("  exists   {}", dir.display());
            }
            for dir in &report.populated {
                println!("  has model files  {}", dir.display());
            }
            println!();
            println!("Next steps:");
            println!("  1. Copy the emotion model files to {}", config.emotion_dir.display());
            println!("  2. Copy the sentiment model files to {}", config.sentiment_dir.display());
            println!(
                "  3. Copy the embedding model and {} to {}",
                commentscope_models::REGRESSOR_FILE_NAME,
                config.like_count_dir.display()
            );
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    init_tracing(args.verbose);

    info!("Starting CommentScope");

    let config = ServerConfig::load(&args.config, &args)?;
    info!("Configuration loaded successfully");
    info!("Emotion model path: {}", config.models.emotion_dir.display());
    info!("Sentiment model path: {}", config.models.sentiment_dir.display());
    info!("Like count model path: {}", config.models.like_count_dir.display());
    info!("XGBoost model path: {}", config.models.regressor_file.display());
    info!("History file: {}", config.history_file.display());

    let metrics_handle = init_metrics()?;

    let registry = ModelRegistry::load(config.models.clone());
    let history = HistoryStore::with_limit(&config.history_file, config.history_limit);
    let state = AppState::new(registry, history).with_metrics(metrics_handle);

    let addr = config.socket_addr()?;

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    run_server(state, addr, shutdown).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
