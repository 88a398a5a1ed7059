use clap::Parser;
use dossier::{
    AppState, CollaboratorSet, Config, EvolutionEngine, ResearchRunner, ResearchSequencer,
    api::create_router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dossier-server", version, about = "Business intelligence research orchestration server")]
struct Cli {
    /// Bind address, overrides HOST from the environment
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides PORT from the environment
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = Arc::new(config);

    let store = config.database.create_store().await?;
    tracing::info!(provider = ?config.database, "Record store ready");

    let evolution = Arc::new(EvolutionEngine::new(store.clone()));
    let sequencer = Arc::new(ResearchSequencer::new(
        store.clone(),
        CollaboratorSet::builtin(config.research.request_timeout)?,
        evolution.clone(),
        config.research.platforms.clone(),
    ));
    let runner = ResearchRunner::new(sequencer, store.clone(), config.research.max_concurrent_jobs);

    let state = AppState {
        config: config.clone(),
        store,
        evolution,
        runner,
    };

    let router = create_router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", dossier::api::routes::ApiDoc::openapi()),
        )
    };

    let app = router.with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Dossier server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dossier=info,tower_http=info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
