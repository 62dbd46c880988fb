use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accessdesk::notification::provisioner::PipelineTrigger;
use accessdesk::store::postgres::PgStore;
use accessdesk::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "accessdesk=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        None => run_server(cfg, None).await,
    }
}

async fn run_server(cfg: config::Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let db = PgStore::connect(&cfg.database_url)
        .await
        .context("failed to connect to Postgres")?;
    db.migrate().await.context("failed to run migrations")?;

    let provisioner = PipelineTrigger::new(cfg.provisioning_url.clone())
        .context("invalid DATA_PROVISIONING_URL")?;

    let port = port_override.unwrap_or(cfg.port);
    let dev = cfg.is_dev();
    let state = Arc::new(AppState {
        store: Arc::new(db),
        provisioner,
        config: cfg,
    });

    let mut app = axum::Router::new()
        .nest("/api", api::api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // CORS only when running locally on two ports; in hosting the UI and
    // API share an origin.
    if dev {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("AccessDesk listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
