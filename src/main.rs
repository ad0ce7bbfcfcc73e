use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use meshcall::accounts::InMemoryAccountStore;
use meshcall::app_state::AppState;
use meshcall::config::{generate_config_template, Cli, Config};
use meshcall::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let config = Config::load(&cli)?;
    init_tracing(config.json_logs);

    let state = AppState::new(InMemoryAccountStore::new());
    let app = routes::build_router(state, &config.static_dir);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        static_dir = %config.static_dir.display(),
        "listening on http://{}",
        addr
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meshcall=info,tower_http=info"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
