use anyhow::Result;
use axum::Router;
use clap::Parser;
use ragserver::build_app;
use ragserver::settings::Settings;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let settings = Settings::parse();
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;

    // index and guardrails are fully built before the listener binds
    let app: Router = build_app(settings)?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
