use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

mod commitish;
mod config;
mod dates;
mod errors;
mod git;
mod pager;
mod routes;
mod templates;
#[cfg(test)]
mod testing;

#[derive(clap::Parser)]
#[clap(about = "Browse git history over HTTP")]
struct Cli {
    /// Configuration file
    #[clap(long, default_value = "gitshelf.toml")]
    config: PathBuf,
    /// Listen address, overriding `server.address`
    #[clap(long)]
    address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug,hyper=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = config::load(&cli.config)?;
    let address = match cli.address {
        Some(address) => address,
        None => config.server.address.parse()?,
    };

    let state = Arc::new(routes::AppState::new(&config)?);
    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http());

    tracing::info!(%address, repos = config.repos.len(), "listening");
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
