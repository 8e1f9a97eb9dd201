use std::sync::Arc;

use accounts_subgraph::schema::{build_schema, federation_sdl};
use accounts_subgraph::{http, telemetry, Catalog, Settings};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::parse();

    if settings.print_sdl {
        print!("{}", federation_sdl());
        return Ok(());
    }

    let telemetry = telemetry::init(&settings.telemetry());

    let catalog = Arc::new(Catalog::seeded()?);
    let faults = settings.error_injector();
    tracing::info!(
        users = catalog.list_users().len(),
        products = catalog.list_products().len(),
        recommendations = %settings.recommendations,
        error_rate = faults.rate(),
        otlp = telemetry.otlp_enabled(),
        "catalog loaded"
    );

    let schema = build_schema(catalog, settings.recommendations, faults);

    let addr = settings.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Accounts subgraph ready at http://{}/graphql", addr);

    axum::serve(listener, http::router(schema))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
