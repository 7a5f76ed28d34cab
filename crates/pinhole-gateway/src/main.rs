use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pinhole_core::{Redirector, Repository, Shortener};
use pinhole_gateway::cli::{GeneratorArg, StorageBackendArg, CLI};
use pinhole_gateway::{App, AppState};
use pinhole_generator::{GeneratorSettings, RandomGenerator, SeqGenerator};
use pinhole_redirector::RedirectorService;
use pinhole_shortener::{ShortenerService, ShortenerSettings};
use pinhole_storage::{InMemoryRepository, MySqlRepository};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    pinhole_telemetry::init(config.log_format.into())?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        generator = %config.generator,
        code_length = config.code_length,
        max_attempts = config.max_attempts,
        "starting gateway server"
    );

    let state = match config.storage {
        StorageBackendArg::InMemory => build_state(Arc::new(InMemoryRepository::new()), &config)?,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn).await?;
            repository.migrate().await?;
            build_state(Arc::new(repository), &config)?
        }
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

fn build_state<R: Repository>(repository: Arc<R>, config: &CLI) -> anyhow::Result<AppState> {
    let generator_settings = GeneratorSettings::builder()
        .length(config.code_length)
        .build();
    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .build();

    let shortener: Arc<dyn Shortener> = match config.generator {
        GeneratorArg::Random => Arc::new(ShortenerService::<R, _>::with_settings(
            Arc::clone(&repository),
            RandomGenerator::new(generator_settings)?,
            settings,
        )),
        GeneratorArg::Sequential => Arc::new(ShortenerService::<R, _>::with_settings(
            Arc::clone(&repository),
            SeqGenerator::new(generator_settings)?,
            settings,
        )),
    };
    let redirector: Arc<dyn Redirector> = Arc::new(RedirectorService::<R>::new(repository));

    Ok(AppState::new(shortener, redirector, config.base_url.clone()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
