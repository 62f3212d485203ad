use std::time::Duration;

mod catalog;
mod config;
mod db;
mod error;
mod models;
mod services;
mod sync;
mod vcs;

use config::Config;
use db::Repository;
use error::{AppError, Result};
use models::NewSource;
use services::HealthReporter;
use sync::RefreshService;
use vcs::WorkingCopyProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config = Config::load()?;
    let repository = Repository::new(&config.db_path).await?;

    // Register a source configuration (administrative, out-of-band)
    if args.len() >= 2 && args[1] == "--add-source" {
        if args.len() < 4 {
            return Err(
                anyhow::anyhow!("usage: metasync --add-source <name> <clone-url> [web-url]").into(),
            );
        }

        let clone_url = args[3].clone();
        url::Url::parse(&clone_url)
            .map_err(|e| AppError::Config(format!("invalid clone URL: {}", e)))?;

        repository
            .insert_source(NewSource {
                name: args[2].clone(),
                clone_url,
                web_url: args.get(4).cloned(),
                kind: "git".to_string(),
            })
            .await?;
        println!("Registered source {}", args[2]);
        return Ok(());
    }

    if args.len() >= 2 && args[1] == "--list-sources" {
        for source in repository.get_all_sources().await? {
            println!("{:>3}  {} [{}] {}", source.id, source.name, source.kind, source.clone_url);
            if let Some(web_url) = &source.web_url {
                println!("     web: {}", web_url);
            }
            println!(
                "     created: {}, updated: {}",
                source.created_at,
                source
                    .updated_at
                    .map(|dt| dt.to_string())
                    .unwrap_or_else(|| "never".to_string()),
            );
        }
        return Ok(());
    }

    if args.len() >= 2 && args[1] == "--status" {
        let events = repository.get_banner_events().await?;
        let items = repository.get_known_items().await?;
        println!("{} banner events, {} known items", events.len(), items.len());
        return Ok(());
    }

    let provider = WorkingCopyProvider::new(
        config.working_copy,
        &config.workdir,
        Duration::from_secs(config.git_timeout_secs),
    );
    let health = config.healthcheck_url.clone().map(HealthReporter::new);
    let service = RefreshService::new(repository, provider, health);

    // One-shot refresh for external cron-style schedulers
    if args.len() >= 2 && args[1] == "--sync" {
        service.run_cycle().await?;
        return Ok(());
    }

    run_scheduler(&service, &config).await
}

/// Fire a refresh cycle on a fixed interval, one cycle at a time.
///
/// The shutdown signal is only observed between cycles, so a replace
/// transaction in flight always commits or rolls back before exit.
async fn run_scheduler(service: &RefreshService, config: &Config) -> Result<()> {
    let period = Duration::from_secs(u64::from(config.refresh_interval_minutes) * 60);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!("refreshing every {} minutes", config.refresh_interval_minutes);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }

        if let Err(e) = service.run_cycle().await {
            tracing::error!("refresh cycle failed: {}", e);
        }
    }
}
