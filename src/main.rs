mod cli;

use addon_engine::runtime::DockerRuntime;
use addon_engine::{
    AddonDeployer, AddonStatus, AddonStore, EngineConfig, EngineContext, Error as EngineError,
    FailureMonitor, InstallCoordinator, MarketplaceClient, SqliteAddonStore,
};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(engine_error) = e.downcast_ref::<EngineError>() {
            eprintln!("Error: {}", engine_error);
            if let Some(suggestion) = engine_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;

    let ctx = Arc::new(EngineContext::new(config.clone()));
    let runtime = Arc::new(DockerRuntime::new());
    let store = Arc::new(SqliteAddonStore::open(&cli.db).await?);
    let deployer = AddonDeployer::new(runtime.clone(), ctx.clone());

    let mut coordinator =
        InstallCoordinator::new(store.clone(), deployer.clone(), runtime.clone());
    if let Ok(api) = config.marketplace_api() {
        coordinator = coordinator.with_catalog(Arc::new(MarketplaceClient::new(api)));
    }

    match cli.command {
        Commands::Run { no_resume } => {
            if !addon_engine::docker::is_daemon_healthy().await {
                tracing::warn!("Docker daemon is not responding; the engine will keep polling");
            }

            if !no_resume {
                coordinator.resume_active().await?;
            }

            let monitor = FailureMonitor::new(runtime, store, ctx.clone());
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(monitor.run(cancel.clone()));

            tracing::info!(engine = %ctx.engine_id(), "engine running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            cancel.cancel();
            handle.await?;
        }

        Commands::Install {
            marketplace_id,
            detach,
        } => {
            let receipt = coordinator.install(&marketplace_id).await?;
            println!("Created addon {} ({})", receipt.addon.id, receipt.addon.status);

            if detach {
                // Deployment keeps running on the engine's runtime; its
                // outcome lands in the addon's persisted status.
                return Ok(());
            }

            let status = receipt.deployment.await?;
            println!("Addon {} is {}", receipt.addon.id, status);
            if status == AddonStatus::Failed {
                std::process::exit(1);
            }
        }

        Commands::Deploy { addon_id } => {
            let addon = store
                .get_addon(&addon_id)
                .await?
                .ok_or(EngineError::AddonNotFound(addon_id))?;
            let status = coordinator.deploy_addon(&addon).await;
            println!("Addon {} is {}", addon.id, status);
            if status == AddonStatus::Failed {
                std::process::exit(1);
            }
        }

        Commands::Stop {
            addon_id,
            remove_images,
        } => {
            let addon = store
                .get_addon(&addon_id)
                .await?
                .ok_or(EngineError::AddonNotFound(addon_id))?;
            coordinator.stop_addon(&addon).await?;
            if remove_images {
                coordinator.remove_addon_images(&addon).await;
            }
            println!("Stopped addon {}", addon.id);
        }

        Commands::List { json } => {
            let addons = store.find_active_addons().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&addons)?);
            } else if addons.is_empty() {
                println!("No active addons");
            } else {
                for addon in addons {
                    println!(
                        "{}  {:<10}  {} service(s)  (marketplace: {})",
                        addon.id,
                        addon.status.to_string(),
                        addon.services.len(),
                        addon.marketplace_id
                    );
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
