use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use floorb::logging;
use floorb::{
    ActorEnvironment, ActorStore, DeliveryPool, DeliveryReport, FederationEngine, FloorbConfig,
    ShutdownType,
};
use floorb_server::{commands, router, ActorRegistry, LocalEngine};

use crate::args::{Command, ServerArgs};

pub async fn run(args: &ServerArgs) -> Result<()> {
    let config = resolve_config(args)?;

    let log_path = match &args.log_file {
        Some(path) => {
            let expanded = shellexpand::env(path)
                .map_err(|e| anyhow!("Failed to expand log file path: {}", e))?;
            PathBuf::from(expanded.as_ref())
        }
        None => config.log_file(),
    };
    let log_level: tracing::Level = config
        .logging
        .level
        .parse()
        .map_err(|_| anyhow!("Invalid log level: {}", config.logging.level))?;
    logging::setup_global_logging(&log_path, &log_level, config.logging.stdout)
        .context("Failed to setup logging")?;
    info!("Logging to {:?}", log_path);

    let engine: Arc<dyn FederationEngine> = Arc::new(LocalEngine);
    let delivery = Arc::new(DeliveryPool::new(engine.clone(), &config.delivery));
    let env = ActorEnvironment {
        store: Arc::new(ActorStore::new(config.data_dir.clone())),
        engine,
        delivery: delivery.clone(),
        profile: config.profile_config(),
    };
    let registry = Arc::new(ActorRegistry::new(env));

    let result = match &args.command {
        Command::Serve { address } => serve(registry, *address).await,
        Command::CreateActor {
            name,
            summary,
            actor_type,
            iri,
        } => create_actor(&registry, name, summary, actor_type, iri).await,
        Command::Follow { name, target } => follow(&registry, name, target).await,
        Command::Announce { name, object } => announce(&registry, name, object).await,
    };

    delivery.shutdown(ShutdownType::Graceful).await;
    result
}

/// Config file (or defaults), then command line overrides.
fn resolve_config(args: &ServerArgs) -> Result<FloorbConfig> {
    let mut config = match &args.config {
        Some(path) => FloorbConfig::load(path)?,
        None => FloorbConfig::default(),
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(base_origin) = &args.base_origin {
        config.base_origin = base_origin.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.log_stdout {
        config.logging.stdout = true;
    }

    config.validate()?;
    Ok(config)
}

async fn serve(registry: Arc<ActorRegistry>, address: std::net::SocketAddr) -> Result<()> {
    registry.load_all().await?;

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Floorb server listening on {}", address);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn create_actor(
    registry: &ActorRegistry,
    name: &str,
    summary: &str,
    actor_type: &str,
    iri: &str,
) -> Result<()> {
    let service = registry
        .create(name, summary, actor_type, iri)
        .await
        .with_context(|| format!("Failed to create actor '{}'", name))?;

    let profile = service.who_am_i().await;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

async fn follow(registry: &ActorRegistry, name: &str, target: &str) -> Result<()> {
    let report = commands::follow(registry, name, target)
        .await
        .with_context(|| format!("'{}' could not follow {}", name, target))?;
    match report {
        None => println!("{} already follows {}", name, target),
        Some(report) => {
            print_report(&report);
            report
                .into_result()
                .context("Follow is recorded but was not delivered")?;
        }
    }
    Ok(())
}

async fn announce(registry: &ActorRegistry, name: &str, object: &str) -> Result<()> {
    let report = commands::announce(registry, name, object)
        .await
        .with_context(|| format!("'{}' could not announce {}", name, object))?;
    print_report(&report);
    report.into_result()?;
    Ok(())
}

fn print_report(report: &DeliveryReport) {
    println!(
        "{} {} to {}: {:?}",
        report.kind, report.id, report.destination, report.outcome
    );
}
