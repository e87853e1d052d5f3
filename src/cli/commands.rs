//! Command handlers for the distsync binary.

use color_eyre::eyre::{eyre, Result};

use super::args::CliCommand;
use super::output::{
    history_rows, instance_rows, print_header, print_rows, print_status, provider_rows,
};
use crate::channel::NotificationChannel;
use crate::config::ClientConfig;
use crate::error::DistError;
use crate::history::{HistoryLog, ProviderCatalog};
use crate::mutation::{MutationController, MutationOutcome};
use crate::repository::DistributionRepository;
use crate::sync::InstanceSynchronizer;

/// Turn a core error into a report carrying the user-facing message.
fn report(err: DistError) -> color_eyre::Report {
    eyre!("{} ({})", err.user_message(), err)
}

/// Run a network command against the configured backend.
pub async fn run_command(command: CliCommand, config: ClientConfig) -> Result<()> {
    let repository = DistributionRepository::from_config(&config);
    tracing::debug!(base_url = %config.base_url, ?command, "Running command");

    match command {
        CliCommand::Watch => run_watch(repository, &config).await,
        CliCommand::List => run_list(repository).await,
        CliCommand::Providers => run_providers(repository).await,
        CliCommand::History { keyword } => run_history(repository, keyword.as_deref()).await,
        CliCommand::Enable(id) => {
            let outcome = controller(repository).enable(&id).await.map_err(report)?;
            print_outcome(&outcome);
            Ok(())
        }
        CliCommand::Disable(id) => {
            let outcome = controller(repository).disable(&id).await.map_err(report)?;
            print_outcome(&outcome);
            Ok(())
        }
        CliCommand::Delete(id) => {
            let outcome = controller(repository).delete(&id).await.map_err(report)?;
            print_outcome(&outcome);
            Ok(())
        }
        CliCommand::Preheat(images) => {
            let outcome = controller(repository)
                .preheat(&images)
                .await
                .map_err(report)?;
            print_outcome(&outcome);
            Ok(())
        }
        other => Err(eyre!("{:?} is not a network command", other)),
    }
}

fn controller(repository: DistributionRepository) -> MutationController {
    MutationController::new(repository, NotificationChannel::new())
}

fn print_outcome(outcome: &MutationOutcome) {
    print_status("✓", &outcome.message);
}

async fn run_list(repository: DistributionRepository) -> Result<()> {
    let (instances, providers) =
        futures::try_join!(repository.list_instances(), repository.list_providers())
            .map_err(report)?;

    print_header(&format!(
        "PROVIDER INSTANCES ({}), {} provider kinds available",
        instances.len(),
        providers.len()
    ));
    print_rows(&instance_rows(&instances));
    Ok(())
}

async fn run_providers(repository: DistributionRepository) -> Result<()> {
    let mut catalog = ProviderCatalog::new(repository);
    let providers = catalog.load().await.map_err(report)?;
    print_header(&format!("PROVIDER KINDS ({})", providers.len()));
    print_rows(&provider_rows(providers));
    Ok(())
}

async fn run_history(repository: DistributionRepository, keyword: Option<&str>) -> Result<()> {
    let mut log = HistoryLog::new(repository);
    log.refresh().await.map_err(report)?;
    let records = log.filtered(keyword.unwrap_or_default());
    print_header(&format!("PREHEAT HISTORY ({} of {})", records.len(), log.total_count()));
    print_rows(&history_rows(&records));
    Ok(())
}

/// Keep the instance list in sync and reprint it on every snapshot change
/// until Ctrl-C.
async fn run_watch(repository: DistributionRepository, config: &ClientConfig) -> Result<()> {
    let channel = NotificationChannel::new();
    let synchronizer = InstanceSynchronizer::new(repository, channel, config.poll_interval);
    let mut changes = synchronizer.changes();
    synchronizer.start();
    tracing::info!(
        base_url = %config.base_url,
        interval_secs = config.poll_interval.as_secs(),
        "Watching provider instances"
    );

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = synchronizer.snapshot();
                print_header(&format!("PROVIDER INSTANCES ({})", snapshot.len()));
                print_rows(&instance_rows(&snapshot));
                println!();
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Interrupted, stopping");
                break;
            }
        }
    }

    synchronizer.close();
    let stats = synchronizer.stats();
    tracing::info!(
        fetches = stats.fetches,
        failures = stats.failures,
        coalesced = stats.coalesced,
        "Synchronizer stopped"
    );
    Ok(())
}
