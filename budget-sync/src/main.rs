//! Command-line front end for the budget synchronisation layer.
//!
//! Loads settings from `BUDGET_SYNC_*` variables, selects the configured
//! backend, and runs one command for the given owner. Mutations go through
//! the optimistic coordinator, so failures are logged and reported exactly
//! as they would be for an interactive client.

use std::ffi::OsString;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use budget_sync::domain::ports::{EntityBackend, FailureLogger, Notifier};
use budget_sync::domain::{
    Amount, Category, EntityId, EntryType, FailureReporter, MutationCoordinator, NewCategory,
    NewTransaction, OwnerId, SyncEntity, Transaction, TransactionPatch,
};
use budget_sync::outbound::http::{HttpTransport, ReqwestExecutor, TransportRuntime};
use budget_sync::outbound::persistence::{BackendConfig, WireEntity, select_backend};
use budget_sync::outbound::{TracingFailureLogger, TracingNotifier};
use budget_sync::settings::SyncSettings;

#[derive(Debug, Parser)]
#[command(name = "budget-sync", version, about = "Synchronise budget data")]
struct Cli {
    /// Owner whose data the command reads or changes.
    #[arg(long)]
    owner: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every transaction as JSON lines.
    List,
    /// Record a transaction.
    Add {
        /// Major-unit amount, e.g. 75.5.
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        /// `income` or `expense`.
        #[arg(long = "type", default_value = "expense")]
        entry_type: EntryType,
        #[arg(long, default_value = "")]
        description: String,
        /// Date in `YYYY-MM-DD` form.
        #[arg(long)]
        date: NaiveDate,
    },
    /// Change the description of a transaction.
    Describe { id: EntityId, description: String },
    /// Delete a transaction.
    Remove { id: EntityId },
    /// Print every category as JSON lines.
    Categories,
    /// Create a category.
    AddCategory {
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "expense")]
        entry_type: EntryType,
        #[arg(long, default_value = "#888888")]
        color: String,
        #[arg(long, default_value = "tag")]
        icon: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let owner = OwnerId::new(&cli.owner).map_err(|e| eyre!("invalid owner: {e}"))?;
    let settings = SyncSettings::load_from_iter([OsString::from("budget-sync")])
        .map_err(|e| eyre!("failed to load settings: {e}"))?;
    let app = App::build(&settings)?;

    match cli.command {
        Command::List => {
            let transactions = app.transactions(&owner).await?;
            print_lines(&transactions.entities())?;
        }
        Command::Add {
            amount,
            category,
            entry_type,
            description,
            date,
        } => {
            let amount = Amount::from_f64(amount).map_err(|e| eyre!("invalid amount: {e}"))?;
            let transactions = app.transactions(&owner).await?;
            let created = transactions
                .add(NewTransaction {
                    amount,
                    category,
                    entry_type,
                    description,
                    occurred_on: date,
                })
                .settle()
                .await?;
            print_lines(&[created])?;
        }
        Command::Describe { id, description } => {
            let transactions = app.transactions(&owner).await?;
            let patch = TransactionPatch {
                description: Some(description),
                ..TransactionPatch::default()
            };
            let updated = transactions.update(id, patch).settle().await?;
            print_lines(&[updated])?;
        }
        Command::Remove { id } => {
            let transactions = app.transactions(&owner).await?;
            transactions.remove(id).settle().await?;
        }
        Command::Categories => {
            let categories = app.categories(&owner).await?;
            print_lines(&categories.entities())?;
        }
        Command::AddCategory {
            name,
            entry_type,
            color,
            icon,
        } => {
            let categories = app.categories(&owner).await?;
            let created = categories
                .add(NewCategory {
                    name,
                    color,
                    icon,
                    entry_type,
                })
                .settle()
                .await?;
            print_lines(&[created])?;
        }
    }
    Ok(())
}

/// Wiring shared by every command.
struct App {
    transactions: Arc<dyn EntityBackend<Transaction>>,
    categories: Arc<dyn EntityBackend<Category>>,
    reporter: FailureReporter,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl App {
    fn build(settings: &SyncSettings) -> Result<Self> {
        let config = settings.backend_config()?;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
        let logger: Arc<dyn FailureLogger> = Arc::new(TracingFailureLogger);
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        let executor = ReqwestExecutor::new().wrap_err("failed to build HTTP client")?;
        let transport = HttpTransport::new(
            Arc::new(executor),
            Arc::clone(&logger),
            settings.transport_settings(),
            TransportRuntime::default(),
        );
        Ok(Self {
            transactions: backend::<Transaction>(&config, &transport, &clock)?,
            categories: backend::<Category>(&config, &transport, &clock)?,
            reporter: FailureReporter::new("coordinator", logger, notifier),
            clock,
        })
    }

    async fn transactions(&self, owner: &OwnerId) -> Result<MutationCoordinator<Transaction>> {
        self.coordinator(Arc::clone(&self.transactions), owner).await
    }

    async fn categories(&self, owner: &OwnerId) -> Result<MutationCoordinator<Category>> {
        self.coordinator(Arc::clone(&self.categories), owner).await
    }

    async fn coordinator<E: SyncEntity>(
        &self,
        backend: Arc<dyn EntityBackend<E>>,
        owner: &OwnerId,
    ) -> Result<MutationCoordinator<E>> {
        let coordinator =
            MutationCoordinator::new(backend, self.reporter.clone(), Arc::clone(&self.clock));
        coordinator.refresh(Some(owner.clone())).await?;
        Ok(coordinator)
    }
}

fn backend<E>(
    config: &BackendConfig,
    transport: &HttpTransport,
    clock: &Arc<dyn Clock + Send + Sync>,
) -> Result<Arc<dyn EntityBackend<E>>>
where
    E: WireEntity + Serialize + DeserializeOwned,
{
    let selected = select_backend::<E>(config, transport, Arc::clone(clock))?;
    Ok(Arc::new(selected))
}

fn print_lines<T: Serialize>(items: &[T]) -> Result<()> {
    for item in items {
        println!("{}", serde_json::to_string(item).wrap_err("failed to encode output")?);
    }
    Ok(())
}
