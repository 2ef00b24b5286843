use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitops_db::config::DatabaseConfig;
use gitops_db::store::maintenance::purge_rows_with_prefix;
use gitops_db::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "gitops-db")]
#[command(about = "Maintenance tool for the GitOps control plane database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatabaseArgs {
    /// TOML file with database settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory holding the database (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,
}

impl DatabaseArgs {
    fn resolve(self) -> anyhow::Result<DatabaseConfig> {
        let mut config = match self.config {
            Some(path) => DatabaseConfig::load(&path)?,
            None => DatabaseConfig::default(),
        };
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir.into();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply the schema
    Init {
        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Dump every row of one table as JSON (unchecked, privileged)
    List {
        /// Table to dump
        #[arg(value_enum)]
        entity: Entity,

        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Delete every row whose key starts with a prefix, children first
    Purge {
        /// Key prefix to match, e.g. "test-"
        #[arg(long)]
        prefix: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        db: DatabaseArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Entity {
    ClusterUsers,
    ClusterCredentials,
    EngineClusters,
    EngineInstances,
    ManagedEnvironments,
    ClusterAccess,
    Applications,
    ApplicationStates,
    Operations,
    DeploymentMappings,
}

fn open_existing(config: &DatabaseConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Database not found at {}. Run 'gitops-db init' first.",
            db_path.display()
        );
    }
    Ok(SqliteStore::open(config)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_init(config: DatabaseConfig) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config)?;
    store.initialize()?;

    info!("Schema applied to {}", config.db_path().display());
    println!("Initialized database at {}", config.db_path().display());
    Ok(())
}

fn run_list(config: DatabaseConfig, entity: Entity) -> anyhow::Result<()> {
    let store = open_existing(&config)?;

    match entity {
        Entity::ClusterUsers => print_json(&store.list_all_cluster_users()?),
        Entity::ClusterCredentials => print_json(&store.list_all_cluster_credentials()?),
        Entity::EngineClusters => print_json(&store.list_all_gitops_engine_clusters()?),
        Entity::EngineInstances => print_json(&store.list_all_gitops_engine_instances()?),
        Entity::ManagedEnvironments => print_json(&store.list_all_managed_environments()?),
        Entity::ClusterAccess => print_json(&store.list_all_cluster_access()?),
        Entity::Applications => print_json(&store.list_all_applications()?),
        Entity::ApplicationStates => print_json(&store.list_all_application_states()?),
        Entity::Operations => print_json(&store.list_all_operations()?),
        Entity::DeploymentMappings => {
            print_json(&store.list_all_deployment_to_application_mappings()?)
        }
    }
}

fn run_purge(config: DatabaseConfig, prefix: String, json: bool) -> anyhow::Result<()> {
    if prefix.is_empty() {
        bail!("Refusing to purge with an empty prefix");
    }

    let store = open_existing(&config)?;
    let report = purge_rows_with_prefix(&store, &prefix)?;

    if json {
        return print_json(&report);
    }

    for entry in &report.entries {
        println!(
            "{:<32} deleted {:>4}  skipped {:>4}",
            entry.entity, entry.deleted, entry.skipped
        );
    }
    println!(
        "Purged {} rows with prefix '{}' ({} skipped)",
        report.total_deleted(),
        prefix,
        report.total_skipped()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("gitops_db=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db } => run_init(db.resolve()?)?,
        Commands::List { entity, db } => run_list(db.resolve()?, entity)?,
        Commands::Purge { prefix, json, db } => run_purge(db.resolve()?, prefix, json)?,
    }

    Ok(())
}
