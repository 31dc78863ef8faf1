use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use fa_requirements::assets::{Asset, asset_plan};
use fa_requirements::config::{self, Config};
use fa_requirements::logging::{self, LogFormat};
use fa_requirements::requirements::{ClientRequirement, LoadSpec, ProAvailability, Resolver};
use fa_requirements::storage::SqliteOptionStore;
use fa_requirements::storage::multisite::{ReleaseStore, SettingsProAvailability, try_upgrade};
use fa_requirements::version::catalog::{ReleaseCatalog, StaticCatalog, StoredCatalog};
use fa_requirements::version::releases::{HttpReleaseFetcher, needs_refresh, refresh_releases};

#[derive(Parser)]
#[command(name = "fa-requirements")]
#[command(version, about = "Negotiate icon library load requirements among clients")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Options database (defaults to the data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a JSON array of client requirements
    Resolve {
        /// File holding the client requirements
        #[arg(long)]
        requirements: PathBuf,

        /// Comma separated release versions to use instead of stored metadata
        #[arg(long, value_delimiter = ',')]
        catalog: Vec<String>,

        /// Latest release to use instead of stored metadata
        #[arg(long)]
        latest: Option<String>,

        /// Treat Pro as available regardless of stored settings
        #[arg(long)]
        pro: bool,
    },
    /// Fetch release metadata from the release API
    Refresh {
        /// Refresh even if stored metadata is still fresh
        #[arg(long)]
        force: bool,
    },
    /// Move release metadata to the main network
    Upgrade,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    load_spec: LoadSpec,
    assets: Vec<Asset>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let _guard = logging::init(&config::log_path(), cli.log_format.into())?;

    let db_path = cli.db.clone().unwrap_or_else(config::db_path);
    let store = open_store(&db_path)?;

    match cli.command {
        Command::Resolve {
            requirements,
            catalog,
            latest,
            pro,
        } => {
            let requirements = read_requirements(&requirements)?;
            let pro = pro
                || SettingsProAvailability::new(&store, config.multisite.site_id)
                    .is_pro_available();

            if catalog.is_empty() && latest.is_none() {
                let stored = StoredCatalog::new(&store, config.multisite.main_network_id);
                resolve(stored, pro, requirements)
            } else {
                let mut fixed = StaticCatalog::new(catalog);
                if let Some(latest) = latest {
                    fixed = fixed.with_latest(&latest);
                }
                resolve(fixed, pro, requirements)
            }
        }
        Command::Refresh { force } => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(refresh(&store, &config, force)),
        Command::Upgrade => {
            let outcome = try_upgrade(&store, config.multisite.main_network_id)?;
            println!("{:?}", outcome);
            Ok(())
        }
    }
}

fn open_store(db_path: &Path) -> anyhow::Result<SqliteOptionStore> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {:?}", parent))?;
    }

    Ok(SqliteOptionStore::new(db_path)?)
}

fn read_requirements(path: &Path) -> anyhow::Result<Vec<ClientRequirement>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;

    serde_json::from_str(&content).with_context(|| format!("failed to parse {:?}", path))
}

fn resolve<C: ReleaseCatalog>(
    catalog: C,
    pro: bool,
    requirements: Vec<ClientRequirement>,
) -> anyhow::Result<()> {
    let mut resolver = Resolver::new(catalog, pro);
    resolver.on_requirements(move |registry| {
        for requirement in &requirements {
            registry.register(requirement.clone())?;
        }
        Ok(())
    });

    let conflict = std::rc::Rc::new(std::cell::RefCell::new(None));
    let report = conflict.clone();
    resolver.on_failed(move |failed| *report.borrow_mut() = Some(failed.clone()));

    match resolver.load()? {
        Some(load_spec) => {
            let resolution = Resolution {
                assets: asset_plan(&load_spec),
                load_spec,
            };
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(())
        }
        None => {
            if let Some(report) = conflict.borrow().as_ref() {
                println!("{}", serde_json::to_string_pretty(report)?);
                anyhow::bail!("{}", report);
            }
            anyhow::bail!("clients could not agree on a load specification");
        }
    }
}

async fn refresh(store: &SqliteOptionStore, config: &Config, force: bool) -> anyhow::Result<()> {
    let releases = ReleaseStore::new(store, config.multisite.main_network_id);

    if !force {
        let stored = releases.load()?;
        if !needs_refresh(stored.as_ref(), config.releases.refresh_interval, Utc::now()) {
            info!("Release metadata is fresh, skipping refresh");
            println!("release metadata is up to date");
            return Ok(());
        }
    }

    let fetcher = HttpReleaseFetcher::new(&config.releases.api_url)?;
    let metadata = refresh_releases(&fetcher, &releases).await?;
    println!(
        "stored {} releases, latest {}",
        metadata.releases.len(),
        metadata.latest
    );

    Ok(())
}
