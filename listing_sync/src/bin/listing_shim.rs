use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use listing_sync::dest::category::CategoryMap;
use listing_sync::{DestCommand, DestinationSync, ListingCache, SourceCommand, SourceSync};
use marketplace_api::{DateWindow, MarketplaceClient, WindowDimension};
use shim_utils::env::env_or;
use storefront_api::StorefrontClient;

#[derive(Parser)]
#[command(version, about = "Marketplace to storefront listing sync")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum DimensionArg {
    /// Listings started within the window.
    Start,
    /// Listings modified within the window.
    Mod,
    /// Listings ending within the window.
    End,
}

impl From<DimensionArg> for WindowDimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Start => Self::Start,
            DimensionArg::Mod => Self::Mod,
            DimensionArg::End => Self::End,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Pull listings from the marketplace into the cache.
    Pull {
        /// First day of the window, YYYY-MM-DD.
        #[arg(long)]
        start: NaiveDate,
        /// Days past the start to include; negative reaches backwards.
        #[arg(long, default_value_t = 0)]
        days: i64,
        /// Which listing timestamp the window filters on.
        #[arg(long, value_enum, default_value_t = DimensionArg::Start)]
        dimension: DimensionArg,
    },
    /// Push unpushed active listings to the storefront.
    Push {
        /// Worker threads per phase.
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Delete pushed products whose listings have since ended.
    Reconcile {
        /// Worker threads.
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Bulk-delete products by destination id.
    Purge {
        /// Destination product ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
    },
}

fn database_url() -> Result<String> {
    let path = env_or("database_file", "database/listing_items.db");
    if let Some(parent) = Path::new(&path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    Ok(path)
}

fn dest_sync(db_url: &str) -> Result<DestinationSync<StorefrontClient>> {
    let cache = ListingCache::open(db_url)?;
    let storefront = StorefrontClient::from_env()?;
    let categories = CategoryMap::from_env()?;
    Ok(DestinationSync::new(cache, storefront, categories))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_or("log_level", "info")))
        .init();

    let cli = Cli::parse();
    let db_url = database_url()?;

    match cli.cmd {
        Cmd::Pull {
            start,
            days,
            dimension,
        } => {
            let cache = ListingCache::open(&db_url)?;
            let marketplace = MarketplaceClient::from_env()?;
            let daily_limit: u32 = env_or("marketplace_daily_limit", "5000")
                .parse()
                .context("marketplace_daily_limit must be a number")?;

            let window = DateWindow::new(start, days, dimension.into());
            let mut sync = SourceSync::new(cache, marketplace, daily_limit);
            sync.dispatch(SourceCommand::PullSellerList { window })?;
        }
        Cmd::Push { workers } => {
            let ids = ListingCache::open(&db_url)?.active_item_ids()?;
            info!(count = ids.len(), workers, "pushing listings");

            for phase in [
                DestCommand::CreateProduct as fn(i64) -> DestCommand,
                DestCommand::UploadImages,
                DestCommand::UploadAttributes,
            ] {
                let commands: Vec<DestCommand> = ids.iter().map(|&id| phase(id)).collect();
                listing_sync::queue::run_pool(
                    commands,
                    workers,
                    || dest_sync(&db_url),
                    |sync, command| sync.dispatch(command),
                );
            }
        }
        Cmd::Reconcile { workers } => {
            let ids =
                ListingCache::open(&db_url)?.inactive_pushed_item_ids(Utc::now().naive_utc())?;
            info!(count = ids.len(), workers, "reconciling ended listings");

            let commands: Vec<DestCommand> =
                ids.into_iter().map(DestCommand::DeleteProduct).collect();
            listing_sync::queue::run_pool(
                commands,
                workers,
                || dest_sync(&db_url),
                |sync, command| sync.dispatch(command),
            );
        }
        Cmd::Purge { ids } => {
            let mut sync = dest_sync(&db_url)?;
            sync.dispatch(DestCommand::DeleteAllProducts(ids))?;
        }
    }

    Ok(())
}
