use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use polars::prelude::DataFrame;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::aggregate::aggregate_with_ranking;
use crate::analytics::leaves_frame;
use crate::data::{load_cached_leaves, save_cached_leaves};
use crate::error::PodVizError;
use crate::fetcher::ApiClient;
use crate::generator::MockGenerator;
use crate::models::{NetworkSummary, NodeRecord, RootSummary};
use crate::ranking::{rank, Ranking};
use crate::validators::{validator_summaries, ValidatorSummary};

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Cron expression for data refresh schedule.
    pub refresh_cron: String,
    /// pnode API base URL; mock data is served when unset.
    pub api_base_url: Option<String>,
    /// Where the last good fetch is cached.
    pub cache_path: PathBuf,
    pub mock_seed: u64,
    pub mock_leaves_per_validator: usize,
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, PodVizError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| PodVizError::InvalidConfig {
                    name,
                    reason: format!("{raw:?}: {e}"),
                })
        }
        _ => Ok(default),
    }
}

impl Config {
    /// Creates Config from environment variables with defaults.
    pub fn from_env() -> Result<Self, PodVizError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8201".into()),
            refresh_cron: env::var("REFRESH_CRON").unwrap_or_else(|_| "0 * * * * *".into()),
            api_base_url: env::var("API_BASE_URL").ok().filter(|u| !u.trim().is_empty()),
            cache_path: env::var("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/leaves.json")),
            mock_seed: parse_var("MOCK_SEED", 42)?,
            mock_leaves_per_validator: parse_var("MOCK_LEAVES_PER_VALIDATOR", 35)?,
        })
    }
}

/// Where leaves come from on each refresh.
#[derive(Debug)]
pub enum DataSource {
    /// Live pnode API, with the cache file as fallback.
    Remote { client: ApiClient, cache_path: PathBuf },
    /// Seeded generator. Each refresh draws a new batch from the same stream.
    Mock {
        generator: tokio::sync::Mutex<MockGenerator>,
        per_validator: usize,
    },
}

impl DataSource {
    pub fn from_config(config: &Config) -> Result<Self, PodVizError> {
        Ok(match &config.api_base_url {
            Some(url) => DataSource::Remote {
                client: ApiClient::new(url)?,
                cache_path: config.cache_path.clone(),
            },
            None => DataSource::Mock {
                generator: tokio::sync::Mutex::new(MockGenerator::new(config.mock_seed)),
                per_validator: config.mock_leaves_per_validator,
            },
        })
    }

    /// The API client when leaves come from a live API.
    pub fn client(&self) -> Option<&ApiClient> {
        match self {
            DataSource::Remote { client, .. } => Some(client),
            DataSource::Mock { .. } => None,
        }
    }

    /// Pulls a fresh set of leaves and, when the API provides one, its root
    /// header.
    ///
    /// The cache is read only when the leaf fetch itself fails. A failed root
    /// fetch gives `None` alongside the live leaves.
    pub async fn load(&self) -> Result<(Vec<NodeRecord>, Option<RootSummary>), PodVizError> {
        match self {
            DataSource::Remote { client, cache_path } => {
                let (leaves, root) = tokio::join!(client.fetch_leaves(), client.fetch_root());
                let root = root
                    .inspect_err(|e| warn!("Root fetch failed ({}), deriving header from leaves", e))
                    .ok();
                let nodes = match leaves {
                    Ok(nodes) => {
                        if let Err(e) = save_cached_leaves(cache_path, &nodes) {
                            warn!("Failed to write leaf cache {}: {}", cache_path.display(), e);
                        }
                        nodes
                    }
                    Err(e) => {
                        warn!("Leaf fetch failed ({}), falling back to {}", e, cache_path.display());
                        load_cached_leaves(cache_path)?
                    }
                };
                Ok((nodes, root))
            }
            DataSource::Mock {
                generator,
                per_validator,
            } => Ok((generator.lock().await.generate(*per_validator), None)),
        }
    }
}

/// Everything served for one set of leaves.
///
/// Built once per refresh and replaced wholesale; the ranking inside is the
/// only one any view reads from.
#[derive(Debug)]
pub struct Snapshot {
    pub nodes: Vec<NodeRecord>,
    pub ranking: Ranking,
    pub summary: NetworkSummary,
    pub root: RootSummary,
    pub validators: Vec<ValidatorSummary>,
    pub df: DataFrame,
    /// Unix seconds of the refresh that built this snapshot.
    pub refreshed_at: u64,
}

impl Snapshot {
    pub fn build(nodes: Vec<NodeRecord>, upstream_root: Option<RootSummary>) -> Result<Self, PodVizError> {
        let ranking = rank(&nodes);
        let summary = aggregate_with_ranking(&nodes, &ranking);
        let validators = validator_summaries(&nodes, &ranking);
        let root = upstream_root.unwrap_or_else(|| RootSummary::from(&summary));
        let df = leaves_frame(&nodes)?;
        let refreshed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Ok(Self {
            nodes,
            ranking,
            summary,
            root,
            validators,
            df,
            refreshed_at,
        })
    }

    pub fn empty() -> Result<Self, PodVizError> {
        Self::build(Vec::new(), None)
    }
}

/// Shared application state passed to all request handlers.
#[derive(Debug)]
pub struct AppState {
    pub source: DataSource,
    /// Current snapshot protected by RwLock.
    pub data: RwLock<Snapshot>,
}

impl AppState {
    pub fn new(source: DataSource, snapshot: Snapshot) -> Self {
        Self {
            source,
            data: RwLock::new(snapshot),
        }
    }

    /// Loads fresh leaves and swaps in a new snapshot.
    ///
    /// The snapshot is built before the write lock is taken, so readers only
    /// wait for the swap.
    pub async fn refresh(&self) -> Result<usize, PodVizError> {
        let (nodes, root) = self.source.load().await?;
        let snapshot = Snapshot::build(nodes, root)?;
        let count = snapshot.nodes.len();
        info!(
            "Refreshed snapshot: {} leaves, {} validators, {} on leaderboard",
            count,
            snapshot.validators.len(),
            snapshot.ranking.leaderboard().len()
        );
        *self.data.write().await = snapshot;
        Ok(count)
    }
}
