//! Client for the pnode REST API.
//!
//! Wire records are translated into [`NodeRecord`] here so that the rest of
//! the crate only ever sees canonical field names.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PodVizError;
use crate::models::{Location, NodeRecord, ResourceDetail, RootSummary};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ROOT_PATH: &str = "/pnode/root";
const LEAF_PATH: &str = "/pnode/leaf";
const RUN_COMMAND_PATH: &str = "/pnode/run-command";
const SMART_QUERY_PATH: &str = "/pnode/generative/find-best-leaf-endpoint";

/// Commands a leaf may be asked to run through the node query proxy.
pub const NODE_QUERIES: [&str; 4] = ["get-stats", "get-pods", "get-pods-with-stats", "get-version"];

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ApiStatus {
    Success,
    Error,
    Fail,
}

/// `{ "status": ..., "data": ... }` envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: ApiStatus,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LeafList {
    nodes: Vec<WireLeaf>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIpInfo {
    continent_code: String,
    continent_name: String,
    country_code: String,
    country_name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct WireAddress {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    ip_info: Option<WireIpInfo>,
}

/// Versions arrive as strings or, from older backends, as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireVersion {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
struct WireLeaf {
    pubkey: String,
    #[serde(default)]
    is_registered: bool,
    address: WireAddress,
    #[serde(default)]
    accessible_node_detail: Option<ResourceDetail>,
    #[serde(default)]
    is_accessible: bool,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    last_seen: bool,
    #[serde(alias = "storage_comitted")]
    storage_committed: f64,
    storage_used: f64,
    #[serde(default)]
    uptime: f64,
    version: WireVersion,
    #[serde(default)]
    credit: Option<f64>,
}

impl From<WireLeaf> for NodeRecord {
    fn from(wire: WireLeaf) -> Self {
        let version = match wire.version {
            WireVersion::Text(v) => v,
            WireVersion::Number(v) => v.to_string(),
        };
        let location = wire.address.ip_info.map(|ip| Location {
            country_code: ip.country_code,
            country_name: ip.country_name,
            continent_code: ip.continent_code,
            continent_name: ip.continent_name,
            latitude: ip.latitude,
            longitude: ip.longitude,
        });
        NodeRecord {
            pubkey: wire.pubkey,
            version,
            endpoint: wire.address.endpoint,
            storage_committed: wire.storage_committed,
            storage_used: wire.storage_used,
            is_registered: wire.is_registered,
            is_accessible: wire.is_accessible,
            is_public: wire.is_public,
            last_seen: wire.last_seen,
            uptime: wire.uptime,
            credit: wire.credit,
            credit_rank: None,
            location,
            resource_detail: wire.accessible_node_detail,
        }
    }
}

/// Unwraps an envelope, rejecting non-success statuses and missing data.
fn unwrap_envelope<T>(endpoint: &str, envelope: ApiEnvelope<T>) -> Result<T, PodVizError> {
    if envelope.status != ApiStatus::Success {
        return Err(PodVizError::InvalidApiResponse(format!(
            "{endpoint} returned status {:?}",
            envelope.status
        )));
    }
    envelope
        .data
        .ok_or_else(|| PodVizError::InvalidApiResponse(format!("{endpoint} returned no data")))
}

fn parse_leaves(body: &str) -> Result<Vec<NodeRecord>, PodVizError> {
    let envelope: ApiEnvelope<LeafList> = serde_json::from_str(body)?;
    let list = unwrap_envelope(LEAF_PATH, envelope)?;
    if let Some(total) = list.total.filter(|t| *t != list.nodes.len()) {
        debug!("Leaf endpoint reports {} total, returned {}", total, list.nodes.len());
    }
    Ok(list.nodes.into_iter().map(NodeRecord::from).collect())
}

/// Rejects node query commands outside [`NODE_QUERIES`].
pub fn check_node_query(arg: &str) -> Result<(), PodVizError> {
    if NODE_QUERIES.contains(&arg) {
        Ok(())
    } else {
        Err(PodVizError::UnsupportedQuery(arg.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SmartQueryRequest<'a> {
    prompt: &'a str,
}

/// Reply of the endpoint search. Unlike the other endpoints it carries its
/// payload next to `status` instead of under `data`.
#[derive(Debug, Deserialize)]
struct SmartQueryReply {
    status: ApiStatus,
    #[serde(default)]
    endpoints: Option<Vec<String>>,
}

fn parse_smart_query(body: &str) -> Result<Vec<String>, PodVizError> {
    let reply: SmartQueryReply = serde_json::from_str(body)?;
    match reply {
        SmartQueryReply {
            status: ApiStatus::Success,
            endpoints: Some(endpoints),
        } => Ok(endpoints),
        _ => Err(PodVizError::InvalidApiResponse("No node found".to_string())),
    }
}

/// HTTP client bound to one pnode API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, PodVizError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("podviz/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, path: &str) -> Result<String, PodVizError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<T, PodVizError> {
        let body = self.get_text(path).await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        unwrap_envelope(path, envelope)
    }

    /// Root node header from `/pnode/root`.
    pub async fn fetch_root(&self) -> Result<RootSummary, PodVizError> {
        self.get_envelope(ROOT_PATH).await
    }

    /// All leaves from `/pnode/leaf`.
    pub async fn fetch_leaves(&self) -> Result<Vec<NodeRecord>, PodVizError> {
        let body = self.get_text(LEAF_PATH).await?;
        let nodes = parse_leaves(&body)?;
        info!("Fetched {} leaves from {}", nodes.len(), self.base_url);
        Ok(nodes)
    }

    /// Runs an allowlisted command on the leaf at `endpoint` and returns its
    /// JSON reply as is.
    ///
    /// Unsupported commands fail before any request is sent.
    pub async fn query_node(&self, arg: &str, endpoint: &str) -> Result<serde_json::Value, PodVizError> {
        check_node_query(arg)?;
        let url = reqwest::Url::parse_with_params(
            &format!("{}{}/{}", self.base_url, RUN_COMMAND_PATH, arg),
            &[("endpoint", endpoint)],
        )
        .map_err(|e| PodVizError::InvalidApiResponse(format!("bad node query URL: {e}")))?;
        debug!("Querying {} on {}", arg, endpoint);
        let reply = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply)
    }

    /// Endpoints the API suggests for a free-text prompt.
    pub async fn smart_query(&self, prompt: &str) -> Result<Vec<String>, PodVizError> {
        let url = format!("{}{}", self.base_url, SMART_QUERY_PATH);
        let body = self
            .client
            .post(&url)
            .json(&SmartQueryRequest { prompt })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let endpoints = parse_smart_query(&body)?;
        info!("Smart query matched {} endpoints", endpoints.len());
        Ok(endpoints)
    }
}
