use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::analytics::{continent_breakdown, version_breakdown, Breakdown};
use crate::error::PodVizError;
use crate::fetcher::check_node_query;
use crate::models::{LeaderboardEntry, NetworkSummary, NodeRecord, RootSummary};
use crate::state::AppState;
use crate::table::{query_leaves, LeafPage, LeafQuery};
use crate::validators::{validator_for_version, ValidatorSummary};

type ApiResult<T> = Result<Json<T>, (StatusCode, &'static str)>;

fn not_found(what: &'static str) -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, what)
}

fn analytics_failed(e: PodVizError) -> (StatusCode, &'static str) {
    error!("Analytics query failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Analytics error")
}

fn no_live_api() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "Not connected to a live API")
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub nodes: usize,
    pub refreshed_at: u64,
}

/// GET /health - Liveness plus snapshot freshness.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let data = state.data.read().await;
    Json(Health {
        status: "ok",
        nodes: data.nodes.len(),
        refreshed_at: data.refreshed_at,
    })
}

/// GET /api/root - Header figures for the graph root.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootSummary> {
    Json(state.data.read().await.root.clone())
}

/// GET /api/summary - Network-wide summary.
pub async fn summary(State(state): State<Arc<AppState>>) -> Json<NetworkSummary> {
    Json(state.data.read().await.summary.clone())
}

/// GET /api/leaderboard - Global top 3 places, ties included.
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.data.read().await.ranking.leaderboard().to_vec())
}

/// GET /api/validators - One summary per validator with leaves.
pub async fn validators(State(state): State<Arc<AppState>>) -> Json<Vec<ValidatorSummary>> {
    Json(state.data.read().await.validators.clone())
}

/// GET /api/validators/{version} - Summary for the validator a version maps to.
pub async fn validator(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
) -> ApiResult<ValidatorSummary> {
    let bucket = validator_for_version(&version);
    let data = state.data.read().await;
    data.validators
        .iter()
        .find(|v| v.validator.version == bucket.version)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Validator has no leaves"))
}

/// GET /api/leaves - Searchable, sortable, paginated leaf table.
pub async fn leaves(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeafQuery>,
) -> Json<LeafPage> {
    let data = state.data.read().await;
    Json(query_leaves(&data.nodes, &data.ranking, &query))
}

/// GET /api/leaves/{pubkey} - One leaf with its global rank.
pub async fn leaf(
    State(state): State<Arc<AppState>>,
    Path(pubkey): Path<String>,
) -> ApiResult<NodeRecord> {
    let data = state.data.read().await;
    data.nodes
        .iter()
        .find(|n| n.pubkey == pubkey)
        .and_then(|n| data.ranking.annotate([n]).pop())
        .map(Json)
        .ok_or_else(|| not_found("Leaf not found"))
}

/// GET /api/leaves/{pubkey}/query/{arg} - Runs an allowlisted command on a
/// leaf through the API's node query proxy.
pub async fn query_leaf(
    State(state): State<Arc<AppState>>,
    Path((pubkey, arg)): Path<(String, String)>,
) -> ApiResult<serde_json::Value> {
    check_node_query(&arg).map_err(|_| (StatusCode::BAD_REQUEST, "Unsupported node query"))?;
    let client = state.source.client().ok_or_else(no_live_api)?;
    let endpoint = {
        let data = state.data.read().await;
        let node = data
            .nodes
            .iter()
            .find(|n| n.pubkey == pubkey)
            .ok_or_else(|| not_found("Leaf not found"))?;
        node.endpoint.clone().ok_or_else(|| not_found("Leaf has no endpoint"))?
    };
    client.query_node(&arg, &endpoint).await.map(Json).map_err(|e| {
        error!("Node query {} on {} failed: {}", arg, endpoint, e);
        (StatusCode::BAD_GATEWAY, "Node query failed")
    })
}

#[derive(Debug, Deserialize)]
pub struct SmartQuery {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct SmartQueryResult {
    pub endpoints: Vec<String>,
}

/// POST /api/smart-query - Leaf endpoints matching a free-text prompt.
pub async fn smart_query(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SmartQuery>,
) -> ApiResult<SmartQueryResult> {
    let prompt = query.prompt.trim();
    if prompt.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Prompt is empty"));
    }
    let client = state.source.client().ok_or_else(no_live_api)?;
    match client.smart_query(prompt).await {
        Ok(endpoints) => Ok(Json(SmartQueryResult { endpoints })),
        Err(e) => {
            warn!("Smart query failed: {}", e);
            Err(not_found("No node found"))
        }
    }
}

/// GET /api/analytics/versions - Leaves per software version using Polars.
pub async fn api_versions(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Breakdown>> {
    let data = state.data.read().await;
    version_breakdown(&data.df).map(Json).map_err(analytics_failed)
}

/// GET /api/analytics/continents - Leaves per continent using Polars.
pub async fn api_continents(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Breakdown>> {
    let data = state.data.read().await;
    continent_breakdown(&data.df).map(Json).map_err(analytics_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{credited_all, located};
    use crate::generator::MockGenerator;
    use crate::state::{DataSource, Snapshot};

    fn app_state() -> Arc<AppState> {
        let mut nodes = credited_all(&[300.0, 200.0, 100.0, 50.0]);
        nodes[0] = located(nodes[0].clone(), "DE", "Germany");
        let source = DataSource::Mock {
            generator: tokio::sync::Mutex::new(MockGenerator::new(1)),
            per_validator: 1,
        };
        Arc::new(AppState::new(source, Snapshot::build(nodes, None).unwrap()))
    }

    #[tokio::test]
    async fn test_leaf_carries_global_rank() {
        let Json(node) = leaf(State(app_state()), Path("n1".to_string())).await.unwrap();
        assert_eq!(node.credit_rank, Some(2));

        let Json(unranked) = leaf(State(app_state()), Path("n3".to_string())).await.unwrap();
        assert_eq!(unranked.credit_rank, None);
    }

    #[tokio::test]
    async fn test_unknown_leaf_is_404() {
        let err = leaf(State(app_state()), Path("missing".to_string())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validator_by_patch_version() {
        let Json(found) = validator(State(app_state()), Path("1.17.4-trynet.9".to_string()))
            .await
            .unwrap();
        assert_eq!(found.summary.operators, 4);

        let missing = validator(State(app_state()), Path("1.17.1".to_string())).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_continent_analytics() {
        let Json(rows) = api_continents(State(app_state())).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 1);
    }

    #[tokio::test]
    async fn test_leaderboard_matches_summary() {
        let state = app_state();
        let Json(board) = leaderboard(State(state.clone())).await;
        let Json(summary) = summary(State(state)).await;
        assert_eq!(board, summary.top_credit_providers);
        assert_eq!(board.len(), 3);
    }

    mod query_tests {
        use super::*;
        use crate::fetcher::ApiClient;
        use crate::fixtures::serve;
        use axum::routing::{get, post};
        use axum::Router;

        async fn remote_state() -> Arc<AppState> {
            let api = Router::new()
                .route(
                    "/pnode/run-command/{arg}",
                    get(|Path(arg): Path<String>| async move { Json(serde_json::json!({ "ran": arg })) }),
                )
                .route(
                    "/pnode/generative/find-best-leaf-endpoint",
                    post(|| async { Json(serde_json::json!({ "status": "fail" })) }),
                );
            let mut nodes = credited_all(&[10.0, 5.0]);
            nodes[0].endpoint = Some("http://10.0.0.1:6000".to_string());
            let source = DataSource::Remote {
                client: ApiClient::new(&serve(api).await).unwrap(),
                cache_path: std::env::temp_dir().join("podviz-handlers-unused.json"),
            };
            Arc::new(AppState::new(source, Snapshot::build(nodes, None).unwrap()))
        }

        fn query(pubkey: &str, arg: &str) -> Path<(String, String)> {
            Path((pubkey.to_string(), arg.to_string()))
        }

        #[tokio::test]
        async fn test_unsupported_query_is_400() {
            let err = query_leaf(State(app_state()), query("n0", "get-keys")).await.unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_mock_source_cannot_query() {
            let err = query_leaf(State(app_state()), query("n0", "get-stats")).await.unwrap_err();
            assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);

            let prompt = Json(SmartQuery {
                prompt: "fast leaves".to_string(),
            });
            let err = smart_query(State(app_state()), prompt).await.unwrap_err();
            assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
        }

        #[tokio::test]
        async fn test_query_reaches_leaf_endpoint() {
            let state = remote_state().await;
            let Json(reply) = query_leaf(State(state.clone()), query("n0", "get-version"))
                .await
                .unwrap();
            assert_eq!(reply["ran"], "get-version");

            let err = query_leaf(State(state.clone()), query("n1", "get-version")).await.unwrap_err();
            assert_eq!(err, (StatusCode::NOT_FOUND, "Leaf has no endpoint"));

            let err = query_leaf(State(state), query("missing", "get-version")).await.unwrap_err();
            assert_eq!(err, (StatusCode::NOT_FOUND, "Leaf not found"));
        }

        #[tokio::test]
        async fn test_smart_query_without_match() {
            let state = remote_state().await;
            let prompt = Json(SmartQuery {
                prompt: "anything".to_string(),
            });
            let err = smart_query(State(state.clone()), prompt).await.unwrap_err();
            assert_eq!(err, (StatusCode::NOT_FOUND, "No node found"));

            let blank = Json(SmartQuery {
                prompt: "  ".to_string(),
            });
            let err = smart_query(State(state), blank).await.unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
        }
    }
}
