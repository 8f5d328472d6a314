//! Shared builders for unit tests.

use crate::models::{Location, NodeRecord, ResourceDetail};

/// An accessible, registered, public leaf on the latest validator with no
/// credit and no location.
pub(crate) fn leaf(pubkey: &str) -> NodeRecord {
    NodeRecord {
        pubkey: pubkey.to_string(),
        version: "1.17.4".to_string(),
        endpoint: None,
        storage_committed: 100.0,
        storage_used: 50.0,
        is_registered: true,
        is_accessible: true,
        is_public: true,
        last_seen: true,
        uptime: 99.0,
        credit: None,
        credit_rank: None,
        location: None,
        resource_detail: None,
    }
}

pub(crate) fn credited(pubkey: &str, credit: f64) -> NodeRecord {
    NodeRecord {
        credit: Some(credit),
        ..leaf(pubkey)
    }
}

pub(crate) fn located(mut node: NodeRecord, code: &str, name: &str) -> NodeRecord {
    node.location = Some(Location {
        country_code: code.to_string(),
        country_name: name.to_string(),
        continent_code: "EU".to_string(),
        continent_name: "Europe".to_string(),
        latitude: 0.0,
        longitude: 0.0,
    });
    node
}

pub(crate) fn with_detail(mut node: NodeRecord, cpu: f64, ram_used: f64, ram_available: f64) -> NodeRecord {
    node.resource_detail = Some(ResourceDetail {
        cpu_usage: cpu,
        total_ram_available: ram_available,
        total_ram_used: ram_used,
        total_storage_allocated: node.storage_used,
        total_storage_size: node.storage_committed,
        packets_sent: 10,
        packets_received: 20,
    });
    node
}

/// Credited leaves named `n0`, `n1`, ... in input order.
pub(crate) fn credited_all(credits: &[f64]) -> Vec<NodeRecord> {
    credits
        .iter()
        .enumerate()
        .map(|(i, c)| credited(&format!("n{i}"), *c))
        .collect()
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub(crate) async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Success envelope for `/pnode/leaf` holding one leaf per key.
pub(crate) fn leaf_envelope(pubkeys: &[&str]) -> serde_json::Value {
    let nodes: Vec<_> = pubkeys
        .iter()
        .map(|pubkey| {
            serde_json::json!({
                "pubkey": pubkey,
                "address": { "endpoint": format!("http://{pubkey}.leaf:6000") },
                "storage_committed": 100,
                "storage_used": 50,
                "version": "1.17.4",
            })
        })
        .collect();
    serde_json::json!({ "status": "success", "data": { "nodes": nodes, "total": pubkeys.len() } })
}
