//! Data models for storage-provider nodes and their summaries.

use serde::{Deserialize, Serialize};

/// Geolocation of a node, when the IP lookup succeeded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    pub country_code: String,
    pub country_name: String,
    pub continent_code: String,
    pub continent_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Resource usage reported by nodes that answered a direct probe.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ResourceDetail {
    /// CPU usage in percent.
    pub cpu_usage: f64,
    pub total_ram_available: f64,
    pub total_ram_used: f64,
    pub total_storage_allocated: f64,
    pub total_storage_size: f64,
    pub packets_sent: u64,
    pub packets_received: u64,
}

impl ResourceDetail {
    /// RAM usage in percent, 0 when no RAM is reported.
    pub fn ram_usage_percent(&self) -> f64 {
        percent(self.total_ram_used, self.total_ram_available)
    }
}

/// One storage provider ("leaf") status snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeRecord {
    /// Public key, unique within one snapshot.
    pub pubkey: String,
    /// Software version; decides the validator bucket.
    pub version: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(alias = "storage_comitted")]
    pub storage_committed: f64,
    pub storage_used: f64,
    pub is_registered: bool,
    pub is_accessible: bool,
    pub is_public: bool,
    pub last_seen: bool,
    pub uptime: f64,
    /// Absent until the node has been scored.
    #[serde(default)]
    pub credit: Option<f64>,
    /// 1, 2 or 3 when the node is on the global leaderboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_rank: Option<u8>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub resource_detail: Option<ResourceDetail>,
}

impl NodeRecord {
    /// Share of committed storage in use, in percent.
    ///
    /// May exceed 100 when a node reports more used than committed.
    pub fn usage_percent(&self) -> f64 {
        percent(self.storage_used, self.storage_committed)
    }

    pub fn is_online(&self) -> bool {
        self.is_accessible && self.last_seen
    }

    pub fn country_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.country_name.as_str())
    }
}

/// One leaderboard row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub pubkey: String,
    pub credit: f64,
    pub rank: u8,
}

/// Node count for a country.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
    pub flag: String,
}

/// Credits earned by the nodes of a country.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountryCredits {
    pub country: String,
    pub credits: f64,
    pub flag: String,
    pub avg_per_pod: f64,
}

/// Statistics over a set of leaves.
///
/// Computed from scratch on every call; a validator's leaves and the whole
/// network use the same shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct NetworkSummary {
    pub operators: usize,
    pub total_storage_committed: f64,
    pub total_storage_used: f64,
    pub average_storage_per_pod: f64,
    pub utilization_rate: f64,
    pub online_count: usize,
    pub offline_count: usize,
    pub public_count: usize,
    pub private_count: usize,
    pub accessible_count: usize,
    pub registered_count: usize,
    pub total_credits_awarded: f64,
    pub average_credits_per_pod: f64,
    pub max_credits: f64,
    pub min_credits: f64,
    /// Global leaderboard entries that fall inside this set.
    pub top_credit_providers: Vec<LeaderboardEntry>,
    /// Top 5 countries by node count.
    pub country_distribution: Vec<CountryCount>,
    /// Top 5 countries by summed credit.
    pub credit_distribution_by_country: Vec<CountryCredits>,
    pub average_uptime: f64,
    pub total_packets_sent: u64,
    pub total_packets_received: u64,
    pub average_cpu_usage: f64,
    pub average_ram_usage: f64,
}

/// Header figures for the root of the network graph.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RootSummary {
    pub total_pods: usize,
    #[serde(alias = "total_storage_comitted")]
    pub total_storage_committed: f64,
    pub total_storage_used: f64,
    pub average_storage_per_pod: f64,
    pub utilization_rate: f64,
    #[serde(default)]
    pub total_credits: f64,
}

impl From<&NetworkSummary> for RootSummary {
    fn from(summary: &NetworkSummary) -> Self {
        Self {
            total_pods: summary.operators,
            total_storage_committed: summary.total_storage_committed,
            total_storage_used: summary.total_storage_used,
            average_storage_per_pod: summary.average_storage_per_pod,
            utilization_rate: summary.utilization_rate,
            total_credits: summary.total_credits_awarded,
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    ratio(part, whole) * 100.0
}

/// `num / den`, or 0 when `den` is zero.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::leaf;

    #[test]
    fn test_usage_percent() {
        assert_eq!(leaf("a").usage_percent(), 50.0);
    }

    #[test]
    fn test_usage_percent_zero_committed() {
        let mut node = leaf("a");
        node.storage_committed = 0.0;
        node.storage_used = 10.0;
        assert_eq!(node.usage_percent(), 0.0);
    }

    #[test]
    fn test_usage_percent_over_committed() {
        let mut node = leaf("a");
        node.storage_used = 150.0;
        assert_eq!(node.usage_percent(), 150.0);
    }

    #[test]
    fn test_ram_usage_guard() {
        let detail = ResourceDetail {
            total_ram_used: 4.0,
            ..Default::default()
        };
        assert_eq!(detail.ram_usage_percent(), 0.0);
    }

    #[test]
    fn test_online_requires_accessible_and_seen() {
        let mut node = leaf("a");
        assert!(node.is_online());
        node.last_seen = false;
        assert!(!node.is_online());
    }

    #[test]
    fn test_cache_spelling_alias() {
        let json = r#"{
            "pubkey": "abc", "version": "1.17.4",
            "storage_comitted": 200.0, "storage_used": 20.0,
            "is_registered": true, "is_accessible": false, "is_public": true,
            "last_seen": true, "uptime": 97.5
        }"#;
        let node: NodeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(node.storage_committed, 200.0);
        assert_eq!(node.credit, None);
        assert!(node.location.is_none());
    }
}
