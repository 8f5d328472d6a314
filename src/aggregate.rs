//! Reduction of a set of leaves into a [`NetworkSummary`].
//!
//! Every metric is an independent fold over the same slice, so the result
//! does not depend on how the caller scoped the slice. Divisions are guarded
//! and an empty slice gives [`NetworkSummary::default`].

use crate::geo::{country_distribution, credit_distribution_by_country};
use crate::models::{percent, ratio, LeaderboardEntry, NetworkSummary, NodeRecord, ResourceDetail};
use crate::ranking::{rank, scored_credit, Ranking};

/// Summarizes `nodes`, ranking them on their own.
///
/// Use this when `nodes` is the whole network. For a validator's leaves use
/// [`aggregate_with_ranking`] with the network ranking instead.
pub fn aggregate(nodes: &[NodeRecord]) -> NetworkSummary {
    aggregate_with_ranking(nodes, &rank(nodes))
}

/// Summarizes `nodes` using a ranking computed over the whole network.
///
/// The leaderboard is the part of the global leaderboard that falls inside
/// `nodes`; no second ranking happens here.
pub fn aggregate_with_ranking(nodes: &[NodeRecord], ranking: &Ranking) -> NetworkSummary {
    aggregate_with_leaderboard(nodes, ranking.project(nodes))
}

/// Summarizes `nodes` with a leaderboard the caller already scoped to them.
pub fn aggregate_with_leaderboard(
    nodes: &[NodeRecord],
    top_credit_providers: Vec<LeaderboardEntry>,
) -> NetworkSummary {
    if nodes.is_empty() {
        return NetworkSummary::default();
    }

    let operators = nodes.len();
    let count = |pred: fn(&NodeRecord) -> bool| nodes.iter().filter(|n| pred(n)).count();

    let online_count = count(NodeRecord::is_online);
    let public_count = count(|n| n.is_public);

    let total_storage_committed: f64 = nodes.iter().map(|n| n.storage_committed).sum();
    let total_storage_used: f64 = nodes.iter().map(|n| n.storage_used).sum();

    let credits = CreditStats::collect(nodes);
    let performance = PerformanceStats::collect(nodes);

    NetworkSummary {
        operators,
        total_storage_committed,
        total_storage_used,
        average_storage_per_pod: ratio(total_storage_committed, operators as f64),
        utilization_rate: percent(total_storage_used, total_storage_committed),
        online_count,
        offline_count: operators - online_count,
        public_count,
        private_count: operators - public_count,
        accessible_count: count(|n| n.is_accessible),
        registered_count: count(|n| n.is_registered),
        total_credits_awarded: credits.total,
        average_credits_per_pod: ratio(credits.total, credits.scored as f64),
        max_credits: credits.max,
        min_credits: credits.min,
        top_credit_providers,
        country_distribution: country_distribution(nodes),
        credit_distribution_by_country: credit_distribution_by_country(nodes),
        average_uptime: ratio(nodes.iter().map(|n| n.uptime).sum(), operators as f64),
        total_packets_sent: performance.packets_sent,
        total_packets_received: performance.packets_received,
        average_cpu_usage: ratio(performance.cpu_total, performance.reporting as f64),
        average_ram_usage: ratio(performance.ram_percent_total, performance.reporting as f64),
    }
}

/// Credit figures over scored leaves only.
#[derive(Debug, Default)]
struct CreditStats {
    scored: usize,
    total: f64,
    max: f64,
    min: f64,
}

impl CreditStats {
    fn collect(nodes: &[NodeRecord]) -> Self {
        nodes
            .iter()
            .filter_map(scored_credit)
            .fold(None, |acc: Option<Self>, credit| {
                Some(match acc {
                    None => Self {
                        scored: 1,
                        total: credit,
                        max: credit,
                        min: credit,
                    },
                    Some(s) => Self {
                        scored: s.scored + 1,
                        total: s.total + credit,
                        max: s.max.max(credit),
                        min: s.min.min(credit),
                    },
                })
            })
            .unwrap_or_default()
    }
}

/// Totals over accessible leaves that reported resource usage.
#[derive(Debug, Default)]
struct PerformanceStats {
    reporting: usize,
    packets_sent: u64,
    packets_received: u64,
    cpu_total: f64,
    ram_percent_total: f64,
}

impl PerformanceStats {
    fn collect(nodes: &[NodeRecord]) -> Self {
        nodes
            .iter()
            .filter(|n| n.is_accessible)
            .filter_map(|n| n.resource_detail.as_ref())
            .fold(Self::default(), |mut acc, detail: &ResourceDetail| {
                acc.reporting += 1;
                acc.packets_sent = acc.packets_sent.saturating_add(detail.packets_sent);
                acc.packets_received = acc.packets_received.saturating_add(detail.packets_received);
                acc.cpu_total += detail.cpu_usage;
                acc.ram_percent_total += detail.ram_usage_percent();
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{credited, credited_all, leaf, located, with_detail};

    mod empty_tests {
        use super::*;

        #[test]
        fn test_empty_input() {
            let summary = aggregate(&[]);
            assert_eq!(summary, NetworkSummary::default());
            assert!(summary.top_credit_providers.is_empty());
            assert!(summary.country_distribution.is_empty());
            assert!(summary.credit_distribution_by_country.is_empty());
        }

        #[test]
        fn test_zero_committed_storage() {
            let mut node = leaf("a");
            node.storage_committed = 0.0;
            node.storage_used = 0.0;
            let summary = aggregate(&[node]);
            assert_eq!(summary.utilization_rate, 0.0);
            assert_eq!(summary.average_storage_per_pod, 0.0);
        }

        #[test]
        fn test_no_detail_gives_zero_performance() {
            let summary = aggregate(&[leaf("a")]);
            assert_eq!(summary.average_cpu_usage, 0.0);
            assert_eq!(summary.average_ram_usage, 0.0);
            assert_eq!(summary.total_packets_sent, 0);
        }
    }

    mod count_tests {
        use super::*;

        #[test]
        fn test_status_counts() {
            let mut offline = leaf("b");
            offline.last_seen = false;
            offline.is_public = false;
            let mut hidden = leaf("c");
            hidden.is_accessible = false;
            hidden.is_registered = false;

            let summary = aggregate(&[leaf("a"), offline, hidden]);
            assert_eq!(summary.operators, 3);
            assert_eq!(summary.online_count, 1);
            assert_eq!(summary.offline_count, 2);
            assert_eq!(summary.public_count, 2);
            assert_eq!(summary.private_count, 1);
            assert_eq!(summary.accessible_count, 2);
            assert_eq!(summary.registered_count, 2);
        }

        #[test]
        fn test_storage_totals() {
            let mut big = leaf("b");
            big.storage_committed = 300.0;
            big.storage_used = 250.0;
            let summary = aggregate(&[leaf("a"), big]);
            assert_eq!(summary.total_storage_committed, 400.0);
            assert_eq!(summary.total_storage_used, 300.0);
            assert_eq!(summary.average_storage_per_pod, 200.0);
            assert_eq!(summary.utilization_rate, 75.0);
        }
    }

    mod credit_tests {
        use super::*;

        #[test]
        fn test_unscored_excluded_from_stats() {
            let nodes = vec![credited("a", 100.0), credited("b", 300.0), leaf("c")];
            let summary = aggregate(&nodes);
            assert_eq!(summary.total_credits_awarded, 400.0);
            assert_eq!(summary.average_credits_per_pod, 200.0);
            assert_eq!(summary.max_credits, 300.0);
            assert_eq!(summary.min_credits, 100.0);
            assert!(summary.top_credit_providers.iter().all(|e| e.pubkey != "c"));
        }

        #[test]
        fn test_no_scored_leaves() {
            let summary = aggregate(&[leaf("a"), leaf("b")]);
            assert_eq!(summary.max_credits, 0.0);
            assert_eq!(summary.min_credits, 0.0);
            assert_eq!(summary.average_credits_per_pod, 0.0);
        }

        #[test]
        fn test_leaderboard_with_ties() {
            let summary = aggregate(&credited_all(&[500.0, 500.0, 300.0, 100.0]));
            let ranks: Vec<_> = summary.top_credit_providers.iter().map(|e| e.rank).collect();
            assert_eq!(ranks, vec![1, 1, 3]);
        }

        #[test]
        fn test_validator_scope_uses_global_ranks() {
            let network = vec![
                credited("a1", 900.0),
                credited("a2", 850.0),
                credited("a3", 800.0),
                credited("b1", 20.0),
                credited("b2", 10.0),
            ];
            let ranking = rank(&network);

            let local = aggregate_with_ranking(&network[3..], &ranking);
            assert!(local.top_credit_providers.is_empty());
            assert_eq!(local.max_credits, 20.0);

            let top = aggregate_with_ranking(&network[1..3], &ranking);
            let ranks: Vec<_> = top.top_credit_providers.iter().map(|e| e.rank).collect();
            assert_eq!(ranks, vec![2, 3]);
        }
    }

    mod performance_tests {
        use super::*;

        #[test]
        fn test_averages_over_reporting_leaves() {
            let nodes = vec![
                with_detail(leaf("a"), 20.0, 4.0, 8.0),
                with_detail(leaf("b"), 60.0, 2.0, 0.0),
                leaf("c"),
            ];
            let summary = aggregate(&nodes);
            assert_eq!(summary.average_cpu_usage, 40.0);
            assert_eq!(summary.average_ram_usage, 25.0);
            assert_eq!(summary.total_packets_sent, 20);
            assert_eq!(summary.total_packets_received, 40);
            assert_eq!(summary.average_uptime, 99.0);
        }

        #[test]
        fn test_inaccessible_detail_ignored() {
            let mut unreachable = with_detail(leaf("b"), 90.0, 8.0, 8.0);
            unreachable.is_accessible = false;
            let nodes = vec![with_detail(leaf("a"), 30.0, 2.0, 8.0), unreachable];
            let summary = aggregate(&nodes);
            assert_eq!(summary.average_cpu_usage, 30.0);
            assert_eq!(summary.average_ram_usage, 25.0);
            assert_eq!(summary.total_packets_sent, 10);
            assert_eq!(summary.total_packets_received, 20);
        }
    }

    mod determinism_tests {
        use super::*;

        #[test]
        fn test_aggregate_is_idempotent() {
            let nodes = vec![
                located(credited("a", 10.0), "DE", "Germany"),
                located(credited("b", 10.0), "US", "United States"),
                with_detail(located(leaf("c"), "DE", "Germany"), 33.3, 1.0, 3.0),
            ];
            let first = serde_json::to_string(&aggregate(&nodes)).unwrap();
            let second = serde_json::to_string(&aggregate(&nodes)).unwrap();
            assert_eq!(first, second);
        }
    }
}
