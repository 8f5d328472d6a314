//! Validator catalog and version bucketing.
//!
//! A validator is a bucket of leaves keyed by software release. Leaves whose
//! version matches no release land in the `custom` bucket.

use serde::Serialize;

use crate::aggregate::aggregate_with_leaderboard;
use crate::models::{NetworkSummary, NodeRecord};
use crate::ranking::Ranking;

/// Bucket key for versions outside the catalog.
pub const CUSTOM_VERSION: &str = "custom";

/// A validator release shown as a cluster in the network graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validator {
    pub name: &'static str,
    pub version: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub docs_link: &'static str,
}

pub static VALIDATORS: [Validator; 5] = [
    Validator {
        name: "Herrenberg",
        version: "1.17.4",
        color: "#FF5733",
        description: "Latest stable release with performance optimizations and enhanced security features.",
        docs_link: "https://docs.xandeum.network/v1.17.4",
    },
    Validator {
        name: "Ingolstadt",
        version: "1.17.3",
        color: "#33FF57",
        description: "Stable release with network stability improvements.",
        docs_link: "https://docs.xandeum.network/v1.17.3",
    },
    Validator {
        name: "Stuttgart",
        version: "1.17.2",
        color: "#3357FF",
        description: "Previous stable release kept for compatibility with legacy systems.",
        docs_link: "https://docs.xandeum.network/v1.17.2",
    },
    Validator {
        name: "Heidelberg",
        version: "1.17.1",
        color: "#F333FF",
        description: "Early adoption release with consensus improvements.",
        docs_link: "https://docs.xandeum.network/v1.17.1",
    },
    Validator {
        name: "Try",
        version: "1.17.0",
        color: "#FF33A8",
        description: "Initial release of the 1.17 series.",
        docs_link: "https://docs.xandeum.network/v1.17.0",
    },
];

/// Bucket for leaves running an unknown version.
pub static CUSTOM_VALIDATOR: Validator = Validator {
    name: "Custom",
    version: CUSTOM_VERSION,
    color: "#6B7280",
    description: "Leaves running a version outside the known releases.",
    docs_link: "",
};

/// Summary of one validator's leaves.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatorSummary {
    pub validator: Validator,
    pub summary: NetworkSummary,
}

/// Leading `major.minor` of a version string, e.g. `"0.7.5-beta"` -> `"0.7"`.
///
/// Strings without that prefix are returned unchanged.
pub fn extract_major_minor(version: &str) -> &str {
    let major_len = version.chars().take_while(|c| c.is_ascii_digit()).count();
    if major_len == 0 || version[major_len..].chars().next() != Some('.') {
        return version;
    }
    let minor_start = major_len + 1;
    let minor_len = version[minor_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if minor_len == 0 {
        return version;
    }
    &version[..minor_start + minor_len]
}

/// Validator bucket for a leaf version.
///
/// A release matches when it equals the version, equals its `major.minor`,
/// or is a prefix of it (trynet builds such as `1.17.4-trynet.2`).
pub fn validator_for_version(version: &str) -> &'static Validator {
    let major_minor = extract_major_minor(version);
    VALIDATORS
        .iter()
        .find(|v| v.version == version || v.version == major_minor || version.starts_with(v.version))
        .unwrap_or(&CUSTOM_VALIDATOR)
}

/// Positions of `nodes` per validator bucket.
///
/// Buckets follow catalog order with `custom` last; empty buckets are left
/// out. Positions stay in input order within a bucket.
fn bucket_positions(nodes: &[NodeRecord]) -> Vec<(&'static Validator, Vec<usize>)> {
    let mut buckets: Vec<(&'static Validator, Vec<usize>)> = VALIDATORS
        .iter()
        .chain(std::iter::once(&CUSTOM_VALIDATOR))
        .map(|v| (v, Vec::new()))
        .collect();
    for (position, node) in nodes.iter().enumerate() {
        let validator = validator_for_version(&node.version);
        if let Some((_, members)) = buckets.iter_mut().find(|(v, _)| v.version == validator.version) {
            members.push(position);
        }
    }
    buckets.retain(|(_, members)| !members.is_empty());
    buckets
}

/// Splits leaves into validator buckets, in the order of [`VALIDATORS`] with
/// `custom` last.
pub fn group_by_validator(nodes: &[NodeRecord]) -> Vec<(&'static Validator, Vec<NodeRecord>)> {
    bucket_positions(nodes)
        .into_iter()
        .map(|(validator, members)| (validator, members.iter().map(|&i| nodes[i].clone()).collect()))
        .collect()
}

/// One summary per non-empty validator, all sharing the network ranking.
///
/// `ranking` must come from `nodes`; leaderboard entries are matched by
/// position, so a key repeated across validators stays with its own record.
pub fn validator_summaries(nodes: &[NodeRecord], ranking: &Ranking) -> Vec<ValidatorSummary> {
    bucket_positions(nodes)
        .into_iter()
        .map(|(validator, members)| {
            let leaves: Vec<NodeRecord> = members.iter().map(|&i| nodes[i].clone()).collect();
            ValidatorSummary {
                validator: *validator,
                summary: aggregate_with_leaderboard(&leaves, ranking.project_positions(&members)),
            }
        })
        .collect()
}
