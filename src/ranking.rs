//! Credit leaderboard with competition ranking.
//!
//! Ranking always runs over the full current set of leaves. Validator views
//! read from that one result through [`Ranking::project`] and never rank again,
//! so a leaf's `credit_rank` is the same in every view.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::models::{LeaderboardEntry, NodeRecord};

/// Lowest rank that still earns a leaderboard place.
pub const PODIUM_PLACES: usize = 3;

/// Result of one global ranking pass.
///
/// Holds a side table from public key to rank instead of writing ranks into
/// the input records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    ranks: HashMap<String, u8>,
    leaderboard: Vec<LeaderboardEntry>,
    /// Index into the ranked slice of the leaf behind each leaderboard entry.
    positions: Vec<usize>,
}

/// Credit used for ranking and credit statistics.
///
/// NaN is treated like a missing score.
pub(crate) fn scored_credit(node: &NodeRecord) -> Option<f64> {
    node.credit.filter(|c| !c.is_nan())
}

/// Ranks leaves by credit.
///
/// Equal credits share a rank and the next distinct credit is ranked one
/// past the number of leaves ahead of it: `[500, 500, 300, 100]` gives
/// `[1, 1, 3, -]`. Leaves without credit are not ranked.
pub fn rank(nodes: &[NodeRecord]) -> Ranking {
    let scored = nodes
        .iter()
        .enumerate()
        .filter_map(|(position, node)| scored_credit(node).map(|credit| (position, node, credit)))
        .sorted_by(|a, b| b.2.total_cmp(&a.2));

    let mut leaderboard = Vec::new();
    let mut positions = Vec::new();
    let mut ahead = 0;
    let groups = scored.chunk_by(|(_, _, credit)| *credit);
    for (credit, group) in &groups {
        let place = ahead + 1;
        if place > PODIUM_PLACES {
            break;
        }
        for (position, node, _) in group {
            ahead += 1;
            positions.push(position);
            leaderboard.push(LeaderboardEntry {
                pubkey: node.pubkey.clone(),
                credit,
                rank: place as u8,
            });
        }
    }

    let mut ranks = HashMap::with_capacity(leaderboard.len());
    for entry in &leaderboard {
        ranks.entry(entry.pubkey.clone()).or_insert(entry.rank);
    }

    Ranking {
        ranks,
        leaderboard,
        positions,
    }
}

impl Ranking {
    pub fn rank_of(&self, pubkey: &str) -> Option<u8> {
        self.ranks.get(pubkey).copied()
    }

    /// Every leaf ranked 1 to 3, ascending by rank, ties in input order.
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Leaderboard entries whose public key appears in `nodes`.
    ///
    /// Use [`Ranking::project_positions`] when `nodes` is a subset of the
    /// ranked slice and keys may repeat.
    pub fn project<'a, I>(&self, nodes: I) -> Vec<LeaderboardEntry>
    where
        I: IntoIterator<Item = &'a NodeRecord>,
    {
        let scope: HashSet<&str> = nodes.into_iter().map(|n| n.pubkey.as_str()).collect();
        self.leaderboard
            .iter()
            .filter(|entry| scope.contains(entry.pubkey.as_str()))
            .cloned()
            .collect()
    }

    /// Leaderboard entries for the leaves at `positions` in the ranked slice.
    pub fn project_positions(&self, positions: &[usize]) -> Vec<LeaderboardEntry> {
        let scope: HashSet<usize> = positions.iter().copied().collect();
        self.leaderboard
            .iter()
            .zip(&self.positions)
            .filter(|(_, position)| scope.contains(position))
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    /// Copies of `nodes` with `credit_rank` taken from this ranking.
    ///
    /// Any rank already present on the input is replaced or cleared.
    pub fn annotate<'a, I>(&self, nodes: I) -> Vec<NodeRecord>
    where
        I: IntoIterator<Item = &'a NodeRecord>,
    {
        nodes
            .into_iter()
            .map(|node| NodeRecord {
                credit_rank: self.rank_of(&node.pubkey),
                ..node.clone()
            })
            .collect()
    }
}
