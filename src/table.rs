//! Search, sort and pagination for the leaf table.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::NodeRecord;
use crate::ranking::Ranking;

const DEFAULT_PER_PAGE: usize = 50;
const MAX_PER_PAGE: usize = 100;
const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Credit,
    /// Storage usage percent.
    Storage,
    Uptime,
    Pubkey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters for the leaf table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeafQuery {
    /// Case-insensitive match on public key or country name.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One page of the leaf table.
#[derive(Debug, Clone, Serialize)]
pub struct LeafPage {
    pub leaves: Vec<NodeRecord>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

fn matches(node: &NodeRecord, needle: &str) -> bool {
    node.pubkey.to_lowercase().contains(needle)
        || node
            .country_name()
            .is_some_and(|c| c.to_lowercase().contains(needle))
}

fn compare(a: &NodeRecord, b: &NodeRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Credit => a.credit.unwrap_or(0.0).total_cmp(&b.credit.unwrap_or(0.0)),
        SortKey::Storage => a.usage_percent().total_cmp(&b.usage_percent()),
        SortKey::Uptime => a.uptime.total_cmp(&b.uptime),
        SortKey::Pubkey => a.pubkey.cmp(&b.pubkey),
    }
}

/// Filters, sorts and pages `nodes`.
///
/// Leaves on the returned page carry their global `credit_rank`. Pages past
/// the end clamp to the last page.
pub fn query_leaves(nodes: &[NodeRecord], ranking: &Ranking, query: &LeafQuery) -> LeafPage {
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| q.chars().take(MAX_QUERY_CHARS).collect::<String>().to_lowercase());

    let mut filtered: Vec<&NodeRecord> = nodes
        .iter()
        .filter(|n| needle.as_deref().is_none_or(|needle| matches(n, needle)))
        .collect();

    filtered.sort_by(|a, b| {
        let ord = compare(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = filtered.len();
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let total_pages = total.div_ceil(per_page);
    let page = query.page.unwrap_or(1).max(1).min(total_pages.max(1));

    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    LeafPage {
        leaves: ranking.annotate(filtered[start..end].iter().copied()),
        page,
        per_page,
        total_pages,
        total,
    }
}
