//! Columnar breakdowns of a snapshot using Polars.

use polars::prelude::*;
use serde::Serialize;

use crate::error::PodVizError;
use crate::models::NodeRecord;

/// Aggregate figures for one group of leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub key: String,
    pub count: usize,
    pub storage_committed: f64,
    pub credits: f64,
}

/// Builds a frame with one row per leaf.
pub fn leaves_frame(nodes: &[NodeRecord]) -> Result<DataFrame, PodVizError> {
    let pubkeys: Vec<&str> = nodes.iter().map(|n| n.pubkey.as_str()).collect();
    let versions: Vec<&str> = nodes.iter().map(|n| n.version.as_str()).collect();
    let continents: Vec<Option<&str>> = nodes
        .iter()
        .map(|n| n.location.as_ref().map(|l| l.continent_name.as_str()))
        .collect();
    let countries: Vec<Option<&str>> = nodes.iter().map(|n| n.country_name()).collect();
    let committed: Vec<f64> = nodes.iter().map(|n| n.storage_committed).collect();
    let used: Vec<f64> = nodes.iter().map(|n| n.storage_used).collect();
    let credits: Vec<Option<f64>> = nodes.iter().map(|n| n.credit).collect();

    let df = df!(
        "pubkey" => pubkeys,
        "version" => versions,
        "continent" => continents,
        "country" => countries,
        "storage_committed" => committed,
        "storage_used" => used,
        "credit" => credits,
    )?;
    Ok(df)
}

/// Groups by `key`, most populated group first, ties by key.
fn breakdown_by(df: &DataFrame, key: &str) -> Result<Vec<Breakdown>, PodVizError> {
    let res = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([
            len().alias("count"),
            col("storage_committed").sum().alias("storage_committed"),
            col("credit").sum().alias("credits"),
        ])
        .sort_by_exprs(
            [col("count"), col(key)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let keys: Vec<String> = res
        .column(key)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    let counts_col = res.column("count")?.cast(&DataType::UInt64)?;
    let counts: Vec<usize> = counts_col
        .u64()?
        .into_iter()
        .map(|v| v.unwrap_or(0) as usize)
        .collect();

    let storage: Vec<f64> = res
        .column("storage_committed")?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    let credits: Vec<f64> = res
        .column("credits")?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    Ok(keys
        .into_iter()
        .zip(counts)
        .zip(storage)
        .zip(credits)
        .map(|(((key, count), storage_committed), credits)| Breakdown {
            key,
            count,
            storage_committed,
            credits,
        })
        .collect())
}

/// Leaves per reported software version.
pub fn version_breakdown(df: &DataFrame) -> Result<Vec<Breakdown>, PodVizError> {
    breakdown_by(df, "version")
}

/// Leaves per continent; leaves without a location are skipped.
pub fn continent_breakdown(df: &DataFrame) -> Result<Vec<Breakdown>, PodVizError> {
    breakdown_by(df, "continent")
}
