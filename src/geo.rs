//! Country breakdowns of a set of leaves.

use std::collections::HashMap;

use crate::models::{ratio, CountryCount, CountryCredits, NodeRecord};
use crate::ranking::scored_credit;

/// How many countries each breakdown keeps.
pub const TOP_COUNTRIES: usize = 5;

/// Fallback when a country code cannot be turned into a flag.
const UNKNOWN_FLAG: &str = "🏳️";

/// Offset from an ASCII capital letter to its regional indicator symbol.
const REGIONAL_INDICATOR_OFFSET: u32 = 0x1F1E6 - 'A' as u32;

/// Emoji flag for a two-letter ISO country code, e.g. `"us"` -> 🇺🇸.
pub fn country_flag(code: &str) -> String {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return UNKNOWN_FLAG.to_string();
    }
    code.chars()
        .filter_map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}

/// Running totals for one country, kept in first-seen order.
#[derive(Debug)]
struct CountryTally<'a> {
    name: &'a str,
    code: &'a str,
    count: usize,
    credits: f64,
}

/// Groups leaves by country name, preserving first-seen order.
///
/// The country code of the first leaf seen for a name decides the flag.
fn tally<'a, I>(nodes: I) -> Vec<CountryTally<'a>>
where
    I: IntoIterator<Item = (&'a NodeRecord, f64)>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut tallies: Vec<CountryTally<'a>> = Vec::new();
    for (node, credit) in nodes {
        let Some(location) = node.location.as_ref() else {
            continue;
        };
        let slot = *index.entry(location.country_name.as_str()).or_insert_with(|| {
            tallies.push(CountryTally {
                name: &location.country_name,
                code: &location.country_code,
                count: 0,
                credits: 0.0,
            });
            tallies.len() - 1
        });
        tallies[slot].count += 1;
        tallies[slot].credits += credit;
    }
    tallies
}

/// Top countries by number of leaves. Leaves without a location are skipped.
///
/// Sorting is stable, so countries with equal counts stay in the order they
/// were first seen.
pub fn country_distribution(nodes: &[NodeRecord]) -> Vec<CountryCount> {
    let mut tallies = tally(nodes.iter().map(|n| (n, 0.0)));
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
        .into_iter()
        .take(TOP_COUNTRIES)
        .map(|t| CountryCount {
            country: t.name.to_string(),
            count: t.count,
            flag: country_flag(t.code),
        })
        .collect()
}

/// Top countries by summed credit over scored, located leaves.
pub fn credit_distribution_by_country(nodes: &[NodeRecord]) -> Vec<CountryCredits> {
    let mut tallies = tally(
        nodes
            .iter()
            .filter_map(|n| scored_credit(n).map(|credit| (n, credit))),
    );
    tallies.sort_by(|a, b| b.credits.total_cmp(&a.credits));
    tallies
        .into_iter()
        .take(TOP_COUNTRIES)
        .map(|t| CountryCredits {
            country: t.name.to_string(),
            credits: t.credits,
            flag: country_flag(t.code),
            avg_per_pod: ratio(t.credits, t.count as f64),
        })
        .collect()
}
