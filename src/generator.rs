//! Seeded mock leaves for demos and offline runs.
//!
//! Distributions follow what live pnodes report: most are accessible and
//! public, committed storage is 50-550 GB and credits fall in 100-599.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Location, NodeRecord, ResourceDetail};
use crate::validators::VALIDATORS;

struct Country {
    code: &'static str,
    name: &'static str,
    continent: &'static str,
    continent_code: &'static str,
    lat: f64,
    lon: f64,
}

static COUNTRIES: [Country; 10] = [
    Country { code: "US", name: "United States", continent: "North America", continent_code: "NA", lat: 37.0902, lon: -95.7129 },
    Country { code: "DE", name: "Germany", continent: "Europe", continent_code: "EU", lat: 51.1657, lon: 10.4515 },
    Country { code: "JP", name: "Japan", continent: "Asia", continent_code: "AS", lat: 36.2048, lon: 138.2529 },
    Country { code: "GB", name: "United Kingdom", continent: "Europe", continent_code: "EU", lat: 55.3781, lon: -3.4360 },
    Country { code: "SG", name: "Singapore", continent: "Asia", continent_code: "AS", lat: 1.3521, lon: 103.8198 },
    Country { code: "FR", name: "France", continent: "Europe", continent_code: "EU", lat: 46.2276, lon: 2.2137 },
    Country { code: "CA", name: "Canada", continent: "North America", continent_code: "NA", lat: 56.1304, lon: -106.3468 },
    Country { code: "AU", name: "Australia", continent: "Oceania", continent_code: "OC", lat: -25.2744, lon: 133.7751 },
    Country { code: "BR", name: "Brazil", continent: "South America", continent_code: "SA", lat: -14.2350, lon: -51.9253 },
    Country { code: "IN", name: "India", continent: "Asia", continent_code: "AS", lat: 20.5937, lon: 78.9629 },
];

const KEY_SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Deterministic leaf generator; equal seeds give equal leaves.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `per_validator` leaves for every catalog release.
    pub fn generate(&mut self, per_validator: usize) -> Vec<NodeRecord> {
        let mut nodes = Vec::with_capacity(per_validator * VALIDATORS.len());
        for validator in VALIDATORS.iter() {
            for _ in 0..per_validator {
                let index = nodes.len();
                nodes.push(self.leaf(index, validator.version));
            }
        }
        nodes
    }

    /// One leaf; `index` numbers the public key and endpoint.
    pub fn leaf(&mut self, index: usize, version: &str) -> NodeRecord {
        let rng = &mut self.rng;
        let country = &COUNTRIES[rng.gen_range(0..COUNTRIES.len())];
        let location = Location {
            country_code: country.code.to_string(),
            country_name: country.name.to_string(),
            continent_code: country.continent_code.to_string(),
            continent_name: country.continent.to_string(),
            latitude: country.lat + rng.gen_range(-5.0..5.0_f64),
            longitude: country.lon + rng.gen_range(-5.0..5.0_f64),
        };

        let is_accessible = rng.gen_bool(0.85);
        let is_public = rng.gen_bool(0.7);
        let storage_committed = rng.gen_range(50..550) as f64;
        let storage_used = storage_committed * rng.gen_range(0.3..0.9_f64);

        let resource_detail = is_accessible.then(|| {
            let total_ram_available = rng.gen_range(8..32) as f64;
            ResourceDetail {
                cpu_usage: rng.gen_range(20.0..80.0),
                total_ram_available,
                total_ram_used: total_ram_available * rng.gen_range(0.3..0.8_f64),
                total_storage_allocated: storage_used,
                total_storage_size: storage_committed * 1.2,
                packets_sent: rng.gen_range(0..1_000_000),
                packets_received: rng.gen_range(0..1_000_000),
            }
        });

        let suffix: String = (0..4)
            .map(|_| KEY_SUFFIX_CHARS[rng.gen_range(0..KEY_SUFFIX_CHARS.len())] as char)
            .collect();

        NodeRecord {
            pubkey: format!("Provider{:04}...{suffix}", index + 1),
            version: version.to_string(),
            endpoint: Some(format!("https://provider-{}.xandeum.network", index + 1)),
            storage_committed,
            storage_used,
            is_registered: true,
            is_accessible,
            is_public,
            last_seen: true,
            uptime: rng.gen_range(95.0..100.0),
            credit: Some(rng.gen_range(100..600) as f64),
            credit_rank: None,
            location: Some(location),
            resource_detail,
        }
    }
}
