//! Aggregation and ranking backend for a storage-network dashboard.
//!
//! The core is [`ranking::rank`] and [`aggregate::aggregate`]: pure functions
//! over a slice of [`models::NodeRecord`]. The other modules load leaves,
//! keep the current snapshot and serve it over HTTP.

pub mod aggregate;
pub mod analytics;
pub mod data;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod ranking;
pub mod state;
pub mod table;
pub mod validators;

#[cfg(test)]
mod fixtures;
