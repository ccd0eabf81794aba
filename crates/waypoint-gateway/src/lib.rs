//! HTTP bindings for the collaborator interfaces consumed by
//! `waypoint-core`: the transaction-submission gateway (with its challenge
//! endpoint) and the indexer's probe endpoint.
//!
//! The tracker itself is wire-agnostic; everything protocol-shaped lives
//! here.

mod config;
mod gateway;
mod indexer;
mod types;

pub use config::EndpointConfig;
pub use gateway::HttpGateway;
pub use indexer::HttpIndexer;
