//! Weighted log-packet distributor core.
//!
//! Accepts packets of log messages over HTTP and routes each packet, whole,
//! to one of a fixed set of downstream analyzers, aiming to keep each
//! analyzer's share of total message volume close to its configured weight
//! while respecting per-analyzer health.

pub mod config;
pub mod counters;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod ingest;
pub mod packet;
pub mod registry;
pub mod selector;
pub mod sweeper;
