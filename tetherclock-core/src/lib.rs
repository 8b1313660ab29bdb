//! Core domain types and persisted configuration for Tetherclock.
//!
//! This crate is dependency-light on purpose: it holds the vocabulary shared
//! by the bridge, applier, sync and daemon crates (devices, offsets, phone
//! snapshots, host clock, cancellation), plus the JSON selection store.

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
