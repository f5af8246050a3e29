//! Unichain client library: typed HTTP resource calls and a multiplexed
//! live-update WebSocket channel.

pub mod client;
pub mod config;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

pub use client::UnichainClient;
pub use config::{ClientConfig, Network};
pub use error::ClientError;
