//! Live state broadcast
//!
//! A [`BroadcastHub`] keeps one latest-value slot per subscriber; the
//! sampling loop publishes into it without ever waiting on the network.
//! [`BroadcastServer`] exposes the hub as a WebSocket endpoint running on
//! its own thread and tokio runtime.

pub mod payload;
pub mod hub;
pub mod server;

pub use payload::{Payload, StickState};
pub use hub::{BroadcastHub, SubscriberId, Subscription};
pub use server::{BroadcastHandle, BroadcastServer};

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Failed to serialize broadcast payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to bind broadcast endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start broadcast runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
