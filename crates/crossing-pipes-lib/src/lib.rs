//! Crossing Pipes Library - Topology Checks for Water Network Models
//!
//! This library finds unintended pipe-to-pipe crossings in a water network: places where two
//! pipe polylines intersect in space without sharing a modeled junction. Each check is a full
//! batch pass over a read-only snapshot of the network and produces a deterministic, ordered
//! list of crossing reports.
//!
//! # Architecture
//!
//! - **[`Network`]**: Read-only snapshot of node and link assets (the input boundary)
//! - **[`encode`]**: Converts assets into dense record buffers plus two static spatial indexes
//! - **[`detect`]**: Pure crossing detection over the encoded buffers
//! - **[`decode`]**: Maps dense indices back to asset ids and applies the total order
//! - **[`find_crossing_pipes`]**: Runs the whole pipeline, offloading detection to a worker
//!
//! # Performance Characteristics
//!
//! - **Encode Time**: O(S log S) for S segments (bulk-loaded R-trees)
//! - **Detect Time**: O(S × (log S + K)) where K = overlapping candidates per segment
//! - **Memory**: O(N + P + S) for nodes, pipes and segments

pub mod config;
pub mod decode;
pub mod detect;
pub mod dispatch;
pub mod encode;
mod network;
pub mod spatial;
pub mod utils;

// Public API exports
pub use config::{CheckConfig, DistanceMetric, ExecutionMode};
pub use decode::CrossingReport;
pub use detect::{DetectParams, RawCrossing};
pub use dispatch::{find_crossing_pipes, find_crossing_pipes_inline};
pub use encode::{EncodedNetwork, IdLookup, NetworkBuffers};
pub use network::{Asset, AssetId, AssetKind, Network};

/// Error types for the crossing check
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Duplicate asset id: {0}")]
    DuplicateAsset(AssetId),

    #[error("Unknown pipe: {0}")]
    UnknownPipe(String),

    #[error("Invalid junction tolerance: {0}")]
    InvalidTolerance(f64),

    #[error("Detection worker exited without returning results")]
    WorkerDisconnected,
}

pub type Result<T> = std::result::Result<T, CheckError>;
