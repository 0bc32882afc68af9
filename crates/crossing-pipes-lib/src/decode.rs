//! Result decoding and ordering
//!
//! Maps detector output back to asset ids and sorts it into a total order that does not
//! depend on scan order or on which thread ran the detector.

use crate::{AssetId, CheckError, IdLookup, Network, RawCrossing, Result};
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A crossing between two pipes, as reported to the caller
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CrossingReport {
    /// The smaller pipe (by diameter, then label)
    pub pipe1: AssetId,
    pub pipe2: AssetId,
    pub intersection_point: [f64; 2],
    pub distance_to_nearest_junction: f64,
}

/// Ordering attributes of one pipe
#[derive(Debug, Clone)]
struct PipeKey {
    id: AssetId,
    diameter: f64,
    /// Lowercased label for case-insensitive comparison
    label: String,
}

impl PipeKey {
    fn resolve(pipe_index: u32, lookup: &IdLookup, network: &Network) -> Result<Self> {
        let id = lookup
            .pipe_id(pipe_index)
            .ok_or_else(|| CheckError::UnknownPipe(format!("#{pipe_index}")))?;
        let asset = network
            .get(id)
            .ok_or_else(|| CheckError::UnknownPipe(id.to_string()))?;

        Ok(Self {
            id: id.clone(),
            diameter: asset.diameter().unwrap_or(0.0),
            label: asset.label.to_lowercase(),
        })
    }

    /// Smaller diameter first, then label, then id
    fn cmp_pair(&self, other: &Self) -> Ordering {
        self.diameter
            .total_cmp(&other.diameter)
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.id.cmp(&other.id))
    }
}

struct Decoded {
    pipe1: PipeKey,
    pipe2: PipeKey,
    raw: RawCrossing,
}

impl Decoded {
    /// `(pipe1.diameter, pipe2.diameter, pipe1.label)`, then the remaining attributes
    fn cmp_reports(&self, other: &Self) -> Ordering {
        self.pipe1
            .diameter
            .total_cmp(&other.pipe1.diameter)
            .then_with(|| self.pipe2.diameter.total_cmp(&other.pipe2.diameter))
            .then_with(|| self.pipe1.label.cmp(&other.pipe1.label))
            .then_with(|| self.pipe2.label.cmp(&other.pipe2.label))
            .then_with(|| self.pipe1.id.cmp(&other.pipe1.id))
            .then_with(|| self.pipe2.id.cmp(&other.pipe2.id))
    }
}

/// Resolve raw crossings to asset ids and apply the report order
///
/// Fails only when a dense index or id does not resolve, which means the lookup and the
/// network are out of sync with the encoded buffers.
pub fn decode(
    raw: Vec<RawCrossing>,
    lookup: &IdLookup,
    network: &Network,
) -> Result<Vec<CrossingReport>> {
    let mut decoded = Vec::with_capacity(raw.len());

    for crossing in raw {
        let first = PipeKey::resolve(crossing.pipe1_index, lookup, network)?;
        let second = PipeKey::resolve(crossing.pipe2_index, lookup, network)?;
        let (pipe1, pipe2) = match first.cmp_pair(&second) {
            Ordering::Greater => (second, first),
            _ => (first, second),
        };
        decoded.push(Decoded {
            pipe1,
            pipe2,
            raw: crossing,
        });
    }

    decoded.sort_by(Decoded::cmp_reports);

    Ok(decoded
        .into_iter()
        .map(|entry| CrossingReport {
            pipe1: entry.pipe1.id,
            pipe2: entry.pipe2.id,
            intersection_point: entry.raw.intersection_point,
            distance_to_nearest_junction: entry.raw.distance_to_nearest_junction,
        })
        .collect())
}
