//! Network snapshot: the read-only view of assets the crossing check consumes
//!
//! This module provides the `Network` struct holding node-like assets (junctions,
//! reservoirs, tanks) and link-like assets (pipes, pumps, valves) with their geometry.

use crate::{CheckError, Result};
use geo::{Coord, Geometry, LineString, Point};
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of an asset in the surrounding domain model
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AssetId(String);

impl AssetId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Asset type with the type-specific properties
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "camelCase")
)]
pub enum AssetKind {
    Junction,
    Reservoir,
    Tank,
    Pipe {
        /// Start and end node ids
        connections: [AssetId; 2],
        /// Internal diameter, in the model's unit system
        diameter: f64,
    },
    Pump {
        connections: [AssetId; 2],
    },
    Valve {
        connections: [AssetId; 2],
    },
}

/// A single asset of the network
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Asset {
    pub id: AssetId,
    /// User-facing label (used for ordering reports)
    pub label: String,
    /// Point geometry for nodes, line string geometry for links
    pub geometry: Geometry<f64>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: AssetKind,
}

impl Asset {
    fn node(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        position: (f64, f64),
        kind: AssetKind,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            geometry: Geometry::Point(Point::new(position.0, position.1)),
            kind,
        }
    }

    fn link(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        coords: Vec<(f64, f64)>,
        kind: AssetKind,
    ) -> Self {
        let coords: Vec<Coord<f64>> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
        Self {
            id: id.into(),
            label: label.into(),
            geometry: Geometry::LineString(LineString::new(coords)),
            kind,
        }
    }

    pub fn junction(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        Self::node(id, label, position, AssetKind::Junction)
    }

    pub fn reservoir(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        position: (f64, f64),
    ) -> Self {
        Self::node(id, label, position, AssetKind::Reservoir)
    }

    pub fn tank(id: impl Into<AssetId>, label: impl Into<String>, position: (f64, f64)) -> Self {
        Self::node(id, label, position, AssetKind::Tank)
    }

    /// Create a pipe whose polyline runs through `coords` (endpoints included)
    pub fn pipe(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        diameter: f64,
        start: impl Into<AssetId>,
        end: impl Into<AssetId>,
        coords: Vec<(f64, f64)>,
    ) -> Self {
        let kind = AssetKind::Pipe {
            connections: [start.into(), end.into()],
            diameter,
        };
        Self::link(id, label, coords, kind)
    }

    pub fn pump(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        start: impl Into<AssetId>,
        end: impl Into<AssetId>,
        coords: Vec<(f64, f64)>,
    ) -> Self {
        let kind = AssetKind::Pump {
            connections: [start.into(), end.into()],
        };
        Self::link(id, label, coords, kind)
    }

    pub fn valve(
        id: impl Into<AssetId>,
        label: impl Into<String>,
        start: impl Into<AssetId>,
        end: impl Into<AssetId>,
        coords: Vec<(f64, f64)>,
    ) -> Self {
        let kind = AssetKind::Valve {
            connections: [start.into(), end.into()],
        };
        Self::link(id, label, coords, kind)
    }

    /// Whether this asset connects two nodes
    #[inline]
    pub fn is_link(&self) -> bool {
        matches!(
            self.kind,
            AssetKind::Pipe { .. } | AssetKind::Pump { .. } | AssetKind::Valve { .. }
        )
    }

    #[inline]
    pub fn is_node(&self) -> bool {
        !self.is_link()
    }

    /// Pipe diameter, `None` for every other asset type
    #[inline]
    pub fn diameter(&self) -> Option<f64> {
        match self.kind {
            AssetKind::Pipe { diameter, .. } => Some(diameter),
            _ => None,
        }
    }
}

/// Read-only snapshot of all assets in a network
#[derive(Clone, Debug, Default)]
pub struct Network {
    /// Assets in input order
    assets: Vec<Asset>,
    /// Position of each asset in `assets`
    by_id: HashMap<AssetId, usize>,
}

impl Network {
    /// Create a network snapshot, rejecting repeated asset ids
    pub fn new(assets: Vec<Asset>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(assets.len());
        for (position, asset) in assets.iter().enumerate() {
            if by_id.insert(asset.id.clone(), position).is_some() {
                return Err(CheckError::DuplicateAsset(asset.id.clone()));
            }
        }
        Ok(Self { assets, by_id })
    }

    #[inline]
    pub fn get(&self, id: &AssetId) -> Option<&Asset> {
        self.by_id.get(id).map(|&position| &self.assets[position])
    }

    /// All assets in input order
    #[inline]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn pipe_count(&self) -> usize {
        self.assets
            .iter()
            .filter(|asset| matches!(asset.kind, AssetKind::Pipe { .. }))
            .count()
    }
}
