//! Binary model encoder
//!
//! Converts a [`Network`] snapshot into fixed-layout record buffers addressed by dense `u32`
//! indices, plus a point index over nodes and a rectangle index over pipe segments. The
//! buffers and indexes are owned by a single [`NetworkBuffers`] value so they can move to a
//! worker thread in one piece; the [`IdLookup`] that maps dense pipe indices back to asset
//! ids stays with the caller.

use crate::spatial::{self, NodeIndex, SegmentIndex};
use crate::{AssetId, AssetKind, Network};
use geo::{Coord, Geometry, Rect};
use std::collections::HashMap;
use std::ops::Index;

/// Encoded node: its position in native coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub position: [f64; 2],
}

/// Encoded pipe: endpoint node indices and the bounding box of its polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeRecord {
    pub start_node: u32,
    pub end_node: u32,
    pub bbox: Rect<f64>,
}

/// Encoded straight sub-section of a pipe polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRecord {
    pub pipe_index: u32,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl SegmentRecord {
    #[inline]
    pub fn bbox(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.start[0],
                y: self.start[1],
            },
            Coord {
                x: self.end[0],
                y: self.end[1],
            },
        )
    }
}

/// Contiguous arena of fixed-size records addressed by dense index
#[derive(Debug, Clone)]
pub struct RecordBuffer<T> {
    records: Vec<T>,
}

impl<T> Default for RecordBuffer<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> RecordBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append a record and return its dense index
    #[inline]
    pub fn push(&mut self, record: T) -> u32 {
        let index = self.records.len() as u32;
        self.records.push(record);
        index
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.records.get(index as usize)
    }

    /// Number of records (the buffer's leading count field)
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records paired with their dense index
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (index as u32, record))
    }
}

impl<T> Index<u32> for RecordBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: u32) -> &T {
        &self.records[index as usize]
    }
}

/// Everything the detector needs, owned in one movable value
#[derive(Debug, Clone, Default)]
pub struct NetworkBuffers {
    pub nodes: RecordBuffer<NodeRecord>,
    pub node_index: NodeIndex,
    pub pipes: RecordBuffer<PipeRecord>,
    pub segments: RecordBuffer<SegmentRecord>,
    pub segment_index: SegmentIndex,
}

/// Dense pipe index → asset id, O(1) reverse lookup
#[derive(Debug, Clone, Default)]
pub struct IdLookup {
    pipe_ids: Vec<AssetId>,
}

impl IdLookup {
    #[inline]
    pub fn pipe_id(&self, pipe_index: u32) -> Option<&AssetId> {
        self.pipe_ids.get(pipe_index as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pipe_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipe_ids.is_empty()
    }
}

/// Counters describing one encoding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub nodes: usize,
    pub pipes: usize,
    pub segments: usize,
    /// Pipes left out because of malformed geometry or unresolved endpoints
    pub skipped_pipes: usize,
}

/// Output of [`encode`]
#[derive(Debug, Clone, Default)]
pub struct EncodedNetwork {
    pub buffers: NetworkBuffers,
    pub id_lookup: IdLookup,
    pub stats: EncodeStats,
}

/// Why a pipe was left out of the encoded buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipeExclusion {
    NotALineString,
    TooFewPoints,
    NonFiniteCoordinate,
    UnresolvedEndpoint,
}

/// Encode every node and every well-formed pipe of `network`
///
/// Node indices are assigned densely in input order, then pipe indices in input order.
/// Malformed pipes are skipped rather than failing the whole run. The spatial indexes are
/// only built when at least two pipes are encoded.
pub fn encode(network: &Network) -> EncodedNetwork {
    #[cfg(feature = "profiling")]
    profiling::scope!("encode::encode");

    let mut nodes = RecordBuffer::with_capacity(network.len());
    let mut indexed_nodes = Vec::with_capacity(network.len());
    let mut node_lookup: HashMap<&AssetId, u32> = HashMap::with_capacity(network.len());

    for asset in network.assets() {
        if asset.is_link() {
            continue;
        }
        let Geometry::Point(point) = &asset.geometry else {
            tracing::debug!("Skipping node {} without point geometry", asset.id);
            continue;
        };
        let position = [point.x(), point.y()];
        if !position.iter().all(|c| c.is_finite()) {
            tracing::debug!("Skipping node {} with non-finite position", asset.id);
            continue;
        }

        let index = nodes.push(NodeRecord { position });
        indexed_nodes.push(spatial::indexed_node(index, position));
        node_lookup.insert(&asset.id, index);
    }

    let mut pipes = RecordBuffer::default();
    let mut segments = RecordBuffer::default();
    let mut indexed_segments = Vec::new();
    let mut pipe_ids = Vec::new();
    let mut skipped_pipes = 0;

    for asset in network.assets() {
        let AssetKind::Pipe { connections, .. } = &asset.kind else {
            continue;
        };

        let coords = match pipe_polyline(&asset.geometry) {
            Ok(coords) => coords,
            Err(reason) => {
                tracing::debug!("Skipping pipe {}: {:?}", asset.id, reason);
                skipped_pipes += 1;
                continue;
            }
        };
        let (Some(&start_node), Some(&end_node)) = (
            node_lookup.get(&connections[0]),
            node_lookup.get(&connections[1]),
        ) else {
            tracing::debug!(
                "Skipping pipe {}: {:?}",
                asset.id,
                PipeExclusion::UnresolvedEndpoint
            );
            skipped_pipes += 1;
            continue;
        };

        let pipe_index = pipes.push(PipeRecord {
            start_node,
            end_node,
            bbox: polyline_bbox(coords),
        });
        pipe_ids.push(asset.id.clone());

        for window in coords.windows(2) {
            let start = [window[0].x, window[0].y];
            let end = [window[1].x, window[1].y];
            if start == end {
                continue;
            }
            let segment_index = segments.push(SegmentRecord {
                pipe_index,
                start,
                end,
            });
            indexed_segments.push(spatial::indexed_segment(segment_index, start, end));
        }
    }

    let stats = EncodeStats {
        nodes: nodes.len(),
        pipes: pipes.len(),
        segments: segments.len(),
        skipped_pipes,
    };
    tracing::debug!(
        "Encoded {} nodes, {} pipes, {} segments ({} pipes skipped)",
        stats.nodes,
        stats.pipes,
        stats.segments,
        stats.skipped_pipes
    );

    // No crossing is possible below two pipes, so both indexes stay empty
    let (node_index, segment_index) = if pipes.len() < 2 {
        (NodeIndex::default(), SegmentIndex::default())
    } else {
        (
            NodeIndex::bulk_load(indexed_nodes),
            SegmentIndex::bulk_load(indexed_segments),
        )
    };

    EncodedNetwork {
        buffers: NetworkBuffers {
            nodes,
            node_index,
            pipes,
            segments,
            segment_index,
        },
        id_lookup: IdLookup { pipe_ids },
        stats,
    }
}

/// The coordinates of a pipe geometry, if it is a usable simple polyline
fn pipe_polyline(geometry: &Geometry<f64>) -> Result<&[Coord<f64>], PipeExclusion> {
    let Geometry::LineString(line) = geometry else {
        return Err(PipeExclusion::NotALineString);
    };
    if line.0.len() < 2 {
        return Err(PipeExclusion::TooFewPoints);
    }
    if !line.0.iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        return Err(PipeExclusion::NonFiniteCoordinate);
    }
    Ok(line.0.as_slice())
}

fn polyline_bbox(coords: &[Coord<f64>]) -> Rect<f64> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for c in coords {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }

    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}
