//! Static spatial indexes over encoded nodes and pipe segments
//!
//! Both indexes are bulk-loaded once per check and are read-only afterwards. Entries carry
//! the dense index of the record they were built from, never a domain asset id.

use geo::Rect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

/// A node position tagged with its dense node index
pub type IndexedNode = GeomWithData<[f64; 2], u32>;

/// A segment bounding box tagged with its dense segment index
pub type IndexedSegment = GeomWithData<Rectangle<[f64; 2]>, u32>;

#[inline]
fn rect_to_aabb(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Point index over node positions
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    tree: RTree<IndexedNode>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl NodeIndex {
    /// Bulk-load the index; an empty input gives an empty, queryable index
    pub fn bulk_load(nodes: Vec<IndexedNode>) -> Self {
        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    /// The node closest to `point` in planar coordinates
    #[inline]
    pub fn nearest(&self, point: [f64; 2]) -> Option<(u32, [f64; 2])> {
        self.tree
            .nearest_neighbor(&point)
            .map(|node| (node.data, *node.geom()))
    }

    /// All nodes inside `bbox` (boundary included)
    pub fn within(&self, bbox: &Rect<f64>) -> impl Iterator<Item = (u32, [f64; 2])> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&rect_to_aabb(bbox))
            .map(|node| (node.data, *node.geom()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Rectangle index over segment bounding boxes
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    /// Bulk-load the index; an empty input gives an empty, queryable index
    pub fn bulk_load(segments: Vec<IndexedSegment>) -> Self {
        Self {
            tree: RTree::bulk_load(segments),
        }
    }

    /// Dense indices of all segments whose bounding box overlaps `bbox` (touching counts)
    pub fn overlapping(&self, bbox: &Rect<f64>) -> impl Iterator<Item = u32> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&rect_to_aabb(bbox))
            .map(|segment| segment.data)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Index entry for a segment spanning `start` to `end`
#[inline]
pub fn indexed_segment(index: u32, start: [f64; 2], end: [f64; 2]) -> IndexedSegment {
    GeomWithData::new(Rectangle::from_corners(start, end), index)
}

/// Index entry for a node at `position`
#[inline]
pub fn indexed_node(index: u32, position: [f64; 2]) -> IndexedNode {
    GeomWithData::new(position, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
        Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
    }

    #[test]
    fn test_empty_indexes_are_queryable() {
        let nodes = NodeIndex::bulk_load(Vec::new());
        let segments = SegmentIndex::bulk_load(Vec::new());

        assert!(nodes.is_empty());
        assert!(segments.is_empty());
        assert!(nodes.nearest([0.0, 0.0]).is_none());
        assert_eq!(nodes.within(&rect(-1.0, -1.0, 1.0, 1.0)).count(), 0);
        assert_eq!(segments.overlapping(&rect(-1.0, -1.0, 1.0, 1.0)).count(), 0);
    }

    #[test]
    fn test_nearest_node() {
        let nodes = NodeIndex::bulk_load(vec![
            indexed_node(0, [0.0, 0.0]),
            indexed_node(1, [10.0, 0.0]),
            indexed_node(2, [0.0, 10.0]),
        ]);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.nearest([9.0, 1.0]), Some((1, [10.0, 0.0])));
        assert_eq!(nodes.nearest([1.0, 8.0]), Some((2, [0.0, 10.0])));
    }

    #[test]
    fn test_nodes_within_bbox() {
        let nodes = NodeIndex::bulk_load(vec![
            indexed_node(0, [0.0, 0.0]),
            indexed_node(1, [5.0, 5.0]),
            indexed_node(2, [20.0, 20.0]),
        ]);

        let mut found: Vec<u32> = nodes
            .within(&rect(0.0, 0.0, 5.0, 5.0))
            .map(|(index, _)| index)
            .collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_overlapping_segments() {
        let segments = SegmentIndex::bulk_load(vec![
            indexed_segment(0, [0.0, 0.0], [0.0, 10.0]),
            indexed_segment(1, [-5.0, 5.0], [5.0, 5.0]),
            indexed_segment(2, [100.0, 100.0], [110.0, 100.0]),
        ]);

        // Query with the vertical segment's (zero-width) bounding box
        let mut found: Vec<u32> = segments.overlapping(&rect(0.0, 0.0, 0.0, 10.0)).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }
}
