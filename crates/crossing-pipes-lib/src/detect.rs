//! Crossing detection over encoded network buffers
//!
//! The detector walks every encoded segment, asks the segment index for overlapping
//! candidates, and keeps only intersections between different, non-adjacent pipes that lie
//! farther than the junction tolerance from every node. It only ever sees dense indices.

use crate::encode::{NetworkBuffers, PipeRecord, SegmentRecord};
use crate::spatial::NodeIndex;
use crate::{DistanceMetric, utils};
use geo::Line;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Parameters sent along with the buffers to whichever thread runs the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Intersections at or within this distance of a node are not reported
    pub junction_tolerance: f64,
    pub distance_metric: DistanceMetric,
}

/// A crossing addressed by dense pipe indices, `pipe1_index < pipe2_index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCrossing {
    pub pipe1_index: u32,
    pub pipe2_index: u32,
    pub intersection_point: [f64; 2],
    pub distance_to_nearest_junction: f64,
}

/// Node → incident pipes, used to skip pipes that legitimately share an endpoint
struct Adjacency {
    incident: Vec<SmallVec<[u32; 4]>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Adjacency {
    fn build(buffers: &NetworkBuffers) -> Self {
        let mut incident = vec![SmallVec::new(); buffers.nodes.len()];
        for (pipe_index, pipe) in buffers.pipes.iter() {
            incident[pipe.start_node as usize].push(pipe_index);
            if pipe.end_node != pipe.start_node {
                incident[pipe.end_node as usize].push(pipe_index);
            }
        }
        Self { incident }
    }

    /// Whether `other` touches either endpoint of `pipe`
    #[inline]
    fn shares_endpoint(&self, pipe: &PipeRecord, other: u32) -> bool {
        self.incident[pipe.start_node as usize].contains(&other)
            || self.incident[pipe.end_node as usize].contains(&other)
    }
}

/// Find all pipe crossings in the encoded network
///
/// Each unordered pipe pair is reported at most once, at the first qualifying intersection
/// found while scanning segments in encoding order.
pub fn find_crossings(buffers: &NetworkBuffers, params: DetectParams) -> Vec<RawCrossing> {
    #[cfg(feature = "profiling")]
    profiling::scope!("detect::find_crossings");

    if buffers.pipes.len() < 2 {
        return Vec::new();
    }

    let adjacency = Adjacency::build(buffers);
    let mut processed: HashSet<(u32, u32)> = HashSet::new();
    let mut results = Vec::new();
    let mut candidates_tested = 0usize;

    for (segment_index, segment) in buffers.segments.iter() {
        let pipe_a = segment.pipe_index;
        let record_a = &buffers.pipes[pipe_a];

        for candidate_index in buffers.segment_index.overlapping(&segment.bbox()) {
            if candidate_index == segment_index {
                continue;
            }
            let candidate = &buffers.segments[candidate_index];
            let pipe_b = candidate.pipe_index;
            if pipe_b <= pipe_a || processed.contains(&(pipe_a, pipe_b)) {
                continue;
            }
            if adjacency.shares_endpoint(record_a, pipe_b) {
                continue;
            }

            candidates_tested += 1;
            for point in segment_intersections(segment, candidate) {
                let distance =
                    nearest_junction_distance(&buffers.node_index, point, params.distance_metric);
                if distance > params.junction_tolerance {
                    processed.insert((pipe_a, pipe_b));
                    results.push(RawCrossing {
                        pipe1_index: pipe_a,
                        pipe2_index: pipe_b,
                        intersection_point: point,
                        distance_to_nearest_junction: distance,
                    });
                    break;
                }
            }
        }
    }

    tracing::debug!(
        "Tested {} candidate segment pairs across {} segments, found {} crossings",
        candidates_tested,
        buffers.segments.len(),
        results.len()
    );

    results
}

/// Intersection points between two segments
///
/// A proper or touching intersection yields one point; a collinear overlap yields both ends
/// of the shared sub-segment.
fn segment_intersections(a: &SegmentRecord, b: &SegmentRecord) -> SmallVec<[[f64; 2]; 2]> {
    let line_a = Line::new(a.start, a.end);
    let line_b = Line::new(b.start, b.end);

    let mut points = SmallVec::new();
    match line_intersection(line_a, line_b) {
        Some(LineIntersection::SinglePoint { intersection, .. }) => {
            points.push([intersection.x, intersection.y]);
        }
        Some(LineIntersection::Collinear { intersection }) => {
            points.push([intersection.start.x, intersection.start.y]);
            if intersection.end != intersection.start {
                points.push([intersection.end.x, intersection.end.y]);
            }
        }
        None => {}
    }
    points
}

/// Distance from `point` to the closest encoded node, infinite when there are no nodes
pub(crate) fn nearest_junction_distance(
    nodes: &NodeIndex,
    point: [f64; 2],
    metric: DistanceMetric,
) -> f64 {
    let Some((_, nearest)) = nodes.nearest(point) else {
        return f64::INFINITY;
    };
    let planar_nearest = utils::distance(metric, point, nearest);

    match metric {
        DistanceMetric::Euclidean => planar_nearest,
        DistanceMetric::Haversine => {
            // The planar nearest in degrees is not always the nearest in meters, so check
            // every node that could be closer than it, including across the antimeridian.
            utils::haversine_windows(point, planar_nearest * (1.0 + 1e-9))
                .iter()
                .flat_map(|window| nodes.within(window))
                .map(|(_, position)| utils::haversine_distance(point, position))
                .fold(planar_nearest, f64::min)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::spatial::indexed_node;
    use crate::{Asset, Network};

    fn euclidean(junction_tolerance: f64) -> DetectParams {
        DetectParams {
            junction_tolerance,
            distance_metric: DistanceMetric::Euclidean,
        }
    }

    /// Vertical pipe (0,0)-(0,10) and horizontal pipe (-5,5)-(5,5)
    fn create_simple_cross() -> Vec<Asset> {
        vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (0.0, 10.0)),
            Asset::junction("J3", "J3", (-5.0, 5.0)),
            Asset::junction("J4", "J4", (5.0, 5.0)),
            Asset::pipe("P1", "P1", 100.0, "J1", "J2", vec![(0.0, 0.0), (0.0, 10.0)]),
            Asset::pipe("P2", "P2", 100.0, "J3", "J4", vec![(-5.0, 5.0), (5.0, 5.0)]),
        ]
    }

    fn detect(assets: Vec<Asset>, params: DetectParams) -> Vec<RawCrossing> {
        let encoded = encode(&Network::new(assets).unwrap());
        find_crossings(&encoded.buffers, params)
    }

    #[test]
    fn test_simple_cross() {
        let crossings = detect(create_simple_cross(), euclidean(0.5));

        assert_eq!(crossings.len(), 1);
        let crossing = crossings[0];
        assert_eq!((crossing.pipe1_index, crossing.pipe2_index), (0, 1));
        assert!(crossing.intersection_point[0].abs() < 1e-9);
        assert!((crossing.intersection_point[1] - 5.0).abs() < 1e-9);
        assert!(crossing.distance_to_nearest_junction > 4.0);
    }

    #[test]
    fn test_tolerance_boundary_is_exclusive() {
        // Every endpoint is exactly 5 units from the intersection
        assert!(detect(create_simple_cross(), euclidean(5.0)).is_empty());
        assert_eq!(detect(create_simple_cross(), euclidean(4.999)).len(), 1);
    }

    #[test]
    fn test_t_junction_not_reported() {
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (0.0, 10.0)),
            Asset::junction("J3", "J3", (10.0, 10.0)),
            Asset::pipe("A", "A", 100.0, "J1", "J2", vec![(0.0, 0.0), (0.0, 10.0)]),
            Asset::pipe("B", "B", 100.0, "J2", "J3", vec![(0.0, 10.0), (10.0, 10.0)]),
        ];

        assert!(detect(assets, euclidean(0.5)).is_empty());
    }

    #[test]
    fn test_shared_endpoint_suppresses_distant_overlap() {
        // B leaves A's start node, then doubles back across A far from any node
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (100.0, 0.0)),
            Asset::junction("J3", "J3", (80.0, 40.0)),
            Asset::pipe("A", "A", 100.0, "J1", "J2", vec![(0.0, 0.0), (100.0, 0.0)]),
            Asset::pipe(
                "B",
                "B",
                100.0,
                "J1",
                "J3",
                vec![(0.0, 0.0), (50.0, 30.0), (50.0, -30.0), (80.0, 40.0)],
            ),
        ];

        assert!(detect(assets, euclidean(0.5)).is_empty());
    }

    #[test]
    fn test_junction_near_intersection_within_tolerance() {
        // Pipe endpoints are ~100 units out, so J5 is the nearest node at 33 units
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, -95.0)),
            Asset::junction("J2", "J2", (0.0, 105.0)),
            Asset::junction("J3", "J3", (-100.0, 5.0)),
            Asset::junction("J4", "J4", (100.0, 5.0)),
            Asset::junction("J5", "J5", (33.0, 5.0)),
            Asset::pipe("P1", "P1", 100.0, "J1", "J2", vec![(0.0, -95.0), (0.0, 105.0)]),
            Asset::pipe("P2", "P2", 100.0, "J3", "J4", vec![(-100.0, 5.0), (100.0, 5.0)]),
        ];

        assert!(detect(assets.clone(), euclidean(50.0)).is_empty());
        assert!(detect(assets.clone(), euclidean(40.0)).is_empty());

        let crossings = detect(assets, euclidean(0.5));
        assert_eq!(crossings.len(), 1);
        assert!((crossings[0].distance_to_nearest_junction - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_curved_pipe_crossing_on_interior_segment() {
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (0.0, 10.0)),
            Asset::junction("J3", "J3", (-10.0, 2.0)),
            Asset::junction("J4", "J4", (10.0, 8.0)),
            Asset::pipe("Straight", "S", 100.0, "J1", "J2", vec![(0.0, 0.0), (0.0, 10.0)]),
            Asset::pipe(
                "Curved",
                "C",
                100.0,
                "J3",
                "J4",
                vec![(-10.0, 2.0), (-2.0, 2.0), (2.0, 8.0), (10.0, 8.0)],
            ),
        ];

        let crossings = detect(assets, euclidean(0.5));
        assert_eq!(crossings.len(), 1);
        assert_eq!((crossings[0].pipe1_index, crossings[0].pipe2_index), (0, 1));
        assert!(crossings[0].intersection_point[0].abs() < 1e-9);
        assert!((crossings[0].intersection_point[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_intersections_reported_once() {
        // Zig-zag pipe crosses the straight pipe three times
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (100.0, 0.0)),
            Asset::junction("J3", "J3", (10.0, 10.0)),
            Asset::junction("J4", "J4", (70.0, -10.0)),
            Asset::pipe("A", "A", 100.0, "J1", "J2", vec![(0.0, 0.0), (100.0, 0.0)]),
            Asset::pipe(
                "Z",
                "Z",
                100.0,
                "J3",
                "J4",
                vec![(10.0, 10.0), (30.0, -10.0), (50.0, 10.0), (70.0, -10.0)],
            ),
        ];

        assert_eq!(detect(assets, euclidean(0.5)).len(), 1);
    }

    #[test]
    fn test_collinear_overlap_is_reported() {
        let assets = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (20.0, 0.0)),
            Asset::junction("J3", "J3", (10.0, 5.0)),
            Asset::junction("J4", "J4", (40.0, 5.0)),
            Asset::pipe("A", "A", 100.0, "J1", "J2", vec![(0.0, 0.0), (20.0, 0.0)]),
            Asset::pipe(
                "B",
                "B",
                100.0,
                "J3",
                "J4",
                vec![(10.0, 5.0), (10.0, 0.0), (30.0, 0.0), (40.0, 5.0)],
            ),
        ];

        let crossings = detect(assets, euclidean(0.5));
        assert_eq!(crossings.len(), 1);
        assert!(crossings[0].distance_to_nearest_junction > 0.5);
    }

    #[test]
    fn test_trivial_networks() {
        assert!(detect(Vec::new(), euclidean(0.5)).is_empty());

        let nodes_only = vec![
            Asset::junction("J1", "J1", (0.0, 0.0)),
            Asset::junction("J2", "J2", (10.0, 0.0)),
        ];
        assert!(detect(nodes_only.clone(), euclidean(0.5)).is_empty());

        let mut one_pipe = nodes_only;
        one_pipe.push(Asset::pipe("P1", "P1", 100.0, "J1", "J2", vec![(0.0, 0.0), (10.0, 0.0)]));
        assert!(detect(one_pipe, euclidean(0.5)).is_empty());
    }

    #[test]
    fn test_nearest_junction_distance_euclidean() {
        let nodes = NodeIndex::bulk_load(vec![indexed_node(0, [3.0, 4.0])]);

        let d = nearest_junction_distance(&nodes, [0.0, 0.0], DistanceMetric::Euclidean);
        assert_eq!(d, 5.0);

        let empty = NodeIndex::default();
        let d = nearest_junction_distance(&empty, [0.0, 0.0], DistanceMetric::Euclidean);
        assert!(d.is_infinite());
    }

    #[test]
    fn test_nearest_junction_distance_haversine_uses_meters() {
        let point: [f64; 2] = [-0.1278, 51.5074];
        let meters_per_degree = utils::EARTH_RADIUS_M.to_radians();
        let cos_lat = point[1].to_radians().cos();

        // 0.5 m north is closer in degrees, 0.4 m east is closer in meters
        let north = [point[0], point[1] + 0.5 / meters_per_degree];
        let east = [point[0] + 0.4 / (meters_per_degree * cos_lat), point[1]];
        let nodes = NodeIndex::bulk_load(vec![indexed_node(0, north), indexed_node(1, east)]);

        let d = nearest_junction_distance(&nodes, point, DistanceMetric::Haversine);
        assert!((d - 0.4).abs() < 1e-3, "d={}", d);
    }

    #[test]
    fn test_nearest_junction_distance_haversine_across_antimeridian() {
        let meters_per_degree = utils::EARTH_RADIUS_M.to_radians();
        let point: [f64; 2] = [179.99999, 0.0];

        // Just across 180 in meters, but 360 degrees away in planar terms
        let across = [-179.99999, 0.0];
        let north = [179.99999, 100.0 / meters_per_degree];
        let nodes = NodeIndex::bulk_load(vec![indexed_node(0, across), indexed_node(1, north)]);

        let expected = utils::haversine_distance(point, across);
        assert!(expected < 3.0, "expected={}", expected);

        let d = nearest_junction_distance(&nodes, point, DistanceMetric::Haversine);
        assert!((d - expected).abs() < 1e-9, "d={}", d);
    }
}
