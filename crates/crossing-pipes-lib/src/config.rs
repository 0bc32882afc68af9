//! Configuration for a crossing-pipes check

use crate::{CheckError, DetectParams, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default junction tolerance in native coordinate units
pub const DEFAULT_JUNCTION_TOLERANCE: f64 = 0.5;

/// How the distance between an intersection and the nearest node is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceMetric {
    /// Planar distance in the geometry's native units
    #[default]
    Euclidean,
    /// Great-circle distance in meters, coordinates are (longitude, latitude) degrees
    Haversine,
}

/// Where the detection pass runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionMode {
    /// On a dedicated background thread, falling back to inline when it cannot be spawned
    #[default]
    Worker,
    /// On the caller's thread
    Inline,
}

/// Configuration for the crossing check
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CheckConfig {
    /// Intersections closer than or exactly at this distance from a node are treated
    /// as junctions and not reported.
    /// Default: 0.5
    pub junction_tolerance: f64,
    /// Metric used to measure the distance to the nearest node
    pub distance_metric: DistanceMetric,
    /// Execution path for the detection pass (never changes the result)
    pub execution: ExecutionMode,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            junction_tolerance: DEFAULT_JUNCTION_TOLERANCE,
            distance_metric: DistanceMetric::default(),
            execution: ExecutionMode::default(),
        }
    }
}

impl CheckConfig {
    /// Config with the given tolerance and default everything else
    pub fn with_tolerance(junction_tolerance: f64) -> Self {
        Self {
            junction_tolerance,
            ..Self::default()
        }
    }

    /// Reject tolerances that would make every intersection ambiguous
    pub fn validate(&self) -> Result<()> {
        if !self.junction_tolerance.is_finite() || self.junction_tolerance < 0.0 {
            return Err(CheckError::InvalidTolerance(self.junction_tolerance));
        }
        Ok(())
    }

    /// The subset of the config sent to the detector
    #[inline]
    pub fn detect_params(&self) -> DetectParams {
        DetectParams {
            junction_tolerance: self.junction_tolerance,
            distance_metric: self.distance_metric,
        }
    }
}
