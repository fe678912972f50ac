//! Derived series for the parallel-scaling charts.

use helper::{self, SORT_ELEMENT_BYTES};
use record::RuntimeRecord;
use std::collections::BTreeSet;

/// Variant name of the idealized projection.
pub const LINEAR_PROJECTION: &str = "(linearly scaling parallel std::sort)";

/// Upper bounds on the core count for the faceted charts; `None` keeps all.
pub const CORE_LIMITS: [(&str, Option<usize>); 4] = [
    ("4cores", Some(4)),
    ("64cores", Some(64)),
    ("128cores", Some(128)),
    ("unlimited", None),
];

/// A runtime at one core count, measured or synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingPoint {
    /// Cores.
    pub core_count: usize,

    /// Variant or derived series name.
    pub variant: String,

    /// Items sorted.
    pub dataset_size: u64,

    /// Average runtime in seconds.
    pub runtime_s: f64,
}

impl ScalingPoint {
    /// Sorted items per second, in millions.
    pub fn million_items_per_s(&self) -> f64 {
        helper::millions(helper::items_per_second(self.dataset_size, self.runtime_s))
    }

    /// Display name of the dataset size.
    pub fn dataset_size_name(&self) -> String {
        helper::dataset_size_name(self.dataset_size, SORT_ELEMENT_BYTES)
    }
}

impl<'a> From<&'a RuntimeRecord> for ScalingPoint {
    fn from(record: &'a RuntimeRecord) -> Self {
        ScalingPoint {
            core_count: record.core_count,
            variant: record.sort_variant.clone(),
            dataset_size: record.dataset_size,
            runtime_s: record.avg_runtime_s,
        }
    }
}

/// All core counts present in `points`, ascending.
pub fn core_counts(points: &[ScalingPoint]) -> Vec<usize> {
    points
        .iter()
        .map(|p| p.core_count)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Repeats every measurement of `variant` at all other core counts, turning
/// the single sequential sample into a flat reference line.
pub fn stretch_sequential(points: &[ScalingPoint], variant: &str) -> Vec<ScalingPoint> {
    let cores = core_counts(points);
    points
        .iter()
        .filter(|p| p.variant == variant)
        .flat_map(|p| {
            cores
                .iter()
                .filter(move |&&c| c != p.core_count)
                .map(move |&c| ScalingPoint {
                    core_count: c,
                    ..p.clone()
                })
        })
        .collect()
}

/// Divides the single-core runtime of `variant` by every core count present,
/// the upper bound a perfectly scaling sort would reach.
pub fn linear_projection(points: &[ScalingPoint], variant: &str, label: &str) -> Vec<ScalingPoint> {
    let cores = core_counts(points);
    points
        .iter()
        .filter(|p| p.variant == variant && p.core_count == 1)
        .flat_map(|p| {
            cores.iter().map(move |&c| ScalingPoint {
                core_count: c,
                variant: label.to_string(),
                dataset_size: p.dataset_size,
                runtime_s: p.runtime_s / c as f64,
            })
        })
        .collect()
}

/// Measured points followed by the stretched and projected series.
pub fn with_derived_series(
    points: Vec<ScalingPoint>,
    sequential: &str,
    parallel: &str,
) -> Vec<ScalingPoint> {
    let stretched = stretch_sequential(&points, sequential);
    let projected = linear_projection(&points, parallel, LINEAR_PROJECTION);
    debug!(
        "{} measured, {} stretched, {} projected points",
        points.len(),
        stretched.len(),
        projected.len()
    );
    let mut all = points;
    all.extend(stretched);
    all.extend(projected);
    all
}

/// Points whose core count does not exceed `limit`.
pub fn within_limit(points: &[ScalingPoint], limit: Option<usize>) -> Vec<ScalingPoint> {
    points
        .iter()
        .filter(|p| limit.map(|l| p.core_count <= l).unwrap_or(true))
        .cloned()
        .collect()
}
