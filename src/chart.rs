//! Series handed to the live chart.

use crate::{
    config::MetricSelection,
    history::Accumulator,
    metrics::{MetricKind, MetricName},
};

pub const ANGLE_RANGE: (f64, f64) = (0.0, 180.0);
pub const SYMMETRY_RANGE: (f64, f64) = (0.0, 1.0);

/// A plottable series: x is the 0-based frame index, y the metric value.
/// Frames where the metric was undefined are left out, producing gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: MetricName,
    pub points: Vec<(usize, f64)>,
    pub y_range: (f64, f64),
}

impl ChartSeries {
    pub fn from_history(history: &Accumulator, name: MetricName) -> Self {
        let points = history
            .series(name)
            .iter()
            .enumerate()
            .filter_map(|(frame, value)| value.map(|value| (frame, value)))
            .collect();
        let y_range = match name.kind() {
            MetricKind::JointAngle => ANGLE_RANGE,
            MetricKind::Symmetry => SYMMETRY_RANGE,
        };
        Self {
            name,
            points,
            y_range,
        }
    }
}

/// Series for every enabled metric.
pub fn chart_series(history: &Accumulator, selection: &MetricSelection) -> Vec<ChartSeries> {
    selection
        .enabled()
        .map(|name| ChartSeries::from_history(history, name))
        .collect()
}
