//! Text rendering of the current frame's metrics.

use crate::{
    config::MetricSelection,
    metrics::{MetricKind, MetricMapping, MetricName, MetricValue},
    overlay::PLACEHOLDER,
};

/// Format a value for display. Angles outside `[0, 180]` and undefined
/// values render as a placeholder.
pub fn format_value(name: MetricName, value: MetricValue) -> String {
    match (name.kind(), value) {
        (MetricKind::JointAngle, Some(degrees)) if (0.0..=180.0).contains(&degrees) => {
            format!("{:.1}°", degrees)
        }
        (MetricKind::Symmetry, Some(distance)) if distance.is_finite() && distance >= 0.0 => {
            format!("{:.3}", distance)
        }
        _ => PLACEHOLDER.to_owned(),
    }
}

/// One line per displayed metric. Joint angles follow the selection,
/// symmetry metrics are always shown.
pub fn dashboard_lines(metrics: &MetricMapping, selection: &MetricSelection) -> Vec<String> {
    metrics
        .iter()
        .filter(|&(name, _)| name.kind() == MetricKind::Symmetry || selection.is_enabled(name))
        .map(|(name, value)| format!("{}: {}", name.display_name(), format_value(name, value)))
        .collect()
}
