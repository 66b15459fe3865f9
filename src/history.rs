use crate::{
    export::FrameRecord,
    metrics::{MetricMapping, MetricName, MetricValue},
};
use num_traits::ToPrimitive;
use ordered_float::NotNan;

/// Per-metric history of a session, one entry per processed frame.
///
/// Every catalog metric is recorded on every frame, whether or not it is
/// currently selected, so re-enabling a metric shows its full series.
/// Undefined values are kept as `None` to preserve frame alignment.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    series: [Vec<MetricValue>; MetricName::COUNT],
}

/// Summary of the defined values in one series.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub defined: usize,
    pub total: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, metrics: &MetricMapping) {
        for (name, value) in metrics.iter() {
            self.series[name.idx()].push(value);
        }
    }

    pub fn reset(&mut self) {
        self.series.iter_mut().for_each(Vec::clear);
    }

    /// Number of frames recorded since the last reset.
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn series(&self, name: MetricName) -> &[MetricValue] {
        &self.series[name.idx()]
    }

    pub fn latest(&self, name: MetricName) -> MetricValue {
        self.series(name).last().copied().flatten()
    }

    pub fn stats(&self, name: MetricName) -> Option<SeriesStats> {
        let series = self.series(name);
        let defined = series
            .iter()
            .filter_map(|&value| value.and_then(|value| NotNan::new(value).ok()))
            .collect::<Vec<_>>();
        let min = defined.iter().min()?.into_inner();
        let max = defined.iter().max()?.into_inner();
        let sum = defined.iter().map(|value| value.into_inner()).sum::<f64>();
        Some(SeriesStats {
            min,
            max,
            mean: sum / defined.len().to_f64()?,
            defined: defined.len(),
            total: series.len(),
        })
    }

    /// One record per processed frame, in order.
    pub fn records(&self) -> Vec<FrameRecord> {
        (0..self.len())
            .map(|frame| {
                let value = |name: MetricName| self.series[name.idx()][frame];
                FrameRecord {
                    frame,
                    right_knee_angle: value(MetricName::RightKneeAngle),
                    left_knee_angle: value(MetricName::LeftKneeAngle),
                    right_shoulder_angle: value(MetricName::RightShoulderAngle),
                    left_shoulder_angle: value(MetricName::LeftShoulderAngle),
                    hip_symmetry: value(MetricName::HipSymmetry),
                    shoulder_symmetry: value(MetricName::ShoulderSymmetry),
                }
            })
            .collect()
    }
}
