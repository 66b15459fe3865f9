use crate::{
    config::Settings,
    metrics::{build_metrics, MetricMapping},
    pose::Landmarks,
    source::{Annotator, LandmarkSource},
};
use std::time::{Duration, Instant};
use tracing::trace;

/// Per-frame pipeline: landmarks, metrics, overlay.
pub struct Engine<L, A> {
    landmarks: L,
    annotator: A,
    pub(crate) timing: Timing,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    pub landmarks: Duration,
    pub annotate: Duration,
}

/// What the engine derived from one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub snapshot: Option<Landmarks>,
    pub metrics: MetricMapping,
}

impl<L, A> Engine<L, A> {
    pub fn new(landmarks: L, annotator: A) -> Self {
        Self {
            landmarks,
            annotator,
            timing: Default::default(),
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Detect landmarks in `frame`, compute the metric set and draw the
    /// overlay into `frame`.
    pub fn process<F>(&mut self, index: usize, frame: &mut F, settings: &Settings) -> FrameAnalysis
    where
        L: LandmarkSource<F>,
        A: Annotator<F>,
    {
        let start_landmarks = Instant::now();
        let snapshot = self.landmarks.landmarks(index, frame);
        self.timing.landmarks += start_landmarks.elapsed();

        let metrics = build_metrics(snapshot.as_ref(), settings.mode, settings.plane);
        trace!(index, pose = snapshot.is_some(), ?metrics);

        let start_annotate = Instant::now();
        self.annotator
            .annotate(frame, snapshot.as_ref(), &metrics, settings);
        self.timing.annotate += start_annotate.elapsed();

        FrameAnalysis { snapshot, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AngleMode,
        metrics::{test_support::standing, MetricName},
        source::ReplayLandmarks,
    };
    use std::cell::Cell;

    #[derive(Default)]
    struct Marker {
        calls: Cell<usize>,
    }

    impl Annotator<Vec<&'static str>> for Marker {
        fn annotate(
            &self,
            frame: &mut Vec<&'static str>,
            snapshot: Option<&Landmarks>,
            _metrics: &MetricMapping,
            _settings: &Settings,
        ) {
            self.calls.set(self.calls.get() + 1);
            frame.push(if snapshot.is_some() { "pose" } else { "empty" });
        }
    }

    #[test]
    fn annotates_every_frame() {
        let replay = ReplayLandmarks::new(vec![Some(standing()), None]);
        let mut engine = Engine::new(replay, Marker::default());
        let settings = Settings::default();

        let mut frame = Vec::new();
        let analysis = engine.process(0, &mut frame, &settings);
        assert!(analysis.snapshot.is_some());
        assert!(analysis.metrics.get(MetricName::RightKneeAngle).is_some());

        let analysis = engine.process(1, &mut frame, &settings);
        assert!(analysis.snapshot.is_none());
        assert!(analysis.metrics.is_undefined());

        assert_eq!(frame, vec!["pose", "empty"]);
        assert_eq!(engine.annotator.calls.get(), 2);
    }

    #[test]
    fn settings_apply_per_frame() {
        let replay = ReplayLandmarks::new(vec![Some(standing()); 2]);
        let mut engine = Engine::new(replay, Marker::default());
        let mut settings = Settings::default();
        let mut frame = Vec::new();

        let relative = engine.process(0, &mut frame, &settings).metrics;
        settings.mode = AngleMode::Fixed;
        let fixed = engine.process(1, &mut frame, &settings).metrics;
        assert_ne!(
            relative.get(MetricName::RightKneeAngle),
            fixed.get(MetricName::RightKneeAngle)
        );
    }
}
