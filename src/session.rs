//! Playback session: owns the frame source, the per-frame pipeline, the
//! metric history and the user-facing settings.
//!
//! The session never schedules itself. A driver calls [`Session::wake`],
//! waits for the delay it returns and calls it again. A wake that arrives
//! while the session is not playing is a no-op, which is how pausing
//! cancels an already scheduled wake.

use crate::{
    config::{AngleMode, PlaybackSpeed, ReferencePlane, Settings},
    engine::{Engine, Timing},
    error::Error,
    history::Accumulator,
    metrics::{MetricMapping, MetricName},
    pose::Landmarks,
    source::{Annotator, FrameSource, LandmarkSource, SourceOpener},
};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loaded,
    Playing,
    Paused,
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        })
    }
}

/// Output of one processed frame, handed to presentation.
#[derive(Debug)]
pub struct FrameReport<F> {
    /// 0-based index of the frame since load or restart.
    pub index: usize,
    /// The annotated frame.
    pub frame: F,
    pub snapshot: Option<Landmarks>,
    pub metrics: MetricMapping,
    /// Delay before the next wake.
    pub next_wake: Duration,
}

#[derive(Debug)]
pub enum Wake<F> {
    Frame(FrameReport<F>),
    /// The stream was exhausted on this wake; the source has been released.
    Ended,
    /// The session was not playing. Nothing happened.
    Idle,
}

pub struct Session<O, L, A>
where
    O: SourceOpener,
{
    opener: O,
    engine: Engine<L, A>,
    source: Option<O::Source>,
    path: Option<PathBuf>,
    state: SessionState,
    settings: Settings,
    history: Accumulator,
    next_index: usize,
    base_interval: Duration,
}

/// Frame type produced by an opener's sources.
pub type FrameOf<O> = <<O as SourceOpener>::Source as FrameSource>::Frame;

impl<O, L, A> Session<O, L, A>
where
    O: SourceOpener,
    L: LandmarkSource<FrameOf<O>>,
    A: Annotator<FrameOf<O>>,
{
    pub fn new(opener: O, landmarks: L, annotator: A) -> Self {
        Self {
            opener,
            engine: Engine::new(landmarks, annotator),
            source: None,
            path: None,
            state: SessionState::Idle,
            settings: Settings::default(),
            history: Accumulator::new(),
            next_index: 0,
            base_interval: DEFAULT_BASE_INTERVAL,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_base_interval(mut self, base_interval: Duration) -> Self {
        self.base_interval = base_interval;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &Accumulator {
        &self.history
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn timing(&self) -> Timing {
        self.engine.timing()
    }

    /// Delay between two frames at the current speed.
    pub fn frame_delay(&self) -> Duration {
        self.settings.speed.frame_delay(self.base_interval)
    }

    fn release(&mut self) {
        if self.source.take().is_some() {
            debug!("released frame source");
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            info!(message = "session state change", from = %self.state, to = %to);
            self.state = to;
        }
    }

    fn invalid(&self, op: &'static str) -> Error {
        Error::InvalidTransition {
            op,
            state: self.state,
        }
    }

    /// Bind a new frame source and start playing it. Any previously held
    /// source is released first, even if opening the new one fails.
    #[instrument(name = "Session::load", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load<P>(&mut self, path: P) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        self.release();
        self.path = None;
        self.transition(SessionState::Idle);

        let source = self.opener.open(path).map_err(|e| {
            warn!(message = "failed to open source", error = %e);
            e
        })?;

        self.source = Some(source);
        self.path = Some(path.to_path_buf());
        self.history.reset();
        self.next_index = 0;
        self.transition(SessionState::Loaded);
        self.play()
    }

    /// Start playback of a loaded source. Resumes a paused session and is a
    /// no-op while already playing.
    pub fn play(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::Loaded => {
                self.transition(SessionState::Playing);
                Ok(())
            }
            SessionState::Paused => self.resume(),
            SessionState::Playing => Ok(()),
            SessionState::Idle | SessionState::Ended => Err(self.invalid("play")),
        }
    }

    pub fn pause(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::Playing => {
                self.transition(SessionState::Paused);
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::Paused => {
                self.transition(SessionState::Playing);
                Ok(())
            }
            _ => Err(self.invalid("resume")),
        }
    }

    /// Seek back to the first frame, clear the history and play. After the
    /// stream has ended the source is opened again from its path.
    #[instrument(name = "Session::restart", skip(self))]
    pub fn restart(&mut self) -> Result<(), Error> {
        let path = match self.path.clone() {
            Some(path) => path,
            None => return Err(self.invalid("restart")),
        };

        match self.source.as_mut() {
            Some(source) => source.rewind()?,
            None => match self.opener.open(&path) {
                Ok(source) => {
                    self.source = Some(source);
                    self.transition(SessionState::Loaded);
                }
                Err(e) => {
                    warn!(message = "failed to reopen source", error = %e);
                    self.path = None;
                    self.transition(SessionState::Idle);
                    return Err(e);
                }
            },
        }

        self.history.reset();
        self.next_index = 0;
        self.transition(SessionState::Playing);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: AngleMode) {
        debug!(%mode, "angle mode changed");
        self.settings.mode = mode;
    }

    pub fn set_plane(&mut self, plane: ReferencePlane) {
        debug!(%plane, "reference plane changed");
        self.settings.plane = plane;
    }

    pub fn set_selection(&mut self, name: MetricName, enabled: bool) {
        debug!(metric = %name, enabled, "metric selection changed");
        self.settings.selection.set(name, enabled);
    }

    /// Set the playback speed, clamped to the supported range. Returns the
    /// speed actually applied.
    pub fn set_speed(&mut self, speed: f64) -> Result<f64, Error> {
        self.settings.speed = PlaybackSpeed::new(speed)?;
        debug!(speed = self.settings.speed.get(), "playback speed changed");
        Ok(self.settings.speed.get())
    }

    /// Run the per-frame loop body once.
    pub fn wake(&mut self) -> Wake<FrameOf<O>> {
        if self.state != SessionState::Playing {
            return Wake::Idle;
        }

        let next = match self.source.as_mut() {
            Some(source) => source.next_frame(),
            None => Ok(None),
        };

        let mut frame = match next {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(message = "end of stream", frames = self.next_index);
                self.release();
                self.transition(SessionState::Ended);
                return Wake::Ended;
            }
            Err(e) => {
                warn!(message = "failed to read frame, ending session", error = %e);
                self.release();
                self.transition(SessionState::Ended);
                return Wake::Ended;
            }
        };

        let index = self.next_index;
        let analysis = self.engine.process(index, &mut frame, &self.settings);
        if analysis.snapshot.is_none() {
            debug!(index, "no pose detected");
        }
        self.history.append(&analysis.metrics);
        self.next_index += 1;

        Wake::Frame(FrameReport {
            index,
            frame,
            snapshot: analysis.snapshot,
            metrics: analysis.metrics,
            next_wake: self.frame_delay(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::test_support::standing,
        source::ReplayLandmarks,
    };
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    /// Frames are their own index, so tests can see which frame came out.
    struct Counter {
        next: usize,
        total: usize,
        released: Rc<RefCell<usize>>,
    }

    impl FrameSource for Counter {
        type Frame = usize;

        fn next_frame(&mut self) -> Result<Option<usize>, Error> {
            if self.next < self.total {
                self.next += 1;
                Ok(Some(self.next - 1))
            } else {
                Ok(None)
            }
        }

        fn rewind(&mut self) -> Result<(), Error> {
            self.next = 0;
            Ok(())
        }
    }

    impl Drop for Counter {
        fn drop(&mut self) {
            *self.released.borrow_mut() += 1;
        }
    }

    #[derive(Default)]
    struct Opener {
        lengths: HashMap<PathBuf, usize>,
        opened: Rc<RefCell<usize>>,
        released: Rc<RefCell<usize>>,
    }

    impl Opener {
        fn with(mut self, path: &str, frames: usize) -> Self {
            self.lengths.insert(PathBuf::from(path), frames);
            self
        }
    }

    impl SourceOpener for Opener {
        type Source = Counter;

        fn open(&mut self, path: &Path) -> Result<Counter, Error> {
            let total = *self
                .lengths
                .get(path)
                .ok_or_else(|| Error::SourceUnavailable(path.to_path_buf()))?;
            *self.opened.borrow_mut() += 1;
            Ok(Counter {
                next: 0,
                total,
                released: self.released.clone(),
            })
        }
    }

    struct NoOverlay;

    impl Annotator<usize> for NoOverlay {
        fn annotate(
            &self,
            _frame: &mut usize,
            _snapshot: Option<&Landmarks>,
            _metrics: &MetricMapping,
            _settings: &Settings,
        ) {
        }
    }

    type TestSession = Session<Opener, ReplayLandmarks, NoOverlay>;

    fn session(opener: Opener) -> TestSession {
        Session::new(opener, ReplayLandmarks::new(vec![Some(standing()); 16]), NoOverlay)
            .with_base_interval(Duration::from_millis(40))
    }

    fn play_frames(session: &mut TestSession, n: usize) -> Vec<usize> {
        (0..n)
            .map(|_| match session.wake() {
                Wake::Frame(report) => report.frame,
                other => panic!("expected a frame, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn load_starts_playing() {
        let mut session = session(Opener::default().with("a.mp4", 5));
        assert_eq!(session.state(), SessionState::Idle);
        session.load("a.mp4").unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.path(), Some(Path::new("a.mp4")));
        assert!(session.history().is_empty());
    }

    #[test]
    fn pause_resume_restart() {
        let mut session = session(Opener::default().with("a.mp4", 10));
        session.load("a.mp4").unwrap();
        assert_eq!(play_frames(&mut session, 3), vec![0, 1, 2]);

        session.pause().unwrap();
        assert!(matches!(session.wake(), Wake::Idle));
        assert_eq!(session.history().len(), 3);

        session.resume().unwrap();
        assert_eq!(play_frames(&mut session, 2), vec![3, 4]);
        assert_eq!(session.history().len(), 5);

        session.restart().unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert!(session.history().is_empty());

        assert_eq!(play_frames(&mut session, 2), vec![0, 1]);
        for &name in MetricName::ALL.iter() {
            assert_eq!(session.history().series(name).len(), 2);
        }
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn stale_wake_after_pause_has_no_effect() {
        let mut session = session(Opener::default().with("a.mp4", 10));
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 1);
        session.pause().unwrap();
        for _ in 0..3 {
            assert!(matches!(session.wake(), Wake::Idle));
        }
        assert_eq!(session.history().len(), 1);
        session.resume().unwrap();
        assert_eq!(play_frames(&mut session, 1), vec![1]);
    }

    #[test]
    fn unopenable_source() {
        let mut session = session(Opener::default());
        assert!(matches!(
            session.load("missing.mp4"),
            Err(Error::SourceUnavailable(_))
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.history().is_empty());
        assert!(session.path().is_none());
    }

    #[test]
    fn failed_load_keeps_history_but_releases_source() {
        let opener = Opener::default().with("a.mp4", 10);
        let released = opener.released.clone();
        let mut session = session(opener);
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 4);

        assert!(session.load("missing.mp4").is_err());
        assert_eq!(*released.borrow(), 1);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.history().len(), 4);
        assert!(matches!(session.wake(), Wake::Idle));
    }

    #[test]
    fn load_replaces_previous_source() {
        let opener = Opener::default().with("a.mp4", 10).with("b.mp4", 2);
        let (opened, released) = (opener.opened.clone(), opener.released.clone());
        let mut session = session(opener);
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 3);

        session.load("b.mp4").unwrap();
        assert_eq!(*opened.borrow(), 2);
        assert_eq!(*released.borrow(), 1);
        assert!(session.history().is_empty());
        assert_eq!(play_frames(&mut session, 2), vec![0, 1]);
    }

    #[test]
    fn end_of_stream_releases_source() {
        let opener = Opener::default().with("a.mp4", 2);
        let released = opener.released.clone();
        let mut session = session(opener);
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 2);

        assert!(matches!(session.wake(), Wake::Ended));
        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(*released.borrow(), 1);
        assert!(matches!(session.wake(), Wake::Idle));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn restart_after_end_reopens() {
        let opener = Opener::default().with("a.mp4", 2);
        let opened = opener.opened.clone();
        let mut session = session(opener);
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 2);
        assert!(matches!(session.wake(), Wake::Ended));

        session.restart().unwrap();
        assert_eq!(*opened.borrow(), 2);
        assert_eq!(session.state(), SessionState::Playing);
        assert!(session.history().is_empty());
        assert_eq!(play_frames(&mut session, 2), vec![0, 1]);
    }

    #[test]
    fn invalid_transitions() {
        let mut session = session(Opener::default().with("a.mp4", 3));
        assert!(matches!(
            session.pause(),
            Err(Error::InvalidTransition {
                op: "pause",
                state: SessionState::Idle
            })
        ));
        assert!(session.resume().is_err());
        assert!(session.restart().is_err());
        assert!(session.play().is_err());

        session.load("a.mp4").unwrap();
        assert!(session.resume().is_err());
        session.play().unwrap();
        session.pause().unwrap();
        assert!(session.pause().is_err());
        session.play().unwrap();
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn settings_apply_to_next_frame_only() {
        let mut session = session(Opener::default().with("a.mp4", 5));
        session.load("a.mp4").unwrap();
        play_frames(&mut session, 1);
        let before = session.history().series(MetricName::RightKneeAngle)[0];

        session.set_mode(AngleMode::Fixed);
        session.set_plane(ReferencePlane::Vertical);
        session.set_selection(MetricName::RightKneeAngle, false);
        play_frames(&mut session, 1);

        let knee = session.history().series(MetricName::RightKneeAngle);
        assert_eq!(knee[0], before);
        assert_ne!(knee[1], before);
        // deselected metrics keep accumulating
        assert_eq!(knee.len(), 2);
        assert!(!session.settings().selection.is_enabled(MetricName::RightKneeAngle));
    }

    #[test]
    fn speed_controls_delay() {
        let mut session = session(Opener::default().with("a.mp4", 5));
        session.load("a.mp4").unwrap();
        assert_eq!(session.set_speed(2.0).unwrap(), 2.0);
        match session.wake() {
            Wake::Frame(report) => assert_eq!(report.next_wake, Duration::from_millis(20)),
            other => panic!("expected a frame, got {:?}", other),
        }
        assert_eq!(session.set_speed(10.0).unwrap(), 2.0);
        assert!(matches!(
            session.set_speed(0.0),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!(session.frame_delay(), Duration::from_millis(20));
    }
}
