use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pose_overlay::{
    chart::chart_series,
    config::{AngleMode, MetricSelection, PlaybackSpeed, ReferencePlane, Settings},
    dashboard::dashboard_lines,
    export::{export_to_dir, ExportFormat},
    metrics::MetricName,
    render::OverlayRenderer,
    session::{FrameReport, Session, SessionState, Wake, DEFAULT_BASE_INTERVAL},
    source::ReplayLandmarks,
    video::VideoOpener,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use structopt::StructOpt;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;

type VideoSession = Session<VideoOpener, ReplayLandmarks, OverlayRenderer>;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Path to the video to analyze.
    #[structopt(required = true)]
    video: PathBuf,

    /// Landmarks for every frame of the video, one JSON line per frame.
    #[structopt(short = "L", long)]
    landmarks: PathBuf,

    /// Angle mode: relative or fixed.
    #[structopt(short, long, default_value = "relative")]
    mode: AngleMode,

    /// Reference plane for fixed angles: horizontal or vertical.
    #[structopt(short, long, default_value = "horizontal")]
    plane: ReferencePlane,

    /// Playback speed multiplier, clamped to [0.5, 2.0].
    #[structopt(long, default_value = "1.0")]
    speed: PlaybackSpeed,

    /// Delay between frames at 1x speed, in milliseconds.
    #[structopt(short, long, default_value = "10")]
    base_interval_ms: u64,

    /// Metric to leave out of the overlay and the chart. Repeatable.
    #[structopt(long = "hide", number_of_values = 1)]
    hidden: Vec<MetricName>,

    /// Directory to write results.json and results.csv into.
    #[structopt(short, long)]
    output_dir: Option<PathBuf>,

    /// Export format: json, csv or both.
    #[structopt(short, long, default_value = "both")]
    format: ExportFormat,

    #[structopt(short = "-W", long, default_value = "1")]
    wait_key_ms: i32,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,
}

enum Control {
    Continue,
    #[cfg_attr(not(feature = "gui"), allow(dead_code))]
    Quit,
}

#[cfg(feature = "gui")]
mod gui {
    use super::{Control, VideoSession};
    use anyhow::{Context, Result};
    use opencv::{core::Mat, highgui};
    use pose_overlay::{
        config::{AngleMode, ReferencePlane},
        metrics::MetricName,
        session::SessionState,
    };
    use std::{convert::TryFrom, time::Duration};
    use tracing::warn;

    const WINDOW: &str = "pose-overlay";
    const ESCAPE: i32 = 27;

    pub(super) fn show(frame: &Mat) -> Result<()> {
        highgui::imshow(WINDOW, frame).context("failed to show frame")
    }

    /// Wait for a key press for at most `delay` and apply it to the session.
    pub(super) fn handle_keys(
        session: &mut VideoSession,
        delay: Duration,
        wait_key_ms: i32,
    ) -> Result<Control> {
        let delay_ms = i32::try_from(delay.as_millis())
            .unwrap_or(i32::MAX)
            .max(wait_key_ms)
            .max(1);
        let key = highgui::wait_key(delay_ms).context("failed waiting for key")?;
        if key < 0 {
            return Ok(Control::Continue);
        }

        let result = match u8::try_from(key & 0xff).map(char::from) {
            Ok('q') => return Ok(Control::Quit),
            _ if key == ESCAPE => return Ok(Control::Quit),
            Ok(' ') if session.state() == SessionState::Paused => session.resume(),
            Ok(' ') => session.pause(),
            Ok('r') => session.restart(),
            Ok('m') => {
                session.set_mode(match session.settings().mode {
                    AngleMode::Relative => AngleMode::Fixed,
                    AngleMode::Fixed => AngleMode::Relative,
                });
                Ok(())
            }
            Ok('p') => {
                session.set_plane(match session.settings().plane {
                    ReferencePlane::Horizontal => ReferencePlane::Vertical,
                    ReferencePlane::Vertical => ReferencePlane::Horizontal,
                });
                Ok(())
            }
            Ok(digit @ '1'..='6') => {
                let name = MetricName::ALL[usize::from(digit as u8 - b'1')];
                let enabled = session.settings().selection.is_enabled(name);
                session.set_selection(name, !enabled);
                Ok(())
            }
            Ok('+') => session.set_speed(session.settings().speed.get() * 1.25).map(drop),
            Ok('-') => session.set_speed(session.settings().speed.get() / 1.25).map(drop),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!(message = "ignored key", key, error = %e);
        }
        Ok(Control::Continue)
    }
}

#[cfg(not(feature = "gui"))]
mod gui {
    use super::{Control, VideoSession};
    use anyhow::Result;
    use opencv::core::Mat;
    use std::time::Duration;

    pub(super) fn show(_frame: &Mat) -> Result<()> {
        Ok(())
    }

    pub(super) fn handle_keys(
        _session: &mut VideoSession,
        delay: Duration,
        _wait_key_ms: i32,
    ) -> Result<Control> {
        std::thread::sleep(delay);
        Ok(Control::Continue)
    }
}

fn present(
    report: &FrameReport<opencv::core::Mat>,
    selection: &MetricSelection,
    progress: Option<&ProgressBar>,
) -> Result<()> {
    let dashboard = dashboard_lines(&report.metrics, selection).join(" | ");
    match progress {
        Some(progress) => {
            progress.set_message(format!("frame {} | {}", report.index, dashboard));
            progress.inc(1);
        }
        None => debug!(frame = report.index, %dashboard),
    }
    gui::show(&report.frame)
}

fn summarize(session: &VideoSession) {
    let history = session.history();
    for series in chart_series(history, &session.settings().selection) {
        match history.stats(series.name) {
            Some(stats) => info!(
                message = "metric summary",
                metric = %series.name,
                defined = stats.defined,
                frames = stats.total,
                min = stats.min,
                max = stats.max,
                mean = stats.mean,
            ),
            None => info!(message = "metric never defined", metric = %series.name),
        }
    }

    let timing = session.timing();
    info!(
        message = "time spent per stage",
        landmarks_ms = timing.landmarks.as_secs_f64() * 1000.0,
        annotate_ms = timing.annotate.as_secs_f64() * 1000.0,
    );
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let landmarks = ReplayLandmarks::from_path(&opt.landmarks)
        .with_context(|| format!("failed to load landmarks from {}", opt.landmarks.display()))?;

    let mut selection = MetricSelection::default();
    for &name in &opt.hidden {
        selection.set(name, false);
    }
    let settings = Settings {
        mode: opt.mode,
        plane: opt.plane,
        selection,
        speed: opt.speed,
    };
    let base_interval = if opt.base_interval_ms == 0 {
        DEFAULT_BASE_INTERVAL
    } else {
        Duration::from_millis(opt.base_interval_ms)
    };

    let mut session = Session::new(VideoOpener, landmarks, OverlayRenderer::default())
        .with_settings(settings)
        .with_base_interval(base_interval);
    session
        .load(&opt.video)
        .with_context(|| format!("failed to load {}", opt.video.display()))?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    while running.load(Ordering::SeqCst) {
        let delay = match session.wake() {
            Wake::Frame(report) => {
                present(&report, &session.settings().selection, progress.as_ref())
                    .context("failed presenting frame")?;
                report.next_wake
            }
            Wake::Ended if cfg!(feature = "gui") => {
                info!("video finished, press r to restart or q to quit");
                session.frame_delay()
            }
            Wake::Ended => break,
            Wake::Idle => session.frame_delay(),
        };

        if let Control::Quit = gui::handle_keys(&mut session, delay, opt.wait_key_ms)? {
            break;
        }
    }

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    if session.state() != SessionState::Ended {
        debug!(state = %session.state(), "stopped before the end of the video");
    }

    summarize(&session);

    if let Some(dir) = &opt.output_dir {
        if session.history().is_empty() {
            warn!("no frames processed, nothing to export");
        } else {
            export_to_dir(dir, session.history(), opt.format)
                .with_context(|| format!("failed exporting results to {}", dir.display()))?;
        }
    }

    Ok(())
}
