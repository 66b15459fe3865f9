//! Joint-angle and symmetry metrics over a stream of pose landmarks, with an
//! annotated overlay, a per-session history and result export.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod metrics;
pub mod overlay;
pub mod pose;
#[cfg(feature = "opencv")]
pub mod render;
pub mod session;
pub mod source;
#[cfg(feature = "opencv")]
pub mod video;

pub use config::{AngleMode, MetricSelection, PlaybackSpeed, ReferencePlane, Settings};
pub use error::Error;
pub use metrics::{build_metrics, MetricMapping, MetricName, MetricValue};
pub use pose::{LandmarkKind, LandmarkPoint, Landmarks};
pub use session::{FrameReport, Session, SessionState, Wake};
