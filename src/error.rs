use crate::session::SessionState;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to open frame source: {0:?}")]
    SourceUnavailable(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot {op} while session is {state}")]
    InvalidTransition {
        op: &'static str,
        state: SessionState,
    },

    #[cfg(feature = "opencv")]
    #[error("failed to read frame")]
    ReadFrame(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to seek frame source to its first frame")]
    SeekSource(#[source] opencv::Error),

    #[error("failed to read landmarks file: {1:?}")]
    ReadLandmarks(#[source] std::io::Error, PathBuf),

    #[error("failed to parse landmarks on line {1}")]
    ParseLandmarks(#[source] serde_json::Error, usize),

    #[error("expected {expected} landmarks on line {line}, got {got}")]
    LandmarkCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("failed to create output directory: {1:?}")]
    CreateOutputDir(#[source] std::io::Error, PathBuf),

    #[error("failed to create output file: {1:?}")]
    CreateOutputFile(#[source] std::io::Error, PathBuf),

    #[error("failed to write JSON results")]
    WriteJson(#[source] serde_json::Error),

    #[error("failed to write CSV results")]
    WriteCsv(#[source] csv::Error),

    #[error("failed to flush CSV results")]
    FlushCsv(#[source] std::io::Error),

    #[error("failed to convert value to i32")]
    ConvertToI32,

    #[cfg(feature = "opencv")]
    #[error("failed to copy frame")]
    CopyFrame(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to blend overlay into frame")]
    BlendOverlay(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to draw line")]
    DrawLine(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to draw circle")]
    DrawCircle(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to draw ellipse")]
    DrawEllipse(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to draw text")]
    PutText(#[source] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("failed to read video property")]
    ReadProperty(#[source] opencv::Error),
}
