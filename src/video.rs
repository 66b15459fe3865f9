use crate::{
    error::Error,
    source::{FrameSource, SourceOpener},
};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_FRAMES,
    },
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A video file decoded frame by frame with OpenCV.
pub struct VideoFile {
    capture: VideoCapture,
    path: PathBuf,
}

impl VideoFile {
    fn property(&self, prop: i32) -> Result<f64, Error> {
        VideoCaptureTraitConst::get(&self.capture, prop).map_err(Error::ReadProperty)
    }
}

impl FrameSource for VideoFile {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::default();
        let grabbed = self.capture.read(&mut frame).map_err(Error::ReadFrame)?;
        if !grabbed || frame.rows() == 0 {
            debug!(message = "end of video", path = %self.path.display());
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), Error> {
        self.capture
            .set(CAP_PROP_POS_FRAMES, 0.0)
            .map_err(Error::SeekSource)?;
        Ok(())
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => debug!(message = "released video", path = %self.path.display()),
            Err(e) => warn!(message = "failed to release video", path = %self.path.display(), error = %e),
        }
    }
}

/// Opens video files through OpenCV's default backend.
#[derive(Debug, Default, Copy, Clone)]
pub struct VideoOpener;

impl SourceOpener for VideoOpener {
    type Source = VideoFile;

    fn open(&mut self, path: &Path) -> Result<VideoFile, Error> {
        let unavailable = || Error::SourceUnavailable(path.to_path_buf());
        let name = path.to_str().ok_or_else(unavailable)?;

        let capture = VideoCapture::from_file(name, CAP_ANY).map_err(|e| {
            warn!(message = "failed to create video capture", error = %e);
            unavailable()
        })?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(unavailable());
        }

        let video = VideoFile {
            capture,
            path: path.to_path_buf(),
        };
        info!(
            message = "opened video",
            path = %path.display(),
            width = video.property(CAP_PROP_FRAME_WIDTH)?,
            height = video.property(CAP_PROP_FRAME_HEIGHT)?,
            fps = video.property(CAP_PROP_FPS)?,
            frames = video.property(CAP_PROP_FRAME_COUNT)?,
        );
        Ok(video)
    }
}
