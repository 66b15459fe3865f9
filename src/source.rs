use crate::{
    config::Settings,
    error::Error,
    metrics::MetricMapping,
    pose::{LandmarkPoint, Landmarks, NUM_LANDMARKS},
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{debug, warn};

/// A stream of raster frames. The source is released when dropped.
pub trait FrameSource {
    type Frame;

    /// Next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Error>;

    /// Seek back to the first frame.
    fn rewind(&mut self) -> Result<(), Error>;
}

/// Opens frame sources by path.
pub trait SourceOpener {
    type Source: FrameSource;

    fn open(&mut self, path: &Path) -> Result<Self::Source, Error>;
}

/// Produces the landmarks for a frame, or `None` when no pose was found.
pub trait LandmarkSource<F> {
    fn landmarks(&mut self, index: usize, frame: &F) -> Option<Landmarks>;
}

/// Draws the overlay for one frame into the frame buffer. Implementations
/// must not fail: anything that cannot be drawn is skipped.
pub trait Annotator<F> {
    fn annotate(
        &self,
        frame: &mut F,
        snapshot: Option<&Landmarks>,
        metrics: &MetricMapping,
        settings: &Settings,
    );
}

/// Landmarks computed ahead of time, replayed by frame index.
///
/// The file format is JSON Lines with one line per frame: either `null` for
/// a frame without a pose, or an array of 33 `[x, y, z]` triples in model
/// order.
#[derive(Debug, Clone, Default)]
pub struct ReplayLandmarks {
    frames: Vec<Option<Landmarks>>,
}

impl ReplayLandmarks {
    pub fn new(frames: Vec<Option<Landmarks>>) -> Self {
        Self { frames }
    }

    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::ReadLandmarks(e, path.to_path_buf()))?;
        Self::parse(BufReader::new(file), path)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        Self::parse(reader, Path::new("-"))
    }

    fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self, Error> {
        let mut frames = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line_number = i + 1;
            let line = line.map_err(|e| Error::ReadLandmarks(e, path.to_path_buf()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let triples = serde_json::from_str::<Option<Vec<[f32; 3]>>>(line)
                .map_err(|e| Error::ParseLandmarks(e, line_number))?;
            let landmarks = match triples {
                Some(triples) => Some(to_landmarks(&triples, line_number)?),
                None => None,
            };
            frames.push(landmarks);
        }
        debug!(message = "loaded landmark replay", path = %path.display(), frames = frames.len());
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn to_landmarks(triples: &[[f32; 3]], line: usize) -> Result<Landmarks, Error> {
    if triples.len() != NUM_LANDMARKS {
        return Err(Error::LandmarkCount {
            line,
            expected: NUM_LANDMARKS,
            got: triples.len(),
        });
    }
    let mut points = [LandmarkPoint::default(); NUM_LANDMARKS];
    for (point, &[x, y, z]) in points.iter_mut().zip(triples) {
        *point = LandmarkPoint::new(x, y, z);
    }
    Ok(Landmarks::new(points))
}

impl<F> LandmarkSource<F> for ReplayLandmarks {
    fn landmarks(&mut self, index: usize, _frame: &F) -> Option<Landmarks> {
        match self.frames.get(index) {
            Some(landmarks) => *landmarks,
            None => {
                warn!(message = "no replayed landmarks for frame", index);
                None
            }
        }
    }
}
