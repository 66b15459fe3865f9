use crate::{error::Error, history::Accumulator};
use serde::Serialize;
use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::info;

/// Metric values for one processed frame. Undefined values are serialized as
/// JSON `null` and as empty CSV fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub frame: usize,
    pub right_knee_angle: Option<f64>,
    pub left_knee_angle: Option<f64>,
    pub right_shoulder_angle: Option<f64>,
    pub left_shoulder_angle: Option<f64>,
    pub hip_symmetry: Option<f64>,
    pub shoulder_symmetry: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Both,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown export format {:?}, expected \"json\", \"csv\" or \"both\"",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Both => "both",
        })
    }
}

pub fn write_json<W: io::Write>(writer: W, records: &[FrameRecord]) -> Result<(), Error> {
    serde_json::to_writer_pretty(writer, records).map_err(Error::WriteJson)
}

pub fn write_csv<W: io::Write>(writer: W, records: &[FrameRecord]) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record).map_err(Error::WriteCsv)?;
    }
    writer.flush().map_err(Error::FlushCsv)
}

fn create(path: PathBuf) -> Result<BufWriter<File>, Error> {
    File::create(&path)
        .map(BufWriter::new)
        .map_err(|e| Error::CreateOutputFile(e, path))
}

/// Write the session history into `dir` as `results.json` and/or
/// `results.csv`, creating the directory if needed. Returns the written paths.
pub fn export_to_dir<P>(
    dir: P,
    history: &Accumulator,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, Error>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::CreateOutputDir(e, dir.to_path_buf()))?;

    let records = history.records();
    let mut written = Vec::with_capacity(2);

    if let ExportFormat::Json | ExportFormat::Both = format {
        let path = dir.join("results.json");
        write_json(create(path.clone())?, &records)?;
        written.push(path);
    }

    if let ExportFormat::Csv | ExportFormat::Both = format {
        let path = dir.join("results.csv");
        write_csv(create(path.clone())?, &records)?;
        written.push(path);
    }

    for path in &written {
        info!(message = "results saved", path = %path.display(), frames = records.len());
    }
    Ok(written)
}
