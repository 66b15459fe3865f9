use crate::{
    config::{AngleMode, ReferencePlane},
    error::Error,
    geometry::{axis_angle, joint_angle},
    pose::{LandmarkKind, Landmarks},
};
use std::{fmt, str::FromStr};

/// A metric value: degrees for angles, a normalized distance for symmetry
/// metrics, `None` when the geometry is undefined.
pub type MetricValue = Option<f64>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricName {
    RightKneeAngle,
    LeftKneeAngle,
    RightShoulderAngle,
    LeftShoulderAngle,
    HipSymmetry,
    ShoulderSymmetry,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricKind {
    JointAngle,
    Symmetry,
}

impl MetricName {
    pub const COUNT: usize = 6;

    pub const ALL: [MetricName; Self::COUNT] = [
        MetricName::RightKneeAngle,
        MetricName::LeftKneeAngle,
        MetricName::RightShoulderAngle,
        MetricName::LeftShoulderAngle,
        MetricName::HipSymmetry,
        MetricName::ShoulderSymmetry,
    ];

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn info(self) -> &'static MetricInfo {
        &constants::CATALOG[self.idx()]
    }

    pub fn kind(self) -> MetricKind {
        match self.info().geometry {
            MetricGeometry::Joint(_) => MetricKind::JointAngle,
            MetricGeometry::Symmetry(..) => MetricKind::Symmetry,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.info().key
    }

    pub fn display_name(self) -> &'static str {
        self.info().label
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::InvalidConfiguration(format!("unknown metric {:?}", s)))
    }
}

/// Landmarks a joint angle is measured from. `vertex` is where the angle
/// sits; in fixed mode only the `vertex -> last` segment is used.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JointPoints {
    pub first: LandmarkKind,
    pub vertex: LandmarkKind,
    pub last: LandmarkKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricGeometry {
    Joint(JointPoints),
    /// Left and right landmark of a pair.
    Symmetry(LandmarkKind, LandmarkKind),
}

/// Static description of a metric.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MetricInfo {
    pub name: MetricName,
    pub key: &'static str,
    pub label: &'static str,
    pub geometry: MetricGeometry,
    /// Overlay colour, BGR.
    pub color: (f64, f64, f64),
}

impl MetricInfo {
    pub fn joint_points(&self) -> Option<JointPoints> {
        match self.geometry {
            MetricGeometry::Joint(points) => Some(points),
            MetricGeometry::Symmetry(..) => None,
        }
    }
}

pub mod constants {
    use super::{JointPoints, MetricGeometry, MetricInfo, MetricName};
    use crate::pose::LandmarkKind::*;

    pub static CATALOG: [MetricInfo; MetricName::COUNT] = [
        MetricInfo {
            name: MetricName::RightKneeAngle,
            key: "right_knee_angle",
            label: "Right Knee",
            geometry: MetricGeometry::Joint(JointPoints {
                first: RightHip,
                vertex: RightKnee,
                last: RightAnkle,
            }),
            color: (0.0, 255.0, 0.0),
        },
        MetricInfo {
            name: MetricName::LeftKneeAngle,
            key: "left_knee_angle",
            label: "Left Knee",
            geometry: MetricGeometry::Joint(JointPoints {
                first: LeftHip,
                vertex: LeftKnee,
                last: LeftAnkle,
            }),
            color: (255.0, 0.0, 0.0),
        },
        MetricInfo {
            name: MetricName::RightShoulderAngle,
            key: "right_shoulder_angle",
            label: "Right Shoulder",
            geometry: MetricGeometry::Joint(JointPoints {
                first: RightHip,
                vertex: RightShoulder,
                last: RightElbow,
            }),
            color: (0.0, 215.0, 255.0),
        },
        MetricInfo {
            name: MetricName::LeftShoulderAngle,
            key: "left_shoulder_angle",
            label: "Left Shoulder",
            geometry: MetricGeometry::Joint(JointPoints {
                first: LeftHip,
                vertex: LeftShoulder,
                last: LeftElbow,
            }),
            color: (255.0, 0.0, 255.0),
        },
        MetricInfo {
            name: MetricName::HipSymmetry,
            key: "hip_symmetry",
            label: "Hip Symmetry",
            geometry: MetricGeometry::Symmetry(LeftHip, RightHip),
            color: (255.0, 255.0, 0.0),
        },
        MetricInfo {
            name: MetricName::ShoulderSymmetry,
            key: "shoulder_symmetry",
            label: "Shoulder Symmetry",
            geometry: MetricGeometry::Symmetry(LeftShoulder, RightShoulder),
            color: (0.0, 128.0, 255.0),
        },
    ];
}

/// Values of every catalog metric for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MetricMapping {
    values: [MetricValue; MetricName::COUNT],
}

impl Default for MetricMapping {
    fn default() -> Self {
        Self::undefined()
    }
}

impl MetricMapping {
    pub fn undefined() -> Self {
        Self {
            values: [None; MetricName::COUNT],
        }
    }

    #[inline]
    pub fn get(&self, name: MetricName) -> MetricValue {
        self.values[name.idx()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, MetricValue)> + '_ {
        MetricName::ALL.iter().map(move |&name| (name, self.get(name)))
    }

    pub fn is_undefined(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

fn metric_value(
    landmarks: &Landmarks,
    info: &MetricInfo,
    mode: AngleMode,
    plane: ReferencePlane,
) -> MetricValue {
    match info.geometry {
        MetricGeometry::Joint(JointPoints {
            first,
            vertex,
            last,
        }) => match mode {
            AngleMode::Relative => joint_angle(
                landmarks.get(first),
                landmarks.get(vertex),
                landmarks.get(last),
            ),
            AngleMode::Fixed => axis_angle(landmarks.get(vertex), landmarks.get(last), plane),
        },
        MetricGeometry::Symmetry(left, right) => {
            let delta = (f64::from(landmarks.get(left).y) - f64::from(landmarks.get(right).y)).abs();
            Some(delta).filter(|delta| delta.is_finite())
        }
    }
}

/// Compute every catalog metric for one snapshot. A missing pose yields an
/// all-undefined mapping.
pub fn build_metrics(
    snapshot: Option<&Landmarks>,
    mode: AngleMode,
    plane: ReferencePlane,
) -> MetricMapping {
    let landmarks = match snapshot {
        Some(landmarks) => landmarks,
        None => return MetricMapping::undefined(),
    };
    let mut values = [None; MetricName::COUNT];
    for (value, info) in values.iter_mut().zip(constants::CATALOG.iter()) {
        *value = metric_value(landmarks, info, mode, plane);
    }
    MetricMapping { values }
}
