//! Frame-space layout of the angle overlay: where each arc sits, how far it
//! sweeps and what its label says. Drawing happens in `render`.

use crate::{
    config::{AngleMode, ReferencePlane},
    metrics::{JointPoints, MetricName, MetricValue},
    pose::{LandmarkPoint, Landmarks},
};

/// Arc radius as a fraction of the `first -> vertex` segment length.
pub const ARC_RADIUS_RATIO: f64 = 0.3;
pub const MIN_ARC_RADIUS: f64 = 12.0;
pub const MAX_ARC_RADIUS: f64 = 90.0;

/// Weight of the filled sector when blended into the frame.
pub const OVERLAY_ALPHA: f64 = 0.25;

/// Label position relative to the arc centre, in pixels.
pub const LABEL_OFFSET: (f64, f64) = (-20.0, 30.0);

pub const PLACEHOLDER: &str = "--";

/// A circular sector in pixel space. Angles are in degrees, measured
/// clockwise from the +x axis (image y grows downwards), with
/// `0 <= start <= end` and `end - start <= 180`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcGeometry {
    pub center: (f64, f64),
    pub radius: f64,
    pub start: f64,
    pub end: f64,
}

impl ArcGeometry {
    pub fn sweep(&self) -> f64 {
        self.end - self.start
    }

    /// Point on the arc boundary at `angle` degrees.
    pub fn ray_end(&self, angle: f64) -> (f64, f64) {
        let (sin, cos) = angle.to_radians().sin_cos();
        (
            self.center.0 + self.radius * cos,
            self.center.1 + self.radius * sin,
        )
    }

    pub fn label_origin(&self) -> (f64, f64) {
        label_origin(self.center)
    }
}

fn direction(from: (f64, f64), to: (f64, f64)) -> Option<f64> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if !length.is_finite() || length == 0.0 {
        return None;
    }
    Some(dy.atan2(dx).to_degrees())
}

/// Wrap an angle difference into `(-180, 180]`.
fn wrap(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped > 180.0 {
        wrapped - 360.0
    } else if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// The axis ray closest to a segment pointing at `segment` degrees.
fn reference_ray(segment: f64, plane: ReferencePlane) -> f64 {
    match plane {
        ReferencePlane::Horizontal if segment.abs() <= 90.0 => 0.0,
        ReferencePlane::Horizontal => 180.0,
        ReferencePlane::Vertical if segment >= 0.0 => 90.0,
        ReferencePlane::Vertical => -90.0,
    }
}

fn arc_radius(first: (f64, f64), vertex: (f64, f64)) -> Option<f64> {
    let length = (first.0 - vertex.0).hypot(first.1 - vertex.1);
    if length.is_finite() {
        Some((length * ARC_RADIUS_RATIO).clamp(MIN_ARC_RADIUS, MAX_ARC_RADIUS))
    } else {
        None
    }
}

/// Lay out the arc for one joint metric on a `width` x `height` frame.
/// Returns `None` when the geometry is degenerate.
pub fn arc_geometry(
    landmarks: &Landmarks,
    points: JointPoints,
    mode: AngleMode,
    plane: ReferencePlane,
    width: f64,
    height: f64,
) -> Option<ArcGeometry> {
    let pixel = |point: LandmarkPoint| point.to_pixel(width, height);
    let first = pixel(landmarks.get(points.first));
    let vertex = pixel(landmarks.get(points.vertex));
    let last = pixel(landmarks.get(points.last));

    let to_last = direction(vertex, last)?;
    let from = match mode {
        AngleMode::Relative => direction(vertex, first)?,
        AngleMode::Fixed => reference_ray(to_last, plane),
    };
    let sweep = wrap(to_last - from);
    let (start, end) = if sweep >= 0.0 {
        (from, from + sweep)
    } else {
        (from + sweep, from)
    };
    let turn = if start < 0.0 { 360.0 } else { 0.0 };

    Some(ArcGeometry {
        center: vertex,
        radius: arc_radius(first, vertex)?,
        start: start + turn,
        end: end + turn,
    })
}

pub fn label_origin(center: (f64, f64)) -> (f64, f64) {
    (center.0 + LABEL_OFFSET.0, center.1 + LABEL_OFFSET.1)
}

/// `"90.0°"`, or `"--°"` for undefined and out-of-range angles.
pub fn format_angle(value: MetricValue) -> String {
    match value {
        Some(degrees) if (0.0..=180.0).contains(&degrees) => format!("{:.1}°", degrees),
        _ => format!("{}°", PLACEHOLDER),
    }
}

pub fn label_text(name: MetricName, value: MetricValue) -> String {
    format!("{}: {}", name.display_name(), format_angle(value))
}
