use crate::{
    config::Settings,
    error::Error,
    metrics::{MetricInfo, MetricMapping, MetricName},
    overlay::{arc_geometry, label_origin, label_text, ArcGeometry, OVERLAY_ALPHA},
    pose::{constants::SKELETON_EDGES, Landmarks},
    source::Annotator,
};
use num_traits::cast::ToPrimitive;
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    imgproc::{self, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};
use tracing::{trace, warn};

const SKELETON_COLOR: (f64, f64, f64) = (0.0, 255.0, 255.0);
const LANDMARK_COLOR: (f64, f64, f64) = (255.0, 255.0, 255.0);

fn scalar((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

fn to_point((x, y): (f64, f64)) -> Result<Point, Error> {
    Ok(Point::new(
        x.round().to_i32().ok_or(Error::ConvertToI32)?,
        y.round().to_i32().ok_or(Error::ConvertToI32)?,
    ))
}

/// Draws the skeleton, one translucent arc per selected joint angle and the
/// angle labels with OpenCV.
#[derive(Debug, Copy, Clone)]
pub struct OverlayRenderer {
    pub alpha: f64,
    pub line_thickness: i32,
    pub landmark_radius: i32,
    pub font_scale: f64,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            alpha: OVERLAY_ALPHA,
            line_thickness: 2,
            landmark_radius: 3,
            font_scale: 0.5,
        }
    }
}

struct Arc {
    info: &'static MetricInfo,
    geometry: Option<ArcGeometry>,
    anchor: (f64, f64),
}

impl OverlayRenderer {
    fn draw_edge(&self, frame: &mut Mat, a: (f64, f64), b: (f64, f64)) -> Result<(), Error> {
        imgproc::line(
            frame,
            to_point(a)?,
            to_point(b)?,
            scalar(SKELETON_COLOR),
            self.line_thickness,
            LINE_8,
            0, // shift
        )
        .map_err(Error::DrawLine)
    }

    fn draw_landmark(&self, frame: &mut Mat, center: (f64, f64)) -> Result<(), Error> {
        imgproc::circle(
            frame,
            to_point(center)?,
            self.landmark_radius,
            scalar(LANDMARK_COLOR),
            FILLED,
            LINE_8,
            0, // shift
        )
        .map_err(Error::DrawCircle)
    }

    /// Edges and dots are drawn independently; one that cannot be drawn is
    /// skipped.
    fn draw_skeleton(&self, frame: &mut Mat, landmarks: &Landmarks) {
        let (width, height) = frame_size(frame);
        let pixel = |kind| landmarks.get(kind).to_pixel(width, height);
        for &(a, b) in SKELETON_EDGES.iter() {
            if let Err(e) = self.draw_edge(frame, pixel(a), pixel(b)) {
                warn!(message = "failed to draw skeleton edge", from = ?a, to = ?b, error = %e);
            }
        }
        for (index, point) in landmarks.iter().enumerate() {
            if let Err(e) = self.draw_landmark(frame, point.to_pixel(width, height)) {
                warn!(message = "failed to draw landmark", index, error = %e);
            }
        }
    }

    fn ellipse(
        &self,
        frame: &mut Mat,
        arc: &ArcGeometry,
        color: Scalar,
        thickness: i32,
    ) -> Result<(), Error> {
        let radius = arc.radius.round().to_i32().ok_or(Error::ConvertToI32)?;
        imgproc::ellipse(
            frame,
            to_point(arc.center)?,
            Size::new(radius, radius),
            0.0, // rotation
            arc.start,
            arc.end,
            color,
            thickness,
            LINE_AA,
            0, // shift
        )
        .map_err(Error::DrawEllipse)
    }

    /// Fill every sector on a copy of the frame, then blend the copy back.
    /// A sector that cannot be drawn is left out of the blend.
    fn draw_sectors(&self, frame: &mut Mat, arcs: &[Arc]) -> Result<(), Error> {
        let mut overlay = frame.try_clone().map_err(Error::CopyFrame)?;
        let mut filled = 0_usize;
        for arc in arcs {
            if let Some(geometry) = &arc.geometry {
                match self.ellipse(&mut overlay, geometry, scalar(arc.info.color), FILLED) {
                    Ok(()) => filled += 1,
                    Err(e) => {
                        warn!(message = "failed to fill angle sector", metric = %arc.info.name, error = %e)
                    }
                }
            }
        }
        if filled == 0 {
            return Ok(());
        }
        let mut blended = Mat::default();
        core::add_weighted(
            &overlay,
            self.alpha,
            &*frame,
            1.0 - self.alpha,
            0.0,
            &mut blended,
            -1,
        )
        .map_err(Error::BlendOverlay)?;
        *frame = blended;
        Ok(())
    }

    fn draw_outline(&self, frame: &mut Mat, arc: &ArcGeometry, color: Scalar) -> Result<(), Error> {
        self.ellipse(frame, arc, color, 1)?;
        for &angle in [arc.start, arc.end].iter() {
            imgproc::line(
                frame,
                to_point(arc.center)?,
                to_point(arc.ray_end(angle))?,
                color,
                1,
                LINE_AA,
                0, // shift
            )
            .map_err(Error::DrawLine)?;
        }
        Ok(())
    }

    fn draw_label(&self, frame: &mut Mat, arc: &Arc, metrics: &MetricMapping) -> Result<(), Error> {
        let name = arc.info.name;
        imgproc::put_text(
            frame,
            &label_text(name, metrics.get(name)),
            to_point(label_origin(arc.anchor))?,
            FONT_HERSHEY_SIMPLEX,
            self.font_scale,
            scalar(arc.info.color),
            2,       // thickness
            LINE_AA, // line_type
            false,   // bottom_left_origin
        )
        .map_err(Error::PutText)
    }
}

fn frame_size(frame: &Mat) -> (f64, f64) {
    (f64::from(frame.cols()), f64::from(frame.rows()))
}

impl Annotator<Mat> for OverlayRenderer {
    fn annotate(
        &self,
        frame: &mut Mat,
        snapshot: Option<&Landmarks>,
        metrics: &MetricMapping,
        settings: &Settings,
    ) {
        let landmarks = match snapshot {
            Some(landmarks) => landmarks,
            None => return,
        };

        self.draw_skeleton(frame, landmarks);

        let (width, height) = frame_size(frame);
        let arcs = MetricName::ALL
            .iter()
            .filter(|&&name| settings.selection.is_enabled(name))
            .filter_map(|&name| {
                let info = name.info();
                let points = info.joint_points()?;
                let geometry =
                    arc_geometry(landmarks, points, settings.mode, settings.plane, width, height);
                if geometry.is_none() {
                    trace!(metric = %name, "degenerate arc geometry");
                }
                Some(Arc {
                    info,
                    geometry,
                    anchor: landmarks.get(points.vertex).to_pixel(width, height),
                })
            })
            .collect::<Vec<_>>();

        if let Err(e) = self.draw_sectors(frame, &arcs) {
            warn!(message = "failed to draw angle sectors", error = %e);
        }

        for arc in &arcs {
            if let Some(geometry) = &arc.geometry {
                if let Err(e) = self.draw_outline(frame, geometry, scalar(arc.info.color)) {
                    warn!(message = "failed to outline arc", metric = %arc.info.name, error = %e);
                }
            }
            if let Err(e) = self.draw_label(frame, arc, metrics) {
                warn!(message = "failed to draw label", metric = %arc.info.name, error = %e);
            }
        }
    }
}
