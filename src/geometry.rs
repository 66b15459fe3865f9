//! Angle computations over landmark positions.
//!
//! Every function here is total: coincident points, zero-length segments and
//! non-finite coordinates produce `None` instead of an error.

use crate::{config::ReferencePlane, pose::LandmarkPoint};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    /// Image-plane offset from `from` to `to`. Depth is ignored.
    fn between(from: LandmarkPoint, to: LandmarkPoint) -> Self {
        Self {
            x: f64::from(to.x) - f64::from(from.x),
            y: f64::from(to.y) - f64::from(from.y),
        }
    }

    #[inline]
    fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

fn non_degenerate(norm: f64) -> bool {
    norm.is_finite() && norm > 0.0
}

/// Interior angle at `b` between `b -> a` and `b -> c` in the image plane,
/// in degrees within `[0, 180]`.
pub fn joint_angle(a: LandmarkPoint, b: LandmarkPoint, c: LandmarkPoint) -> Option<f64> {
    let ba = Vec2::between(b, a);
    let bc = Vec2::between(b, c);
    let (ba_norm, bc_norm) = (ba.norm(), bc.norm());
    if !non_degenerate(ba_norm) || !non_degenerate(bc_norm) {
        return None;
    }
    // rounding can push the cosine just outside [-1, 1]
    let cosine = (ba.dot(bc) / (ba_norm * bc_norm)).clamp(-1.0, 1.0);
    Some(cosine.acos().to_degrees())
}

/// Angle between the segment `p -> q` and a reference axis, in degrees within
/// `[0, 90]`. The direction of the segment does not matter.
pub fn axis_angle(p: LandmarkPoint, q: LandmarkPoint, plane: ReferencePlane) -> Option<f64> {
    let delta = Vec2::between(p, q);
    if !non_degenerate(delta.norm()) {
        return None;
    }
    let (along, perp) = match plane {
        ReferencePlane::Horizontal => (delta.x.abs(), delta.y.abs()),
        ReferencePlane::Vertical => (delta.y.abs(), delta.x.abs()),
    };
    Some(perp.atan2(along).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn xy(x: f32, y: f32) -> LandmarkPoint {
        LandmarkPoint::new(x, y, 0.0)
    }

    mod joint_angle_tests {
        use super::*;

        #[test]
        fn straight_segment() {
            let angle = joint_angle(xy(0.5, 0.5), xy(0.5, 0.7), xy(0.5, 0.9));
            assert_approx_eq!(angle.unwrap(), 180.0, 1e-4);
        }

        #[test]
        fn right_angle() {
            let angle = joint_angle(xy(0.4, 0.5), xy(0.5, 0.6), xy(0.4, 0.7));
            assert_approx_eq!(angle.unwrap(), 90.0, 1e-3);
        }

        #[test]
        fn symmetric_under_swap() {
            let points = [
                (xy(0.1, 0.2), xy(0.4, 0.4), xy(0.9, 0.3)),
                (xy(0.7, 0.1), xy(0.2, 0.6), xy(0.3, 0.95)),
                (xy(0.33, 0.8), xy(0.5, 0.5), xy(0.61, 0.77)),
            ];
            for &(a, b, c) in points.iter() {
                let forward = joint_angle(a, b, c).unwrap();
                let backward = joint_angle(c, b, a).unwrap();
                assert!((0.0..=180.0).contains(&forward));
                assert_approx_eq!(forward, backward, 1e-9);
            }
        }

        #[test]
        fn coincident_points_are_undefined() {
            let b = xy(0.5, 0.5);
            assert_eq!(joint_angle(b, b, xy(0.1, 0.1)), None);
            assert_eq!(joint_angle(xy(0.1, 0.1), b, b), None);
            assert_eq!(joint_angle(b, b, b), None);
        }

        #[test]
        fn nan_coordinates_are_undefined() {
            let angle = joint_angle(xy(f32::NAN, 0.2), xy(0.5, 0.5), xy(0.9, 0.9));
            assert_eq!(angle, None);
        }

        #[test]
        fn depth_is_ignored() {
            let a = LandmarkPoint::new(0.4, 0.5, 0.9);
            let b = LandmarkPoint::new(0.5, 0.6, -0.3);
            let c = LandmarkPoint::new(0.4, 0.7, 0.0);
            assert_approx_eq!(joint_angle(a, b, c).unwrap(), 90.0, 1e-3);
            // only depth differs: coincident in the image plane
            let d = LandmarkPoint::new(0.5, 0.6, 0.8);
            assert_eq!(joint_angle(d, b, c), None);
        }
    }

    mod axis_angle_tests {
        use super::*;

        #[test]
        fn horizontal_segment() {
            let angle = axis_angle(xy(0.1, 0.5), xy(0.9, 0.5), ReferencePlane::Horizontal);
            assert_approx_eq!(angle.unwrap(), 0.0);
            let angle = axis_angle(xy(0.1, 0.5), xy(0.9, 0.5), ReferencePlane::Vertical);
            assert_approx_eq!(angle.unwrap(), 90.0);
        }

        #[test]
        fn direction_insensitive() {
            let forward = axis_angle(xy(0.2, 0.3), xy(0.6, 0.8), ReferencePlane::Horizontal);
            let backward = axis_angle(xy(0.6, 0.8), xy(0.2, 0.3), ReferencePlane::Horizontal);
            assert_approx_eq!(forward.unwrap(), backward.unwrap(), 1e-9);
        }

        #[test]
        fn complementary() {
            let segments = [
                (xy(0.2, 0.3), xy(0.6, 0.8)),
                (xy(0.9, 0.1), xy(0.3, 0.4)),
                (xy(0.5, 0.5), xy(0.51, 0.9)),
            ];
            for &(p, q) in segments.iter() {
                let horizontal = axis_angle(p, q, ReferencePlane::Horizontal).unwrap();
                let vertical = axis_angle(p, q, ReferencePlane::Vertical).unwrap();
                assert!((0.0..=90.0).contains(&horizontal));
                assert_approx_eq!(horizontal + vertical, 90.0, 1e-9);
            }
        }

        #[test]
        fn forty_five_degrees() {
            let angle = axis_angle(xy(0.0, 0.0), xy(0.5, -0.5), ReferencePlane::Vertical);
            assert_approx_eq!(angle.unwrap(), 45.0);
        }

        #[test]
        fn degenerate_segment() {
            let p = xy(0.4, 0.4);
            assert_eq!(axis_angle(p, p, ReferencePlane::Horizontal), None);
            assert_eq!(axis_angle(p, p, ReferencePlane::Vertical), None);
        }
    }
}
