use num_traits::FromPrimitive;

/// Body-point roles, in the order the landmark model emits them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, num_derive::FromPrimitive)]
pub enum LandmarkKind {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkKind {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::from_usize(index)
    }

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }
}

pub const NUM_LANDMARKS: usize = 33;

/// A single detected body point. `x` and `y` are normalized to the frame
/// size, `z` is a relative depth with no unit.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Position in pixel space for a frame of the given size.
    pub fn to_pixel(self, width: f64, height: f64) -> (f64, f64) {
        (f64::from(self.x) * width, f64::from(self.y) * height)
    }
}

/// All landmarks for one frame. A frame without a detected pose is
/// represented by `Option::<Landmarks>::None`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landmarks {
    points: [LandmarkPoint; NUM_LANDMARKS],
}

impl Default for Landmarks {
    fn default() -> Self {
        Self::new([LandmarkPoint::default(); NUM_LANDMARKS])
    }
}

impl Landmarks {
    pub fn new(points: [LandmarkPoint; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    #[inline]
    pub fn get(&self, kind: LandmarkKind) -> LandmarkPoint {
        self.points[kind.idx()]
    }

    pub fn set(&mut self, kind: LandmarkKind, point: LandmarkPoint) {
        self.points[kind.idx()] = point;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LandmarkPoint> {
        self.points.iter()
    }
}

pub mod constants {
    use crate::pose::LandmarkKind::{self, *};

    pub const SKELETON_EDGES: [(LandmarkKind, LandmarkKind); 35] = [
        // face
        (Nose, LeftEyeInner),
        (LeftEyeInner, LeftEye),
        (LeftEye, LeftEyeOuter),
        (LeftEyeOuter, LeftEar),
        (Nose, RightEyeInner),
        (RightEyeInner, RightEye),
        (RightEye, RightEyeOuter),
        (RightEyeOuter, RightEar),
        (MouthLeft, MouthRight),
        // torso
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        // left arm
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftWrist, LeftPinky),
        (LeftWrist, LeftIndex),
        (LeftWrist, LeftThumb),
        (LeftPinky, LeftIndex),
        // right arm
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightWrist, RightPinky),
        (RightWrist, RightIndex),
        (RightWrist, RightThumb),
        (RightPinky, RightIndex),
        // left leg
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (LeftAnkle, LeftHeel),
        (LeftHeel, LeftFootIndex),
        (LeftAnkle, LeftFootIndex),
        // right leg
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
        (RightAnkle, RightHeel),
        (RightHeel, RightFootIndex),
        (RightAnkle, RightFootIndex),
    ];
}
