use crate::{error::Error, metrics::MetricName};
use num_traits::ToPrimitive;
use std::{fmt, str::FromStr, time::Duration};

pub const DEFAULT_SPEED: f64 = 1.0;
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;

/// How joint-angle metrics are measured.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AngleMode {
    /// Interior angle between the two limb segments meeting at a joint.
    Relative,
    /// Angle of the distal segment against a reference axis.
    Fixed,
}

impl Default for AngleMode {
    fn default() -> Self {
        Self::Relative
    }
}

impl FromStr for AngleMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relative" => Ok(Self::Relative),
            "fixed" => Ok(Self::Fixed),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown angle mode {:?}, expected \"relative\" or \"fixed\"",
                other
            ))),
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relative => "relative",
            Self::Fixed => "fixed",
        })
    }
}

/// Reference axis for fixed-mode angles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReferencePlane {
    Horizontal,
    Vertical,
}

impl Default for ReferencePlane {
    fn default() -> Self {
        Self::Horizontal
    }
}

impl FromStr for ReferencePlane {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown reference plane {:?}, expected \"horizontal\" or \"vertical\"",
                other
            ))),
        }
    }
}

impl fmt::Display for ReferencePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}

/// Per-metric toggles. Every metric starts enabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MetricSelection {
    enabled: [bool; MetricName::COUNT],
}

impl Default for MetricSelection {
    fn default() -> Self {
        Self {
            enabled: [true; MetricName::COUNT],
        }
    }
}

impl MetricSelection {
    pub fn none() -> Self {
        Self {
            enabled: [false; MetricName::COUNT],
        }
    }

    #[inline]
    pub fn is_enabled(&self, name: MetricName) -> bool {
        self.enabled[name.idx()]
    }

    pub fn set(&mut self, name: MetricName, enabled: bool) {
        self.enabled[name.idx()] = enabled;
    }

    pub fn enabled(&self) -> impl Iterator<Item = MetricName> + '_ {
        MetricName::ALL
            .iter()
            .copied()
            .filter(move |&name| self.is_enabled(name))
    }
}

/// Playback rate multiplier, always within `[MIN_SPEED, MAX_SPEED]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaybackSpeed(f64);

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self(DEFAULT_SPEED)
    }
}

impl PlaybackSpeed {
    /// Clamp `speed` into the supported range. Non-positive and non-finite
    /// multipliers are rejected.
    pub fn new(speed: f64) -> Result<Self, Error> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "playback speed must be a positive number, got {}",
                speed
            )));
        }
        Ok(Self(speed.clamp(MIN_SPEED, MAX_SPEED)))
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Delay between two frames for a given base interval.
    pub fn frame_delay(self, base_interval: Duration) -> Duration {
        let nanos = (base_interval.as_nanos() as f64 / self.0).round();
        nanos.to_u64().map_or(base_interval, Duration::from_nanos)
    }
}

impl FromStr for PlaybackSpeed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let speed = s.parse::<f64>().map_err(|_| {
            Error::InvalidConfiguration(format!("playback speed is not a number: {:?}", s))
        })?;
        Self::new(speed)
    }
}

/// Session-scoped settings read by every processed frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Settings {
    pub mode: AngleMode,
    pub plane: ReferencePlane,
    pub selection: MetricSelection,
    pub speed: PlaybackSpeed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn parse_mode() {
        assert_eq!("relative".parse::<AngleMode>().unwrap(), AngleMode::Relative);
        assert_eq!("fixed".parse::<AngleMode>().unwrap(), AngleMode::Fixed);
        assert!(matches!(
            "absolute".parse::<AngleMode>(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn parse_plane() {
        assert_eq!(
            "vertical".parse::<ReferencePlane>().unwrap(),
            ReferencePlane::Vertical
        );
        assert!(matches!(
            "diagonal".parse::<ReferencePlane>(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for &mode in [AngleMode::Relative, AngleMode::Fixed].iter() {
            assert_eq!(mode.to_string().parse::<AngleMode>().unwrap(), mode);
        }
    }

    #[test]
    fn speed_is_clamped() {
        assert_approx_eq!(PlaybackSpeed::new(5.0).unwrap().get(), MAX_SPEED);
        assert_approx_eq!(PlaybackSpeed::new(0.1).unwrap().get(), MIN_SPEED);
        assert_approx_eq!(PlaybackSpeed::new(1.5).unwrap().get(), 1.5);
    }

    #[test]
    fn invalid_speed() {
        assert!(PlaybackSpeed::new(0.0).is_err());
        assert!(PlaybackSpeed::new(-1.0).is_err());
        assert!(PlaybackSpeed::new(f64::NAN).is_err());
        assert!("fast".parse::<PlaybackSpeed>().is_err());
    }

    #[test]
    fn frame_delay_scales_with_speed() {
        let base = Duration::from_millis(40);
        assert_eq!(PlaybackSpeed::default().frame_delay(base), base);
        assert_eq!(
            PlaybackSpeed::new(2.0).unwrap().frame_delay(base),
            Duration::from_millis(20)
        );
        assert_eq!(
            PlaybackSpeed::new(0.5).unwrap().frame_delay(base),
            Duration::from_millis(80)
        );
    }

    #[test]
    fn selection_toggles() {
        let mut selection = MetricSelection::default();
        assert_eq!(selection.enabled().count(), MetricName::COUNT);
        selection.set(MetricName::LeftKneeAngle, false);
        assert!(!selection.is_enabled(MetricName::LeftKneeAngle));
        assert!(selection.is_enabled(MetricName::RightKneeAngle));
        assert_eq!(selection.enabled().count(), MetricName::COUNT - 1);
        assert_eq!(MetricSelection::none().enabled().count(), 0);
    }
}
