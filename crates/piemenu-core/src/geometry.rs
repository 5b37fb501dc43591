//! Angles and planar vectors in screen space.
//!
//! Directions are degrees with 0 = East growing counterclockwise, while screen y grows
//! downwards, so the unit vector for a direction is `(cos, -sin)`.

use crate::error::PieError;
use derive_more::{Add, Sub};
use serde::Deserialize;
use serde_with::DeserializeFromStr;
use std::str::FromStr;
use strum::EnumString;

#[derive(Debug, Clone, Copy, PartialEq, Default, Add, Sub)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        offset_to_distance(self.x, self.y)
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box of `size` centered on `center`, with the half-size margins rounded to whole units.
    pub fn around(center: Point, size: Size) -> Self {
        let left = center.x + round_half_up(size.width / -2.0);
        let top = center.y + round_half_up(size.height / -2.0);
        Self::new(left, top, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn translate(&self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    pub fn union(&self, other: &Rect) -> Self {
        let (x, y) = (self.x.min(other.x), self.y.min(other.y));
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }
}

pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Wraps any angle into `[0, 360)`.
pub fn normal_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Integer-degree bucket used to detect two slices pointing the same way.
pub fn direction_bucket(deg: f64) -> i32 {
    normal_deg(deg).floor() as i32
}

pub fn offset_to_direction_deg(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    normal_deg(rad_to_deg((-dy).atan2(dx)))
}

pub fn offset_to_distance(dx: f64, dy: f64) -> f64 {
    dx.hypot(dy)
}

pub fn direction_vector(deg: f64) -> Point {
    let rad = deg_to_rad(deg);
    Point::new(rad.cos(), -rad.sin())
}

/// Rotation that lays a label along `deg` without ever rendering it upside down.
pub fn readable_rotation_deg(deg: f64) -> f64 {
    let deg = normal_deg(deg);
    if deg == 90.0 || deg == 270.0 {
        0.0
    } else if deg == 0.0 {
        90.0
    } else if deg == 180.0 {
        -90.0
    } else if deg > 90.0 && deg < 270.0 {
        normal_deg(deg + 180.0)
    } else {
        deg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Direction {
    #[strum(serialize = "East", serialize = "Right", serialize = "e")]
    East,
    #[strum(serialize = "NorthEast", serialize = "ne")]
    NorthEast,
    #[strum(serialize = "North", serialize = "Up", serialize = "n")]
    North,
    #[strum(serialize = "NorthWest", serialize = "nw")]
    NorthWest,
    #[strum(serialize = "West", serialize = "Left", serialize = "w")]
    West,
    #[strum(serialize = "SouthWest", serialize = "sw")]
    SouthWest,
    #[strum(serialize = "South", serialize = "Down", serialize = "s")]
    South,
    #[strum(serialize = "SouthEast", serialize = "se")]
    SouthEast,
}

impl Direction {
    pub fn degrees(self) -> f64 {
        match self {
            Self::East => 0.0,
            Self::NorthEast => 45.0,
            Self::North => 90.0,
            Self::NorthWest => 135.0,
            Self::West => 180.0,
            Self::SouthWest => 225.0,
            Self::South => 270.0,
            Self::SouthEast => 315.0,
        }
    }
}

/// How a direction may be written: degrees, a compass name, or a `[dx, dy]` screen offset.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawDirection")]
pub enum DirectionSpec {
    Degrees(f64),
    Named(Direction),
    Vector(f64, f64),
}

impl DirectionSpec {
    /// Normalized degrees, or `None` when the value names no usable direction.
    pub fn degrees(&self) -> Option<f64> {
        let deg = match *self {
            Self::Degrees(d) => d,
            Self::Named(dir) => dir.degrees(),
            Self::Vector(dx, dy) => offset_to_direction_deg(dx, dy),
        };
        deg.is_finite().then(|| normal_deg(deg))
    }
}

impl From<Direction> for DirectionSpec {
    fn from(dir: Direction) -> Self {
        Self::Named(dir)
    }
}

impl From<f64> for DirectionSpec {
    fn from(deg: f64) -> Self {
        Self::Degrees(deg)
    }
}

impl FromStr for DirectionSpec {
    type Err = PieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dir) = Direction::from_str(s) {
            return Ok(Self::Named(dir));
        }
        s.parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(Self::Degrees)
            .ok_or_else(|| PieError::InvalidDirectionSpec(s.to_owned()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirection {
    Degrees(f64),
    Vector([f64; 2]),
    Text(String),
}

impl TryFrom<RawDirection> for DirectionSpec {
    type Error = PieError;

    fn try_from(raw: RawDirection) -> Result<Self, Self::Error> {
        match raw {
            RawDirection::Degrees(d) => Ok(Self::Degrees(d)),
            RawDirection::Vector([dx, dy]) => Ok(Self::Vector(dx, dy)),
            RawDirection::Text(s) => s.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normal_deg_wraps_into_range() {
        assert_eq!(normal_deg(-90.0), 270.0);
        assert_eq!(normal_deg(360.0), 0.0);
        assert_eq!(normal_deg(725.0), 5.0);
        assert_eq!(normal_deg(-1e-20), 0.0);
    }

    #[test]
    fn test_offset_direction_uses_screen_y_down() {
        assert!(close(offset_to_direction_deg(10.0, 0.0), 0.0));
        assert!(close(offset_to_direction_deg(0.0, -10.0), 90.0));
        assert!(close(offset_to_direction_deg(-10.0, 0.0), 180.0));
        assert!(close(offset_to_direction_deg(0.0, 10.0), 270.0));
        assert_eq!(offset_to_direction_deg(0.0, 0.0), 0.0);

        let north = direction_vector(90.0);
        assert!(close(north.x, 0.0) && close(north.y, -1.0));
    }

    #[test]
    fn test_readable_rotation() {
        assert_eq!(readable_rotation_deg(90.0), 0.0);
        assert_eq!(readable_rotation_deg(270.0), 0.0);
        assert_eq!(readable_rotation_deg(0.0), 90.0);
        assert_eq!(readable_rotation_deg(180.0), -90.0);
        assert_eq!(readable_rotation_deg(45.0), 45.0);
        assert_eq!(readable_rotation_deg(135.0), 315.0);
    }

    #[test]
    fn test_rect_around_rounds_margins() {
        let r = Rect::around(Point::new(10.0, 10.0), Size::new(5.0, 4.0));
        assert_eq!(r, Rect::new(8.0, 8.0, 5.0, 4.0));
        assert!(r.contains(Point::new(12.9, 11.9)));
        assert!(!r.contains(Point::new(13.0, 10.0)));
    }

    #[test]
    fn test_direction_spec_parsing() {
        let cases = vec![
            ("\"north\"", Some(90.0)),
            ("\"Up\"", Some(90.0)),
            ("\"SW\"", Some(225.0)),
            ("\"-45\"", Some(315.0)),
            ("30", Some(30.0)),
            ("[1.0, 1.0]", Some(315.0)),
        ];

        for (json, expected) in cases {
            let spec: DirectionSpec = serde_json::from_str(json).unwrap();
            let deg = spec.degrees();
            assert!(
                deg.zip(expected).is_some_and(|(a, b)| close(a, b)),
                "{json} -> {deg:?}"
            );
        }

        assert!(serde_json::from_str::<DirectionSpec>("\"sideways\"").is_err());
        assert_eq!(DirectionSpec::Degrees(f64::NAN).degrees(), None);
    }
}
