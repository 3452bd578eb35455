//! Raw observations reported by the host environment

use serde::{Deserialize, Serialize};
use std::fmt;

/// Continuous position in map pixels, y pointing up
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point shifted by an offset
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// What a sensing point touches in the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    /// Solid ground the player can stand on
    Platform,
    /// Lethal ground
    Deathground,
    /// Level exit
    Goal,
    /// Nothing
    Empty,
}

impl ContactKind {
    /// Categories queried by a probe, highest priority first
    pub const PRIORITY: [ContactKind; 3] = [
        ContactKind::Platform,
        ContactKind::Deathground,
        ContactKind::Goal,
    ];

    /// Lowercase name used in state keys
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Deathground => "deathground",
            Self::Goal => "goal",
            Self::Empty => "empty",
        }
    }

    /// Inverse of [`ContactKind::name`]
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "platform" => Some(Self::Platform),
            "deathground" => Some(Self::Deathground),
            "goal" => Some(Self::Goal),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }
}

/// Collision queries answered by the environment against its current layout
pub trait CollisionQuery {
    /// Whether `point` lies inside a tile of the given category
    fn collides(&self, point: Point, kind: ContactKind) -> bool;
}

impl<T: CollisionQuery + ?Sized> CollisionQuery for &T {
    fn collides(&self, point: Point, kind: ContactKind) -> bool {
        (**self).collides(point, kind)
    }
}

/// A layout with nothing in it, for discretizations that never probe
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollisions;

impl CollisionQuery for NoCollisions {
    fn collides(&self, _point: Point, _kind: ContactKind) -> bool {
        false
    }
}

/// Per-tick observation of the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Player centre
    pub position: Point,
    /// Centre of the goal the player is trying to reach
    pub goal: Point,
}

impl RawObservation {
    /// Create a new observation
    #[must_use]
    pub const fn new(position: Point, goal: Point) -> Self {
        Self { position, goal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
        assert_eq!(a.offset(3.0, 4.0), b);
    }

    #[test]
    fn test_contact_names() {
        for kind in [
            ContactKind::Platform,
            ContactKind::Deathground,
            ContactKind::Goal,
            ContactKind::Empty,
        ] {
            assert_eq!(ContactKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ContactKind::from_name("lava"), None);
    }
}
