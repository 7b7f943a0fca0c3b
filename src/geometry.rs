//! Screen-space primitives shared by the layout strategies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const ZERO: Vec2f = Vec2f { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub min: Vec2f,
    pub max: Vec2f,
}

impl RectF {
    pub fn from_min_max(min: Vec2f, max: Vec2f) -> Self {
        Self { min, max }
    }
    pub fn from_origin_size(origin: Vec2f, width: f32, height: f32) -> Self {
        Self::from_min_max(origin, Vec2f::new(origin.x + width, origin.y + height))
    }
    /// Strict overlap test; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: RectF) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }
    /// Smallest rectangle containing both.
    pub fn union(&self, other: RectF) -> RectF {
        RectF::from_min_max(
            Vec2f::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Vec2f::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }
}

/// Computed size of a card plus the vertical offset arrows aim at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    /// Distance from the top edge to the center of the card body below the title band.
    pub center_offset: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32, title_height: f32) -> Self {
        Self {
            width,
            height,
            center_offset: title_height + (height - title_height) * 0.5,
        }
    }

    /// Same title band, stretched to a new size.
    pub fn resized(&self, width: f32, height: f32) -> Self {
        let title_height = 2.0 * self.center_offset - self.height;
        Self::new(width, height, title_height)
    }
}

/// Direction of a linear layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}
