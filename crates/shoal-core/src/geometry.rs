//! Anchor/center conversion for rotated rectangles.
//!
//! Hosts position shapes by their anchor (top-left corner of the unrotated shape, rotation
//! pivoting about it); the solver works with centers.

use crate::entity::Geometry;
use nalgebra as na;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn half_diagonal(size: Geometry, rotation: f64) -> na::Vector2<f64> {
    na::Rotation2::new(rotation) * na::Vector2::new(size.width / 2.0, size.height / 2.0)
}

/// center = anchor + R(rotation) * (w/2, h/2)
pub fn center_of(anchor: Point, size: Geometry, rotation: f64) -> Point {
    let d = half_diagonal(size, rotation);
    Point::new(anchor.x + d.x, anchor.y + d.y)
}

/// anchor = center - R(rotation) * (w/2, h/2)
pub fn anchor_of(center: Point, size: Geometry, rotation: f64) -> Point {
    let d = half_diagonal(size, rotation);
    Point::new(center.x - d.x, center.y - d.y)
}

/// Size of the axis-aligned box enclosing `size` rotated by `rotation`.
pub fn rotated_bounds(size: Geometry, rotation: f64) -> Geometry {
    let m = na::Rotation2::new(rotation).into_inner().abs();
    let e = m * na::Vector2::new(size.width, size.height);
    Geometry::new(e.x, e.y)
}
