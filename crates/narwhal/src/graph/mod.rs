use crate::error::{Error, Result};
use nalgebra as na;

/// A rectangle taking part in the layout, positioned by its center.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians. `None` when the caller has no rotation data for this node.
    pub rotation: Option<f64>,
    /// Fixed nodes keep their position through a tick; forces acting on them are discarded.
    pub fixed: bool,
}

impl Node {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: None,
            fixed: false,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Width and height of the axis-aligned box enclosing the (possibly rotated) rectangle.
    ///
    /// Degenerate sizes are clamped to 1 so that every node occupies some area.
    pub fn extent(&self) -> (f64, f64) {
        let w = if self.width.is_finite() {
            self.width.max(1.0)
        } else {
            1.0
        };
        let h = if self.height.is_finite() {
            self.height.max(1.0)
        } else {
            1.0
        };
        match self.rotation.filter(|r| r.is_finite() && *r != 0.0) {
            Some(theta) => rotated_extent(w, h, theta),
            None => (w, h),
        }
    }
}

/// Bounding box size of a `width` x `height` rectangle rotated by `theta` radians.
pub fn rotated_extent(width: f64, height: f64, theta: f64) -> (f64, f64) {
    // |R| * (w, h) gives the projection of the rotated rectangle onto both axes.
    let m = na::Rotation2::new(theta).into_inner().abs();
    let e = m * na::Vector2::new(width, height);
    (e.x, e.y)
}

/// An undirected spring between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: usize,
    pub target: usize,
}

impl Link {
    pub fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Which coordinate an alignment constraint equalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Members share an `x` coordinate (they stack vertically).
    X,
    /// Members share a `y` coordinate (they line up horizontally).
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentOffset {
    pub node: usize,
    pub offset: f64,
}

/// Forces `node.<axis> - offset` to be equal for every member.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConstraint {
    pub axis: Axis,
    pub offsets: Vec<AlignmentOffset>,
}

impl AlignmentConstraint {
    pub fn new(axis: Axis, nodes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            axis,
            offsets: nodes
                .into_iter()
                .map(|node| AlignmentOffset { node, offset: 0.0 })
                .collect(),
        }
    }
}

pub(crate) fn validate(
    node_count: usize,
    links: &[Link],
    constraints: &[AlignmentConstraint],
) -> Result<()> {
    for (idx, l) in links.iter().enumerate() {
        if l.source >= node_count || l.target >= node_count {
            return Err(Error::MissingEndpoint {
                link: idx,
                node_count,
            });
        }
    }
    for (idx, c) in constraints.iter().enumerate() {
        if let Some(bad) = c.offsets.iter().find(|o| o.node >= node_count) {
            return Err(Error::UnknownConstraintNode {
                constraint: idx,
                node: bad.node,
            });
        }
    }
    Ok(())
}
