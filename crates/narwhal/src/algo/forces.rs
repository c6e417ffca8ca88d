//! Rectangle geometry and pairwise force helpers shared by the tick passes.

use crate::graph::Node;

/// Axis-aligned bounds of a node for one pass (center + half extents).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rect {
    pub(crate) cx: f64,
    pub(crate) cy: f64,
    pub(crate) hw: f64,
    pub(crate) hh: f64,
}

impl Rect {
    pub(crate) fn from_node(n: &Node) -> Self {
        let (w, h) = n.extent();
        Self {
            cx: n.x,
            cy: n.y,
            hw: w / 2.0,
            hh: h / 2.0,
        }
    }

    pub(crate) fn shifted(self, dx: f64, dy: f64) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            ..self
        }
    }

    pub(crate) fn left(&self) -> f64 {
        self.cx - self.hw
    }

    pub(crate) fn right(&self) -> f64 {
        self.cx + self.hw
    }

    pub(crate) fn top(&self) -> f64 {
        self.cy - self.hh
    }

    pub(crate) fn bottom(&self) -> f64 {
        self.cy + self.hh
    }

    pub(crate) fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Point where the segment from this center towards `other`'s center leaves this rectangle.
    pub(crate) fn clip_towards(&self, other: &Rect) -> (f64, f64) {
        let dx = other.cx - self.cx;
        let dy = other.cy - self.cy;
        if dx == 0.0 && dy == 0.0 {
            return (self.cx, self.cy);
        }

        let mut t_x = f64::INFINITY;
        let mut t_y = f64::INFINITY;
        if dx != 0.0 {
            t_x = (self.hw / dx.abs()).max(0.0);
        }
        if dy != 0.0 {
            t_y = (self.hh / dy.abs()).max(0.0);
        }
        let t = t_x.min(t_y);
        (self.cx + t * dx, self.cy + t * dy)
    }

    pub(crate) fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let right = self.right().max(other.right());
        let top = self.top().min(other.top());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            cx: (left + right) / 2.0,
            cy: (top + bottom) / 2.0,
            hw: (right - left) / 2.0,
            hh: (bottom - top) / 2.0,
        }
    }

    pub(crate) fn expanded(&self, pad: f64) -> Rect {
        Rect {
            hw: self.hw + pad,
            hh: self.hh + pad,
            ..*self
        }
    }
}

pub(crate) fn calc_repulsion_force(
    a: &Rect,
    b: &Rect,
    strength: f64,
    min_repulsion_dist: f64,
    separation_buffer: f64,
) -> (f64, f64) {
    if a.intersects(b) {
        let (ox, oy) = calc_separation_amount(a, b, separation_buffer);
        (-ox, -oy)
    } else {
        let (ax, ay) = a.clip_towards(b);
        let (bx, by) = b.clip_towards(a);
        let mut dx = bx - ax;
        let mut dy = by - ay;

        if dx.abs() < 1e-9 {
            dx = 0.0;
        }
        if dy.abs() < 1e-9 {
            dy = 0.0;
        }
        if dx != 0.0 && dx.abs() < min_repulsion_dist {
            dx = dx.signum() * min_repulsion_dist;
        }
        if dy != 0.0 && dy.abs() < min_repulsion_dist {
            dy = dy.signum() * min_repulsion_dist;
        }

        let dist_sq = dx * dx + dy * dy;
        let dist = dist_sq.sqrt();
        if dist_sq == 0.0 || dist == 0.0 {
            return (0.0, 0.0);
        }
        let repulsion_force = strength / dist_sq;
        (-repulsion_force * dx / dist, -repulsion_force * dy / dist)
    }
}

/// Translation that `b` needs (and `-1 *` that `a` needs) to stop overlapping, half each.
pub(crate) fn calc_separation_amount(a: &Rect, b: &Rect, separation_buffer: f64) -> (f64, f64) {
    let (dir_x, dir_y) = decide_directions_for_overlapping_nodes(a, b);

    let mut overlap_x = a.right().min(b.right()) - a.left().max(b.left());
    let mut overlap_y = a.bottom().min(b.bottom()) - a.top().max(b.top());

    if (a.left() <= b.left()) && (a.right() >= b.right()) {
        overlap_x += (b.left() - a.left()).min(a.right() - b.right());
    } else if (b.left() <= a.left()) && (b.right() >= a.right()) {
        overlap_x += (a.left() - b.left()).min(b.right() - a.right());
    }
    if (a.top() <= b.top()) && (a.bottom() >= b.bottom()) {
        overlap_y += (b.top() - a.top()).min(a.bottom() - b.bottom());
    } else if (b.top() <= a.top()) && (b.bottom() >= a.bottom()) {
        overlap_y += (a.top() - b.top()).min(b.bottom() - a.bottom());
    }

    let mut slope = ((b.cy - a.cy) / (b.cx - a.cx)).abs();
    if (b.cy == a.cy) && (b.cx == a.cx) {
        slope = 1.0;
    }

    let mut move_by_y = slope * overlap_x;
    let mut move_by_x = overlap_y / slope;
    if overlap_x < move_by_x {
        move_by_x = overlap_x;
    } else {
        move_by_y = overlap_y;
    }

    let dx = -dir_x * ((move_by_x / 2.0) + separation_buffer);
    let dy = -dir_y * ((move_by_y / 2.0) + separation_buffer);
    (dx, dy)
}

fn decide_directions_for_overlapping_nodes(a: &Rect, b: &Rect) -> (f64, f64) {
    let dir_x = if a.cx < b.cx { -1.0 } else { 1.0 };
    let dir_y = if a.cy < b.cy { -1.0 } else { 1.0 };
    (dir_x, dir_y)
}

/// Uniform bucket grid used to find each node's neighbours within the repulsion range.
#[derive(Debug, Clone)]
pub(crate) struct RepulsionGrid {
    left: f64,
    top: f64,
    // Never smaller than the repulsion range, so neighbours are at most one cell away.
    cell_size: f64,
    size_x: i32,
    size_y: i32,
    // Flat grid: cells[x * size_y + y] contains node indices.
    cells: Vec<Vec<usize>>,
}

impl RepulsionGrid {
    fn cell(&self, x: i32, y: i32) -> &[usize] {
        &self.cells[(x as usize) * (self.size_y as usize) + (y as usize)]
    }

    /// Upper bound on cells per node. Far-apart nodes widen the cells instead of growing the grid.
    const MAX_CELLS_PER_NODE: f64 = 4.0;

    pub(crate) fn build(rects: &[Rect], repulsion_range: f64) -> Option<Self> {
        if rects.is_empty() || !repulsion_range.is_finite() || repulsion_range <= 0.0 {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for r in rects {
            min_x = min_x.min(r.left());
            min_y = min_y.min(r.top());
            max_x = max_x.max(r.right());
            max_y = max_y.max(r.bottom());
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }

        let w = (max_x - min_x).max(1.0);
        let h = (max_y - min_y).max(1.0);
        let max_cells = (rects.len() as f64 * Self::MAX_CELLS_PER_NODE).max(1.0);
        let cells_along = |extent: f64, cell: f64| (extent / cell).floor() + 1.0;
        let mut cell_size = repulsion_range.max((w * h / max_cells).sqrt());
        while cell_size.is_finite() && cells_along(w, cell_size) * cells_along(h, cell_size) > max_cells
        {
            cell_size *= 2.0;
        }
        if !cell_size.is_finite() {
            return None;
        }
        let size_x = cells_along(w, cell_size) as i32;
        let size_y = cells_along(h, cell_size) as i32;
        let mut grid = Self {
            left: min_x,
            top: min_y,
            cell_size,
            size_x,
            size_y,
            cells: vec![Vec::new(); (size_x as usize) * (size_y as usize)],
        };

        for (idx, r) in rects.iter().enumerate() {
            let (start_x, finish_x, start_y, finish_y) = grid.coords(r);
            for gx in start_x..=finish_x {
                for gy in start_y..=finish_y {
                    let cell_idx = (gx as usize) * (size_y as usize) + (gy as usize);
                    grid.cells[cell_idx].push(idx);
                }
            }
        }

        Some(grid)
    }

    fn coords(&self, r: &Rect) -> (i32, i32, i32, i32) {
        let start_x = ((r.left() - self.left) / self.cell_size).floor() as i32;
        let finish_x = ((r.right() - self.left) / self.cell_size).floor() as i32;
        let start_y = ((r.top() - self.top) / self.cell_size).floor() as i32;
        let finish_y = ((r.bottom() - self.top) / self.cell_size).floor() as i32;
        (
            start_x.clamp(0, self.size_x - 1),
            finish_x.clamp(0, self.size_x - 1),
            start_y.clamp(0, self.size_y - 1),
            finish_y.clamp(0, self.size_y - 1),
        )
    }

    /// Indices `j > node_idx` whose rectangles lie within `repulsion_range` of `node_idx`.
    pub(crate) fn surrounding(
        &self,
        node_idx: usize,
        rects: &[Rect],
        repulsion_range: f64,
    ) -> Vec<usize> {
        let (start_x, finish_x, start_y, finish_y) = self.coords(&rects[node_idx]);
        let mut seen: Vec<bool> = vec![false; rects.len()];
        let mut out: Vec<usize> = Vec::new();

        for gx in (start_x - 1)..=(finish_x + 1) {
            if gx < 0 || gx >= self.size_x {
                continue;
            }
            for gy in (start_y - 1)..=(finish_y + 1) {
                if gy < 0 || gy >= self.size_y {
                    continue;
                }
                for &other in self.cell(gx, gy) {
                    if other <= node_idx || seen[other] {
                        continue;
                    }
                    if within_range(&rects[node_idx], &rects[other], repulsion_range) {
                        seen[other] = true;
                        out.push(other);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }
}

pub(crate) fn within_range(a: &Rect, b: &Rect, repulsion_range: f64) -> bool {
    let dx = (a.cx - b.cx).abs() - (a.hw + b.hw);
    let dy = (a.cy - b.cy).abs() - (a.hh + b.hh);
    dx <= repulsion_range && dy <= repulsion_range
}
