//! Connected components and component-level separation (used when disconnected graphs are
//! handled explicitly).

use super::forces::Rect;
use crate::graph::Link;

/// Groups node indices into connected components; each group is sorted ascending and groups are
/// ordered by their smallest member.
pub(crate) fn connected_components(node_count: usize, links: &[Link]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..node_count).collect();

    fn find(parent: &mut [usize], mut v: usize) -> usize {
        while parent[v] != v {
            parent[v] = parent[parent[v]];
            v = parent[v];
        }
        v
    }

    for l in links {
        if l.source >= node_count || l.target >= node_count {
            continue;
        }
        let a = find(&mut parent, l.source);
        let b = find(&mut parent, l.target);
        if a != b {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            parent[hi] = lo;
        }
    }

    let mut root_slot: Vec<Option<usize>> = vec![None; node_count];
    let mut out: Vec<Vec<usize>> = Vec::new();
    for v in 0..node_count {
        let r = find(&mut parent, v);
        match root_slot[r] {
            Some(slot) => out[slot].push(v),
            None => {
                root_slot[r] = Some(out.len());
                out.push(vec![v]);
            }
        }
    }
    out
}

/// Pushes overlapping component bounding boxes apart by adjusting every member's displacement.
pub(crate) fn separate_components(
    rects: &[Rect],
    fixed: &[bool],
    components: &[Vec<usize>],
    padding: f64,
    disps: &mut [(f64, f64)],
) {
    if components.len() <= 1 {
        return;
    }

    let mut boxes: Vec<(usize, Rect)> = Vec::with_capacity(components.len());
    for (ci, members) in components.iter().enumerate() {
        let mut bb: Option<Rect> = None;
        for &idx in members {
            let Some(r) = rects.get(idx) else {
                continue;
            };
            let (dx, dy) = disps[idx];
            let r = r.shifted(dx, dy);
            bb = Some(match bb {
                Some(b) => b.union(&r),
                None => r,
            });
        }
        if let Some(b) = bb {
            boxes.push((ci, b.expanded(padding)));
        }
    }

    // Gentle separation: overlapping boxes move a fraction of the minimal translation per pass.
    let strength = 0.35;
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            let (a_id, a) = boxes[i];
            let (b_id, b) = boxes[j];
            if !a.intersects(&b) {
                continue;
            }
            let (ox, oy) = minimal_translation(&a, &b);
            if ox == 0.0 && oy == 0.0 {
                continue;
            }
            shift_members(&components[a_id], fixed, -0.5 * ox * strength, -0.5 * oy * strength, disps);
            shift_members(&components[b_id], fixed, 0.5 * ox * strength, 0.5 * oy * strength, disps);
        }
    }
}

fn shift_members(members: &[usize], fixed: &[bool], dx: f64, dy: f64, disps: &mut [(f64, f64)]) {
    for &idx in members {
        if fixed.get(idx).copied().unwrap_or(false) {
            continue;
        }
        disps[idx].0 += dx;
        disps[idx].1 += dy;
    }
}

/// Smallest axis-aligned translation of `b` away from `a` that removes their overlap.
fn minimal_translation(a: &Rect, b: &Rect) -> (f64, f64) {
    let overlap_x1 = a.right() - b.left();
    let overlap_x2 = b.right() - a.left();
    let overlap_y1 = a.bottom() - b.top();
    let overlap_y2 = b.bottom() - a.top();

    let ox = if overlap_x1.abs() < overlap_x2.abs() {
        overlap_x1
    } else {
        -overlap_x2
    };
    let oy = if overlap_y1.abs() < overlap_y2.abs() {
        overlap_y1
    } else {
        -overlap_y2
    };

    if ox.abs() < oy.abs() { (ox, 0.0) } else { (0.0, oy) }
}
