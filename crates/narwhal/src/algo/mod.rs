mod components;
mod forces;
mod rng;

use crate::error::Result;
use crate::graph::{AlignmentConstraint, Axis, Link, Node, validate};
use forces::{Rect, RepulsionGrid};
use rng::XorShift64Star;
use std::sync::Arc;

/// Per-link ideal center-to-center distance.
///
/// Returning `None` (or a non-finite / non-positive value) falls back to
/// [`LayoutOptions::default_link_distance`].
pub trait LinkDistance {
    fn distance(&self, source: &Node, target: &Node) -> Option<f64>;
}

impl<F> LinkDistance for F
where
    F: Fn(&Node, &Node) -> Option<f64>,
{
    fn distance(&self, source: &Node, target: &Node) -> Option<f64> {
        self(source, target)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Push overlapping rectangles apart during all-constraint passes.
    pub avoid_overlaps: bool,
    /// Keep disconnected components from piling on top of each other.
    pub handle_disconnected: bool,
    pub default_link_distance: f64,
    pub spring_strength: f64,
    pub repulsion_strength: f64,
    pub gravity_strength: f64,
    /// Gravity only acts on nodes further than `estimated_size * gravity_range_factor` from the
    /// layout center.
    pub gravity_range_factor: f64,
    pub initial_cooling_factor: f64,
    /// The cooling factor never drops below this value: the simulation keeps responding to
    /// edits for as long as it is ticked.
    pub min_cooling_factor: f64,
    /// Number of passes over which the cooling factor decays to its floor.
    pub cooling_passes: usize,
    pub max_node_displacement: f64,
    /// Extra gap kept between rectangles (and component boxes) when separating overlaps.
    pub overlap_padding: f64,
    pub random_seed: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            avoid_overlaps: true,
            handle_disconnected: true,
            default_link_distance: 100.0,
            spring_strength: 0.45,
            repulsion_strength: 4500.0,
            gravity_strength: 0.25,
            gravity_range_factor: 3.8,
            initial_cooling_factor: 0.3,
            min_cooling_factor: 0.04,
            cooling_passes: 600,
            max_node_displacement: 100.0,
            overlap_padding: 0.0,
            random_seed: 1,
        }
    }
}

/// How many passes of each kind a single [`Layout::tick`] runs.
///
/// Unconstrained passes only apply forces; user-constraint passes additionally enforce the
/// alignment constraints; all-constraint passes also separate overlapping rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPasses {
    pub unconstrained: usize,
    pub user_constraints: usize,
    pub all_constraints: usize,
}

impl Default for TickPasses {
    fn default() -> Self {
        Self {
            unconstrained: 1,
            user_constraints: 1,
            all_constraints: 1,
        }
    }
}

impl TickPasses {
    pub fn total(&self) -> usize {
        self.unconstrained + self.user_constraints + self.all_constraints
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub passes: usize,
    /// Sum of absolute per-axis node displacements over all passes of the tick.
    pub total_displacement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Unconstrained,
    UserConstraints,
    AllConstraints,
}

#[derive(Debug, Clone, Copy, Default)]
struct Forces {
    spring_fx: f64,
    spring_fy: f64,
    repulsion_fx: f64,
    repulsion_fy: f64,
}

/// Mutable solver state. Reset whenever the node set is replaced.
#[derive(Debug, Clone)]
struct SolverState {
    ticks: u64,
    passes: usize,
    cooling_factor: f64,
    forces: Vec<Forces>,
    surrounding: Vec<Vec<usize>>,
    disps: Vec<(f64, f64)>,
}

impl SolverState {
    const GRID_CALCULATION_CHECK_PERIOD: usize = 10;
    const COOLING_CHECK_PERIOD: usize = 10;

    fn fresh(node_count: usize, opts: &LayoutOptions) -> Self {
        Self {
            ticks: 0,
            passes: 0,
            cooling_factor: opts.initial_cooling_factor,
            forces: vec![Forces::default(); node_count],
            surrounding: vec![Vec::new(); node_count],
            disps: vec![(0.0, 0.0); node_count],
        }
    }

    fn update_cooling(&mut self, opts: &LayoutOptions) {
        if !self.passes.is_multiple_of(Self::COOLING_CHECK_PERIOD) {
            return;
        }
        let initial = opts.initial_cooling_factor;
        let floor = opts.min_cooling_factor.min(initial);
        let max_cycle = (opts.cooling_passes as f64 / Self::COOLING_CHECK_PERIOD as f64).max(2.0);
        let cycle = (self.passes / Self::COOLING_CHECK_PERIOD) as f64;
        if cycle <= 0.0 || initial <= floor {
            self.cooling_factor = initial.max(floor);
            return;
        }
        let numerator = (100.0 * (initial - floor)).max(1.0 + 1e-9).ln();
        let power = numerator / max_cycle.ln().max(1e-9);
        let schedule = cycle.powf(power) / 100.0;
        self.cooling_factor = (initial - schedule).max(floor);
    }
}

/// Stateful, tick-driven layout over center-positioned rectangles.
#[derive(Clone)]
pub struct Layout {
    options: LayoutOptions,
    link_distance: Option<Arc<dyn LinkDistance + Send + Sync>>,
    nodes: Vec<Node>,
    links: Vec<Link>,
    constraints: Vec<AlignmentConstraint>,
    components: Vec<Vec<usize>>,
    state: SolverState,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("options", &self.options)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("constraints", &self.constraints.len())
            .field("ticks", &self.state.ticks)
            .finish()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl Layout {
    pub fn new(options: LayoutOptions) -> Self {
        let state = SolverState::fresh(0, &options);
        Self {
            options,
            link_distance: None,
            nodes: Vec::new(),
            links: Vec::new(),
            constraints: Vec::new(),
            components: Vec::new(),
            state,
        }
    }

    pub fn with_link_distance(mut self, link_distance: Arc<dyn LinkDistance + Send + Sync>) -> Self {
        self.link_distance = Some(link_distance);
        self
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to node positions/sizes. Writing `x`/`y` before a tick pins the node to
    /// that position for the tick's force calculations.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn constraints(&self) -> &[AlignmentConstraint] {
        &self.constraints
    }

    pub fn components(&self) -> &[Vec<usize>] {
        &self.components
    }

    /// Number of ticks since the node set was last replaced.
    pub fn ticks(&self) -> u64 {
        self.state.ticks
    }

    pub fn cooling_factor(&self) -> f64 {
        self.state.cooling_factor
    }

    /// Replaces the whole graph and resets all solver state (cooling, cached neighbourhoods).
    pub fn set_graph(
        &mut self,
        nodes: Vec<Node>,
        links: Vec<Link>,
        constraints: Vec<AlignmentConstraint>,
    ) -> Result<()> {
        validate(nodes.len(), &links, &constraints)?;
        self.nodes = nodes;
        self.links = links;
        self.constraints = constraints;
        self.components = components::connected_components(self.nodes.len(), &self.links);
        self.state = SolverState::fresh(self.nodes.len(), &self.options);
        self.separate_coincident_nodes();
        Ok(())
    }

    /// Swaps links and constraints while keeping node positions and cooling state.
    pub fn replace_structure(
        &mut self,
        links: Vec<Link>,
        constraints: Vec<AlignmentConstraint>,
    ) -> Result<()> {
        validate(self.nodes.len(), &links, &constraints)?;
        self.links = links;
        self.constraints = constraints;
        self.components = components::connected_components(self.nodes.len(), &self.links);
        Ok(())
    }

    /// Advances the relaxation by one small batch of passes.
    ///
    /// A tick never runs to convergence; callers reach a stable layout by ticking repeatedly.
    pub fn tick(&mut self, passes: TickPasses) -> TickStats {
        let mut stats = TickStats::default();
        if self.nodes.is_empty() {
            self.state.ticks += 1;
            return stats;
        }

        let schedule = std::iter::repeat_n(PassKind::Unconstrained, passes.unconstrained)
            .chain(std::iter::repeat_n(
                PassKind::UserConstraints,
                passes.user_constraints,
            ))
            .chain(std::iter::repeat_n(
                PassKind::AllConstraints,
                passes.all_constraints,
            ));
        for kind in schedule {
            stats.total_displacement += self.run_pass(kind);
            stats.passes += 1;
        }
        self.state.ticks += 1;
        stats
    }

    fn ideal_length(&self, link: &Link) -> f64 {
        let fallback = self.options.default_link_distance.max(1.0);
        let Some(f) = self.link_distance.as_ref() else {
            return fallback;
        };
        match f.distance(&self.nodes[link.source], &self.nodes[link.target]) {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => fallback,
        }
    }

    fn run_pass(&mut self, kind: PassKind) -> f64 {
        let n = self.nodes.len();
        let opts = self.options.clone();
        let rects: Vec<Rect> = self.nodes.iter().map(Rect::from_node).collect();
        let fixed: Vec<bool> = self.nodes.iter().map(|n| n.fixed).collect();
        let ideal: Vec<f64> = self.links.iter().map(|l| self.ideal_length(l)).collect();

        let default_edge_length = if ideal.is_empty() {
            opts.default_link_distance.max(1.0)
        } else {
            (ideal.iter().sum::<f64>() / ideal.len() as f64).max(1.0)
        };
        let half_default_edge_length = default_edge_length / 2.0;
        let min_repulsion_dist = (default_edge_length / 10.0).max(0.0005);
        let repulsion_range = (2.0 * default_edge_length).max(1.0);

        let state = &mut self.state;
        state.update_cooling(&opts);
        let cooling_factor = state.cooling_factor;

        // Spring forces, measured center to center so that they agree with `LinkDistance`.
        for (link, &ideal_length) in self.links.iter().zip(&ideal) {
            let (a, b) = (link.source, link.target);
            if a == b {
                continue;
            }
            let lx = rects[b].cx - rects[a].cx;
            let ly = rects[b].cy - rects[a].cy;
            let len = (lx * lx + ly * ly).sqrt();
            if len < 1e-9 {
                continue;
            }
            let spring_force = opts.spring_strength * (len - ideal_length);
            let sfx = spring_force * (lx / len);
            let sfy = spring_force * (ly / len);
            state.forces[a].spring_fx += sfx;
            state.forces[a].spring_fy += sfy;
            state.forces[b].spring_fx -= sfx;
            state.forces[b].spring_fy -= sfy;
        }

        // Repulsion, with neighbourhoods cached for a few passes.
        if state.passes.is_multiple_of(SolverState::GRID_CALCULATION_CHECK_PERIOD) {
            let grid = if n > 64 {
                RepulsionGrid::build(&rects, repulsion_range)
            } else {
                None
            };
            for i in 0..n {
                state.surrounding[i] = match &grid {
                    Some(grid) => grid.surrounding(i, &rects, repulsion_range),
                    None => ((i + 1)..n)
                        .filter(|&j| forces::within_range(&rects[i], &rects[j], repulsion_range))
                        .collect(),
                };
            }
        }
        for i in 0..n {
            for &j in &state.surrounding[i] {
                if j <= i || j >= n {
                    continue;
                }
                let (rfx, rfy) = forces::calc_repulsion_force(
                    &rects[i],
                    &rects[j],
                    opts.repulsion_strength,
                    min_repulsion_dist,
                    half_default_edge_length,
                );
                state.forces[i].repulsion_fx += rfx;
                state.forces[i].repulsion_fy += rfy;
                state.forces[j].repulsion_fx -= rfx;
                state.forces[j].repulsion_fy -= rfy;
            }
        }

        // Gravity towards the layout center, only for nodes that drifted out of range.
        let estimated_size = {
            let sum: f64 = rects.iter().map(|r| r.hw + r.hh).sum();
            (sum / (n as f64).sqrt()).max(1.0)
        };
        let gravity_range = estimated_size * opts.gravity_range_factor;
        if let Some((cx, cy)) = bounding_box_center(&rects) {
            for (r, f) in rects.iter().zip(state.forces.iter_mut()) {
                let dx = r.cx - cx;
                let dy = r.cy - cy;
                if dx.abs() + r.hw > gravity_range || dy.abs() + r.hh > gravity_range {
                    f.spring_fx += -opts.gravity_strength * dx;
                    f.spring_fy += -opts.gravity_strength * dy;
                }
            }
        }

        // Forces -> clamped displacements.
        let max_d = cooling_factor * opts.max_node_displacement;
        for (idx, f) in state.forces.iter_mut().enumerate() {
            let (mut mdx, mut mdy) = if fixed[idx] {
                (0.0, 0.0)
            } else {
                (
                    cooling_factor * (f.spring_fx + f.repulsion_fx),
                    cooling_factor * (f.spring_fy + f.repulsion_fy),
                )
            };
            if mdx.abs() > max_d {
                mdx = max_d * mdx.signum();
            }
            if mdy.abs() > max_d {
                mdy = max_d * mdy.signum();
            }
            state.disps[idx] = (mdx, mdy);
            *f = Forces::default();
        }

        if opts.handle_disconnected {
            components::separate_components(
                &rects,
                &fixed,
                &self.components,
                opts.overlap_padding,
                &mut state.disps,
            );
        }

        if kind != PassKind::Unconstrained {
            apply_alignment(&rects, &fixed, &self.constraints, &mut state.disps);
        }
        if kind == PassKind::AllConstraints && opts.avoid_overlaps {
            let locks = axis_locks(n, &self.constraints);
            separate_overlaps(&rects, &fixed, &locks, opts.overlap_padding, &mut state.disps);
            // Overlap removal may have nudged aligned members off their shared line.
            apply_alignment(&rects, &fixed, &self.constraints, &mut state.disps);
        }

        let mut total_displacement = 0.0;
        for (node, &(dx, dy)) in self.nodes.iter_mut().zip(&state.disps) {
            if node.fixed || !(dx.is_finite() && dy.is_finite()) {
                continue;
            }
            node.x += dx;
            node.y += dy;
            total_displacement += dx.abs() + dy.abs();
        }
        state.passes += 1;
        total_displacement
    }

    /// Nodes sharing the exact same center get a tiny deterministic nudge so that springs and
    /// overlap separation have a direction to work with.
    fn separate_coincident_nodes(&mut self) {
        let mut rng = XorShift64Star::new(self.options.random_seed);
        let mut seen: rustc_hash::FxHashSet<(u64, u64)> = rustc_hash::FxHashSet::default();
        for node in &mut self.nodes {
            if !(node.x.is_finite() && node.y.is_finite()) {
                node.x = 0.0;
                node.y = 0.0;
            }
            while !seen.insert((node.x.to_bits(), node.y.to_bits())) {
                if node.fixed {
                    break;
                }
                node.x += rng.next_f64_signed();
                node.y += rng.next_f64_signed();
            }
        }
    }
}

fn bounding_box_center(rects: &[Rect]) -> Option<(f64, f64)> {
    if rects.is_empty() {
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
    Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
}

/// Adjusts displacements so that every constraint's members land on one shared line.
///
/// The line is the mean of the fixed members' positions when any member is fixed, otherwise the
/// mean of all members' displaced positions.
fn apply_alignment(
    rects: &[Rect],
    fixed: &[bool],
    constraints: &[AlignmentConstraint],
    disps: &mut [(f64, f64)],
) {
    for c in constraints {
        if c.offsets.len() <= 1 {
            continue;
        }
        let coord = |idx: usize, disps: &[(f64, f64)]| match c.axis {
            Axis::X => rects[idx].cx + disps[idx].0,
            Axis::Y => rects[idx].cy + disps[idx].1,
        };

        let any_fixed = c.offsets.iter().any(|o| fixed[o.node]);
        let mut sum = 0.0;
        let mut cnt = 0.0;
        for o in &c.offsets {
            if any_fixed && !fixed[o.node] {
                continue;
            }
            sum += coord(o.node, disps) - o.offset;
            cnt += 1.0;
        }
        if cnt == 0.0 {
            continue;
        }
        let line = sum / cnt;
        for o in &c.offsets {
            if fixed[o.node] {
                continue;
            }
            let delta = line + o.offset - coord(o.node, disps);
            match c.axis {
                Axis::X => disps[o.node].0 += delta,
                Axis::Y => disps[o.node].1 += delta,
            }
        }
    }
}

/// Per node: whether it shares an `x` (resp. `y`) alignment with at least one other node.
#[derive(Debug, Clone, Copy, Default)]
struct AxisLock {
    x: bool,
    y: bool,
}

fn axis_locks(node_count: usize, constraints: &[AlignmentConstraint]) -> Vec<AxisLock> {
    let mut locks = vec![AxisLock::default(); node_count];
    for c in constraints.iter().filter(|c| c.offsets.len() > 1) {
        for o in &c.offsets {
            match c.axis {
                Axis::X => locks[o.node].x = true,
                Axis::Y => locks[o.node].y = true,
            }
        }
    }
    locks
}

/// Half the distance `b` has to travel along one axis to clear `a`, signed for `b`.
fn half_clearance(a_c: f64, a_half: f64, b_c: f64, b_half: f64) -> f64 {
    let needed = ((a_half + b_half) - (b_c - a_c).abs()).max(0.0) / 2.0;
    if b_c >= a_c { needed } else { -needed }
}

/// One sweep of pairwise overlap removal over the displaced rectangles.
///
/// Pairs that are both locked on one axis are separated along the other one; pushing them along
/// the locked axis would be undone by the alignment.
fn separate_overlaps(
    rects: &[Rect],
    fixed: &[bool],
    locks: &[AxisLock],
    padding: f64,
    disps: &mut [(f64, f64)],
) {
    let n = rects.len();
    let mut moved: Vec<Rect> = rects
        .iter()
        .zip(disps.iter())
        .map(|(r, &(dx, dy))| r.shifted(dx, dy).expanded(padding / 2.0))
        .collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if fixed[i] && fixed[j] {
                continue;
            }
            if !moved[i].intersects(&moved[j]) {
                continue;
            }
            let (a, b) = (&moved[i], &moved[j]);
            let both_x = locks[i].x && locks[j].x;
            let both_y = locks[i].y && locks[j].y;
            let (ox, oy) = match (both_x, both_y) {
                (true, false) => (0.0, half_clearance(a.cy, a.hh, b.cy, b.hh)),
                (false, true) => (half_clearance(a.cx, a.hw, b.cx, b.hw), 0.0),
                _ => forces::calc_separation_amount(a, b, 0.0),
            };
            // Each side takes half of the separation unless the other one cannot move.
            let (share_i, share_j) = match (fixed[i], fixed[j]) {
                (true, _) => (0.0, 2.0),
                (_, true) => (2.0, 0.0),
                _ => (1.0, 1.0),
            };
            disps[i].0 -= ox * share_i;
            disps[i].1 -= oy * share_i;
            disps[j].0 += ox * share_j;
            disps[j].1 += oy * share_j;
            moved[i] = moved[i].shifted(-ox * share_i, -oy * share_i);
            moved[j] = moved[j].shifted(ox * share_j, oy * share_j);
        }
    }
}
