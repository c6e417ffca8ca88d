//! The graph-layout collection: membership in, positions out, one tick per host frame.

use crate::driver::SimulationDriver;
use crate::error::Result;
use crate::projection::{Projection, project};
use crate::settings::LayoutSettings;
use crate::writeback::{WriteBackStats, write_back};
use shoal_core::{Collection, EntityId, FrameToken, Host, Lifecycle, Members, ShoalConfig};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { pending: FrameToken },
}

/// [`Lifecycle`] that keeps a live force-directed layout of the collection's members.
#[derive(Debug)]
pub struct GraphLayout {
    settings: LayoutSettings,
    driver: SimulationDriver,
    projection: Projection,
    phase: Phase,
    last_write_back: WriteBackStats,
}

pub type GraphLayoutCollection<H> = Collection<H, GraphLayout>;

impl GraphLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        let driver = SimulationDriver::new(&settings);
        Self {
            settings,
            driver,
            projection: Projection::default(),
            phase: Phase::Idle,
            last_write_back: WriteBackStats::default(),
        }
    }

    pub fn from_config(cfg: &ShoalConfig) -> Result<Self> {
        Ok(Self::new(LayoutSettings::from_config(cfg)?))
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn driver(&self) -> &SimulationDriver {
        &self.driver
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        match self.phase {
            Phase::Running { pending } => Some(pending),
            Phase::Idle => None,
        }
    }

    pub fn last_write_back(&self) -> WriteBackStats {
        self.last_write_back
    }

    /// Idle -> Running. Re-seeds the simulation from the current members. No-op when running.
    pub fn enable<H: Host>(&mut self, host: &mut H, members: &Members) {
        if self.is_running() {
            return;
        }
        if self.settings.deselect_on_enable {
            host.select_none();
        }
        self.reproject(host, members, false);
        let pending = host.request_frame();
        self.phase = Phase::Running { pending };
        tracing::debug!(nodes = self.projection.nodes.len(), ?pending, "layout enabled");
    }

    /// Running -> Idle, cancelling the pending frame. No-op when idle.
    pub fn disable<H: Host>(&mut self, host: &mut H) {
        if let Phase::Running { pending } = self.phase {
            host.cancel_frame(pending);
            self.phase = Phase::Idle;
            tracing::debug!(?pending, "layout disabled");
        }
    }

    fn reproject<H: Host>(&mut self, host: &H, members: &Members, keep_momentum: bool) {
        self.projection = project(host, members, &self.settings.constraints);
        let seeded = if keep_momentum {
            self.driver.refresh(&self.projection)
        } else {
            self.driver.rebuild(&self.projection)
        };
        if let Err(err) = seeded {
            tracing::error!(%err, "rejected layout inputs, keeping the previous simulation");
        }
    }

    fn tick<H: Host>(&mut self, host: &mut H) {
        let started = Instant::now();
        self.driver.step();
        let stats = write_back(host, &mut self.driver, &self.settings.write_back);
        self.last_write_back = stats;

        let elapsed = started.elapsed();
        let tick = self.driver.last_tick();
        tracing::trace!(
            ticks = self.driver.ticks(),
            displacement = tick.total_displacement,
            written = stats.written,
            pinned = stats.pinned,
            skipped = stats.skipped,
            elapsed_us = elapsed.as_micros() as u64,
            "layout tick"
        );
        if elapsed > self.settings.frame_budget {
            tracing::warn!(
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.settings.frame_budget.as_secs_f64() * 1000.0,
                nodes = self.driver.ids().len(),
                "layout tick over frame budget"
            );
        }
    }
}

impl<H: Host> Lifecycle<H> for GraphLayout {
    fn on_membership_changed(&mut self, host: &mut H, members: &Members) {
        self.reproject(host, members, false);
    }

    fn on_attributes_changed(&mut self, host: &mut H, members: &Members, ids: &[EntityId]) {
        tracing::debug!(changed = ids.len(), "member attributes changed");
        self.reproject(host, members, true);
    }

    fn on_cleared(&mut self, host: &mut H, members: &Members) {
        self.disable(host);
        self.reproject(host, members, false);
    }

    fn on_frame(&mut self, host: &mut H, _members: &Members, token: FrameToken) -> bool {
        match self.phase {
            Phase::Running { pending } if pending == token => {
                self.tick(host);
                self.phase = Phase::Running {
                    pending: host.request_frame(),
                };
                true
            }
            _ => false,
        }
    }
}

/// Loop control and selection helpers for a [`GraphLayoutCollection`].
pub trait SimulationControl<H: Host> {
    fn enable(&mut self, host: &mut H);
    fn disable(&mut self, host: &mut H);
    fn is_running(&self) -> bool;

    /// Adds the host's selected entities, then clears the selection.
    fn add_selected(&mut self, host: &mut H);

    /// Removes the host's selected entities, then clears the selection.
    fn remove_selected(&mut self, host: &mut H);

    /// Empty: add everything on the surface and start. Otherwise: clear, which stops the loop.
    fn toggle_all(&mut self, host: &mut H);
}

impl<H: Host> SimulationControl<H> for Collection<H, GraphLayout> {
    fn enable(&mut self, host: &mut H) {
        let (members, layout) = self.parts_mut();
        layout.enable(host, members);
    }

    fn disable(&mut self, host: &mut H) {
        let (_, layout) = self.parts_mut();
        layout.disable(host);
    }

    fn is_running(&self) -> bool {
        self.lifecycle().is_running()
    }

    fn add_selected(&mut self, host: &mut H) {
        let selected: Vec<_> = host
            .selected_ids()
            .iter()
            .filter_map(|id| host.entity(id))
            .collect();
        self.add(host, selected);
        host.select_none();
    }

    fn remove_selected(&mut self, host: &mut H) {
        let selected = host.selected_ids();
        self.remove(host, &selected);
        host.select_none();
    }

    fn toggle_all(&mut self, host: &mut H) {
        if self.is_empty() {
            let all = host.surface_entities();
            self.add(host, all);
            SimulationControl::enable(self, host);
        } else {
            self.clear(host);
        }
    }
}
