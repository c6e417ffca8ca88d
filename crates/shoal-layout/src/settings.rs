//! Typed view of the layout-related parts of [`ShoalConfig`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shoal_core::{Easing, Entity, ShoalConfig, Transition};
use std::time::Duration;

/// Which members a [`ConstraintRule`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleScope {
    /// Matching nodes join the group.
    Nodes,
    /// Matching edges put both of their endpoints into the group instead of becoming links.
    Edges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributePredicate {
    Equals { attribute: String, value: Value },
    Present { attribute: String },
}

impl AttributePredicate {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            AttributePredicate::Equals { attribute, value } => {
                entity.attribute(attribute) == Some(value)
            }
            AttributePredicate::Present { attribute } => entity.attribute(attribute).is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintAxis {
    X,
    Y,
}

impl From<ConstraintAxis> for narwhal::Axis {
    fn from(value: ConstraintAxis) -> Self {
        match value {
            ConstraintAxis::X => narwhal::Axis::X,
            ConstraintAxis::Y => narwhal::Axis::Y,
        }
    }
}

/// Groups members by an attribute predicate into one alignment constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub scope: RuleScope,
    pub predicate: AttributePredicate,
    pub axis: ConstraintAxis,
}

impl ConstraintRule {
    pub fn nodes_equal(attribute: &str, value: impl Into<Value>, axis: ConstraintAxis) -> Self {
        Self {
            scope: RuleScope::Nodes,
            predicate: AttributePredicate::Equals {
                attribute: attribute.to_string(),
                value: value.into(),
            },
            axis,
        }
    }

    pub fn edges_equal(attribute: &str, value: impl Into<Value>, axis: ConstraintAxis) -> Self {
        Self {
            scope: RuleScope::Edges,
            ..Self::nodes_equal(attribute, value, axis)
        }
    }
}

/// Red nodes stack vertically, blue nodes line up horizontally, light-blue edges stack their
/// endpoints.
pub fn default_rules() -> Vec<ConstraintRule> {
    vec![
        ConstraintRule::nodes_equal("color", "red", ConstraintAxis::X),
        ConstraintRule::nodes_equal("color", "blue", ConstraintAxis::Y),
        ConstraintRule::edges_equal("color", "light-blue", ConstraintAxis::X),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteBackSettings {
    pub animate: bool,
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for WriteBackSettings {
    fn default() -> Self {
        Self {
            animate: false,
            duration: Duration::from_millis(20),
            easing: Easing::EaseInQuad,
        }
    }
}

impl WriteBackSettings {
    /// The transition attached to each position write, if any.
    pub fn transition(&self) -> Option<Transition> {
        self.animate.then_some(Transition {
            duration: self.duration,
            easing: self.easing,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    /// Travel distance added on top of the edge-to-edge gap of linked nodes.
    pub link_distance: f64,
    pub avoid_overlaps: bool,
    pub handle_disconnected: bool,
    pub passes: narwhal::TickPasses,
    pub write_back: WriteBackSettings,
    pub deselect_on_enable: bool,
    pub frame_budget: Duration,
    pub constraints: Vec<ConstraintRule>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            avoid_overlaps: true,
            handle_disconnected: true,
            passes: narwhal::TickPasses::default(),
            write_back: WriteBackSettings::default(),
            deselect_on_enable: true,
            frame_budget: Duration::from_millis(16),
            constraints: default_rules(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> Error {
    Error::InvalidSettings {
        key: key.to_string(),
        message: message.into(),
    }
}

fn read_bool(cfg: &ShoalConfig, key: &str, default: bool) -> Result<bool> {
    match cfg.get(key) {
        None => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| invalid(key, format!("expected a boolean, got {v}"))),
    }
}

fn read_non_negative(cfg: &ShoalConfig, key: &str, default: f64) -> Result<f64> {
    match cfg.get(key) {
        None => Ok(default),
        Some(v) => v
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .ok_or_else(|| invalid(key, format!("expected a non-negative number, got {v}"))),
    }
}

fn read_count(cfg: &ShoalConfig, key: &str, default: usize) -> Result<usize> {
    if cfg.get(key).is_none() {
        return Ok(default);
    }
    cfg.get_u64(key)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(key, "expected a non-negative integer"))
}

fn millis(ms: f64) -> Duration {
    Duration::from_micros((ms * 1000.0).round() as u64)
}

impl LayoutSettings {
    pub fn from_config(cfg: &ShoalConfig) -> Result<Self> {
        let d = Self::default();

        let link_distance = read_non_negative(cfg, "layout.linkDistance", d.link_distance)?;
        if link_distance == 0.0 {
            return Err(invalid("layout.linkDistance", "must be greater than zero"));
        }

        let passes = narwhal::TickPasses {
            unconstrained: read_count(
                cfg,
                "layout.passes.unconstrained",
                d.passes.unconstrained,
            )?,
            user_constraints: read_count(
                cfg,
                "layout.passes.userConstraints",
                d.passes.user_constraints,
            )?,
            all_constraints: read_count(
                cfg,
                "layout.passes.allConstraints",
                d.passes.all_constraints,
            )?,
        };

        let easing = match cfg.get("writeBack.easing") {
            None => d.write_back.easing,
            Some(v) => serde_json::from_value::<Easing>(v.clone())
                .map_err(|e| invalid("writeBack.easing", e.to_string()))?,
        };
        let duration_ms = read_non_negative(
            cfg,
            "writeBack.durationMs",
            d.write_back.duration.as_millis() as f64,
        )?;
        let write_back = WriteBackSettings {
            animate: read_bool(cfg, "writeBack.animate", d.write_back.animate)?,
            duration: millis(duration_ms),
            easing,
        };

        let budget_ms = read_non_negative(
            cfg,
            "frameBudgetMs",
            d.frame_budget.as_millis() as f64,
        )?;

        let constraints = match cfg.get("constraints") {
            None => d.constraints,
            Some(v) => serde_json::from_value::<Vec<ConstraintRule>>(v.clone())
                .map_err(|e| invalid("constraints", e.to_string()))?,
        };

        Ok(Self {
            link_distance,
            avoid_overlaps: read_bool(cfg, "layout.avoidOverlaps", d.avoid_overlaps)?,
            handle_disconnected: read_bool(
                cfg,
                "layout.handleDisconnected",
                d.handle_disconnected,
            )?,
            passes,
            write_back,
            deselect_on_enable: read_bool(
                cfg,
                "collection.deselectOnEnable",
                d.deselect_on_enable,
            )?,
            frame_budget: millis(budget_ms),
            constraints,
        })
    }

    pub fn solver_options(&self) -> narwhal::LayoutOptions {
        narwhal::LayoutOptions {
            avoid_overlaps: self.avoid_overlaps,
            handle_disconnected: self.handle_disconnected,
            default_link_distance: self.link_distance,
            ..narwhal::LayoutOptions::default()
        }
    }
}
