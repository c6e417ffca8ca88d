use crate::error::{Error, Result};
use serde_json::{Map, Value, json};

/// JSON-shaped configuration with dotted-path access (`"layout.passes.unconstrained"`).
#[derive(Debug, Clone, PartialEq)]
pub struct ShoalConfig(Value);

impl Default for ShoalConfig {
    fn default() -> Self {
        Self(default_config_value())
    }
}

fn default_config_value() -> Value {
    json!({
        "layout": {
            "linkDistance": 100,
            "avoidOverlaps": true,
            "handleDisconnected": true,
            "passes": {
                "unconstrained": 1,
                "userConstraints": 1,
                "allConstraints": 1
            }
        },
        "writeBack": {
            "animate": false,
            "durationMs": 20,
            "easing": "easeInQuad"
        },
        "collection": {
            "deselectOnEnable": true
        },
        "frameBudgetMs": 16,
        "constraints": [
            {
                "scope": "nodes",
                "predicate": { "equals": { "attribute": "color", "value": "red" } },
                "axis": "x"
            },
            {
                "scope": "nodes",
                "predicate": { "equals": { "attribute": "color", "value": "blue" } },
                "axis": "y"
            },
            {
                "scope": "edges",
                "predicate": { "equals": { "attribute": "color", "value": "light-blue" } },
                "axis": "x"
            }
        ]
    })
}

impl ShoalConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parses JSON5 overrides and merges them onto the built-in defaults.
    pub fn from_json5_str(text: &str) -> Result<Self> {
        let overrides: Value = json5::from_str(text).map_err(|e| Error::ConfigSyntax {
            message: e.to_string(),
        })?;
        Self::with_overrides(&overrides)
    }

    /// Built-in defaults with `overrides` deep-merged on top. Arrays are replaced, not merged.
    pub fn with_overrides(overrides: &Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(Error::InvalidConfig {
                message: format!("expected an object at the top level, got {overrides}"),
            });
        }
        let mut cfg = Self::default();
        cfg.deep_merge(overrides);
        Ok(cfg)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.get(dotted_path)?.as_f64()
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        let v = self.get(dotted_path)?;
        v.as_u64().or_else(|| {
            // JSON5 numbers such as `2.0` still count as integers here.
            let f = v.as_f64()?;
            (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
        })
    }

    /// Writes `value` at `dotted_path`, creating intermediate objects as needed.
    ///
    /// A non-object met along the path is replaced by an empty object, so an override such as
    /// `layout.animate.duration` wins over an earlier scalar `layout.animate`.
    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur
                .entry(seg)
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

// Objects merge key by key; anything else (arrays included) replaces the base value whole.
fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
