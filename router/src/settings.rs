use serde::{Deserialize, Serialize};

/// Cost multipliers for horizontal and vertical trace length on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceCostFactor {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for TraceCostFactor {
    fn default() -> Self {
        TraceCostFactor {
            horizontal: 1.0,
            vertical: 1.0,
        }
    }
}

/// Tuning knobs of the geometry engines. Passed explicitly to every
/// operation; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Smallest distance a line or via is moved by the bisection searches.
    pub pull_tight_accuracy: i64,
    /// Budget for nested shoves of traces.
    pub max_shove_depth: i32,
    /// Budget for nested shoves of vias, counted separately.
    pub max_via_shove_depth: i32,
    pub max_spring_over_depth: i32,
    /// Upper bound on recursive via optimization calls per request.
    pub max_via_opt_depth: i32,
    /// Upper bound on optimization passes of one trace.
    pub max_pull_tight_iterations: usize,
    /// Corners flatter than this cosine of the turn angle are left alone.
    pub smoothing_max_cos: f64,
    pub pull_tight_after_insert: bool,
    /// Indexed by layer; missing layers cost 1 in both directions.
    pub trace_costs: Vec<TraceCostFactor>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        RouterSettings {
            pull_tight_accuracy: 500,
            max_shove_depth: 20,
            max_via_shove_depth: 8,
            max_spring_over_depth: 20,
            max_via_opt_depth: 10,
            max_pull_tight_iterations: 64,
            smoothing_max_cos: 0.999,
            pull_tight_after_insert: true,
            trace_costs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SettingsEnum {
    Bool(bool),
    Int(i64),
    Usize(usize),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
    #[error("setting {setting} expects a {expected} value")]
    WrongType { setting: String, expected: &'static str },
}

impl RouterSettings {
    pub fn trace_cost(&self, layer: usize) -> TraceCostFactor {
        self.trace_costs.get(layer).copied().unwrap_or_default()
    }

    pub fn get(&self, setting: &str) -> Result<SettingsEnum, SettingsError> {
        let value = match setting {
            "pull_tight_accuracy" => SettingsEnum::Int(self.pull_tight_accuracy),
            "max_shove_depth" => SettingsEnum::Int(i64::from(self.max_shove_depth)),
            "max_via_shove_depth" => SettingsEnum::Int(i64::from(self.max_via_shove_depth)),
            "max_spring_over_depth" => SettingsEnum::Int(i64::from(self.max_spring_over_depth)),
            "max_via_opt_depth" => SettingsEnum::Int(i64::from(self.max_via_opt_depth)),
            "max_pull_tight_iterations" => SettingsEnum::Usize(self.max_pull_tight_iterations),
            "smoothing_max_cos" => SettingsEnum::Float(self.smoothing_max_cos),
            "pull_tight_after_insert" => SettingsEnum::Bool(self.pull_tight_after_insert),
            _ => return Err(SettingsError::UnknownSetting(setting.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, setting: &str, value: SettingsEnum) -> Result<(), SettingsError> {
        let wrong_type = |expected| SettingsError::WrongType {
            setting: setting.to_string(),
            expected,
        };
        let as_int = |value: &SettingsEnum| match value {
            SettingsEnum::Int(v) => Some(*v),
            SettingsEnum::Usize(v) => i64::try_from(*v).ok(),
            _ => None,
        };
        let as_depth = |value: &SettingsEnum| as_int(value).and_then(|v| i32::try_from(v).ok());
        match setting {
            "pull_tight_accuracy" => self.pull_tight_accuracy = as_int(&value).ok_or_else(|| wrong_type("integer"))?.max(1),
            "max_shove_depth" => self.max_shove_depth = as_depth(&value).ok_or_else(|| wrong_type("32-bit integer"))?,
            "max_via_shove_depth" => {
                self.max_via_shove_depth = as_depth(&value).ok_or_else(|| wrong_type("32-bit integer"))?
            }
            "max_spring_over_depth" => {
                self.max_spring_over_depth = as_depth(&value).ok_or_else(|| wrong_type("32-bit integer"))?
            }
            "max_via_opt_depth" => self.max_via_opt_depth = as_depth(&value).ok_or_else(|| wrong_type("32-bit integer"))?,
            "max_pull_tight_iterations" => {
                self.max_pull_tight_iterations = as_int(&value)
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| wrong_type("non-negative integer"))?
            }
            "smoothing_max_cos" => match value {
                SettingsEnum::Float(v) => self.smoothing_max_cos = v,
                _ => return Err(wrong_type("float")),
            },
            "pull_tight_after_insert" => match value {
                SettingsEnum::Bool(v) => self.pull_tight_after_insert = v,
                _ => return Err(wrong_type("bool")),
            },
            _ => return Err(SettingsError::UnknownSetting(setting.to_string())),
        }
        tracing::debug!(setting, ?value, "router setting changed");
        Ok(())
    }
}
