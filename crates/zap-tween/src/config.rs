use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::Result;

/// Tweener configuration. Every field has a default, so a JSON document
/// only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenerConfig {
    /// Prefix for log lines from this tweener.
    pub label: String,
    /// Emit `log` records for lifecycle events.
    pub logging: bool,
    /// Curve used by [`Tweener::options`](crate::Tweener::options).
    pub default_curve: Easing,
    /// Whether new tweens write their start value right away.
    pub default_immediate: bool,
}

impl Default for TweenerConfig {
    fn default() -> Self {
        Self {
            label: "tweener".to_string(),
            logging: true,
            default_curve: Easing::Linear,
            default_immediate: true,
        }
    }
}

impl TweenerConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }
}
