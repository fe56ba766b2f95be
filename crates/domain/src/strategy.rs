//! Strategy: the single active automation configuration.
//!
//! A strategy is never mutated in place: updates build a new value through
//! [`Strategy::apply`], which validates before anything is replaced.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationRejected;
use crate::time::{EpochMillis, MILLIS_PER_MINUTE};

/// Whether automation is allowed to actuate valves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Auto,
    Manual,
}

/// How automatic decisions are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoMethod {
    /// Two global humidity cutoffs applied to the zone-mapped valve.
    #[default]
    Threshold,
    /// Ordered sensor → valve rules.
    Policy,
}

fn default_low() -> f64 {
    35.0
}

fn default_high() -> f64 {
    45.0
}

fn default_open_duration() -> u64 {
    600
}

fn default_cooldown() -> f64 {
    20.0
}

/// Automation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub auto_method: AutoMethod,
    #[serde(default = "default_low")]
    pub humidity_low_pct: f64,
    #[serde(default = "default_high")]
    pub humidity_high_pct: f64,
    /// Default open duration, in seconds.
    #[serde(default = "default_open_duration")]
    pub open_duration_sec: u64,
    /// Open duration for manual opens, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_open_duration_sec: Option<u64>,
    #[serde(default = "default_cooldown")]
    pub cooldown_minutes: f64,
    #[serde(default)]
    pub updated_at: EpochMillis,
    /// Deployment-specific settings the core does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            auto_method: AutoMethod::Threshold,
            humidity_low_pct: default_low(),
            humidity_high_pct: default_high(),
            open_duration_sec: default_open_duration(),
            manual_open_duration_sec: None,
            cooldown_minutes: default_cooldown(),
            updated_at: 0,
            extra: serde_json::Map::new(),
        }
    }
}

impl Strategy {
    /// Whether automation may actuate valves.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.mode == Mode::Auto
    }

    /// Minimum time between two automatic opens of the same valve.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn cooldown_ms(&self) -> i64 {
        (self.cooldown_minutes * MILLIS_PER_MINUTE as f64) as i64
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationRejected`] when:
    /// - a threshold is not finite ([`ConfigurationRejected::NonFiniteThreshold`])
    /// - `low >= high` ([`ConfigurationRejected::InvertedThresholds`])
    /// - the cooldown is negative or not finite ([`ConfigurationRejected::InvalidCooldown`])
    /// - the default open duration is zero ([`ConfigurationRejected::ZeroOpenDuration`])
    pub fn validate(&self) -> Result<(), ConfigurationRejected> {
        let (low, high) = (self.humidity_low_pct, self.humidity_high_pct);
        if !low.is_finite() || !high.is_finite() {
            return Err(ConfigurationRejected::NonFiniteThreshold);
        }
        if low >= high {
            return Err(ConfigurationRejected::InvertedThresholds { low, high });
        }
        if !self.cooldown_minutes.is_finite() || self.cooldown_minutes < 0.0 {
            return Err(ConfigurationRejected::InvalidCooldown);
        }
        if self.open_duration_sec == 0 {
            return Err(ConfigurationRejected::ZeroOpenDuration);
        }
        Ok(())
    }

    /// Overlay `patch` and return the validated replacement.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationRejected`] if the resulting strategy is invalid;
    /// `self` is left untouched either way.
    pub fn apply(
        &self,
        patch: StrategyPatch,
        now: EpochMillis,
    ) -> Result<Self, ConfigurationRejected> {
        let mut next = self.clone();
        if let Some(mode) = patch.mode {
            next.mode = mode;
        }
        if let Some(method) = patch.auto_method {
            next.auto_method = method;
        }
        if let Some(low) = patch.humidity_low_pct {
            next.humidity_low_pct = low;
        }
        if let Some(high) = patch.humidity_high_pct {
            next.humidity_high_pct = high;
        }
        if let Some(duration) = patch.open_duration_sec {
            next.open_duration_sec = duration;
        }
        if let Some(duration) = patch.manual_open_duration_sec {
            next.manual_open_duration_sec = Some(duration);
        }
        if let Some(cooldown) = patch.cooldown_minutes {
            next.cooldown_minutes = cooldown;
        }
        next.extra.extend(
            patch
                .extra
                .into_iter()
                .filter(|(key, _)| key != "updatedAt"),
        );
        next.updated_at = now;
        next.validate()?;
        Ok(next)
    }

    /// Same strategy with a different mode.
    #[must_use]
    pub fn with_mode(&self, mode: Mode, now: EpochMillis) -> Self {
        Self {
            mode,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Partial strategy update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPatch {
    pub mode: Option<Mode>,
    pub auto_method: Option<AutoMethod>,
    pub humidity_low_pct: Option<f64>,
    pub humidity_high_pct: Option<f64>,
    pub open_duration_sec: Option<u64>,
    pub manual_open_duration_sec: Option<u64>,
    pub cooldown_minutes: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
