#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig`] collects the timing and spacing knobs of a session.
//! Defaults suit an interactive canvas; hosts can override them in code with
//! the `with_*` builders or from the environment with
//! [`EngineConfig::from_env`]:
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `ARBOR_ANIMATION_MS` | `animation_duration` | integer milliseconds |
//! | `ARBOR_RELAYOUT_DELAY_MS` | `relayout_delay` | integer milliseconds |
//! | `ARBOR_DELETION_DELAY_MS` | `deletion_delay` | integer milliseconds |
//! | `ARBOR_HISTORY_LIMIT` | `history_limit` | positive integer |
//! | `ARBOR_SPACING` | `layout` spacing | `compact`, `normal`, `wide` |

use std::fmt;
use std::time::Duration;

use arbor_core::LayoutType;
use arbor_core::model::DEFAULT_LAYOUT_TYPE;
use arbor_layout::{LayoutOptions, SpacingProfile};

/// Tunables for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Spacing and fallback sizing for layout passes.
    pub layout: LayoutOptions,
    /// Active spacing preset (already folded into `layout`).
    pub spacing_profile: SpacingProfile,
    /// Length of a layout transition.
    pub animation_duration: Duration,
    /// Delay between a structural edit and the relayout it triggers, giving
    /// the renderer a chance to report the new node's size. Bounded: the
    /// relayout runs when it expires whether or not a size arrived.
    pub relayout_delay: Duration,
    /// Time deleted nodes stay visible (flagged) before removal. Zero
    /// removes them immediately.
    pub deletion_delay: Duration,
    /// Maximum number of undo steps retained.
    pub history_limit: usize,
    /// Layout for new roots.
    pub default_layout_type: LayoutType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            spacing_profile: SpacingProfile::Normal,
            animation_duration: Duration::from_millis(800),
            relayout_delay: Duration::from_millis(200),
            deletion_delay: Duration::from_millis(300),
            history_limit: 50,
            default_layout_type: DEFAULT_LAYOUT_TYPE,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_spacing_profile(mut self, profile: SpacingProfile) -> Self {
        self.spacing_profile = profile;
        self.layout = self.layout.with_profile(profile);
        self
    }

    #[must_use]
    pub fn with_animation_duration(mut self, duration: Duration) -> Self {
        self.animation_duration = duration;
        self
    }

    #[must_use]
    pub fn with_relayout_delay(mut self, delay: Duration) -> Self {
        self.relayout_delay = delay;
        self
    }

    #[must_use]
    pub fn with_deletion_delay(mut self, delay: Duration) -> Self {
        self.deletion_delay = delay;
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_default_layout_type(mut self, layout: LayoutType) -> Self {
        self.default_layout_type = layout;
        self
    }

    /// Defaults overridden by `ARBOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `ARBOR_*`
    /// key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = read_millis(&lookup, "ARBOR_ANIMATION_MS")? {
            config.animation_duration = ms;
        }
        if let Some(ms) = read_millis(&lookup, "ARBOR_RELAYOUT_DELAY_MS")? {
            config.relayout_delay = ms;
        }
        if let Some(ms) = read_millis(&lookup, "ARBOR_DELETION_DELAY_MS")? {
            config.deletion_delay = ms;
        }
        if let Some(raw) = lookup("ARBOR_HISTORY_LIMIT") {
            let limit = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| ConfigError::invalid("ARBOR_HISTORY_LIMIT", &raw))?;
            config.history_limit = limit;
        }
        if let Some(raw) = lookup("ARBOR_SPACING") {
            let profile = raw
                .parse::<SpacingProfile>()
                .map_err(|_| ConfigError::invalid("ARBOR_SPACING", &raw))?;
            config = config.with_spacing_profile(profile);
        }
        Ok(config)
    }
}

fn read_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::invalid(key, &raw)),
    }
}

/// An environment override could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value {value:?} for {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.animation_duration, Duration::from_millis(800));
        assert_eq!(config.relayout_delay, Duration::from_millis(200));
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.layout.horizontal_spacing, 200.0);
        assert_eq!(config.layout.vertical_spacing, 80.0);
    }

    #[test]
    fn lookup_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("ARBOR_ANIMATION_MS", "120"),
            ("ARBOR_DELETION_DELAY_MS", "0"),
            ("ARBOR_HISTORY_LIMIT", "7"),
            ("ARBOR_SPACING", "compact"),
        ]))
        .unwrap();
        assert_eq!(config.animation_duration, Duration::from_millis(120));
        assert_eq!(config.deletion_delay, Duration::ZERO);
        assert_eq!(config.history_limit, 7);
        assert_eq!(config.spacing_profile, SpacingProfile::Compact);
        assert_eq!(config.layout.horizontal_spacing, 150.0);
        assert_eq!(config.relayout_delay, Duration::from_millis(200));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[("ARBOR_HISTORY_LIMIT", "0")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value \"0\" for ARBOR_HISTORY_LIMIT"
        );
        assert!(EngineConfig::from_lookup(lookup(&[("ARBOR_ANIMATION_MS", "fast")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("ARBOR_SPACING", "roomy")])).is_err());
    }

    #[test]
    fn history_limit_is_never_zero() {
        assert_eq!(EngineConfig::default().with_history_limit(0).history_limit, 1);
    }
}
