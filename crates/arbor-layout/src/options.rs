#![forbid(unsafe_code)]

//! Spacing options shared by every strategy.

use std::fmt;
use std::str::FromStr;

use arbor_core::Size;

/// Size assumed for nodes the renderer has not measured yet.
pub const FALLBACK_NODE_SIZE: Size = Size::new(180.0, 50.0);

/// Spacing and sizing inputs to a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Gap between a parent and its children in horizontal layouts, and
    /// between siblings in vertical layouts.
    pub horizontal_spacing: f64,
    /// Gap between siblings in horizontal layouts, and between a parent and
    /// its children in vertical layouts.
    pub vertical_spacing: f64,
    /// Radius from a root to its first ring in radial arrangements.
    pub base_radius: f64,
    /// Additional radius per level in radial arrangements.
    pub radius_increment: f64,
    /// Box used for unmeasured nodes.
    pub fallback_size: Size,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            horizontal_spacing: 200.0,
            vertical_spacing: 80.0,
            base_radius: 200.0,
            radius_increment: 150.0,
            fallback_size: FALLBACK_NODE_SIZE,
        }
    }
}

impl LayoutOptions {
    #[must_use]
    pub fn with_spacing(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }

    /// Apply a named spacing preset, keeping the radial settings.
    #[must_use]
    pub fn with_profile(self, profile: SpacingProfile) -> Self {
        let (horizontal, vertical) = profile.spacing();
        self.with_spacing(horizontal, vertical)
    }

    #[must_use]
    pub fn with_fallback_size(mut self, size: Size) -> Self {
        self.fallback_size = size;
        self
    }

    /// The size a node occupies during layout.
    #[must_use]
    pub fn size_of(&self, measured: Option<Size>) -> Size {
        match measured {
            Some(size) if !size.is_degenerate() => size,
            _ => self.fallback_size,
        }
    }
}

/// Named spacing presets offered to authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpacingProfile {
    Compact,
    #[default]
    Normal,
    Wide,
}

impl SpacingProfile {
    /// `(horizontal, vertical)` spacing for the preset.
    #[must_use]
    pub const fn spacing(self) -> (f64, f64) {
        match self {
            SpacingProfile::Compact => (150.0, 50.0),
            SpacingProfile::Normal => (200.0, 80.0),
            SpacingProfile::Wide => (260.0, 120.0),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SpacingProfile::Compact => "compact",
            SpacingProfile::Normal => "normal",
            SpacingProfile::Wide => "wide",
        }
    }
}

impl fmt::Display for SpacingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a spacing profile name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProfile(pub String);

impl fmt::Display for UnknownProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown spacing profile {:?} (expected compact, normal, or wide)",
            self.0
        )
    }
}

impl std::error::Error for UnknownProfile {}

impl FromStr for SpacingProfile {
    type Err = UnknownProfile;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(SpacingProfile::Compact),
            "normal" => Ok(SpacingProfile::Normal),
            "wide" => Ok(SpacingProfile::Wide),
            _ => Err(UnknownProfile(raw.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_normal_profile() {
        let opts = LayoutOptions::default();
        assert_eq!(
            (opts.horizontal_spacing, opts.vertical_spacing),
            SpacingProfile::Normal.spacing()
        );
    }

    #[test]
    fn unmeasured_and_degenerate_sizes_fall_back() {
        let opts = LayoutOptions::default();
        assert_eq!(opts.size_of(None), FALLBACK_NODE_SIZE);
        assert_eq!(opts.size_of(Some(Size::new(0.0, 0.0))), FALLBACK_NODE_SIZE);
        let real = Size::new(120.0, 40.0);
        assert_eq!(opts.size_of(Some(real)), real);
    }

    #[test]
    fn profile_parsing() {
        assert_eq!("Wide".parse::<SpacingProfile>(), Ok(SpacingProfile::Wide));
        assert!("huge".parse::<SpacingProfile>().is_err());
        let opts = LayoutOptions::default().with_profile(SpacingProfile::Compact);
        assert_eq!(opts.vertical_spacing, 50.0);
        assert_eq!(opts.base_radius, 200.0);
    }
}
