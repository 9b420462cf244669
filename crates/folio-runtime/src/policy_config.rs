#![forbid(unsafe_code)]

//! Policy-as-data configuration for the profile page.
//!
//! Every tunable constant behind the page's behavior lives in one
//! [`PageConfig`] that can be loaded from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # folio.toml
//! [sequencer]
//! tick_interval_ms = 28
//! step = 1.6
//!
//! [[sequencer.steps]]
//! threshold = 0.0
//! label = "LOADING PROFILE DATA"
//!
//! [media]
//! threshold = 0.3
//! ```
//!
//! ```rust,ignore
//! let config = PageConfig::from_toml_file("folio.toml")?;
//! let sequencer = config.to_sequencer_config();
//! ```
//!
//! # Defaults
//!
//! `PageConfig::default()` reproduces the shipped page exactly. Every
//! section is `#[serde(default)]`, so a file only needs the keys it changes.

#[cfg(feature = "policy-config")]
use std::path::Path;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};
use folio_core::animation::{Tween, ease_in_out};
use web_time::Duration;

use crate::cursor::{CursorPalette, FollowSpring};
use crate::media::MediaConfig;
use crate::reveal::EntranceConfig;
use crate::scroll::ScrollConfig;
use crate::sequencer::{SequencerConfig, StepTable};

// ---------------------------------------------------------------------------
// Top-level PageConfig
// ---------------------------------------------------------------------------

/// Top-level page configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct PageConfig {
    /// Boot progress sequence.
    pub sequencer: SequencerPolicyConfig,
    /// Scroll-derived transforms.
    pub scroll: ScrollPolicyConfig,
    /// Reveal-on-appearance entrances.
    pub reveal: RevealPolicyConfig,
    /// Lazy media embeds.
    pub media: MediaPolicyConfig,
    /// Cursor overlay palette and follow spring.
    pub cursor: CursorPolicyConfig,
    /// Visibility oracle fallback.
    pub visibility: VisibilityPolicyConfig,
    /// Navigation links.
    pub nav: NavPolicyConfig,
}

impl PageConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.to_sequencer_config().validate());
        errors.extend(self.sequencer.steps.validate());
        if !(self.sequencer.exit_scale.is_finite() && self.sequencer.exit_scale > 0.0) {
            errors.push(format!(
                "sequencer.exit_scale must be > 0, got {}",
                self.sequencer.exit_scale
            ));
        }

        if self.scroll.fade_distance.is_nan() || self.scroll.fade_distance <= 0.0 {
            errors.push(format!(
                "scroll.fade_distance must be > 0, got {}",
                self.scroll.fade_distance
            ));
        }

        if !self.reveal.distance.is_finite() {
            errors.push("reveal.distance must be finite".into());
        }
        if !self.reveal.margin.is_finite() {
            errors.push("reveal.margin must be finite".into());
        }

        if !(0.0..=1.0).contains(&self.media.threshold) || self.media.threshold == 0.0 {
            errors.push(format!(
                "media.threshold must be in (0, 1], got {}",
                self.media.threshold
            ));
        }
        if self.media.embed_base.is_empty() {
            errors.push("media.embed_base must not be empty".into());
        }

        for (name, hex) in [("base", &self.cursor.base), ("accent", &self.cursor.accent)] {
            if !is_hex_color(hex) {
                errors.push(format!("cursor.{name} must be a #rrggbb color, got {hex:?}"));
            }
        }
        let c = &self.cursor;
        let positive = |v: f64| v > 0.0;
        if !positive(c.stiffness) || !positive(c.mass) || c.damping.is_nan() || c.damping < 0.0 {
            errors.push("cursor spring needs stiffness > 0, mass > 0, damping >= 0".into());
        }

        if self.visibility.poll_interval_ms == 0 {
            errors.push("visibility.poll_interval_ms must be > 0".into());
        }

        for (i, link) in self.nav.links.iter().enumerate() {
            if link.href.is_empty() {
                errors.push(format!("nav.links[{i}].href must not be empty"));
            }
        }

        errors
    }

    /// Like [`validate`](Self::validate), but as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Build a [`SequencerConfig`] from this config.
    #[must_use]
    pub fn to_sequencer_config(&self) -> SequencerConfig {
        let s = &self.sequencer;
        let config = SequencerConfig {
            tick_interval: Duration::from_millis(s.tick_interval_ms),
            step: s.step,
            settle_delay: Duration::from_millis(s.settle_ms),
            exit_delay: Duration::from_millis(s.exit_ms),
        };
        match s.nominal_duration_ms {
            Some(ms) => config.with_nominal_duration(Duration::from_millis(ms)),
            None => config,
        }
    }

    /// The step table.
    #[must_use]
    pub fn to_step_table(&self) -> StepTable {
        self.sequencer.steps.clone()
    }

    /// Build a [`ScrollConfig`] from this config.
    #[must_use]
    pub fn to_scroll_config(&self) -> ScrollConfig {
        ScrollConfig {
            fade_distance: self.scroll.fade_distance,
            condensed_threshold: self.scroll.condensed_threshold,
        }
    }

    /// Build an [`EntranceConfig`] from this config.
    #[must_use]
    pub fn to_entrance_config(&self) -> EntranceConfig {
        EntranceConfig {
            duration: Duration::from_millis(self.reveal.duration_ms),
            distance: self.reveal.distance,
            ..EntranceConfig::default()
        }
    }

    /// Stagger delay for the `index`-th item of a revealed group:
    /// `stagger_base_ms + index * stagger_ms`.
    #[must_use]
    pub fn reveal_stagger(&self, index: u32) -> Duration {
        let per_item = self.reveal.stagger_ms.saturating_mul(u64::from(index));
        Duration::from_millis(self.reveal.stagger_base_ms.saturating_add(per_item))
    }

    /// Overlay exit transition, sampled from the start of
    /// [`Phase::Exiting`](crate::Phase::Exiting).
    #[must_use]
    pub fn exit_tween(&self) -> Tween {
        Tween::new(Duration::from_millis(self.sequencer.exit_ms)).easing(ease_in_out)
    }

    /// Main content fade-in, sampled from the start of
    /// [`Phase::Done`](crate::Phase::Done).
    #[must_use]
    pub fn content_fade_tween(&self) -> Tween {
        Tween::new(Duration::from_millis(self.sequencer.content_fade_ms)).easing(ease_in_out)
    }

    /// Build a [`MediaConfig`] from this config.
    #[must_use]
    pub fn to_media_config(&self) -> MediaConfig {
        MediaConfig {
            threshold: self.media.threshold,
            embed_base: self.media.embed_base.clone(),
            placeholder: self.media.placeholder.clone(),
        }
    }

    /// Build a [`CursorPalette`] from this config.
    #[must_use]
    pub fn to_cursor_palette(&self) -> CursorPalette {
        CursorPalette {
            base: self.cursor.base.clone(),
            accent: self.cursor.accent.clone(),
        }
    }

    /// Build the cursor [`FollowSpring`] from this config.
    #[must_use]
    pub fn to_follow_spring(&self) -> FollowSpring {
        FollowSpring {
            stiffness: self.cursor.stiffness,
            damping: self.cursor.damping,
            mass: self.cursor.mass,
        }
    }

    /// Visibility polling cadence.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.visibility.poll_interval_ms)
    }

    /// Format as a JSONL line for structured logging.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"schema":"folio-page-config-v1","tick_interval_ms":{},"step":{},"steps":{},"fade_distance":{},"reveal_margin":{},"media_threshold":{},"poll_interval_ms":{},"nav_links":{}}}"#,
            self.sequencer.tick_interval_ms,
            self.sequencer.step,
            self.sequencer.steps.len(),
            self.scroll.fade_distance,
            self.reveal.margin,
            self.media.threshold,
            self.visibility.poll_interval_ms,
            self.nav.links.len(),
        )
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Sub-configs (flat, serde-friendly)
// ---------------------------------------------------------------------------

/// Boot progress parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct SequencerPolicyConfig {
    /// Progress timer period (ms). Default: 28.
    pub tick_interval_ms: u64,
    /// Percent added per tick. Default: 1.6.
    pub step: f64,
    /// When set, overrides `step` so progress takes about this long (ms).
    pub nominal_duration_ms: Option<u64>,
    /// Pause at 100% before the exit animation (ms). Default: 400.
    pub settle_ms: u64,
    /// Exit animation length (ms). Default: 700.
    pub exit_ms: u64,
    /// Overlay scale at the end of the exit animation. Default: 1.03.
    pub exit_scale: f64,
    /// Main content fade-in after the overlay is gone (ms). Default: 700.
    pub content_fade_ms: u64,
    /// Milestone labels.
    pub steps: StepTable,
}

impl Default for SequencerPolicyConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 28,
            step: 1.6,
            nominal_duration_ms: None,
            settle_ms: 400,
            exit_ms: 700,
            exit_scale: 1.03,
            content_fade_ms: 700,
            steps: StepTable::profile(),
        }
    }
}

/// Scroll transform parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct ScrollPolicyConfig {
    /// Scroll distance over which the hero fades out. Default: 200.
    pub fade_distance: f64,
    /// Offset beyond which the nav bar condenses. Default: 50.
    pub condensed_threshold: f64,
}

impl Default for ScrollPolicyConfig {
    fn default() -> Self {
        Self {
            fade_distance: 200.0,
            condensed_threshold: 50.0,
        }
    }
}

/// Reveal entrance parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct RevealPolicyConfig {
    /// Entrance duration (ms). Default: 600.
    pub duration_ms: u64,
    /// Starting vertical offset. Default: 50.
    pub distance: f64,
    /// Viewport root margin; negative fires later. Default: -100.
    pub margin: f64,
    /// Delay before the first item of a group (ms). Default: 300.
    pub stagger_base_ms: u64,
    /// Delay added per item in a group (ms). Default: 150.
    pub stagger_ms: u64,
}

impl Default for RevealPolicyConfig {
    fn default() -> Self {
        Self {
            duration_ms: 600,
            distance: 50.0,
            margin: -100.0,
            stagger_base_ms: 300,
            stagger_ms: 150,
        }
    }
}

/// Lazy media parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct MediaPolicyConfig {
    /// Visible ratio that triggers loading. Default: 0.3.
    pub threshold: f64,
    /// Embed URL prefix.
    pub embed_base: String,
    /// Placeholder hint.
    pub placeholder: String,
}

impl Default for MediaPolicyConfig {
    fn default() -> Self {
        let media = MediaConfig::default();
        Self {
            threshold: media.threshold,
            embed_base: media.embed_base,
            placeholder: media.placeholder,
        }
    }
}

/// Cursor overlay parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct CursorPolicyConfig {
    /// Idle color. Default: `#0ea5e9`.
    pub base: String,
    /// Hover color. Default: `#f59e0b`.
    pub accent: String,
    /// Follow spring stiffness. Default: 600.
    pub stiffness: f64,
    /// Follow spring damping. Default: 32.
    pub damping: f64,
    /// Follow spring mass. Default: 0.08.
    pub mass: f64,
}

impl Default for CursorPolicyConfig {
    fn default() -> Self {
        let palette = CursorPalette::default();
        let spring = FollowSpring::default();
        Self {
            base: palette.base,
            accent: palette.accent,
            stiffness: spring.stiffness,
            damping: spring.damping,
            mass: spring.mass,
        }
    }
}

/// Visibility oracle parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct VisibilityPolicyConfig {
    /// Polling fallback cadence (ms). Default: 100.
    pub poll_interval_ms: u64,
}

impl Default for VisibilityPolicyConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// One navigation link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
pub struct NavLink {
    pub name: String,
    pub href: String,
}

impl NavLink {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// Navigation bar parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct NavPolicyConfig {
    /// Section anchors in display order.
    pub links: Vec<NavLink>,
}

impl Default for NavPolicyConfig {
    fn default() -> Self {
        Self {
            links: vec![
                NavLink::new("About", "#about"),
                NavLink::new("Education", "#education"),
                NavLink::new("Projects", "#projects"),
                NavLink::new("Experience", "#experience"),
                NavLink::new("Skills", "#skills"),
                NavLink::new("Contact", "#contact"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a page configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
