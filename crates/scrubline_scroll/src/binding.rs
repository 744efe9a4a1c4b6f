//! Scroll bindings
//!
//! A binding maps the live scroll offset to normalized progress across a
//! trigger region. The region starts where a chosen edge of the trigger
//! element meets a chosen line of the viewport (`"top top"`, `"top 80%"`)
//! and extends by a fixed length (`"+=130%"` of the viewport height, or
//! pixels).
//!
//! Progress can follow the scroll offset exactly or chase it with
//! exponential smoothing, and the trigger element can be pinned while the
//! region is being scrolled through.

use std::fmt;
use std::str::FromStr;

use scrubline_core::error::ConfigError;
use scrubline_core::events::PinTransition;
use scrubline_core::host::{ElementId, ElementStore, Rect, Selector, Size, Viewport};
use serde::{Deserialize, Serialize};

/// Gap below which smoothed progress snaps to raw progress
pub const SMOOTHING_SNAP: f32 = 1e-4;

/// Frame length assumed when converting a scrub lag to a per-tick factor
pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

// ============================================================================
// Anchors
// ============================================================================

/// Where the region starts: the point `element` of the way down the trigger
/// element reaches the line `viewport` of the way down the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StartAnchor {
    pub element: f32,
    pub viewport: f32,
}

impl StartAnchor {
    /// `"top top"`
    pub const TOP_TOP: StartAnchor = StartAnchor {
        element: 0.0,
        viewport: 0.0,
    };

    /// Trigger top crossing the given viewport line, e.g. `"top 80%"`
    pub const fn top_at(viewport: f32) -> Self {
        Self {
            element: 0.0,
            viewport,
        }
    }

    /// Scroll offset at which this anchor is reached
    pub fn scroll_offset(&self, trigger: Rect, viewport: Size) -> f32 {
        trigger.top() + self.element * trigger.height - self.viewport * viewport.height
    }
}

impl Default for StartAnchor {
    fn default() -> Self {
        Self::TOP_TOP
    }
}

fn parse_edge(token: &str) -> Option<f32> {
    match token {
        "top" => Some(0.0),
        "center" => Some(0.5),
        "bottom" => Some(1.0),
        _ => token
            .strip_suffix('%')
            .and_then(|n| n.trim().parse::<f32>().ok())
            .filter(|n| n.is_finite())
            .map(|n| n / 100.0),
    }
}

fn format_edge(fraction: f32) -> String {
    if fraction == 0.0 {
        "top".to_string()
    } else if fraction == 0.5 {
        "center".to_string()
    } else if fraction == 1.0 {
        "bottom".to_string()
    } else {
        format!("{}%", fraction * 100.0)
    }
}

impl FromStr for StartAnchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ConfigError::InvalidAnchor(s.to_string()));
        };
        match (parse_edge(element), parse_edge(viewport)) {
            (Some(element), Some(viewport)) => Ok(Self { element, viewport }),
            _ => Err(ConfigError::InvalidAnchor(s.to_string())),
        }
    }
}

impl TryFrom<String> for StartAnchor {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for StartAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_edge(self.element), format_edge(self.viewport))
    }
}

impl From<StartAnchor> for String {
    fn from(anchor: StartAnchor) -> Self {
        anchor.to_string()
    }
}

/// Length of the region past its start
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExtendRepr", into = "String")]
pub enum ExtendBy {
    /// Scroll pixels
    Px(f32),
    /// Percent of the viewport height
    ViewportPercent(f32),
}

impl ExtendBy {
    pub fn length(&self, viewport_height: f32) -> f32 {
        match *self {
            ExtendBy::Px(px) => px,
            ExtendBy::ViewportPercent(pct) => pct * viewport_height / 100.0,
        }
    }
}

/// Accepts `"+=130%"`, `"130%"`, `"+=900px"`, `"900"`
impl FromStr for ExtendBy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let text = text.strip_prefix("+=").unwrap_or(text).trim();
        let invalid = || ConfigError::InvalidAnchor(s.to_string());

        if let Some(pct) = text.strip_suffix('%') {
            return pct
                .trim()
                .parse()
                .map(ExtendBy::ViewportPercent)
                .map_err(|_| invalid());
        }
        text.strip_suffix("px")
            .unwrap_or(text)
            .trim()
            .parse()
            .map(ExtendBy::Px)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for ExtendBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendBy::Px(px) => write!(f, "+={}px", px),
            ExtendBy::ViewportPercent(pct) => write!(f, "+={}%", pct),
        }
    }
}

impl From<ExtendBy> for String {
    fn from(extend: ExtendBy) -> Self {
        extend.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtendRepr {
    Px(f32),
    Text(String),
}

impl TryFrom<ExtendRepr> for ExtendBy {
    type Error = ConfigError;

    fn try_from(repr: ExtendRepr) -> Result<Self, Self::Error> {
        match repr {
            ExtendRepr::Px(px) => Ok(ExtendBy::Px(px)),
            ExtendRepr::Text(text) => text.parse(),
        }
    }
}

// ============================================================================
// Scrub
// ============================================================================

/// How progress follows the scroll offset
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScrubRepr", into = "ScrubRepr")]
pub enum Scrub {
    /// Progress equals raw progress every tick
    #[default]
    Linked,
    /// Progress moves this fraction of the remaining gap per tick
    Smooth(f32),
}

impl Scrub {
    /// Per-tick factor that closes most of the gap within `lag_ms` at 60fps
    pub fn from_lag(lag_ms: f32) -> Self {
        if lag_ms <= 0.0 {
            return Scrub::Linked;
        }
        Scrub::Smooth(1.0 - (-NOMINAL_FRAME_MS / lag_ms).exp())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Scrub::Smooth(alpha) if !(alpha > 0.0 && alpha <= 1.0) => {
                Err(ConfigError::InvalidScrub(alpha))
            }
            _ => Ok(()),
        }
    }

    /// Next smoothed value chasing `raw`
    pub fn step(&self, smoothed: f32, raw: f32) -> f32 {
        match *self {
            Scrub::Linked => raw,
            Scrub::Smooth(alpha) => {
                let next = smoothed + alpha * (raw - smoothed);
                if (raw - next).abs() < SMOOTHING_SNAP {
                    raw
                } else {
                    next
                }
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ScrubRepr {
    Enabled(bool),
    Factor(f32),
    Lag { lag_ms: f32 },
}

impl TryFrom<ScrubRepr> for Scrub {
    type Error = ConfigError;

    fn try_from(repr: ScrubRepr) -> Result<Self, Self::Error> {
        let scrub = match repr {
            ScrubRepr::Enabled(true) => Scrub::Linked,
            ScrubRepr::Enabled(false) => return Err(ConfigError::ScrubDisabled),
            ScrubRepr::Factor(alpha) => Scrub::Smooth(alpha),
            ScrubRepr::Lag { lag_ms } => Scrub::from_lag(lag_ms),
        };
        scrub.validate()?;
        Ok(scrub)
    }
}

impl From<Scrub> for ScrubRepr {
    fn from(scrub: Scrub) -> Self {
        match scrub {
            Scrub::Linked => ScrubRepr::Enabled(true),
            Scrub::Smooth(alpha) => ScrubRepr::Factor(alpha),
        }
    }
}

// ============================================================================
// Binding
// ============================================================================

/// Scroll binding configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub trigger: Selector,
    #[serde(default)]
    pub start: StartAnchor,
    pub extend_by: ExtendBy,
    #[serde(default)]
    pub pin: bool,
    #[serde(default)]
    pub scrub: Scrub,
}

impl ScrollConfig {
    pub fn new(trigger: impl Into<Selector>, extend_by: ExtendBy) -> Self {
        Self {
            trigger: trigger.into(),
            start: StartAnchor::TOP_TOP,
            extend_by,
            pin: false,
            scrub: Scrub::Linked,
        }
    }

    pub fn start(mut self, start: StartAnchor) -> Self {
        self.start = start;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }

    pub fn scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }
}

/// Scroll range `[start, end)` a binding maps onto `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegion {
    pub start: f32,
    pub end: f32,
}

impl TriggerRegion {
    pub fn new(start: f32, end: f32) -> Result<Self, ConfigError> {
        if start.is_finite() && end.is_finite() && start < end {
            Ok(Self { start, end })
        } else {
            Err(ConfigError::InvalidRegion { start, end })
        }
    }

    /// Region of `config` for a trigger laid out at `bounds`
    pub fn compute(config: &ScrollConfig, bounds: Rect, viewport: Size) -> Result<Self, ConfigError> {
        let start = config.start.scroll_offset(bounds, viewport);
        Self::new(start, start + config.extend_by.length(viewport.height))
    }

    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// `clamp((scroll - start) / (end - start), 0, 1)`
    pub fn progress_at(&self, scroll: f32) -> f32 {
        ((scroll - self.start) / self.length()).clamp(0.0, 1.0)
    }
}

/// What one binding update produced
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindingFrame {
    pub raw: f32,
    pub progress: f32,
    /// Progress differs from the previous update, or this is the first one
    pub changed: bool,
    pub pin: Option<PinTransition>,
}

/// Live scroll binding for one trigger element
#[derive(Clone, Debug)]
pub struct ScrollBinding {
    config: ScrollConfig,
    trigger: ElementId,
    region: TriggerRegion,
    raw: f32,
    progress: Option<f32>,
    pinned: bool,
}

impl ScrollBinding {
    /// Resolve the trigger and derive its region from current layout
    pub fn bind(
        config: ScrollConfig,
        store: &dyn ElementStore,
        viewport: &dyn Viewport,
    ) -> Result<Self, ConfigError> {
        config.scrub.validate()?;

        let trigger = store
            .resolve(&config.trigger)
            .first()
            .copied()
            .ok_or_else(|| ConfigError::TriggerNotFound(config.trigger.to_string()))?;
        let region = Self::region_for(&config, trigger, viewport)?;

        tracing::debug!(
            "bound `{}` to scroll region [{}, {})",
            config.trigger,
            region.start,
            region.end
        );

        Ok(Self {
            config,
            trigger,
            region,
            raw: 0.0,
            progress: None,
            pinned: false,
        })
    }

    fn region_for(
        config: &ScrollConfig,
        trigger: ElementId,
        viewport: &dyn Viewport,
    ) -> Result<TriggerRegion, ConfigError> {
        let bounds = viewport
            .bounds(trigger)
            .ok_or_else(|| ConfigError::TriggerHasNoBounds(config.trigger.to_string()))?;
        TriggerRegion::compute(config, bounds, viewport.size())
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn trigger(&self) -> ElementId {
        self.trigger
    }

    pub fn region(&self) -> TriggerRegion {
        self.region
    }

    /// Unsmoothed progress of the last update
    pub fn raw(&self) -> f32 {
        self.raw
    }

    /// Smoothed progress of the last update (0 before the first one)
    pub fn progress(&self) -> f32 {
        self.progress.unwrap_or(0.0)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Recompute progress for `scroll` and update the pin.
    ///
    /// The first update takes raw progress as is, so a section that loads
    /// mid-region does not sweep in from 0.
    pub fn update(&mut self, scroll: f32, viewport: &mut dyn Viewport) -> BindingFrame {
        self.raw = self.region.progress_at(scroll);
        let progress = match self.progress {
            Some(previous) => self.config.scrub.step(previous, self.raw),
            None => self.raw,
        };
        let changed = self.progress != Some(progress);
        self.progress = Some(progress);

        let pin = if self.config.pin {
            self.set_pinned(self.raw > 0.0 && self.raw < 1.0, viewport)
        } else {
            None
        };

        BindingFrame {
            raw: self.raw,
            progress,
            changed,
            pin,
        }
    }

    /// Re-derive the region after a layout change. On failure the previous
    /// region stays in effect.
    pub fn refresh(&mut self, viewport: &dyn Viewport) -> Result<(), ConfigError> {
        self.region = Self::region_for(&self.config, self.trigger, viewport)?;
        Ok(())
    }

    /// Drop a held pin
    pub fn release(&mut self, viewport: &mut dyn Viewport) -> Option<PinTransition> {
        self.set_pinned(false, viewport)
    }

    fn set_pinned(&mut self, pinned: bool, viewport: &mut dyn Viewport) -> Option<PinTransition> {
        if pinned == self.pinned {
            return None;
        }
        self.pinned = pinned;
        viewport.set_pinned(self.trigger, pinned);
        tracing::trace!("`{}` pinned: {}", self.config.trigger, pinned);
        Some(if pinned {
            PinTransition::Pinned(self.trigger)
        } else {
            PinTransition::Released(self.trigger)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_anchor() {
        assert_eq!("top top".parse::<StartAnchor>(), Ok(StartAnchor::TOP_TOP));
        assert_eq!("top 80%".parse::<StartAnchor>(), Ok(StartAnchor::top_at(0.8)));
        assert_eq!(
            "center center".parse::<StartAnchor>(),
            Ok(StartAnchor {
                element: 0.5,
                viewport: 0.5
            })
        );
        assert!("top".parse::<StartAnchor>().is_err());
        assert!("top middle".parse::<StartAnchor>().is_err());
        assert!("top top top".parse::<StartAnchor>().is_err());
    }

    #[test]
    fn test_anchor_display() {
        assert_eq!(StartAnchor::top_at(0.8).to_string(), "top 80%");
        assert_eq!(StartAnchor::TOP_TOP.to_string(), "top top");
    }

    #[test]
    fn test_parse_extend_by() {
        assert_eq!("+=130%".parse::<ExtendBy>(), Ok(ExtendBy::ViewportPercent(130.0)));
        assert_eq!("+=900px".parse::<ExtendBy>(), Ok(ExtendBy::Px(900.0)));
        assert_eq!("1000".parse::<ExtendBy>(), Ok(ExtendBy::Px(1000.0)));
        assert!("+=lots".parse::<ExtendBy>().is_err());

        assert_eq!(ExtendBy::ViewportPercent(130.0).length(800.0), 1040.0);
    }

    #[test]
    fn test_region_from_layout() {
        let config = ScrollConfig::new(".about", ExtendBy::ViewportPercent(130.0));
        let region =
            TriggerRegion::compute(&config, Rect::new(0.0, 2000.0, 1280.0, 800.0), Size::new(1280.0, 800.0))
                .unwrap();

        assert_eq!(region.start, 2000.0);
        assert_eq!(region.end, 3040.0);

        let reveal_line = StartAnchor::top_at(0.8);
        assert_eq!(
            reveal_line.scroll_offset(Rect::new(0.0, 2000.0, 1280.0, 400.0), Size::new(1280.0, 800.0)),
            1360.0
        );
    }

    #[test]
    fn test_region_rejects_empty_range() {
        assert_eq!(
            TriggerRegion::new(100.0, 100.0),
            Err(ConfigError::InvalidRegion {
                start: 100.0,
                end: 100.0
            })
        );
        let config = ScrollConfig::new(".hero", ExtendBy::Px(-50.0));
        assert!(TriggerRegion::compute(&config, Rect::default(), Size::new(100.0, 100.0)).is_err());
    }

    #[test]
    fn test_progress_clamps() {
        let region = TriggerRegion::new(0.0, 1000.0).unwrap();
        assert_eq!(region.progress_at(-50.0), 0.0);
        assert_eq!(region.progress_at(500.0), 0.5);
        assert_eq!(region.progress_at(5000.0), 1.0);
    }

    #[test]
    fn test_smoothing_converges_and_snaps() {
        let scrub = Scrub::Smooth(0.5);
        assert_eq!(scrub.step(0.0, 1.0), 0.5);

        let mut smoothed = 0.0;
        for _ in 0..40 {
            smoothed = scrub.step(smoothed, 1.0);
        }
        assert_eq!(smoothed, 1.0);
        assert_eq!(Scrub::Linked.step(0.2, 0.9), 0.9);
    }

    #[test]
    fn test_scrub_validation() {
        assert!(Scrub::Smooth(0.0).validate().is_err());
        assert!(Scrub::Smooth(1.5).validate().is_err());
        assert!(Scrub::Smooth(f32::NAN).validate().is_err());
        assert!(Scrub::Smooth(1.0).validate().is_ok());

        match Scrub::from_lag(600.0) {
            Scrub::Smooth(alpha) => assert!(alpha > 0.02 && alpha < 0.03),
            Scrub::Linked => panic!("expected smoothing"),
        }
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "trigger": ".hero",
            "start": "top top",
            "extend_by": "+=130%",
            "pin": true,
            "scrub": { "lag_ms": 600 }
        }"#;
        let config: ScrollConfig = serde_json::from_str(json).unwrap();

        assert!(config.pin);
        assert_eq!(config.extend_by, ExtendBy::ViewportPercent(130.0));
        assert!(matches!(config.scrub, Scrub::Smooth(_)));

        let bad = r#"{ "trigger": ".hero", "extend_by": 100, "scrub": 2.0 }"#;
        assert!(serde_json::from_str::<ScrollConfig>(bad).is_err());
    }

    #[test]
    fn test_scrub_flag_round_trip() {
        let linked: Scrub = serde_json::from_str("true").unwrap();
        assert_eq!(linked, Scrub::Linked);
        assert_eq!(serde_json::to_string(&linked).unwrap(), "true");

        let err = serde_json::from_str::<Scrub>("false").unwrap_err();
        assert!(err.to_string().contains("cannot be disabled"));
    }
}
