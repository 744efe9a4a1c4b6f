//! Timeline steps
//!
//! A [`Keyframe`] tweens one target from a set of start values to a set of
//! target values over a fixed duration. Where it starts on the timeline is
//! described by an [`Offset`]: at an absolute time, right after the previous
//! step, or relative to the start or end of an earlier step.

use std::str::FromStr;

use scrubline_core::error::ConfigError;
use scrubline_core::value::{PropertyMap, Value};
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Reference to an earlier step of the same timeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRef {
    /// The step added immediately before this one
    Previous,
    /// Step by insertion index
    Index(usize),
    /// Step by tag
    Tag(String),
}

/// Which edge of the anchor step an offset is measured from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorEdge {
    Start,
    #[default]
    End,
}

/// Start position of a step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OffsetRepr", into = "OffsetRepr")]
pub enum Offset {
    /// Right after the previous step ends (or at 0 for the first step)
    #[default]
    Sequential,
    /// Absolute time in milliseconds
    At(u32),
    /// `delta_ms` after the given edge of an earlier step
    Relative {
        anchor: StepRef,
        edge: AnchorEdge,
        delta_ms: i32,
    },
}

impl Offset {
    /// Relative to the end of the previous step; negative overlaps it
    pub fn after_previous(delta_ms: i32) -> Self {
        Offset::Relative {
            anchor: StepRef::Previous,
            edge: AnchorEdge::End,
            delta_ms,
        }
    }

    /// Relative to the start of the previous step
    pub fn with_previous(delta_ms: i32) -> Self {
        Offset::Relative {
            anchor: StepRef::Previous,
            edge: AnchorEdge::Start,
            delta_ms,
        }
    }

    /// Relative to the end of a tagged step
    pub fn after_tag(tag: impl Into<String>, delta_ms: i32) -> Self {
        Offset::Relative {
            anchor: StepRef::Tag(tag.into()),
            edge: AnchorEdge::End,
            delta_ms,
        }
    }
}

/// Parses position strings in the familiar tween-library shorthand:
///
/// | string    | meaning                              |
/// |-----------|--------------------------------------|
/// | `""`      | sequential                           |
/// | `"1200"`  | absolute, 1200ms                     |
/// | `"-=500"` | 500ms before the previous step ends  |
/// | `"+=200"` | 200ms after the previous step ends   |
/// | `"<"`     | with the previous step's start       |
/// | `"<+=100"`| 100ms after the previous step starts |
/// | `">-=100"`| 100ms before the previous step ends  |
impl FromStr for Offset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Offset::Sequential);
        }

        let invalid = || ConfigError::InvalidAnchor(s.to_string());

        let (edge, rest) = match text.as_bytes()[0] {
            b'<' => (Some(AnchorEdge::Start), &text[1..]),
            b'>' => (Some(AnchorEdge::End), &text[1..]),
            _ => (None, text),
        };

        let delta = if rest.is_empty() {
            Some(0)
        } else if let Some(n) = rest.strip_prefix("+=") {
            Some(n.trim().parse::<i32>().map_err(|_| invalid())?)
        } else if let Some(n) = rest.strip_prefix("-=") {
            Some(-n.trim().parse::<i32>().map_err(|_| invalid())?)
        } else {
            None
        };

        match (edge, delta) {
            (Some(edge), Some(delta_ms)) => Ok(Offset::Relative {
                anchor: StepRef::Previous,
                edge,
                delta_ms,
            }),
            (None, Some(delta_ms)) => Ok(Offset::after_previous(delta_ms)),
            (None, None) => rest.parse::<u32>().map(Offset::At).map_err(|_| invalid()),
            (Some(_), None) => Err(invalid()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OffsetRepr {
    At(u32),
    Text(String),
    Relative {
        anchor: StepRef,
        #[serde(default)]
        edge: AnchorEdge,
        #[serde(default)]
        delta_ms: i32,
    },
}

impl TryFrom<OffsetRepr> for Offset {
    type Error = ConfigError;

    fn try_from(repr: OffsetRepr) -> Result<Self, Self::Error> {
        match repr {
            OffsetRepr::At(ms) => Ok(Offset::At(ms)),
            OffsetRepr::Text(text) => text.parse(),
            OffsetRepr::Relative {
                anchor,
                edge,
                delta_ms,
            } => Ok(Offset::Relative {
                anchor,
                edge,
                delta_ms,
            }),
        }
    }
}

impl From<Offset> for OffsetRepr {
    fn from(offset: Offset) -> Self {
        match offset {
            Offset::Sequential => OffsetRepr::Text(String::new()),
            Offset::At(ms) => OffsetRepr::At(ms),
            Offset::Relative {
                anchor,
                edge,
                delta_ms,
            } => OffsetRepr::Relative {
                anchor,
                edge,
                delta_ms,
            },
        }
    }
}

fn default_step_easing() -> Easing {
    Easing::EaseOutQuad
}

/// A single tween step.
///
/// `T` is how the step addresses its target: a [`Selector`] in scene
/// configuration, a resolved target id once it belongs to a timeline.
///
/// [`Selector`]: scrubline_core::host::Selector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub target: T,
    /// Explicit start values; missing entries are captured from the target
    #[serde(default)]
    pub from: Option<PropertyMap>,
    pub to: PropertyMap,
    pub duration_ms: u32,
    #[serde(default = "default_step_easing")]
    pub easing: Easing,
    #[serde(default)]
    pub offset: Offset,
    #[serde(default)]
    pub tag: Option<String>,
}

impl<T> Keyframe<T> {
    /// Tween `target` to `to` over `duration_ms`, sequentially, with the default ease
    pub fn to(target: T, to: PropertyMap, duration_ms: u32) -> Self {
        Self {
            target,
            from: None,
            to,
            duration_ms,
            easing: default_step_easing(),
            offset: Offset::Sequential,
            tag: None,
        }
    }

    /// Builder: explicit start values
    pub fn from(mut self, from: PropertyMap) -> Self {
        self.from = Some(from);
        self
    }

    /// Builder: easing
    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Builder: start offset
    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    /// Builder: tag other steps can anchor to
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Same step, different target addressing
    pub fn map_target<U>(self, f: impl FnOnce(T) -> U) -> Keyframe<U> {
        Keyframe {
            target: f(self.target),
            from: self.from,
            to: self.to,
            duration_ms: self.duration_ms,
            easing: self.easing,
            offset: self.offset,
            tag: self.tag,
        }
    }
}

/// Build a [`PropertyMap`] from `(name, value)` pairs
pub fn properties<I, K, V>(pairs: I) -> PropertyMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
