//! Host collaborator interfaces
//!
//! The orchestrator never touches a real document. Everything it needs from
//! the outside world goes through three traits:
//!
//! - [`ElementStore`] resolves selectors to elements and writes property values
//! - [`Viewport`] reports scroll offset, layout boxes and intersection transitions,
//!   and holds pinned elements in place
//! - [`FrameClock`] supplies the per-frame timestamp

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::error::{ClockError, WriteError};
use crate::events::IntersectionEvent;
use crate::value::Value;

new_key_type! {
    /// Handle to a host element
    pub struct ElementId;
    /// Handle to a viewport intersection subscription
    pub struct ObserverId;
}

/// Resolved members of a selector, in document order
pub type ElementList = SmallVec<[ElementId; 4]>;

/// Addresses a group of elements
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    /// Class/tag group key, e.g. `.hero-headline`
    Group(String),
    /// A single element
    Element(ElementId),
}

impl Selector {
    pub fn group(key: impl Into<String>) -> Self {
        Selector::Group(key.into())
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Selector::Group(key.to_string())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Selector::Group(key)
    }
}

impl From<ElementId> for Selector {
    fn from(id: ElementId) -> Self {
        Selector::Element(id)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Group(key) => f.write_str(key),
            Selector::Element(id) => write!(f, "{:?}", id),
        }
    }
}

/// Document-space layout box
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Viewport dimensions
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Element lookup and property sink
pub trait ElementStore {
    /// Current members of a selector, in document order
    fn resolve(&self, selector: &Selector) -> ElementList;

    /// Write a single property to a single element
    fn write(&mut self, element: ElementId, property: &str, value: Value)
        -> Result<(), WriteError>;
}

/// Scroll position, layout queries, intersection subscriptions and pinning
pub trait Viewport {
    /// Current vertical scroll offset in pixels
    fn scroll_offset(&self) -> f32;

    /// Viewport size in pixels
    fn size(&self) -> Size;

    /// Document-space layout box of an element
    fn bounds(&self, element: ElementId) -> Option<Rect>;

    /// Start reporting intersection transitions for `element`.
    ///
    /// `trigger_line` is the fraction of viewport height (from the top) the
    /// element's top edge must cross to count as entered.
    fn observe(&mut self, element: ElementId, trigger_line: f32) -> ObserverId;

    /// Stop reporting transitions for a subscription
    fn unobserve(&mut self, observer: ObserverId);

    /// Transitions since the last poll, oldest first
    fn poll_intersections(&mut self) -> Vec<IntersectionEvent>;

    /// Hold (or release) an element fixed in the viewport
    fn set_pinned(&mut self, element: ElementId, pinned: bool);
}

/// Per-frame time source
pub trait FrameClock {
    /// Take ownership of the frame source
    fn acquire(&mut self) -> Result<(), ClockError>;

    /// Timestamp of the current frame in milliseconds
    fn now_ms(&self) -> f64;

    /// Give the frame source back
    fn release(&mut self);
}
