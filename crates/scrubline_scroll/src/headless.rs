//! Headless collaborators
//!
//! In-memory implementations of the host traits for tests and the CLI
//! simulator. Layout is fixed rectangles, scrolling is a number you set, and
//! time only moves when you advance the clock.
//!
//! ```
//! use scrubline_core::host::{Rect, Size};
//! use scrubline_scroll::headless::HeadlessPage;
//!
//! let mut page = HeadlessPage::new(Size::new(1280.0, 800.0));
//! let hero = page.add(&[".hero"], Rect::new(0.0, 0.0, 1280.0, 800.0));
//! let (viewport, store) = page.into_parts();
//!
//! assert_eq!(store.group(".hero"), &[hero]);
//! assert_eq!(viewport.scroll(), 0.0);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use scrubline_core::error::{ClockError, WriteError};
use scrubline_core::events::{IntersectionEvent, ScrollDirection};
use scrubline_core::host::{
    ElementId, ElementList, ElementStore, FrameClock, ObserverId, Rect, Selector, Size, Viewport,
};
use scrubline_core::value::{PropertyMap, Value};
use slotmap::{SecondaryMap, SlotMap};

// ============================================================================
// Page builder
// ============================================================================

/// Builds a matching viewport and store
#[derive(Debug)]
pub struct HeadlessPage {
    viewport: HeadlessViewport,
    store: HeadlessStore,
}

impl HeadlessPage {
    pub fn new(size: Size) -> Self {
        Self {
            viewport: HeadlessViewport::new(size),
            store: HeadlessStore::new(),
        }
    }

    /// Add an element belonging to `groups`, laid out at `bounds`
    pub fn add(&mut self, groups: &[&str], bounds: Rect) -> ElementId {
        let id = self.store.insert(groups);
        self.viewport.place(id, bounds);
        id
    }

    pub fn into_parts(self) -> (HeadlessViewport, HeadlessStore) {
        (self.viewport, self.store)
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Default)]
struct HeadlessElement {
    properties: PropertyMap,
    detached: bool,
}

/// Element store recording every write
#[derive(Debug, Default)]
pub struct HeadlessStore {
    elements: SlotMap<ElementId, HeadlessElement>,
    groups: FxHashMap<String, ElementList>,
    writes: usize,
}

impl HeadlessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, groups: &[&str]) -> ElementId {
        let id = self.elements.insert(HeadlessElement::default());
        for group in groups {
            self.groups.entry((*group).to_string()).or_default().push(id);
        }
        id
    }

    /// Members of a group key, in insertion order
    pub fn group(&self, key: &str) -> &[ElementId] {
        self.groups.get(key).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn property(&self, element: ElementId, name: &str) -> Option<Value> {
        self.elements.get(element)?.properties.get(name).copied()
    }

    pub fn properties(&self, element: ElementId) -> Option<&PropertyMap> {
        self.elements.get(element).map(|e| &e.properties)
    }

    /// Keep the element resolvable but fail every write to it
    pub fn detach(&mut self, element: ElementId) {
        if let Some(el) = self.elements.get_mut(element) {
            el.detached = true;
        }
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl ElementStore for HeadlessStore {
    fn resolve(&self, selector: &Selector) -> ElementList {
        match selector {
            Selector::Group(key) => self.groups.get(key).cloned().unwrap_or_default(),
            Selector::Element(id) if self.elements.contains_key(*id) => {
                std::iter::once(*id).collect()
            }
            Selector::Element(_) => ElementList::new(),
        }
    }

    fn write(&mut self, element: ElementId, property: &str, value: Value) -> Result<(), WriteError> {
        let el = self
            .elements
            .get_mut(element)
            .filter(|el| !el.detached)
            .ok_or_else(|| WriteError::Detached(format!("{:?}", element)))?;
        el.properties.insert(property.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Viewport
// ============================================================================

#[derive(Debug)]
struct Observation {
    element: ElementId,
    trigger_line: f32,
    inside: bool,
}

/// Viewport over fixed layout boxes.
///
/// An observed element counts as inside once its top edge is at or above
/// the trigger line, and as outside again when scrolling back moves it
/// below the line.
#[derive(Debug)]
pub struct HeadlessViewport {
    size: Size,
    scroll: f32,
    polled_scroll: f32,
    layout: SecondaryMap<ElementId, Rect>,
    observers: SlotMap<ObserverId, Observation>,
    pinned: FxHashSet<ElementId>,
    injected: Vec<IntersectionEvent>,
}

impl HeadlessViewport {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            scroll: 0.0,
            polled_scroll: 0.0,
            layout: SecondaryMap::new(),
            observers: SlotMap::with_key(),
            pinned: FxHashSet::default(),
            injected: Vec::new(),
        }
    }

    pub fn place(&mut self, element: ElementId, bounds: Rect) {
        self.layout.insert(element, bounds);
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll = offset.max(0.0);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to(self.scroll + delta);
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Queue a raw event for the next poll, whether or not its observer exists
    pub fn inject(&mut self, event: IntersectionEvent) {
        self.injected.push(event);
    }

    pub fn is_pinned(&self, element: ElementId) -> bool {
        self.pinned.contains(&element)
    }

    pub fn pinned_count(&self) -> usize {
        self.pinned.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Live observers
    pub fn observers(&self) -> impl Iterator<Item = ObserverId> + '_ {
        self.observers.keys()
    }
}

impl Viewport for HeadlessViewport {
    fn scroll_offset(&self) -> f32 {
        self.scroll
    }

    fn size(&self) -> Size {
        self.size
    }

    fn bounds(&self, element: ElementId) -> Option<Rect> {
        self.layout.get(element).copied()
    }

    fn observe(&mut self, element: ElementId, trigger_line: f32) -> ObserverId {
        self.observers.insert(Observation {
            element,
            trigger_line,
            inside: false,
        })
    }

    fn unobserve(&mut self, observer: ObserverId) {
        self.observers.remove(observer);
    }

    fn poll_intersections(&mut self) -> Vec<IntersectionEvent> {
        let direction = ScrollDirection::from_delta(self.scroll - self.polled_scroll);
        self.polled_scroll = self.scroll;

        let mut events = std::mem::take(&mut self.injected);
        for (id, observation) in self.observers.iter_mut() {
            let Some(bounds) = self.layout.get(observation.element) else {
                continue;
            };
            let line = self.scroll + observation.trigger_line * self.size.height;
            let inside = bounds.top() <= line;
            if inside != observation.inside {
                observation.inside = inside;
                events.push(if inside {
                    IntersectionEvent::entered(id, direction)
                } else {
                    IntersectionEvent::exited(id, direction)
                });
            }
        }
        events
    }

    fn set_pinned(&mut self, element: ElementId, pinned: bool) {
        if pinned {
            self.pinned.insert(element);
        } else {
            self.pinned.remove(&element);
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: f64,
    acquired: bool,
    unavailable: Option<String>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock whose `acquire` always fails
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn advance(&mut self, ms: f64) {
        self.now_ms += ms;
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl FrameClock for ManualClock {
    fn acquire(&mut self) -> Result<(), ClockError> {
        if let Some(reason) = &self.unavailable {
            return Err(ClockError::Unavailable(reason.clone()));
        }
        if self.acquired {
            return Err(ClockError::AlreadyAcquired);
        }
        self.acquired = true;
        Ok(())
    }

    fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn release(&mut self) {
        self.acquired = false;
    }
}
