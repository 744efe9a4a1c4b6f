//! Frame orchestrator
//!
//! Owns every registered driver (entrance timelines, scroll sections and
//! reveals) and evaluates them once per frame in registration order. Drivers
//! stage their writes in a shared [`FrameBatch`]; the batch is flushed once
//! at the end of the tick, so when two drivers write the same property of
//! the same target the later registration wins.

use rustc_hash::FxHashMap;
use scrubline_animation::{
    AnimatableTarget, FrameBatch, Keyframe, TargetId, TargetRegistry, Timeline, TimelineState,
};
use scrubline_core::error::ConfigError;
use scrubline_core::events::PinTransition;
use scrubline_core::host::{ElementStore, FrameClock, ObserverId, Selector, Viewport};
use scrubline_core::value::PropertyMap;
use slotmap::{new_key_type, SlotMap};

use crate::binding::{ScrollBinding, TriggerRegion};
use crate::error::Result;
use crate::phase::Phase;
use crate::reveal::{RevealConfig, RevealController, RevealState};
use crate::section::{ProgressCallback, ScrollSection, SectionConfig};

new_key_type! {
    /// Handle returned by every registration; pass it to [`Orchestrator::unbind`]
    pub struct DriverHandle;
}

enum Driver {
    Entrance(Timeline),
    Section(ScrollSection),
    /// One controller per element matched at registration
    Reveal(Vec<RevealController>),
}

/// Scroll-progress animation orchestrator over host collaborators
pub struct Orchestrator<V: Viewport, S: ElementStore, C: FrameClock> {
    viewport: V,
    store: S,
    clock: C,
    targets: TargetRegistry,
    drivers: SlotMap<DriverHandle, Driver>,
    /// Evaluation order
    order: Vec<DriverHandle>,
    /// Intersection routing: observer -> (reveal driver, controller index)
    observers: FxHashMap<ObserverId, (DriverHandle, usize)>,
    pin_transitions: Vec<PinTransition>,
    last_frame_ms: Option<f64>,
    clock_held: bool,
}

impl<V: Viewport, S: ElementStore, C: FrameClock> Orchestrator<V, S, C> {
    /// Take the frame clock and start with no drivers
    pub fn new(viewport: V, store: S, mut clock: C) -> Result<Self> {
        clock.acquire()?;
        tracing::debug!("orchestrator started");

        Ok(Self {
            viewport,
            store,
            clock,
            targets: TargetRegistry::new(),
            drivers: SlotMap::with_key(),
            order: Vec::new(),
            observers: FxHashMap::default(),
            pin_transitions: Vec::new(),
            last_frame_ms: None,
            clock_held: true,
        })
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a timeline that starts playing on the next tick.
    ///
    /// Start values a step leaves out are captured now, from the target's
    /// snapshot or from an earlier step of the same timeline.
    pub fn register_entrance_timeline(
        &mut self,
        steps: impl IntoIterator<Item = Keyframe<Selector>>,
    ) -> std::result::Result<DriverHandle, ConfigError> {
        let mut timeline = build_timeline(&mut self.targets, steps)?;
        timeline.play();

        let handle = self.insert(Driver::Entrance(timeline));
        tracing::debug!("registered entrance timeline {:?}", handle);
        Ok(handle)
    }

    /// Register a scroll section. `on_progress` is called with the section's
    /// progress on every tick until the section is unbound.
    pub fn register_scroll_section(
        &mut self,
        config: SectionConfig,
        on_progress: Option<ProgressCallback>,
    ) -> std::result::Result<DriverHandle, ConfigError> {
        config.phases.validate()?;
        let binding = ScrollBinding::bind(config.scroll, &self.store, &self.viewport)?;
        let timeline = if config.timeline.is_empty() {
            None
        } else {
            Some(build_timeline(&mut self.targets, config.timeline)?)
        };
        let tracks = config
            .tracks
            .into_iter()
            .map(|track| (self.targets.ensure(&track.target), track))
            .collect();

        let section = ScrollSection::new(binding, config.phases, tracks, timeline, on_progress);
        let handle = self.insert(Driver::Section(section));
        tracing::debug!("registered scroll section {:?}", handle);
        Ok(handle)
    }

    /// Register a reveal for every element currently matching the selector
    pub fn register_reveal(
        &mut self,
        config: RevealConfig,
    ) -> std::result::Result<DriverHandle, ConfigError> {
        config.validate()?;

        let members = self.store.resolve(&config.selector);
        if members.is_empty() {
            tracing::warn!("reveal `{}` matched no elements", config.selector);
        }

        let mut controllers: Vec<RevealController> = Vec::with_capacity(members.len());
        for element in members {
            let observer = self.viewport.observe(element, config.trigger_line);
            let target = self.targets.ensure(&Selector::Element(element));
            match RevealController::new(element, target, observer, &config) {
                Ok(controller) => controllers.push(controller),
                Err(err) => {
                    self.viewport.unobserve(observer);
                    for controller in &controllers {
                        self.viewport.unobserve(controller.observer());
                    }
                    return Err(err);
                }
            }
        }

        let observers: Vec<ObserverId> = controllers.iter().map(|c| c.observer()).collect();
        let handle = self.insert(Driver::Reveal(controllers));
        for (index, observer) in observers.into_iter().enumerate() {
            self.observers.insert(observer, (handle, index));
        }
        tracing::debug!("registered reveal `{}` as {:?}", config.selector, handle);
        Ok(handle)
    }

    fn insert(&mut self, driver: Driver) -> DriverHandle {
        let handle = self.drivers.insert(driver);
        self.order.push(handle);
        handle
    }

    /// Remove a driver, releasing its pin and observers. Returns false if
    /// the handle was already unbound.
    pub fn unbind(&mut self, handle: DriverHandle) -> bool {
        let Some(driver) = self.drivers.remove(handle) else {
            return false;
        };
        self.order.retain(|&h| h != handle);
        self.release(driver);
        tracing::debug!("unbound {:?}", handle);
        true
    }

    fn release(&mut self, driver: Driver) {
        match driver {
            Driver::Entrance(mut timeline) => timeline.halt(),
            Driver::Section(mut section) => {
                if let Some(pin) = section.release(&mut self.viewport) {
                    self.pin_transitions.push(pin);
                }
            }
            Driver::Reveal(controllers) => {
                for mut controller in controllers {
                    controller.halt();
                    self.viewport.unobserve(controller.observer());
                    self.observers.remove(&controller.observer());
                }
            }
        }
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Re-derive every scroll region from current layout
    pub fn refresh(&mut self) {
        for &handle in &self.order {
            if let Some(Driver::Section(section)) = self.drivers.get_mut(handle) {
                if let Err(err) = section.binding_mut().refresh(&self.viewport) {
                    tracing::warn!("keeping previous region for {:?}: {}", handle, err);
                }
            }
        }
    }

    /// Evaluate every driver once and flush the frame's writes
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        let dt_ms = self
            .last_frame_ms
            .map_or(0.0, |last| (now - last).max(0.0)) as f32;
        self.last_frame_ms = Some(now);

        for event in self.viewport.poll_intersections() {
            let Some(&(handle, index)) = self.observers.get(&event.observer) else {
                tracing::trace!("dropping event for stale observer {:?}", event.observer);
                continue;
            };
            if let Some(Driver::Reveal(controllers)) = self.drivers.get_mut(handle) {
                if let Some(controller) = controllers.get_mut(index) {
                    controller.handle(&event);
                }
            }
        }

        let scroll = self.viewport.scroll_offset();
        let mut batch = FrameBatch::new();

        for &handle in &self.order {
            let Some(driver) = self.drivers.get_mut(handle) else {
                continue;
            };
            match driver {
                Driver::Entrance(timeline) => {
                    timeline.tick(dt_ms);
                    if timeline.needs_render() {
                        for (target, properties) in timeline.render() {
                            batch.stage(target, properties);
                        }
                    }
                }
                Driver::Section(section) => {
                    if let Some(pin) = section.evaluate(handle, scroll, &mut self.viewport, &mut batch) {
                        self.pin_transitions.push(pin);
                    }
                }
                Driver::Reveal(controllers) => {
                    for controller in controllers {
                        controller.advance(dt_ms);
                        controller.render_into(&mut batch);
                    }
                }
            }
        }

        batch.flush(&mut self.targets, &mut self.store);
    }

    /// Unbind everything, drop every target and give the clock back.
    ///
    /// Also runs on drop. Later ticks do nothing.
    pub fn teardown(&mut self) {
        let order = std::mem::take(&mut self.order);
        for handle in order {
            if let Some(driver) = self.drivers.remove(handle) {
                self.release(driver);
            }
        }
        self.drivers.clear();
        self.observers.clear();
        self.targets.clear();

        if self.clock_held {
            self.clock.release();
            self.clock_held = false;
            tracing::debug!("orchestrator torn down");
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Registered drivers, in evaluation order
    pub fn handles(&self) -> &[DriverHandle] {
        &self.order
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_bound(&self, handle: DriverHandle) -> bool {
        self.drivers.contains_key(handle)
    }

    /// State of each reveal controller of a reveal registration
    pub fn reveal_states(&self, handle: DriverHandle) -> Option<Vec<RevealState>> {
        match self.drivers.get(handle)? {
            Driver::Reveal(controllers) => Some(controllers.iter().map(|c| c.state()).collect()),
            _ => None,
        }
    }

    /// Smoothed progress of a scroll section
    pub fn section_progress(&self, handle: DriverHandle) -> Option<f32> {
        self.section(handle).map(|s| s.binding().progress())
    }

    /// Phase a scroll section was last evaluated in
    pub fn section_phase(&self, handle: DriverHandle) -> Option<Phase> {
        self.section(handle).and_then(|s| s.phase())
    }

    pub fn section_region(&self, handle: DriverHandle) -> Option<TriggerRegion> {
        self.section(handle).map(|s| s.binding().region())
    }

    pub fn is_pinned(&self, handle: DriverHandle) -> bool {
        self.section(handle).map_or(false, |s| s.binding().is_pinned())
    }

    fn section(&self, handle: DriverHandle) -> Option<&ScrollSection> {
        match self.drivers.get(handle)? {
            Driver::Section(section) => Some(section),
            _ => None,
        }
    }

    /// Playback state of an entrance timeline
    pub fn timeline_state(&self, handle: DriverHandle) -> Option<TimelineState> {
        match self.drivers.get(handle)? {
            Driver::Entrance(timeline) => Some(timeline.state()),
            _ => None,
        }
    }

    pub fn target(&self, selector: &Selector) -> Option<&AnimatableTarget> {
        self.targets.find(selector)
    }

    /// Pin changes since the last call, oldest first
    pub fn take_pin_transitions(&mut self) -> Vec<PinTransition> {
        std::mem::take(&mut self.pin_transitions)
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<V: Viewport, S: ElementStore, C: FrameClock> Drop for Orchestrator<V, S, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Resolve step targets and fill in missing start values.
///
/// A property a step animates without an explicit start begins at the value
/// the previous step of the timeline left it at, or else at the target's
/// current snapshot. With neither, the step jumps to its end value.
///
/// Offsets and tags are checked before any target is registered, so a
/// rejected timeline leaves the registry untouched.
fn build_timeline(
    targets: &mut TargetRegistry,
    steps: impl IntoIterator<Item = Keyframe<Selector>>,
) -> std::result::Result<Timeline, ConfigError> {
    let mut projected: FxHashMap<Selector, PropertyMap> = FxHashMap::default();
    let mut resolved = Vec::new();
    let mut dry_run = Timeline::new();

    for step in steps {
        let known = projected.entry(step.target.clone()).or_insert_with(|| {
            targets
                .find(&step.target)
                .map(|t| t.snapshot().clone())
                .unwrap_or_default()
        });

        let mut from = step.from.clone().unwrap_or_default();
        for name in step.to.keys() {
            if !from.contains_key(name) {
                if let Some(value) = known.get(name) {
                    from.insert(name.clone(), *value);
                }
            }
        }
        for (name, value) in &step.to {
            known.insert(name.clone(), *value);
        }

        let step = Keyframe {
            from: Some(from),
            ..step
        };
        dry_run.add_step(step.clone().map_target(|_| TargetId::default()))?;
        resolved.push(step);
    }

    let mut timeline = Timeline::new();
    for step in resolved {
        let step = step.map_target(|selector| targets.ensure(&selector));
        timeline.add_step(step)?;
    }
    Ok(timeline)
}
