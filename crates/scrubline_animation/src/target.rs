//! Animatable targets
//!
//! A target is a selector plus the last values written to it. Animation
//! drivers never write to elements directly; they stage property maps in a
//! [`FrameBatch`] and the batch applies each target's merged properties in
//! one pass at the end of the frame.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use scrubline_core::host::{ElementId, ElementList, ElementStore, Selector};
use scrubline_core::value::{PropertyMap, Value};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registered target
    pub struct TargetId;
}

/// Result of applying properties to a target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Members the properties were written to
    pub members: usize,
    /// Individual element writes the host rejected
    pub failed_writes: usize,
}

impl ApplyReport {
    /// The selector matched nothing; the apply was a no-op
    pub fn is_missing(&self) -> bool {
        self.members == 0
    }
}

/// An addressable group of elements with a property snapshot
#[derive(Clone, Debug)]
pub struct AnimatableTarget {
    selector: Selector,
    members: ElementList,
    snapshot: PropertyMap,
}

impl AnimatableTarget {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            members: ElementList::new(),
            snapshot: PropertyMap::new(),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Members resolved by the most recent apply
    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    /// Last applied value of every property, in first-write order
    pub fn snapshot(&self) -> &PropertyMap {
        &self.snapshot
    }

    pub fn current_value(&self, name: &str) -> Option<Value> {
        self.snapshot.get(name).copied()
    }

    /// Merge `properties` into the snapshot and write them to every member.
    ///
    /// Members are resolved from the store on every call. A selector with no
    /// members leaves the snapshot untouched. A rejected write is logged and
    /// the remaining writes still happen.
    pub fn apply(&mut self, properties: &PropertyMap, store: &mut dyn ElementStore) -> ApplyReport {
        self.members = store.resolve(&self.selector);
        if self.members.is_empty() {
            tracing::warn!("target `{}` resolved to no elements; skipping", self.selector);
            return ApplyReport::default();
        }

        let mut report = ApplyReport {
            members: self.members.len(),
            failed_writes: 0,
        };

        for (name, value) in properties {
            self.snapshot.insert(name.clone(), *value);
        }

        for &element in &self.members {
            for (name, value) in properties {
                if let Err(err) = store.write(element, name, *value) {
                    report.failed_writes += 1;
                    tracing::warn!(
                        "failed to write `{}` on member of `{}`: {}",
                        name,
                        self.selector,
                        err
                    );
                }
            }
        }

        report
    }
}

/// All targets known to an orchestrator, deduplicated by selector
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: SlotMap<TargetId, AnimatableTarget>,
    by_selector: FxHashMap<Selector, TargetId>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `selector`, registering a new target on first use
    pub fn ensure(&mut self, selector: &Selector) -> TargetId {
        if let Some(&id) = self.by_selector.get(selector) {
            return id;
        }
        let id = self.targets.insert(AnimatableTarget::new(selector.clone()));
        self.by_selector.insert(selector.clone(), id);
        id
    }

    pub fn get(&self, id: TargetId) -> Option<&AnimatableTarget> {
        self.targets.get(id)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut AnimatableTarget> {
        self.targets.get_mut(id)
    }

    pub fn find(&self, selector: &Selector) -> Option<&AnimatableTarget> {
        self.by_selector
            .get(selector)
            .and_then(|&id| self.targets.get(id))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.by_selector.clear();
    }
}

/// Property writes staged during one frame.
///
/// Staging the same property of the same target twice keeps the later
/// value, so the last writer in evaluation order wins. Targets flush in the
/// order they were first staged.
#[derive(Debug, Default)]
pub struct FrameBatch {
    writes: IndexMap<TargetId, PropertyMap>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, target: TargetId, properties: PropertyMap) {
        let entry = self.writes.entry(target).or_default();
        for (name, value) in properties {
            entry.insert(name, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Staged properties for one target
    pub fn staged(&self, target: TargetId) -> Option<&PropertyMap> {
        self.writes.get(&target)
    }

    /// Apply every staged write, one `apply` per target
    pub fn flush(&mut self, registry: &mut TargetRegistry, store: &mut dyn ElementStore) {
        for (id, properties) in self.writes.drain(..) {
            match registry.get_mut(id) {
                Some(target) => {
                    target.apply(&properties, store);
                }
                None => tracing::debug!("dropping writes for removed target {:?}", id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubline_core::error::WriteError;

    /// Minimal store: one group with a fixed member list, one member rejects writes
    #[derive(Default)]
    struct MemoryStore {
        elements: SlotMap<ElementId, FxHashMap<String, Value>>,
        groups: FxHashMap<String, Vec<ElementId>>,
        broken: Option<ElementId>,
    }

    impl MemoryStore {
        fn add(&mut self, group: &str) -> ElementId {
            let id = self.elements.insert(FxHashMap::default());
            self.groups.entry(group.to_string()).or_default().push(id);
            id
        }
    }

    impl ElementStore for MemoryStore {
        fn resolve(&self, selector: &Selector) -> ElementList {
            match selector {
                Selector::Group(key) => self
                    .groups
                    .get(key)
                    .map(|ids| ids.iter().copied().collect())
                    .unwrap_or_default(),
                Selector::Element(id) => {
                    let mut list = ElementList::new();
                    if self.elements.contains_key(*id) {
                        list.push(*id);
                    }
                    list
                }
            }
        }

        fn write(&mut self, element: ElementId, property: &str, value: Value) -> Result<(), WriteError> {
            if self.broken == Some(element) {
                return Err(WriteError::Detached(format!("{:?}", element)));
            }
            self.elements
                .get_mut(element)
                .ok_or_else(|| WriteError::Detached(format!("{:?}", element)))?
                .insert(property.to_string(), value);
            Ok(())
        }
    }

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_apply_writes_every_member() {
        let mut store = MemoryStore::default();
        let a = store.add(".card");
        let b = store.add(".card");

        let mut target = AnimatableTarget::new(".card".into());
        let report = target.apply(&props(&[("opacity", Value::number(0.5))]), &mut store);

        assert_eq!(report.members, 2);
        assert_eq!(store.elements[a]["opacity"], Value::number(0.5));
        assert_eq!(store.elements[b]["opacity"], Value::number(0.5));
    }

    #[test]
    fn test_unset_property_keeps_last_value() {
        let mut store = MemoryStore::default();
        store.add(".card");

        let mut target = AnimatableTarget::new(".card".into());
        target.apply(
            &props(&[("opacity", Value::number(1.0)), ("x", Value::vw(4.0))]),
            &mut store,
        );
        target.apply(&props(&[("x", Value::vw(8.0))]), &mut store);

        assert_eq!(target.current_value("opacity"), Some(Value::number(1.0)));
        assert_eq!(target.current_value("x"), Some(Value::vw(8.0)));
        assert_eq!(target.current_value("scale"), None);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = MemoryStore::default();
        store.add(".card");

        let mut target = AnimatableTarget::new(".card".into());
        let snapshot = props(&[("opacity", Value::number(0.25)), ("y", Value::vh(-10.0))]);

        target.apply(&snapshot, &mut store);
        let first = target.snapshot().clone();
        target.apply(&snapshot, &mut store);

        assert_eq!(target.snapshot(), &first);
    }

    #[test]
    fn test_missing_target_is_noop() {
        let mut store = MemoryStore::default();
        let mut target = AnimatableTarget::new(".nothing".into());

        let report = target.apply(&props(&[("opacity", Value::number(1.0))]), &mut store);

        assert!(report.is_missing());
        assert!(target.snapshot().is_empty());
    }

    #[test]
    fn test_failed_member_does_not_abort_batch() {
        let mut store = MemoryStore::default();
        let broken = store.add(".card");
        let healthy = store.add(".card");
        store.broken = Some(broken);

        let mut target = AnimatableTarget::new(".card".into());
        let report = target.apply(&props(&[("opacity", Value::number(1.0))]), &mut store);

        assert_eq!(report.failed_writes, 1);
        assert_eq!(store.elements[healthy]["opacity"], Value::number(1.0));
    }

    #[test]
    fn test_registry_dedupes_selectors() {
        let mut registry = TargetRegistry::new();
        let a = registry.ensure(&".hero".into());
        let b = registry.ensure(&".hero".into());
        let c = registry.ensure(&".about".into());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_batch_last_writer_wins() {
        let mut store = MemoryStore::default();
        let el = store.add(".hero-image");

        let mut registry = TargetRegistry::new();
        let id = registry.ensure(&".hero-image".into());

        let mut batch = FrameBatch::new();
        batch.stage(id, props(&[("opacity", Value::number(0.2)), ("x", Value::vw(1.0))]));
        batch.stage(id, props(&[("opacity", Value::number(0.9))]));
        batch.flush(&mut registry, &mut store);

        assert!(batch.is_empty());
        assert_eq!(store.elements[el]["opacity"], Value::number(0.9));
        assert_eq!(store.elements[el]["x"], Value::vw(1.0));
    }
}
