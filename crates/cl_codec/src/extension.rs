//! Hook points through which extensions take part in a context build.
//!
//! An [`Extension`] first validates the configuration against the built
//! [`TypeGraph`], then contributes per-instance state to declared types and
//! hooks to the setter pipeline of their properties.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use cl_config::{ContextConfig, IssueCollector};
use cl_utils::TypeIdMap;

use crate::compiler::PropertyMeta;
use crate::entity::Entity;
use crate::graph::{GraphNode, GraphProperty, TypeGraph};

// -----------------------------------------------------------------------------
// Setter hooks

/// A hook run by the setter pipeline of one property.
pub type Hook = Arc<dyn Fn(&mut Entity, &PropertyMeta) + Send + Sync>;

/// Points of the setter pipeline hooks can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetterStage {
    /// Before the compare-and-set check, on every call.
    BeforeComparison,
    /// Right before the value is written.
    BeforeSet,
    /// Right after the value is written.
    AfterSet,
    /// Last, on every call, also when the write was skipped.
    AfterComparison,
}

/// Hooks of every stage of one property's setter.
#[derive(Clone, Default)]
pub struct SetterHooks {
    before_comparison: Vec<Hook>,
    before_set: Vec<Hook>,
    after_set: Vec<Hook>,
    after_comparison: Vec<Hook>,
}

impl SetterHooks {
    pub fn add(&mut self, stage: SetterStage, hook: impl Fn(&mut Entity, &PropertyMeta) + Send + Sync + 'static) {
        self.stage_mut(stage).push(Arc::new(hook));
    }

    pub fn stage(&self, stage: SetterStage) -> &[Hook] {
        match stage {
            SetterStage::BeforeComparison => &self.before_comparison,
            SetterStage::BeforeSet => &self.before_set,
            SetterStage::AfterSet => &self.after_set,
            SetterStage::AfterComparison => &self.after_comparison,
        }
    }

    fn stage_mut(&mut self, stage: SetterStage) -> &mut Vec<Hook> {
        match stage {
            SetterStage::BeforeComparison => &mut self.before_comparison,
            SetterStage::BeforeSet => &mut self.before_set,
            SetterStage::AfterSet => &mut self.after_set,
            SetterStage::AfterComparison => &mut self.after_comparison,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before_comparison.is_empty()
            && self.before_set.is_empty()
            && self.after_set.is_empty()
            && self.after_comparison.is_empty()
    }

    pub(crate) fn run(&self, stage: SetterStage, entity: &mut Entity, property: &PropertyMeta) {
        for hook in self.stage(stage) {
            hook(entity, property);
        }
    }
}

impl fmt::Debug for SetterHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterHooks")
            .field("before_comparison", &self.before_comparison.len())
            .field("before_set", &self.before_set.len())
            .field("after_set", &self.after_set.len())
            .field("after_comparison", &self.after_comparison.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Per-instance state

/// Initializes extension state of a freshly created instance.
pub type StateFactory = Arc<dyn Fn(&mut ExtensionState) + Send + Sync>;

/// Extension state attached to one instance, one value per type.
#[derive(Default)]
pub struct ExtensionState(TypeIdMap<Box<dyn Any + Send + Sync>>);

impl ExtensionState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.0.insert_type::<T>(Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.get_type::<T>()?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.0.get_mut_type::<T>()?.downcast_mut::<T>()
    }

    #[inline]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.0.contains_type::<T>()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionState").field("len", &self.0.len()).finish()
    }
}

// -----------------------------------------------------------------------------
// Extension

/// What an extension sees of the context being built.
#[derive(Clone, Copy)]
pub struct ExtensionContext<'a> {
    pub config: &'a ContextConfig,
    pub graph: &'a TypeGraph,
}

/// A participant in context builds.
///
/// All methods have empty defaults. `validate` runs once per build before
/// the first issue check; the contributions run while types are compiled,
/// only when the configuration has no errors.
pub trait Extension: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn validate(&mut self, cx: ExtensionContext<'_>, issues: &mut IssueCollector) {
        let _ = (cx, issues);
    }

    fn contribute_type(&self, cx: ExtensionContext<'_>, node: &GraphNode, states: &mut Vec<StateFactory>) {
        let _ = (cx, node, states);
    }

    fn contribute_setter(
        &self,
        cx: ExtensionContext<'_>,
        node: &GraphNode,
        property: &GraphProperty,
        hooks: &mut SetterHooks,
    ) {
        let _ = (cx, node, property, hooks);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ExtensionState, SetterHooks, SetterStage};

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn state_by_type() {
        let mut state = ExtensionState::new();
        assert!(state.get::<Counter>().is_none());

        state.insert(Counter(1));
        state.insert(String::from("x"));
        state.get_mut::<Counter>().unwrap().0 += 1;

        assert_eq!(state.get::<Counter>(), Some(&Counter(2)));
        assert_eq!(state.get::<String>().map(String::as_str), Some("x"));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn hooks_by_stage() {
        let mut hooks = SetterHooks::default();
        assert!(hooks.is_empty());
        hooks.add(SetterStage::AfterSet, |_, _| {});
        hooks.add(SetterStage::AfterSet, |_, _| {});
        assert_eq!(hooks.stage(SetterStage::AfterSet).len(), 2);
        assert!(hooks.stage(SetterStage::BeforeSet).is_empty());
    }
}
