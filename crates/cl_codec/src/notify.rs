//! Change notification for compiled types.
//!
//! When enabled, the setter of every selected property raises the property
//! name after the value is written. Classes that notify by themselves keep
//! their own raiser; every other type gets a [`ChangeNotifier`] instance
//! state subscribers are registered with.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use cl_codec::{ContextBuilder, NotifyChangedBehavior, NotifyContextConfigExt};
//! use cl_reflect::info::{PropertyInfo, TypeInfo, ValueType};
//!
//! let root = TypeInfo::interface("models::IRoot")
//!     .property(PropertyInfo::new("RootInt", ValueType::I32))
//!     .build();
//!
//! let mut builder = ContextBuilder::new();
//! builder.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
//! builder.entity(&root);
//! let context = builder.build().unwrap();
//!
//! let changed = Arc::new(Mutex::new(Vec::new()));
//! let mut entity = context.create("IRoot").unwrap();
//! let sink = Arc::clone(&changed);
//! entity
//!     .subscribe(move |_, name| sink.lock().unwrap().push(name.to_owned()))
//!     .unwrap();
//!
//! entity.set("RootInt", 42).unwrap();
//! assert_eq!(*changed.lock().unwrap(), ["RootInt"]);
//! ```

use core::fmt;
use std::sync::Arc;

use cl_config::options::OptionDeclaration;
use cl_config::{ContextConfig, IssueCollector, IssueKind, IssueSource, PropertyConfig};
use cl_reflect::info::{ChangeRaiser, MemberKind, TypeInfo};
use cl_utils::hash::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::RuntimeError;
use crate::extension::{Extension, ExtensionContext, ExtensionState, SetterHooks, SetterStage, StateFactory};
use crate::graph::{GraphNode, GraphProperty};

/// Name of the event member that clashes with generated notification.
pub const PROPERTY_CHANGED_EVENT: &str = "PropertyChanged";

// -----------------------------------------------------------------------------
// Options

/// Which types get change notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotifyChangedBehavior {
    Disable,
    /// Every property of every declared type, unless disabled per property.
    #[default]
    ImplementOnAllEntities,
    /// Only types with at least one explicitly enabled property, and only
    /// the enabled properties.
    ImplementOnlyOnEntitiesWithEnabledProperties,
}

impl fmt::Display for NotifyChangedBehavior {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Context scope option selecting the [`NotifyChangedBehavior`].
pub struct UseNotifyPropertyChanged;

impl OptionDeclaration for UseNotifyPropertyChanged {
    type Value = NotifyChangedBehavior;
    const NAME: &'static str = "use_notify_property_changed";

    fn default_value() -> Option<NotifyChangedBehavior> {
        Some(NotifyChangedBehavior::ImplementOnAllEntities)
    }
}

/// Property scope option switching notification of one property.
pub struct EnableNotifyPropertyChanged;

impl OptionDeclaration for EnableNotifyPropertyChanged {
    type Value = bool;
    const NAME: &'static str = "enable_notify_property_changed";

    fn default_value() -> Option<bool> {
        Some(true)
    }
}

pub trait NotifyContextConfigExt {
    fn use_notify_property_changed(&mut self, behavior: NotifyChangedBehavior) -> &mut Self;
}

impl NotifyContextConfigExt for ContextConfig {
    #[track_caller]
    fn use_notify_property_changed(&mut self, behavior: NotifyChangedBehavior) -> &mut Self {
        self.set_option::<UseNotifyPropertyChanged>(behavior)
    }
}

pub trait NotifyPropertyConfigExt {
    fn enable_notify_property_changed(&mut self, enable: bool) -> &mut Self;
}

impl NotifyPropertyConfigExt for PropertyConfig {
    #[track_caller]
    fn enable_notify_property_changed(&mut self, enable: bool) -> &mut Self {
        self.set_option::<EnableNotifyPropertyChanged>(enable)
    }
}

// -----------------------------------------------------------------------------
// ChangeNotifier

/// Handle of a registered subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&Entity, &str) + Send + Sync>;

/// Per-instance subscriber list of types without their own raiser.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl ChangeNotifier {
    pub fn subscribe(&mut self, subscriber: impl Fn(&Entity, &str) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Arc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(known, _)| *known != id);
        self.subscribers.len() != before
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Calls every subscriber in subscription order.
    pub fn notify(&self, entity: &Entity, name: &str) {
        for (_, subscriber) in &self.subscribers {
            subscriber(entity, name);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Entity {
    /// Registers `subscriber` for change notifications of this instance.
    ///
    /// Fails if the type does not carry a [`ChangeNotifier`], either because
    /// notification is not enabled for it or because it raises changes
    /// through its own raiser.
    pub fn subscribe(
        &mut self,
        subscriber: impl Fn(&Entity, &str) + Send + Sync + 'static,
    ) -> Result<SubscriptionId, RuntimeError> {
        let type_path = Arc::clone(self.meta().type_path_arc());
        match self.extension_mut::<ChangeNotifier>() {
            Some(notifier) => Ok(notifier.subscribe(subscriber)),
            None => Err(RuntimeError::new(format!(
                "Type '{type_path}' does not implement change notification"
            ))),
        }
    }

    /// Removes a subscriber, returning `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.extension_mut::<ChangeNotifier>()
            .is_some_and(|notifier| notifier.unsubscribe(id))
    }

    /// Returns `true` if the instance raises change notifications.
    pub fn notifies_changes(&self) -> bool {
        let info = self.meta().info();
        self.extension::<ChangeNotifier>().is_some()
            || core::iter::once(info)
                .chain(info.base_classes())
                .any(|ty| ty.change_raiser().is_some())
    }
}

// -----------------------------------------------------------------------------
// NotifyPropertyChanged

/// What a build decided for one declared type.
struct TypePlan {
    raiser: Option<ChangeRaiser>,
    properties: HashSet<Arc<str>>,
}

/// The change notification extension.
///
/// It stays inactive unless one of its options is used.
#[derive(Default)]
pub struct NotifyPropertyChanged {
    plans: HashMap<usize, TypePlan>,
}

impl NotifyPropertyChanged {
    /// Checks the type's notification contract and returns its raiser, if
    /// the type brings its own.
    fn source_raiser(
        info: &TypeInfo,
        source: IssueSource,
        node: &GraphNode,
        issues: &mut IssueCollector,
    ) -> Result<Option<ChangeRaiser>, ()> {
        let notifies = info.notifies_changes()
            || info.base_classes().any(|base| base.notifies_changes())
            || info.all_interfaces().iter().any(|i| i.notifies_changes());

        if notifies {
            if info.is_interface() {
                return Ok(None);
            }
            let raiser = core::iter::once(info)
                .chain(info.base_classes().map(|base| &**base))
                .find_map(TypeInfo::change_raiser);
            return match raiser {
                Some(raiser) => Ok(Some(Arc::clone(raiser))),
                None => {
                    issues.report(IssueKind::RaisePropertyChangedNotFound, source, node.location());
                    Err(())
                }
            };
        }

        let has_event = core::iter::once(info)
            .chain(info.base_classes().map(|base| &**base))
            .filter_map(|ty| ty.member(PROPERTY_CHANGED_EVENT))
            .any(|member| member.kind() == MemberKind::Event);
        if has_event {
            issues.report(IssueKind::ContainsPropertyChangedEvent, source, node.location());
            return Err(());
        }
        Ok(None)
    }
}

impl Extension for NotifyPropertyChanged {
    fn name(&self) -> &'static str {
        "notify_property_changed"
    }

    fn validate(&mut self, cx: ExtensionContext<'_>, issues: &mut IssueCollector) {
        self.plans.clear();

        let behavior_call = cx.config.options().call::<UseNotifyPropertyChanged>();
        let explicit: Vec<(&GraphNode, &GraphProperty, bool)> = cx
            .graph
            .declared()
            .flat_map(|node| node.properties().iter().map(move |p| (node, p)))
            .filter_map(|(node, p)| Some((node, p, *p.options().get::<EnableNotifyPropertyChanged>()?)))
            .collect();

        if behavior_call.is_none() {
            if explicit.is_empty() {
                return;
            }
            issues.report(
                IssueKind::ExtensionIsNotEnabledExplicitly {
                    enable: UseNotifyPropertyChanged::NAME,
                    configure: EnableNotifyPropertyChanged::NAME,
                },
                IssueSource::Context,
                None,
            );
        }

        let behavior = cx
            .config
            .options()
            .value_or_default::<UseNotifyPropertyChanged>()
            .unwrap_or_default();
        log::debug!("change notification: {behavior}");

        let redundant = match behavior {
            NotifyChangedBehavior::Disable => {
                if !explicit.is_empty() {
                    issues.report(
                        IssueKind::ExtensionIsUsedWhileDisabled {
                            option: EnableNotifyPropertyChanged::NAME,
                        },
                        IssueSource::Context,
                        behavior_call.and_then(|call| call.location()),
                    );
                }
                return;
            }
            NotifyChangedBehavior::ImplementOnAllEntities => true,
            NotifyChangedBehavior::ImplementOnlyOnEntitiesWithEnabledProperties => false,
        };

        for &(node, property, enabled) in &explicit {
            if enabled == redundant {
                let location = property
                    .options()
                    .call::<EnableNotifyPropertyChanged>()
                    .and_then(|call| call.location());
                issues.report(
                    IssueKind::CallIsRedundantOnProperty {
                        call: EnableNotifyPropertyChanged::NAME,
                    },
                    IssueSource::of_property(node.info().path_arc(), property.name_arc()),
                    location,
                );
            }
        }

        let default_enabled = behavior == NotifyChangedBehavior::ImplementOnAllEntities;
        for node in cx.graph.declared() {
            if !default_enabled
                && !explicit
                    .iter()
                    .any(|(other, _, enabled)| *enabled && other.index() == node.index())
            {
                continue;
            }

            let source = IssueSource::of_type(node.info().path_arc());
            let Ok(raiser) = Self::source_raiser(node.info(), source, node, issues) else {
                continue;
            };
            let properties = node
                .properties()
                .iter()
                .filter(|p| {
                    p.options()
                        .get::<EnableNotifyPropertyChanged>()
                        .copied()
                        .unwrap_or(default_enabled)
                })
                .map(|p| Arc::clone(p.name_arc()))
                .collect();
            self.plans.insert(node.index(), TypePlan { raiser, properties });
        }
    }

    fn contribute_type(&self, _: ExtensionContext<'_>, node: &GraphNode, states: &mut Vec<StateFactory>) {
        if let Some(plan) = self.plans.get(&node.index())
            && plan.raiser.is_none()
        {
            states.push(Arc::new(|state: &mut ExtensionState| state.insert(ChangeNotifier::default())));
        }
    }

    fn contribute_setter(
        &self,
        _: ExtensionContext<'_>,
        node: &GraphNode,
        property: &GraphProperty,
        hooks: &mut SetterHooks,
    ) {
        let Some(plan) = self.plans.get(&node.index()) else {
            return;
        };
        if !plan.properties.contains(property.name()) {
            return;
        }

        match &plan.raiser {
            Some(raiser) => {
                let raiser = Arc::clone(raiser);
                hooks.add(SetterStage::AfterSet, move |entity, meta| {
                    raiser(entity.fields(), meta.name());
                });
            }
            None => hooks.add(SetterStage::AfterSet, |entity, meta| {
                let entity: &Entity = entity;
                if let Some(notifier) = entity.extension::<ChangeNotifier>() {
                    notifier.notify(entity, meta.name());
                }
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
