use std::sync::{Arc, Mutex};

use cl_config::options::PropertySetterMode;
use cl_config::{IssueKind, Severity};
use cl_reflect::info::{MemberKind, PropertyInfo, TypeInfo, ValueType};

use super::models;
use super::{build, build_clean, build_fails, kinds};
use crate::{Entity, NotifyChangedBehavior, NotifyContextConfigExt, NotifyPropertyConfigExt};

type Log = Arc<Mutex<Vec<String>>>;

/// Subscribes a recorder of `name=value` lines.
fn record(entity: &mut Entity) -> Log {
    let log = Log::default();
    let sink = Arc::clone(&log);
    entity
        .subscribe(move |entity, name| {
            let value = entity.get(name).unwrap();
            sink.lock().unwrap().push(format!("{name}={value}"));
        })
        .unwrap();
    log
}

fn lines(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn on_all_entities() {
    let root = models::root();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&root);
    });

    let mut entity = context.create("IRoot").unwrap();
    assert!(entity.notifies_changes());
    let log = record(&mut entity);

    entity.set("RootInt", 42).unwrap();
    entity.set("RootString", "text").unwrap();
    entity.set("RootInt", 42).unwrap();
    assert_eq!(lines(&log), ["RootInt=42", "RootString=text", "RootInt=42"]);
}

#[test]
fn inactive_without_options() {
    let root = models::root();
    let context = build_clean(|b| {
        b.entity(&root);
    });

    let mut entity = context.create("IRoot").unwrap();
    assert!(!entity.notifies_changes());
    let err = entity.subscribe(|_, _| {}).unwrap_err();
    assert_eq!(
        err.message(),
        "Type 'models::IRoot' does not implement change notification"
    );
}

#[test]
fn only_entities_with_enabled_properties() {
    let root = models::root();
    let root2 = models::root2();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnlyOnEntitiesWithEnabledProperties);
        b.entity(&root).property("RootInt").enable_notify_property_changed(true);
        b.entity(&root2);
    });

    let mut entity = context.create("IRoot").unwrap();
    let log = record(&mut entity);
    entity.set("RootString", "skipped").unwrap();
    entity.set("RootInt", 1).unwrap();
    assert_eq!(lines(&log), ["RootInt=1"]);

    let mut other = context.create("IRoot2").unwrap();
    assert!(!other.notifies_changes());
    assert!(other.subscribe(|_, _| {}).is_err());
}

#[test]
fn disabled_per_property() {
    let root = models::root();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&root).property("RootInt").enable_notify_property_changed(false);
    });

    let mut entity = context.create("IRoot").unwrap();
    let log = record(&mut entity);
    entity.set("RootInt", 1).unwrap();
    entity.set("RootString", "text").unwrap();
    assert_eq!(lines(&log), ["RootString=text"]);
}

#[test]
fn redundant_property_calls() {
    let root = models::root();
    let redundant = IssueKind::CallIsRedundantOnProperty {
        call: "enable_notify_property_changed",
    };

    let context = build(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&root).property("RootInt").enable_notify_property_changed(true);
    });
    assert_eq!(kinds(context.issues(), Severity::Info), [&redundant]);

    let context = build(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnlyOnEntitiesWithEnabledProperties);
        b.entity(&root).property("RootInt").enable_notify_property_changed(false);
    });
    assert_eq!(kinds(context.issues(), Severity::Info), [&redundant]);
    assert!(!context.create("IRoot").unwrap().notifies_changes());
}

#[test]
fn enabled_implicitly() {
    let root = models::root();
    let context = build(|b| {
        b.entity(&root).property("RootInt").enable_notify_property_changed(true);
    });

    assert_eq!(
        kinds(context.issues(), Severity::Warning),
        [&IssueKind::ExtensionIsNotEnabledExplicitly {
            enable: "use_notify_property_changed",
            configure: "enable_notify_property_changed",
        }]
    );
    assert_eq!(
        kinds(context.issues(), Severity::Info),
        [&IssueKind::CallIsRedundantOnProperty {
            call: "enable_notify_property_changed"
        }]
    );

    // The default behavior applies to every property.
    let mut entity = context.create("IRoot").unwrap();
    let log = record(&mut entity);
    entity.set("RootString", "text").unwrap();
    assert_eq!(lines(&log), ["RootString=text"]);
}

#[test]
fn disabled() {
    let root = models::root();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::Disable);
        b.entity(&root);
    });
    let mut entity = context.create("IRoot").unwrap();
    assert!(!entity.notifies_changes());
    assert!(entity.subscribe(|_, _| {}).is_err());

    let context = build(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::Disable);
        b.entity(&root).property("RootInt").enable_notify_property_changed(true);
    });
    assert_eq!(
        kinds(context.issues(), Severity::Warning),
        [&IssueKind::ExtensionIsUsedWhileDisabled {
            option: "enable_notify_property_changed"
        }]
    );
    assert!(!context.create("IRoot").unwrap().notifies_changes());
}

// -----------------------------------------------------------------------------
// Subscribers

#[test]
fn subscribers_in_order() {
    let root = models::root();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&root);
    });

    let mut entity = context.create("IRoot").unwrap();
    let log = Log::default();
    let mut ids = Vec::new();
    for tag in ["first", "second"] {
        let sink = Arc::clone(&log);
        let id = entity
            .subscribe(move |_, name| sink.lock().unwrap().push(format!("{tag}:{name}")))
            .unwrap();
        ids.push(id);
    }

    entity.set("RootInt", 1).unwrap();
    assert!(entity.unsubscribe(ids[0]));
    assert!(!entity.unsubscribe(ids[0]));
    entity.set("RootInt", 2).unwrap();

    assert_eq!(lines(&log), ["first:RootInt", "second:RootInt", "second:RootInt"]);
}

#[test]
fn no_notifications_without_setters() {
    let root = models::root();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&root);
    });

    let mut entity = context.create("IRoot").unwrap();
    let log = record(&mut entity);

    // Clones start without subscribers.
    let mut copy = entity.clone();
    copy.set("RootInt", 5).unwrap();
    assert!(lines(&log).is_empty());

    let json = context.serialize(&[copy]).unwrap();
    let mut decoded = context.deserialize_str(&json).unwrap();
    assert!(lines(&log).is_empty());
    let decoded_log = record(&mut decoded[0]);
    decoded[0].set("RootInt", 6).unwrap();
    assert_eq!(lines(&decoded_log), ["RootInt=6"]);
    assert!(lines(&log).is_empty());
}

#[test]
fn compare_and_set() {
    let info = TypeInfo::interface("models::INotifyCompare")
        .property(PropertyInfo::new("Double", ValueType::F64))
        .property(PropertyInfo::new("Int", ValueType::I32))
        .build();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&info)
            .any_property(true)
            .use_property_setter_mode(PropertySetterMode::CompareAndSet);
    });

    let mut entity = context.create("INotifyCompare").unwrap();
    let log = record(&mut entity);

    entity.set("Int", 0).unwrap();
    assert!(lines(&log).is_empty());

    entity.set("Double", f64::NAN).unwrap();
    entity.set("Double", f64::NAN).unwrap();
    assert_eq!(lines(&log), ["Double=NaN", "Double=NaN"]);

    log.lock().unwrap().clear();
    entity.set("Double", f64::INFINITY).unwrap();
    entity.set("Double", f64::INFINITY).unwrap();
    entity.set("Int", 3).unwrap();
    entity.set("Int", 3).unwrap();
    assert_eq!(lines(&log), ["Double=inf", "Int=3"]);
}

// -----------------------------------------------------------------------------
// Types declaring notification themselves

#[test]
fn notifying_interface() {
    let info = TypeInfo::interface("models::INotifying")
        .notifies_changes()
        .property(PropertyInfo::new("Value", ValueType::I32))
        .build();
    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&info);
    });

    let mut entity = context.create("INotifying").unwrap();
    let log = record(&mut entity);
    entity.set("Value", 7).unwrap();
    assert_eq!(lines(&log), ["Value=7"]);
}

#[test]
fn class_with_own_raiser() {
    let raised = Log::default();
    let sink = Arc::clone(&raised);
    let base = TypeInfo::class("models::NotifyingBase")
        .auto_property("Value", ValueType::I32)
        .change_raiser(move |fields, name| {
            let value = fields.value("<Value>k__BackingField");
            sink.lock().unwrap().push(format!("{name}={value}"));
        })
        .build();
    let derived = TypeInfo::class("models::NotifyingDerived")
        .extends(&base)
        .auto_property("Other", ValueType::I32)
        .build();

    let context = build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&base);
        b.entity(&derived);
    });

    let mut entity = context.create("NotifyingDerived").unwrap();
    assert!(entity.notifies_changes());
    assert_eq!(
        entity.subscribe(|_, _| {}).unwrap_err().message(),
        "Type 'models::NotifyingDerived' does not implement change notification"
    );

    entity.set("Value", 1).unwrap();
    entity.set("Other", 2).unwrap();
    assert_eq!(lines(&raised), ["Value=1", "Other=1"]);
}

#[test]
fn class_without_raiser() {
    let info = TypeInfo::class("models::NotifyingWithoutRaiser")
        .notifies_changes()
        .auto_property("Value", ValueType::I32)
        .build();
    let err = build_fails(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&info);
    });
    assert_eq!(err.first.kind, IssueKind::RaisePropertyChangedNotFound);

    // Not checked while the extension is inactive.
    build_clean(|b| {
        b.entity(&info);
    });
}

#[test]
fn class_with_property_changed_event() {
    let info = TypeInfo::class("models::WithEvent")
        .auto_property("Value", ValueType::I32)
        .member("PropertyChanged", MemberKind::Event)
        .build();
    let err = build_fails(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&info);
    });
    assert_eq!(err.first.kind, IssueKind::ContainsPropertyChangedEvent);

    // A method of that name does not clash.
    let info = TypeInfo::class("models::WithMethod")
        .auto_property("Value", ValueType::I32)
        .member("PropertyChanged", MemberKind::Method)
        .build();
    build_clean(|b| {
        b.use_notify_property_changed(NotifyChangedBehavior::ImplementOnAllEntities);
        b.entity(&info);
    });
}
