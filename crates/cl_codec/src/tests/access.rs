use cl_config::options::{DefaultValueHandling, PropertyAccessMode, PropertySetterMode};
use cl_reflect::Value;

use super::models::{self, Counters};
use super::{build, build_clean};
use crate::Context;

fn counted(mode: PropertyAccessMode, setter_mode: PropertySetterMode) -> (Context, Counters) {
    let (info, counters) = models::properties_with_counters();
    let context = build_clean(|b| {
        b.entity(&info)
            .property("Test")
            .use_property_access_mode(mode)
            .use_property_setter_mode(setter_mode)
            .has_default_value(7);
    });
    (context, counters)
}

#[test]
fn accessor_calls_per_access_mode() {
    use PropertyAccessMode::*;

    // (mode, setter calls on creation, getter calls on encoding, setter calls on decoding)
    let table = [
        (Property, 1, 1, 2),
        (FieldForGetterPropertyForSetter, 1, 0, 2),
        (FieldForGetterAndInitializationPropertyForSetter, 0, 0, 0),
        (Field, 0, 0, 0),
    ];

    for (mode, create_setter, serialize_getter, deserialize_setter) in table {
        let (context, counters) = counted(mode, PropertySetterMode::Set);

        let mut entity = None;
        let (_, setter) = counters.delta(|| entity = Some(context.create("PropertiesWithCounters").unwrap()));
        assert_eq!(setter, create_setter, "{mode}: creation");
        let entity = entity.unwrap();
        assert_eq!(entity.get("Test").unwrap(), Value::I32(7), "{mode}");

        let mut json = String::new();
        let (getter, _) = counters.delta(|| json = context.serialize(core::slice::from_ref(&entity)).unwrap());
        assert_eq!(getter, serialize_getter, "{mode}: encoding");
        assert_eq!(json, r#"[{"_t":"PropertiesWithCounters","Test":7}]"#);

        let json = json.replace('7', "5");
        let mut decoded = Vec::new();
        let (_, setter) = counters.delta(|| decoded = context.deserialize_str(&json).unwrap());
        assert_eq!(setter, deserialize_setter, "{mode}: decoding");
        assert_eq!(decoded[0].get("Test").unwrap(), Value::I32(5), "{mode}");
        assert_eq!(decoded[0].field("_test"), Some(&Value::I32(5)), "{mode}");
    }
}

#[test]
fn explicit_access_goes_through_the_setter() {
    use PropertyAccessMode::*;

    // (mode, getter calls on get, setter calls on set)
    let table = [
        (Property, 1, 1),
        (FieldForGetterPropertyForSetter, 0, 1),
        (FieldForGetterAndInitializationPropertyForSetter, 0, 1),
        (Field, 0, 0),
    ];

    for (mode, get_calls, set_calls) in table {
        let (context, counters) = counted(mode, PropertySetterMode::Set);
        let mut entity = context.create("PropertiesWithCounters").unwrap();

        let (getter, _) = counters.delta(|| assert_eq!(entity.get("Test").unwrap(), Value::I32(7)));
        assert_eq!(getter, get_calls, "{mode}: get");

        let (_, setter) = counters.delta(|| entity.set("Test", 9).unwrap());
        assert_eq!(setter, set_calls, "{mode}: set");
        assert_eq!(entity.field("_test"), Some(&Value::I32(9)), "{mode}");
    }
}

#[test]
fn compare_and_set_reads_first() {
    let (context, counters) = counted(PropertyAccessMode::Property, PropertySetterMode::CompareAndSet);
    let mut entity = context.create("PropertiesWithCounters").unwrap();

    assert_eq!(counters.delta(|| entity.set("Test", 7).unwrap()), (1, 0));
    assert_eq!(counters.delta(|| entity.set("Test", 8).unwrap()), (1, 1));
    assert_eq!(counters.delta(|| entity.set("Test", 8).unwrap()), (1, 0));

    let (context, counters) = counted(PropertyAccessMode::Field, PropertySetterMode::CompareAndSet);
    let mut entity = context.create("PropertiesWithCounters").unwrap();
    assert_eq!(counters.delta(|| entity.set("Test", 8).unwrap()), (0, 0));
    assert_eq!(entity.get("Test").unwrap(), Value::I32(8));
}

#[test]
fn factories_skip_the_lookup() {
    let (info, _) = models::properties_with_counters();
    let context = build(|b| {
        b.entity(&info);
    });

    let factory = context.factory("models::PropertiesWithCounters").unwrap();
    let entity = factory.create();
    assert_eq!(entity.type_name(), "PropertiesWithCounters");
    assert!(std::sync::Arc::ptr_eq(factory.meta(), entity.meta()));
}

// -----------------------------------------------------------------------------
// Option precedence

#[test]
fn property_options_override_any_entity_options() {
    let root = models::root();
    let context = build_clean(|b| {
        b.any_entity_type()
            .any_property()
            .use_default_value_handling(DefaultValueHandling::IgnoreAndPopulate);
        b.entity(&root)
            .property("RootInt")
            .use_default_value_handling(DefaultValueHandling::Include);
    });

    let entity = context.create("IRoot").unwrap();
    assert_eq!(context.serialize(&[entity]).unwrap(), r#"[{"_t":"IRoot","RootInt":0}]"#);
}

#[test]
fn declared_only_scope_skips_inherited_properties() {
    let root = models::root();
    let base = models::base(&root);
    let context = build_clean(|b| {
        b.entity(&base)
            .any_property(false)
            .use_default_value_handling(DefaultValueHandling::IgnoreAndPopulate);
    });

    let entity = context.create("IBase").unwrap();
    assert_eq!(
        context.serialize(&[entity]).unwrap(),
        r#"[{"_t":"IBase","RootInt":0,"RootString":null}]"#
    );

    let context = build_clean(|b| {
        b.entity(&base)
            .any_property(true)
            .use_default_value_handling(DefaultValueHandling::IgnoreAndPopulate);
    });
    let entity = context.create("IBase").unwrap();
    assert_eq!(context.serialize(&[entity]).unwrap(), r#"[{"_t":"IBase"}]"#);
}

#[test]
fn derived_types_inherit_property_options() {
    let root = models::root();
    let base = models::base(&root);
    let context = build_clean(|b| {
        b.entity(&root).property("RootInt").has_default_value(5);
        b.entity(&base);
    });

    assert_eq!(context.create("IRoot").unwrap().get("RootInt").unwrap(), Value::I32(5));
    assert_eq!(context.create("IBase").unwrap().get("RootInt").unwrap(), Value::I32(5));

    // Without the ancestor declared there is nothing to inherit from.
    let context = build_clean(|b| {
        b.entity(&base);
    });
    assert_eq!(context.create("IBase").unwrap().get("RootInt").unwrap(), Value::I32(0));
}

#[test]
fn type_scope_beats_inherited_options() {
    let root = models::root();
    let base = models::base(&root);
    let context = build_clean(|b| {
        b.entity(&root)
            .any_property(false)
            .use_default_value_handling(DefaultValueHandling::IgnoreAndPopulate);
        b.entity(&base)
            .any_property(true)
            .use_default_value_handling(DefaultValueHandling::Include);
    });

    let entities = [context.create("IRoot").unwrap(), context.create("IBase").unwrap()];
    assert_eq!(
        context.serialize(&entities).unwrap(),
        concat!(
            r#"[{"_t":"IRoot"},"#,
            r#"{"_t":"IBase","RootInt":0,"RootString":null,"BaseInt":0,"BaseString":null}]"#
        )
    );
}
