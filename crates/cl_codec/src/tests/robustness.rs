use chrono::NaiveDate;
use cl_config::options::PropertyAccessMode;
use cl_reflect::Value;
use uuid::Uuid;

use super::build_clean;
use super::models::{self, Enums};
use crate::{Context, Entity};

const MODES: [PropertyAccessMode; 4] = [
    PropertyAccessMode::Field,
    PropertyAccessMode::FieldForGetterAndInitializationPropertyForSetter,
    PropertyAccessMode::FieldForGetterPropertyForSetter,
    PropertyAccessMode::Property,
];

fn context(mode: PropertyAccessMode) -> Context {
    let enums = Enums::new();
    let info = models::different_types_class(&enums);
    build_clean(|b| {
        b.entity(&info).any_property(true).use_property_access_mode(mode);
    })
}

fn sample(context: &Context) -> Entity {
    let enums = Enums::new();
    let mut entity = context.create("DifferentTypesClass").unwrap();
    entity.set("Int", 42).unwrap();
    entity.set("Char", '\n').unwrap();
    entity.set("String", "str").unwrap();
    let date_time = NaiveDate::from_ymd_opt(2019, 7, 11)
        .and_then(|d| d.and_hms_opt(10, 33, 0))
        .unwrap();
    entity.set("DateTime", date_time).unwrap();
    entity.set("EnumByte", enums.byte.value("BVal1")).unwrap();
    entity.set("GuidNullable", Some(Uuid::nil())).unwrap();
    entity.set("EnumLongNullable", enums.long.value("LVal2")).unwrap();
    entity
}

const SAMPLE: &str = concat!(
    r#"[{"_t":"DifferentTypesClass","Int":42,"Char":"\n","String":"str","DateTime":"2019-07-11T10:33:00","#,
    r#""EnumByte":"BVal1","GuidNullable":"00000000-0000-0000-0000-000000000000","EnumLongNullable":"LVal2"}]"#
);

#[test]
fn access_modes_round_trip() {
    for mode in MODES {
        let context = context(mode);
        let entity = sample(&context);
        let json = context.serialize(core::slice::from_ref(&entity)).unwrap();
        assert_eq!(json, SAMPLE, "{mode}");
        assert_eq!(context.deserialize_str(&json).unwrap(), [entity], "{mode}");
    }
}

#[test]
fn partial_data() {
    let context = context(PropertyAccessMode::Property);
    for end in 0..SAMPLE.len() {
        let result = context.deserialize_str(&SAMPLE[..end]);
        assert!(result.is_err(), "prefix of {end} bytes was accepted");
    }
    assert!(context.deserialize_str(SAMPLE).is_ok());
}

#[test]
fn extra_data() {
    let context = context(PropertyAccessMode::Field);
    let err = context.deserialize_str(&format!("{SAMPLE}x")).unwrap_err();
    assert_eq!(err.message(), "Not all bytes are consumed, trailing data found");
    assert_eq!(err.position(), Some(SAMPLE.len()));

    assert!(context.deserialize_str(&format!("{SAMPLE}[]")).is_err());
    assert!(context.deserialize_str(&format!(" {SAMPLE} \n// done\n")).is_ok());
}

#[test]
fn altered_data() {
    let context = context(PropertyAccessMode::Field);
    let bytes = SAMPLE.as_bytes();
    let free_text = SAMPLE.find("\"str\"").map(|start| start + 1..start + 4).unwrap();

    // Every byte outside the free text of the string property matters.
    for (index, &byte) in bytes.iter().enumerate() {
        if free_text.contains(&index) {
            continue;
        }
        let mut altered = bytes.to_vec();
        altered[index] = b'Y';
        assert!(
            context.deserialize(&altered).is_err(),
            "replacing byte {index} ('{}') was accepted",
            byte as char
        );
    }

    // Nor can a byte be inserted anywhere else.
    for index in 0..=bytes.len() {
        if (free_text.start..=free_text.end).contains(&index) {
            continue;
        }
        let mut altered = bytes.to_vec();
        altered.insert(index, b'Y');
        assert!(
            context.deserialize(&altered).is_err(),
            "inserting at byte {index} was accepted"
        );
    }
}

#[test]
fn property_not_found() {
    let context = context(PropertyAccessMode::Field);
    let json = SAMPLE.replace("\"String\"", "\"Replacement\"");
    let err = context.deserialize_str(&json).unwrap_err();
    assert!(err.message().contains("Replacement"), "{err}");
    assert_eq!(err.position(), json.find(",\"Replacement\""));

    let entity = context.create("DifferentTypesClass").unwrap();
    assert_eq!(
        entity.get("Replacement").unwrap_err().message(),
        "Property 'Replacement' not found on an Entity"
    );
}

#[test]
fn type_not_found() {
    let context = context(PropertyAccessMode::Field);
    let err = context.deserialize_str(r#"[{"_t":"Unknown"}]"#).unwrap_err();
    assert_eq!(err.to_string(), "Type 'Unknown' not found (at byte position: 7)");
}

#[test]
fn discriminator_must_come_first() {
    let context = context(PropertyAccessMode::Field);
    let err = context
        .deserialize_str(r#"[{"Int":1,"_t":"DifferentTypesClass"}]"#)
        .unwrap_err();
    assert!(err.message().contains("_t"), "{err}");

    let err = context.deserialize_str("[{}]").unwrap_err();
    assert!(err.message().contains("_t"), "{err}");
}

#[test]
fn discriminator_must_be_a_string() {
    let context = context(PropertyAccessMode::Field);
    for json in [r#"[{"_t":1}]"#, r#"[{"_t":null}]"#, r#"[{"_t":{}}]"#] {
        let err = context.deserialize_str(json).unwrap_err();
        assert!(err.message().contains("discriminator"), "{json}: {err}");
    }
}

#[test]
fn wrong_structure() {
    let context = context(PropertyAccessMode::Field);
    for json in ["", "{}", "[[]]", "[1]", "[null]", "null", "[", "]"] {
        assert!(context.deserialize_str(json).is_err(), "{json:?} was accepted");
    }
    assert!(context.deserialize_str(" [ ] ").unwrap().is_empty());
}

#[test]
fn char_must_be_one_character() {
    let context = context(PropertyAccessMode::Field);
    let json = SAMPLE.replace(r#""Char":"\n""#, r#""Char":"xy""#);
    let err = context.deserialize_str(&json).unwrap_err();
    assert_eq!(
        err.message(),
        "Error while reading char property. String length is 2 (!= 1)"
    );

    let json = SAMPLE.replace(r#""Char":"\n""#, r#""Char":"""#);
    assert!(context.deserialize_str(&json).is_err());
}

#[test]
fn values_must_match_the_property_type() {
    let context = context(PropertyAccessMode::Field);
    let mut entity = context.create("DifferentTypesClass").unwrap();

    let err = entity.set("Int", "42").unwrap_err();
    assert_eq!(
        err.message(),
        "Value of kind 'string' cannot be assigned to property 'Int' of type 'i32'"
    );
    assert!(entity.set("Int", Value::Null).is_err());
    assert!(entity.set("String", Value::Null).is_ok());
    assert!(entity.set("GuidNullable", Value::Null).is_ok());
    assert_eq!(entity.get("Int").unwrap(), Value::I32(0));
}
