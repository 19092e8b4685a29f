mod common;

use std::borrow::Cow;

use common::*;
use helios_bind::{
    BindErrorKind, Bound, ClassDecl, Codec, Element, FieldDecl, FieldType, Object, Result,
    ScalarKind, TypeRef, TypeRegistry, Value, Wrapper, WrapperFactory,
};

fn level_with(aa: Element) -> Vec<Element> {
    vec![Element::text("a", "1"), aa]
}

fn window(some_integer: i32) -> Object {
    Object::new("Window").with("someInteger", some_integer)
}

#[test]
fn test_wrapper_element_carries_runtime_type() -> Result<()> {
    let registry = open_levels();
    let codec = Codec::new(&registry);
    let level = Object::new("ALevel").with("a", 1).with(
        "aa",
        Wrapper::new(
            TypeRef::class("Window"),
            Object::new("RoundWindow").with("someInteger", 2).with("diameter", 0.5),
        )
        .with_nillable(true),
    );

    let elements = codec.marshal("ALevel", &level)?;
    let aa = &elements[1];
    assert_eq!(aa.name, "aa");
    assert_eq!(aa.type_tag(), Some("RoundWindow"));
    assert_eq!(aa.child("diameter").and_then(Element::text_content), Some("0.5"));

    Ok(())
}

#[test]
fn test_wrapper_round_trips_subtype_payload() -> Result<()> {
    let registry = open_levels();
    let codec = Codec::new(&registry);
    let level = Object::new("ALevel").with("a", 1).with(
        "aa",
        Wrapper::new(
            TypeRef::class("Window"),
            Object::new("RoundWindow").with("someInteger", 2),
        )
        .with_nillable(true),
    );

    let elements = codec.marshal("ALevel", &level)?;
    assert_eq!(codec.unmarshal("ALevel", &elements)?, level);

    Ok(())
}

#[test]
fn test_unregistered_type_tag_is_unknown_type() {
    let registry = open_levels();
    let codec = Codec::new(&registry);

    for tag in ["Sunroof", "xs:date"] {
        let aa = Element::with_children("aa", vec![Element::text("someInteger", "1")])
            .with_type_tag(tag);
        let err = codec.unmarshal("ALevel", &level_with(aa)).unwrap_err();
        assert!(
            matches!(err.kind, BindErrorKind::UnknownType { .. }),
            "tag {tag}"
        );
        assert_eq!(err.path.to_string(), "/aa");
    }
}

#[test]
fn test_type_outside_declared_hierarchy_is_mismatch() {
    let registry = open_levels();
    let codec = Codec::new(&registry);

    for tag in ["Door", "ALevel", "xs:string"] {
        let aa = Element::with_children("aa", vec![Element::text("someInteger", "1")])
            .with_type_tag(tag);
        let err = codec.unmarshal("ALevel", &level_with(aa)).unwrap_err();
        assert!(
            matches!(err.kind, BindErrorKind::TypeMismatch { .. }),
            "tag {tag}"
        );
    }
}

#[test]
fn test_marshal_rejects_incompatible_runtime_type() {
    let registry = open_levels();
    let codec = Codec::new(&registry);

    let wrapper = Wrapper {
        declared: TypeRef::class("Window"),
        runtime: TypeRef::class("Door"),
        nillable: true,
        payload: Some(Box::new(door_object(1).into())),
    };
    let level = Object::new("ALevel").with("a", 1).with("aa", wrapper);
    let err = codec.marshal("ALevel", &level).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::TypeMismatch { .. }));

    let wrapper = Wrapper::new(TypeRef::class("Window"), window(1)).with_nillable(true);
    let wrapper = Wrapper {
        runtime: TypeRef::class("Skylight"),
        ..wrapper
    };
    let level = Object::new("ALevel").with("a", 1).with("aa", wrapper);
    let err = codec.marshal("ALevel", &level).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::UnknownType { .. }));
}

#[test]
fn test_nil_wrapper_and_nil_field_stay_distinct() -> Result<()> {
    let registry = dataclasses();
    let codec = Codec::new(&registry);

    let nil_payload = minimal_car()
        .with("internalClassJAXBElement", Wrapper::nil(TypeRef::class("Door")))
        .with("stringJAXBElement", Bound::Nil);
    let elements = codec.marshal("Car", &nil_payload)?;

    let wrapped = elements
        .iter()
        .find(|e| e.name == "internalClassJAXBElement")
        .expect("wrapper element");
    assert!(wrapped.nil);
    assert_eq!(wrapped.type_tag(), Some("Door"));

    let field_nil = elements
        .iter()
        .find(|e| e.name == "stringJAXBElement")
        .expect("nil element");
    assert!(field_nil.nil);
    assert_eq!(field_nil.type_tag(), None);

    let decoded = codec.unmarshal("Car", &elements)?;
    assert_eq!(
        decoded.get("internalClassJAXBElement"),
        &Bound::Value(Value::Wrapper(Wrapper::nil(TypeRef::class("Door"))))
    );
    assert!(decoded.get("stringJAXBElement").is_nil());

    Ok(())
}

#[test]
fn test_nil_wrapper_needs_nillable_field() {
    let registry = open_levels();
    let codec = Codec::new(&registry);

    let registry_strict = TypeRegistry::from_declarations([
        ClassDecl::new("Window"),
        ClassDecl::new("Frame")
            .field(FieldDecl::new("pane", FieldType::class("Window")).wrapper()),
    ])
    .unwrap();
    let strict = Codec::new(&registry_strict);

    let frame = Object::new("Frame").with("pane", Wrapper::nil(TypeRef::class("Window")));
    let err = strict.marshal("Frame", &frame).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::NotNillableViolation { .. }));

    let nil_pane = Element::nil("pane").with_type_tag("Window");
    let err = strict.unmarshal("Frame", &[nil_pane]).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::NotNillableViolation { .. }));

    let nil_aa = Element::nil("aa").with_type_tag("RoundWindow");
    assert!(codec.unmarshal("ALevel", &level_with(nil_aa)).is_ok());
}

#[test]
fn test_untagged_wrapper_uses_static_type() -> Result<()> {
    let registry = dataclasses();
    let codec = Codec::new(&registry);

    let mut children = vec![
        Element::text("requiredInteger", "1"),
        Element::text("SCAused", "true"),
        Element::text("stringJAXBElement", "plain"),
        Element::with_children(
            "internalClassJAXBElement",
            vec![Element::text("someInteger", "5"), Element::text("track", "up")],
        ),
    ];
    let car = codec.unmarshal("Car", &children)?;
    assert_eq!(
        car.get("stringJAXBElement"),
        &Bound::Value(Value::Wrapper(
            Wrapper::new(TypeRef::Scalar(ScalarKind::String), "plain").with_nillable(true)
        ))
    );
    let Some(Value::Wrapper(door)) = car.get("internalClassJAXBElement").as_value() else {
        panic!("expected a wrapper");
    };
    assert_eq!(door.runtime, TypeRef::class("SlidingDoor"));

    children.push(Element::text("stringJAXBElement", "second"));
    let car = codec.unmarshal("Car", &children)?;
    assert_eq!(
        car.get("stringJAXBElement"),
        &Bound::Value(Value::Wrapper(
            Wrapper::new(TypeRef::Scalar(ScalarKind::String), "second").with_nillable(true)
        ))
    );

    Ok(())
}

/// Names wrapper elements after their field with a fixed suffix and treats
/// its wrappers as non-nillable.
struct Suffixed;

impl WrapperFactory for Suffixed {
    fn element_name<'f>(&self, field: &'f FieldDecl) -> Cow<'f, str> {
        Cow::Owned(format!("{}Element", field.element_name()))
    }

    fn nillable(&self, _field: &FieldDecl) -> bool {
        false
    }
}

#[test]
fn test_wrapper_factory_hook() -> Result<()> {
    let registry = open_levels();
    let codec = Codec::new(&registry).with_wrapper_factory(TypeRef::class("Window"), Suffixed);

    let level = Object::new("ALevel")
        .with("a", 1)
        .with("aa", Wrapper::new(TypeRef::class("Window"), window(9)));

    let elements = codec.marshal("ALevel", &level)?;
    assert_eq!(elements[1].name, "aaElement");
    assert_eq!(codec.unmarshal("ALevel", &elements)?, level);

    let err = codec
        .unmarshal("ALevel", &level_with(Element::nil("aaElement").with_type_tag("Door")))
        .unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::TypeMismatch { .. }));

    Ok(())
}

#[test]
fn test_default_wrapper_round_trips_on_plain_field() -> Result<()> {
    let registry = TypeRegistry::from_declarations([
        ClassDecl::new("Window")
            .field(FieldDecl::new("someInteger", FieldType::Scalar(ScalarKind::Int)).required()),
        ClassDecl::new("Frame")
            .field(FieldDecl::new("pane", FieldType::class("Window")).wrapper()),
    ])?;
    let codec = Codec::new(&registry);

    let frame = Object::new("Frame").with("pane", Wrapper::new(TypeRef::class("Window"), window(2)));
    let elements = codec.marshal("Frame", &frame)?;
    assert_eq!(codec.unmarshal("Frame", &elements)?, frame);

    Ok(())
}

#[test]
fn test_wrapper_flag_must_match_field_nillability() {
    let registry = open_levels();
    let codec = Codec::new(&registry);

    // `aa` is nillable, so a wrapper built without the flag cannot round-trip.
    let level = Object::new("ALevel")
        .with("a", 1)
        .with("aa", Wrapper::new(TypeRef::class("Window"), window(2)));
    let err = codec.marshal("ALevel", &level).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::TypeMismatch { .. }));
    assert_eq!(err.path.to_string(), "/aa");
}

#[test]
fn test_factory_name_colliding_with_field_is_ambiguous() {
    let registry = TypeRegistry::from_declarations([
        ClassDecl::new("Window")
            .field(FieldDecl::new("someInteger", FieldType::Scalar(ScalarKind::Int)).required()),
        ClassDecl::new("Frame")
            .field(FieldDecl::new("pane", FieldType::class("Window")).wrapper())
            .field(FieldDecl::new("paneElement", FieldType::Boxed(ScalarKind::String))),
    ])
    .unwrap();
    let codec = Codec::new(&registry).with_wrapper_factory(TypeRef::class("Window"), Suffixed);

    let children = vec![
        Element::with_children("paneElement", vec![Element::text("someInteger", "1")])
            .with_type_tag("Window"),
    ];
    let err = codec.unmarshal("Frame", &children).unwrap_err();
    assert_eq!(
        err.kind,
        BindErrorKind::AmbiguousField {
            element: "paneElement".to_string(),
            first: "pane".to_string(),
            second: "paneElement".to_string(),
        }
    );

    let frame = Object::new("Frame").with("paneElement", "glass");
    let err = codec.marshal("Frame", &frame).unwrap_err();
    assert!(matches!(err.kind, BindErrorKind::AmbiguousField { .. }));
}
