//! Shared class declarations and sample objects for the integration tests.

#![allow(dead_code)]

use helios_bind::value::list;
use helios_bind::{
    ClassDecl, Entry, FieldDecl, FieldType, Object, ScalarKind, TypeRef, TypeRegistry, Value,
    Wrapper,
};
use rust_decimal_macros::dec;

fn boxed(kind: ScalarKind) -> FieldType {
    FieldType::Boxed(kind)
}

fn scalar(kind: ScalarKind) -> FieldType {
    FieldType::Scalar(kind)
}

pub fn door() -> ClassDecl {
    ClassDecl::new("Door").field(FieldDecl::new("someInteger", scalar(ScalarKind::Int)).required())
}

pub fn sliding_door() -> ClassDecl {
    ClassDecl::new("SlidingDoor")
        .extends("Door")
        .field(FieldDecl::new("track", boxed(ScalarKind::String)))
}

pub fn towbar() -> ClassDecl {
    ClassDecl::new("Towbar")
        .field(FieldDecl::new("length", boxed(ScalarKind::Decimal)))
        .field(FieldDecl::new("model", boxed(ScalarKind::String)).nillable())
}

pub fn car() -> ClassDecl {
    ClassDecl::new("Car")
        .field(FieldDecl::new("requiredInteger", boxed(ScalarKind::Int)).required())
        .field(
            FieldDecl::new("requiredBoolean", boxed(ScalarKind::Boolean))
                .with_xml_name("SCAused")
                .required(),
        )
        .field(FieldDecl::new("nullableShort", boxed(ScalarKind::Short)).nillable())
        .field(FieldDecl::new(
            "listOfInternalClasses",
            FieldType::repeated(FieldType::class("Door")),
        ))
        .field(
            FieldDecl::new(
                "nullableListOfInternalClasses",
                FieldType::repeated(FieldType::class("Door")),
            )
            .nillable(),
        )
        .field(
            FieldDecl::new("stringJAXBElement", boxed(ScalarKind::String))
                .wrapper()
                .nillable(),
        )
        .field(
            FieldDecl::new("internalClassJAXBElement", FieldType::class("Door"))
                .wrapper()
                .nillable(),
        )
        .field(FieldDecl::new("nullableInternalClass", FieldType::class("Towbar")).nillable())
        .field(FieldDecl::new("primitiveInt", scalar(ScalarKind::Int)))
        .field(FieldDecl::new("primitiveBoolean", scalar(ScalarKind::Boolean)))
        .field(FieldDecl::new("primitiveLong", scalar(ScalarKind::Long)))
        .field(FieldDecl::new("primitiveByteArray", FieldType::Binary))
        .field(FieldDecl::new("primitiveShort", scalar(ScalarKind::Short)))
}

pub fn cxf_map() -> ClassDecl {
    ClassDecl::new("CxfMap").field(
        FieldDecl::new("entries", FieldType::map(FieldType::class("Door"))).with_xml_name("entry"),
    )
}

pub fn types() -> ClassDecl {
    ClassDecl::new("Types")
        .field(FieldDecl::new("integer", boxed(ScalarKind::Int)).with_xml_name("Integer"))
        .field(
            FieldDecl::new("cars", FieldType::repeated(FieldType::class("Car")))
                .with_xml_name("Cars"),
        )
        .field(FieldDecl::new("bool", boxed(ScalarKind::Boolean)).with_xml_name("Bool"))
        .field(
            FieldDecl::new("nillableShort", boxed(ScalarKind::Short))
                .with_xml_name("NillableShort")
                .nillable(),
        )
        .field(FieldDecl::new("car", FieldType::class("Car")).nillable())
        .field(FieldDecl::new("primInt", scalar(ScalarKind::Int)))
        .field(FieldDecl::new("primBool", scalar(ScalarKind::Boolean)))
        .field(FieldDecl::new("primLong", scalar(ScalarKind::Long)))
        .field(FieldDecl::new("primByteArray", FieldType::Binary))
        .field(FieldDecl::new("primShort", scalar(ScalarKind::Short)))
        .field(FieldDecl::new("primDouble", scalar(ScalarKind::Double)))
        .field(FieldDecl::new("primFloat", scalar(ScalarKind::Float)))
}

/// Car, Door, Towbar, CxfMap and Types.
pub fn dataclasses() -> TypeRegistry {
    let registry =
        TypeRegistry::from_declarations([door(), sliding_door(), towbar(), car(), cxf_map(), types()])
            .unwrap();
    registry.validate().unwrap();
    registry
}

/// Abstract three-level hierarchy: ALevel <- BLevel <- CLevel.
pub fn abstract_levels() -> TypeRegistry {
    TypeRegistry::from_declarations([
        ClassDecl::new("ALevel")
            .abstract_class()
            .field(FieldDecl::new("a", scalar(ScalarKind::Int)).required()),
        ClassDecl::new("BLevel")
            .abstract_class()
            .extends("ALevel")
            .field(FieldDecl::new("b", scalar(ScalarKind::Int)).required())
            .field(FieldDecl::new("bb", boxed(ScalarKind::Decimal))),
        ClassDecl::new("CLevel")
            .extends("BLevel")
            .field(FieldDecl::new("c", scalar(ScalarKind::Int)).required()),
        ClassDecl::new("Holder").field(FieldDecl::new("level", FieldType::class("ALevel"))),
    ])
    .unwrap()
}

/// Open hierarchy: concrete ALevel <- BLevel <- {CLevel, CLevel2}, with a
/// wrapper field of static type Window.
pub fn open_levels() -> TypeRegistry {
    let registry = TypeRegistry::from_declarations([
        door(),
        ClassDecl::new("Window").field(FieldDecl::new("someInteger", scalar(ScalarKind::Int)).required()),
        ClassDecl::new("RoundWindow")
            .extends("Window")
            .field(FieldDecl::new("diameter", boxed(ScalarKind::Double))),
        ClassDecl::new("ALevel")
            .field(FieldDecl::new("a", scalar(ScalarKind::Int)).required())
            .field(FieldDecl::new("aa", FieldType::class("Window")).wrapper().nillable()),
        ClassDecl::new("BLevel")
            .extends("ALevel")
            .field(FieldDecl::new("b", scalar(ScalarKind::Int)).required())
            .field(FieldDecl::new("bb", boxed(ScalarKind::Decimal)))
            .field(FieldDecl::new("bbb", FieldType::class("Door")).required())
            .field(FieldDecl::new("bbbb", FieldType::repeated(boxed(ScalarKind::String))))
            .field(FieldDecl::new("bbbbb", scalar(ScalarKind::Boolean)).required()),
        ClassDecl::new("CLevel")
            .extends("BLevel")
            .field(FieldDecl::new("c", scalar(ScalarKind::Int)).required()),
        ClassDecl::new("CLevel2")
            .extends("BLevel")
            .field(FieldDecl::new("c", scalar(ScalarKind::Int)).required()),
        ClassDecl::new("ClassWithBLevel")
            .field(FieldDecl::new("bLevel", FieldType::repeated(FieldType::class("BLevel")))),
    ])
    .unwrap();
    registry.validate().unwrap();
    registry
}

pub fn base_decl() -> ClassDecl {
    ClassDecl::new("Base")
        .abstract_class()
        .field(FieldDecl::new("a", scalar(ScalarKind::Int)).required())
}

pub fn derived_decl() -> ClassDecl {
    ClassDecl::new("Derived")
        .extends("Base")
        .field(FieldDecl::new("b", boxed(ScalarKind::Boolean)))
}

pub fn holder_decl() -> ClassDecl {
    ClassDecl::new("Holder").field(FieldDecl::new("base", FieldType::class("Base")))
}

/// Base (abstract) <- Derived, held by Holder.base.
pub fn base_derived() -> TypeRegistry {
    TypeRegistry::from_declarations([base_decl(), derived_decl(), holder_decl()]).unwrap()
}

pub fn door_object(some_integer: i32) -> Object {
    Object::new("Door").with("someInteger", some_integer)
}

/// A car with every field of its declaration present.
pub fn full_car() -> Object {
    Object::new("Car")
        .with("requiredInteger", 7)
        .with("requiredBoolean", true)
        .with("nullableShort", 12i16)
        .with("listOfInternalClasses", list([door_object(1), door_object(2)]))
        .with("nullableListOfInternalClasses", list([door_object(3)]))
        .with(
            "stringJAXBElement",
            Wrapper::new(TypeRef::Scalar(ScalarKind::String), "wrapped").with_nillable(true),
        )
        .with(
            "internalClassJAXBElement",
            Wrapper::new(TypeRef::class("Door"), door_object(4)).with_nillable(true),
        )
        .with(
            "nullableInternalClass",
            Object::new("Towbar").with("length", dec!(1.25)).with("model", "hitch"),
        )
        .with("primitiveInt", -5)
        .with("primitiveBoolean", false)
        .with("primitiveLong", 9_000_000_000i64)
        .with("primitiveByteArray", vec![0u8, 1, 2, 255])
        .with("primitiveShort", 3i16)
}

/// A car with only its required fields present.
pub fn minimal_car() -> Object {
    Object::new("Car")
        .with("requiredInteger", 1)
        .with("requiredBoolean", false)
}

pub fn cxf_map_object(entries: Vec<Entry>) -> Object {
    Object::new("CxfMap").with("entries", Value::Map(entries))
}
