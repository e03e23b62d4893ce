//! Shared test hierarchy.
//!
//! Polymorphic entities are named by the path from their root: `ModelAAM`
//! is a child of `ModelAA`, itself a child of `ModelA`. A trailing `M` marks
//! a level with a hand-authored serializer that keeps `field_<p>1` and adds a
//! computed `manual_<p>3`; every other level is derived and keeps both
//! `field_<p>1` and `field_<p>2`.

use crate::{
    collection::{CollectionDef, CollectionRegistry},
    model::{EntityDecl, EntityMarker, EntityRegistry, FieldKind, FieldModel, Instance},
    serializer::{DeclaredField, SerializerDef, SerializerRegistry},
    value::Record,
};
use std::sync::Arc;

pub const APP: &str = "cqrs";
pub const MODULE: &str = "cqrs.tests.models";

/// Polymorphic prefixes in declaration order.
pub const POLYMORPHIC: [&str; 14] = [
    "a", "aa", "aaa", "aam", "am", "ama", "amm", "m", "ma", "maa", "mam", "mm", "mma", "mmm",
];

/// Prefixes with an authored serializer, in registration order.
pub const MANUAL: [&str; 7] = ["aam", "am", "amm", "m", "mam", "mm", "mmm"];

#[must_use]
pub fn path(name: &str) -> String {
    format!("{MODULE}.{name}")
}

#[must_use]
pub fn model_name(prefix: &str) -> String {
    format!("Model{}", prefix.to_uppercase())
}

// every level from the root down to the prefix itself
fn chain(prefix: &str) -> impl Iterator<Item = &str> {
    (1..=prefix.len()).map(move |n| &prefix[..n])
}

fn decl(name: &str) -> EntityDecl {
    EntityDecl::new(APP, MODULE, name)
}

/// Declarations for the full fixture hierarchy, parents first.
#[must_use]
pub fn entity_decls() -> Vec<EntityDecl> {
    let mut decls: Vec<_> = POLYMORPHIC
        .into_iter()
        .map(|prefix| {
            let decl = decl(&model_name(prefix)).fields([
                FieldModel::text(format!("field_{prefix}1")),
                FieldModel::text(format!("field_{prefix}2")),
            ]);
            if prefix.len() == 1 {
                decl.marker(EntityMarker::Polymorphic)
            } else {
                decl.base(path(&model_name(&prefix[..prefix.len() - 1])))
            }
        })
        .collect();

    decls.extend([
        decl("BoringModel").marker(EntityMarker::Plain).fields([
            FieldModel::text("roses").with_default("red"),
            FieldModel::text("violets").with_default("blue"),
        ]),
        decl("DryIngredientsMixin")
            .abstract_model()
            .fields([FieldModel::int("sugar"), FieldModel::int("flour")]),
        decl("OneMixingBowl")
            .marker(EntityMarker::Plain)
            .base(path("DryIngredientsMixin"))
            .fields([FieldModel::int("water"), FieldModel::int("oil")]),
        decl("AnotherMixingBowl")
            .marker(EntityMarker::Plain)
            .base(path("DryIngredientsMixin"))
            .fields([FieldModel::int("water"), FieldModel::int("oil")]),
        decl("AutomaticMixer")
            .marker(EntityMarker::Plain)
            .base(path("DryIngredientsMixin")),
    ]);

    decls
}

/// The full fixture hierarchy: the polymorphic tree plus the plain models.
#[must_use]
pub fn entities() -> EntityRegistry {
    let mut entities = EntityRegistry::new();
    for decl in entity_decls() {
        entities.declare(decl).expect("fixture entity should declare");
    }

    entities
}

/// Authored serializers in registration order.
#[must_use]
pub fn serializer_defs() -> Vec<SerializerDef> {
    let mut defs: Vec<_> = MANUAL.into_iter().map(manual_serializer).collect();
    defs.extend(plain_serializers());

    defs
}

/// Authored serializer for a polymorphic prefix ending in `m`.
#[must_use]
pub fn manual_serializer(prefix: &str) -> SerializerDef {
    SerializerDef::polymorphic(
        format!("{}Serializer", prefix.to_uppercase()),
        path(&model_name(prefix)),
    )
    .fields([format!("field_{prefix}1"), format!("manual_{prefix}3")])
    .declare(
        DeclaredField::new(format!("manual_{prefix}3"), FieldKind::Text)
            .source(format!("calc_{prefix}3"))
            .read_only(),
    )
}

/// Authored serializers for the plain models.
#[must_use]
pub fn plain_serializers() -> Vec<SerializerDef> {
    vec![
        SerializerDef::plain("BoringSerializer", path("BoringModel"))
            .fields(["violets", "daft_poem"])
            .declare(
                DeclaredField::new("daft_poem", FieldKind::Text)
                    .source("silly_poetry")
                    .read_only(),
            ),
        SerializerDef::plain("OneMixingBowlSerializer", path("OneMixingBowl"))
            .fields(["sugar", "water", "total"])
            .declare(DeclaredField::new("total", FieldKind::Int).read_only()),
        SerializerDef::plain("AnotherMixingBowlSerializer", path("AnotherMixingBowl")),
    ]
}

/// Serializer registry with every authored serializer registered.
#[must_use]
pub fn serializers() -> SerializerRegistry {
    let serializers = SerializerRegistry::new(Arc::new(entities()));
    for def in serializer_defs() {
        serializers
            .register(def)
            .expect("fixture serializer should register");
    }

    serializers
}

/// Collection definitions over the fixture models.
#[must_use]
pub fn collection_defs() -> Vec<CollectionDef> {
    vec![
        CollectionDef::polymorphic("ACollection", path("ModelA")),
        CollectionDef::polymorphic("MCollection", path("ModelM")),
        CollectionDef::sub("AMSubCollection", path("ModelAM")),
        CollectionDef::sub("AMMSubCollection", path("ModelAMM")),
        CollectionDef::sub("MAMSubCollection", path("ModelMAM")),
        CollectionDef::plain("BoringCollection", path("BoringModel")),
        CollectionDef::plain("OneMixingBowlCollection", path("OneMixingBowl")),
        CollectionDef::plain("AnotherMixingBowlCollection", path("AnotherMixingBowl")),
        CollectionDef::plain("AutomaticMixerCollection", path("AutomaticMixer")),
    ]
}

/// Collection registry over `serializers()` with every fixture collection.
#[must_use]
pub fn collections() -> CollectionRegistry {
    let collections = CollectionRegistry::new(Arc::new(serializers()));
    for def in collection_defs() {
        collections
            .register(def)
            .expect("fixture collection should register");
    }

    collections
}

/// Instance of a polymorphic fixture entity.
#[must_use]
pub fn polymorphic_instance(prefix: &str, id: i64) -> Instance {
    let mut instance = Instance::new(path(&model_name(prefix)), id);
    for level in chain(prefix) {
        instance.set(format!("field_{level}1"), level);
        instance.set(format!("field_{level}2"), level.to_uppercase());
        instance.set(format!("calc_{level}3"), format!("from calc_{level}3"));
    }

    instance
}

/// Expected encoding of `polymorphic_instance(prefix, id)`.
#[must_use]
pub fn polymorphic_record(prefix: &str, id: i64) -> Record {
    let mut record = Record::new()
        .with("id", id)
        .with("type", path(&model_name(prefix)));

    for level in chain(prefix) {
        record.insert(format!("field_{level}1"), level);
        if level.ends_with('m') {
            record.insert(format!("manual_{level}3"), format!("from calc_{level}3"));
        } else {
            record.insert(format!("field_{level}2"), level.to_uppercase());
        }
    }

    record
}

#[must_use]
pub fn silly_poetry(roses: &str, violets: &str) -> String {
    format!("Roses are {roses},\nViolets are {violets}.")
}

#[must_use]
pub fn boring_instance(id: i64) -> Instance {
    Instance::new(path("BoringModel"), id)
        .with("roses", "blue")
        .with("violets", "red")
        .with("silly_poetry", silly_poetry("blue", "red"))
}

#[must_use]
pub fn mixing_bowl_instance(name: &str, id: i64) -> Instance {
    Instance::new(path(name), id)
        .with("water", 100)
        .with("oil", 10)
        .with("sugar", 1000)
        .with("flour", 1)
        .with("total", 1111)
}
