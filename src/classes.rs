//! Class table: class metadata, the class id → name interning layer, and
//! ordered field descriptors (spec §3 "Class" / "Field descriptor").

use hashbrown::HashMap;

use crate::ids::ClassId;

/// One of the nine primitive JVM field kinds, plus `Object` for reference
/// fields.
#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BasicType {
    Object,
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

/// A value baked into a static-field descriptor when the field does not
/// reference another object.
#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// The field is object-typed and refers to another heap object.
    Reference(crate::ids::ObjectId),
}

/// One instance or static field, in declaration order.
#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub basic_type: BasicType,
    /// Present only for static fields; `None` for instance fields (whose
    /// values live per-instance as outgoing edges / primitive payload,
    /// neither of which the class table stores).
    pub static_value: Option<StaticValue>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn instance(name: impl Into<String>, basic_type: BasicType) -> Self {
        Self {
            name: name.into(),
            basic_type,
            static_value: None,
        }
    }

    #[must_use]
    pub fn static_field(
        name: impl Into<String>,
        basic_type: BasicType,
        value: StaticValue,
    ) -> Self {
        Self {
            name: name.into(),
            basic_type,
            static_value: Some(value),
        }
    }
}

/// One entry of the class table.
#[derive(Debug, Clone)]
pub struct Class {
    pub class_id: ClassId,
    pub name: String,
    pub super_id: ClassId,
    pub instance_fields: Vec<FieldDescriptor>,
    pub static_fields: Vec<FieldDescriptor>,
}

/// `ClassId(0)` is used as "no superclass" (mirrors the common
/// `super_class_object_id == 0` convention seen in heap-dump-reading code,
/// e.g. `other_examples/.../hprof-slurp/result_recorder.rs`'s
/// `while parent_class_id != 0` walk).
pub const NO_SUPERCLASS: ClassId = ClassId(0);

/// Build-time, append-only table of classes plus the class-name
/// interning map. Immutable after the owning [`crate::graph::ReferenceGraph`]
/// finalizes.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<ClassId, Class>,
}

impl ClassTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class. A later call with the same `class_id` overwrites
    /// the earlier registration (decoders occasionally see a class-load
    /// record more than once across hprof segments).
    pub fn add_class(
        &mut self,
        class_id: ClassId,
        name: impl Into<String>,
        super_id: ClassId,
        instance_fields: Vec<FieldDescriptor>,
        static_fields: Vec<FieldDescriptor>,
    ) {
        self.classes.insert(
            class_id,
            Class {
                class_id,
                name: name.into(),
                super_id,
                instance_fields,
                static_fields,
            },
        );
    }

    #[must_use]
    pub fn get(&self, class_id: ClassId) -> Option<&Class> {
        self.classes.get(&class_id)
    }

    #[must_use]
    pub fn name(&self, class_id: ClassId) -> Option<&str> {
        self.classes.get(&class_id).map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn class_id_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes
            .values()
            .find(|c| c.name == name)
            .map(|c| c.class_id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Every registered class, in no particular order (serialization
    /// sorts by [`ClassId`] itself when a stable on-disk order matters).
    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Walks the class hierarchy (this class then every ancestor via
    /// `super_id`) collecting instance fields in order, per spec §4.6
    /// "Field extraction". A cycle in `super_id` (malformed input) breaks
    /// the walk rather than looping forever.
    #[must_use]
    pub fn instance_fields_with_inherited(&self, class_id: ClassId) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        let mut current = Some(class_id);
        let mut visited = hashbrown::HashSet::new();
        while let Some(id) = current {
            if id == NO_SUPERCLASS || !visited.insert(id) {
                break;
            }
            let Some(class) = self.classes.get(&id) else {
                break;
            };
            out.extend(class.instance_fields.iter());
            current = Some(class.super_id);
        }
        out
    }
}
