//! Field extraction (spec §4.6 "Field extraction"): resolves an object's
//! declared instance fields (including inherited ones) against its
//! outgoing edges by field name, falling back to one entry per outgoing
//! edge when the class layout is unknown.

use crate::classes::BasicType;
use crate::graph::ReferenceGraph;
use crate::ids::{ObjectId, ObjectIndex};

/// One resolved field of an object: its declared name/type, plus — for
/// object-typed fields that resolved to a live outgoing edge — the
/// referent's identity and sizes.
#[derive(Debug, Clone)]
pub struct FieldValue {
    pub name: String,
    pub basic_type: BasicType,
    pub target_index: Option<ObjectIndex>,
    pub target_object_id: Option<ObjectId>,
    pub target_class_name: Option<String>,
    pub shallow_size: Option<i64>,
    pub retained_size: Option<i64>,
    pub has_children: Option<bool>,
}

impl FieldValue {
    fn primitive(name: String, basic_type: BasicType) -> Self {
        Self {
            name,
            basic_type,
            target_index: None,
            target_object_id: None,
            target_class_name: None,
            shallow_size: None,
            retained_size: None,
            has_children: None,
        }
    }

    fn reference(graph: &ReferenceGraph, name: String, target: ObjectIndex) -> Self {
        Self {
            name,
            basic_type: BasicType::Object,
            target_index: Some(target),
            target_object_id: Some(graph.object_id(target)),
            target_class_name: graph.class_name(target).map(str::to_owned),
            shallow_size: Some(graph.shallow_size(target)),
            retained_size: Some(graph.retained_size(target)),
            has_children: Some(!graph.outgoing().targets(target).is_empty()),
        }
    }
}

/// Returns the fields of `index`'s class (this class then every ancestor,
/// in declaration order). Object-typed fields without a matching outgoing
/// edge are returned as an unresolved field (all target fields `None`).
#[must_use]
pub fn extract_fields(graph: &ReferenceGraph, index: ObjectIndex) -> Vec<FieldValue> {
    let class_id = graph.class_id(index);
    let descriptors = graph.classes().instance_fields_with_inherited(class_id);
    if descriptors.is_empty() {
        return fallback_from_edges(graph, index);
    }

    let outgoing = graph.outgoing();
    let targets = outgoing.targets(index);
    let field_ids = outgoing.field_ids(index);

    descriptors
        .into_iter()
        .map(|descriptor| {
            if descriptor.basic_type != BasicType::Object {
                return FieldValue::primitive(descriptor.name.clone(), descriptor.basic_type);
            }
            let matched = targets
                .iter()
                .zip(field_ids)
                .find(|(_, &field_id)| outgoing.field_name(field_id) == descriptor.name)
                .map(|(&target, _)| target);
            match matched {
                Some(target) => FieldValue::reference(graph, descriptor.name.clone(), target),
                None => FieldValue::primitive(descriptor.name.clone(), BasicType::Object),
            }
        })
        .collect()
}

fn fallback_from_edges(graph: &ReferenceGraph, index: ObjectIndex) -> Vec<FieldValue> {
    let outgoing = graph.outgoing();
    outgoing
        .targets(index)
        .iter()
        .zip(outgoing.field_ids(index))
        .map(|(&target, &field_id)| {
            FieldValue::reference(graph, outgoing.field_name(field_id).to_owned(), target)
        })
        .collect()
}
