//! Retained-size analyzer (spec §4.6, diagnostic): decomposes a chosen
//! instance's retained size into dominated-children / via-object-array
//! buckets and four cumulative scenario totals. Purely analytical — it
//! recomputes its own strict-retained vector locally rather than trusting
//! [`ReferenceGraph::retained_size`], which may already carry whichever
//! [`crate::strategy`] last ran, and never writes anything back.
//!
//! The bottom-up walk is the same shape as [`crate::dominators::retained`];
//! the credit-pair discovery mirrors
//! [`crate::strategy::logical_ownership::LogicalOwnershipStrategy`], with
//! the per-instance/per-holder-class bucketing this diagnostic needs.

use hashbrown::{HashMap, HashSet};

use crate::cancel::CancellationToken;
use crate::config::{Config, LogicalOwnershipConfig};
use crate::error::{ErrorKind, GraphResult};
use crate::graph::ReferenceGraph;
use crate::ids::{ClassId, ObjectId, ObjectIndex, SUPER_ROOT};

const ARRAY_LIST_CLASS: &str = "java.util.ArrayList";
const IDENTITY_HASH_MAP_CLASS: &str = "java.util.IdentityHashMap";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HolderTotals {
    pub array_list: i64,
    pub identity_hash_map: i64,
    pub other: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioTotals {
    pub base: i64,
    pub base_plus_array_list: i64,
    pub base_plus_array_list_and_identity_hash_map: i64,
    pub base_plus_all_object_array: i64,
}

#[derive(Debug, Clone)]
pub struct RetainedBreakdown {
    pub index: ObjectIndex,
    pub object_id: ObjectId,
    pub shallow_size: i64,
    pub dominated_children_retained: i64,
    pub via_object_array_retained: i64,
    pub holder_totals: HolderTotals,
    pub scenarios: ScenarioTotals,
}

/// Builds dominator-tree children arrays (same shape as
/// [`crate::dominators::retained::propagate_retained_sizes`]), sized to
/// `object_count() + 1` for the super-root slot.
fn build_dominator_children(graph: &ReferenceGraph) -> Vec<Vec<ObjectIndex>> {
    let total_slots = graph.object_count() + 1;
    let mut children: Vec<Vec<ObjectIndex>> = vec![Vec::new(); total_slots];
    for i in 0..total_slots {
        let idx = ObjectIndex::from_usize(i);
        if let Some(dominator) = graph.dominator(idx) {
            if dominator != idx {
                children[dominator.index()].push(idx);
            }
        }
    }
    children
}

/// Independent bottom-up strict-retained recomputation, read-only: never
/// touches `graph`'s stored retained-size column.
fn strict_retained_from_children(
    graph: &ReferenceGraph,
    children: &[Vec<ObjectIndex>],
    cancel: &CancellationToken,
) -> GraphResult<Vec<i64>> {
    let total_slots = children.len();
    let mut order: Vec<ObjectIndex> = Vec::with_capacity(total_slots);
    let mut stack: Vec<(ObjectIndex, usize)> = vec![(SUPER_ROOT, 0)];
    while let Some((node, mut cursor)) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(error_stack::report!(ErrorKind::Cancelled)
                .attach_printable("retained-size analyzer traversal cancelled"));
        }
        let kids = &children[node.index()];
        if cursor < kids.len() {
            let child = kids[cursor];
            cursor += 1;
            stack.push((node, cursor));
            stack.push((child, 0));
        } else {
            order.push(node);
        }
    }

    let mut retained = vec![0i64; total_slots];
    for i in 0..total_slots {
        retained[i] = graph.shallow_size(ObjectIndex::from_usize(i));
    }
    for node in order {
        if node == SUPER_ROOT {
            continue;
        }
        let mut total = graph.shallow_size(node);
        for &child in &children[node.index()] {
            total += retained[child.index()];
        }
        retained[node.index()] = total;
    }
    Ok(retained)
}

/// For every object reachable through a collection-owned array, records
/// the class id(s) of the collection instance(s) that own the array it
/// came through (spec §4.5's "collection-owned array" predicate, reused
/// here purely for read-only bucketing).
fn build_owned_arrays_by_child(
    graph: &ReferenceGraph,
    config: &LogicalOwnershipConfig,
) -> HashMap<ObjectIndex, Vec<ClassId>> {
    let mut result: HashMap<ObjectIndex, Vec<ClassId>> = HashMap::new();
    let Some(object_array_class) = graph.classes().class_id_by_name(&config.object_array_class) else {
        return result;
    };
    let collection_classes: HashSet<ClassId> = config
        .collection_classes
        .iter()
        .filter_map(|name| graph.classes().class_id_by_name(name))
        .collect();
    if collection_classes.is_empty() {
        return result;
    }

    let mut arrays = Vec::new();
    graph.iterate(|idx| {
        if !idx.is_super_root() && graph.class_id(idx) == object_array_class {
            arrays.push(idx);
        }
    });

    for array_idx in arrays {
        let holder_classes: Vec<ClassId> = graph
            .incoming()
            .source_classes(array_idx)
            .iter()
            .copied()
            .filter(|c| collection_classes.contains(c))
            .collect();
        if holder_classes.is_empty() {
            continue;
        }
        for &child in graph.outgoing().targets(array_idx) {
            result.entry(child).or_default().extend(holder_classes.iter().copied());
        }
    }
    result
}

fn classify_holder(graph: &ReferenceGraph, holder_classes: &[ClassId]) -> HolderKind {
    for &class_id in holder_classes {
        match graph.classes().name(class_id) {
            Some(name) if name == ARRAY_LIST_CLASS => return HolderKind::ArrayList,
            Some(name) if name == IDENTITY_HASH_MAP_CLASS => return HolderKind::IdentityHashMap,
            _ => {}
        }
    }
    HolderKind::Other
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HolderKind {
    ArrayList,
    IdentityHashMap,
    Other,
}

fn analyze_one(
    graph: &ReferenceGraph,
    instance: ObjectIndex,
    children: &[Vec<ObjectIndex>],
    strict_retained: &[i64],
    owned_arrays_by_child: &HashMap<ObjectIndex, Vec<ClassId>>,
) -> RetainedBreakdown {
    let shallow_size = graph.shallow_size(instance);

    let dominated_children_retained: i64 = children[instance.index()]
        .iter()
        .map(|&c| strict_retained[c.index()])
        .sum();

    let mut via_object_array_retained = 0i64;
    let mut holder_totals = HolderTotals::default();

    for &child in graph.outgoing().targets(instance) {
        if graph.dominator(child) == Some(instance) {
            continue; // already counted in dominated_children_retained
        }
        let Some(holder_classes) = owned_arrays_by_child.get(&child) else {
            continue;
        };
        let retained = strict_retained[child.index()];
        via_object_array_retained += retained;
        match classify_holder(graph, holder_classes) {
            HolderKind::ArrayList => holder_totals.array_list += retained,
            HolderKind::IdentityHashMap => holder_totals.identity_hash_map += retained,
            HolderKind::Other => holder_totals.other += retained,
        }
    }

    let base = shallow_size + dominated_children_retained;
    let base_plus_array_list = base + holder_totals.array_list;
    let base_plus_array_list_and_identity_hash_map =
        base_plus_array_list + holder_totals.identity_hash_map;
    let base_plus_all_object_array = base + via_object_array_retained;

    RetainedBreakdown {
        index: instance,
        object_id: graph.object_id(instance),
        shallow_size,
        dominated_children_retained,
        via_object_array_retained,
        holder_totals,
        scenarios: ScenarioTotals {
            base,
            base_plus_array_list,
            base_plus_array_list_and_identity_hash_map,
            base_plus_all_object_array,
        },
    }
}

/// Decomposes the retained size of up to `m` of `class_name`'s largest
/// instances (ranked by the graph's current retained-size column, whatever
/// strategy produced it). Unknown class names return an empty list.
#[must_use]
pub fn analyze_retained_size(
    graph: &mut ReferenceGraph,
    config: &Config,
    class_name: &str,
    m: usize,
    cancel: &CancellationToken,
) -> GraphResult<Vec<RetainedBreakdown>> {
    let Some(class_id) = graph.classes().class_id_by_name(class_name) else {
        return Ok(Vec::new());
    };
    let mut instances = graph.by_class(class_id).to_vec();
    instances.sort_by_key(|&idx| std::cmp::Reverse(graph.retained_size(idx)));
    instances.truncate(m.max(1));

    let children = build_dominator_children(graph);
    let strict_retained = strict_retained_from_children(graph, &children, cancel)?;
    let owned_arrays_by_child = build_owned_arrays_by_child(graph, &config.logical_ownership);

    Ok(instances
        .into_iter()
        .map(|idx| analyze_one(graph, idx, &children, &strict_retained, &owned_arrays_by_child))
        .collect())
}
