//! Query Surface (QS): the read-only operations exposed once a
//! [`crate::graph::ReferenceGraph`] has a dominator-computed, strategy-
//! applied retained-size column. See spec §4.6.

mod by_class;
mod biggest_objects;
mod fields;
mod retained_analyzer;

pub use by_class::{biggest_objects_by_class, DEFAULT_BY_CLASS_N};
pub use biggest_objects::{biggest_objects, ObjectSummary, SortKey};
pub use fields::{extract_fields, FieldValue};
pub use retained_analyzer::{analyze_retained_size, HolderTotals, RetainedBreakdown, ScenarioTotals};

use crate::graph::{PathResult, ReferenceGraph};
use crate::ids::ObjectIndex;

/// Thin wrapper over [`ReferenceGraph::path_to_gc_root`] so callers can
/// reach every query operation through `crate::query::*` uniformly.
#[must_use]
pub fn path_to_gc_root(graph: &ReferenceGraph, start: ObjectIndex, k: usize, d: usize) -> PathResult {
    graph.path_to_gc_root(start, k, d)
}
