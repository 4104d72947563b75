//! By-class drill-down (spec §4.6): biggest objects of one named class,
//! unfiltered — inclusion decisions belong to [`super::biggest_objects`],
//! not here.

use crate::graph::ReferenceGraph;

use super::biggest_objects::{score_of, summarize, ObjectSummary, SortKey};

/// Default N when a caller doesn't specify one.
pub const DEFAULT_BY_CLASS_N: usize = 50;

/// Returns up to `n` objects of `class_name`, sorted descending by
/// `sort_key`. Unknown class names return an empty list.
#[must_use]
pub fn biggest_objects_by_class(
    graph: &mut ReferenceGraph,
    class_name: &str,
    sort_key: SortKey,
    n: usize,
) -> Vec<ObjectSummary> {
    let Some(class_id) = graph.classes().class_id_by_name(class_name) else {
        return Vec::new();
    };
    let mut indices = graph.by_class(class_id).to_vec();
    indices.sort_by_key(|&idx| std::cmp::Reverse(score_of(graph, idx, sort_key)));
    indices.truncate(n.max(1));
    indices.into_iter().map(|idx| summarize(graph, idx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::NO_SUPERCLASS;
    use crate::ids::{ClassId, ObjectId};
    use crate::roots::RootKind;

    #[test]
    fn returns_objects_of_the_named_class_sorted_descending() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "com.example.Widget", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_class(ClassId(2), "com.example.Other", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_object(ObjectId(1), ClassId(1), 10).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 50).unwrap();
        g.add_object(ObjectId(3), ClassId(2), 999).unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.add_gc_root(ObjectId(2), RootKind::StickyClass, None, None).unwrap();
        g.add_gc_root(ObjectId(3), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();

        let results = biggest_objects_by_class(&mut g, "com.example.Widget", SortKey::Shallow, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].shallow_size, 50);
        assert_eq!(results[1].shallow_size, 10);
    }

    #[test]
    fn unknown_class_name_is_empty() {
        let mut g = ReferenceGraph::new();
        g.finalize().unwrap();
        assert!(biggest_objects_by_class(&mut g, "nope.Nothing", SortKey::Shallow, 10).is_empty());
    }
}
