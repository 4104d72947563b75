//! LogicalOwnership strategy: restores retained-size credit to a parent
//! that logically owns a child through collection-internal indirection
//! (spec §4.5). Grounded on the GC-root/class vocabulary and superclass-walk
//! style of `other_examples/09e32171_agourlay-hprof-slurp__src-result_recorder.rs`,
//! composed with the teacher's dense-index-over-hash-map preference for the
//! hot inner loop.

use hashbrown::{HashMap, HashSet};

use super::RetainedSizeStrategy;
use crate::cancel::CancellationToken;
use crate::config::LogicalOwnershipConfig;
use crate::error::GraphResult;
use crate::graph::ReferenceGraph;
use crate::ids::{ObjectIndex, SUPER_ROOT};

pub struct LogicalOwnershipStrategy {
    config: LogicalOwnershipConfig,
}

impl LogicalOwnershipStrategy {
    #[must_use]
    pub fn new(config: LogicalOwnershipConfig) -> Self {
        Self { config }
    }
}

impl RetainedSizeStrategy for LogicalOwnershipStrategy {
    fn name(&self) -> &'static str {
        "logical_ownership"
    }

    fn apply(&self, graph: &mut ReferenceGraph, cancel: &CancellationToken) -> GraphResult<Vec<i64>> {
        // Indices run `0..=object_count()` (0 is the super-root), so the
        // working vector needs one more slot than `object_count()`.
        let total_slots = graph.object_count() + 1;
        let mut retained: Vec<i64> = (0..total_slots)
            .map(|i| graph.retained_size(ObjectIndex::from_usize(i)))
            .collect();

        let Some(object_array_class) = graph.classes().class_id_by_name(&self.config.object_array_class)
        else {
            return Ok(retained);
        };
        let collection_classes: HashSet<_> = self
            .config
            .collection_classes
            .iter()
            .filter_map(|name| graph.classes().class_id_by_name(name))
            .collect();
        if collection_classes.is_empty() {
            return Ok(retained);
        }

        // Step 1-2: collection-owned object-array instances.
        let object_arrays = graph.by_class(object_array_class).to_vec();
        let mut owned_arrays = Vec::new();
        for &array_idx in &object_arrays {
            if cancel.is_cancelled() {
                return super::cancelled("LogicalOwnership: scanning object arrays");
            }
            let owned = graph
                .incoming()
                .source_classes(array_idx)
                .iter()
                .any(|class_id| collection_classes.contains(class_id));
            if owned {
                owned_arrays.push(array_idx);
            }
        }
        if owned_arrays.is_empty() {
            return Ok(retained);
        }

        // Step 3: children reachable through any collection-owned array.
        let mut credited_children: HashSet<ObjectIndex> = HashSet::new();
        for &array_idx in &owned_arrays {
            for &child in graph.outgoing().targets(array_idx) {
                credited_children.insert(child);
            }
        }
        if credited_children.is_empty() {
            return Ok(retained);
        }

        // Step 4: collect (parent, child) credit pairs, each counted once.
        let mut processed_pairs: HashSet<(ObjectIndex, ObjectIndex)> = HashSet::new();
        let mut credits_by_parent: HashMap<ObjectIndex, Vec<ObjectIndex>> = HashMap::new();
        for p in 0..total_slots {
            if cancel.is_cancelled() {
                return super::cancelled("LogicalOwnership: collecting credit pairs");
            }
            let parent = ObjectIndex::from_usize(p);
            for &child in graph.outgoing().targets(parent) {
                if !credited_children.contains(&child) {
                    continue;
                }
                if graph.dominator(child) == Some(parent) {
                    continue;
                }
                if !processed_pairs.insert((parent, child)) {
                    continue;
                }
                credits_by_parent.entry(parent).or_default().push(child);
            }
        }
        if credits_by_parent.is_empty() {
            return Ok(retained);
        }

        // Step 5: apply deepest-parent-first so nested ownership compounds.
        let max_depth = self.config.max_credit_depth;
        let mut parents: Vec<ObjectIndex> = credits_by_parent.keys().copied().collect();
        let depths: HashMap<ObjectIndex, usize> = parents
            .iter()
            .map(|&p| (p, dominator_depth(graph, p, max_depth)))
            .collect();
        parents.sort_by_key(|p| std::cmp::Reverse(depths[p]));

        for parent in parents {
            if cancel.is_cancelled() {
                return super::cancelled("LogicalOwnership: applying credits");
            }
            let children = &credits_by_parent[&parent];
            let credit: i64 = children.iter().map(|&c| retained[c.index()]).sum();
            retained[parent.index()] += credit;
        }

        Ok(retained)
    }
}

/// Number of dominator-tree hops from `start` to the super-root, capped at
/// `cap` (spec §4.5: "capped at a safety limit to defend against
/// pathological inputs").
fn dominator_depth(graph: &ReferenceGraph, start: ObjectIndex, cap: usize) -> usize {
    let mut node = start;
    let mut depth = 0;
    while depth < cap && node != SUPER_ROOT {
        match graph.dominator(node) {
            Some(d) if d != node => {
                node = d;
                depth += 1;
            }
            _ => break,
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{FieldDescriptor, NO_SUPERCLASS};
    use crate::classes::BasicType;
    use crate::dominators;
    use crate::ids::{ClassId, ObjectId};
    use crate::roots::RootKind;

    /// Root1 -> Parent -> ArrayList -> (internal array) -> Child, and
    /// Parent -> Child directly; a second, disjoint Root2 -> Child edge
    /// pushes `dominator(Child)` up to the super-root even though Parent
    /// still logically owns Child through both a direct edge and the
    /// collection-owned array. LogicalOwnership must restore that credit.
    #[test]
    fn restores_credit_through_a_collection_owned_array() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "com.example.Root", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_class(ClassId(2), "com.example.Parent", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_class(
            ClassId(3),
            "java.util.ArrayList",
            NO_SUPERCLASS,
            vec![FieldDescriptor::instance("elementData", BasicType::Object)],
            vec![],
        )
        .unwrap();
        g.add_class(ClassId(4), "java.lang.Object[]", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_class(ClassId(5), "com.example.Child", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_class(ClassId(6), "com.example.Root2", NO_SUPERCLASS, vec![], vec![])
            .unwrap();

        g.add_object(ObjectId(1), ClassId(1), 4).unwrap(); // Root1
        g.add_object(ObjectId(2), ClassId(2), 16).unwrap(); // Parent
        g.add_object(ObjectId(3), ClassId(3), 24).unwrap(); // ArrayList
        g.add_object(ObjectId(4), ClassId(4), 32).unwrap(); // internal Object[]
        g.add_object(ObjectId(5), ClassId(5), 100).unwrap(); // Child
        g.add_object(ObjectId(6), ClassId(6), 4).unwrap(); // Root2

        g.add_edge(ObjectId(1), ObjectId(2), "parent").unwrap();
        g.add_edge(ObjectId(2), ObjectId(3), "list").unwrap();
        g.add_edge(ObjectId(3), ObjectId(4), "elementData").unwrap();
        g.add_edge(ObjectId(4), ObjectId(5), "[0]").unwrap();
        g.add_edge(ObjectId(2), ObjectId(5), "cachedRef").unwrap();
        g.add_edge(ObjectId(6), ObjectId(5), "ref").unwrap();

        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.add_gc_root(ObjectId(6), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();

        let cancel = CancellationToken::new();
        dominators::compute(&mut g, Default::default(), &cancel).unwrap();

        let parent = g.get_index(ObjectId(2)).unwrap();
        let child = g.get_index(ObjectId(5)).unwrap();
        assert_ne!(g.dominator(child), Some(parent));

        let strategy = LogicalOwnershipStrategy::new(LogicalOwnershipConfig::default());
        let sizes = strategy.apply(&mut g, &cancel).unwrap();

        assert!(sizes[parent.index()] > g.retained_size(parent));
    }

    #[test]
    fn no_object_array_class_is_a_no_op() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "com.example.Solo", NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_object(ObjectId(1), ClassId(1), 8).unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();

        let cancel = CancellationToken::new();
        dominators::compute(&mut g, Default::default(), &cancel).unwrap();
        let strategy = LogicalOwnershipStrategy::new(LogicalOwnershipConfig::default());
        let sizes = strategy.apply(&mut g, &cancel).unwrap();
        let idx = g.get_index(ObjectId(1)).unwrap();
        assert_eq!(sizes[idx.index()], g.retained_size(idx));
    }
}
