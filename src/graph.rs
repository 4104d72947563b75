//! Reference Graph (RG): the façade that owns the [`IndexedObjectStore`],
//! both [`CompactEdgeList`] instances, the [`ClassTable`], the
//! [`RootTable`], and the reachability/class-object/gc-root bitsets. See
//! spec §4.3.
//!
//! The reachable/class-object/gc-root bitsets reuse `FixedBitSet`, the same
//! structure the teacher's `visit` module uses as its `VisitMap`
//! implementation.

use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::classes::ClassTable;
use crate::edges::{CompactEdgeList, EdgeListBuilder};
use crate::error::{ErrorKind, GraphResult};
use crate::ids::{ClassId, FieldNameId, ObjectId, ObjectIndex, SUPER_ROOT};
use crate::roots::{GcRoot, RootKind, RootTable};
use crate::store::IndexedObjectStore;

/// Where the graph sits in the build→finalize→dominators→strategy
/// pipeline (spec §4.4 "State machine of the graph w.r.t. DE").
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GraphState {
    Unfinalized,
    Finalized,
    DominatorsComputed,
    StrategyApplied,
}

/// A single hop of a path returned by [`ReferenceGraph::path_to_gc_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEdge {
    pub from: ObjectIndex,
    pub field_name: FieldNameId,
}

/// The result of a bounded path-to-GC-root search: up to `k` simple paths
/// of up to `d` edges, plus whether the search bound truncated anything
/// (REDESIGN FLAGS: the cap no longer silently swallows deeper chains).
#[derive(Debug, Clone, Default)]
pub struct PathResult {
    pub paths: Vec<Vec<PathEdge>>,
    pub truncated: bool,
}

/// The façade owning every build-time structure and exposing the
/// read-only query surface once finalized.
pub struct ReferenceGraph {
    store: IndexedObjectStore,
    classes: ClassTable,
    roots: RootTable,
    outgoing_builder: Option<EdgeListBuilder>,
    outgoing: CompactEdgeList,
    incoming: CompactEdgeList,
    is_class_object: FixedBitSet,
    is_gc_root: FixedBitSet,
    reachable: FixedBitSet,
    state: GraphState,
    malformed_edge_count: u64,
    class_object_ids: Vec<ObjectId>,
}

impl ReferenceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: IndexedObjectStore::new(),
            classes: ClassTable::new(),
            roots: RootTable::new(),
            outgoing_builder: Some(EdgeListBuilder::new()),
            outgoing: CompactEdgeList::empty(),
            incoming: CompactEdgeList::empty(),
            is_class_object: FixedBitSet::with_capacity(1),
            is_gc_root: FixedBitSet::with_capacity(1),
            reachable: FixedBitSet::with_capacity(1),
            state: GraphState::Unfinalized,
            malformed_edge_count: 0,
            class_object_ids: Vec::new(),
        }
    }

    // ---- build phase -------------------------------------------------

    fn ensure_building(&self) -> GraphResult<()> {
        if self.state != GraphState::Unfinalized {
            return Err(error_stack::report!(ErrorKind::Finalized)
                .attach_printable("build-phase call made after finalize()"));
        }
        Ok(())
    }

    pub fn add_object(
        &mut self,
        object_id: ObjectId,
        class_id: ClassId,
        shallow_size: i64,
    ) -> GraphResult<ObjectIndex> {
        self.ensure_building()?;
        self.store.add(object_id, class_id, shallow_size)
    }

    pub fn add_class(
        &mut self,
        class_id: ClassId,
        name: impl Into<String>,
        super_id: ClassId,
        instance_fields: Vec<crate::classes::FieldDescriptor>,
        static_fields: Vec<crate::classes::FieldDescriptor>,
    ) -> GraphResult<()> {
        self.ensure_building()?;
        self.classes
            .add_class(class_id, name, super_id, instance_fields, static_fields);
        Ok(())
    }

    pub fn mark_class_object(&mut self, object_id: ObjectId) -> GraphResult<()> {
        self.ensure_building()?;
        self.class_object_ids.push(object_id);
        Ok(())
    }

    pub fn add_gc_root(
        &mut self,
        object_id: ObjectId,
        kind: RootKind,
        thread_id: Option<u64>,
        frame_index: Option<i32>,
    ) -> GraphResult<()> {
        self.ensure_building()?;
        self.roots.add_root(object_id, kind, thread_id, frame_index);
        Ok(())
    }

    /// Appends an edge. Per spec §7 *Malformed*: if either endpoint is not
    /// a registered object, the edge is silently dropped and counted
    /// rather than rejected — the build must not be blocked by one bad
    /// edge from the decoder.
    pub fn add_edge(&mut self, from: ObjectId, to: ObjectId, field_name: &str) -> GraphResult<()> {
        self.ensure_building()?;
        let (Some(from_idx), Some(to_idx)) =
            (self.store.get_index(from), self.store.get_index(to))
        else {
            self.malformed_edge_count += 1;
            return Ok(());
        };
        let from_class = self.store.get_class_id(from_idx);
        self.outgoing_builder
            .as_mut()
            .expect("builder present while unfinalized")
            .push(from_idx, to_idx, field_name, from_class);
        Ok(())
    }

    #[must_use]
    pub fn malformed_edge_count(&self) -> u64 {
        self.malformed_edge_count
    }

    /// Freezes the object store; initializes the bitsets; builds both CEL
    /// instances; computes reachability by BFS from the super-root over
    /// the augmented out-edges (super-root → every GC root and every class
    /// object → normal edges).
    pub fn finalize(&mut self) -> GraphResult<()> {
        self.ensure_building()?;
        self.store.finalize();
        let node_count = self.store.count();

        self.is_class_object = FixedBitSet::with_capacity(node_count);
        self.is_gc_root = FixedBitSet::with_capacity(node_count);
        self.reachable = FixedBitSet::with_capacity(node_count);

        for object_id in self.class_object_ids.clone() {
            if let Some(idx) = self.store.get_index(object_id) {
                self.is_class_object.insert(idx.index());
            }
        }
        for root in self.roots.iter() {
            if let Some(idx) = self.store.get_index(root.object_id) {
                self.is_gc_root.insert(idx.index());
            }
        }

        let builder = self
            .outgoing_builder
            .take()
            .expect("builder present exactly once before finalize");
        self.outgoing = builder.build(node_count, false);

        let mut reversed_builder = EdgeListBuilder::new();
        for i in 1..node_count {
            let idx = ObjectIndex::from_usize(i);
            let from_class = self.store.get_class_id(idx);
            for (&target, &field) in self
                .outgoing
                .targets(idx)
                .iter()
                .zip(self.outgoing.field_ids(idx))
            {
                reversed_builder.push(idx, target, self.outgoing.field_name(field), from_class);
            }
        }
        self.incoming = reversed_builder.build(node_count, true);

        self.compute_reachability(node_count);

        self.state = GraphState::Finalized;
        debug!(
            objects = node_count.saturating_sub(1),
            edges = self.outgoing.targets(SUPER_ROOT).len() + self.edge_total(),
            malformed = self.malformed_edge_count,
            "reference graph finalized"
        );
        Ok(())
    }

    fn edge_total(&self) -> usize {
        (1..self.store.count())
            .map(|i| self.outgoing.count(ObjectIndex::from_usize(i)))
            .sum()
    }

    fn compute_reachability(&mut self, node_count: usize) {
        let super_root_targets: Vec<ObjectIndex> = (1..node_count)
            .filter(|&i| {
                self.is_gc_root.contains(i) || self.is_class_object.contains(i)
            })
            .map(ObjectIndex::from_usize)
            .collect();

        let mut stack = Vec::new();
        self.reachable.insert(SUPER_ROOT.index());
        for target in super_root_targets {
            if !self.reachable.put(target.index()) {
                stack.push(target);
            }
        }
        while let Some(node) = stack.pop() {
            for &neighbor in self.outgoing.targets(node) {
                if !self.reachable.contains(neighbor.index()) {
                    self.reachable.insert(neighbor.index());
                    stack.push(neighbor);
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> GraphState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: GraphState) {
        self.state = state;
    }

    // ---- query phase ---------------------------------------------------

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.store.count().saturating_sub(1)
    }

    #[must_use]
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    #[must_use]
    pub fn roots(&self) -> &RootTable {
        &self.roots
    }

    #[must_use]
    pub fn outgoing(&self) -> &CompactEdgeList {
        &self.outgoing
    }

    #[must_use]
    pub fn incoming(&self) -> &CompactEdgeList {
        &self.incoming
    }

    #[must_use]
    pub(crate) fn store(&self) -> &IndexedObjectStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut IndexedObjectStore {
        &mut self.store
    }

    #[must_use]
    pub fn get_index(&self, object_id: ObjectId) -> Option<ObjectIndex> {
        self.store.get_index(object_id)
    }

    #[must_use]
    pub fn object_id(&self, index: ObjectIndex) -> ObjectId {
        self.store.get_object_id(index)
    }

    #[must_use]
    pub fn class_id(&self, index: ObjectIndex) -> ClassId {
        self.store.get_class_id(index)
    }

    #[must_use]
    pub fn class_name(&self, index: ObjectIndex) -> Option<&str> {
        self.classes.name(self.store.get_class_id(index))
    }

    #[must_use]
    pub fn is_reachable(&self, index: ObjectIndex) -> bool {
        self.reachable.contains(index.index())
    }

    #[must_use]
    pub fn is_class_object(&self, index: ObjectIndex) -> bool {
        self.is_class_object.contains(index.index())
    }

    #[must_use]
    pub fn is_gc_root(&self, index: ObjectIndex) -> bool {
        self.is_gc_root.contains(index.index())
    }

    #[must_use]
    pub fn shallow_size(&self, index: ObjectIndex) -> i64 {
        self.store.get_shallow(index)
    }

    #[must_use]
    pub fn retained_size(&self, index: ObjectIndex) -> i64 {
        self.store.get_retained(index)
    }

    #[must_use]
    pub fn dominator(&self, index: ObjectIndex) -> Option<ObjectIndex> {
        self.store.get_dominator(index)
    }

    /// Total reachable heap size: sum of shallow sizes over every reachable,
    /// non-super-root object.
    #[must_use]
    pub fn total_reachable_heap_size(&self) -> i64 {
        (1..self.store.count())
            .filter(|&i| self.reachable.contains(i))
            .map(|i| self.store.get_shallow(ObjectIndex::from_usize(i)))
            .sum()
    }

    #[must_use]
    pub fn total_reachable_object_count(&self) -> usize {
        (1..self.store.count())
            .filter(|&i| self.reachable.contains(i))
            .count()
    }

    pub fn iterate(&self, callback: impl FnMut(ObjectIndex)) {
        self.store.iterate(callback);
    }

    pub fn by_class(&mut self, class_id: ClassId) -> &[ObjectIndex] {
        self.store.by_class(class_id)
    }

    /// Bounded BFS over reversed edges from `start`, terminating paths at
    /// any GC root or class-metadata object; returns up to `k` distinct
    /// simple paths each of length ≤ `d`.
    #[must_use]
    pub fn path_to_gc_root(&self, start: ObjectIndex, k: usize, d: usize) -> PathResult {
        let mut result = PathResult::default();
        if k == 0 || d == 0 {
            return result;
        }

        // Each queue entry: (current node, path so far as PathEdges from
        // the walked node back toward `start`, visited set for simplicity).
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((start, Vec::<PathEdge>::new(), {
            let mut seen = hashbrown::HashSet::new();
            seen.insert(start);
            seen
        }));

        while let Some((node, path, visited)) = queue.pop_front() {
            if result.paths.len() >= k {
                result.truncated = true;
                break;
            }
            if !path.is_empty() && (self.is_gc_root(node) || self.is_class_object(node)) {
                result.paths.push(path);
                continue;
            }
            if path.len() >= d {
                result.truncated = true;
                continue;
            }
            for (&predecessor, &field) in self
                .incoming
                .targets(node)
                .iter()
                .zip(self.incoming.field_ids(node))
            {
                if visited.contains(&predecessor) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(PathEdge {
                    from: predecessor,
                    field_name: field,
                });
                let mut next_visited = visited.clone();
                next_visited.insert(predecessor);
                queue.push_back((predecessor, next_path, next_visited));
            }
        }

        result
    }
}

impl Default for ReferenceGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::FieldDescriptor;

    fn build_two_node_chain() -> ReferenceGraph {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "C", crate::classes::NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_object(ObjectId(1), ClassId(1), 16).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 16).unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None)
            .unwrap();
        g.add_edge(ObjectId(1), ObjectId(2), "next").unwrap();
        g.finalize().unwrap();
        g
    }

    #[test]
    fn reachability_follows_gc_roots() {
        let g = build_two_node_chain();
        let i1 = g.get_index(ObjectId(1)).unwrap();
        let i2 = g.get_index(ObjectId(2)).unwrap();
        assert!(g.is_reachable(i1));
        assert!(g.is_reachable(i2));
        assert_eq!(g.total_reachable_object_count(), 2);
        assert_eq!(g.total_reachable_heap_size(), 32);
    }

    #[test]
    fn unreachable_island_is_excluded() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "C", crate::classes::NO_SUPERCLASS, vec![], vec![])
            .unwrap();
        g.add_object(ObjectId(1), ClassId(1), 8).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 8).unwrap();
        g.add_edge(ObjectId(1), ObjectId(2), "next").unwrap();
        g.add_object(ObjectId(3), ClassId(1), 8).unwrap();
        g.add_object(ObjectId(4), ClassId(1), 8).unwrap();
        g.add_edge(ObjectId(3), ObjectId(4), "next").unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None)
            .unwrap();
        g.finalize().unwrap();

        let i3 = g.get_index(ObjectId(3)).unwrap();
        assert!(!g.is_reachable(i3));
        assert_eq!(g.total_reachable_object_count(), 2);
    }

    #[test]
    fn malformed_edge_is_dropped_and_counted() {
        let mut g = ReferenceGraph::new();
        g.add_object(ObjectId(1), ClassId(1), 8).unwrap();
        // ObjectId(999) was never added.
        g.add_edge(ObjectId(1), ObjectId(999), "bad").unwrap();
        g.finalize().unwrap();
        assert_eq!(g.malformed_edge_count(), 1);
    }

    #[test]
    fn build_calls_fail_after_finalize() {
        let mut g = build_two_node_chain();
        assert!(g
            .add_object(ObjectId(99), ClassId(1), 1)
            .is_err());
        assert!(g.add_edge(ObjectId(1), ObjectId(2), "x").is_err());
    }

    #[test]
    fn instance_fields_accessible_through_class_table() {
        let mut g = ReferenceGraph::new();
        g.add_class(
            ClassId(1),
            "C",
            crate::classes::NO_SUPERCLASS,
            vec![FieldDescriptor::instance(
                "next",
                crate::classes::BasicType::Object,
            )],
            vec![],
        )
        .unwrap();
        assert_eq!(g.classes().get(ClassId(1)).unwrap().instance_fields.len(), 1);
    }

    #[test]
    fn path_to_gc_root_finds_the_root() {
        let g = build_two_node_chain();
        let i2 = g.get_index(ObjectId(2)).unwrap();
        let result = g.path_to_gc_root(i2, 5, 15);
        assert_eq!(result.paths.len(), 1);
        assert!(!result.truncated);
        let path = &result.paths[0];
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].from, g.get_index(ObjectId(1)).unwrap());
    }
}
