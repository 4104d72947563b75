//! Indexed Object Store (IOS): columnar per-object attributes keyed by a
//! dense index, plus the id→index map. See spec §4.1.
//!
//! The id→index map is an [`indexmap::IndexMap`] (insertion order matches
//! assignment order, so iteration by index and iteration by the map agree)
//! — the same "dense index, O(1) by-id lookup" split the teacher's
//! `petgraph::graph::Graph` makes between its `Vec<Node<N>>` storage and
//! callers who only ever hold a `NodeIndex`.

use indexmap::IndexMap;

use crate::error::{ErrorKind, GraphResult};
use crate::ids::{ClassId, ObjectId, ObjectIndex, SUPER_ROOT};

/// Per-object attributes, one column per field, indexed by [`ObjectIndex`].
#[derive(Debug, Default)]
pub struct IndexedObjectStore {
    object_ids: Vec<ObjectId>,
    class_ids: Vec<ClassId>,
    shallow_sizes: Vec<i64>,
    retained_sizes: Vec<i64>,
    dominators: Vec<Option<ObjectIndex>>,
    id_to_index: IndexMap<ObjectId, ObjectIndex>,
    finalized: bool,
    by_class_cache: hashbrown::HashMap<ClassId, Vec<ObjectIndex>>,
}

impl IndexedObjectStore {
    /// A store pre-seeded with the super-root at index 0, matching spec §3
    /// ("Index 0 is reserved for the super-root").
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            object_ids: Vec::new(),
            class_ids: Vec::new(),
            shallow_sizes: Vec::new(),
            retained_sizes: Vec::new(),
            dominators: Vec::new(),
            id_to_index: IndexMap::new(),
            finalized: false,
            by_class_cache: hashbrown::HashMap::new(),
        };
        store.object_ids.push(ObjectId(0));
        store.class_ids.push(ClassId(0));
        store.shallow_sizes.push(0);
        store.retained_sizes.push(0);
        store.dominators.push(None);
        store
    }

    /// Idempotent: returns the existing index if `object_id` was already
    /// added. Fails with [`ErrorKind::Finalized`] after `finalize()`.
    pub fn add(
        &mut self,
        object_id: ObjectId,
        class_id: ClassId,
        shallow_size: i64,
    ) -> GraphResult<ObjectIndex> {
        if self.finalized {
            return Err(error_stack::report!(ErrorKind::Finalized)
                .attach_printable("IndexedObjectStore::add called after finalize"));
        }
        if let Some(&existing) = self.id_to_index.get(&object_id) {
            return Ok(existing);
        }
        let index = ObjectIndex::from_usize(self.object_ids.len());
        self.object_ids.push(object_id);
        self.class_ids.push(class_id);
        self.shallow_sizes.push(shallow_size);
        self.retained_sizes.push(shallow_size);
        self.dominators.push(None);
        self.id_to_index.insert(object_id, index);
        Ok(index)
    }

    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Total number of slots, including the super-root.
    #[must_use]
    pub fn count(&self) -> usize {
        self.object_ids.len()
    }

    #[must_use]
    pub fn get_index(&self, object_id: ObjectId) -> Option<ObjectIndex> {
        self.id_to_index.get(&object_id).copied()
    }

    #[must_use]
    pub fn get_object_id(&self, index: ObjectIndex) -> ObjectId {
        self.object_ids
            .get(index.index())
            .copied()
            .unwrap_or(ObjectId(0))
    }

    #[must_use]
    pub fn get_class_id(&self, index: ObjectIndex) -> ClassId {
        self.class_ids.get(index.index()).copied().unwrap_or(ClassId(0))
    }

    #[must_use]
    pub fn get_shallow(&self, index: ObjectIndex) -> i64 {
        self.shallow_sizes.get(index.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn get_retained(&self, index: ObjectIndex) -> i64 {
        self.retained_sizes.get(index.index()).copied().unwrap_or(0)
    }

    pub fn set_retained(&mut self, index: ObjectIndex, value: i64) {
        if let Some(slot) = self.retained_sizes.get_mut(index.index()) {
            *slot = value;
        }
    }

    #[must_use]
    pub fn get_dominator(&self, index: ObjectIndex) -> Option<ObjectIndex> {
        self.dominators.get(index.index()).copied().flatten()
    }

    pub fn set_dominator(&mut self, index: ObjectIndex, dominator: ObjectIndex) {
        if let Some(slot) = self.dominators.get_mut(index.index()) {
            *slot = Some(dominator);
        }
        // A freshly-set dominator invalidates nothing in the by-class
        // cache (class id never changes), so no cache reset is needed.
        let _ = self; // keep signature symmetric with set_retained
    }

    /// Deterministic iteration over every index, `0..count()`, including
    /// the super-root.
    pub fn iterate(&self, mut callback: impl FnMut(ObjectIndex)) {
        for i in 0..self.count() {
            callback(ObjectIndex::from_usize(i));
        }
    }

    /// Lazily built on first call per class id, then cached.
    pub fn by_class(&mut self, class_id: ClassId) -> &[ObjectIndex] {
        self.by_class_cache
            .entry(class_id)
            .or_insert_with(|| {
                self.class_ids
                    .iter()
                    .enumerate()
                    .filter(|&(i, &cid)| cid == class_id && i != SUPER_ROOT.index())
                    .map(|(i, _)| ObjectIndex::from_usize(i))
                    .collect()
            })
            .as_slice()
    }
}
