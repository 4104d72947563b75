//! Compact Edge List (CEL): CSR adjacency storage built through a builder
//! that accepts `(from, to, field_name, from_class)` triples. See spec
//! §4.2. Two independent instances are built per graph (outgoing and
//! incoming-reversed); `EdgeListBuilder::build` produces both the CSR
//! arrays and an interned field-name table.
//!
//! Grounded on `crates/csr/src/lib.rs`'s offsets/targets construction and
//! the old `src/algo/dominators.rs`'s pattern of converting per-node hash
//! sets into dense `Vec<Vec<_>>` CSR-shaped arrays once the final node
//! count is known.

use hashbrown::HashMap;

use crate::ids::{ClassId, FieldNameId, ObjectIndex};

/// One `(from, to, field_name, from_class)` triple as supplied during the
/// build phase, before CSR construction.
#[derive(Debug, Clone, Copy)]
struct EdgeTriple {
    from: ObjectIndex,
    to: ObjectIndex,
    field_name: FieldNameId,
    from_class: ClassId,
}

/// Deduplicates field-name strings to small dense ids, stable within one
/// builder (spec §4.2: "the same name is always assigned the same id").
#[derive(Debug, Default)]
pub struct FieldNameTable {
    names: Vec<String>,
    ids: HashMap<String, FieldNameId>,
}

impl FieldNameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> FieldNameId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = FieldNameId::from_usize(self.names.len());
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    #[must_use]
    pub fn name(&self, id: FieldNameId) -> &str {
        self.names.get(id.index()).map_or("", String::as_str)
    }
}

/// Accumulates edge triples during the build phase; `build()` sorts by
/// source index and produces the CSR arrays.
#[derive(Debug, Default)]
pub struct EdgeListBuilder {
    triples: Vec<EdgeTriple>,
    field_names: FieldNameTable,
}

impl EdgeListBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, from: ObjectIndex, to: ObjectIndex, field_name: &str, from_class: ClassId) {
        let field_name = self.field_names.intern(field_name);
        self.triples.push(EdgeTriple {
            from,
            to,
            field_name,
            from_class,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Builds the forward (outgoing) CSR over `node_count` slots. Pass
    /// `reversed = true` to build the incoming CEL instead (swaps
    /// `from`/`to` before sorting by the new source).
    #[must_use]
    pub fn build(self, node_count: usize, reversed: bool) -> CompactEdgeList {
        let mut triples = self.triples;
        if reversed {
            for t in &mut triples {
                std::mem::swap(&mut t.from, &mut t.to);
            }
        }
        triples.sort_by_key(|t| t.from.index());

        let mut offsets = vec![0u32; node_count + 1];
        for t in &triples {
            offsets[t.from.index() + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let mut targets = Vec::with_capacity(triples.len());
        let mut field_ids = Vec::with_capacity(triples.len());
        let mut source_classes = Vec::with_capacity(triples.len());
        for t in &triples {
            targets.push(t.to);
            field_ids.push(t.field_name);
            source_classes.push(t.from_class);
        }

        CompactEdgeList {
            offsets,
            targets,
            field_ids,
            source_classes,
            field_names: self.field_names,
        }
    }
}

/// CSR adjacency: `targets[offsets[i]..offsets[i+1]]` are the out-neighbors
/// (or in-neighbors, for the incoming instance) of node `i`.
#[derive(Debug, Default)]
pub struct CompactEdgeList {
    offsets: Vec<u32>,
    targets: Vec<ObjectIndex>,
    field_ids: Vec<FieldNameId>,
    source_classes: Vec<ClassId>,
    field_names: FieldNameTable,
}

impl CompactEdgeList {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            offsets: vec![0],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[must_use]
    pub fn count(&self, index: ObjectIndex) -> usize {
        let i = index.index();
        if i + 1 >= self.offsets.len() {
            return 0;
        }
        (self.offsets[i + 1] - self.offsets[i]) as usize
    }

    #[must_use]
    pub fn targets(&self, index: ObjectIndex) -> &[ObjectIndex] {
        self.range(index).map_or(&[], |r| &self.targets[r])
    }

    #[must_use]
    pub fn field_ids(&self, index: ObjectIndex) -> &[FieldNameId] {
        self.range(index).map_or(&[], |r| &self.field_ids[r])
    }

    #[must_use]
    pub fn source_classes(&self, index: ObjectIndex) -> &[ClassId] {
        self.range(index).map_or(&[], |r| &self.source_classes[r])
    }

    #[must_use]
    pub fn field_name(&self, id: FieldNameId) -> &str {
        self.field_names.name(id)
    }

    fn range(&self, index: ObjectIndex) -> Option<std::ops::Range<usize>> {
        let i = index.index();
        if i + 1 >= self.offsets.len() {
            return None;
        }
        Some(self.offsets[i] as usize..self.offsets[i + 1] as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: usize) -> ObjectIndex {
        ObjectIndex::from_usize(i)
    }

    #[test]
    fn build_produces_sorted_csr() {
        let mut builder = EdgeListBuilder::new();
        builder.push(idx(1), idx(2), "next", ClassId(1));
        builder.push(idx(0), idx(1), "next", ClassId(1));
        builder.push(idx(0), idx(2), "other", ClassId(1));

        let cel = builder.build(3, false);
        assert_eq!(cel.count(idx(0)), 2);
        assert_eq!(cel.count(idx(1)), 1);
        assert_eq!(cel.targets(idx(1)), &[idx(2)]);
        let names: Vec<_> = cel
            .field_ids(idx(0))
            .iter()
            .map(|&id| cel.field_name(id).to_owned())
            .collect();
        assert_eq!(names, ["next", "other"]);
    }

    #[test]
    fn field_name_interning_is_stable() {
        let mut builder = EdgeListBuilder::new();
        builder.push(idx(0), idx(1), "value", ClassId(1));
        builder.push(idx(1), idx(2), "value", ClassId(1));
        let cel = builder.build(3, false);
        assert_eq!(cel.field_ids(idx(0)), cel.field_ids(idx(1)));
    }

    #[test]
    fn reversed_build_swaps_direction() {
        let mut builder = EdgeListBuilder::new();
        builder.push(idx(0), idx(1), "next", ClassId(1));
        let incoming = builder.build(2, true);
        assert_eq!(incoming.targets(idx(1)), &[idx(0)]);
        assert_eq!(incoming.count(idx(0)), 0);
    }
}
