//! GC root table: the kinds a managed runtime reports and the append-only
//! table the build phase fills in. The root-kind vocabulary is grounded in
//! `other_examples/.../hprof-slurp/result_recorder.rs`'s `GcRecord::Root*`
//! variants, which enumerate the same JVM hprof root kinds.

use crate::ids::ObjectId;

#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RootKind {
    StickyClass,
    JavaFrame,
    ThreadBlock,
    JniGlobal,
    JniLocal,
    MonitorUsed,
    NativeStack,
    SystemClass,
    Unknown,
}

/// One GC-root record as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcRoot {
    pub object_id: ObjectId,
    pub kind: RootKind,
    pub thread_id: Option<u64>,
    pub frame_index: Option<i32>,
}

/// Append-only GC-root table. Referenced by the Dominator Engine as the
/// super-root's out-edges.
#[derive(Debug, Default)]
pub struct RootTable {
    roots: Vec<GcRoot>,
}

impl RootTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(
        &mut self,
        object_id: ObjectId,
        kind: RootKind,
        thread_id: Option<u64>,
        frame_index: Option<i32>,
    ) {
        self.roots.push(GcRoot {
            object_id,
            kind,
            thread_id,
            frame_index,
        });
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &GcRoot> {
        self.roots.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_roots_in_insertion_order() {
        let mut table = RootTable::new();
        table.add_root(ObjectId(1), RootKind::StickyClass, None, None);
        table.add_root(ObjectId(2), RootKind::JavaFrame, Some(7), Some(3));
        let ids: Vec<_> = table.iter().map(|r| r.object_id).collect();
        assert_eq!(ids, [ObjectId(1), ObjectId(2)]);
    }
}
