//! Dense internal indices and opaque external identifiers.
//!
//! Mirrors the teacher's `NodeIndex<Ix>` newtype convention
//! (`crates/csr/src/lib.rs`, old `src/graph.rs`): a `Copy + Eq + Ord + Hash`
//! tuple struct around a small integer, with `from_usize`/`index` for the
//! hot-path conversions and nothing else.

use std::fmt;

/// A dense, `u32`-wide internal index into the object store.
///
/// Index `0` is reserved for the synthetic super-root (see [`SUPER_ROOT`]);
/// real objects are assigned indices starting at `1` on first insertion.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIndex(u32);

/// The synthetic super-root: predecessor of every GC root and every
/// class-metadata object. Always index 0.
pub const SUPER_ROOT: ObjectIndex = ObjectIndex(0);

impl ObjectIndex {
    #[inline]
    #[must_use]
    pub fn from_usize(value: usize) -> Self {
        debug_assert!(value <= u32::MAX as usize, "object index overflow");
        Self(value as u32)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_super_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectIndex({})", self.0)
    }
}

/// Opaque 64-bit object id assigned by the source dump.
#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(pub u64);

/// Opaque 64-bit id naming a class. Also used as an object id for
/// class-metadata instances, since every `Class` is itself heap-resident.
#[cfg_attr(feature = "persist", derive(serde::Deserialize, serde::Serialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClassId(pub u64);

/// A dense id assigned to an interned field-name string within one CEL.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FieldNameId(u32);

impl FieldNameId {
    #[inline]
    #[must_use]
    pub fn from_usize(value: usize) -> Self {
        debug_assert!(value <= u32::MAX as usize, "field name id overflow");
        Self(value as u32)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
