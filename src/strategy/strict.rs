//! Strict strategy: the identity function over the dominator engine's
//! output. Matches the formal dominator definition (spec §4.5 "Strict").

use super::RetainedSizeStrategy;
use crate::cancel::CancellationToken;
use crate::error::GraphResult;
use crate::graph::ReferenceGraph;
use crate::ids::ObjectIndex;

#[derive(Debug, Default)]
pub struct StrictStrategy;

impl RetainedSizeStrategy for StrictStrategy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn apply(&self, graph: &mut ReferenceGraph, _cancel: &CancellationToken) -> GraphResult<Vec<i64>> {
        // Indices run `0..=object_count()` (0 is the super-root).
        Ok((0..=graph.object_count())
            .map(|i| graph.retained_size(ObjectIndex::from_usize(i)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::NO_SUPERCLASS;
    use crate::dominators;
    use crate::ids::ClassId;
    use crate::ids::ObjectId;
    use crate::roots::RootKind;

    #[test]
    fn passes_through_dominator_retained_sizes() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "C", NO_SUPERCLASS, vec![], vec![]).unwrap();
        g.add_object(ObjectId(1), ClassId(1), 10).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 20).unwrap();
        g.add_edge(ObjectId(1), ObjectId(2), "a").unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();
        let cancel = CancellationToken::new();
        dominators::compute(&mut g, Default::default(), &cancel).unwrap();

        let sizes = StrictStrategy.apply(&mut g, &cancel).unwrap();
        let i1 = g.get_index(ObjectId(1)).unwrap();
        assert_eq!(sizes[i1.index()], 30);
    }
}
