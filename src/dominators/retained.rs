//! Bottom-up retained-size propagation over the dominator tree produced by
//! [`super::lengauer_tarjan`]/[`super::parallel`]. See spec §4.4's "retained
//! size" definition: the retained size of `n` is its own shallow size plus
//! the retained size of every node it immediately dominates.
//!
//! Grounded on the teacher's `src/algo/dominators.rs` dominator-tree-as-
//! children-arrays idiom (the `Dominators` type already exposes an
//! `immediately_dominated_by` walk); here we invert `idom` into children
//! arrays once, then process strictly deepest-first with an explicit stack
//! so no recursion is needed (spec §9).

use crate::cancel::CancellationToken;
use crate::error::{ErrorKind, GraphResult};
use crate::graph::ReferenceGraph;
use crate::ids::{ObjectIndex, SUPER_ROOT};

/// Walks the dominator tree bottom-up, writing `retained_size = shallow_size
/// + sum(retained_size of children)` for every reachable node, and leaving
/// unreachable nodes at `retained_size == shallow_size` (spec §4.4: "objects
/// outside the dominator tree are never summed into anything").
pub fn propagate_retained_sizes(
    graph: &mut ReferenceGraph,
    cancel: &CancellationToken,
) -> GraphResult<()> {
    let total_slots = graph.object_count() + 1; // + super-root

    // Build dominator-tree children arrays: children[i] = objects whose
    // immediate dominator is index i.
    let mut children: Vec<Vec<ObjectIndex>> = vec![Vec::new(); total_slots];
    let mut reachable_nodes: Vec<ObjectIndex> = Vec::new();
    for i in 0..total_slots {
        let idx = ObjectIndex::from_usize(i);
        if !graph.is_reachable(idx) && idx != SUPER_ROOT {
            continue;
        }
        reachable_nodes.push(idx);
        if let Some(dominator) = graph.dominator(idx) {
            if dominator != idx {
                children[dominator.index()].push(idx);
            }
        }
    }

    // Post-order via an explicit stack: push super-root, then repeatedly
    // expand until every node has had its children visited before itself.
    let mut order: Vec<ObjectIndex> = Vec::with_capacity(reachable_nodes.len());
    let mut stack: Vec<(ObjectIndex, usize)> = vec![(SUPER_ROOT, 0)];
    let mut visited_root = false;
    while let Some((node, mut cursor)) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(error_stack::report!(ErrorKind::Cancelled)
                .attach_printable("retained-size post-order traversal cancelled"));
        }
        let kids = &children[node.index()];
        if cursor < kids.len() {
            let child = kids[cursor];
            cursor += 1;
            stack.push((node, cursor));
            stack.push((child, 0));
        } else {
            order.push(node);
            if node == SUPER_ROOT {
                visited_root = true;
            }
        }
    }
    debug_assert!(visited_root || total_slots <= 1);

    for node in order {
        if cancel.is_cancelled() {
            return Err(error_stack::report!(ErrorKind::Cancelled)
                .attach_printable("retained-size summation cancelled"));
        }
        if node == SUPER_ROOT {
            continue;
        }
        let mut total = graph.shallow_size(node);
        for &child in &children[node.index()] {
            total += graph.retained_size(child);
        }
        graph.store_mut().set_retained(node, total);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::NO_SUPERCLASS;
    use crate::dominators::compute_lt;
    use crate::ids::{ClassId, ObjectId};
    use crate::roots::RootKind;

    #[test]
    fn sums_up_a_chain() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "C", NO_SUPERCLASS, vec![], vec![]).unwrap();
        g.add_object(ObjectId(1), ClassId(1), 10).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 20).unwrap();
        g.add_object(ObjectId(3), ClassId(1), 30).unwrap();
        g.add_edge(ObjectId(1), ObjectId(2), "a").unwrap();
        g.add_edge(ObjectId(2), ObjectId(3), "b").unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();

        let cancel = CancellationToken::new();
        let idom = compute_lt(&g, &cancel).unwrap();
        for (index, dominator) in idom {
            g.store_mut().set_dominator(index, dominator);
        }
        propagate_retained_sizes(&mut g, &cancel).unwrap();

        let i1 = g.get_index(ObjectId(1)).unwrap();
        assert_eq!(g.retained_size(i1), 60);
    }

    #[test]
    fn unreachable_object_keeps_shallow_as_retained() {
        let mut g = ReferenceGraph::new();
        g.add_class(ClassId(1), "C", NO_SUPERCLASS, vec![], vec![]).unwrap();
        g.add_object(ObjectId(1), ClassId(1), 10).unwrap();
        g.add_object(ObjectId(2), ClassId(1), 99).unwrap();
        g.add_gc_root(ObjectId(1), RootKind::StickyClass, None, None).unwrap();
        g.finalize().unwrap();

        let cancel = CancellationToken::new();
        let idom = compute_lt(&g, &cancel).unwrap();
        for (index, dominator) in idom {
            g.store_mut().set_dominator(index, dominator);
        }
        propagate_retained_sizes(&mut g, &cancel).unwrap();

        let i2 = g.get_index(ObjectId(2)).unwrap();
        assert_eq!(g.retained_size(i2), 99);
    }
}
