//! Dominator Engine (DE): computes the immediate-dominator array over the
//! graph augmented with a synthetic super-root, then propagates retained
//! sizes bottom-up over the resulting dominator tree. See spec §4.4.
//!
//! Two algorithms are offered — [`lengauer_tarjan`] and, behind the
//! `parallel` feature, [`parallel::compute_plb`] — selected adaptively by
//! [`choose_algorithm`]. Both must produce identical `idom` arrays (spec
//! §8 "Algorithmic equivalence").

mod lengauer_tarjan;
#[cfg(feature = "parallel")]
mod parallel;
mod retained;

pub use lengauer_tarjan::compute_lt;
#[cfg(feature = "parallel")]
pub use parallel::compute_plb;
pub use retained::propagate_retained_sizes;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::config::DominatorAlgorithmThresholds;
use crate::error::{ErrorKind, GraphResult};
use crate::graph::{GraphState, ReferenceGraph};
use crate::ids::{ObjectIndex, SUPER_ROOT};

/// Yields the augmented out-neighbors of `node`: for the super-root, every
/// GC root and class-metadata object (spec §4.4's synthetic super-root);
/// for any other node, its normal outgoing edges. Shared by both dominator
/// algorithms.
pub(super) fn augmented_neighbors(graph: &ReferenceGraph, node: ObjectIndex) -> Vec<ObjectIndex> {
    if node == SUPER_ROOT {
        let mut roots = Vec::new();
        graph.iterate(|idx| {
            if idx != SUPER_ROOT && (graph.is_gc_root(idx) || graph.is_class_object(idx)) {
                roots.push(idx);
            }
        });
        roots
    } else {
        graph.outgoing().targets(node).to_vec()
    }
}

/// Which dominator algorithm a given graph selects under the spec §4.4
/// thresholds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    LengauerTarjan,
    ParallelLevelBased,
}

#[must_use]
pub fn choose_algorithm(
    graph: &ReferenceGraph,
    thresholds: DominatorAlgorithmThresholds,
) -> Algorithm {
    let node_count = graph.object_count();
    if node_count == 0 {
        return Algorithm::LengauerTarjan;
    }
    let edge_count: usize = (1..=node_count)
        .map(|i| graph.outgoing().count(ObjectIndex::from_usize(i)))
        .sum();
    let average_out_degree = edge_count as f64 / node_count as f64;

    if node_count > thresholds.node_count_threshold
        || average_out_degree > thresholds.average_out_degree_threshold
    {
        #[cfg(feature = "parallel")]
        return Algorithm::ParallelLevelBased;
        #[cfg(not(feature = "parallel"))]
        return Algorithm::LengauerTarjan;
    }
    Algorithm::LengauerTarjan
}

/// Runs the dominator engine end-to-end: picks an algorithm, computes
/// `idom` for every reachable index, writes it into the graph's object
/// store, then propagates retained sizes bottom-up. Leaves the graph in
/// [`GraphState::DominatorsComputed`] on success.
///
/// On cancellation, the dominator column is left in a partial-but-consistent
/// state and the graph state is *not* advanced — callers must not consume
/// the output.
pub fn compute(
    graph: &mut ReferenceGraph,
    thresholds: DominatorAlgorithmThresholds,
    cancel: &CancellationToken,
) -> GraphResult<()> {
    if graph.state() != GraphState::Finalized {
        return Err(error_stack::report!(ErrorKind::Finalized).attach_printable(
            "dominator engine requires a finalized, not-yet-analyzed graph",
        ));
    }

    let algorithm = choose_algorithm(graph, thresholds);
    debug!(?algorithm, objects = graph.object_count(), "dominator engine starting");

    let idom = match algorithm {
        Algorithm::LengauerTarjan => compute_lt(graph, cancel)?,
        #[cfg(feature = "parallel")]
        Algorithm::ParallelLevelBased => compute_plb(graph, thresholds, cancel)?,
        #[cfg(not(feature = "parallel"))]
        Algorithm::ParallelLevelBased => unreachable!("parallel feature disabled"),
    };

    if cancel.is_cancelled() {
        return Err(error_stack::report!(ErrorKind::Cancelled)
            .attach_printable("dominator computation cancelled before commit"));
    }

    for (index, dominator) in idom {
        graph.store_mut().set_dominator(index, dominator);
    }

    propagate_retained_sizes(graph, cancel)?;

    if cancel.is_cancelled() {
        return Err(error_stack::report!(ErrorKind::Cancelled)
            .attach_printable("retained-size propagation cancelled before commit"));
    }

    graph.set_state(GraphState::DominatorsComputed);
    Ok(())
}
