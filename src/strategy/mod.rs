//! Retained-Size Strategies (RSS): each strategy consumes the dominator-
//! based retained-size vector produced by the dominator engine and returns
//! a replacement vector. See spec §4.5.

mod logical_ownership;
mod strict;

pub use logical_ownership::LogicalOwnershipStrategy;
pub use strict::StrictStrategy;

use crate::cancel::CancellationToken;
use crate::config::{Config, RetainedSizeStrategyKind};
use crate::error::{ErrorKind, GraphResult};
use crate::graph::{GraphState, ReferenceGraph};
use crate::ids::ObjectIndex;

/// A pluggable retained-size calculator. Implementations read the graph's
/// current dominator-based retained sizes and return a full replacement
/// vector (indexed the same as [`ReferenceGraph::object_count`]); they must
/// not write into the graph themselves — [`run`] commits the result once.
pub trait RetainedSizeStrategy {
    fn name(&self) -> &'static str;
    fn apply(&self, graph: &mut ReferenceGraph, cancel: &CancellationToken) -> GraphResult<Vec<i64>>;
}

/// Runs the strategy named by `config.retained_size_strategy`, commits its
/// output into the store's retained-size column, and advances the graph to
/// [`GraphState::StrategyApplied`].
pub fn run(graph: &mut ReferenceGraph, config: &Config, cancel: &CancellationToken) -> GraphResult<()> {
    if graph.state() != GraphState::DominatorsComputed {
        return Err(error_stack::report!(ErrorKind::Finalized)
            .attach_printable("retained-size strategy requires a dominator-computed graph"));
    }

    let sizes = match config.retained_size_strategy {
        RetainedSizeStrategyKind::Strict => StrictStrategy.apply(graph, cancel)?,
        RetainedSizeStrategyKind::LogicalOwnership => {
            LogicalOwnershipStrategy::new(config.logical_ownership.clone()).apply(graph, cancel)?
        }
    };

    if cancel.is_cancelled() {
        return Err(error_stack::report!(ErrorKind::Cancelled)
            .attach_printable("retained-size strategy cancelled before commit"));
    }

    for (i, size) in sizes.into_iter().enumerate() {
        graph.store_mut().set_retained(ObjectIndex::from_usize(i), size);
    }
    graph.set_state(GraphState::StrategyApplied);
    Ok(())
}

pub(crate) fn cancelled<T>(where_: &'static str) -> GraphResult<T> {
    Err(error_stack::report!(ErrorKind::Cancelled).attach_printable(where_))
}
