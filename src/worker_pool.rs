//! Bounded worker pool (spec §3/§9 "generic compression and worker-pool
//! utilities"), `parallel` feature. A thin wrapper over `rayon` rather
//! than a hand-rolled thread-pool/channel scheme — the same restraint the
//! teacher's `src/rayon/mod.rs` shows: reach for `rayon::prelude::*`
//! directly instead of layering an abstraction rayon already provides.
//!
//! The dominator engine's own level-by-level parallelism
//! ([`crate::dominators::parallel`]) calls into `rayon` directly rather
//! than through this module — this wrapper exists for callers outside the
//! dominator engine (e.g. per-class batch analyses) that want ordered
//! map-reduce or unordered for-each without pulling in `rayon::prelude`
//! themselves.

use rayon::prelude::*;

/// Applies `f` to every item of `items` and reduces the results with
/// `reduce`, started from `identity`. Ordering of the `map` step does not
/// matter since `reduce` must already be associative/commutative for the
/// result to be deterministic (spec §5: "addition is associative and
/// commutative").
pub fn map_reduce<T, R, M, Rdc, Id>(items: &[T], identity: Id, map: M, reduce: Rdc) -> R
where
    T: Sync,
    R: Send,
    M: Fn(&T) -> R + Sync + Send,
    Rdc: Fn(R, R) -> R + Sync + Send,
    Id: Fn() -> R + Sync + Send,
{
    items.par_iter().map(map).reduce(&identity, &reduce)
}

/// Runs `f` over every item concurrently, discarding results. Use for
/// side-effecting batch work (e.g. writing a result row per class) where
/// the caller doesn't need a reduced value back.
pub fn for_each<T, F>(items: &[T], f: F)
where
    T: Sync,
    F: Fn(&T) + Sync + Send,
{
    items.par_iter().for_each(f);
}

/// Maps every item concurrently and collects the results in the same
/// order as `items` (an indexed parallel iterator, unlike `for_each`'s
/// unordered dispatch).
pub fn parallel_aggregate<T, R, M>(items: &[T], map: M) -> Vec<R>
where
    T: Sync,
    R: Send,
    M: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(map).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_reduce_sums_squares() {
        let items = vec![1, 2, 3, 4];
        let sum = map_reduce(&items, || 0i64, |&x| x * x, |a, b| a + b);
        assert_eq!(sum, 1 + 4 + 9 + 16);
    }

    #[test]
    fn parallel_aggregate_preserves_order() {
        let items = vec![10, 20, 30];
        let doubled = parallel_aggregate(&items, |&x| x * 2);
        assert_eq!(doubled, vec![20, 40, 60]);
    }

    #[test]
    fn for_each_visits_every_item() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let items = vec![1, 2, 3, 4, 5];
        let count = AtomicUsize::new(0);
        for_each(&items, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), items.len());
    }
}
