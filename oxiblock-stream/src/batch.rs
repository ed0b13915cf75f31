//! Batches of independent blocks.

use crate::cancel::CancellationToken;
use oxiblock_core::error::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Run `op` on every item, returning the results in item order.
///
/// With `jobs > 1` the items are processed with rayon. Otherwise they run one
/// after the other and processing stops at the first error, which is then the
/// last result. The cancellation token is checked before each item.
#[cfg(feature = "parallel")]
pub(crate) fn process<I, T, F>(
    items: &[I],
    jobs: usize,
    cancel: Option<&CancellationToken>,
    op: F,
) -> Vec<Result<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Sync + Send,
{
    if jobs > 1 {
        return items
            .par_iter()
            .map(|item| run(item, cancel, &op))
            .collect();
    }
    process_sequential(items, cancel, op)
}

/// Run `op` on every item in order, stopping at the first error.
///
/// Without the `parallel` feature `jobs` only sizes the batches.
#[cfg(not(feature = "parallel"))]
pub(crate) fn process<I, T, F>(
    items: &[I],
    _jobs: usize,
    cancel: Option<&CancellationToken>,
    op: F,
) -> Vec<Result<T>>
where
    F: Fn(&I) -> Result<T>,
{
    process_sequential(items, cancel, op)
}

fn process_sequential<I, T, F>(
    items: &[I],
    cancel: Option<&CancellationToken>,
    op: F,
) -> Vec<Result<T>>
where
    F: Fn(&I) -> Result<T>,
{
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let result = run(item, cancel, &op);
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}

#[inline]
fn run<I, T, F>(item: &I, cancel: Option<&CancellationToken>, op: &F) -> Result<T>
where
    F: Fn(&I) -> Result<T>,
{
    if let Some(token) = cancel {
        token.check()?;
    }
    op(item)
}
