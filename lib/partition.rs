use derive_more::{Display, Error};
use std::ops::Range;

/// The reason why a sequence could not be partitioned.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "the number of workers must be at least 1")]
pub struct InvalidWorkerCount;

/// Splits `len` items into `workers` contiguous ranges.
///
/// Every range holds `len / workers` items, and the first `len % workers` ranges one more.
pub fn ranges(len: usize, workers: usize) -> Result<Vec<Range<usize>>, InvalidWorkerCount> {
    if workers == 0 {
        return Err(InvalidWorkerCount);
    }

    let (size, remainder) = (len / workers, len % workers);
    let mut start = 0;

    Ok((0..workers)
        .map(|i| {
            let end = start + size + usize::from(i < remainder);
            let range = start..end;
            start = end;
            range
        })
        .collect())
}

/// Splits `items` into `workers` contiguous slices, see [`ranges`].
pub fn partition<T>(items: &[T], workers: usize) -> Result<Vec<&[T]>, InvalidWorkerCount> {
    Ok(ranges(items.len(), workers)?
        .into_iter()
        .map(|r| &items[r])
        .collect())
}
