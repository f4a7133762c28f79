use tracing::debug;

use crate::cancel::Cancellation;
use crate::error::ProfilerError;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Fetches records for `ids` in contiguous chunks of at most `max_batch`,
/// one `fetch` call per chunk, concatenating results in chunk order.
///
/// The first failing chunk aborts the whole operation; records from earlier
/// chunks are dropped and the error names the chunk and its index range.
/// Nothing is retried here.
pub fn fetch_in_batches<I, R, F>(
    ids: &[I],
    max_batch: usize,
    cancel: &Cancellation,
    mut fetch: F,
) -> Result<Vec<R>, ProfilerError>
where
    F: FnMut(&[I]) -> Result<Vec<R>, ProfilerError>,
{
    if max_batch == 0 {
        return Err(ProfilerError::InvalidConfig(
            "max batch size must be at least 1".to_string(),
        ));
    }

    let mut records = Vec::with_capacity(ids.len());
    for (chunk_index, chunk) in ids.chunks(max_batch).enumerate() {
        cancel.check()?;
        let start = chunk_index * max_batch;
        let end = start + chunk.len();
        let fetched = fetch(chunk).map_err(|cause| ProfilerError::ArtistBatch {
            chunk: chunk_index,
            start,
            end,
            cause: Box::new(cause),
        })?;
        debug!(chunk = chunk_index, start, end, records = fetched.len(), "fetched chunk");
        records.extend(fetched);
    }
    Ok(records)
}
