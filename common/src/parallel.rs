//! Parallel processing utilities.

/// Multiplier for number of chunks relative to worker threads.
/// Rows near blobs cost more than empty rows, so oversplit to keep workers busy.
const CHUNKS_PER_THREAD: usize = 4;

/// Rows per chunk so that `height` splits into roughly `threads * CHUNKS_PER_THREAD`
/// chunks on the current rayon pool. Never less than one row.
#[inline]
pub fn rows_per_chunk(height: usize) -> usize {
    rows_per_chunk_for(height, rayon::current_num_threads())
}

#[inline]
pub fn rows_per_chunk_for(height: usize, threads: usize) -> usize {
    let num_chunks = threads.max(1) * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}
