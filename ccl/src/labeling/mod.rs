//! Preparation and propagation passes.
//!
//! Generation 0 labels every foreground pixel with its own index. Each later
//! pass reads only the previous generation and, for every foreground pixel:
//!
//! 1. takes the minimum label in its clipped 3x3 neighborhood,
//! 2. follows that label through the previous generation for at most
//!    `hop_budget` hops (bounded pointer jumping),
//! 3. lowers both its own cell and the cell of its current representative to
//!    the result.
//!
//! Step 3 is the only write, and it is a minimum. Minimum is commutative,
//! associative and idempotent, so the pass result does not depend on the
//! order in which pixels are visited or on how they are split across threads.
//! The parallel variant therefore needs nothing stronger than an atomic
//! `fetch_min` per cell.


#[cfg(test)]
pub(crate) mod test_utils;

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::config::Execution;
use crate::error::{Error, Result};
use crate::grid::{GridDims, Mask};
use crate::labels::{Label, LabelGrid, NONE};

/// Builds generation 0: own index for foreground pixels, [`NONE`] for background.
pub fn initialize(mask: &Mask) -> LabelGrid {
    let labels = (0..mask.len())
        .map(|idx| {
            if mask.is_foreground(idx) {
                idx as Label
            } else {
                NONE
            }
        })
        .collect();
    LabelGrid::from_parts(mask.dims(), labels)
}

/// One propagation pass on the calling thread.
pub fn propagate(prev: &LabelGrid, hop_budget: usize) -> LabelGrid {
    let dims = prev.dims();
    let mut next = prev.labels().to_vec();

    propagate_rows(
        prev.labels(),
        dims,
        0..dims.height(),
        hop_budget,
        &mut PlainCells(&mut next),
    );

    LabelGrid::from_parts(dims, next)
}

/// One propagation pass split by rows across the current rayon pool.
///
/// Produces exactly the same generation as [`propagate`].
pub fn propagate_parallel(prev: &LabelGrid, hop_budget: usize) -> LabelGrid {
    let dims = prev.dims();
    let height = dims.height();
    let rows_per_chunk = common::parallel::rows_per_chunk(height);
    let num_chunks = height.div_ceil(rows_per_chunk);

    // Copy-forward for the whole grid happens before any merge.
    let next: Vec<AtomicU32> = prev.labels().iter().map(|&l| AtomicU32::new(l)).collect();

    (0..num_chunks).into_par_iter().for_each(|chunk_idx| {
        let y_start = chunk_idx * rows_per_chunk;
        let y_end = (y_start + rows_per_chunk).min(height);
        propagate_rows(
            prev.labels(),
            dims,
            y_start..y_end,
            hop_budget,
            &mut AtomicCells(&next),
        );
    });

    // The parallel loop has joined; every fetch_min is visible from here on.
    let next = next.into_iter().map(AtomicU32::into_inner).collect();
    LabelGrid::from_parts(dims, next)
}

/// One propagation pass using the requested execution strategy.
pub fn propagate_with(prev: &LabelGrid, hop_budget: usize, execution: Execution) -> LabelGrid {
    match execution {
        Execution::Sequential => propagate(prev, hop_budget),
        Execution::Parallel => propagate_parallel(prev, hop_budget),
    }
}

/// Number of cells whose label differs between two generations of the same grid.
pub fn changed_cells(prev: &LabelGrid, next: &LabelGrid) -> Result<usize> {
    if prev.dims() != next.dims() {
        return Err(Error::DimensionMismatch {
            width: prev.width(),
            height: prev.height(),
            expected: prev.len(),
            actual: next.len(),
        });
    }
    Ok(count_changed(prev.labels(), next.labels()))
}

pub(crate) fn count_changed(prev: &[Label], next: &[Label]) -> usize {
    debug_assert_eq!(prev.len(), next.len());
    prev.par_iter()
        .zip(next.par_iter())
        .filter(|(a, b)| a != b)
        .count()
}

// ============================================================================
// Per-pixel kernel
// ============================================================================

/// Destination of the monotone merges of one pass.
trait MinMerge {
    fn merge_min(&mut self, idx: usize, value: Label);
}

/// Exclusive access: a plain compare-and-assign is enough.
struct PlainCells<'a>(&'a mut [Label]);

impl MinMerge for PlainCells<'_> {
    #[inline]
    fn merge_min(&mut self, idx: usize, value: Label) {
        let cell = &mut self.0[idx];
        if value < *cell {
            *cell = value;
        }
    }
}

/// Shared access from several workers.
struct AtomicCells<'a>(&'a [AtomicU32]);

impl MinMerge for AtomicCells<'_> {
    #[inline]
    fn merge_min(&mut self, idx: usize, value: Label) {
        // Relaxed: only the final minimum matters, and the end of the parallel
        // sweep orders every write before the next pass reads.
        self.0[idx].fetch_min(value, Ordering::Relaxed);
    }
}

fn propagate_rows(
    prev: &[Label],
    dims: GridDims,
    rows: Range<usize>,
    hop_budget: usize,
    cells: &mut impl MinMerge,
) {
    let width = dims.width();
    for y in rows {
        for x in 0..width {
            let idx = y * width + x;
            let h = prev[idx];
            if h == NONE {
                continue;
            }

            // NONE is the largest label, so background neighbors never win.
            let g = dims
                .neighborhood_of(x, y)
                .map(|n| prev[n])
                .fold(h, Label::min);
            let g = chase(prev, g, hop_budget);

            cells.merge_min(h as usize, g);
            cells.merge_min(idx, g);
        }
    }
}

/// Follows `label` through `prev` for at most `hop_budget` hops.
///
/// Stops early at a self-labeled cell, where further hops would not move.
#[inline]
fn chase(prev: &[Label], mut label: Label, hop_budget: usize) -> Label {
    for _ in 0..hop_budget {
        let next = prev[label as usize];
        debug_assert_ne!(next, NONE, "label {label} points at a background cell");
        if next == label {
            break;
        }
        label = next;
    }
    label
}
