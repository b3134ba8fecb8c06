//! Test utilities for the labeling passes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Execution;
use crate::grid::Mask;
use crate::labels::{Label, LabelGrid, NONE};

use super::{count_changed, initialize, propagate_with};

/// Flood-fill labeling: every foreground pixel gets the smallest index of its
/// 8-connected component.
pub fn reference_labels(mask: &Mask) -> Vec<Label> {
    let dims = mask.dims();
    let mut labels = vec![NONE; mask.len()];
    let mut stack = Vec::new();

    // Scanning in index order reaches each component at its smallest index first.
    for start in 0..mask.len() {
        if !mask.is_foreground(start) || labels[start] != NONE {
            continue;
        }
        labels[start] = start as Label;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let (x, y) = dims.coords(idx);
            for n in dims.neighborhood_of(x, y) {
                if mask.is_foreground(n) && labels[n] == NONE {
                    labels[n] = start as Label;
                    stack.push(n);
                }
            }
        }
    }

    labels
}

/// Seeded random mask with roughly `density` foreground.
pub fn random_mask(width: usize, height: usize, density: f64, seed: u64) -> Mask {
    let mut rng = StdRng::seed_from_u64(seed);
    Mask::from_fn(width, height, |_, _| rng.random_bool(density)).unwrap()
}

/// Generation 0 followed by `passes` propagation passes, all kept.
pub fn generations(
    mask: &Mask,
    hop_budget: usize,
    passes: usize,
    execution: Execution,
) -> Vec<LabelGrid> {
    let mut history = vec![initialize(mask)];
    for _ in 0..passes {
        let next = propagate_with(history.last().unwrap(), hop_budget, execution);
        history.push(next);
    }
    history
}

/// Propagates until a pass changes nothing. Returns the stable generation and
/// the number of passes that changed at least one cell.
pub fn converge(mask: &Mask, hop_budget: usize, execution: Execution) -> (LabelGrid, usize) {
    let mut current = initialize(mask);
    // Information crosses at least one pixel per pass, so len + 1 passes always suffice.
    for pass in 0..=mask.len() {
        let next = propagate_with(&current, hop_budget, execution);
        if count_changed(current.labels(), next.labels()) == 0 {
            return (next, pass);
        }
        current = next;
    }
    panic!("labels did not stabilize within {} passes", mask.len() + 1);
}
