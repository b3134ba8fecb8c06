//! Pass driver: preparation followed by a fixed number of propagation passes.
//!
//! Passes are strictly sequential. Pass `k` starts only after generation
//! `k - 1` is completely written, and it never touches any older generation.
//! Only the two live generations are kept; history is dropped as soon as the
//! next generation exists.

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use crate::config::LabelConfig;
use crate::error::Result;
use crate::grid::Mask;
use crate::labeling;
use crate::labels::LabelGrid;

/// Position of a run in the pass sequence.
///
/// `Uninitialized -> Prepared -> Propagated(1) -> ... -> Done`. A run with a
/// single generation goes straight from `Uninitialized` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Uninitialized,
    /// Generation 0 exists.
    Prepared,
    /// Generation `k` exists and more passes are scheduled.
    Propagated(usize),
    /// The final generation exists.
    Done,
}

/// Statistics of one propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// Generation produced by this pass (1-based).
    pub generation: usize,
    /// Cells whose label changed relative to the previous generation.
    pub changed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub prepare_elapsed: Duration,
    pub passes: Vec<PassReport>,
    /// Set when `stop_when_stable` ended the run before `pass_count` generations.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn total_elapsed(&self) -> Duration {
        self.prepare_elapsed + self.passes.iter().map(|p| p.elapsed).sum::<Duration>()
    }

    /// True when the last pass changed nothing, i.e. the labels are known to be final.
    ///
    /// False does not mean the labels are wrong, only that the run ended
    /// before a pass could confirm it.
    pub fn is_stable(&self) -> bool {
        self.passes.last().is_some_and(|p| p.changed == 0)
    }
}

/// Final generation of a run together with its report.
#[derive(Debug, Clone)]
pub struct LabelRun {
    pub labels: LabelGrid,
    pub report: RunReport,
}

/// Runs labeling passes according to a [`LabelConfig`].
#[derive(Debug)]
pub struct PassDriver {
    config: LabelConfig,
    pool: Option<rayon::ThreadPool>,
}

impl PassDriver {
    /// Validates the configuration and, if `threads` is set, builds a
    /// dedicated worker pool for parallel passes.
    pub fn new(config: LabelConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("ccl-worker-{i}"))
                    .build()?,
            ),
            None => None,
        };
        Ok(Self { config, pool })
    }

    #[inline]
    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Step-by-step access to the generations of a run over `mask`.
    pub fn passes<'a>(&'a self, mask: &'a Mask) -> Passes<'a> {
        Passes {
            driver: self,
            mask,
            state: PassState::Uninitialized,
            generation: 0,
            current: None,
            report: RunReport::default(),
        }
    }

    /// Runs every scheduled pass over `mask`.
    pub fn run(&self, mask: &Mask) -> LabelRun {
        let run = self.passes(mask).finish();

        tracing::info!(
            width = mask.width(),
            height = mask.height(),
            passes = run.report.passes.len(),
            stable = run.report.is_stable(),
            elapsed_ms = run.report.total_elapsed().as_secs_f64() * 1000.0,
            "Labeling finished"
        );

        run
    }

    fn propagate(&self, prev: &LabelGrid) -> LabelGrid {
        let hop_budget = self.config.hop_budget;
        let execution = self.config.execution;
        match &self.pool {
            Some(pool) => pool.install(|| labeling::propagate_with(prev, hop_budget, execution)),
            None => labeling::propagate_with(prev, hop_budget, execution),
        }
    }
}

/// A run in progress. Each [`step`](Passes::step) produces the next generation.
#[derive(Debug)]
pub struct Passes<'a> {
    driver: &'a PassDriver,
    mask: &'a Mask,
    state: PassState,
    generation: usize,
    current: Option<LabelGrid>,
    report: RunReport,
}

impl Passes<'_> {
    #[inline]
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Index of the newest generation, if any exists yet.
    #[inline]
    pub fn generation(&self) -> Option<usize> {
        self.current.as_ref().map(|_| self.generation)
    }

    /// The newest generation, if any exists yet.
    #[inline]
    pub fn current(&self) -> Option<&LabelGrid> {
        self.current.as_ref()
    }

    #[inline]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Produces the next generation and returns it, or `None` once the run is done.
    pub fn step(&mut self) -> Option<&LabelGrid> {
        let last_generation = self.driver.config.propagation_passes();

        match self.state {
            PassState::Done => return None,
            PassState::Uninitialized => {
                let start = Instant::now();
                self.current = Some(labeling::initialize(self.mask));
                self.report.prepare_elapsed = start.elapsed();
                self.generation = 0;
                tracing::debug!(
                    foreground = self.mask.count_foreground(),
                    "Prepared generation 0"
                );
            }
            PassState::Prepared | PassState::Propagated(_) => {
                let prev = self.current.take()?;
                let start = Instant::now();
                let next = self.driver.propagate(&prev);
                let elapsed = start.elapsed();
                let changed = labeling::count_changed(prev.labels(), next.labels());
                drop(prev);

                self.generation += 1;
                self.current = Some(next);
                self.report.passes.push(PassReport {
                    generation: self.generation,
                    changed,
                    elapsed,
                });
                tracing::debug!(
                    generation = self.generation,
                    changed,
                    elapsed_us = elapsed.as_micros() as u64,
                    "Propagation pass"
                );

                if changed == 0
                    && self.driver.config.stop_when_stable
                    && self.generation < last_generation
                {
                    tracing::debug!(generation = self.generation, "Labels stable, stopping early");
                    self.report.stopped_early = true;
                    self.state = PassState::Done;
                    return self.current.as_ref();
                }
            }
        }

        self.state = if self.generation >= last_generation {
            PassState::Done
        } else if self.generation == 0 {
            PassState::Prepared
        } else {
            PassState::Propagated(self.generation)
        };
        self.current.as_ref()
    }

    /// Runs the remaining passes and returns the final generation.
    pub fn finish(mut self) -> LabelRun {
        while self.step().is_some() {}
        let labels = self
            .current
            .unwrap_or_else(|| labeling::initialize(self.mask));
        LabelRun {
            labels,
            report: self.report,
        }
    }
}

/// Full pipeline: generation 0 followed by `config.pass_count - 1` passes.
pub fn run_passes(mask: &Mask, config: &LabelConfig) -> Result<LabelGrid> {
    let driver = PassDriver::new(config.clone())?;
    Ok(driver.run(mask).labels)
}
