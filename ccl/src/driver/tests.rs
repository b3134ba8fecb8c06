//! Tests for the pass driver.

use super::*;
use crate::config::Execution;
use crate::error::Error;
use crate::labeling::test_utils::{generations, random_mask, reference_labels};
use crate::labels::NONE;

fn config(pass_count: usize, hop_budget: usize) -> LabelConfig {
    LabelConfig {
        pass_count,
        hop_budget,
        ..Default::default()
    }
}

#[test]
fn test_new_rejects_invalid_config() {
    assert!(matches!(
        PassDriver::new(config(0, 6)),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        PassDriver::new(LabelConfig {
            threads: Some(0),
            ..Default::default()
        }),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_states_advance_in_order() {
    let mask = Mask::from_ascii("##.\n..#").unwrap();
    let driver = PassDriver::new(config(4, 6)).unwrap();
    let mut passes = driver.passes(&mask);

    assert_eq!(passes.state(), PassState::Uninitialized);
    assert!(passes.current().is_none());
    assert_eq!(passes.generation(), None);

    assert!(passes.step().is_some());
    assert_eq!(passes.state(), PassState::Prepared);
    assert_eq!(passes.generation(), Some(0));

    assert!(passes.step().is_some());
    assert_eq!(passes.state(), PassState::Propagated(1));

    assert!(passes.step().is_some());
    assert_eq!(passes.state(), PassState::Propagated(2));

    assert!(passes.step().is_some());
    assert_eq!(passes.state(), PassState::Done);
    assert_eq!(passes.generation(), Some(3));

    assert!(passes.step().is_none());
    assert_eq!(passes.state(), PassState::Done);
    assert_eq!(passes.report().passes.len(), 3);
}

#[test]
fn test_single_generation_is_done_after_preparation() {
    let mask = Mask::from_ascii("#.#").unwrap();
    let driver = PassDriver::new(config(1, 6)).unwrap();
    let mut passes = driver.passes(&mask);

    let labels = passes.step().unwrap().clone();
    assert_eq!(passes.state(), PassState::Done);
    assert_eq!(labels.labels(), &[0, NONE, 2]);

    let run = driver.run(&mask);
    assert_eq!(run.labels, labels);
    assert!(run.report.passes.is_empty());
    assert!(!run.report.is_stable());
}

#[test]
fn test_run_matches_manual_generations() {
    let mask = random_mask(31, 17, 0.5, 3);
    let expected = generations(&mask, 2, 6, Execution::Sequential);

    for execution in [Execution::Sequential, Execution::Parallel] {
        let driver = PassDriver::new(LabelConfig {
            pass_count: 7,
            hop_budget: 2,
            execution,
            ..Default::default()
        })
        .unwrap();
        let run = driver.run(&mask);
        assert_eq!(&run.labels, expected.last().unwrap(), "{execution:?}");
        assert_eq!(run.report.passes.len(), 6);
        assert!(!run.report.stopped_early);
    }
}

#[test]
fn test_report_counts_changed_cells_per_pass() {
    let mask = random_mask(25, 25, 0.5, 11);
    let expected = generations(&mask, 6, 8, Execution::Sequential);
    let run = PassDriver::new(config(9, 6)).unwrap().run(&mask);

    for (k, pass) in run.report.passes.iter().enumerate() {
        let prev = &expected[k];
        let next = &expected[k + 1];
        assert_eq!(pass.generation, k + 1);
        assert_eq!(
            pass.changed,
            crate::labeling::changed_cells(prev, next).unwrap()
        );
    }
}

#[test]
fn test_dedicated_pool_gives_same_result() {
    let mask = random_mask(50, 40, 0.5, 5);
    let global = PassDriver::new(config(8, 3)).unwrap().run(&mask);
    let pooled = PassDriver::new(LabelConfig {
        threads: Some(3),
        ..config(8, 3)
    })
    .unwrap()
    .run(&mask);

    assert_eq!(global.labels, pooled.labels);
}

#[test]
fn test_stop_when_stable_ends_early_with_same_labels() {
    let mask = Mask::from_fn(9, 9, |x, y| (1..8).contains(&x) && (1..8).contains(&y)).unwrap();

    let full = PassDriver::new(config(40, 6)).unwrap().run(&mask);
    let early = PassDriver::new(LabelConfig {
        stop_when_stable: true,
        ..config(40, 6)
    })
    .unwrap()
    .run(&mask);

    assert_eq!(early.labels, full.labels);
    assert!(early.report.stopped_early);
    assert!(early.report.is_stable());
    assert!(early.report.passes.len() < full.report.passes.len());
    assert_eq!(early.report.passes.last().unwrap().changed, 0);
}

#[test]
fn test_stop_when_stable_never_extends_the_run() {
    let mask = Mask::from_fn(40, 1, |_, _| true).unwrap();
    let run = PassDriver::new(LabelConfig {
        stop_when_stable: true,
        ..config(3, 0)
    })
    .unwrap()
    .run(&mask);

    assert_eq!(run.report.passes.len(), 2);
    assert!(!run.report.stopped_early);
    assert!(!run.report.is_stable());
}

#[test]
fn test_run_passes_converges_on_random_masks() {
    for seed in 0..6 {
        let mask = random_mask(32, 32, 0.4, seed);
        // Enough generations for any chain; the early stop keeps it cheap.
        let config = LabelConfig {
            stop_when_stable: true,
            ..config(mask.len() + 1, 6)
        };
        let labels = run_passes(&mask, &config).unwrap();
        assert_eq!(labels.labels(), reference_labels(&mask).as_slice(), "seed {seed}");
    }
}

#[test]
fn test_run_passes_propagates_config_errors() {
    let mask = Mask::from_ascii("#").unwrap();
    assert!(run_passes(&mask, &config(0, 1)).is_err());
}

#[test]
fn test_total_elapsed_sums_passes() {
    let report = RunReport {
        prepare_elapsed: Duration::from_millis(2),
        passes: vec![
            PassReport {
                generation: 1,
                changed: 4,
                elapsed: Duration::from_millis(3),
            },
            PassReport {
                generation: 2,
                changed: 0,
                elapsed: Duration::from_millis(5),
            },
        ],
        stopped_early: false,
    };
    assert_eq!(report.total_elapsed(), Duration::from_millis(10));
    assert!(report.is_stable());
}
