//! Connected component labeling for binary bitmaps by bounded pointer jumping.
//!
//! The labeler is built for blob and fiducial-marker detection. Every pass is a
//! data-parallel sweep over flat arrays whose only write is an atomic minimum,
//! so the same passes run unchanged on one thread or many.
//!
//! - [`initialize`] builds generation 0 from a [`Mask`].
//! - [`propagate`] / [`propagate_parallel`] derive the next generation.
//! - [`PassDriver`] and [`run_passes`] run the whole configured sequence.
//!
//! Equal labels in the final generation mean "same 8-connected component".
//! A label is the linear index of some pixel of its component (the minimal
//! one once converged); labels are not renumbered to be contiguous.
//!
//! # Quick Start
//!
//! ```
//! use ccl::{LabelConfig, Mask, NONE, run_passes};
//!
//! let mask = Mask::from_ascii(
//!     "
//!     ###...
//!     .#..#
//!     ....#
//!     ",
//! )?;
//! let labels = run_passes(&mask, &LabelConfig::default())?;
//!
//! assert_eq!(labels.get(1, 1)?, 0);
//! assert_eq!(labels.get(4, 2)?, 9);
//! assert_eq!(labels.get(2, 0)?, NONE);
//! # Ok::<(), ccl::Error>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod io;
pub mod labeling;
pub mod labels;

pub use config::{ConfigFormat, Execution, LabelConfig};
pub use driver::{run_passes, LabelRun, PassDriver, PassReport, PassState, Passes, RunReport};
pub use error::{Error, Result};
pub use grid::{GridDims, Mask, Neighborhood};
pub use labeling::{changed_cells, initialize, propagate, propagate_parallel, propagate_with};
pub use labels::{Component, Label, LabelGrid, NONE};
