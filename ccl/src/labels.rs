//! Label values and generation buffers.

use std::ops::Index;

use crate::error::{Error, Result};
use crate::grid::GridDims;

/// A label is the linear index of the pixel currently believed to represent
/// its component, or [`NONE`] for background.
pub type Label = u32;

/// Background / unassigned. Disjoint from every valid index, since
/// [`GridDims`] limits grids to `u32::MAX` cells.
pub const NONE: Label = u32::MAX;

/// One generation of labels over a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    labels: Vec<Label>,
    dims: GridDims,
}

impl LabelGrid {
    /// Wraps raw row-major labels.
    ///
    /// Fails if the length does not match the dimensions, or if a foreground
    /// label is not an index into the grid or names a background cell.
    pub fn from_raw(width: usize, height: usize, labels: Vec<Label>) -> Result<Self> {
        let dims = GridDims::new(width, height)?;
        if labels.len() != dims.len() {
            return Err(Error::DimensionMismatch {
                width,
                height,
                expected: dims.len(),
                actual: labels.len(),
            });
        }
        for (index, &label) in labels.iter().enumerate() {
            if label == NONE {
                continue;
            }
            let target = label as usize;
            if target >= labels.len() || labels[target] == NONE {
                return Err(Error::InvalidLabel { index, label });
            }
        }
        Ok(Self { labels, dims })
    }

    pub(crate) fn from_parts(dims: GridDims, labels: Vec<Label>) -> Self {
        debug_assert_eq!(labels.len(), dims.len());
        Self { labels, dims }
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.height()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Result<Label> {
        let idx = self.dims.index(x, y)?;
        Ok(self.labels[idx])
    }

    /// Row-major labels.
    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Label> {
        self.labels
    }

    #[inline]
    pub fn is_background(&self, idx: usize) -> bool {
        self.labels[idx] == NONE
    }

    pub fn foreground_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l != NONE).count()
    }

    /// Number of distinct non-background labels.
    ///
    /// Equals the number of connected components only once the labeling has
    /// converged; before that one component may still carry several labels.
    pub fn component_count(&self) -> usize {
        let mut distinct: Vec<Label> = self.labels.iter().copied().filter(|&l| l != NONE).collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }

    /// Area and bounding box of every distinct label, sorted by label.
    pub fn components(&self) -> Vec<Component> {
        let mut order: Vec<usize> = (0..self.labels.len())
            .filter(|&idx| self.labels[idx] != NONE)
            .collect();
        order.sort_by_key(|&idx| self.labels[idx]);

        let mut components: Vec<Component> = Vec::new();
        for idx in order {
            let label = self.labels[idx];
            let (x, y) = self.dims.coords(idx);
            match components.last_mut() {
                Some(last) if last.label == label => last.include(x, y),
                _ => components.push(Component::single(label, x, y)),
            }
        }
        components
    }
}

impl Index<usize> for LabelGrid {
    type Output = Label;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

impl AsRef<[Label]> for LabelGrid {
    #[inline]
    fn as_ref(&self) -> &[Label] {
        &self.labels
    }
}

impl From<LabelGrid> for Vec<Label> {
    #[inline]
    fn from(grid: LabelGrid) -> Self {
        grid.labels
    }
}

/// Summary of all pixels sharing one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub label: Label,
    /// Number of pixels carrying the label.
    pub area: usize,
    /// Inclusive bounding box.
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Component {
    fn single(label: Label, x: usize, y: usize) -> Self {
        Self {
            label,
            area: 1,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    #[inline]
    pub fn bbox_width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn bbox_height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}
