//! Grid geometry and the foreground mask.
//!
//! Cells are addressed either by `(x, y)` or by the linear index `y * width + x`.
//! All coordinate access is bounds-checked: an out-of-range coordinate is an
//! [`Error::CoordinateOutOfRange`], and neighborhood iteration simply omits
//! cells that fall outside the grid.


use crate::error::{Error, Result};

/// Number of mask cells per storage word.
const BITS_PER_WORD: usize = 64;

/// Validated width and height of a labeling grid.
///
/// Every linear index of a valid grid fits in a `u32` strictly below
/// [`NONE`](crate::labels::NONE), so indices can double as labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDims {
    width: usize,
    height: usize,
}

impl GridDims {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        match width.checked_mul(height) {
            Some(len) if len <= u32::MAX as usize => Ok(Self { width, height }),
            _ => Err(Error::GridTooLarge { width, height }),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false: a valid grid has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Linear index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> Result<usize> {
        if self.contains(x, y) {
            Ok(y * self.width + x)
        } else {
            Err(self.out_of_range(x, y))
        }
    }

    /// `(x, y)` of a linear index. The index must be below [`len`](Self::len).
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.len());
        (index % self.width, index / self.width)
    }

    /// In-bounds cells of the 3x3 window centered on `(x, y)`, the center included.
    pub fn neighborhood(&self, x: usize, y: usize) -> Result<Neighborhood> {
        if !self.contains(x, y) {
            return Err(self.out_of_range(x, y));
        }
        Ok(Neighborhood::new(*self, x, y))
    }

    /// Unchecked variant used by the per-pixel kernels, which only ever
    /// visit in-bounds cells.
    #[inline]
    pub(crate) fn neighborhood_of(&self, x: usize, y: usize) -> Neighborhood {
        debug_assert!(self.contains(x, y));
        Neighborhood::new(*self, x, y)
    }

    fn out_of_range(&self, x: usize, y: usize) -> Error {
        Error::CoordinateOutOfRange {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Row-major iterator over the linear indices of a clipped 3x3 window.
///
/// Windows touching the grid edge are smaller (4 cells in a corner, 6 along an
/// edge); missing cells are never replaced by a stand-in value.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    width: usize,
    x_start: usize,
    x_end: usize,
    y_end: usize,
    x: usize,
    y: usize,
}

impl Neighborhood {
    fn new(dims: GridDims, x: usize, y: usize) -> Self {
        let x_start = x.saturating_sub(1);
        Self {
            width: dims.width,
            x_start,
            x_end: (x + 1).min(dims.width - 1),
            y_end: (y + 1).min(dims.height - 1),
            x: x_start,
            y: y.saturating_sub(1),
        }
    }
}

impl Iterator for Neighborhood {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.y > self.y_end {
            return None;
        }
        let idx = self.y * self.width + self.x;
        if self.x == self.x_end {
            self.x = self.x_start;
            self.y += 1;
        } else {
            self.x += 1;
        }
        Some(idx)
    }
}

/// Immutable foreground mask, one bit per cell.
///
/// Produced once by an outer collaborator (typically by thresholding one
/// channel of a decoded image) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    /// Packed bit storage, LSB first. Bits past `dims.len()` are always zero.
    words: Vec<u64>,
    dims: GridDims,
}

impl Mask {
    /// Builds a mask from row-major booleans.
    ///
    /// Fails if `data.len() != width * height` or the dimensions are invalid.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Result<Self> {
        let dims = GridDims::new(width, height)?;
        if data.len() != dims.len() {
            return Err(Error::DimensionMismatch {
                width,
                height,
                expected: dims.len(),
                actual: data.len(),
            });
        }

        let mut words = vec![0u64; dims.len().div_ceil(BITS_PER_WORD)];
        for (i, &fg) in data.iter().enumerate() {
            if fg {
                words[i / BITS_PER_WORD] |= 1u64 << (i % BITS_PER_WORD);
            }
        }

        Ok(Self { words, dims })
    }

    /// Builds a mask by evaluating `is_foreground(x, y)` for every cell.
    pub fn from_fn<F>(width: usize, height: usize, mut is_foreground: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let dims = GridDims::new(width, height)?;
        let mut words = vec![0u64; dims.len().div_ceil(BITS_PER_WORD)];
        for y in 0..height {
            for x in 0..width {
                if is_foreground(x, y) {
                    let i = y * width + x;
                    words[i / BITS_PER_WORD] |= 1u64 << (i % BITS_PER_WORD);
                }
            }
        }
        Ok(Self { words, dims })
    }

    /// Parses a mask drawn as text: one line per row, `#` for foreground and
    /// any other character for background. Blank lines and surrounding
    /// whitespace are ignored; all rows must have the same length.
    ///
    /// ```
    /// let mask = ccl::Mask::from_ascii(
    ///     "
    ///     #..
    ///     .#.
    ///     ",
    /// )
    /// .unwrap();
    /// assert_eq!((mask.width(), mask.height()), (3, 2));
    /// assert_eq!(mask.count_foreground(), 2);
    /// ```
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());

        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(Error::RaggedRows {
                    row: y,
                    expected: width,
                    actual: len,
                });
            }
            data.extend(row.chars().map(|c| c == '#'));
        }

        Self::from_slice(width, height, &data)
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Foreground flag at a linear index. The index must be below [`len`](Self::len).
    #[inline]
    pub fn is_foreground(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len());
        (self.words[idx / BITS_PER_WORD] >> (idx % BITS_PER_WORD)) & 1 != 0
    }

    /// Foreground flag at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Result<bool> {
        let idx = self.dims.index(x, y)?;
        Ok(self.is_foreground(idx))
    }

    pub fn count_foreground(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Foreground flags in row-major order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = bool> + '_ {
        (0..self.len()).map(|idx| self.is_foreground(idx))
    }
}
