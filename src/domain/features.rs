// ============================================================
// Layer 3 — Feature Domain Types
// ============================================================
// Numeric arrays as the pipeline sees them once they are off
// disk: a leading example dimension N and a flat row-major
// payload of f32 values.
//
//   FeatureMatrix  — (N, ...) array, any trailing shape
//   GridShape      — the (rows, cols, channels) layout of one MFCC example
//   MfccGrids      — N examples reinterpreted as GridShape grids
//
// Reshaping never copies or reorders values: a (N, 40, 108)
// array and a (N, 4320) array hold the same bytes in the same
// order, so flatten(reshape(x)) == x exactly.

use serde::{Deserialize, Serialize};

use crate::domain::error::DataError;

/// MFCC time rows per example.
pub const MFCC_ROWS: usize = 40;
/// MFCC frequency columns per example.
pub const MFCC_COLS: usize = 108;
/// Single-channel input.
pub const MFCC_CHANNELS: usize = 1;

/// An N-dimensional f32 array whose first axis indexes examples.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    shape:  Vec<usize>,
    values: Vec<f32>,
}

impl FeatureMatrix {
    /// Wrap a flat payload, checking it matches the shape.
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Result<Self, DataError> {
        if shape.is_empty() {
            return Err(DataError::ShapeMismatch(
                "a feature array needs at least one dimension".to_string(),
            ));
        }
        let expected = element_count(&shape).ok_or_else(|| {
            DataError::ShapeMismatch(format!("shape {:?} is too large to address", shape))
        })?;
        if expected != values.len() {
            return Err(DataError::ShapeMismatch(format!(
                "shape {:?} holds {} values but {} were given",
                shape, expected, values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of examples (first axis).
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of values per example (product of trailing axes).
    pub fn row_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let len = self.row_len();
        &self.values[index * len..(index + 1) * len]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Reinterpret every example as a grid of the given shape.
    pub fn reshape_to_grid(self, grid: GridShape) -> Result<MfccGrids, DataError> {
        if self.row_len() != grid.len() {
            return Err(DataError::ShapeMismatch(format!(
                "each example has {} values but a {}x{}x{} grid needs {}",
                self.row_len(), grid.rows, grid.cols, grid.channels, grid.len()
            )));
        }
        Ok(MfccGrids {
            count:  self.rows(),
            grid,
            values: self.values,
        })
    }
}

/// Total values in an array of `shape`, or None if it overflows.
/// The trailing axes are multiplied first so `row_len` of any
/// shape that passes is also representable.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    match shape.split_first() {
        None              => Some(1),
        Some((n, rest))   => rest
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))?
            .checked_mul(*n),
    }
}

/// Layout of a single example: time rows × frequency columns × channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows:     usize,
    pub cols:     usize,
    pub channels: usize,
}

impl GridShape {
    pub fn new(rows: usize, cols: usize, channels: usize) -> Self {
        Self { rows, cols, channels }
    }

    /// The fixed 40 × 108 × 1 MFCC layout.
    pub fn mfcc() -> Self {
        Self::new(MFCC_ROWS, MFCC_COLS, MFCC_CHANNELS)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols * self.channels
    }
}

/// N examples laid out as grids, shape (N, rows, cols, channels).
#[derive(Debug, Clone, PartialEq)]
pub struct MfccGrids {
    count:  usize,
    grid:   GridShape,
    values: Vec<f32>,
}

impl MfccGrids {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// (N, rows, cols, channels)
    pub fn shape(&self) -> [usize; 4] {
        [self.count, self.grid.rows, self.grid.cols, self.grid.channels]
    }

    pub fn example(&self, index: usize) -> &[f32] {
        let len = self.grid.len();
        &self.values[index * len..(index + 1) * len]
    }

    /// Collapse the grids back into (N, rows * cols * channels).
    pub fn flatten(self) -> FeatureMatrix {
        FeatureMatrix {
            shape:  vec![self.count, self.grid.len()],
            values: self.values,
        }
    }
}
