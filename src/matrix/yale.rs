//! Yale storage: compressed sparse row

use super::buffer::ElemBuffer;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::ops::Range;

/// Yale (CSR) backing store
///
/// `row_ptrs` has one entry per row plus a terminator; row `i`'s stored
/// entries live at `row_ptrs[i]..row_ptrs[i+1]` in `col_indices`/`values`,
/// with column indices strictly increasing inside each row. Unstored
/// positions read as zero.
#[derive(Debug, Clone)]
pub struct YaleStore {
    pub(crate) row_ptrs: Vec<usize>,
    pub(crate) col_indices: Vec<usize>,
    pub(crate) values: ElemBuffer,
}

impl YaleStore {
    /// Create an empty store for `nrows` rows
    pub fn new_empty(dtype: DType, nrows: usize) -> Self {
        Self {
            row_ptrs: vec![0; nrows + 1],
            col_indices: Vec::new(),
            values: ElemBuffer::new_zeroed(dtype, 0),
        }
    }

    /// Create a store from CSR parts
    ///
    /// # Errors
    ///
    /// Returns an error if `row_ptrs` has the wrong length or is not
    /// monotone, a column index is out of bounds, columns are not strictly
    /// increasing within a row, or the value/index lengths disagree.
    pub fn from_parts(
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: ElemBuffer,
        shape: [usize; 2],
    ) -> Result<Self> {
        let [nrows, ncols] = shape;
        let nnz = values.len();
        if row_ptrs.len() != nrows + 1 {
            return Err(Error::shape_mismatch(&[nrows + 1], &[row_ptrs.len()]));
        }
        if col_indices.len() != nnz {
            return Err(Error::shape_mismatch(&[nnz], &[col_indices.len()]));
        }
        if row_ptrs[0] != 0 || row_ptrs[nrows] != nnz {
            return Err(Error::invalid_sparse(format!(
                "row_ptrs must start at 0 and end at nnz ({}), got {} and {}",
                nnz, row_ptrs[0], row_ptrs[nrows]
            )));
        }
        for i in 0..nrows {
            if row_ptrs[i] > row_ptrs[i + 1] {
                return Err(Error::invalid_sparse(format!(
                    "row_ptrs not monotone at row {}",
                    i
                )));
            }
            let row = &col_indices[row_ptrs[i]..row_ptrs[i + 1]];
            for (k, &col) in row.iter().enumerate() {
                if col >= ncols {
                    return Err(Error::invalid_sparse(format!(
                        "column {} out of bounds for {} columns",
                        col, ncols
                    )));
                }
                if k > 0 && row[k - 1] >= col {
                    return Err(Error::invalid_sparse(format!(
                        "columns not strictly increasing in row {}",
                        i
                    )));
                }
            }
        }
        Ok(Self {
            row_ptrs,
            col_indices,
            values,
        })
    }

    /// Number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Number of rows
    #[inline]
    pub fn nrows(&self) -> usize {
        self.row_ptrs.len() - 1
    }

    /// Element type of the stored values
    #[inline]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// The value buffer
    #[inline]
    pub fn values(&self) -> &ElemBuffer {
        &self.values
    }

    /// The value buffer, mutably
    #[inline]
    pub fn values_mut(&mut self) -> &mut ElemBuffer {
        &mut self.values
    }

    /// Storage range of one row
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Index of a stored position, if present
    pub fn find(&self, row: usize, col: usize) -> Option<usize> {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|k| range.start + k)
    }

    /// Visit every stored entry in row-major order
    pub fn for_each_stored<T: Element>(&self, mut f: impl FnMut(usize, usize, T)) {
        let values = self.values.as_slice::<T>();
        for row in 0..self.nrows() {
            for idx in self.row_range(row) {
                f(row, self.col_indices[idx], values[idx]);
            }
        }
    }
}

/// Merge-iterate two CSR stores with the same row count: `f` is called once
/// per position in the union of stored positions, row by row, with zero
/// supplied for the side that lacks the position.
pub fn merge_stored<T: Element>(
    lhs: &YaleStore,
    rhs: &YaleStore,
    mut f: impl FnMut(usize, usize, T, T),
) {
    debug_assert_eq!(lhs.nrows(), rhs.nrows());
    let lv = lhs.values.as_slice::<T>();
    let rv = rhs.values.as_slice::<T>();
    for row in 0..lhs.nrows() {
        let mut i = lhs.row_ptrs[row];
        let mut j = rhs.row_ptrs[row];
        let iend = lhs.row_ptrs[row + 1];
        let jend = rhs.row_ptrs[row + 1];
        while i < iend || j < jend {
            let lcol = if i < iend {
                Some(lhs.col_indices[i])
            } else {
                None
            };
            let rcol = if j < jend {
                Some(rhs.col_indices[j])
            } else {
                None
            };
            match (lcol, rcol) {
                (Some(lc), Some(rc)) if lc == rc => {
                    f(row, lc, lv[i], rv[j]);
                    i += 1;
                    j += 1;
                }
                (Some(lc), Some(rc)) if lc < rc => {
                    f(row, lc, lv[i], T::zero());
                    i += 1;
                }
                (Some(_), Some(rc)) => {
                    f(row, rc, T::zero(), rv[j]);
                    j += 1;
                }
                (Some(lc), None) => {
                    f(row, lc, lv[i], T::zero());
                    i += 1;
                }
                (None, Some(rc)) => {
                    f(row, rc, T::zero(), rv[j]);
                    j += 1;
                }
                (None, None) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_2x3() -> YaleStore {
        // [[1, 0, 2],
        //  [0, 3, 0]]
        YaleStore::from_parts(
            vec![0, 2, 3],
            vec![0, 2, 1],
            ElemBuffer::from_slice(&[1.0f64, 2.0, 3.0]),
            [2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parts_validation() {
        let bad_ptrs = YaleStore::from_parts(
            vec![0, 3],
            vec![0],
            ElemBuffer::from_slice(&[1.0f64]),
            [2, 3],
        );
        assert!(bad_ptrs.is_err(), "wrong row_ptrs length must be rejected");

        let bad_cols = YaleStore::from_parts(
            vec![0, 2, 2],
            vec![1, 1],
            ElemBuffer::from_slice(&[1.0f64, 2.0]),
            [2, 3],
        );
        assert!(bad_cols.is_err(), "duplicate column must be rejected");
    }

    #[test]
    fn test_find_and_iterate() {
        let s = store_2x3();
        assert_eq!(s.find(0, 2), Some(1));
        assert_eq!(s.find(1, 1), Some(2));
        assert_eq!(s.find(0, 1), None);

        let mut seen = Vec::new();
        s.for_each_stored::<f64>(|r, c, v| seen.push((r, c, v)));
        assert_eq!(seen, vec![(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0)]);
    }

    #[test]
    fn test_merge_outer_join() {
        let a = store_2x3();
        let b = YaleStore::from_parts(
            vec![0, 1, 2],
            vec![0, 2],
            ElemBuffer::from_slice(&[5.0f64, 7.0]),
            [2, 3],
        )
        .unwrap();
        let mut seen = Vec::new();
        merge_stored::<f64>(&a, &b, |r, c, x, y| seen.push((r, c, x, y)));
        assert_eq!(
            seen,
            vec![
                (0, 0, 1.0, 5.0),
                (0, 2, 2.0, 0.0),
                (1, 1, 3.0, 0.0),
                (1, 2, 0.0, 7.0),
            ]
        );
    }
}
