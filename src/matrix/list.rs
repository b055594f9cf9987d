//! List storage: sparse, position-keyed sorted coordinate list

use super::buffer::ElemBuffer;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// List (coordinate) backing store
///
/// Positions are kept sorted in row-major order with no duplicates, so
/// binary ops can merge two stores in one linear pass (sparse outer join).
/// Unstored positions read as zero.
#[derive(Debug, Clone)]
pub struct ListStore {
    pub(crate) row_indices: Vec<usize>,
    pub(crate) col_indices: Vec<usize>,
    pub(crate) values: ElemBuffer,
}

impl ListStore {
    /// Create an empty store
    pub fn new_empty(dtype: DType) -> Self {
        Self {
            row_indices: Vec::new(),
            col_indices: Vec::new(),
            values: ElemBuffer::new_zeroed(dtype, 0),
        }
    }

    /// Create a store from coordinate parts
    ///
    /// # Errors
    ///
    /// Returns an error if the arrays differ in length, an index is out of
    /// bounds for `shape`, or the positions are not strictly sorted in
    /// row-major order.
    pub fn from_parts(
        row_indices: Vec<usize>,
        col_indices: Vec<usize>,
        values: ElemBuffer,
        shape: [usize; 2],
    ) -> Result<Self> {
        let nnz = values.len();
        if row_indices.len() != nnz || col_indices.len() != nnz {
            return Err(Error::shape_mismatch(&[nnz], &[row_indices.len()]));
        }
        for i in 0..nnz {
            if row_indices[i] >= shape[0] || col_indices[i] >= shape[1] {
                return Err(Error::invalid_sparse(format!(
                    "position ({}, {}) out of bounds for shape {:?}",
                    row_indices[i], col_indices[i], shape
                )));
            }
            if i > 0 {
                let prev = (row_indices[i - 1], col_indices[i - 1]);
                let cur = (row_indices[i], col_indices[i]);
                if prev >= cur {
                    return Err(Error::invalid_sparse(format!(
                        "positions not strictly sorted at entry {}: {:?} then {:?}",
                        i, prev, cur
                    )));
                }
            }
        }
        Ok(Self {
            row_indices,
            col_indices,
            values,
        })
    }

    /// Number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
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

    /// Index of a stored position, if present
    pub fn find(&self, row: usize, col: usize) -> Option<usize> {
        self.row_indices
            .binary_search_by(|probe_row| {
                probe_row.cmp(&row)
            })
            .ok()
            .map(|hit| {
                // binary_search lands on an arbitrary entry of the row;
                // scan the row's contiguous run for the column
                let mut lo = hit;
                while lo > 0 && self.row_indices[lo - 1] == row {
                    lo -= 1;
                }
                let mut idx = lo;
                while idx < self.row_indices.len() && self.row_indices[idx] == row {
                    if self.col_indices[idx] == col {
                        return Some(idx);
                    }
                    idx += 1;
                }
                None
            })
            .flatten()
    }

    /// Visit every stored entry in order
    pub fn for_each_stored<T: Element>(&self, mut f: impl FnMut(usize, usize, T)) {
        let values = self.values.as_slice::<T>();
        for i in 0..self.nnz() {
            f(self.row_indices[i], self.col_indices[i], values[i]);
        }
    }
}

/// Merge-iterate two sorted coordinate stores (sparse outer join): `f` is
/// called once per position in the union of stored positions, with zero
/// supplied for the side that lacks the position.
pub fn merge_stored<T: Element>(
    lhs: &ListStore,
    rhs: &ListStore,
    mut f: impl FnMut(usize, usize, T, T),
) {
    let lv = lhs.values.as_slice::<T>();
    let rv = rhs.values.as_slice::<T>();
    let (mut i, mut j) = (0usize, 0usize);
    while i < lhs.nnz() || j < rhs.nnz() {
        let lpos = if i < lhs.nnz() {
            Some((lhs.row_indices[i], lhs.col_indices[i]))
        } else {
            None
        };
        let rpos = if j < rhs.nnz() {
            Some((rhs.row_indices[j], rhs.col_indices[j]))
        } else {
            None
        };
        match (lpos, rpos) {
            (Some(lp), Some(rp)) if lp == rp => {
                f(lp.0, lp.1, lv[i], rv[j]);
                i += 1;
                j += 1;
            }
            (Some(lp), Some(rp)) if lp < rp => {
                f(lp.0, lp.1, lv[i], T::zero());
                i += 1;
            }
            (Some(_), Some(rp)) => {
                f(rp.0, rp.1, T::zero(), rv[j]);
                j += 1;
            }
            (Some(lp), None) => {
                f(lp.0, lp.1, lv[i], T::zero());
                i += 1;
            }
            (None, Some(rp)) => {
                f(rp.0, rp.1, T::zero(), rv[j]);
                j += 1;
            }
            (None, None) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(usize, usize, f64)]) -> ListStore {
        let rows: Vec<usize> = entries.iter().map(|e| e.0).collect();
        let cols: Vec<usize> = entries.iter().map(|e| e.1).collect();
        let vals: Vec<f64> = entries.iter().map(|e| e.2).collect();
        ListStore::from_parts(rows, cols, ElemBuffer::from_slice(&vals), [4, 4]).unwrap()
    }

    #[test]
    fn test_from_parts_validation() {
        let bad = ListStore::from_parts(
            vec![0, 0],
            vec![1, 1],
            ElemBuffer::from_slice(&[1.0f64, 2.0]),
            [4, 4],
        );
        assert!(bad.is_err(), "duplicate position must be rejected");

        let oob = ListStore::from_parts(
            vec![5],
            vec![0],
            ElemBuffer::from_slice(&[1.0f64]),
            [4, 4],
        );
        assert!(oob.is_err(), "out of bounds position must be rejected");
    }

    #[test]
    fn test_find() {
        let s = store(&[(0, 1, 1.0), (1, 0, 2.0), (1, 3, 3.0), (2, 2, 4.0)]);
        assert_eq!(s.find(1, 3), Some(2));
        assert_eq!(s.find(1, 1), None);
        assert_eq!(s.find(3, 3), None);
    }

    #[test]
    fn test_merge_outer_join() {
        let a = store(&[(0, 0, 1.0), (1, 1, 2.0)]);
        let b = store(&[(0, 0, 10.0), (2, 2, 30.0)]);
        let mut seen = Vec::new();
        merge_stored::<f64>(&a, &b, |r, c, x, y| seen.push((r, c, x, y)));
        assert_eq!(
            seen,
            vec![
                (0, 0, 1.0, 10.0),
                (1, 1, 2.0, 0.0),
                (2, 2, 0.0, 30.0),
            ]
        );
    }
}
