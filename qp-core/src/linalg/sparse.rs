//! Sparse matrix helpers.
//!
//! All matrices are stored in CSC (Compressed Sparse Column) format, which is
//! what the benchmark problem files and the solver bindings exchange.

use sprs::{CsMat, TriMat};

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Build a sparse CSC matrix from triplets (row, col, value).
///
/// Duplicate entries are summed.
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Create an identity matrix in CSC format.
pub fn identity(n: usize) -> SparseCsc {
    from_triplets(n, n, (0..n).map(|i| (i, i, 1.0)))
}

/// An empty `nrows x ncols` matrix.
pub fn zeros(nrows: usize, ncols: usize) -> SparseCsc {
    from_triplets(nrows, ncols, std::iter::empty())
}

/// Sparse matrix-vector product: y = alpha * A * x + beta * y
pub fn spmv(a: &SparseCsc, x: &[f64], y: &mut [f64], alpha: f64, beta: f64) {
    assert_eq!(a.cols(), x.len());
    assert_eq!(a.rows(), y.len());

    if beta == 0.0 {
        y.fill(0.0);
    } else if beta != 1.0 {
        for yi in y.iter_mut() {
            *yi *= beta;
        }
    }

    if alpha != 0.0 {
        for (val, (row, col)) in a.iter() {
            y[row] += alpha * (*val) * x[col];
        }
    }
}

/// Transpose-vector product: y = alpha * A^T * x + beta * y
pub fn spmv_transpose(a: &SparseCsc, x: &[f64], y: &mut [f64], alpha: f64, beta: f64) {
    assert_eq!(a.rows(), x.len());
    assert_eq!(a.cols(), y.len());

    if beta == 0.0 {
        y.fill(0.0);
    } else if beta != 1.0 {
        for yi in y.iter_mut() {
            *yi *= beta;
        }
    }

    if alpha != 0.0 {
        for (val, (row, col)) in a.iter() {
            y[col] += alpha * (*val) * x[row];
        }
    }
}

/// Convenience wrapper: returns A * x.
pub fn matvec(a: &SparseCsc, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.rows()];
    spmv(a, x, &mut y, 1.0, 0.0);
    y
}

/// Gather `rows` of `a` (in the given order) into a new matrix, scaling every
/// entry by `scale`.
///
/// Row indices must be unique and in range.
pub fn select_rows(a: &SparseCsc, rows: &[usize], scale: f64) -> SparseCsc {
    let mut position = vec![None; a.rows()];
    for (new_row, &orig_row) in rows.iter().enumerate() {
        debug_assert!(position[orig_row].is_none(), "duplicate row {}", orig_row);
        position[orig_row] = Some(new_row);
    }

    let mut tri = TriMat::new((rows.len(), a.cols()));
    for (val, (row, col)) in a.iter() {
        if let Some(new_row) = position[row] {
            tri.add_triplet(new_row, col, scale * (*val));
        }
    }
    tri.to_csc()
}

/// Stack two sparse matrices vertically: [A; B]
pub fn vstack(a: &SparseCsc, b: &SparseCsc) -> SparseCsc {
    assert_eq!(a.cols(), b.cols(), "Matrices must have same number of columns");

    let mut tri = TriMat::new((a.rows() + b.rows(), a.cols()));
    for (val, (row, col)) in a.iter() {
        tri.add_triplet(row, col, *val);
    }
    for (val, (row, col)) in b.iter() {
        tri.add_triplet(row + a.rows(), col, *val);
    }
    tri.to_csc()
}

/// Dense copy of a matrix row, mainly for tests and diagnostics.
pub fn row_dense(a: &SparseCsc, row: usize) -> Vec<f64> {
    let mut out = vec![0.0; a.cols()];
    for (val, (r, col)) in a.iter() {
        if r == row {
            out[col] += *val;
        }
    }
    out
}
