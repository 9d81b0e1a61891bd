//! MATLAB .mat problem loader.
//!
//! Problem files hold `P, q, r, A, l, u, n, m` describing
//!
//! ```text
//! minimize    (1/2) x'Px + q'x + r
//! subject to  l <= Ax <= u
//! ```
//!
//! Note: the matfile crate (v0.5) skips sparse arrays, so only files that
//! store `P` and `A` as dense matrices can be read. A sparse `A` surfaces
//! as a missing-array error.

use std::path::Path;

use anyhow::{bail, Context, Result};
use matfile::{MatFile, NumericData};
use qp_core::linalg::sparse;
use qp_core::RawQP;

/// Parse a MATLAB .mat file into a [`RawQP`] and check its dimensions.
pub fn parse_mat<P: AsRef<Path>>(path: P) -> Result<RawQP> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mat = MatFile::parse(file)
        .with_context(|| format!("Failed to parse MAT file {}", path.display()))?;

    let n = get_dimension(&mat, "n")?;
    let m = get_dimension(&mat, "m")?;

    let q = get_vector(&mat, "q")?;
    let l = get_vector(&mat, "l")?;
    let u = get_vector(&mat, "u")?;
    let r = if mat.find_by_name("r").is_some() {
        get_scalar(&mat, "r")?
    } else {
        0.0
    };

    let p = match mat.find_by_name("P") {
        Some(_) => get_matrix(&mat, "P")?,
        None => sparse::zeros(n, n),
    };
    let a = get_matrix(&mat, "A")?;

    let qp = RawQP {
        P: p,
        q,
        r,
        A: a,
        l,
        u,
        n,
        m,
    };
    qp.validate()
        .with_context(|| format!("Malformed problem in {}", path.display()))?;
    Ok(qp)
}

/// Extract a scalar value from a MAT file.
fn get_scalar(mat: &MatFile, name: &str) -> Result<f64> {
    let array = mat
        .find_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("Missing array: {}", name))?;

    let first = match array.data() {
        NumericData::Double { real, .. } => real.first().copied(),
        NumericData::Single { real, .. } => real.first().map(|&x| x as f64),
        NumericData::Int64 { real, .. } => real.first().map(|&x| x as f64),
        NumericData::UInt64 { real, .. } => real.first().map(|&x| x as f64),
        NumericData::Int32 { real, .. } => real.first().map(|&x| x as f64),
        NumericData::UInt32 { real, .. } => real.first().map(|&x| x as f64),
        _ => bail!("Unsupported numeric type for {}", name),
    };
    first.ok_or_else(|| anyhow::anyhow!("Empty array: {}", name))
}

/// Dimensions are stored as doubles; insist on a nonnegative integer.
fn get_dimension(mat: &MatFile, name: &str) -> Result<usize> {
    let v = get_scalar(mat, name)?;
    if v < 0.0 || v.fract() != 0.0 || !v.is_finite() {
        bail!("Dimension {} = {} is not a nonnegative integer", name, v);
    }
    Ok(v as usize)
}

/// Extract a vector from a MAT file.
fn get_vector(mat: &MatFile, name: &str) -> Result<Vec<f64>> {
    let array = mat
        .find_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("Missing array: {}", name))?;

    match array.data() {
        NumericData::Double { real, .. } => Ok(real.clone()),
        NumericData::Single { real, .. } => Ok(real.iter().map(|&x| x as f64).collect()),
        _ => bail!("Unsupported numeric type for vector {}", name),
    }
}

/// Extract a dense matrix from a MAT file as a CSC matrix.
fn get_matrix(mat: &MatFile, name: &str) -> Result<sparse::SparseCsc> {
    let array = mat.find_by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Missing array: {} (note: sparse arrays not supported by matfile crate)",
            name
        )
    })?;

    let shape = array.size();
    if shape.len() != 2 {
        bail!("Expected 2D array for {}, got {}D", name, shape.len());
    }
    let (nrows, ncols) = (shape[0], shape[1]);

    let values: Vec<f64> = match array.data() {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => real.iter().map(|&x| x as f64).collect(),
        _ => bail!("Unsupported numeric type for matrix {}", name),
    };

    dense_to_csc(&values, nrows, ncols).with_context(|| format!("Bad matrix {}", name))
}

/// Convert a column-major dense array into CSC, keeping nonzeros only.
pub fn dense_to_csc(values: &[f64], nrows: usize, ncols: usize) -> Result<sparse::SparseCsc> {
    if values.len() != nrows * ncols {
        bail!(
            "{} values for a {}x{} matrix",
            values.len(),
            nrows,
            ncols
        );
    }

    let triplets = (0..ncols).flat_map(|col| {
        (0..nrows).filter_map(move |row| {
            let val = values[row + col * nrows];
            (val != 0.0).then_some((row, col, val))
        })
    });
    Ok(sparse::from_triplets(nrows, ncols, triplets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_to_csc_column_major() {
        // [1 0 3]
        // [0 2 0]
        let a = dense_to_csc(&[1.0, 0.0, 0.0, 2.0, 3.0, 0.0], 2, 3).unwrap();
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 3);
        assert_eq!(a.nnz(), 3);
        assert_eq!(sparse::row_dense(&a, 0), vec![1.0, 0.0, 3.0]);
        assert_eq!(sparse::row_dense(&a, 1), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_dense_to_csc_length_mismatch() {
        assert!(dense_to_csc(&[1.0, 2.0, 3.0], 2, 2).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = parse_mat("/nonexistent/HS21.mat").unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
