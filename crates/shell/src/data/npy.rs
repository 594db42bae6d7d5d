//! Reading points from npy files.

use std::path::Path;

/// Reads a 2-d array of `f64` or `f32` from a npy file, one point per row.
pub fn read(path: &Path) -> Result<Vec<Vec<f64>>, String> {
    if let Ok(arr) = ndarray_npy::read_npy::<_, ndarray::Array2<f64>>(path) {
        return Ok(rows(&arr.view()));
    }
    let arr: ndarray::Array2<f32> = ndarray_npy::read_npy(path)
        .map_err(|e| format!("Failed to read NPY file at path {}: {e}", path.display()))?;
    Ok(rows(&arr.mapv(f64::from).view()))
}

/// The rows of an array as vectors.
fn rows(arr: &ndarray::ArrayView2<f64>) -> Vec<Vec<f64>> {
    arr.axis_iter(ndarray::Axis(0)).map(|row| row.to_vec()).collect()
}
