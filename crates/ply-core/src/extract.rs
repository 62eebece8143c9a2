//! Copying property values out of a loaded element.

use crate::ply_types::PlyScalar;
use crate::reader::LoadedElement;
use crate::status::{check_capacity, PlyResult};

impl<'a> LoadedElement<'a> {
    /// Copies the scalar properties `indices` of every row into `dest`,
    /// row-major: row `i` fills `dest[i * n..(i + 1) * n]` with `n =
    /// indices.len()`. Values are converted with [`Scalar::cast`].
    ///
    /// # Errors
    ///
    /// - `PlyError::IndexOutOfRange` / `PlyError::NotAScalarProperty` for a bad index
    /// - `PlyError::BufferSizeViolation` if `dest` holds fewer than
    ///   `num_rows() * indices.len()` values
    ///
    /// [`Scalar::cast`]: crate::ply_types::Scalar::cast
    pub fn extract_properties<T: PlyScalar>(&self, indices: &[u32], dest: &mut [T]) -> PlyResult<()> {
        let columns = indices
            .iter()
            .map(|&prop| self.scalar_column(prop))
            .collect::<PlyResult<Vec<_>>>()?;
        let stride = columns.len();
        check_capacity(self.num_rows() * stride, dest.len())?;
        if stride == 0 {
            return Ok(());
        }

        for (row, out) in dest.chunks_exact_mut(stride).take(self.num_rows()).enumerate() {
            for (slot, column) in out.iter_mut().zip(&columns) {
                *slot = column[row].cast();
            }
        }
        Ok(())
    }

    /// Owned variant of [`extract_properties`](Self::extract_properties).
    pub fn extract_properties_vec<T: PlyScalar>(&self, indices: &[u32]) -> PlyResult<Vec<T>> {
        let mut out = vec![T::default(); self.num_rows() * indices.len()];
        self.extract_properties(indices, &mut out)?;
        Ok(out)
    }

    /// Total number of list values across all rows of list property `prop`.
    pub fn sum_of_list_counts(&self, prop: u32) -> PlyResult<usize> {
        Ok(self.list_column(prop)?.values().len())
    }

    /// Flattens every row of list property `prop` into `dest`, in row order.
    ///
    /// `dest` must hold at least [`sum_of_list_counts`](Self::sum_of_list_counts)
    /// values. Empty rows contribute nothing.
    pub fn extract_list_property<T: PlyScalar>(&self, prop: u32, dest: &mut [T]) -> PlyResult<()> {
        let values = self.list_column(prop)?.values();
        check_capacity(values.len(), dest.len())?;
        for (slot, value) in dest.iter_mut().zip(values) {
            *slot = value.cast();
        }
        Ok(())
    }

    /// Owned variant of [`extract_list_property`](Self::extract_list_property).
    pub fn extract_list_property_vec<T: PlyScalar>(&self, prop: u32) -> PlyResult<Vec<T>> {
        let mut out = vec![T::default(); self.sum_of_list_counts(prop)?];
        self.extract_list_property(prop, &mut out)?;
        Ok(out)
    }

    /// Length of the list in each row of list property `prop`.
    pub fn list_lengths(&self, prop: u32) -> PlyResult<Vec<usize>> {
        let list = self.list_column(prop)?;
        Ok((0..list.num_rows()).map(|row| list.row_len(row)).collect())
    }
}
