//! Fan triangulation of polygonal faces.
//!
//! Every face with `n > 3` indices becomes the fan `(v0, v1, v2), (v0, v2,
//! v3), ..., (v0, vn-2, vn-1)`. This is exact for convex polygons. For a
//! concave polygon the fan can overlap itself; such faces are detected by
//! comparing each fan triangle's orientation against the polygon's Newell
//! normal and reported through `tracing`, but the fan is still emitted, so
//! the triangle indices never depend on vertex positions.

use tracing::debug;

use crate::ply_types::{PlyScalar, Scalar};
use crate::reader::LoadedElement;
use crate::status::{check_capacity, PlyError, PlyResult};

pub type Vec3 = [f32; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Number of triangles a face with `len` indices contributes.
pub fn triangles_for_len(len: usize) -> usize {
    len.saturating_sub(2)
}

/// Polygon normal by Newell's method; its length is twice the polygon area.
pub fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut n = [0.0f32; 3];
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n[0] += (p[1] - q[1]) * (p[2] + q[2]);
        n[1] += (p[2] - q[2]) * (p[0] + q[0]);
        n[2] += (p[0] - q[0]) * (p[1] + q[1]);
    }
    n
}

/// True if every fan triangle from `points[0]` winds the same way as the
/// polygon and has non-zero area.
pub fn is_convex_fan(points: &[Vec3]) -> bool {
    if points.len() < 3 {
        return false;
    }
    // Thresholds scale with the polygon so tiny and huge faces agree.
    let extent = points
        .iter()
        .map(|&p| {
            let d = sub(p, points[0]);
            dot(d, d)
        })
        .fold(0.0f32, f32::max);
    let normal = newell_normal(points);
    let length = dot(normal, normal).sqrt();
    let tolerance = f32::EPSILON * extent;
    if length <= tolerance {
        return false;
    }
    points.windows(2).skip(1).all(|w| {
        let t = cross(sub(w[0], points[0]), sub(w[1], points[0]));
        dot(t, normal) > tolerance * length
    })
}

impl<'a> LoadedElement<'a> {
    /// True if any row of list property `prop` does not have exactly 3 values.
    pub fn requires_triangulation(&self, prop: u32) -> PlyResult<bool> {
        let list = self.list_column(prop)?;
        Ok((0..list.num_rows()).any(|row| list.row_len(row) != 3))
    }

    /// Sum over rows of `max(0, len - 2)`. Rows with fewer than 3 indices
    /// are degenerate and contribute nothing.
    pub fn num_triangles(&self, prop: u32) -> PlyResult<usize> {
        let list = self.list_column(prop)?;
        Ok((0..list.num_rows())
            .map(|row| triangles_for_len(list.row_len(row)))
            .sum())
    }

    /// Writes the fan triangulation of list property `prop` into `dest`,
    /// three indices per triangle, in row order.
    ///
    /// `positions` holds `vertex_count` xyz triples.
    ///
    /// # Errors
    ///
    /// - `PlyError::IndexOutOfRange` if a face references a vertex outside
    ///   `0..vertex_count`
    /// - `PlyError::BufferSizeViolation` if `positions` is shorter than
    ///   `3 * vertex_count` or `dest` is shorter than `3 * num_triangles(prop)`
    pub fn extract_triangles<T: PlyScalar>(
        &self,
        prop: u32,
        positions: &[f32],
        vertex_count: usize,
        dest: &mut [T],
    ) -> PlyResult<()> {
        let list = self.list_column(prop)?;
        check_capacity(vertex_count * 3, positions.len())?;
        check_capacity(self.num_triangles(prop)? * 3, dest.len())?;

        let mut out = 0usize;
        let mut concave = 0usize;
        for (row, face) in list.rows().enumerate() {
            let vertices = face
                .iter()
                .map(|&value| checked_index(value, vertex_count, row))
                .collect::<PlyResult<Vec<usize>>>()?;
            if face.len() < 3 {
                continue;
            }
            if face.len() > 3 {
                let points: Vec<Vec3> = vertices
                    .iter()
                    .map(|&v| [positions[3 * v], positions[3 * v + 1], positions[3 * v + 2]])
                    .collect();
                if !is_convex_fan(&points) {
                    concave += 1;
                }
            }
            for k in 1..face.len() - 1 {
                dest[out] = face[0].cast();
                dest[out + 1] = face[k].cast();
                dest[out + 2] = face[k + 1].cast();
                out += 3;
            }
        }

        if concave > 0 {
            debug!(
                element = %self.name(),
                faces = concave,
                "fan-triangulated non-convex or degenerate polygons"
            );
        }
        Ok(())
    }

    /// Owned variant of [`extract_triangles`](Self::extract_triangles).
    pub fn extract_triangles_vec<T: PlyScalar>(
        &self,
        prop: u32,
        positions: &[f32],
        vertex_count: usize,
    ) -> PlyResult<Vec<T>> {
        let mut out = vec![T::default(); self.num_triangles(prop)? * 3];
        self.extract_triangles(prop, positions, vertex_count, &mut out)?;
        Ok(out)
    }
}

fn checked_index(value: Scalar, vertex_count: usize, row: usize) -> PlyResult<usize> {
    value
        .to_index()
        .filter(|&v| v < vertex_count)
        .ok_or_else(|| {
            PlyError::IndexOutOfRange(format!(
                "face {} references vertex {:?} but only {} vertices exist",
                row, value, vertex_count
            ))
        })
}
