//! Common reader traits.
//!
//! Generic code can load meshes without naming the concrete reader:
//!
//! ```no_run
//! use ply_io::{MeshResult, PlyMesh, PlyMeshReader, Reader};
//!
//! fn load<R: Reader>(path: &str) -> MeshResult<PlyMesh> {
//!     let mut reader = R::open(path)?;
//!     reader.read_mesh()
//! }
//!
//! let mesh = load::<PlyMeshReader>("bunny.ply");
//! ```

use std::path::Path;

use crate::error::{MeshError, MeshResult};
use crate::mesh_loader::PlyMesh;

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> MeshResult<Self>;

    /// Read every mesh in the file.
    fn read_meshes(&mut self) -> MeshResult<Vec<PlyMesh>>;

    /// Read a single mesh from the file.
    ///
    /// Default implementation returns the first mesh from `read_meshes()`.
    fn read_mesh(&mut self) -> MeshResult<PlyMesh> {
        self.read_meshes()?
            .into_iter()
            .next()
            .ok_or(MeshError::VertexDataMissing)
    }
}

/// Readers that can return bare point positions without faces.
pub trait PointCloudReader: Reader {
    fn read_points(&mut self) -> MeshResult<Vec<[f32; 3]>>;
}
