//! PLY mesh loading.
//!
//! Builds triangle meshes and point clouds on top of the `ply-core` element
//! reader: positions, optional normals and texture coordinates, and face
//! indices triangulated when a face is not already a triangle.
//!
//! ```no_run
//! use ply_io::{LoaderOptions, PlyMeshReader, Reader};
//!
//! # fn main() -> Result<(), ply_io::MeshError> {
//! let mut reader = PlyMeshReader::open("bunny.ply")?
//!     .with_options(LoaderOptions::new().with_normalize_normals(false));
//! let mesh = reader.read_mesh()?;
//! println!("{} triangles", mesh.num_triangles());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mesh_loader;
pub mod ply_mesh_reader;
pub mod traits;

pub use error::{MeshError, MeshResult};
pub use mesh_loader::{load, load_from_bytes, load_from_reader, load_with_options, LoaderOptions, PlyMesh};
pub use ply_mesh_reader::{read_ply_mesh, read_ply_positions, PlyMeshReader};
pub use traits::{PointCloudReader, Reader};
