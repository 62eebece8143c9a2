//! File-backed PLY mesh reader.

use std::path::{Path, PathBuf};

use crate::error::{MeshError, MeshResult};
use crate::mesh_loader::{load_with_options, LoaderOptions, PlyMesh};
use crate::traits::{PointCloudReader, Reader};

/// Reads triangle meshes and point clouds from a PLY file.
///
/// The file is parsed on every read, so reads are repeatable.
#[derive(Debug, Clone)]
pub struct PlyMeshReader {
    path: PathBuf,
    options: LoaderOptions,
}

impl PlyMeshReader {
    /// Open a PLY file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(MeshError::FileOpenFailed(format!("File not found: {}", path.display())));
        }
        Ok(Self {
            path,
            options: LoaderOptions::default(),
        })
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_mesh(&mut self) -> MeshResult<PlyMesh> {
        load_with_options(&self.path, &self.options)
    }
}

impl Reader for PlyMeshReader {
    fn open<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        PlyMeshReader::open(path)
    }

    fn read_meshes(&mut self) -> MeshResult<Vec<PlyMesh>> {
        Ok(vec![self.read_mesh()?])
    }
}

impl PointCloudReader for PlyMeshReader {
    fn read_points(&mut self) -> MeshResult<Vec<[f32; 3]>> {
        let options = self.options.clone().with_require_faces(false);
        Ok(load_with_options(&self.path, &options)?.positions)
    }
}

/// Read a triangle mesh from a PLY file with default options.
pub fn read_ply_mesh<P: AsRef<Path>>(path: P) -> MeshResult<PlyMesh> {
    PlyMeshReader::open(path)?.read_mesh()
}

/// Read vertex positions from a PLY file, ignoring any faces.
pub fn read_ply_positions<P: AsRef<Path>>(path: P) -> MeshResult<Vec<[f32; 3]>> {
    PlyMeshReader::open(path)?.read_points()
}
