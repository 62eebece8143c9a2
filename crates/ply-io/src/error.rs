use ply_core::PlyError;
use thiserror::Error;

/// Errors reported while loading a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Cannot open PLY file: {0}")]
    FileOpenFailed(String),
    #[error("Vertex element missing")]
    VertexDataMissing,
    #[error("Face element missing")]
    FaceDataMissing,
    #[error("Need vertex positions to triangulate faces")]
    TriangulationNeedsVerts,
    #[error("Corrupted or unsupported PLY file: {0}")]
    Corrupted(PlyError),
}

pub type MeshResult<T> = Result<T, MeshError>;

impl From<PlyError> for MeshError {
    fn from(err: PlyError) -> Self {
        match err {
            PlyError::FileOpenFailed(msg) => MeshError::FileOpenFailed(msg),
            other => MeshError::Corrupted(other),
        }
    }
}
