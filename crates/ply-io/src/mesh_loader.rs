//! Triangle mesh loading.
//!
//! Walks the elements of a PLY file, reads positions with optional normals
//! and texture coordinates from the `vertex` element, and reads the face
//! index lists from the `face` element. Polygonal faces are fan triangulated.
//! Other elements are skipped.

use std::path::Path;

use ply_core::{LoadedElement, PlyError, PlyReader};
use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};

/// Triangle mesh read from a PLY file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlyMesh {
    pub positions: Vec<[f32; 3]>,
    /// Empty unless the vertex element declares `nx ny nz`.
    pub normals: Vec<[f32; 3]>,
    /// Empty unless the vertex element declares a texture coordinate pair.
    pub texcoords: Vec<[f32; 2]>,
    /// Three vertex indices per triangle.
    pub indices: Vec<u32>,
}

impl PlyMesh {
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }
}

/// Options controlling how a mesh is loaded.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    normalize_normals: bool,
    require_faces: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            normalize_normals: true,
            require_faces: true,
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescale stored normals to unit length (default: true).
    pub fn with_normalize_normals(mut self, normalize: bool) -> Self {
        self.normalize_normals = normalize;
        self
    }

    /// Fail with [`MeshError::FaceDataMissing`] when no face element is found
    /// (default: true). Disable to load point clouds.
    pub fn with_require_faces(mut self, require: bool) -> Self {
        self.require_faces = require;
        self
    }

    pub fn normalize_normals(&self) -> bool {
        self.normalize_normals
    }

    pub fn require_faces(&self) -> bool {
        self.require_faces
    }
}

/// Loads a mesh from `path` with default options.
pub fn load<P: AsRef<Path>>(path: P) -> MeshResult<PlyMesh> {
    load_with_options(path, &LoaderOptions::default())
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_with_options<P: AsRef<Path>>(path: P, options: &LoaderOptions) -> MeshResult<PlyMesh> {
    let reader = PlyReader::open(path)?;
    load_from_reader(reader, options)
}

/// Loads a mesh from an in-memory PLY document.
pub fn load_from_bytes(data: Vec<u8>, options: &LoaderOptions) -> MeshResult<PlyMesh> {
    let reader = PlyReader::from_bytes(data)?;
    load_from_reader(reader, options)
}

/// Loads a mesh from a freshly opened reader.
///
/// Only the first `vertex` element with `x y z` and the first `face` element
/// with an index list are used.
///
/// # Errors
///
/// - `MeshError::Corrupted` if any visited element fails to load
/// - `MeshError::TriangulationNeedsVerts` if polygonal faces come before the
///   vertex positions
/// - `MeshError::VertexDataMissing` / `MeshError::FaceDataMissing` if the
///   file lacks either part
pub fn load_from_reader(mut reader: PlyReader, options: &LoaderOptions) -> MeshResult<PlyMesh> {
    let mut mesh = PlyMesh::default();
    let mut got_verts = false;
    let mut got_faces = false;

    while reader.has_element() {
        if !got_verts && reader.element_is("vertex") {
            let vertices = reader.load_element()?;
            got_verts = read_vertices(&vertices, options, &mut mesh)?;
        } else if !got_faces && reader.element_is("face") {
            let faces = reader.load_element()?;
            if let Some(prop) = faces.find_indices() {
                mesh.indices = read_faces(&faces, prop, got_verts.then_some(&mesh.positions[..]))?;
                got_faces = true;
            }
        } else if let Some(element) = reader.element() {
            debug!(element = %element.name, "skipping element");
        }
        reader.next_element();
    }

    if !got_verts {
        return Err(MeshError::VertexDataMissing);
    }
    if got_faces {
        check_indices(&mesh)?;
    } else if options.require_faces() {
        return Err(MeshError::FaceDataMissing);
    }

    info!(
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        normals = mesh.has_normals(),
        texcoords = mesh.has_texcoords(),
        "loaded PLY mesh"
    );
    Ok(mesh)
}

/// Returns false if the element has no positions.
fn read_vertices(vertices: &LoadedElement<'_>, options: &LoaderOptions, mesh: &mut PlyMesh) -> MeshResult<bool> {
    let Some(pos) = vertices.find_pos() else {
        return Ok(false);
    };
    mesh.positions = triples(&vertices.extract_properties_vec(&pos)?);

    if let Some(normal) = vertices.find_normal() {
        mesh.normals = triples(&vertices.extract_properties_vec(&normal)?);
        if options.normalize_normals() {
            mesh.normals.iter_mut().for_each(normalize);
        }
    }

    if let Some(uv) = vertices.find_texcoord() {
        let values: Vec<f32> = vertices.extract_properties_vec(&uv)?;
        mesh.texcoords = values.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
    }
    Ok(true)
}

fn read_faces(faces: &LoadedElement<'_>, prop: u32, positions: Option<&[[f32; 3]]>) -> MeshResult<Vec<u32>> {
    if !faces.requires_triangulation(prop)? {
        let flat: Vec<i32> = faces.extract_list_property_vec(prop)?;
        return to_indices(flat);
    }
    let positions = positions.ok_or(MeshError::TriangulationNeedsVerts)?;
    let flat: Vec<f32> = positions.iter().flatten().copied().collect();
    let triangles = faces.extract_triangles_vec(prop, &flat, positions.len())?;
    Ok(triangles)
}

fn to_indices(values: Vec<i32>) -> MeshResult<Vec<u32>> {
    values
        .into_iter()
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                MeshError::Corrupted(PlyError::IndexOutOfRange(format!("negative vertex index {}", v)))
            })
        })
        .collect()
}

fn check_indices(mesh: &PlyMesh) -> MeshResult<()> {
    let count = mesh.num_vertices();
    match mesh.indices.iter().find(|&&i| i as usize >= count) {
        Some(i) => Err(MeshError::Corrupted(PlyError::IndexOutOfRange(format!(
            "vertex index {} but only {} vertices exist",
            i, count
        )))),
        None => Ok(()),
    }
}

fn triples(values: &[f32]) -> Vec<[f32; 3]> {
    values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn normalize(n: &mut [f32; 3]) {
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 0.0 {
        n.iter_mut().for_each(|c| *c /= len);
    }
}
