//! Resolution of semantic property groups to property indices.

use crate::reader::LoadedElement;
use crate::status::{PlyError, PlyResult};

pub const POSITION_NAMES: &[[&str; 3]] = &[["x", "y", "z"]];
pub const NORMAL_NAMES: &[[&str; 3]] = &[["nx", "ny", "nz"]];
pub const TEXCOORD_NAMES: &[[&str; 2]] = &[
    ["u", "v"],
    ["s", "t"],
    ["texture_u", "texture_v"],
    ["texture_s", "texture_t"],
];
pub const INDEX_LIST_NAMES: &[[&str; 1]] = &[["vertex_indices"], ["vertex_index"]];

impl<'a> LoadedElement<'a> {
    /// Index of the first property called `name`.
    pub fn find_property(&self, name: &str) -> Option<u32> {
        self.decl().find_property(name)
    }

    /// Resolves the first candidate name set whose names all exist on this
    /// element. Matching is exact and case-sensitive.
    pub fn find_group<const N: usize>(&self, candidates: &[[&str; N]]) -> Option<[u32; N]> {
        candidates.iter().find_map(|names| {
            let mut indices = [0u32; N];
            for (slot, name) in indices.iter_mut().zip(names.iter()) {
                *slot = self.find_property(name)?;
            }
            Some(indices)
        })
    }

    pub fn find_pos(&self) -> Option<[u32; 3]> {
        self.find_group(POSITION_NAMES)
    }

    pub fn find_normal(&self) -> Option<[u32; 3]> {
        self.find_group(NORMAL_NAMES)
    }

    pub fn find_texcoord(&self) -> Option<[u32; 2]> {
        self.find_group(TEXCOORD_NAMES)
    }

    /// Index of the face vertex-index list property.
    ///
    /// Only list-typed properties qualify.
    pub fn find_indices(&self) -> Option<u32> {
        let [index] = self.find_group(INDEX_LIST_NAMES)?;
        self.decl()
            .property(index)
            .filter(|p| p.is_list())
            .map(|_| index)
    }

    /// Like [`find_pos`](Self::find_pos) but missing positions are an error.
    pub fn require_pos(&self) -> PlyResult<[u32; 3]> {
        self.find_pos().ok_or_else(|| {
            PlyError::RequiredGroupMissing(format!("element '{}' has no x/y/z properties", self.name()))
        })
    }

    /// Like [`find_indices`](Self::find_indices) but a missing list is an error.
    pub fn require_indices(&self) -> PlyResult<u32> {
        self.find_indices().ok_or_else(|| {
            PlyError::RequiredGroupMissing(format!("element '{}' has no vertex index list", self.name()))
        })
    }
}
