//! PLY Core Library
//!
//! Reads Stanford PLY files element by element: a header parser, a cursor
//! over the declared elements, semantic property lookup, typed extraction of
//! scalar and list properties, and fan triangulation of polygonal faces.
//!
//! The `c-api` feature exposes the same engine as `ply_reader_*` functions.

#![allow(clippy::needless_range_loop)]

// =============================================================================
// Core modules
// =============================================================================

pub mod decoder_buffer;
pub mod element_data;
pub mod extract;
pub mod header;
pub mod ply_types;
pub mod property_locator;
pub mod reader;
pub mod status;
pub mod triangulation;

#[cfg(feature = "c-api")]
pub mod c_api;

// =============================================================================
// Re-exports
// =============================================================================

pub use decoder_buffer::DecoderBuffer;
pub use element_data::ListColumn;
pub use header::{parse_header, ElementDecl, Format, Header, PropertyDecl, PropertyKind};
pub use ply_types::{PlyScalar, Scalar, ScalarType};
pub use reader::{LoadedElement, PlyReader};
pub use status::{PlyError, PlyResult};
