//! Element cursor over an opened PLY file.
//!
//! A [`PlyReader`] walks the declared elements in order. The element at the
//! cursor can be materialized with [`PlyReader::load_element`], which returns
//! a [`LoadedElement`] view borrowing the reader. While that view is alive the
//! cursor cannot move, so extraction always targets the loaded element.
//!
//! ```no_run
//! use ply_core::PlyReader;
//!
//! # fn main() -> Result<(), ply_core::PlyError> {
//! let mut reader = PlyReader::open("bunny.ply")?;
//! while reader.has_element() {
//!     if reader.element_is("vertex") {
//!         let vertices = reader.load_element()?;
//!         if let Some(pos) = vertices.find_pos() {
//!             let xyz: Vec<f32> = vertices.extract_properties_vec(&pos)?;
//!             println!("{} positions", xyz.len() / 3);
//!         }
//!     }
//!     reader.next_element();
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::decoder_buffer::DecoderBuffer;
use crate::element_data::{ElementData, ListColumn};
use crate::header::{parse_header, ElementDecl, Format, Header};
use crate::ply_types::Scalar;
use crate::status::{PlyError, PlyResult};

/// Stateful reader over one PLY document.
#[derive(Debug)]
pub struct PlyReader {
    data: Vec<u8>,
    header: Header,
    /// Index of the element at the cursor.
    current: usize,
    /// Body offset of the element at the cursor.
    pos: usize,
    loaded: Option<ElementData>,
    valid: bool,
}

impl PlyReader {
    /// Opens a PLY file and parses its header.
    ///
    /// The file handle is released before this returns, on success and on
    /// every error path.
    pub fn open<P: AsRef<Path>>(path: P) -> PlyResult<Self> {
        let path = path.as_ref();
        let data = read_file(path)
            .map_err(|err| PlyError::FileOpenFailed(format!("{}: {}", path.display(), err)))?;
        debug!(path = %path.display(), bytes = data.len(), "opened PLY file");
        Self::from_bytes(data)
    }

    /// Parses the header of an in-memory PLY document.
    pub fn from_bytes(data: Vec<u8>) -> PlyResult<Self> {
        let header = parse_header(&data)?;
        let pos = header.data_offset;
        Ok(Self {
            data,
            header,
            current: 0,
            pos,
            loaded: None,
            valid: true,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn format(&self) -> Format {
        self.header.format
    }

    /// False once any element failed to load.
    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn has_element(&self) -> bool {
        self.current < self.header.elements.len()
    }

    /// Declaration of the element at the cursor.
    pub fn element(&self) -> Option<&ElementDecl> {
        self.header.elements.get(self.current)
    }

    pub fn element_index(&self) -> usize {
        self.current
    }

    /// Compares the declared name of the element at the cursor.
    pub fn element_is(&self, name: &str) -> bool {
        self.element().map_or(false, |e| e.name == name)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Row count of the element at the cursor.
    ///
    /// This is the number of rows read once the element is loaded, the
    /// declared count before that, and zero past the last element.
    pub fn num_rows(&self) -> usize {
        match (&self.loaded, self.element()) {
            (Some(data), _) => data.num_rows(),
            (None, Some(decl)) => decl.count,
            (None, None) => 0,
        }
    }

    /// Materializes the rows of the element at the cursor.
    ///
    /// Loading an already loaded element returns the existing view.
    ///
    /// # Errors
    ///
    /// Returns `PlyError::NoElement` past the last element and
    /// `PlyError::ElementRowCorrupted` if the rows do not parse. After a
    /// corruption error the reader is invalid: the cursor may still advance
    /// but no further element can be loaded.
    pub fn load_element(&mut self) -> PlyResult<LoadedElement<'_>> {
        if !self.has_element() {
            return Err(PlyError::NoElement);
        }
        if self.loaded.is_none() {
            if !self.valid {
                return Err(PlyError::ElementRowCorrupted(
                    "an earlier element failed to load".into(),
                ));
            }
            let decl = &self.header.elements[self.current];
            let mut buffer = DecoderBuffer::new(&self.data);
            buffer.set_position(self.pos)?;
            match ElementData::load(decl, self.header.format, &mut buffer) {
                Ok(data) => {
                    debug!(element = %decl.name, rows = data.num_rows(), "loaded element");
                    self.pos = buffer.position();
                    self.loaded = Some(data);
                }
                Err(err) => {
                    warn!(element = %decl.name, error = %err, "failed to load element");
                    self.valid = false;
                    return Err(err);
                }
            }
        }
        self.require_loaded()
    }

    /// View of the loaded element, if the element at the cursor is loaded.
    pub fn loaded(&self) -> Option<LoadedElement<'_>> {
        let data = self.loaded.as_ref()?;
        let decl = self.element()?;
        Some(LoadedElement { decl, data })
    }

    pub fn require_loaded(&self) -> PlyResult<LoadedElement<'_>> {
        self.loaded().ok_or(PlyError::ElementNotLoaded)
    }

    /// Moves the cursor to the next element and drops the loaded rows.
    ///
    /// An element that was never loaded is skipped over.
    pub fn next_element(&mut self) {
        if !self.has_element() {
            return;
        }
        if self.loaded.take().is_none() && self.valid {
            let decl = &self.header.elements[self.current];
            let mut buffer = DecoderBuffer::new(&self.data);
            let skipped = buffer
                .set_position(self.pos)
                .and_then(|_| ElementData::skip(decl, self.header.format, &mut buffer));
            match skipped {
                Ok(()) => self.pos = buffer.position(),
                Err(err) => {
                    warn!(element = %decl.name, error = %err, "failed to skip element");
                    self.valid = false;
                }
            }
        }
        self.current += 1;
    }
}

fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

/// The element currently loaded by a [`PlyReader`].
///
/// Property indices passed to the extraction methods refer to positions in
/// this element's declared property list.
#[derive(Debug, Clone, Copy)]
pub struct LoadedElement<'a> {
    decl: &'a ElementDecl,
    data: &'a ElementData,
}

impl<'a> LoadedElement<'a> {
    pub fn decl(&self) -> &'a ElementDecl {
        self.decl
    }

    pub fn name(&self) -> &'a str {
        &self.decl.name
    }

    pub fn num_rows(&self) -> usize {
        self.data.num_rows()
    }

    pub fn num_properties(&self) -> usize {
        self.decl.properties.len()
    }

    pub(crate) fn scalar_column(&self, prop: u32) -> PlyResult<&'a [Scalar]> {
        self.check_index(prop)?;
        self.data
            .scalar_column(prop)
            .ok_or(PlyError::NotAScalarProperty(prop))
    }

    pub(crate) fn list_column(&self, prop: u32) -> PlyResult<ListColumn<'a>> {
        self.check_index(prop)?;
        self.data
            .list_column(prop)
            .ok_or(PlyError::NotAListProperty(prop))
    }

    fn check_index(&self, prop: u32) -> PlyResult<()> {
        if prop as usize >= self.decl.properties.len() {
            return Err(PlyError::IndexOutOfRange(format!(
                "property {} of element '{}' with {} properties",
                prop,
                self.decl.name,
                self.decl.properties.len()
            )));
        }
        Ok(())
    }
}
