//! Materialized row data for one element.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::decoder_buffer::DecoderBuffer;
use crate::header::{ElementDecl, Format, PropertyKind};
use crate::ply_types::{Scalar, ScalarType};
use crate::status::{PlyError, PlyResult};

/// Values of one property across all rows of an element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Column {
    Scalar(Vec<Scalar>),
    /// `starts` holds one offset per row plus a final end offset into `values`.
    List { starts: Vec<usize>, values: Vec<Scalar> },
}

/// Borrowed view of a list column.
#[derive(Debug, Clone, Copy)]
pub struct ListColumn<'a> {
    starts: &'a [usize],
    values: &'a [Scalar],
}

impl<'a> ListColumn<'a> {
    pub fn num_rows(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.starts[row + 1] - self.starts[row]
    }

    pub fn row(&self, row: usize) -> &'a [Scalar] {
        &self.values[self.starts[row]..self.starts[row + 1]]
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [Scalar]> + 'a {
        let starts = self.starts;
        let values = self.values;
        starts.windows(2).map(move |w| &values[w[0]..w[1]])
    }

    /// All list values of all rows, in row order.
    pub fn values(&self) -> &'a [Scalar] {
        self.values
    }
}

/// Row data of the element currently loaded by a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    rows: usize,
    columns: Vec<Column>,
}

impl ElementData {
    /// Every row takes at least one byte of `buffer`, so the declared count
    /// is capped by what is left before reserving row storage.
    fn new(decl: &ElementDecl, buffer: &DecoderBuffer<'_>) -> Self {
        let rows = decl.count.min(buffer.remaining_size());
        let columns = decl
            .properties
            .iter()
            .map(|p| match p.kind {
                PropertyKind::Scalar(_) => Column::Scalar(Vec::with_capacity(rows)),
                PropertyKind::List { .. } => {
                    let mut starts = Vec::with_capacity(rows.saturating_add(1));
                    starts.push(0);
                    Column::List {
                        starts,
                        values: Vec::new(),
                    }
                }
            })
            .collect();
        Self { rows: 0, columns }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn scalar_column(&self, prop: u32) -> Option<&[Scalar]> {
        match self.columns.get(prop as usize)? {
            Column::Scalar(values) => Some(values),
            Column::List { .. } => None,
        }
    }

    pub(crate) fn list_column(&self, prop: u32) -> Option<ListColumn<'_>> {
        match self.columns.get(prop as usize)? {
            Column::List { starts, values } => Some(ListColumn { starts, values }),
            Column::Scalar(_) => None,
        }
    }

    /// Reads every declared row of `decl` from `buffer`.
    ///
    /// # Errors
    ///
    /// Returns `PlyError::ElementRowCorrupted` if any row is truncated or
    /// malformed. The buffer position is unspecified afterwards.
    pub fn load(decl: &ElementDecl, format: Format, buffer: &mut DecoderBuffer<'_>) -> PlyResult<Self> {
        match format {
            Format::Ascii => Self::load_ascii(decl, buffer),
            Format::BinaryLittleEndian => Self::load_binary::<LittleEndian>(decl, buffer),
            Format::BinaryBigEndian => Self::load_binary::<BigEndian>(decl, buffer),
        }
    }

    /// Moves `buffer` past the rows of `decl` without keeping them.
    pub fn skip(decl: &ElementDecl, format: Format, buffer: &mut DecoderBuffer<'_>) -> PlyResult<()> {
        match (format, decl.fixed_row_size()) {
            (Format::Ascii, _) => {
                for row in 0..decl.count {
                    if buffer.decode_line().is_none() {
                        return Err(premature_end(decl, row));
                    }
                }
                Ok(())
            }
            (_, Some(row_size)) => {
                let total = row_size
                    .checked_mul(decl.count)
                    .ok_or_else(|| PlyError::ElementRowCorrupted(format!("element '{}' is too large", decl.name)))?;
                buffer.decode_slice(total).map(|_| ())
            }
            // Rows with lists have no fixed width; walk them.
            _ => Self::load(decl, format, buffer).map(|_| ()),
        }
    }

    fn load_binary<E: ByteOrder>(decl: &ElementDecl, buffer: &mut DecoderBuffer<'_>) -> PlyResult<Self> {
        let mut data = Self::new(decl, buffer);
        if decl.properties.is_empty() {
            // Empty rows occupy no bytes.
            data.rows = decl.count;
            return Ok(data);
        }
        for row in 0..decl.count {
            for (decl_prop, column) in decl.properties.iter().zip(data.columns.iter_mut()) {
                match (decl_prop.kind, column) {
                    (PropertyKind::Scalar(ty), Column::Scalar(values)) => {
                        values.push(decode_binary::<E>(buffer, ty, decl, row)?);
                    }
                    (PropertyKind::List { count_type, value_type }, Column::List { starts, values }) => {
                        let count = decode_binary::<E>(buffer, count_type, decl, row)?
                            .to_index()
                            .ok_or_else(|| bad_count(decl, row))?;
                        if count.saturating_mul(value_type.byte_length()) > buffer.remaining_size() {
                            return Err(premature_end(decl, row));
                        }
                        for _ in 0..count {
                            values.push(decode_binary::<E>(buffer, value_type, decl, row)?);
                        }
                        starts.push(values.len());
                    }
                    _ => unreachable!("columns are built from the same declaration"),
                }
            }
            data.rows += 1;
        }
        Ok(data)
    }

    fn load_ascii(decl: &ElementDecl, buffer: &mut DecoderBuffer<'_>) -> PlyResult<Self> {
        let mut data = Self::new(decl, buffer);
        for row in 0..decl.count {
            let line = buffer.decode_line().ok_or_else(|| premature_end(decl, row))?;
            let mut tokens = line.split_whitespace();
            for (decl_prop, column) in decl.properties.iter().zip(data.columns.iter_mut()) {
                match (decl_prop.kind, column) {
                    (PropertyKind::Scalar(ty), Column::Scalar(values)) => {
                        values.push(parse_token(tokens.next(), ty, decl, row)?);
                    }
                    (PropertyKind::List { count_type, value_type }, Column::List { starts, values }) => {
                        let count = parse_token(tokens.next(), count_type, decl, row)?
                            .to_index()
                            .ok_or_else(|| bad_count(decl, row))?;
                        for _ in 0..count {
                            values.push(parse_token(tokens.next(), value_type, decl, row)?);
                        }
                        starts.push(values.len());
                    }
                    _ => unreachable!("columns are built from the same declaration"),
                }
            }
            if tokens.next().is_some() {
                return Err(PlyError::ElementRowCorrupted(format!(
                    "element '{}' row {}: too many tokens",
                    decl.name, row
                )));
            }
            data.rows += 1;
        }
        Ok(data)
    }
}

fn decode_binary<E: ByteOrder>(
    buffer: &mut DecoderBuffer<'_>,
    ty: ScalarType,
    decl: &ElementDecl,
    row: usize,
) -> PlyResult<Scalar> {
    buffer
        .decode_scalar::<E>(ty)
        .map_err(|_| premature_end(decl, row))
}

fn parse_token(token: Option<&str>, ty: ScalarType, decl: &ElementDecl, row: usize) -> PlyResult<Scalar> {
    let token = token.ok_or_else(|| {
        PlyError::ElementRowCorrupted(format!("element '{}' row {}: too few tokens", decl.name, row))
    })?;
    Scalar::parse(ty, token).ok_or_else(|| {
        PlyError::ElementRowCorrupted(format!(
            "element '{}' row {}: {:?} is not a valid {}",
            decl.name, row, token, ty
        ))
    })
}

fn premature_end(decl: &ElementDecl, row: usize) -> PlyError {
    PlyError::ElementRowCorrupted(format!(
        "element '{}' ended after {} of {} rows",
        decl.name, row, decl.count
    ))
}

fn bad_count(decl: &ElementDecl, row: usize) -> PlyError {
    PlyError::ElementRowCorrupted(format!("element '{}' row {}: invalid list count", decl.name, row))
}
