//! PLY header grammar.
//!
//! The header is a line-oriented ascii block:
//!
//! ```text
//! ply
//! format binary_little_endian 1.0
//! comment made by hand
//! element vertex 8
//! property float x
//! property float y
//! property float z
//! element face 6
//! property list uchar int vertex_indices
//! end_header
//! ```
//!
//! [`parse_header`] turns it into a [`Header`] and reports where the body
//! starts.

use tracing::debug;

use crate::ply_types::ScalarType;
use crate::status::{PlyError, PlyResult};

/// Body encoding declared by the `format` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl Format {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ascii" => Some(Format::Ascii),
            "binary_little_endian" => Some(Format::BinaryLittleEndian),
            "binary_big_endian" => Some(Format::BinaryBigEndian),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::BinaryLittleEndian => "binary_little_endian",
            Format::BinaryBigEndian => "binary_big_endian",
        }
    }

    pub fn is_binary(&self) -> bool {
        !matches!(self, Format::Ascii)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List {
        count_type: ScalarType,
        value_type: ScalarType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDecl {
    pub fn is_list(&self) -> bool {
        matches!(self.kind, PropertyKind::List { .. })
    }

    /// Type of the stored values (the item type for lists).
    pub fn value_type(&self) -> ScalarType {
        match self.kind {
            PropertyKind::Scalar(ty) => ty,
            PropertyKind::List { value_type, .. } => value_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    pub name: String,
    /// Row count declared in the header.
    pub count: usize,
    pub properties: Vec<PropertyDecl>,
}

impl ElementDecl {
    /// Index of the first property called `name`.
    pub fn find_property(&self, name: &str) -> Option<u32> {
        self.properties
            .iter()
            .position(|p| p.name == name)
            .map(|i| i as u32)
    }

    pub fn property(&self, index: u32) -> Option<&PropertyDecl> {
        self.properties.get(index as usize)
    }

    /// Byte size of one binary row, or `None` if any property is a list.
    pub fn fixed_row_size(&self) -> Option<usize> {
        self.properties.iter().try_fold(0usize, |acc, p| match p.kind {
            PropertyKind::Scalar(ty) => Some(acc + ty.byte_length()),
            PropertyKind::List { .. } => None,
        })
    }
}

/// Parsed header: format, element declarations and where the body begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    pub elements: Vec<ElementDecl>,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    /// Byte offset of the first body byte.
    pub data_offset: usize,
}

impl Header {
    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    ExpectMagic,
    ExpectFormat,
    ReadingBody,
    Done,
}

fn corrupted(line_no: usize, msg: impl std::fmt::Display) -> PlyError {
    PlyError::HeaderCorrupted(format!("line {}: {}", line_no, msg))
}

fn parse_type(token: &str) -> PlyResult<ScalarType> {
    ScalarType::from_token(token).ok_or_else(|| PlyError::TypeUnsupported(token.to_string()))
}

/// Parses the header at the start of `data`.
///
/// # Errors
///
/// Returns `PlyError::HeaderCorrupted` for any grammar violation and
/// `PlyError::TypeUnsupported` for unknown type tokens.
pub fn parse_header(data: &[u8]) -> PlyResult<Header> {
    let mut state = HeaderState::ExpectMagic;
    let mut format = Format::Ascii;
    let mut elements: Vec<ElementDecl> = Vec::new();
    let mut comments = Vec::new();
    let mut obj_info = Vec::new();
    let mut pos = 0usize;
    let mut line_no = 0usize;

    while state != HeaderState::Done {
        if pos >= data.len() {
            return Err(PlyError::HeaderCorrupted("missing end_header".into()));
        }
        let rest = &data[pos..];
        let len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        pos += (len + 1).min(rest.len());
        line_no += 1;

        let raw = std::str::from_utf8(&rest[..len])
            .map_err(|_| corrupted(line_no, "header is not valid text"))?;
        let line = raw.trim_end_matches('\r');
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next();

        match state {
            HeaderState::ExpectMagic => {
                if line.trim() != "ply" {
                    return Err(corrupted(line_no, "first line must be \"ply\""));
                }
                state = HeaderState::ExpectFormat;
            }
            HeaderState::ExpectFormat => match keyword {
                Some("comment") => comments.push(rest_of_line(line, "comment")),
                Some("obj_info") => obj_info.push(rest_of_line(line, "obj_info")),
                Some("format") => {
                    let fmt = tokens.next().ok_or_else(|| corrupted(line_no, "missing format"))?;
                    format = Format::from_token(fmt)
                        .ok_or_else(|| corrupted(line_no, format!("unknown format {:?}", fmt)))?;
                    if tokens.next() != Some("1.0") || tokens.next().is_some() {
                        return Err(corrupted(line_no, "format version must be 1.0"));
                    }
                    state = HeaderState::ReadingBody;
                }
                _ => return Err(corrupted(line_no, "expected format line")),
            },
            HeaderState::ReadingBody => match keyword {
                Some("comment") => comments.push(rest_of_line(line, "comment")),
                Some("obj_info") => obj_info.push(rest_of_line(line, "obj_info")),
                Some("element") => {
                    let (name, count) = match (tokens.next(), tokens.next(), tokens.next()) {
                        (Some(name), Some(count), None) => (name, count),
                        _ => return Err(corrupted(line_no, "expected element <name> <count>")),
                    };
                    let count = count
                        .parse::<usize>()
                        .map_err(|_| corrupted(line_no, format!("invalid element count {:?}", count)))?;
                    elements.push(ElementDecl {
                        name: name.to_string(),
                        count,
                        properties: Vec::new(),
                    });
                }
                Some("property") => {
                    let element = elements
                        .last_mut()
                        .ok_or_else(|| corrupted(line_no, "property declared before any element"))?;
                    let parts: Vec<&str> = tokens.collect();
                    let property = match parts.as_slice() {
                        ["list", count_ty, value_ty, name] => {
                            let count_type = parse_type(count_ty)?;
                            if !count_type.is_integral() {
                                return Err(PlyError::TypeUnsupported(format!(
                                    "list count type {} must be an integer",
                                    count_type
                                )));
                            }
                            PropertyDecl {
                                name: name.to_string(),
                                kind: PropertyKind::List {
                                    count_type,
                                    value_type: parse_type(value_ty)?,
                                },
                            }
                        }
                        [ty, name] if *ty != "list" => PropertyDecl {
                            name: name.to_string(),
                            kind: PropertyKind::Scalar(parse_type(ty)?),
                        },
                        _ => return Err(corrupted(line_no, format!("malformed property {:?}", line))),
                    };
                    element.properties.push(property);
                }
                Some("end_header") if tokens.next().is_none() => state = HeaderState::Done,
                _ => return Err(corrupted(line_no, format!("unexpected line {:?}", line))),
            },
            HeaderState::Done => unreachable!(),
        }
    }

    if elements.is_empty() {
        return Err(PlyError::HeaderCorrupted("no elements declared".into()));
    }

    debug!(
        format = format.as_str(),
        elements = elements.len(),
        data_offset = pos,
        "parsed PLY header"
    );

    Ok(Header {
        format,
        elements,
        comments,
        obj_info,
        data_offset: pos,
    })
}

fn rest_of_line(line: &str, keyword: &str) -> String {
    line.trim_start()
        .strip_prefix(keyword)
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_HEADER: &str = "ply\n\
        format ascii 1.0\n\
        comment simple cube\n\
        element vertex 8\n\
        property float x\n\
        property float y\n\
        property float z\n\
        element face 6\n\
        property list uchar int vertex_indices\n\
        end_header\n";

    #[test]
    fn test_parse_cube_header() {
        let header = parse_header(CUBE_HEADER.as_bytes()).unwrap();
        assert_eq!(header.format, Format::Ascii);
        assert_eq!(header.comments, vec!["simple cube".to_string()]);
        assert_eq!(header.elements.len(), 2);
        assert_eq!(header.data_offset, CUBE_HEADER.len());

        let vertex = &header.elements[0];
        assert_eq!(vertex.name, "vertex");
        assert_eq!(vertex.count, 8);
        assert_eq!(vertex.find_property("y"), Some(1));
        assert_eq!(vertex.fixed_row_size(), Some(12));

        let face = header.element("face").unwrap();
        assert_eq!(face.count, 6);
        assert_eq!(
            face.properties[0].kind,
            PropertyKind::List {
                count_type: ScalarType::Uint8,
                value_type: ScalarType::Int32,
            }
        );
        assert_eq!(face.fixed_row_size(), None);
    }

    #[test]
    fn test_crlf_and_binary_format() {
        let text = "ply\r\nformat binary_big_endian 1.0\r\nelement vertex 1\r\nproperty double x\r\nend_header\r\n";
        let header = parse_header(text.as_bytes()).unwrap();
        assert_eq!(header.format, Format::BinaryBigEndian);
        assert_eq!(header.elements[0].properties[0].value_type(), ScalarType::Float64);
        assert_eq!(header.data_offset, text.len());
    }

    #[test]
    fn test_missing_magic() {
        let err = parse_header(b"format ascii 1.0\nend_header\n").unwrap_err();
        assert!(matches!(err, PlyError::HeaderCorrupted(_)));
    }

    #[test]
    fn test_missing_end_header() {
        let err = parse_header(b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n").unwrap_err();
        assert!(matches!(err, PlyError::HeaderCorrupted(_)));
    }

    #[test]
    fn test_property_without_element() {
        let err = parse_header(b"ply\nformat ascii 1.0\nproperty float x\nend_header\n").unwrap_err();
        assert!(matches!(err, PlyError::HeaderCorrupted(_)));
    }

    #[test]
    fn test_unknown_type_token() {
        let err = parse_header(b"ply\nformat ascii 1.0\nelement vertex 1\nproperty quad x\nend_header\n").unwrap_err();
        assert_eq!(err, PlyError::TypeUnsupported("quad".into()));
    }

    #[test]
    fn test_float_list_count_rejected() {
        let err = parse_header(
            b"ply\nformat ascii 1.0\nelement face 1\nproperty list float int vertex_indices\nend_header\n",
        )
        .unwrap_err();
        assert!(matches!(err, PlyError::TypeUnsupported(_)));
    }

    #[test]
    fn test_unknown_line_is_fatal() {
        let err = parse_header(b"ply\nformat ascii 1.0\nelement vertex 1\nbogus line\nend_header\n").unwrap_err();
        assert!(matches!(err, PlyError::HeaderCorrupted(_)));
    }

    #[test]
    fn test_bad_version_and_format() {
        assert!(parse_header(b"ply\nformat ascii 2.0\nelement v 0\nend_header\n").is_err());
        assert!(parse_header(b"ply\nformat binary 1.0\nelement v 0\nend_header\n").is_err());
    }

    #[test]
    fn test_no_elements() {
        let err = parse_header(b"ply\nformat ascii 1.0\nend_header\n").unwrap_err();
        assert!(matches!(err, PlyError::HeaderCorrupted(_)));
    }

    #[test]
    fn test_obj_info_collected() {
        let header = parse_header(
            b"ply\nformat ascii 1.0\nobj_info scanner 3\nelement vertex 0\nproperty float x\nend_header\n",
        )
        .unwrap();
        assert_eq!(header.obj_info, vec!["scanner 3".to_string()]);
    }
}
