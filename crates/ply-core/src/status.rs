use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlyError {
    #[error("Cannot open PLY file: {0}")]
    FileOpenFailed(String),
    #[error("Header corrupted: {0}")]
    HeaderCorrupted(String),
    #[error("Element row corrupted: {0}")]
    ElementRowCorrupted(String),
    #[error("Required property group missing: {0}")]
    RequiredGroupMissing(String),
    #[error("Unsupported type: {0}")]
    TypeUnsupported(String),
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("Buffer too small: need {required} values, got {provided}")]
    BufferSizeViolation { required: usize, provided: usize },
    #[error("No element is loaded at the cursor")]
    ElementNotLoaded,
    #[error("No element at the cursor")]
    NoElement,
    #[error("Property {0} is not a list property")]
    NotAListProperty(u32),
    #[error("Property {0} is a list property")]
    NotAScalarProperty(u32),
}

pub type PlyResult<T> = Result<T, PlyError>;

impl PlyError {
    /// Returns true for errors caused by malformed file content.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            PlyError::HeaderCorrupted(_)
                | PlyError::ElementRowCorrupted(_)
                | PlyError::TypeUnsupported(_)
        )
    }
}

impl From<std::io::Error> for PlyError {
    fn from(err: std::io::Error) -> Self {
        PlyError::FileOpenFailed(err.to_string())
    }
}

/// Checks a caller-provided buffer against the number of values it must hold.
pub(crate) fn check_capacity(required: usize, provided: usize) -> PlyResult<()> {
    if provided < required {
        return Err(PlyError::BufferSizeViolation { required, provided });
    }
    Ok(())
}
