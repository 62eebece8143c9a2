//! Scalar type tags and numeric conversion for PLY property values.

use std::fmt;

use num_traits::{Bounded, NumCast, ToPrimitive, Zero};

/// Numeric type of a PLY property or list component.
///
/// Tag values match the C API's destination type codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int8 = 0,
    Uint8 = 1,
    Int16 = 2,
    Uint16 = 3,
    Int32 = 4,
    Uint32 = 5,
    Float32 = 6,
    Float64 = 7,
}

impl ScalarType {
    /// Parses a header type token. Both the classic (`uchar`, `float`) and
    /// sized (`uint8`, `float32`) spellings are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "char" | "int8" => Some(ScalarType::Int8),
            "uchar" | "uint8" => Some(ScalarType::Uint8),
            "short" | "int16" => Some(ScalarType::Int16),
            "ushort" | "uint16" => Some(ScalarType::Uint16),
            "int" | "int32" => Some(ScalarType::Int32),
            "uint" | "uint32" => Some(ScalarType::Uint32),
            "float" | "float32" => Some(ScalarType::Float32),
            "double" | "float64" => Some(ScalarType::Float64),
            _ => None,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(ScalarType::Int8),
            1 => Some(ScalarType::Uint8),
            2 => Some(ScalarType::Int16),
            3 => Some(ScalarType::Uint16),
            4 => Some(ScalarType::Int32),
            5 => Some(ScalarType::Uint32),
            6 => Some(ScalarType::Float32),
            7 => Some(ScalarType::Float64),
            _ => None,
        }
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn byte_length(&self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::Uint8 => 1,
            ScalarType::Int16 | ScalarType::Uint16 => 2,
            ScalarType::Int32 | ScalarType::Uint32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    pub fn is_integral(&self) -> bool {
        !matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    /// Classic header spelling of this type.
    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "char",
            ScalarType::Uint8 => "uchar",
            ScalarType::Int16 => "short",
            ScalarType::Uint16 => "ushort",
            ScalarType::Int32 => "int",
            ScalarType::Uint32 => "uint",
            ScalarType::Float32 => "float",
            ScalarType::Float64 => "double",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single property value carrying its declared type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Int8(_) => ScalarType::Int8,
            Scalar::Uint8(_) => ScalarType::Uint8,
            Scalar::Int16(_) => ScalarType::Int16,
            Scalar::Uint16(_) => ScalarType::Uint16,
            Scalar::Int32(_) => ScalarType::Int32,
            Scalar::Uint32(_) => ScalarType::Uint32,
            Scalar::Float32(_) => ScalarType::Float32,
            Scalar::Float64(_) => ScalarType::Float64,
        }
    }

    /// Parses an ascii body token as a value of type `ty`.
    pub fn parse(ty: ScalarType, token: &str) -> Option<Self> {
        match ty {
            ScalarType::Int8 => token.parse().ok().map(Scalar::Int8),
            ScalarType::Uint8 => token.parse().ok().map(Scalar::Uint8),
            ScalarType::Int16 => token.parse().ok().map(Scalar::Int16),
            ScalarType::Uint16 => token.parse().ok().map(Scalar::Uint16),
            ScalarType::Int32 => token.parse().ok().map(Scalar::Int32),
            ScalarType::Uint32 => token.parse().ok().map(Scalar::Uint32),
            ScalarType::Float32 => token.parse().ok().map(Scalar::Float32),
            ScalarType::Float64 => token.parse().ok().map(Scalar::Float64),
        }
    }

    /// Converts the value to `T`.
    ///
    /// Widening conversions keep the value. Float to integer truncates toward
    /// zero, float64 to float32 rounds to nearest. Results outside the range of
    /// `T` saturate to its bounds and NaN becomes zero.
    pub fn cast<T: PlyScalar>(self) -> T {
        match self {
            Scalar::Int8(v) => saturating_cast(v),
            Scalar::Uint8(v) => saturating_cast(v),
            Scalar::Int16(v) => saturating_cast(v),
            Scalar::Uint16(v) => saturating_cast(v),
            Scalar::Int32(v) => saturating_cast(v),
            Scalar::Uint32(v) => saturating_cast(v),
            Scalar::Float32(v) => saturating_cast(v),
            Scalar::Float64(v) => saturating_cast(v),
        }
    }

    /// Interprets the value as a non-negative count or vertex index.
    ///
    /// Returns `None` for negative values and NaN.
    pub fn to_index(self) -> Option<usize> {
        match self {
            Scalar::Int8(v) => v.to_usize(),
            Scalar::Uint8(v) => v.to_usize(),
            Scalar::Int16(v) => v.to_usize(),
            Scalar::Uint16(v) => v.to_usize(),
            Scalar::Int32(v) => v.to_usize(),
            Scalar::Uint32(v) => v.to_usize(),
            Scalar::Float32(v) => v.to_usize(),
            Scalar::Float64(v) => v.to_usize(),
        }
    }
}

fn saturating_cast<S, T>(value: S) -> T
where
    S: ToPrimitive + Copy,
    T: PlyScalar,
{
    if let Some(converted) = <T as NumCast>::from(value) {
        return converted;
    }
    match value.to_f64() {
        Some(f) if f.is_nan() => T::zero(),
        Some(f) if f < 0.0 => T::min_value(),
        _ => T::max_value(),
    }
}

/// Rust types that can receive extracted property values.
pub trait PlyScalar: Copy + NumCast + Bounded + Zero + Default + PartialOrd + fmt::Debug + 'static {
    const SCALAR_TYPE: ScalarType;
}

macro_rules! impl_ply_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl PlyScalar for $t {
                const SCALAR_TYPE: ScalarType = ScalarType::$variant;
            }
        )*
    };
}

impl_ply_scalar! {
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tokens() {
        assert_eq!(ScalarType::from_token("uchar"), Some(ScalarType::Uint8));
        assert_eq!(ScalarType::from_token("uint8"), Some(ScalarType::Uint8));
        assert_eq!(ScalarType::from_token("double"), Some(ScalarType::Float64));
        assert_eq!(ScalarType::from_token("int64"), None);
        assert_eq!(ScalarType::from_token("Float"), None);
    }

    #[test]
    fn test_tags_roundtrip() {
        for tag in 0..8 {
            let ty = ScalarType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert_eq!(ScalarType::from_tag(8), None);
        assert_eq!(ScalarType::from_tag(-1), None);
    }

    #[test]
    fn test_byte_lengths() {
        assert_eq!(ScalarType::Uint8.byte_length(), 1);
        assert_eq!(ScalarType::Int16.byte_length(), 2);
        assert_eq!(ScalarType::Float32.byte_length(), 4);
        assert_eq!(ScalarType::Float64.byte_length(), 8);
    }

    #[test]
    fn test_widening_preserves_value() {
        assert_eq!(Scalar::Int8(-7).cast::<i32>(), -7);
        assert_eq!(Scalar::Uint16(65535).cast::<u32>(), 65535);
        assert_eq!(Scalar::Int32(-123456).cast::<f64>(), -123456.0);
        assert_eq!(Scalar::Float32(0.1).cast::<f64>(), 0.1f32 as f64);
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(Scalar::Float32(2.9).cast::<i32>(), 2);
        assert_eq!(Scalar::Float64(-2.9).cast::<i32>(), -2);
        assert_eq!(Scalar::Float64(0.99).cast::<u8>(), 0);
    }

    #[test]
    fn test_out_of_range_saturates() {
        assert_eq!(Scalar::Int32(300).cast::<u8>(), 255);
        assert_eq!(Scalar::Int32(-5).cast::<u8>(), 0);
        assert_eq!(Scalar::Uint32(u32::MAX).cast::<i16>(), i16::MAX);
        assert_eq!(Scalar::Float64(1e20).cast::<i32>(), i32::MAX);
        assert_eq!(Scalar::Float32(f32::NAN).cast::<u32>(), 0);
        assert_eq!(Scalar::Float64(f64::MAX).cast::<f32>(), f32::INFINITY);
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Scalar::parse(ScalarType::Uint8, "4"), Some(Scalar::Uint8(4)));
        assert_eq!(Scalar::parse(ScalarType::Uint8, "256"), None);
        assert_eq!(Scalar::parse(ScalarType::Int32, "1.5"), None);
        assert_eq!(Scalar::parse(ScalarType::Float32, "-1.5e2"), Some(Scalar::Float32(-150.0)));
        assert_eq!(Scalar::parse(ScalarType::Float64, "abc"), None);
    }

    #[test]
    fn test_to_index() {
        assert_eq!(Scalar::Int32(5).to_index(), Some(5));
        assert_eq!(Scalar::Int32(-1).to_index(), None);
        assert_eq!(Scalar::Uint8(0).to_index(), Some(0));
        assert_eq!(Scalar::Float32(f32::NAN).to_index(), None);
    }
}
