//! Closed set of parameter type categories.
//!
//! Declared ABI types arrive as strings (`uint256`, `bytes4`, `address[2]`, `int8[2][2]`,
//! `uint256[]`). [`ParamType::parse`] turns them into a tagged tree so that every later stage can
//! match exhaustively; anything outside the supported vocabulary is rejected here.
//!
//! Array notation follows the ABI: the right-most bracket group is the outermost dimension, so
//! `uint8[2][]` is a dynamic array of `uint8[2]`.

use serde::Serialize;
use std::fmt;

use crate::error::UnsupportedType;

/// Maximum number of bracket groups in a parameter type.
pub const MAX_ARRAY_DEPTH: usize = 2;

/// Maximum number of elements laid out by a fixed-size array parameter.
pub const MAX_STATIC_ARRAY_ELEMENTS: usize = 4;

/// Scalar type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    Int { bits: u16 },
    Uint { bits: u16 },
    Decimal,
    Bool,
    Address,
    /// `bytesN`, 1 <= N <= 32
    FixedBytes { size: u8 },
    String,
    Bytes,
}

impl ValueKind {
    fn parse(base: &str, ty: &str) -> Result<Self, UnsupportedType> {
        let kind = match base {
            "bool" => ValueKind::Bool,
            "address" => ValueKind::Address,
            "decimal" => ValueKind::Decimal,
            "string" => ValueKind::String,
            "bytes" => ValueKind::Bytes,
            _ => {
                if let Some(bits) = numeric_suffix(base, "uint") {
                    ValueKind::Uint {
                        bits: parse_bits(bits, ty)?,
                    }
                } else if let Some(bits) = numeric_suffix(base, "int") {
                    ValueKind::Int {
                        bits: parse_bits(bits, ty)?,
                    }
                } else if let Some(size) = numeric_suffix(base, "bytes") {
                    ValueKind::FixedBytes {
                        size: parse_byte_size(size, ty)?,
                    }
                } else {
                    return Err(UnsupportedType::EnumOrStruct { ty: ty.to_string() });
                }
            }
        };
        Ok(kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int { bits } => write!(f, "int{}", bits),
            ValueKind::Uint { bits } => write!(f, "uint{}", bits),
            ValueKind::Decimal => write!(f, "decimal"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Address => write!(f, "address"),
            ValueKind::FixedBytes { size } => write!(f, "bytes{}", size),
            ValueKind::String => write!(f, "string"),
            ValueKind::Bytes => write!(f, "bytes"),
        }
    }
}

/// A parsed parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Value(ValueKind),
    Array {
        element: Box<ParamType>,
        /// `None` for a dynamic array.
        len: Option<usize>,
    },
}

impl ParamType {
    /// Parse a declared type string, enforcing the depth and element-count caps.
    pub fn parse(ty: &str) -> Result<Self, UnsupportedType> {
        let ty = ty.trim();
        let (base, dims) = split_dimensions(ty)?;
        if dims.len() > MAX_ARRAY_DEPTH {
            return Err(UnsupportedType::TripleNested { ty: ty.to_string() });
        }

        let mut current = ParamType::Value(ValueKind::parse(base, ty)?);
        for len in dims {
            current = ParamType::array(current, len, ty)?;
        }
        Ok(current)
    }

    fn array(element: ParamType, len: Option<usize>, ty: &str) -> Result<Self, UnsupportedType> {
        let array = ParamType::Array {
            element: Box::new(element),
            len,
        };
        if len.is_some() {
            let elements = array.element_count();
            if elements > MAX_STATIC_ARRAY_ELEMENTS {
                return Err(UnsupportedType::TooManyElements {
                    ty: ty.to_string(),
                    elements,
                });
            }
        }
        Ok(array)
    }

    /// Number of elements a value of this type lays out back to back.
    ///
    /// Fixed dimensions multiply; a dynamic array is a single self-describing element.
    pub fn element_count(&self) -> usize {
        match self {
            ParamType::Value(_) | ParamType::Array { len: None, .. } => 1,
            ParamType::Array {
                element,
                len: Some(n),
            } => match element.as_ref() {
                ParamType::Array { len: Some(_), .. } => n * element.element_count(),
                _ => *n,
            },
        }
    }

    /// The scalar at the bottom of the array nesting.
    pub fn leaf(&self) -> ValueKind {
        match self {
            ParamType::Value(kind) => *kind,
            ParamType::Array { element, .. } => element.leaf(),
        }
    }

    pub fn is_dynamic_array(&self) -> bool {
        matches!(self, ParamType::Array { len: None, .. })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Value(kind) => write!(f, "{}", kind),
            ParamType::Array { element, len } => match len {
                Some(n) => write!(f, "{}[{}]", element, n),
                None => write!(f, "{}[]", element),
            },
        }
    }
}

/// Split `base[a][b]` into `base` and the dimensions in source order.
fn split_dimensions(ty: &str) -> Result<(&str, Vec<Option<usize>>), UnsupportedType> {
    let malformed = |reason| UnsupportedType::Malformed {
        ty: ty.to_string(),
        reason,
    };

    // Brackets inside a tuple belong to its members, not to the tuple itself.
    let search_from = ty.rfind(')').map(|i| i + 1).unwrap_or(0);
    let Some(open) = ty[search_from..].find('[').map(|i| i + search_from) else {
        if ty[search_from..].contains(']') {
            return Err(malformed("unbalanced brackets"));
        }
        if ty.is_empty() {
            return Err(malformed("empty type"));
        }
        return Ok((ty, Vec::new()));
    };

    let base = &ty[..open];
    if base.is_empty() {
        return Err(malformed("missing element type"));
    }

    let mut dims = Vec::new();
    let mut rest = &ty[open..];
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| malformed("unexpected text after array dimension"))?;
        let close = inner
            .find(']')
            .ok_or_else(|| malformed("unbalanced brackets"))?;
        let len_str = inner[..close].trim();
        let len = if len_str.is_empty() {
            None
        } else {
            let n: usize = len_str
                .parse()
                .map_err(|_| malformed("array length is not a number"))?;
            if n == 0 {
                return Err(malformed("zero-length array"));
            }
            Some(n)
        };
        dims.push(len);
        rest = &inner[close + 1..];
    }
    Ok((base, dims))
}

/// `uint256` -> `Some("256")`, `uint` -> `Some("")`, `uintfoo` -> `None`.
fn numeric_suffix<'a>(base: &'a str, prefix: &str) -> Option<&'a str> {
    let suffix = base.strip_prefix(prefix)?;
    suffix
        .chars()
        .all(|c| c.is_ascii_digit())
        .then_some(suffix)
}

fn parse_bits(bits: &str, ty: &str) -> Result<u16, UnsupportedType> {
    if bits.is_empty() {
        return Ok(256);
    }
    match bits.parse::<u16>() {
        Ok(b) if (8..=256).contains(&b) && b % 8 == 0 => Ok(b),
        _ => Err(UnsupportedType::Malformed {
            ty: ty.to_string(),
            reason: "integer width must be a multiple of 8 between 8 and 256",
        }),
    }
}

fn parse_byte_size(size: &str, ty: &str) -> Result<u8, UnsupportedType> {
    match size.parse::<u8>() {
        Ok(s) if (1..=32).contains(&s) => Ok(s),
        _ => Err(UnsupportedType::Malformed {
            ty: ty.to_string(),
            reason: "fixed bytes width must be between 1 and 32",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_types() {
        assert_eq!(
            ParamType::parse("uint256").unwrap(),
            ParamType::Value(ValueKind::Uint { bits: 256 })
        );
        assert_eq!(
            ParamType::parse("int128").unwrap(),
            ParamType::Value(ValueKind::Int { bits: 128 })
        );
        assert_eq!(
            ParamType::parse("bytes4").unwrap(),
            ParamType::Value(ValueKind::FixedBytes { size: 4 })
        );
        assert_eq!(
            ParamType::parse(" address ").unwrap(),
            ParamType::Value(ValueKind::Address)
        );
        assert_eq!(
            ParamType::parse("bytes").unwrap(),
            ParamType::Value(ValueKind::Bytes)
        );
        assert_eq!(
            ParamType::parse("decimal").unwrap(),
            ParamType::Value(ValueKind::Decimal)
        );
    }

    #[test]
    fn test_parse_arrays_outermost_is_last() {
        let ty = ParamType::parse("uint8[2][]").unwrap();
        assert!(ty.is_dynamic_array());
        assert_eq!(ty.to_string(), "uint8[2][]");
        assert_eq!(ty.leaf(), ValueKind::Uint { bits: 8 });
    }

    #[test]
    fn test_element_count_multiplies_fixed_dimensions() {
        assert_eq!(ParamType::parse("uint256[2][2]").unwrap().element_count(), 4);
        assert_eq!(ParamType::parse("uint256[3]").unwrap().element_count(), 3);
        assert_eq!(ParamType::parse("uint256[]").unwrap().element_count(), 1);
        assert_eq!(ParamType::parse("uint256[][2]").unwrap().element_count(), 2);
    }

    #[test]
    fn test_reject_triple_nesting() {
        let err = ParamType::parse("uint256[1][1][1]").unwrap_err();
        assert!(matches!(err, UnsupportedType::TripleNested { .. }));
        let err = ParamType::parse("MyStruct[1][1][1]").unwrap_err();
        assert!(matches!(err, UnsupportedType::TripleNested { .. }));
    }

    #[test]
    fn test_reject_too_many_elements() {
        let err = ParamType::parse("uint256[3][3]").unwrap_err();
        assert_eq!(
            err,
            UnsupportedType::TooManyElements {
                ty: "uint256[3][3]".to_string(),
                elements: 9
            }
        );
        assert!(ParamType::parse("uint256[5]").is_err());
        assert!(ParamType::parse("uint256[5][]").is_err());
        assert!(ParamType::parse("uint256[2][2]").is_ok());
    }

    #[test]
    fn test_reject_enum_struct_and_tuple() {
        for ty in ["MyEnum", "Point", "tuple", "(uint256,address)", "internal", "bytesish"] {
            let err = ParamType::parse(ty).unwrap_err();
            assert!(
                matches!(err, UnsupportedType::EnumOrStruct { .. }),
                "{} -> {:?}",
                ty,
                err
            );
        }
        let err = ParamType::parse("(uint256[2],bool)[2]").unwrap_err();
        assert!(matches!(err, UnsupportedType::EnumOrStruct { .. }));
    }

    #[test]
    fn test_reject_malformed() {
        for ty in ["uint7", "uint512", "bytes33", "bytes0", "uint256[", "uint256]", "[2]", "uint256[x]", "uint256[0]", "uint256[2]x"] {
            let err = ParamType::parse(ty).unwrap_err();
            assert!(
                matches!(err, UnsupportedType::Malformed { .. }),
                "{} -> {:?}",
                ty,
                err
            );
        }
    }
}
