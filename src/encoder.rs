//! Argument encoding for generated call data.
//!
//! Every harness run receives a vector of unconstrained `uint256` slots (`args`). For each declared
//! parameter the generator needs a Solidity expression that turns one slot into a value of that
//! type, with the truncation and sign-extension the type implies. Expressions are ABI-encoded by
//! `abi.encodeWithSelector`, so scalars are widened back to a full word after truncation.
//!
//! Parsing (and rejection of unsupported types) lives in [`vyper_interface::ParamType`]; rendering
//! here is total over the parsed type.

use std::fmt;

use vyper_interface::{ParamType, UnsupportedType, ValueKind};

/// Name of the slot vector in the generated test.
pub const ARGS_VAR: &str = "args";

/// Width Vyper uses for `decimal` values.
pub const DECIMAL_BITS: u16 = 168;

/// Literal used for every `string` argument.
pub const STRING_PLACEHOLDER: &str = "\"TestString\"";

/// Literal used for every `bytes` argument.
pub const BYTES_PLACEHOLDER: &str = "hex\"00010203\"";

/// A Solidity expression producing one encoded argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodingExpression(String);

impl EncodingExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a declared type string reading from slot `slot`.
pub fn encode_type(ty: &str, slot: usize) -> Result<EncodingExpression, UnsupportedType> {
    let parsed = ParamType::parse(ty)?;
    Ok(encode_param(&parsed, slot))
}

/// Encode an already parsed type reading from slot `slot`.
pub fn encode_param(ty: &ParamType, slot: usize) -> EncodingExpression {
    EncodingExpression(render(ty, slot))
}

fn render(ty: &ParamType, slot: usize) -> String {
    match ty {
        ParamType::Value(kind) => render_value(*kind, slot),
        // The length word makes any element count valid.
        ParamType::Array { element, len: None } => {
            format!("abi.encode({})", render(element, slot))
        }
        // Static elements are laid out back to back, so nested fixed dimensions flatten.
        ParamType::Array {
            element,
            len: Some(_),
        } => {
            let unit = if element.is_dynamic_array() {
                render(element, slot)
            } else {
                render_value(ty.leaf(), slot)
            };
            let copies = vec![unit; ty.element_count()];
            format!("abi.encodePacked({})", copies.join(", "))
        }
    }
}

fn render_value(kind: ValueKind, slot: usize) -> String {
    let arg = format!("{}[{}]", ARGS_VAR, slot);
    match kind {
        // Through the same-width unsigned type so the bit pattern is reinterpreted, then
        // sign-extended to a word.
        ValueKind::Int { bits } => format!("int256(int{bits}(uint{bits}({arg})))"),
        ValueKind::Uint { bits } => format!("uint256(uint{bits}({arg}))"),
        ValueKind::Decimal => format!("uint256(uint{}({}))", DECIMAL_BITS, arg),
        ValueKind::Bool => format!("uint256({arg} > 0 ? 1 : 0)"),
        ValueKind::Address => format!("uint256(uint160({arg}))"),
        ValueKind::FixedBytes { size: 32 } => format!("bytes32({arg})"),
        ValueKind::FixedBytes { size } => format!("bytes32(bytes{size}(bytes32({arg})))"),
        ValueKind::String => STRING_PLACEHOLDER.to_string(),
        ValueKind::Bytes => BYTES_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(ty: &str, slot: usize) -> String {
        encode_type(ty, slot).unwrap().into_string()
    }

    #[test]
    fn test_value_types() {
        assert_eq!(enc("uint256", 1), "uint256(uint256(args[1]))");
        assert_eq!(enc("uint8", 3), "uint256(uint8(args[3]))");
        assert_eq!(enc("int128", 2), "int256(int128(uint128(args[2])))");
        assert_eq!(enc("decimal", 1), "uint256(uint168(args[1]))");
        assert_eq!(enc("bool", 4), "uint256(args[4] > 0 ? 1 : 0)");
        assert_eq!(enc("address", 1), "uint256(uint160(args[1]))");
        assert_eq!(enc("bytes32", 5), "bytes32(args[5])");
        assert_eq!(enc("bytes4", 5), "bytes32(bytes4(bytes32(args[5])))");
    }

    #[test]
    fn test_string_and_bytes_ignore_slot() {
        assert_eq!(enc("string", 1), STRING_PLACEHOLDER);
        assert_eq!(enc("string", 42), STRING_PLACEHOLDER);
        assert_eq!(enc("bytes", 7), BYTES_PLACEHOLDER);
    }

    #[test]
    fn test_dynamic_array_wraps_with_length_prefix() {
        assert_eq!(enc("address[]", 2), "abi.encode(uint256(uint160(args[2])))");
        assert_eq!(
            enc("uint8[2][]", 1),
            "abi.encode(abi.encodePacked(uint256(uint8(args[1])), uint256(uint8(args[1]))))"
        );
    }

    #[test]
    fn test_fixed_arrays_pack_element_copies() {
        assert_eq!(
            enc("bool[3]", 1),
            "abi.encodePacked(uint256(args[1] > 0 ? 1 : 0), uint256(args[1] > 0 ? 1 : 0), uint256(args[1] > 0 ? 1 : 0))"
        );
        let two_by_two = enc("uint256[2][2]", 0);
        assert_eq!(two_by_two.matches("uint256(uint256(args[0]))").count(), 4);
        assert!(two_by_two.starts_with("abi.encodePacked("));
        assert_eq!(
            enc("uint256[][2]", 1),
            "abi.encodePacked(abi.encode(uint256(uint256(args[1]))), abi.encode(uint256(uint256(args[1]))))"
        );
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            encode_type("uint256[3][3]", 1),
            Err(UnsupportedType::TooManyElements { elements: 9, .. })
        ));
        assert!(matches!(
            encode_type("uint256[1][1][1]", 1),
            Err(UnsupportedType::TripleNested { .. })
        ));
        assert!(matches!(
            encode_type("Roles", 1),
            Err(UnsupportedType::EnumOrStruct { .. })
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for ty in ["int64", "uint256[2][2]", "bytes7[]", "string", "address[4]"] {
            for slot in [0, 1, 17] {
                assert_eq!(encode_type(ty, slot), encode_type(ty, slot));
                assert!(!enc(ty, slot).is_empty());
            }
        }
    }
}
