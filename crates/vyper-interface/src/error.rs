//! Error types for interface normalization and type parsing.
//!
//! Both kinds are per-contract failures: the caller skips the contract and moves on.

use std::fmt;

/// A declared parameter type that the harness generator cannot produce arguments for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedType {
    /// More than two array dimensions (`uint256[2][2][2]`).
    TripleNested { ty: String },
    /// A fixed-size array whose total element count exceeds the cap.
    TooManyElements { ty: String, elements: usize },
    /// Anything that is not a known value type: enums, structs, tuples.
    EnumOrStruct { ty: String },
    /// Unbalanced brackets, zero-length arrays, bad bit widths.
    Malformed { ty: String, reason: &'static str },
}

impl UnsupportedType {
    /// Short stable tag for the rejection reason.
    pub fn kind(&self) -> &'static str {
        match self {
            UnsupportedType::TripleNested { .. } => "triple_nested",
            UnsupportedType::TooManyElements { .. } => "too_many_elements",
            UnsupportedType::EnumOrStruct { .. } => "enum_or_struct",
            UnsupportedType::Malformed { .. } => "malformed",
        }
    }
}

impl fmt::Display for UnsupportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedType::TripleNested { ty } => write!(f, "triple nested: `{}`", ty),
            UnsupportedType::TooManyElements { ty, elements } => write!(
                f,
                "arg array with too many elements: `{}` has {} (max {})",
                ty,
                elements,
                crate::param_type::MAX_STATIC_ARRAY_ELEMENTS
            ),
            UnsupportedType::EnumOrStruct { ty } => write!(f, "enum or struct arg: `{}`", ty),
            UnsupportedType::Malformed { ty, reason } => {
                write!(f, "malformed type `{}`: {}", ty, reason)
            }
        }
    }
}

impl std::error::Error for UnsupportedType {}

/// The compiler's selector table and ABI could not be turned into method descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// A method from the selector table has no entry in the ABI.
    InconsistentInterface { method: String },
    /// A selector-table key is not of the form `name(type,...)`.
    MalformedSignature { signature: String },
    /// A selector is not hex or longer than four bytes.
    MalformedSelector { signature: String, selector: String },
    /// The JSON document does not have the expected shape.
    UnexpectedShape { what: &'static str, detail: String },
    /// A method group is larger than a `uint8` selection index can address.
    TooManyMethods { group: &'static str, count: usize },
}

impl fmt::Display for InterfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceError::InconsistentInterface { method } => write!(
                f,
                "inconsistent interface: `{}` is in the selector table but not in the ABI",
                method
            ),
            InterfaceError::MalformedSignature { signature } => {
                write!(f, "malformed method signature: `{}`", signature)
            }
            InterfaceError::MalformedSelector {
                signature,
                selector,
            } => write!(f, "malformed selector `{}` for `{}`", selector, signature),
            InterfaceError::UnexpectedShape { what, detail } => {
                write!(f, "unexpected {} shape: {}", what, detail)
            }
            InterfaceError::TooManyMethods { group, count } => write!(
                f,
                "{} group has {} methods (max {})",
                group,
                count,
                crate::types::MAX_GROUP_METHODS
            ),
        }
    }
}

impl std::error::Error for InterfaceError {}
