//! Vyper Interface
//!
//! Interface model for compiled Vyper contracts.
//!
//! This crate turns the raw output of the Vyper compiler (`-f method_identifiers` and `-f abi`)
//! into a uniform list of method descriptors, and parses declared parameter types into a closed
//! set of type categories that downstream code generators can match on exhaustively.
//!
//! # Features
//!
//! - **Type parsing**: `uint256`, `bytes4`, `address[2]`, `int128[2][2]`, `uint8[]`, ...
//! - **Interface normalization**: selector table + ABI into [`MethodDescriptor`]s
//! - **Method grouping**: constructor / mutating / view partitions
//!
//! # Example
//!
//! ```ignore
//! use vyper_interface::{normalize_interface, MethodGroups};
//!
//! let methods = normalize_interface(&method_ids_json, &abi_json)?;
//! let groups = MethodGroups::partition(methods);
//! ```

pub mod error;
pub mod normalization;
pub mod param_type;
pub mod types;

// Re-export main types
pub use error::{InterfaceError, UnsupportedType};
pub use normalization::{normalize_interface, normalize_selector, split_signature};
pub use param_type::{ParamType, ValueKind, MAX_ARRAY_DEPTH, MAX_STATIC_ARRAY_ELEMENTS};
pub use types::{
    MethodDescriptor, MethodGroups, Mutability, Selector, CONSTRUCTOR_NAME, FALLBACK_NAME,
    MAX_GROUP_METHODS,
};
