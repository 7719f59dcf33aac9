use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::InterfaceError;

/// Selector-table name of the constructor.
pub const CONSTRUCTOR_NAME: &str = "__init__";

/// Selector-table name of the fallback function.
pub const FALLBACK_NAME: &str = "__default__";

/// Methods one dispatch chain can address with a `uint8` index.
pub const MAX_GROUP_METHODS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// State-mutating (includes payable and nonpayable).
    External,
    View,
}

/// A four-byte method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Selector literal as it appears in generated Solidity, e.g. `0x0000002a`.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_literal())
    }
}

/// One entry of a contract's public interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// Declared parameter types in order, e.g. `["uint256", "address[2]"]`.
    pub param_types: Vec<String>,
    pub selector: Selector,
    pub mutability: Mutability,
}

impl MethodDescriptor {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_NAME
    }

    pub fn arity(&self) -> usize {
        self.param_types.len()
    }
}

/// Methods split into the three groups the harness drives separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodGroups {
    pub constructor: Option<MethodDescriptor>,
    /// External methods other than the constructor and fallback, in selector-table order.
    pub mutating: Vec<MethodDescriptor>,
    /// View methods, in selector-table order.
    pub view: Vec<MethodDescriptor>,
}

impl MethodGroups {
    pub fn partition(methods: Vec<MethodDescriptor>) -> Self {
        let mut groups = MethodGroups::default();
        for method in methods {
            if method.is_constructor() {
                if groups.constructor.is_none() {
                    groups.constructor = Some(method);
                }
                continue;
            }
            if method.is_fallback() {
                continue;
            }
            match method.mutability {
                Mutability::External => groups.mutating.push(method),
                Mutability::View => groups.view.push(method),
            }
        }
        groups
    }

    /// Fail if a group has more methods than its `uint8` selection index can reach.
    pub fn check_dispatchable(&self) -> Result<(), InterfaceError> {
        for (group, methods) in [("mutating", &self.mutating), ("view", &self.view)] {
            if methods.len() > MAX_GROUP_METHODS {
                return Err(InterfaceError::TooManyMethods {
                    group,
                    count: methods.len(),
                });
            }
        }
        Ok(())
    }

    /// Constructor parameter types; empty when there is no constructor.
    pub fn constructor_params(&self) -> &[String] {
        self.constructor
            .as_ref()
            .map(|c| c.param_types.as_slice())
            .unwrap_or(&[])
    }
}
