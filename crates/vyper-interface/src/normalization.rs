use crate::error::InterfaceError;
use crate::types::{MethodDescriptor, Mutability, Selector, CONSTRUCTOR_NAME, FALLBACK_NAME};
use serde_json::Value;
use tracing::debug;

/// Split `name(type,type)` into the name and its parameter types.
///
/// Only top-level commas separate parameters, so tuple types such as `(uint256,bool)` stay whole.
pub fn split_signature(signature: &str) -> Result<(String, Vec<String>), InterfaceError> {
    let malformed = || InterfaceError::MalformedSignature {
        signature: signature.to_string(),
    };
    let sig = signature.trim();
    let open = sig.find('(').ok_or_else(malformed)?;
    let name = sig[..open].trim();
    let inner = sig[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }

    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(malformed());
                }
            }
            ',' if depth == 0 => {
                params.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed());
    }
    params.push(inner[start..].trim().to_string());
    params.retain(|p| !p.is_empty());

    Ok((name.to_string(), params))
}

/// Normalize a selector string (`0x2a`, `deadbeef`, ...) to four bytes.
pub fn normalize_selector(signature: &str, raw: &str) -> Result<Selector, InterfaceError> {
    let malformed = || InterfaceError::MalformedSelector {
        signature: signature.to_string(),
        selector: raw.to_string(),
    };
    let s = raw.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if s.is_empty() || s.len() > 8 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    let padded = format!("{:0>8}", s);
    let bytes = hex::decode(padded).map_err(|_| malformed())?;
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes);
    Ok(Selector(out))
}

fn selector_from_value(signature: &str, v: &Value) -> Result<Selector, InterfaceError> {
    if let Some(s) = v.as_str() {
        return normalize_selector(signature, s);
    }
    match v.as_u64() {
        Some(n) if n <= u32::MAX as u64 => Ok(Selector((n as u32).to_be_bytes())),
        _ => Err(InterfaceError::MalformedSelector {
            signature: signature.to_string(),
            selector: v.to_string(),
        }),
    }
}

/// Declared state mutability of the first ABI entry named `name`.
///
/// `None` means no entry has that name.
fn declared_mutability<'a>(entries: &'a [Value], name: &str) -> Option<&'a str> {
    let entry = entries
        .iter()
        .find(|e| e.get("name").and_then(Value::as_str) == Some(name))?;
    if let Some(m) = entry.get("stateMutability").and_then(Value::as_str) {
        return Some(m);
    }
    // Pre-0.5 ABI format
    if entry.get("constant").and_then(Value::as_bool) == Some(true) {
        return Some("view");
    }
    Some("nonpayable")
}

/// Parameter types of the ABI's constructor entry, if it has one.
fn constructor_inputs(entries: &[Value]) -> Result<Option<Vec<String>>, InterfaceError> {
    let Some(entry) = entries
        .iter()
        .find(|e| e.get("type").and_then(Value::as_str) == Some("constructor"))
    else {
        return Ok(None);
    };
    let Some(inputs) = entry.get("inputs") else {
        return Ok(Some(Vec::new()));
    };
    let inputs = inputs
        .as_array()
        .ok_or_else(|| InterfaceError::UnexpectedShape {
            what: "constructor inputs",
            detail: inputs.to_string(),
        })?;
    let types = inputs
        .iter()
        .map(|input| {
            input
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| InterfaceError::UnexpectedShape {
                    what: "constructor input",
                    detail: input.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(types))
}

/// Build method descriptors from the compiler's selector table and ABI.
///
/// `method_ids` is the `-f method_identifiers` object (signature -> selector), `abi` the
/// `-f abi` array. Descriptors keep selector-table order. The constructor and fallback are always
/// `External`; every other method must appear in the ABI and is `View` only when declared so.
pub fn normalize_interface(
    method_ids: &Value,
    abi: &Value,
) -> Result<Vec<MethodDescriptor>, InterfaceError> {
    let table = method_ids
        .as_object()
        .ok_or_else(|| InterfaceError::UnexpectedShape {
            what: "selector table",
            detail: "expected a JSON object".to_string(),
        })?;
    let entries = abi
        .as_array()
        .ok_or_else(|| InterfaceError::UnexpectedShape {
            what: "ABI",
            detail: "expected a JSON array".to_string(),
        })?;

    let mut methods = Vec::with_capacity(table.len());
    for (signature, raw_selector) in table {
        let (name, param_types) = split_signature(signature)?;
        let selector = selector_from_value(signature, raw_selector)?;
        let mutability = if name == CONSTRUCTOR_NAME || name == FALLBACK_NAME {
            Mutability::External
        } else {
            match declared_mutability(entries, &name) {
                None => return Err(InterfaceError::InconsistentInterface { method: name }),
                Some("view") => Mutability::View,
                Some(_) => Mutability::External,
            }
        };
        methods.push(MethodDescriptor {
            name,
            param_types,
            selector,
            mutability,
        });
    }

    // The selector table never lists the constructor; its inputs live in the ABI.
    if !methods.iter().any(MethodDescriptor::is_constructor) {
        if let Some(param_types) = constructor_inputs(entries)? {
            methods.insert(
                0,
                MethodDescriptor {
                    name: CONSTRUCTOR_NAME.to_string(),
                    param_types,
                    selector: Selector::default(),
                    mutability: Mutability::External,
                },
            );
        }
    }

    debug!(methods = methods.len(), "normalized interface");
    Ok(methods)
}
