use anyhow::{anyhow, Result};
use sha2::Digest;
use std::path::Path;

use crate::harness::HARNESS_SUFFIX;

/// Metadata artifact that shows up in contract directories and is never a contract.
pub const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store"];

/// Test contract name for a source file: `erc20_token.vy` -> `Erc20Token`.
///
/// Everything after the first `.` is dropped, `_` separates words, and each word is capitalized
/// (first letter upper, rest lower). Returns `None` if the result is not a Solidity identifier.
pub fn test_contract_name(file_name: &str) -> Option<String> {
    let stem = file_name.split('.').next().unwrap_or_default();
    let name: String = stem.split('_').map(capitalize).collect();
    let valid = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(name)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Harness file name for a test contract name: `Erc20Token` -> `Erc20Token.t.sol`.
pub fn harness_file_name(contract_name: &str) -> String {
    format!("{}{}", contract_name, HARNESS_SUFFIX)
}

pub fn is_ignored_file(file_name: &str) -> bool {
    IGNORED_FILE_NAMES.contains(&file_name)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Ensure all parent directories exist for a path.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Write a file atomically (write to .tmp, then rename).
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|s| s.to_str()).unwrap_or("tmp")
    ));
    if let Err(e) = std::fs::write(&tmp_path, contents) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(anyhow!(
            "Failed to write temp file {}: {}",
            tmp_path.display(),
            e
        ));
    }
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        anyhow!(
            "Failed to rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}
