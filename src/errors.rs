//! Per-file failure taxonomy.
//!
//! Every way a single contract can fail to produce a harness maps to one [`FileError`]. The driver
//! turns it into a skipped outcome and moves on to the next file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use vyper_interface::{InterfaceError, UnsupportedType};

use crate::compiler::CompilerError;

/// Stage of per-file processing a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Naming,
    Compiler,
    Interface,
    UnsupportedType,
    Io,
}

impl FailureKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            FailureKind::Naming => "naming",
            FailureKind::Compiler => "compiler",
            FailureKind::Interface => "interface",
            FailureKind::UnsupportedType => "unsupported_type",
            FailureKind::Io => "io",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[derive(Debug)]
pub enum FileError {
    /// File name does not yield a valid test contract name.
    Naming { file_name: String },
    /// An earlier file in the batch already produced this test contract.
    NameCollision {
        file_name: String,
        contract: String,
        claimed_by: PathBuf,
    },
    Compiler(CompilerError),
    Interface(InterfaceError),
    UnsupportedType(UnsupportedType),
    Io { path: PathBuf, message: String },
}

impl FileError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FileError::Naming { .. } | FileError::NameCollision { .. } => FailureKind::Naming,
            FileError::Compiler(_) => FailureKind::Compiler,
            FileError::Interface(_) => FailureKind::Interface,
            FileError::UnsupportedType(_) => FailureKind::UnsupportedType,
            FileError::Io { .. } => FailureKind::Io,
        }
    }

    /// Finer-grained tag within the failure kind, where one exists.
    pub fn detail(&self) -> Option<&'static str> {
        match self {
            FileError::UnsupportedType(e) => Some(e.kind()),
            FileError::NameCollision { .. } => Some("name_collision"),
            _ => None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        FileError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::Naming { file_name } => {
                write!(f, "cannot derive a test contract name from `{}`", file_name)
            }
            FileError::NameCollision {
                file_name,
                contract,
                claimed_by,
            } => write!(
                f,
                "`{}` maps to test contract `{}`, already generated from {}",
                file_name,
                contract,
                claimed_by.display()
            ),
            FileError::Compiler(e) => write!(f, "{}", e),
            FileError::Interface(e) => write!(f, "{}", e),
            FileError::UnsupportedType(e) => write!(f, "{}", e),
            FileError::Io { path, message } => write!(f, "{}: {}", path.display(), message),
        }
    }
}

impl std::error::Error for FileError {}

impl From<CompilerError> for FileError {
    fn from(e: CompilerError) -> Self {
        FileError::Compiler(e)
    }
}

impl From<InterfaceError> for FileError {
    fn from(e: InterfaceError) -> Self {
        FileError::Interface(e)
    }
}

impl From<UnsupportedType> for FileError {
    fn from(e: UnsupportedType) -> Self {
        FileError::UnsupportedType(e)
    }
}
