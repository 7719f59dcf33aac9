//! Batch harness generation.
//!
//! Walks the contracts directory in sorted order and turns each contract into a harness file in
//! the tests directory. A contract that fails at any stage is reported as skipped and the batch
//! moves on; only a missing or unreadable contracts directory fails the whole run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use vyper_interface::{normalize_interface, MethodGroups};

use crate::compiler::{CompilerError, ContractCompiler, OptimizationProfile};
use crate::errors::{FailureKind, FileError};
use crate::harness::{emit_harness, ProfileBytecodes};
use crate::report::{ProfileDigest, RunLogEntry};
use crate::utils::{atomic_write, harness_file_name, is_ignored_file, test_contract_name};

pub const DEFAULT_CONTRACTS_DIR: &str = "contracts";
pub const DEFAULT_TESTS_DIR: &str = "test/test";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateConfig {
    pub contracts_dir: PathBuf,
    pub tests_dir: PathBuf,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            contracts_dir: PathBuf::from(DEFAULT_CONTRACTS_DIR),
            tests_dir: PathBuf::from(DEFAULT_TESTS_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedHarness {
    pub contract: String,
    pub harness: PathBuf,
    pub total_slots: usize,
    pub digests: Vec<ProfileDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Generated(GeneratedHarness),
    Skipped {
        kind: FailureKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub elapsed_ms: u128,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_generated(&self) -> bool {
        matches!(self.outcome, FileOutcome::Generated(_))
    }
}

impl From<&FileReport> for RunLogEntry {
    fn from(report: &FileReport) -> Self {
        let (outcome, error, digests) = match &report.outcome {
            FileOutcome::Generated(g) => ("generated".to_string(), None, g.digests.clone()),
            FileOutcome::Skipped {
                kind,
                detail,
                reason,
            } => {
                let outcome = match detail {
                    Some(detail) => format!("skipped:{}:{}", kind, detail),
                    None => format!("skipped:{}", kind),
                };
                (outcome, Some(reason.clone()), Vec::new())
            }
        };
        RunLogEntry {
            file: report.source.clone(),
            success: report.is_generated(),
            outcome,
            error,
            elapsed_ms: report.elapsed_ms,
            digests,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateReport {
    pub contracts_dir: PathBuf,
    pub tests_dir: PathBuf,
    pub files: Vec<FileReport>,
}

impl GenerateReport {
    pub fn generated(&self) -> impl Iterator<Item = (&FileReport, &GeneratedHarness)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Generated(g) => Some((f, g)),
            FileOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&FileReport, FailureKind, &str)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Skipped { kind, reason, .. } => Some((f, *kind, reason.as_str())),
            FileOutcome::Generated(_) => None,
        })
    }

    pub fn generated_count(&self) -> usize {
        self.generated().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.files.len() - self.generated_count()
    }
}

/// Regular files in `dir`, sorted, minus metadata artifacts.
pub fn list_contract_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read contracts directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to list contracts in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ignored = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_ignored_file)
            .unwrap_or(false);
        if !ignored {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Generate a harness for every contract in `config.contracts_dir`.
pub async fn generate_all<C: ContractCompiler + ?Sized>(
    compiler: &C,
    config: &GenerateConfig,
) -> Result<GenerateReport> {
    let sources = list_contract_files(&config.contracts_dir)?;
    info!(
        contracts = sources.len(),
        dir = %config.contracts_dir.display(),
        "generating harnesses"
    );

    // Test contract name -> source file whose harness holds it.
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    let mut files = Vec::with_capacity(sources.len());
    for source in sources {
        let started = Instant::now();
        info!(file = %source.display(), "processing contract");
        let result = match contract_name_for(&source) {
            Ok(contract) => match claimed.get(&contract) {
                Some(first) => Err(FileError::NameCollision {
                    file_name: file_name_of(&source),
                    contract,
                    claimed_by: first.clone(),
                }),
                None => generate_one(compiler, &source, &contract, &config.tests_dir).await,
            },
            Err(e) => Err(e),
        };
        let outcome = match result {
            Ok(generated) => {
                claimed.insert(generated.contract.clone(), source.clone());
                info!(
                    file = %source.display(),
                    harness = %generated.harness.display(),
                    total_slots = generated.total_slots,
                    "harness written"
                );
                FileOutcome::Generated(generated)
            }
            Err(e) => {
                warn!(file = %source.display(), kind = %e.kind(), error = %e, "skipping contract");
                FileOutcome::Skipped {
                    kind: e.kind(),
                    detail: e.detail().map(str::to_string),
                    reason: e.to_string(),
                }
            }
        };
        files.push(FileReport {
            source,
            elapsed_ms: started.elapsed().as_millis(),
            outcome,
        });
    }

    Ok(GenerateReport {
        contracts_dir: config.contracts_dir.clone(),
        tests_dir: config.tests_dir.clone(),
        files,
    })
}

fn file_name_of(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Test contract name derived from a source path.
pub fn contract_name_for(source: &Path) -> Result<String, FileError> {
    let file_name = file_name_of(source);
    test_contract_name(&file_name).ok_or(FileError::Naming { file_name })
}

/// Compile one contract and write its harness for test contract `contract` into `tests_dir`.
pub async fn generate_one<C: ContractCompiler + ?Sized>(
    compiler: &C,
    source: &Path,
    contract: &str,
    tests_dir: &Path,
) -> Result<GeneratedHarness, FileError> {
    let bytecodes = ProfileBytecodes {
        unoptimized: compiler.bytecode(source, OptimizationProfile::None).await?,
        gas: compiler.bytecode(source, OptimizationProfile::Gas).await?,
        codesize: compiler
            .bytecode(source, OptimizationProfile::Codesize)
            .await?,
    };
    let method_ids = compiler.method_identifiers(source).await?;
    let abi = compiler.abi(source).await?;

    let groups = MethodGroups::partition(normalize_interface(&method_ids, &abi)?);
    groups.check_dispatchable()?;
    let rendered = emit_harness(contract, &bytecodes, &groups)?;
    let digests = profile_digests(source, &bytecodes)?;

    let harness = tests_dir.join(harness_file_name(contract));
    atomic_write(&harness, rendered.text.as_bytes()).map_err(|e| FileError::io(&harness, e))?;

    Ok(GeneratedHarness {
        contract: contract.to_string(),
        harness,
        total_slots: rendered.layout.total_slots,
        digests,
    })
}

fn profile_digests(
    source: &Path,
    bytecodes: &ProfileBytecodes,
) -> Result<Vec<ProfileDigest>, FileError> {
    bytecodes
        .iter()
        .map(|(profile, hex_code)| {
            ProfileDigest::from_hex(profile, hex_code).map_err(|e| {
                FileError::Compiler(CompilerError::InvalidOutput {
                    command: format!("{} ({})", source.display(), profile),
                    detail: format!("bytecode is not hex: {}", e),
                })
            })
        })
        .collect()
}
