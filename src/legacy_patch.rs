//! Legacy bytecode patch pass.
//!
//! Generated harnesses carry [`LEGACY_PLACEHOLDER`] where the legacy compiler's bytecode belongs,
//! since that toolchain usually lives in a separate installation. This pass compiles each contract
//! with it and splices the bytecode into the matching harness.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::compiler::{ContractCompiler, OptimizationProfile};
use crate::harness::LEGACY_PLACEHOLDER;
use crate::pipeline::{contract_name_for, list_contract_files, GenerateConfig};
use crate::report::{ProfileDigest, RunLogEntry};
use crate::utils::{atomic_write, harness_file_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatchOutcome {
    Patched { digest: ProfileDigest },
    /// No placeholder left; the harness was not touched.
    AlreadyPatched,
    /// No harness was generated for this contract.
    MissingOutput,
    CompilerFailed { reason: String },
    /// The harness could not be read or rewritten.
    IoFailed { reason: String },
}

impl PatchOutcome {
    pub fn short_name(&self) -> &'static str {
        match self {
            PatchOutcome::Patched { .. } => "patched",
            PatchOutcome::AlreadyPatched => "already_patched",
            PatchOutcome::MissingOutput => "missing_output",
            PatchOutcome::CompilerFailed { .. } => "compiler_failed",
            PatchOutcome::IoFailed { .. } => "io_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PatchOutcome::CompilerFailed { .. } | PatchOutcome::IoFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchFileReport {
    pub source: PathBuf,
    pub harness: Option<PathBuf>,
    pub elapsed_ms: u128,
    #[serde(flatten)]
    pub outcome: PatchOutcome,
}

impl From<&PatchFileReport> for RunLogEntry {
    fn from(report: &PatchFileReport) -> Self {
        let (error, digests) = match &report.outcome {
            PatchOutcome::Patched { digest } => (None, vec![digest.clone()]),
            PatchOutcome::CompilerFailed { reason } | PatchOutcome::IoFailed { reason } => {
                (Some(reason.clone()), Vec::new())
            }
            PatchOutcome::AlreadyPatched | PatchOutcome::MissingOutput => (None, Vec::new()),
        };
        RunLogEntry {
            file: report.source.clone(),
            success: !report.outcome.is_failure(),
            outcome: report.outcome.short_name().to_string(),
            error,
            elapsed_ms: report.elapsed_ms,
            digests,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub contracts_dir: PathBuf,
    pub tests_dir: PathBuf,
    pub files: Vec<PatchFileReport>,
}

impl PatchReport {
    pub fn count(&self, short_name: &str) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome.short_name() == short_name)
            .count()
    }

    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_failure()).count()
    }
}

/// Patch every generated harness under `config.tests_dir` with legacy bytecode.
pub async fn patch_all<C: ContractCompiler + ?Sized>(
    compiler: &C,
    config: &GenerateConfig,
) -> Result<PatchReport> {
    let sources = list_contract_files(&config.contracts_dir)?;
    info!(contracts = sources.len(), "patching legacy bytecode");

    let mut files = Vec::with_capacity(sources.len());
    for source in sources {
        let started = Instant::now();
        let harness = contract_name_for(&source)
            .ok()
            .map(|name| config.tests_dir.join(harness_file_name(&name)));
        let outcome = match &harness {
            Some(path) => patch_one(compiler, &source, path).await,
            None => PatchOutcome::MissingOutput,
        };
        match &outcome {
            PatchOutcome::Patched { .. } => info!(file = %source.display(), "legacy bytecode patched"),
            o if o.is_failure() => {
                warn!(file = %source.display(), outcome = o.short_name(), "legacy patch failed")
            }
            o => debug!(file = %source.display(), outcome = o.short_name(), "nothing to patch"),
        }
        files.push(PatchFileReport {
            source,
            harness,
            elapsed_ms: started.elapsed().as_millis(),
            outcome,
        });
    }

    Ok(PatchReport {
        contracts_dir: config.contracts_dir.clone(),
        tests_dir: config.tests_dir.clone(),
        files,
    })
}

/// Replace the placeholder in `harness` with the legacy build of `source`.
///
/// The compiler only runs when the harness exists and still holds the placeholder.
pub async fn patch_one<C: ContractCompiler + ?Sized>(
    compiler: &C,
    source: &Path,
    harness: &Path,
) -> PatchOutcome {
    if !harness.is_file() {
        return PatchOutcome::MissingOutput;
    }
    let contents = match std::fs::read_to_string(harness) {
        Ok(c) => c,
        Err(e) => {
            return PatchOutcome::IoFailed {
                reason: format!("Failed to read {}: {}", harness.display(), e),
            }
        }
    };
    if !contents.contains(LEGACY_PLACEHOLDER) {
        return PatchOutcome::AlreadyPatched;
    }

    let bytecode = match compiler.bytecode(source, OptimizationProfile::Legacy).await {
        Ok(b) => b,
        Err(e) => {
            return PatchOutcome::CompilerFailed {
                reason: e.to_string(),
            }
        }
    };
    let digest = match ProfileDigest::from_hex(OptimizationProfile::Legacy, &bytecode) {
        Ok(d) => d,
        Err(e) => {
            return PatchOutcome::CompilerFailed {
                reason: format!("legacy bytecode is not hex: {}", e),
            }
        }
    };

    let updated = contents.replace(LEGACY_PLACEHOLDER, &bytecode);
    match atomic_write(harness, updated.as_bytes()) {
        Ok(()) => PatchOutcome::Patched { digest },
        Err(e) => PatchOutcome::IoFailed {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fake::{FakeCompiler, FakeContract};
    use serde_json::json;

    fn contract() -> FakeContract {
        FakeContract::uniform("6001600055", json!({}), json!([]))
            .with_bytecode(OptimizationProfile::Legacy, "60016000550039")
    }

    fn setup() -> (tempfile::TempDir, GenerateConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerateConfig {
            contracts_dir: dir.path().join("contracts"),
            tests_dir: dir.path().join("test/test"),
        };
        std::fs::create_dir_all(&config.contracts_dir).unwrap();
        std::fs::create_dir_all(&config.tests_dir).unwrap();
        (dir, config)
    }

    fn harness_text() -> String {
        format!(
            "comp = _deploy(abi.encodePacked(hex\"{}\", bc_args));\n",
            LEGACY_PLACEHOLDER
        )
    }

    #[tokio::test]
    async fn test_patch_outcomes_are_distinct() {
        let (_dir, config) = setup();
        for f in ["a_patch.vy", "b_done.vy", "c_missing.vy", "d_broken.vy"] {
            std::fs::write(config.contracts_dir.join(f), "# src").unwrap();
        }
        std::fs::write(config.tests_dir.join("APatch.t.sol"), harness_text()).unwrap();
        std::fs::write(config.tests_dir.join("BDone.t.sol"), "hex\"00\"").unwrap();
        std::fs::write(config.tests_dir.join("DBroken.t.sol"), harness_text()).unwrap();

        let compiler = FakeCompiler::default()
            .with("a_patch.vy", contract())
            .with("b_done.vy", contract())
            .with("c_missing.vy", contract());

        let report = patch_all(&compiler, &config).await.unwrap();
        let names: Vec<_> = report.files.iter().map(|f| f.outcome.short_name()).collect();
        assert_eq!(
            names,
            vec!["patched", "already_patched", "missing_output", "compiler_failed"]
        );
        assert_eq!(report.failures(), 1);

        let patched = std::fs::read_to_string(config.tests_dir.join("APatch.t.sol")).unwrap();
        assert!(patched.contains("hex\"60016000550039\""));
        assert!(!patched.contains(LEGACY_PLACEHOLDER));

        let untouched = std::fs::read_to_string(config.tests_dir.join("DBroken.t.sol")).unwrap();
        assert_eq!(untouched, harness_text());

        // Only the harness that still needed bytecode hit the compiler.
        assert_eq!(compiler.calls_for("a_patch.vy"), vec!["legacy"]);
        assert!(compiler.calls_for("b_done.vy").is_empty());
        assert!(compiler.calls_for("c_missing.vy").is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let (_dir, config) = setup();
        std::fs::write(config.contracts_dir.join("counter.vy"), "# src").unwrap();
        let harness = config.tests_dir.join("Counter.t.sol");
        std::fs::write(&harness, harness_text()).unwrap();
        let compiler = FakeCompiler::default().with("counter.vy", contract());

        let first = patch_all(&compiler, &config).await.unwrap();
        assert_eq!(first.count("patched"), 1);
        let after_first = std::fs::read_to_string(&harness).unwrap();

        let second = patch_all(&compiler, &config).await.unwrap();
        assert_eq!(second.count("already_patched"), 1);
        assert_eq!(std::fs::read_to_string(&harness).unwrap(), after_first);
    }

    #[test]
    fn test_run_log_entry_carries_legacy_digest() {
        let report = PatchFileReport {
            source: PathBuf::from("contracts/counter.vy"),
            harness: Some(PathBuf::from("test/test/Counter.t.sol")),
            elapsed_ms: 7,
            outcome: PatchOutcome::Patched {
                digest: ProfileDigest::from_hex(OptimizationProfile::Legacy, "00").unwrap(),
            },
        };
        let entry = RunLogEntry::from(&report);
        assert!(entry.success);
        assert_eq!(entry.outcome, "patched");
        assert_eq!(entry.digests[0].profile, "legacy");
    }
}
