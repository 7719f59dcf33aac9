//! External compiler boundary.
//!
//! The Vyper compiler is driven as a child process. Each invocation runs under a timeout so a
//! hung compiler fails only the contract being processed, not the whole batch.
//!
//! ## Configuration
//!
//! - `VYPER_BIN`: compiler used by the main generation pass (default `vyper`)
//! - `VYPER_LEGACY_BIN`: compiler used by the legacy patch pass (default `vyper`)
//!
//! An explicit `--vyper` flag on the CLI wins over either variable.

use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

/// Env var naming the main-pass compiler binary.
pub const VYPER_BIN_ENV: &str = "VYPER_BIN";

/// Env var naming the legacy compiler binary.
pub const VYPER_LEGACY_BIN_ENV: &str = "VYPER_LEGACY_BIN";

/// Compiler binary used when neither a flag nor an env var names one.
pub const DEFAULT_VYPER_PROGRAM: &str = "vyper";

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Compiler configurations whose bytecode is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationProfile {
    /// Baseline: `--optimize none`.
    None,
    Gas,
    Codesize,
    /// Whatever the legacy toolchain does by default.
    Legacy,
}

impl OptimizationProfile {
    /// Profiles compiled by the main generation pass.
    pub const MAIN: [OptimizationProfile; 3] = [
        OptimizationProfile::None,
        OptimizationProfile::Gas,
        OptimizationProfile::Codesize,
    ];

    pub fn compiler_args(&self) -> &'static [&'static str] {
        match self {
            OptimizationProfile::None => &["--optimize", "none"],
            OptimizationProfile::Gas => &["--optimize", "gas"],
            OptimizationProfile::Codesize => &["--optimize", "codesize"],
            OptimizationProfile::Legacy => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptimizationProfile::None => "none",
            OptimizationProfile::Gas => "gas",
            OptimizationProfile::Codesize => "codesize",
            OptimizationProfile::Legacy => "legacy",
        }
    }
}

impl fmt::Display for OptimizationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compiler invocation that did not produce usable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    /// The binary could not be started.
    Spawn { command: String, error: String },
    /// The process ran past the timeout and was killed.
    Timeout { command: String, secs: u64 },
    /// Non-zero exit status.
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    /// Output was not bytecode / JSON of the expected kind.
    InvalidOutput { command: String, detail: String },
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerError::Spawn { command, error } => {
                write!(f, "failed to start `{}`: {}", command, error)
            }
            CompilerError::Timeout { command, secs } => {
                write!(f, "`{}` timed out after {}s", command, secs)
            }
            CompilerError::Failed {
                command,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "`{}` exited with status {}", command, code)?,
                    None => write!(f, "`{}` was terminated by a signal", command)?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            CompilerError::InvalidOutput { command, detail } => {
                write!(f, "unexpected output from `{}`: {}", command, detail)
            }
        }
    }
}

impl std::error::Error for CompilerError {}

/// What the harness generator needs from a compiler.
#[async_trait::async_trait]
pub trait ContractCompiler: Send + Sync {
    /// Deployment bytecode as lowercase hex without `0x`.
    async fn bytecode(
        &self,
        source: &Path,
        profile: OptimizationProfile,
    ) -> Result<String, CompilerError>;

    /// Signature -> selector object, in declaration order.
    async fn method_identifiers(&self, source: &Path) -> Result<Value, CompilerError>;

    /// JSON ABI array.
    async fn abi(&self, source: &Path) -> Result<Value, CompilerError>;
}

/// The `vyper` command-line compiler.
#[derive(Debug, Clone)]
pub struct VyperCli {
    program: PathBuf,
    timeout: Duration,
}

impl VyperCli {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Use `program` if given, else the binary named by `env_var`, else `vyper`.
    pub fn resolve(program: Option<PathBuf>, env_var: &str, timeout: Duration) -> Self {
        let program = program
            .or_else(|| std::env::var_os(env_var).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VYPER_PROGRAM));
        Self::new(program, timeout)
    }

    async fn run(&self, args: Vec<OsString>) -> Result<String, CompilerError> {
        let command = describe_command(&self.program, &args);
        debug!(command = %command, "invoking compiler");

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(CompilerError::Timeout {
                    command,
                    secs: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(CompilerError::Spawn {
                    command,
                    error: e.to_string(),
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(CompilerError::Failed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|e| CompilerError::InvalidOutput {
            command,
            detail: format!("stdout is not UTF-8: {}", e),
        })
    }

    async fn run_json(
        &self,
        format: &str,
        source: &Path,
        expected: fn(&Value) -> bool,
        what: &str,
    ) -> Result<Value, CompilerError> {
        let args = vec![
            OsString::from("-f"),
            OsString::from(format),
            source.as_os_str().to_os_string(),
        ];
        let command = describe_command(&self.program, &args);
        let stdout = self.run(args).await?;
        let value = parse_json_output(&command, &stdout)?;
        if !expected(&value) {
            return Err(CompilerError::InvalidOutput {
                command,
                detail: format!("{} has the wrong JSON shape", what),
            });
        }
        Ok(value)
    }
}

#[async_trait::async_trait]
impl ContractCompiler for VyperCli {
    async fn bytecode(
        &self,
        source: &Path,
        profile: OptimizationProfile,
    ) -> Result<String, CompilerError> {
        let mut args = vec![source.as_os_str().to_os_string()];
        args.extend(profile.compiler_args().iter().map(OsString::from));
        let command = describe_command(&self.program, &args);
        let stdout = self.run(args).await?;
        parse_bytecode_output(&command, &stdout)
    }

    async fn method_identifiers(&self, source: &Path) -> Result<Value, CompilerError> {
        self.run_json("method_identifiers", source, Value::is_object, "selector table")
            .await
    }

    async fn abi(&self, source: &Path) -> Result<Value, CompilerError> {
        self.run_json("abi", source, Value::is_array, "ABI").await
    }
}

fn describe_command(program: &Path, args: &[OsString]) -> String {
    let mut out = program.display().to_string();
    for arg in args {
        out.push(' ');
        out.push_str(&arg.to_string_lossy());
    }
    out
}

/// Extract hex bytecode from compiler stdout (`0x6003...\n` -> `6003...`).
pub fn parse_bytecode_output(command: &str, stdout: &str) -> Result<String, CompilerError> {
    let invalid = |detail: &str| CompilerError::InvalidOutput {
        command: command.to_string(),
        detail: detail.to_string(),
    };
    let s = stdout.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Err(invalid("empty bytecode"));
    }
    if hex::decode(s).is_err() {
        return Err(invalid("bytecode is not valid hex"));
    }
    Ok(s.to_ascii_lowercase())
}

fn parse_json_output(command: &str, stdout: &str) -> Result<Value, CompilerError> {
    serde_json::from_str(stdout.trim()).map_err(|e| CompilerError::InvalidOutput {
        command: command.to_string(),
        detail: format!("invalid JSON: {}", e),
    })
}
