//! CLI subcommand implementations for vyper-opt-equiv

pub mod encode_type;
pub mod generate;
pub mod output;
pub mod patch_legacy;

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use vyper_opt_equiv::compiler::{VyperCli, DEFAULT_TIMEOUT_SECS};
use vyper_opt_equiv::pipeline::{GenerateConfig, DEFAULT_CONTRACTS_DIR, DEFAULT_TESTS_DIR};

/// Where contracts are read from and harnesses written to.
#[derive(Args, Debug, Clone)]
pub struct DirArgs {
    /// Directory of Vyper contracts, one contract per file
    #[arg(long, default_value = DEFAULT_CONTRACTS_DIR)]
    pub contracts_dir: PathBuf,

    /// Directory harnesses are written to
    #[arg(long, default_value = DEFAULT_TESTS_DIR)]
    pub tests_dir: PathBuf,
}

impl DirArgs {
    pub fn config(&self) -> GenerateConfig {
        GenerateConfig {
            contracts_dir: self.contracts_dir.clone(),
            tests_dir: self.tests_dir.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompilerArgs {
    /// Compiler binary (defaults to the environment override, then `vyper` on PATH)
    #[arg(long, value_name = "PATH")]
    pub vyper: Option<PathBuf>,

    /// Kill a compiler invocation after this many seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl CompilerArgs {
    pub fn compiler(&self, env_var: &str) -> VyperCli {
        VyperCli::resolve(
            self.vyper.clone(),
            env_var,
            Duration::from_secs(self.timeout_secs),
        )
    }
}
