//! Patch-legacy command - splice legacy compiler bytecode into generated harnesses

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use super::output::{format_error, format_patch_report};
use super::{CompilerArgs, DirArgs};
use vyper_opt_equiv::compiler::VYPER_LEGACY_BIN_ENV;
use vyper_opt_equiv::legacy_patch::{patch_all, PatchReport};
use vyper_opt_equiv::report::{RunLog, RunLogEntry};

#[derive(Parser, Debug)]
pub struct PatchLegacyCmd {
    #[command(flatten)]
    pub dirs: DirArgs,

    #[command(flatten)]
    pub compiler: CompilerArgs,

    /// Append one JSONL record per contract to a new log file in this directory
    #[arg(long, value_name = "DIR")]
    pub run_log: Option<PathBuf>,
}

impl PatchLegacyCmd {
    pub async fn execute(&self, json_output: bool) -> Result<()> {
        match self.execute_inner().await {
            Ok((report, run_log)) => {
                println!(
                    "{}",
                    format_patch_report(&report, run_log.as_ref(), json_output)
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self) -> Result<(PatchReport, Option<RunLog>)> {
        let compiler = self.compiler.compiler(VYPER_LEGACY_BIN_ENV);
        let report = patch_all(&compiler, &self.dirs.config()).await?;
        let run_log = match &self.run_log {
            Some(dir) => {
                let mut log = RunLog::create(dir, "patch-legacy")?;
                log.append_all(report.files.iter().map(RunLogEntry::from))?;
                Some(log)
            }
            None => None,
        };
        Ok((report, run_log))
    }
}
