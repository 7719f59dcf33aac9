//! Generate command - compile every contract and write its equivalence harness

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use super::output::{format_error, format_generate_report};
use super::{CompilerArgs, DirArgs};
use vyper_opt_equiv::compiler::VYPER_BIN_ENV;
use vyper_opt_equiv::pipeline::{generate_all, GenerateReport};
use vyper_opt_equiv::report::{RunLog, RunLogEntry};

#[derive(Parser, Debug)]
pub struct GenerateCmd {
    #[command(flatten)]
    pub dirs: DirArgs,

    #[command(flatten)]
    pub compiler: CompilerArgs,

    /// Append one JSONL record per contract to a new log file in this directory
    #[arg(long, value_name = "DIR")]
    pub run_log: Option<PathBuf>,
}

impl GenerateCmd {
    pub async fn execute(&self, json_output: bool) -> Result<()> {
        match self.execute_inner().await {
            Ok((report, run_log)) => {
                println!(
                    "{}",
                    format_generate_report(&report, run_log.as_ref(), json_output)
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self) -> Result<(GenerateReport, Option<RunLog>)> {
        let compiler = self.compiler.compiler(VYPER_BIN_ENV);
        let report = generate_all(&compiler, &self.dirs.config()).await?;
        let run_log = match &self.run_log {
            Some(dir) => {
                let mut log = RunLog::create(dir, "generate")?;
                log.append_all(report.files.iter().map(RunLogEntry::from))?;
                Some(log)
            }
            None => None,
        };
        Ok((report, run_log))
    }
}
