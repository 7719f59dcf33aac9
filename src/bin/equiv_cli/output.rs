//! Output formatting for vyper-opt-equiv CLI
//!
//! Provides human-readable and JSON output formatting for all commands.

use serde::Serialize;

use vyper_opt_equiv::legacy_patch::{PatchOutcome, PatchReport};
use vyper_opt_equiv::pipeline::GenerateReport;
use vyper_opt_equiv::report::RunLog;

#[derive(Serialize)]
struct RunLogJson {
    path: String,
    run_id: String,
}

fn run_log_json(run_log: Option<&RunLog>) -> Option<RunLogJson> {
    run_log.map(|log| RunLogJson {
        path: log.path().display().to_string(),
        run_id: log.run_id().to_string(),
    })
}

fn format_run_log_line(run_log: Option<&RunLog>) -> String {
    match run_log {
        Some(log) => format!(
            "\x1b[1mRun log:\x1b[0m {} (run {})\n",
            log.path().display(),
            log.run_id()
        ),
        None => String::new(),
    }
}

/// Format a generation run
pub fn format_generate_report(
    report: &GenerateReport,
    run_log: Option<&RunLog>,
    json_output: bool,
) -> String {
    if json_output {
        #[derive(Serialize)]
        struct GenerateJson<'a> {
            generated: usize,
            skipped: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            run_log: Option<RunLogJson>,
            #[serde(flatten)]
            report: &'a GenerateReport,
        }

        let json = GenerateJson {
            generated: report.generated_count(),
            skipped: report.skipped_count(),
            run_log: run_log_json(run_log),
            report,
        };
        return serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    }

    let mut out = String::new();
    if report.files.is_empty() {
        out.push_str(&format!(
            "No contracts found in {}\n",
            report.contracts_dir.display()
        ));
        return out;
    }

    for (file, generated) in report.generated() {
        out.push_str(&format!(
            "\x1b[32m✓\x1b[0m {} -> \x1b[36m{}\x1b[0m ({} slots, {} ms)\n",
            file.source.display(),
            generated.harness.display(),
            generated.total_slots,
            file.elapsed_ms
        ));
    }
    for (file, kind, reason) in report.skipped() {
        out.push_str(&format!(
            "\x1b[31m✗\x1b[0m {} \x1b[33m[{}]\x1b[0m {}\n",
            file.source.display(),
            kind,
            reason
        ));
    }

    out.push_str(&format!(
        "\n\x1b[1mGenerated:\x1b[0m {}  \x1b[1mSkipped:\x1b[0m {}\n",
        report.generated_count(),
        report.skipped_count()
    ));
    out.push_str(&format_run_log_line(run_log));
    out
}

/// Format a legacy patch run
pub fn format_patch_report(
    report: &PatchReport,
    run_log: Option<&RunLog>,
    json_output: bool,
) -> String {
    if json_output {
        #[derive(Serialize)]
        struct PatchJson<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            run_log: Option<RunLogJson>,
            #[serde(flatten)]
            report: &'a PatchReport,
        }

        let json = PatchJson {
            run_log: run_log_json(run_log),
            report,
        };
        return serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    }

    let mut out = String::new();
    for file in &report.files {
        let line = match &file.outcome {
            PatchOutcome::Patched { digest } => format!(
                "\x1b[32m✓\x1b[0m {} patched ({} bytes)",
                file.source.display(),
                digest.byte_len
            ),
            PatchOutcome::AlreadyPatched => {
                format!("  {} already patched", file.source.display())
            }
            PatchOutcome::MissingOutput => {
                format!("\x1b[33m-\x1b[0m {} has no harness", file.source.display())
            }
            PatchOutcome::CompilerFailed { reason } | PatchOutcome::IoFailed { reason } => {
                format!("\x1b[31m✗\x1b[0m {}: {}", file.source.display(), reason)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "\n\x1b[1mPatched:\x1b[0m {}  \x1b[1mAlready patched:\x1b[0m {}  \x1b[1mMissing:\x1b[0m {}  \x1b[1mFailed:\x1b[0m {}\n",
        report.count("patched"),
        report.count("already_patched"),
        report.count("missing_output"),
        report.failures()
    ));
    out.push_str(&format_run_log_line(run_log));
    out
}

/// Format a single type encoding
pub fn format_encoding(ty: &str, slot: usize, expression: &str, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct EncodingJson<'a> {
            ty: &'a str,
            slot: usize,
            expression: &'a str,
        }

        let json = EncodingJson {
            ty,
            slot,
            expression,
        };
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
    } else {
        expression.to_string()
    }
}

/// Format an error with its cause chain
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            cause: Option<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            cause: error.source().map(|e| e.to_string()),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        let mut out = format!("\x1b[31mError:\x1b[0m {}\n", error);
        let mut causes = error.chain().skip(1).peekable();
        if causes.peek().is_some() {
            out.push_str("Caused by:\n");
            for (idx, cause) in causes.enumerate() {
                out.push_str(&format!("  {}: {}\n", idx + 1, cause));
            }
        }
        out
    }
}
