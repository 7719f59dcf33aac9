//! vyper-opt-equiv: Foundry harness generator for Vyper optimizer equivalence
//!
//! Compiles each contract under several optimization profiles and writes a fuzz harness that
//! deploys the unoptimized build next to an optimized (or legacy) one and requires both to behave
//! identically under the same calls.
//!
//! ## Example Usage
//!
//! ```bash
//! # Generate harnesses for contracts/ into test/test/
//! vyper-opt-equiv generate
//!
//! # Fill in legacy bytecode with another compiler installation
//! VYPER_LEGACY_BIN=~/venv-039/bin/vyper vyper-opt-equiv patch-legacy
//!
//! # Inspect how one parameter type is fed from the fuzz vector
//! vyper-opt-equiv encode-type 'int128[2]' --slot 3
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod equiv_cli;

use equiv_cli::{encode_type::EncodeTypeCmd, generate::GenerateCmd, patch_legacy::PatchLegacyCmd};

#[derive(Parser)]
#[command(
    name = "vyper-opt-equiv",
    author,
    version,
    about = "Generate optimizer equivalence harnesses for Vyper contracts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every contract and write its harness
    Generate(GenerateCmd),

    /// Replace the legacy placeholder in generated harnesses
    PatchLegacy(PatchLegacyCmd),

    /// Print the encoding expression for a parameter type
    EncodeType(EncodeTypeCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { command, json } = Cli::parse();

    match command {
        Commands::Generate(cmd) => cmd.execute(json).await,
        Commands::PatchLegacy(cmd) => cmd.execute(json).await,
        Commands::EncodeType(cmd) => cmd.execute(json),
    }
}
