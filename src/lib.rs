//! Vyper Optimizer Equivalence
//!
//! Generates Foundry fuzz harnesses that check Vyper optimization profiles against each other:
//!
//! - **Compilation**: each contract is built unoptimized, gas-optimized, size-optimized and
//!   (in a separate pass) with a legacy compiler
//! - **Harness generation**: one `<Name>.t.sol` per contract that deploys the baseline and a
//!   fuzzer-chosen comparison build, then drives both with identical calls
//! - **Legacy patching**: splices the legacy build into harnesses after generation
//!
//! See [`pipeline`] for the batch driver and [`harness`] for the generated Solidity.

pub mod compiler;
pub mod dispatch;
pub mod encoder;
pub mod errors;
pub mod harness;
pub mod layout;
pub mod legacy_patch;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use compiler::{CompilerError, ContractCompiler, OptimizationProfile, VyperCli};
pub use encoder::{encode_type, EncodingExpression};
pub use errors::{FailureKind, FileError};
pub use harness::{emit_harness, ProfileBytecodes, RenderedHarness, LEGACY_PLACEHOLDER};
pub use layout::SlotLayout;
pub use legacy_patch::{patch_all, PatchOutcome, PatchReport};
pub use pipeline::{generate_all, GenerateConfig, GenerateReport};
pub use report::{ProfileDigest, RunLog};
