use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vyper-opt-equiv").unwrap();
    cmd.env_remove("VYPER_BIN").env_remove("VYPER_LEGACY_BIN");
    cmd
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("patch-legacy"))
        .stdout(predicate::str::contains("encode-type"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_generate_help_shows_defaults() {
    cli()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--contracts-dir"))
        .stdout(predicate::str::contains("test/test"))
        .stdout(predicate::str::contains("--timeout-secs"))
        .stdout(predicate::str::contains("--run-log"));
}

#[test]
fn test_encode_type_prints_expression() {
    cli()
        .args(["encode-type", "uint8", "--slot", "3"])
        .assert()
        .success()
        .stdout("uint256(uint8(args[3]))\n");

    cli()
        .args(["encode-type", "int128[2]", "--slot", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "abi.encodePacked(int256(int128(uint128(args[1]))), int256(int128(uint128(args[1]))))",
        ));
}

#[test]
fn test_encode_type_json() {
    let output = cli()
        .args(["--json", "encode-type", "address"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ty"], "address");
    assert_eq!(json["slot"], 0);
    assert_eq!(json["expression"], "uint256(uint160(args[0]))");
}

#[test]
fn test_encode_type_rejects_unsupported() {
    cli()
        .args(["encode-type", "uint8[2][2][2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("triple nested"));

    cli()
        .args(["encode-type", "MyStruct"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("enum or struct"));
}

#[test]
fn test_generate_missing_contracts_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    cli()
        .arg("generate")
        .arg("--contracts-dir")
        .arg(temp_dir.path().join("missing"))
        .arg("--tests-dir")
        .arg(temp_dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read contracts directory"));
}

#[cfg(unix)]
mod fake_vyper {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Stands in for `vyper`: answers profile builds, `-f method_identifiers` and `-f abi`,
    /// and fails on any contract whose path contains `broken`.
    const SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  -f)
    case "$3" in *broken*) echo "SyntaxException: nope" >&2; exit 1;; esac
    if [ "$2" = "method_identifiers" ]; then
      echo '{"set(uint256)": "0x60fe47b1", "get()": "0x6d4ce63c"}'
    else
      echo '[{"type":"function","name":"set","stateMutability":"nonpayable"},{"type":"function","name":"get","stateMutability":"view"}]'
    fi
    ;;
  *)
    case "$1" in *broken*) echo "SyntaxException: nope" >&2; exit 1;; esac
    case "$3" in
      none) echo 0x6001600055;;
      gas) echo 0x600160005500;;
      codesize) echo 0x60016000;;
      *) echo 0xdeadbeef;;
    esac
    ;;
esac
"#;

    struct Workspace {
        dir: TempDir,
        vyper: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let contracts = dir.path().join("contracts");
            std::fs::create_dir_all(&contracts).unwrap();
            std::fs::write(contracts.join("simple_counter.vy"), "# counter").unwrap();
            std::fs::write(contracts.join("broken_thing.vy"), "# broken").unwrap();
            std::fs::write(contracts.join(".DS_Store"), "").unwrap();

            let vyper = dir.path().join("fake-vyper");
            std::fs::write(&vyper, SCRIPT).unwrap();
            std::fs::set_permissions(&vyper, std::fs::Permissions::from_mode(0o755)).unwrap();
            Workspace { dir, vyper }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn harness(&self) -> PathBuf {
            self.path().join("test/test/SimpleCounter.t.sol")
        }
    }

    #[test]
    fn test_generate_writes_harness_and_skips_failures() {
        let ws = Workspace::new();
        cli()
            .current_dir(ws.path())
            .arg("generate")
            .arg("--vyper")
            .arg(&ws.vyper)
            .assert()
            .success()
            .stdout(predicate::str::contains("SimpleCounter.t.sol"))
            .stdout(predicate::str::contains("broken_thing.vy"))
            .stdout(predicate::str::contains("[compiler]"));

        let src = std::fs::read_to_string(ws.harness()).unwrap();
        assert!(src.contains("contract SimpleCounterTest is Test"));
        assert!(src.contains("hex\"6001600055\""));
        assert!(src.contains("hex\"600160005500\""));
        assert!(src.contains("hex\"60016000\""));
        assert!(src.contains("INSERT_039_HERE"));
        assert!(src.contains("fn_sel = 0x60fe47b1;"));
        assert!(src.contains("view_sel = 0x6d4ce63c;"));
        assert!(!ws.path().join("test/test/BrokenThing.t.sol").exists());
    }

    #[test]
    fn test_generate_json_and_run_log() {
        let ws = Workspace::new();
        let output = cli()
            .current_dir(ws.path())
            .env("VYPER_BIN", &ws.vyper)
            .args(["--json", "generate", "--run-log", "logs"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["generated"], 1);
        assert_eq!(json["skipped"], 1);
        let files = json["files"].as_array().unwrap();
        assert_eq!(files[0]["outcome"], "skipped");
        assert_eq!(files[0]["kind"], "compiler");
        assert_eq!(files[1]["outcome"], "generated");
        assert_eq!(files[1]["contract"], "SimpleCounter");
        assert_eq!(files[1]["total_slots"], 2);

        let logs: Vec<_> = std::fs::read_dir(ws.path().join("logs"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(logs.len(), 1);
        let contents = std::fs::read_to_string(&logs[0]).unwrap();
        let records: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["run_id"], records[1]["run_id"]);
        assert_eq!(records[0]["run_id"], json["run_log"]["run_id"]);
        assert_eq!(
            records[0]["outcome"],
            "skipped:compiler",
            "compiler failures carry no finer tag"
        );
        assert_eq!(records[0]["success"], false);
        assert_eq!(records[1]["success"], true);
        assert_eq!(records[1]["digests"].as_array().unwrap().len(), 3);
        assert_eq!(records[1]["digests"][0]["byte_len"], 5);
    }

    #[test]
    fn test_patch_legacy_after_generate() {
        let ws = Workspace::new();
        cli()
            .current_dir(ws.path())
            .arg("generate")
            .arg("--vyper")
            .arg(&ws.vyper)
            .assert()
            .success();

        cli()
            .current_dir(ws.path())
            .env("VYPER_LEGACY_BIN", &ws.vyper)
            .arg("patch-legacy")
            .assert()
            .success()
            .stdout(predicate::str::contains("simple_counter.vy patched"))
            .stdout(predicate::str::contains("broken_thing.vy has no harness"));

        let src = std::fs::read_to_string(ws.harness()).unwrap();
        assert!(src.contains("hex\"deadbeef\""));
        assert!(!src.contains("INSERT_039_HERE"));

        cli()
            .current_dir(ws.path())
            .env("VYPER_LEGACY_BIN", &ws.vyper)
            .args(["--json", "patch-legacy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"already_patched\""));
        assert_eq!(std::fs::read_to_string(ws.harness()).unwrap(), src);
    }
}
