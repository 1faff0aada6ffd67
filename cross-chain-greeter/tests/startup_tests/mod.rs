//! Startup tests
//!
//! Environment and artifact checks. The binary is run as a black box in an
//! empty directory: every failure here must happen before any RPC is issued,
//! so the RPC URLs point at a port nothing listens on.

use std::{fs, path::Path, process::Command};

use cross_chain_greeter::{
    artifacts::{decode_init_code, load_l1_artifact, load_l2_artifact, parse_exported_abi, Artifacts},
    config::{require_env_vars, ArtifactPaths},
    error::GreeterError,
};
use tempfile::TempDir;

const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const UNREACHABLE_RPC: &str = "http://127.0.0.1:9";

const GREETER_L1_ARTIFACT: &str = r#"{
  "abi": [
    {
      "type": "constructor",
      "inputs": [
        { "name": "_greeting", "type": "string", "internalType": "string" },
        { "name": "_l2Target", "type": "address", "internalType": "address" },
        { "name": "_inbox", "type": "address", "internalType": "address" }
      ],
      "stateMutability": "nonpayable"
    },
    {
      "type": "function",
      "name": "updateL2Target",
      "inputs": [{ "name": "_l2Target", "type": "address", "internalType": "address" }],
      "outputs": [],
      "stateMutability": "nonpayable"
    },
    {
      "type": "function",
      "name": "setGreetingInL2",
      "inputs": [
        { "name": "_greeting", "type": "string", "internalType": "string" },
        { "name": "maxSubmissionCost", "type": "uint256", "internalType": "uint256" },
        { "name": "maxGas", "type": "uint256", "internalType": "uint256" },
        { "name": "gasPriceBid", "type": "uint256", "internalType": "uint256" }
      ],
      "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
      "stateMutability": "payable"
    }
  ],
  "bytecode": { "object": "0x6080604052348015600f57600080fd5b50" }
}"#;

const GREETER_L2_ABI: &str = r#"/**
 * This file was automatically generated by Stylus and represents a Rust program.
 */

interface IGreeterL2 {
    function getL1Target() external view returns (address);

    function updateL1Target(address l1_target) external;

    function greet() external view returns (string memory);

    function setGreeting(string calldata greeting) external;

    function setGreetingInL1(string calldata greeting) external returns (uint256);
}
"#;

/// The binary with no inherited configuration, run from `dir`
fn greeter_command(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cross-chain-greeter"));
    command.current_dir(dir);
    for name in [
        "PRIVATE_KEY",
        "L1RPC",
        "L2RPC",
        "INBOX_ADDRESS",
        "L1_ARTIFACT",
        "L2_BYTECODE",
        "L2_ABI",
    ] {
        command.env_remove(name);
    }
    command
}

fn write_l1_artifact(root: &Path) {
    let dir = root.join("l1/out/GreeterL1.sol");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("GreeterL1.json"), GREETER_L1_ARTIFACT).unwrap();
}

fn write_l2_artifacts(root: &Path) {
    let dir = root.join("l2/out");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("deployment_tx_data"), [0xef, 0xf0, 0x00, 0x00, 0x00, 0x61]).unwrap();
    fs::write(dir.join("abi"), GREETER_L2_ABI).unwrap();
}

fn paths(root: &Path) -> ArtifactPaths {
    ArtifactPaths {
        l1_artifact: root.join("l1/out/GreeterL1.sol/GreeterL1.json"),
        l2_bytecode: root.join("l2/out/deployment_tx_data"),
        l2_abi: root.join("l2/out/abi"),
    }
}

#[test]
fn test_missing_env_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    write_l1_artifact(dir.path());
    write_l2_artifacts(dir.path());

    let output = greeter_command(dir.path()).output().expect("binary runs");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("set your 'PRIVATE_KEY' environmental variable"), "stderr: {stderr}");
}

#[test]
fn test_each_required_env_var_is_checked() {
    let dir = TempDir::new().unwrap();

    let output = greeter_command(dir.path())
        .env("PRIVATE_KEY", ANVIL_KEY)
        .env("L2RPC", UNREACHABLE_RPC)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("'L1RPC'"));

    // Empty counts as unset
    let output = greeter_command(dir.path())
        .env("PRIVATE_KEY", ANVIL_KEY)
        .env("L2RPC", "")
        .env("L1RPC", UNREACHABLE_RPC)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("'L2RPC'"));
}

#[test]
fn test_invalid_private_key_exits_with_failure() {
    let dir = TempDir::new().unwrap();

    let output = greeter_command(dir.path())
        .env("PRIVATE_KEY", "not-a-key")
        .env("L2RPC", UNREACHABLE_RPC)
        .env("L1RPC", UNREACHABLE_RPC)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("PRIVATE_KEY is not a valid key"));
}

#[test]
fn test_missing_artifacts_exit_with_failure() {
    let dir = TempDir::new().unwrap();
    let run = || {
        greeter_command(dir.path())
            .env("PRIVATE_KEY", ANVIL_KEY)
            .env("L2RPC", UNREACHABLE_RPC)
            .env("L1RPC", UNREACHABLE_RPC)
            .output()
            .unwrap()
    };

    let output = run();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("You must compile the L1 contract"), "stderr: {stderr}");

    write_l1_artifact(dir.path());
    let output = run();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("You must compile the L2 contract"), "stderr: {stderr}");
    // Nothing was attempted against the unreachable nodes
    assert!(!stderr.contains("cannot reach"));
}

#[test]
fn test_require_env_vars() {
    std::env::set_var("GREETER_STARTUP_TEST_SET", "1");
    assert!(require_env_vars(&["GREETER_STARTUP_TEST_SET"]).is_ok());

    let err = require_env_vars(&["GREETER_STARTUP_TEST_SET", "GREETER_STARTUP_TEST_UNSET"]).unwrap_err();
    assert!(matches!(err, GreeterError::MissingEnv("GREETER_STARTUP_TEST_UNSET")));
}

#[test]
fn test_artifacts_load() {
    let dir = TempDir::new().unwrap();
    write_l1_artifact(dir.path());
    write_l2_artifacts(dir.path());

    let artifacts = Artifacts::load(&paths(dir.path())).expect("artifacts load");
    assert_eq!(artifacts.l1.bytecode.len(), 17);
    assert!(artifacts.l1.abi.constructor.is_some());
    assert_eq!(artifacts.l2.init_code.as_ref(), &[0xef, 0xf0, 0x00, 0x00, 0x00, 0x61]);
    assert_eq!(artifacts.l2.abi.len(), 5);
}

#[test]
fn test_l1_artifact_must_declare_used_functions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("GreeterL1.json");
    fs::write(&path, r#"{ "abi": [], "bytecode": { "object": "0x6080" } }"#).unwrap();

    let err = load_l1_artifact(&path).unwrap_err();
    assert!(matches!(err, GreeterError::Artifact { .. }));
}

#[test]
fn test_l2_interface_must_declare_used_functions() {
    let dir = TempDir::new().unwrap();
    let bytecode = dir.path().join("deployment_tx_data");
    let abi = dir.path().join("abi");
    fs::write(&bytecode, "0xeff000").unwrap();
    fs::write(&abi, "interface IGreeterL2 {\n    function greet() external view returns (string memory);\n}\n").unwrap();

    let err = load_l2_artifact(&bytecode, &abi).unwrap_err();
    assert!(err.to_string().contains("setGreeting"));
}

#[test]
fn test_parse_exported_abi() {
    let functions = parse_exported_abi(GREETER_L2_ABI).expect("interface parses");
    let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["getL1Target", "updateL1Target", "greet", "setGreeting", "setGreetingInL1"]
    );
    assert_eq!(functions[3].signature(), "setGreeting(string)");
}

#[test]
fn test_decode_init_code() {
    assert_eq!(decode_init_code(b"0xeff000").as_ref(), &[0xef, 0xf0, 0x00]);
    assert_eq!(decode_init_code(b"eff000\n").as_ref(), &[0xef, 0xf0, 0x00]);
    assert_eq!(decode_init_code(&[0xef, 0xf0, 0x00]).as_ref(), &[0xef, 0xf0, 0x00]);
}
