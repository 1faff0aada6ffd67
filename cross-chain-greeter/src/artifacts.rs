//! Compiled contract artifacts
//!
//! The L1 greeter comes out of a Foundry build, the L2 greeter out of a
//! `cargo stylus` build. Both must exist before anything touches the network.

use std::{fs, path::Path};

use alloy::{hex, primitives::Bytes};
use alloy_json_abi::{Function, JsonAbi};
use serde::Deserialize;
use tracing::debug;

use crate::{config::ArtifactPaths, error::GreeterError};

/// Functions the demo calls on the L1 greeter
pub const L1_REQUIRED_FUNCTIONS: [&str; 2] = ["updateL2Target", "setGreetingInL2"];

/// Functions the demo calls on the L2 greeter
pub const L2_REQUIRED_FUNCTIONS: [&str; 3] = ["greet", "setGreeting", "updateL1Target"];

/// Foundry build output, only the fields the demo uses
#[derive(Debug, Deserialize)]
struct FoundryArtifact {
    abi: JsonAbi,
    bytecode: FoundryBytecode,
}

#[derive(Debug, Deserialize)]
struct FoundryBytecode {
    object: Bytes,
}

/// L1 greeter creation code and ABI
#[derive(Debug, Clone)]
pub struct L1Artifact {
    pub abi: JsonAbi,
    /// Creation code, without constructor arguments
    pub bytecode: Bytes,
}

/// L2 greeter init code and its exported interface
#[derive(Debug, Clone)]
pub struct L2Artifact {
    /// Signatures parsed from the exported interface
    pub abi: Vec<Function>,
    /// Deployment transaction data
    pub init_code: Bytes,
}

/// Both greeters, ready to deploy
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub l1: L1Artifact,
    pub l2: L2Artifact,
}

impl Artifacts {
    /// Load both artifacts
    ///
    /// Presence of every file is checked before any of them is parsed, so a
    /// missing build is always reported as such.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, GreeterError> {
        require_file(&paths.l1_artifact, "L1")?;
        require_file(&paths.l2_bytecode, "L2")?;
        require_file(&paths.l2_abi, "L2")?;

        Ok(Self {
            l1: load_l1_artifact(&paths.l1_artifact)?,
            l2: load_l2_artifact(&paths.l2_bytecode, &paths.l2_abi)?,
        })
    }
}

fn require_file(path: &Path, layer: &'static str) -> Result<(), GreeterError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(GreeterError::MissingArtifact {
            layer,
            path: path.to_path_buf(),
        })
    }
}

fn artifact_error(path: &Path, reason: impl ToString) -> GreeterError {
    GreeterError::Artifact {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Read a Foundry JSON artifact
pub fn load_l1_artifact(path: &Path) -> Result<L1Artifact, GreeterError> {
    let raw = fs::read_to_string(path).map_err(|e| artifact_error(path, e))?;
    let artifact: FoundryArtifact = serde_json::from_str(&raw).map_err(|e| artifact_error(path, e))?;

    if artifact.bytecode.object.is_empty() {
        return Err(artifact_error(path, "empty bytecode"));
    }
    if artifact.abi.constructor.is_none() {
        return Err(artifact_error(path, "no constructor in ABI"));
    }
    for name in L1_REQUIRED_FUNCTIONS {
        if !artifact.abi.functions.contains_key(name) {
            return Err(artifact_error(path, format!("function {name} missing from ABI")));
        }
    }
    debug!("Loaded L1 artifact with {} bytes of bytecode", artifact.bytecode.object.len());

    Ok(L1Artifact {
        abi: artifact.abi,
        bytecode: artifact.bytecode.object,
    })
}

/// Read the Stylus deployment data and exported interface
pub fn load_l2_artifact(bytecode_path: &Path, abi_path: &Path) -> Result<L2Artifact, GreeterError> {
    let raw = fs::read(bytecode_path).map_err(|e| artifact_error(bytecode_path, e))?;
    let init_code = decode_init_code(&raw);
    if init_code.is_empty() {
        return Err(artifact_error(bytecode_path, "empty deployment data"));
    }

    let exported = fs::read_to_string(abi_path).map_err(|e| artifact_error(abi_path, e))?;
    let abi = parse_exported_abi(&exported).map_err(|e| artifact_error(abi_path, e))?;
    for name in L2_REQUIRED_FUNCTIONS {
        if !abi.iter().any(|f| f.name == name) {
            return Err(artifact_error(abi_path, format!("function {name} missing from interface")));
        }
    }
    debug!("Loaded L2 artifact with {} bytes of init code", init_code.len());

    Ok(L2Artifact { abi, init_code })
}

/// Deployment data is written either as raw bytes or as hex text
pub fn decode_init_code(raw: &[u8]) -> Bytes {
    match std::str::from_utf8(raw) {
        Ok(text) => {
            let text = text.trim();
            match hex::decode(text) {
                Ok(decoded) if !text.is_empty() => Bytes::from(decoded),
                _ => Bytes::copy_from_slice(raw),
            }
        }
        Err(_) => Bytes::copy_from_slice(raw),
    }
}

/// Extract the function signatures of an exported Solidity interface
///
/// Only `function` lines are kept; `constructor` and `event` lines are
/// recognised and skipped since the demo never calls them.
pub fn parse_exported_abi(exported: &str) -> Result<Vec<Function>, String> {
    let mut functions = Vec::new();
    for line in exported.lines().map(str::trim) {
        let is_item = ["function", "constructor", "event"]
            .iter()
            .any(|keyword| line.starts_with(keyword));
        if !is_item {
            continue;
        }

        let signature = line.replace(';', "");
        if signature.starts_with("function") {
            let function = Function::parse(&signature)
                .map_err(|e| format!("cannot parse `{signature}`: {e}"))?;
            functions.push(function);
        }
    }
    Ok(functions)
}
