//! ABI files on disk: raw arrays or build artifacts with an `abi` field

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::domain::abi::{parse_abi, AbiDescriptor};

/// An ABI read from a file
#[derive(Debug, Clone)]
pub struct AbiFile {
    /// The bare ABI array, re-serialized
    pub abi_json: String,
    /// `contractName` from Hardhat/Truffle artifacts
    pub contract_name: Option<String>,
    pub descriptors: Vec<AbiDescriptor>,
}

/// Load a single ABI file
pub fn load_abi_file(path: &Path) -> Result<AbiFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file = parse_abi_file(&content).with_context(|| format!("No usable ABI in {}", path.display()))?;
    debug!(path = %path.display(), descriptors = file.descriptors.len(), "loaded ABI file");
    Ok(file)
}

/// Extract the ABI from either a raw array or an artifact object
pub fn parse_abi_file(content: &str) -> Result<AbiFile> {
    let value: Value = serde_json::from_str(content).context("File is not JSON")?;

    // Try to extract ABI - either raw array or nested in "abi" field
    let (abi_value, contract_name) = if value.is_array() {
        (value, None)
    } else if let Some(abi) = value.get("abi") {
        let name = value
            .get("contractName")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        (abi.clone(), name)
    } else {
        bail!("Expected an ABI array or an object with an \"abi\" field");
    };

    let abi_json = serde_json::to_string(&abi_value)?;
    let descriptors = parse_abi(&abi_json)?;
    Ok(AbiFile {
        abi_json,
        contract_name,
        descriptors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPOSIT: &str = r#"[{"type":"function","name":"deposit","inputs":[],"stateMutability":"payable"}]"#;

    #[test]
    fn test_raw_array() {
        let file = parse_abi_file(DEPOSIT).unwrap();
        assert_eq!(file.descriptors.len(), 1);
        assert_eq!(file.contract_name, None);
    }

    #[test]
    fn test_artifact_object() {
        let artifact = format!(r#"{{"contractName":"WETH9","abi":{},"bytecode":"0x"}}"#, DEPOSIT);
        let file = parse_abi_file(&artifact).unwrap();
        assert_eq!(file.contract_name.as_deref(), Some("WETH9"));
        assert_eq!(file.descriptors[0].name, "deposit");
        assert!(file.abi_json.starts_with('['));
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(parse_abi_file(r#"{"bytecode":"0x"}"#).is_err());
        assert!(parse_abi_file(r#"{"abi":{"type":"function"}}"#).is_err());
        assert!(parse_abi_file("not json").is_err());
    }
}
