//! ABI schema descriptors and decoded-value records

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A function/event parameter specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    /// Parameter name (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Solidity type as written in the ABI (e.g., "address", "uint256", "tuple[]")
    #[serde(rename = "type")]
    pub kind: String,
    /// Event parameters only: value lives in a topic instead of the data blob
    #[serde(default, skip_serializing_if = "is_false")]
    pub indexed: bool,
    /// Members of a `tuple` type, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParameter>,
}

impl AbiParameter {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            indexed: false,
            components: Vec::new(),
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Kind of ABI entry kept after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Function,
    Constructor,
    Event,
}

impl DescriptorKind {
    /// Map an ABI `type` field to a retained kind; everything else is dropped
    pub fn from_abi_type(value: &str) -> Option<Self> {
        match value {
            "function" => Some(Self::Function),
            "constructor" => Some(Self::Constructor),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Constructor => "constructor",
            Self::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

impl StateMutability {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "pure" => Some(Self::Pure),
            "view" => Some(Self::View),
            "nonpayable" => Some(Self::Nonpayable),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pure => "pure",
            Self::View => "view",
            Self::Nonpayable => "nonpayable",
            Self::Payable => "payable",
        };
        f.write_str(s)
    }
}

/// One retained entry of a contract ABI
///
/// Field names follow the JSON ABI format so a descriptor set can be written
/// back out with `serde_json` and parsed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiDescriptor {
    #[serde(rename = "type")]
    pub kind: DescriptorKind,
    /// Empty for constructors
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    /// Functions only; empty for void
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParameter>,
    #[serde(
        rename = "stateMutability",
        default,
        deserialize_with = "lenient_mutability",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<StateMutability>,
    /// Events only: anonymous events carry no signature topic
    #[serde(default, skip_serializing_if = "is_false")]
    pub anonymous: bool,
}

impl AbiDescriptor {
    pub fn function(name: impl Into<String>, inputs: Vec<AbiParameter>) -> Self {
        Self {
            kind: DescriptorKind::Function,
            name: name.into(),
            inputs,
            outputs: Vec::new(),
            state_mutability: None,
            anonymous: false,
        }
    }

    pub fn event(name: impl Into<String>, inputs: Vec<AbiParameter>) -> Self {
        Self {
            kind: DescriptorKind::Event,
            ..Self::function(name, inputs)
        }
    }

    pub fn with_outputs(mut self, outputs: Vec<AbiParameter>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn is_function(&self) -> bool {
        self.kind == DescriptorKind::Function
    }

    pub fn is_event(&self) -> bool {
        self.kind == DescriptorKind::Event
    }

    /// Mutability used for display; absent means `nonpayable`
    pub fn effective_mutability(&self) -> StateMutability {
        self.state_mutability.unwrap_or(StateMutability::Nonpayable)
    }

    /// Canonical signature (e.g., "transfer(address,uint256)")
    pub fn signature(&self) -> String {
        super::selector::canonical_signature(&self.name, &self.inputs)
    }
}

/// A 4-byte function selector rendered as `0x` + 8 lowercase hex chars
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionSelector(String);

impl FunctionSelector {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Parse a selector string (e.g., "0xa9059cbb"), case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        let payload = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))?;
        if payload.len() != 8 || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("0x{}", payload.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        // Constructed only from validated hex, so decoding cannot fail
        if let Ok(bytes) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl AsRef<str> for FunctionSelector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded argument, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedParameter {
    /// Parameter name (or "param{n}" / "return{n}" if unnamed)
    pub name: String,
    /// Solidity type as declared in the ABI
    #[serde(rename = "type")]
    pub kind: String,
    /// Decimal for integers, "true"/"false", 0x-hex for addresses and raw slots
    pub value: String,
    /// Event parameters only
    #[serde(default, skip_serializing_if = "is_false")]
    pub indexed: bool,
}

/// Result of matching and decoding transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCall {
    pub selector: FunctionSelector,
    /// Canonical signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    pub descriptor: AbiDescriptor,
    pub params: Vec<DecodedParameter>,
}

impl DecodedCall {
    pub fn function_name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Result of matching and decoding a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub name: String,
    /// Canonical signature (e.g., "Transfer(address,address,uint256)")
    pub signature: String,
    pub params: Vec<DecodedParameter>,
}

/// A log entry as returned by `eth_getTransactionReceipt` / `eth_getLogs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Unknown mutability strings are treated as absent rather than rejected
fn lenient_mutability<'de, D>(deserializer: D) -> Result<Option<StateMutability>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(StateMutability::parse))
}
