//! ABI JSON parsing and display formatting

use serde_json::Value;

use super::error::AbiError;
use super::types::{AbiDescriptor, DescriptorKind};

/// Parse ABI JSON text into the retained descriptors
///
/// The text must be a JSON array. Entries whose `type` is not `function`,
/// `constructor` or `event` are dropped; order is preserved and duplicates
/// are kept.
pub fn parse_abi(json_text: &str) -> Result<Vec<AbiDescriptor>, AbiError> {
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| AbiError::malformed(format!("not valid JSON ({})", e)))?;

    let Value::Array(entries) = value else {
        return Err(AbiError::malformed("ABI must be an array"));
    };

    let mut descriptors = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let retained = entry
            .get("type")
            .and_then(Value::as_str)
            .and_then(DescriptorKind::from_abi_type)
            .is_some();
        if !retained {
            continue;
        }

        let descriptor: AbiDescriptor = serde_json::from_value(entry)
            .map_err(|e| AbiError::malformed(format!("entry {}: {}", idx, e)))?;
        if let Some(param) = descriptor
            .inputs
            .iter()
            .chain(descriptor.outputs.iter())
            .find(|param| param.kind.trim().is_empty())
        {
            return Err(AbiError::malformed(format!(
                "entry {}: parameter '{}' has an empty type",
                idx, param.name
            )));
        }
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

/// One line per function: `name(type name, ...) mutability returns (types)`
pub fn format_abi_for_display(descriptors: &[AbiDescriptor]) -> String {
    descriptors
        .iter()
        .filter(|descriptor| descriptor.is_function())
        .map(|func| {
            let params = func
                .inputs
                .iter()
                .map(|input| format!("{} {}", input.kind, input.name))
                .collect::<Vec<_>>()
                .join(", ");
            let returns = if func.outputs.is_empty() {
                "void".to_string()
            } else {
                func.outputs
                    .iter()
                    .map(|output| output.kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "{}({}) {} returns ({})",
                func.name,
                params,
                func.effective_mutability(),
                returns
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
