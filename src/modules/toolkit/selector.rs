//! Function selector and event topic calculation

use anyhow::{bail, Result};

use super::ToolResult;
use crate::domain::abi::{derive_event_topic, derive_selector, normalize_signature};

/// Compute selector and event topic from a human-typed signature
pub fn selector(input: &str) -> Result<ToolResult> {
    let sig = input.trim();
    if sig.is_empty() {
        bail!("Usage: selector transfer(address,uint256)");
    }

    let normalized = normalize_signature(sig);
    if !normalized.contains('(') || !normalized.ends_with(')') {
        bail!("Not a function signature: {}", sig);
    }

    Ok(ToolResult::new("Selector")
        .add("signature", normalized.clone())
        .add("selector", derive_selector(&normalized).to_string())
        .add("topic", derive_event_topic(&normalized)))
}
