//! Selector and event-topic derivation
//!
//! Selectors are the first 4 bytes of the keccak-256 hash of the canonical
//! signature; event topics are the full 32-byte hash.

use alloy_primitives::keccak256;

use super::types::{AbiParameter, FunctionSelector};

/// Hex length of an encoded call selector including the `0x` prefix
pub const SELECTOR_HEX_LEN: usize = 10;

/// Compute the 4-byte function selector from a canonical signature
pub fn derive_selector(signature: &str) -> FunctionSelector {
    let hash = keccak256(signature.as_bytes());
    FunctionSelector::from_bytes([hash[0], hash[1], hash[2], hash[3]])
}

/// Compute the 32-byte event topic from a canonical signature
pub fn derive_event_topic(signature: &str) -> String {
    let hash = keccak256(signature.as_bytes());
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Build `name(type1,type2,...)` from a parameter list
pub fn canonical_signature(name: &str, params: &[AbiParameter]) -> String {
    let types: Vec<String> = params.iter().map(canonical_type).collect();
    format!("{}({})", name, types.join(","))
}

/// Canonical type of one parameter
///
/// `tuple` types are spelled out from their components, keeping any array
/// suffix: `tuple[2]` with `(address,uint256)` becomes `(address,uint256)[2]`.
pub fn canonical_type(param: &AbiParameter) -> String {
    match param.kind.strip_prefix("tuple") {
        Some(suffix) if suffix.is_empty() || suffix.starts_with('[') => {
            let inner: Vec<String> = param.components.iter().map(canonical_type).collect();
            format!("({}){}", inner.join(","), suffix)
        }
        _ => param.kind.clone(),
    }
}

/// Leading selector of call data
///
/// `None` for input too short to carry one and for a head that is not hex.
pub fn extract_function_selector(input: &str) -> Option<FunctionSelector> {
    let head = input.trim().get(..SELECTOR_HEX_LEN)?;
    FunctionSelector::parse(head)
}

/// Normalize a human-typed signature into canonical form
///
/// Drops a leading `function`/`event` keyword, any `returns (...)` clause,
/// parameter names and data-location keywords, and all whitespace:
/// `function transfer(address to, uint256 amount) returns (bool)` becomes
/// `transfer(address,uint256)`.
pub fn normalize_signature(sig: &str) -> String {
    let sig = sig.trim();
    let sig = sig
        .strip_prefix("function ")
        .or_else(|| sig.strip_prefix("event "))
        .unwrap_or(sig)
        .trim();

    // Anything after the parameter list (`returns (...)`, modifiers) is dropped.
    // Unbalanced input passes through with only whitespace removed.
    let Some(open) = sig.find('(') else {
        return sig.chars().filter(|c| !c.is_whitespace()).collect();
    };
    let Some(close) = matching_paren(sig, open) else {
        return sig.chars().filter(|c| !c.is_whitespace()).collect();
    };

    let name = sig[..open].trim();
    let types: Vec<String> = split_top_level(&sig[open + 1..close])
        .into_iter()
        .map(strip_param_name)
        .filter(|ty| !ty.is_empty())
        .collect();

    format!("{}({})", name, types.join(","))
}

/// Byte index of the `)` closing the `(` at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in args.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&args[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

/// Keep only the type of `type [indexed|memory|...] [name]`
fn strip_param_name(arg: &str) -> String {
    let arg = arg.trim();
    let mut depth = 0usize;
    let mut end = arg.len();
    for (idx, ch) in arg.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                end = idx;
                break;
            }
            _ => {}
        }
    }
    let head = &arg[..end];
    if head.starts_with('(') {
        // Nested tuple: normalize each member the same way
        let Some(close) = matching_paren(head, 0) else {
            return head.to_string();
        };
        let members: Vec<String> = split_top_level(&head[1..close])
            .into_iter()
            .map(strip_param_name)
            .filter(|ty| !ty.is_empty())
            .collect();
        format!("({}){}", members.join(","), &head[close + 1..])
    } else {
        head.to_string()
    }
}
