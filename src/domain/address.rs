//! Address normalization and display helpers

use alloy_primitives::keccak256;

/// Lowercase, `0x`-prefixed form used as the key for per-address data
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", payload.to_lowercase())
}

pub fn addresses_match(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Whether the value is `0x` + 40 hex characters
pub fn is_address(value: &str) -> bool {
    let value = value.trim();
    let payload = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or("");
    payload.len() == 40 && payload.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Left-pad an address to a 32-byte topic value
pub fn pad_address_to_bytes32(address: &str) -> String {
    let normalized = normalize_address(address);
    format!("0x{:0>64}", &normalized[2..])
}

/// Shorten a long hex value for display: `0x1234..abcd`
pub fn truncate_middle(value: &str, start_chars: usize, end_chars: usize) -> String {
    let value = value.trim();
    let len = value.chars().count();
    if len <= start_chars + end_chars {
        return value.to_string();
    }
    let start: String = value.chars().take(start_chars).collect();
    let end: String = value.chars().skip(len - end_chars).collect();
    format!("{}..{}", start, end)
}

/// EIP-55 mixed-case checksum encoding
pub fn to_checksum_address(address: &str) -> Option<String> {
    if !is_address(address) {
        return None;
    }
    let lower = normalize_address(address);
    let addr = &lower[2..];
    let hash_hex = hex::encode(keccak256(addr.as_bytes()).as_slice());

    let mut result = String::with_capacity(42);
    result.push_str("0x");
    for (c, h) in addr.chars().zip(hash_hex.chars()) {
        if h.to_digit(16).unwrap_or(0) >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("  0XABCdef "), "0xabcdef");
        assert_eq!(normalize_address("abcdef"), "0xabcdef");
        assert!(addresses_match("0xAbC", "0xabc"));
    }

    #[test]
    fn test_is_address() {
        assert!(is_address("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"));
        assert!(!is_address("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d35"));
        assert!(!is_address("fb6916095ca1df60bb79ce92ce3ea74c37c5d359"));
    }

    #[test]
    fn test_pad_address() {
        assert_eq!(
            pad_address_to_bytes32("0x742D35cc6634C0532925a3b844Bc9e7595f0bEb0"),
            "0x000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f0beb0"
        );
    }

    #[test]
    fn test_truncate_middle() {
        assert_eq!(
            truncate_middle("0x742d35cc6634c0532925a3b844bc9e7595f0beb0", 6, 4),
            "0x742d..beb0"
        );
        assert_eq!(truncate_middle("0x1234", 6, 4), "0x1234");
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            to_checksum_address("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").as_deref(),
            Some("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")
        );
        assert_eq!(to_checksum_address("0x1234"), None);
    }
}
