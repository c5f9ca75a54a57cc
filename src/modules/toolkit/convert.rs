//! Unit formatting: wei/gwei/ether and token decimals

use alloy_primitives::U256;

const DISPLAY_DECIMALS: usize = 4;

/// Wei as ether with 4 fractional digits, truncated
pub fn format_ether(wei: U256) -> String {
    format_units(wei, 18, DISPLAY_DECIMALS)
}

/// Wei as gwei with 2 fractional digits, truncated
pub fn format_gwei(wei: U256) -> String {
    format_units(wei, 9, 2)
}

/// Raw token amount scaled by `decimals`, 4 fractional digits, truncated
pub fn format_token_value(value: U256, decimals: u8) -> String {
    format_units(value, decimals as usize, DISPLAY_DECIMALS)
}

/// Parse a decimal or `0x` hex amount, as it appears in decoded parameters
pub fn parse_amount(value: &str) -> Option<U256> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => U256::from_str_radix(value, 10).ok(),
    }
}

/// Thousand separators for integer display (gas, block numbers)
pub fn format_with_separators(value: impl ToString) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn format_units(value: U256, decimals: usize, precision: usize) -> String {
    let digits = value.to_string();
    let (integer, fraction) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    if precision == 0 || decimals == 0 {
        return integer;
    }
    let mut fraction: String = fraction.chars().take(precision).collect();
    while fraction.len() < precision {
        fraction.push('0');
    }
    format!("{}.{}", integer, fraction)
}
