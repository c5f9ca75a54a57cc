//! Classification of ABI type strings into slot decoding rules

/// How a single 32-byte slot is rendered for a given ABI type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Trailing 20 bytes, `0x`-prefixed
    Address,
    /// Unsigned big-endian integer rendered in decimal
    Uint,
    /// Rendered exactly like `Uint`: the slot is read as unsigned
    Int,
    /// `"true"` when the slot value is exactly 1
    Bool,
    /// Raw slot hex, `0x`-prefixed (dynamic and unrecognized types)
    Raw,
}

impl SlotKind {
    pub fn classify(kind: &str) -> Self {
        match kind {
            "address" => Self::Address,
            "bool" => Self::Bool,
            _ if is_sized_integer(kind, "uint") => Self::Uint,
            _ if is_sized_integer(kind, "int") => Self::Int,
            _ => Self::Raw,
        }
    }
}

/// True for `prefix` or `prefix` followed only by a bit width (`uint`, `uint256`)
fn is_sized_integer(kind: &str, prefix: &str) -> bool {
    kind.strip_prefix(prefix)
        .map(|bits| bits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Whether the ABI encodes this type through an offset into the tail
///
/// These types are not unpacked by the slot decoder; they fall back to
/// raw-slot passthrough.
pub fn is_dynamic(kind: &str) -> bool {
    kind == "string"
        || kind == "bytes"
        || kind.ends_with("[]")
        || kind.starts_with("tuple")
        || kind.starts_with('(')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SlotKind::classify("address"), SlotKind::Address);
        assert_eq!(SlotKind::classify("uint256"), SlotKind::Uint);
        assert_eq!(SlotKind::classify("uint8"), SlotKind::Uint);
        assert_eq!(SlotKind::classify("uint"), SlotKind::Uint);
        assert_eq!(SlotKind::classify("int128"), SlotKind::Int);
        assert_eq!(SlotKind::classify("bool"), SlotKind::Bool);
        assert_eq!(SlotKind::classify("bytes32"), SlotKind::Raw);
        assert_eq!(SlotKind::classify("string"), SlotKind::Raw);
    }

    #[test]
    fn test_arrays_are_raw() {
        assert_eq!(SlotKind::classify("uint256[]"), SlotKind::Raw);
        assert_eq!(SlotKind::classify("address[2]"), SlotKind::Raw);
        assert_eq!(SlotKind::classify("bool[]"), SlotKind::Raw);
    }

    #[test]
    fn test_is_dynamic() {
        assert!(is_dynamic("string"));
        assert!(is_dynamic("bytes"));
        assert!(is_dynamic("address[]"));
        assert!(is_dynamic("tuple"));
        assert!(!is_dynamic("bytes32"));
        assert!(!is_dynamic("uint256"));
    }
}
