//! ABI lookup by contract address
//!
//! Decoders never reach for a global ABI store; callers pass an [`AbiLookup`]
//! so the codec can be exercised without any persistence behind it.

use std::collections::HashMap;

use crate::domain::address::normalize_address;

use super::types::AbiDescriptor;

/// Address -> saved ABI capability
///
/// Keys are normalized to lowercase `0x` form by implementations.
pub trait AbiLookup {
    fn get(&self, address: &str) -> Option<Vec<AbiDescriptor>>;
}

impl<T: AbiLookup + ?Sized> AbiLookup for &T {
    fn get(&self, address: &str) -> Option<Vec<AbiDescriptor>> {
        (**self).get(address)
    }
}

/// In-memory registry of descriptor sets keyed by contract address
#[derive(Debug, Default, Clone)]
pub struct AbiRegistry {
    abis: HashMap<String, Vec<AbiDescriptor>>,
}

impl AbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the ABI for an address
    pub fn insert(&mut self, address: &str, descriptors: Vec<AbiDescriptor>) {
        self.abis.insert(normalize_address(address), descriptors);
    }

    pub fn contains(&self, address: &str) -> bool {
        self.abis.contains_key(&normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}

impl AbiLookup for AbiRegistry {
    fn get(&self, address: &str) -> Option<Vec<AbiDescriptor>> {
        self.abis.get(&normalize_address(address)).cloned()
    }
}

/// Consults several lookups in order; the first hit wins
#[derive(Default)]
pub struct ChainedLookup<'a> {
    layers: Vec<&'a dyn AbiLookup>,
}

impl<'a> ChainedLookup<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn with(mut self, lookup: &'a dyn AbiLookup) -> Self {
        self.layers.push(lookup);
        self
    }
}

impl AbiLookup for ChainedLookup<'_> {
    fn get(&self, address: &str) -> Option<Vec<AbiDescriptor>> {
        self.layers.iter().find_map(|layer| layer.get(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::types::AbiParameter;

    fn transfer() -> Vec<AbiDescriptor> {
        vec![AbiDescriptor::function(
            "transfer",
            vec![AbiParameter::new("to", "address"), AbiParameter::new("amount", "uint256")],
        )]
    }

    #[test]
    fn test_registry_insert_lookup() {
        let mut registry = AbiRegistry::new();
        registry.insert("0xABCDEF0000000000000000000000000000000001", transfer());

        assert_eq!(registry.len(), 1);
        assert!(registry.get("0xabcdef0000000000000000000000000000000001").is_some());
        assert!(registry.contains("0XABCDEF0000000000000000000000000000000001"));
        assert!(registry.get("0x0000000000000000000000000000000000000002").is_none());
    }

    #[test]
    fn test_chained_lookup_order() {
        let mut overlay = AbiRegistry::new();
        overlay.insert("0x01", transfer());
        let mut base = AbiRegistry::new();
        base.insert("0x01", Vec::new());
        base.insert("0x02", transfer());

        let chained = ChainedLookup::new().with(&overlay).with(&base);
        assert_eq!(chained.get("0x01").unwrap().len(), 1);
        assert_eq!(chained.get("0x02").unwrap().len(), 1);
        assert!(chained.get("0x03").is_none());
    }
}
