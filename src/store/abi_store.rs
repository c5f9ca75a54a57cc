//! Persistent store for contract ABIs keyed by address

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::domain::abi::{parse_abi, AbiDescriptor, AbiLookup};
use crate::domain::address::normalize_address;

/// Saved contract ABI row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAbi {
    pub address: String,
    pub abi_json: String,
    pub contract_name: Option<String>,
}

/// SQLite-backed ABI store
#[derive(Debug)]
pub struct AbiStore {
    conn: Connection,
}

impl AbiStore {
    /// Open or create the store database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS abis (
                address       TEXT PRIMARY KEY,
                abi_json      TEXT NOT NULL,
                contract_name TEXT,
                created_at    INTEGER DEFAULT (strftime('%s', 'now'))
            );
            ",
        )?;
        Ok(())
    }

    /// Validate and save an ABI, replacing any previous one for the address
    ///
    /// Returns the number of descriptors kept by the parser.
    pub fn save(&self, address: &str, abi_json: &str, contract_name: Option<&str>) -> Result<usize> {
        let descriptors = parse_abi(abi_json).context("Refusing to save ABI")?;
        let address = normalize_address(address);
        self.conn.execute(
            "INSERT INTO abis(address, abi_json, contract_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(address) DO UPDATE SET
                abi_json=excluded.abi_json,
                contract_name=excluded.contract_name",
            params![address, abi_json, contract_name],
        )?;
        debug!(%address, descriptors = descriptors.len(), "saved ABI");
        Ok(descriptors.len())
    }

    /// Raw row for an address
    pub fn get_raw(&self, address: &str) -> Result<Option<StoredAbi>> {
        let row = self
            .conn
            .query_row(
                "SELECT address, abi_json, contract_name FROM abis WHERE address = ?1",
                params![normalize_address(address)],
                |row| {
                    Ok(StoredAbi {
                        address: row.get(0)?,
                        abi_json: row.get(1)?,
                        contract_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Parsed descriptors for an address
    pub fn get_descriptors(&self, address: &str) -> Result<Option<Vec<AbiDescriptor>>> {
        match self.get_raw(address)? {
            Some(stored) => {
                let descriptors = parse_abi(&stored.abi_json)
                    .with_context(|| format!("Stored ABI for {} is invalid", stored.address))?;
                Ok(Some(descriptors))
            }
            None => Ok(None),
        }
    }

    /// Remove the ABI for an address; returns whether a row existed
    pub fn remove(&self, address: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM abis WHERE address = ?1",
            params![normalize_address(address)],
        )?;
        Ok(deleted > 0)
    }

    /// All saved ABIs ordered by address
    pub fn list(&self) -> Result<Vec<StoredAbi>> {
        let mut stmt = self
            .conn
            .prepare("SELECT address, abi_json, contract_name FROM abis ORDER BY address")?;

        let mut rows = stmt.query([])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(StoredAbi {
                address: row.get(0)?,
                abi_json: row.get(1)?,
                contract_name: row.get(2)?,
            });
        }
        Ok(results)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM abis", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl AbiLookup for AbiStore {
    fn get(&self, address: &str) -> Option<Vec<AbiDescriptor>> {
        match self.get_descriptors(address) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                warn!(address, error = %format!("{err:#}"), "ABI lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ERC20_TRANSFER: &str = r#"[
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
        {"type":"error","name":"Nope","inputs":[]}
    ]"#;

    fn temp_db(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("abiscope_abi_store_{}_{}.db", name, std::process::id()));
        std::fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn test_save_and_lookup() {
        let path = temp_db("save");
        let store = AbiStore::open(&path).unwrap();

        let kept = store
            .save("0x6B175474E89094C44Da98b954EedeAC495271d0F", ERC20_TRANSFER, Some("Dai"))
            .unwrap();
        assert_eq!(kept, 1);

        let abi = AbiLookup::get(&store, "0x6b175474e89094c44da98b954eedeac495271d0f").unwrap();
        assert_eq!(abi[0].name, "transfer");

        let raw = store.get_raw("0x6b175474e89094c44da98b954eedeac495271d0f").unwrap().unwrap();
        assert_eq!(raw.contract_name.as_deref(), Some("Dai"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_abi_is_rejected() {
        let path = temp_db("invalid");
        let store = AbiStore::open(&path).unwrap();

        assert!(store.save("0x01", r#"{"abi": 1}"#, None).is_err());
        assert_eq!(store.count().unwrap(), 0);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_replace_remove_and_list() {
        let path = temp_db("list");
        let store = AbiStore::open(&path).unwrap();

        store.save("0x02", "[]", None).unwrap();
        store.save("0x01", "[]", None).unwrap();
        store.save("0x01", ERC20_TRANSFER, Some("Token")).unwrap();

        let listed = store.list().unwrap();
        let addresses: Vec<&str> = listed.iter().map(|s| s.address.as_str()).collect();
        assert_eq!(addresses, vec!["0x01", "0x02"]);
        assert_eq!(listed[0].contract_name.as_deref(), Some("Token"));

        assert!(store.remove("0X01").unwrap());
        assert!(!store.remove("0x01").unwrap());
        assert!(AbiLookup::get(&store, "0x01").is_none());

        std::fs::remove_file(path).ok();
    }
}
