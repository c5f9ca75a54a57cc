use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::address::normalize_address;

const RPC_URL_KEY: &str = "rpc_url";

#[derive(Debug)]
pub struct LabelStore {
    conn: Connection,
}

impl LabelStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    // === Labels ===

    pub fn load_all(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT address, label FROM labels ORDER BY address")?;
        let mut rows = stmt.query([])?;
        let mut out = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let address: String = row.get(0)?;
            let label: String = row.get(1)?;
            out.insert(address, label);
        }
        Ok(out)
    }

    pub fn get_label(&self, address: &str) -> Result<Option<String>> {
        let label = self
            .conn
            .query_row(
                "SELECT label FROM labels WHERE address = ?1",
                params![normalize_address(address)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(label)
    }

    pub fn set_label(&self, address: &str, label: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO labels(address, label) VALUES (?1, ?2)
             ON CONFLICT(address) DO UPDATE SET label=excluded.label",
            params![normalize_address(address), label.trim()],
        )?;
        Ok(())
    }

    pub fn remove_label(&self, address: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM labels WHERE address = ?1",
            params![normalize_address(address)],
        )?;
        Ok(deleted > 0)
    }

    // === Settings ===

    pub fn rpc_url(&self) -> Result<Option<String>> {
        self.setting(RPC_URL_KEY)
    }

    pub fn set_rpc_url(&self, url: &str) -> Result<()> {
        self.set_setting(RPC_URL_KEY, url.trim())
    }

    fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS labels (
                address TEXT PRIMARY KEY,
                label   TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("abiscope_labels_{}_{}.db", name, std::process::id()));
        std::fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn test_labels() {
        let path = temp_db("labels");
        let store = LabelStore::open(&path).unwrap();

        store.set_label("0xABC", " Treasury ").unwrap();
        store.set_label("0xabc", "Multisig").unwrap();
        assert_eq!(store.get_label("0xAbc").unwrap().as_deref(), Some("Multisig"));
        assert_eq!(store.load_all().unwrap().len(), 1);

        assert!(store.remove_label("0xabc").unwrap());
        assert!(store.load_all().unwrap().is_empty());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_rpc_url_setting() {
        let path = temp_db("settings");
        let store = LabelStore::open(&path).unwrap();

        assert_eq!(store.rpc_url().unwrap(), None);
        store.set_rpc_url("http://localhost:8545").unwrap();
        store.set_rpc_url("https://eth.llamarpc.com").unwrap();
        assert_eq!(store.rpc_url().unwrap().as_deref(), Some("https://eth.llamarpc.com"));

        std::fs::remove_file(path).ok();
    }
}
