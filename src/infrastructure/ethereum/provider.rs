//! Ethereum provider abstraction and Alloy implementation
//!
//! Uses raw JSON requests so blocks, transactions and receipts parse the same
//! way on every EVM chain, including L2s with non-standard transaction types.

use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::abi::EventLog;

/// Raw block data parsed from JSON - works with any EVM chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub base_fee_per_gas: Option<u64>,
    pub miner: String,
    pub transactions: Vec<RawTransaction>,
}

/// Raw transaction data parsed from JSON - chain agnostic
///
/// `input` keeps the `0x`-prefixed hex form the codec consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: U256,
    pub input: String,
    pub gas: u64,
    pub gas_price: Option<u128>,
    pub nonce: u64,
    pub block_number: Option<u64>,
    pub tx_type: Option<u8>,
}

/// Receipt fields the explorer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReceipt {
    pub transaction_hash: String,
    /// `None` on pre-Byzantium receipts that carry a state root instead
    pub status: Option<bool>,
    pub gas_used: u64,
    pub effective_gas_price: Option<u128>,
    pub contract_address: Option<String>,
    pub logs: Vec<EventLog>,
}

/// A log returned by `eth_getLogs`, with its position in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub log: EventLog,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<String>,
    pub log_index: Option<u64>,
}

/// `eth_getLogs` filter
///
/// `topics` are positional; `None` matches any value at that position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    /// `None` means `latest`
    pub to_block: Option<u64>,
    pub address: Option<String>,
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    pub fn to_json(&self) -> Value {
        let mut filter = json!({
            "fromBlock": format!("0x{:x}", self.from_block),
            "toBlock": self
                .to_block
                .map(|n| format!("0x{:x}", n))
                .unwrap_or_else(|| "latest".to_string()),
            "topics": self.topics,
        });
        if let Some(address) = &self.address {
            filter["address"] = Value::String(address.clone());
        }
        filter
    }
}

/// Abstract chain provider
///
/// The codec never talks to a node itself; front ends fetch raw data through
/// this trait and hand the hex strings to the decoder.
#[async_trait::async_trait]
pub trait ChainProvider: Send + Sync {
    /// Get the current block number
    async fn block_number(&self) -> Result<u64>;

    /// Get a block by number with full transactions
    async fn get_block(&self, number: u64) -> Result<Option<RawBlock>>;

    async fn get_transaction(&self, hash: &str) -> Result<Option<RawTransaction>>;

    async fn get_receipt(&self, hash: &str) -> Result<Option<RawReceipt>>;

    /// Balance in wei at the latest block
    async fn get_balance(&self, address: &str) -> Result<U256>;

    /// Deployed bytecode as `0x` hex; `0x` for externally owned accounts
    async fn get_code(&self, address: &str) -> Result<String>;

    async fn get_transaction_count(&self, address: &str) -> Result<u64>;

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>>;

    /// Endpoint display name
    fn endpoint_name(&self) -> String;
}

type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// HTTP JSON-RPC provider
pub struct AlloyProvider {
    provider: HttpFillProvider,
    endpoint: String,
}

impl AlloyProvider {
    /// Connect to an HTTP endpoint
    ///
    /// Nothing is sent until the first request.
    pub fn connect_http(url: &str) -> Result<Self> {
        let rpc_url = url
            .trim()
            .parse()
            .with_context(|| format!("Invalid HTTP URL: {}", url))?;
        let provider = ProviderBuilder::new().connect_http(rpc_url);
        Ok(Self {
            provider,
            endpoint: url.trim().to_string(),
        })
    }

    async fn request(&self, method: &'static str, hash: &str) -> Result<Value> {
        let hash = validate_hash(hash)?;
        debug!(method, %hash, endpoint = %self.endpoint, "rpc request");
        self.provider
            .raw_request::<_, Value>(method.into(), (hash,))
            .await
            .with_context(|| format!("{} failed", method))
    }
}

#[async_trait::async_trait]
impl ChainProvider for AlloyProvider {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("eth_blockNumber failed")
    }

    async fn get_block(&self, number: u64) -> Result<Option<RawBlock>> {
        let block_num_hex = format!("0x{:x}", number);
        debug!(number, endpoint = %self.endpoint, "rpc request eth_getBlockByNumber");
        let json: Value = self
            .provider
            .raw_request("eth_getBlockByNumber".into(), (&block_num_hex, true))
            .await
            .context("eth_getBlockByNumber failed")?;

        if json.is_null() {
            return Ok(None);
        }
        Ok(Some(parse_raw_block(&json)?))
    }

    async fn get_transaction(&self, hash: &str) -> Result<Option<RawTransaction>> {
        let json = self.request("eth_getTransactionByHash", hash).await?;
        if json.is_null() {
            return Ok(None);
        }
        parse_raw_transaction(&json)
            .map(Some)
            .context("Malformed transaction response")
    }

    async fn get_receipt(&self, hash: &str) -> Result<Option<RawReceipt>> {
        let json = self.request("eth_getTransactionReceipt", hash).await?;
        if json.is_null() {
            return Ok(None);
        }
        parse_raw_receipt(&json).map(Some)
    }

    async fn get_balance(&self, address: &str) -> Result<U256> {
        let address = parse_address(address)?;
        self.provider
            .get_balance(address)
            .await
            .context("eth_getBalance failed")
    }

    async fn get_code(&self, address: &str) -> Result<String> {
        let address = parse_address(address)?;
        let code = self
            .provider
            .get_code_at(address)
            .await
            .context("eth_getCode failed")?;
        Ok(format!("0x{}", hex::encode(&code)))
    }

    async fn get_transaction_count(&self, address: &str) -> Result<u64> {
        let address = parse_address(address)?;
        self.provider
            .get_transaction_count(address)
            .await
            .context("eth_getTransactionCount failed")
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
        debug!(?filter, endpoint = %self.endpoint, "rpc request eth_getLogs");
        let json: Value = self
            .provider
            .raw_request("eth_getLogs".into(), (filter.to_json(),))
            .await
            .context("eth_getLogs failed")?;
        parse_raw_logs(&json)
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }
}

fn parse_address(address: &str) -> Result<Address> {
    address
        .trim()
        .parse()
        .with_context(|| format!("Invalid address: {}", address))
}

/// Lowercase `0x` + 64 hex transaction hash
fn validate_hash(hash: &str) -> Result<String> {
    let hash = hash.trim();
    let payload = hash
        .strip_prefix("0x")
        .or_else(|| hash.strip_prefix("0X"))
        .unwrap_or(hash);
    if payload.len() != 64 || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("Invalid transaction hash: {}", hash);
    }
    Ok(format!("0x{}", payload.to_lowercase()))
}

fn str_field<'a>(json: &'a Value, key: &str) -> Option<&'a str> {
    json.get(key).and_then(|v| v.as_str())
}

/// Parse raw JSON block response to our chain-agnostic RawBlock type
pub(crate) fn parse_raw_block(json: &Value) -> Result<RawBlock> {
    let number = parse_hex_u64(str_field(json, "number").unwrap_or("0x0"))?;
    let timestamp = parse_hex_u64(str_field(json, "timestamp").unwrap_or("0x0"))?;
    let gas_used = parse_hex_u64(str_field(json, "gasUsed").unwrap_or("0x0"))?;
    let gas_limit = parse_hex_u64(str_field(json, "gasLimit").unwrap_or("0x0"))?;
    let base_fee_per_gas = str_field(json, "baseFeePerGas").and_then(|s| parse_hex_u64(s).ok());

    let transactions = json
        .get("transactions")
        .and_then(|v| v.as_array())
        .map(|txs| txs.iter().filter_map(parse_raw_transaction).collect())
        .unwrap_or_default();

    Ok(RawBlock {
        number,
        hash: str_field(json, "hash").unwrap_or("0x0").to_string(),
        parent_hash: str_field(json, "parentHash").unwrap_or("0x0").to_string(),
        timestamp,
        gas_used,
        gas_limit,
        base_fee_per_gas,
        miner: str_field(json, "miner")
            .unwrap_or("0x0000000000000000000000000000000000000000")
            .to_string(),
        transactions,
    })
}

/// Parse a single transaction from JSON
///
/// Returns `None` for hash-only entries (blocks fetched without full
/// transactions) and anything missing `hash` or `from`.
pub(crate) fn parse_raw_transaction(json: &Value) -> Option<RawTransaction> {
    let hash = str_field(json, "hash")?.to_string();
    let from = str_field(json, "from")?.to_string();
    let to = str_field(json, "to").map(|s| s.to_string());

    let value = parse_hex_u256(str_field(json, "value").unwrap_or("0x0")).unwrap_or(U256::ZERO);
    let input = str_field(json, "input")
        .or_else(|| str_field(json, "data"))
        .unwrap_or("0x")
        .to_string();

    let gas = parse_hex_u64(str_field(json, "gas").unwrap_or("0x0")).unwrap_or(0);
    let gas_price = str_field(json, "gasPrice").and_then(|s| parse_hex_u128(s).ok());
    let nonce = parse_hex_u64(str_field(json, "nonce").unwrap_or("0x0")).unwrap_or(0);
    let block_number = str_field(json, "blockNumber").and_then(|s| parse_hex_u64(s).ok());
    let tx_type = str_field(json, "type")
        .and_then(|s| parse_hex_u64(s).ok())
        .map(|n| n as u8);

    Some(RawTransaction {
        hash,
        from,
        to,
        value,
        input,
        gas,
        gas_price,
        nonce,
        block_number,
        tx_type,
    })
}

/// Parse a receipt; logs keep their hex topics and data untouched
pub(crate) fn parse_raw_receipt(json: &Value) -> Result<RawReceipt> {
    let transaction_hash = str_field(json, "transactionHash")
        .context("Receipt missing transactionHash")?
        .to_string();
    let status = str_field(json, "status")
        .map(parse_hex_u64)
        .transpose()?
        .map(|s| s == 1);
    let gas_used = parse_hex_u64(str_field(json, "gasUsed").unwrap_or("0x0"))?;
    let effective_gas_price =
        str_field(json, "effectiveGasPrice").and_then(|s| parse_hex_u128(s).ok());

    let logs = json
        .get("logs")
        .and_then(|v| v.as_array())
        .map(|logs| logs.iter().map(parse_log).collect())
        .unwrap_or_default();

    Ok(RawReceipt {
        transaction_hash,
        status,
        gas_used,
        effective_gas_price,
        contract_address: str_field(json, "contractAddress").map(|s| s.to_string()),
        logs,
    })
}

fn parse_log(json: &Value) -> EventLog {
    EventLog {
        address: str_field(json, "address").unwrap_or_default().to_string(),
        topics: json
            .get("topics")
            .and_then(|v| v.as_array())
            .map(|topics| {
                topics
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        data: str_field(json, "data").unwrap_or("0x").to_string(),
    }
}

/// Parse an `eth_getLogs` response
pub(crate) fn parse_raw_logs(json: &Value) -> Result<Vec<RawLog>> {
    let logs = json.as_array().context("eth_getLogs did not return an array")?;
    Ok(logs
        .iter()
        .map(|entry| RawLog {
            log: parse_log(entry),
            block_number: str_field(entry, "blockNumber").and_then(|s| parse_hex_u64(s).ok()),
            transaction_hash: str_field(entry, "transactionHash").map(str::to_string),
            log_index: str_field(entry, "logIndex").and_then(|s| parse_hex_u64(s).ok()),
        })
        .collect())
}

/// Parse hex string to u64
pub(crate) fn parse_hex_u64(s: &str) -> Result<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 16).context("Failed to parse hex u64")
}

fn parse_hex_u128(s: &str) -> Result<u128> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(s, 16).context("Failed to parse hex u128")
}

/// Parse hex string to U256
pub(crate) fn parse_hex_u256(s: &str) -> Result<U256> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() || s == "0" {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(s, 16).context("Failed to parse hex U256")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    fn transfer_tx() -> Value {
        json!({
            "hash": TX_HASH,
            "from": "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d",
            "to": "0x6b175474e89094c44da98b954eedeac495271d0f",
            "value": "0xde0b6b3a7640000",
            "input": "0xa9059cbb000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f0beb000000000000000000000000000000000000000000000000000000000000f4240",
            "gas": "0xc350",
            "gasPrice": "0x4a817c800",
            "nonce": "0x15",
            "blockNumber": "0x5daf3b",
            "type": "0x2"
        })
    }

    #[test]
    fn test_parse_hex_helpers() {
        assert_eq!(parse_hex_u64("0x1b4").unwrap(), 436);
        assert_eq!(parse_hex_u64("0x").unwrap(), 0);
        assert!(parse_hex_u64("0xzz").is_err());
        assert_eq!(
            parse_hex_u256("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(parse_hex_u256("0x0").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_transaction() {
        let tx = parse_raw_transaction(&transfer_tx()).unwrap();
        assert_eq!(tx.hash, TX_HASH);
        assert_eq!(tx.value, U256::from(1_000_000_000_000_000_000u64));
        assert!(tx.input.starts_with("0xa9059cbb"));
        assert_eq!(tx.gas, 50_000);
        assert_eq!(tx.gas_price, Some(20_000_000_000));
        assert_eq!(tx.nonce, 21);
        assert_eq!(tx.block_number, Some(6_139_707));
        assert_eq!(tx.tx_type, Some(2));
    }

    #[test]
    fn test_parse_contract_creation() {
        let mut json = transfer_tx();
        json["to"] = Value::Null;
        let tx = parse_raw_transaction(&json).unwrap();
        assert_eq!(tx.to, None);
    }

    #[test]
    fn test_hash_only_transactions_are_skipped() {
        let block = json!({
            "number": "0x10",
            "hash": "0xabc",
            "timestamp": "0x5f5e100",
            "gasUsed": "0x5208",
            "gasLimit": "0x1c9c380",
            "transactions": [TX_HASH, transfer_tx()]
        });
        let block = parse_raw_block(&block).unwrap();
        assert_eq!(block.number, 16);
        assert_eq!(block.timestamp, 100_000_000);
        assert_eq!(block.base_fee_per_gas, None);
        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn test_parse_receipt_logs() {
        let receipt = json!({
            "transactionHash": TX_HASH,
            "status": "0x1",
            "gasUsed": "0x8f7c",
            "effectiveGasPrice": "0x4a817c800",
            "contractAddress": null,
            "logs": [{
                "address": "0x6b175474e89094c44da98b954eedeac495271d0f",
                "topics": [
                    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                    "0x000000000000000000000000a7d9ddbe1f17865597fbd27ec712455208b6b76d",
                    "0x000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f0beb0"
                ],
                "data": "0x00000000000000000000000000000000000000000000000000000000000f4240"
            }]
        });

        let receipt = parse_raw_receipt(&receipt).unwrap();
        assert_eq!(receipt.status, Some(true));
        assert_eq!(receipt.gas_used, 36_732);
        assert_eq!(receipt.contract_address, None);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].topics.len(), 3);
    }

    #[test]
    fn test_failed_receipt() {
        let receipt = json!({ "transactionHash": TX_HASH, "status": "0x0", "gasUsed": "0x5208" });
        let receipt = parse_raw_receipt(&receipt).unwrap();
        assert_eq!(receipt.status, Some(false));
        assert!(receipt.logs.is_empty());
    }

    #[test]
    fn test_parse_logs_response() {
        let response = json!([{
            "address": "0x6b175474e89094c44da98b954eedeac495271d0f",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x",
            "blockNumber": "0x64",
            "transactionHash": TX_HASH,
            "logIndex": "0x3"
        }]);
        let logs = parse_raw_logs(&response).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, Some(100));
        assert_eq!(logs[0].log_index, Some(3));
        assert_eq!(logs[0].transaction_hash.as_deref(), Some(TX_HASH));
        assert_eq!(logs[0].log.topics.len(), 1);

        assert!(parse_raw_logs(&json!({"error": "range too large"})).is_err());
    }

    #[test]
    fn test_log_filter_json() {
        let filter = LogFilter {
            from_block: 255,
            to_block: None,
            address: None,
            topics: vec![Some("0xaa".to_string()), None, Some("0xbb".to_string())],
        };
        assert_eq!(
            filter.to_json(),
            json!({"fromBlock": "0xff", "toBlock": "latest", "topics": ["0xaa", null, "0xbb"]})
        );

        let filter = LogFilter {
            from_block: 1,
            to_block: Some(16),
            address: Some("0x01".to_string()),
            topics: Vec::new(),
        };
        assert_eq!(filter.to_json()["toBlock"], "0x10");
        assert_eq!(filter.to_json()["address"], "0x01");
    }

    #[test]
    fn test_validate_hash() {
        assert_eq!(validate_hash(&TX_HASH.to_uppercase().replace("0X", "0x")).unwrap(), TX_HASH);
        assert!(validate_hash("0x1234").is_err());
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(AlloyProvider::connect_http("not a url").is_err());
        let provider = AlloyProvider::connect_http("http://localhost:8545").unwrap();
        assert_eq!(provider.endpoint_name(), "http://localhost:8545");
    }
}
