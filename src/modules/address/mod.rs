//! Address overview and ERC-20 transfer history
//!
//! Transfers come from `eth_getLogs` on the `Transfer` topic with the address
//! in either indexed position, decoded through the receipt-log path. Token
//! contracts with no saved ABI fall back to the standard ERC-20 event.

use std::collections::HashSet;

use alloy_primitives::U256;
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::domain::abi::{
    derive_event_topic, AbiCodec, AbiDescriptor, AbiLookup, AbiParameter, ChainedLookup,
    EventLog, LogDecoding,
};
use crate::domain::address::{
    addresses_match, normalize_address, pad_address_to_bytes32, to_checksum_address,
};
use crate::infrastructure::ethereum::{ChainProvider, LogFilter, RawLog};
use crate::modules::toolkit::convert::{format_token_value, parse_amount};

/// Blocks searched back from the head for transfer history
pub const TRANSFER_SEARCH_BLOCKS: u64 = 100;
pub const MAX_TRANSFERS: usize = 20;
/// Decimals assumed when rendering token amounts
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

const TRANSFER_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// Balance and account kind at the latest block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressOverview {
    /// EIP-55 form
    pub address: String,
    pub balance: U256,
    pub is_contract: bool,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Send,
    Receive,
}

/// One decoded ERC-20 `Transfer` touching the address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenTransfer {
    pub transaction_hash: Option<String>,
    pub log_index: Option<u64>,
    pub block_number: Option<u64>,
    pub token: String,
    pub from: String,
    pub to: String,
    /// Raw amount in the token's smallest unit
    pub value: String,
    pub formatted_value: String,
    pub direction: TransferDirection,
}

/// `eth_getCode` result of a deployed contract, as opposed to `0x`
pub fn is_contract_code(code: &str) -> bool {
    let code = code.trim();
    code != "0x" && code.len() > 2
}

pub fn erc20_transfer_abi() -> Vec<AbiDescriptor> {
    vec![AbiDescriptor::event(
        "Transfer",
        vec![
            AbiParameter::new("from", "address").indexed(),
            AbiParameter::new("to", "address").indexed(),
            AbiParameter::new("value", "uint256"),
        ],
    )]
}

/// Answers every address with the standard ERC-20 `Transfer` event
struct Erc20Fallback {
    abi: Vec<AbiDescriptor>,
}

impl AbiLookup for Erc20Fallback {
    fn get(&self, _address: &str) -> Option<Vec<AbiDescriptor>> {
        Some(self.abi.clone())
    }
}

pub async fn fetch_overview<P>(provider: &P, address: &str) -> Result<AddressOverview>
where
    P: ChainProvider + ?Sized,
{
    let (balance, code, transaction_count) = tokio::try_join!(
        provider.get_balance(address),
        provider.get_code(address),
        provider.get_transaction_count(address),
    )?;

    Ok(AddressOverview {
        address: to_checksum_address(address).unwrap_or_else(|| normalize_address(address)),
        balance,
        is_contract: is_contract_code(&code),
        transaction_count,
    })
}

/// Recent ERC-20 transfers sent or received by `address`, newest first
///
/// Searches `search_blocks` back from the head and keeps at most `limit`.
/// Saved ABIs from `lookup` take precedence over the standard event.
pub async fn fetch_erc20_transfers<P>(
    provider: &P,
    codec: &AbiCodec,
    lookup: &dyn AbiLookup,
    address: &str,
    search_blocks: u64,
    limit: usize,
) -> Result<Vec<TokenTransfer>>
where
    P: ChainProvider + ?Sized,
{
    let head = provider.block_number().await?;
    let from_block = head.saturating_sub(search_blocks);
    let topic = derive_event_topic(TRANSFER_SIGNATURE);
    let padded = pad_address_to_bytes32(address);

    let sent = LogFilter {
        from_block,
        topics: vec![Some(topic.clone()), Some(padded.clone()), None],
        ..Default::default()
    };
    let received = LogFilter {
        from_block,
        topics: vec![Some(topic), None, Some(padded)],
        ..Default::default()
    };
    let (sent, received) = tokio::try_join!(provider.get_logs(&sent), provider.get_logs(&received))?;
    debug!(from_block, sent = sent.len(), received = received.len(), "transfer logs");

    // A self-transfer shows up in both queries
    let mut seen = HashSet::new();
    let logs: Vec<RawLog> = sent
        .into_iter()
        .chain(received)
        .filter(|log| seen.insert((log.transaction_hash.clone(), log.log_index)))
        .collect();

    let fallback = Erc20Fallback {
        abi: erc20_transfer_abi(),
    };
    let chained = ChainedLookup::new().with(lookup).with(&fallback);
    let events: Vec<EventLog> = logs.iter().map(|raw| raw.log.clone()).collect();
    let decoded = codec.decode_receipt_logs(&events, None, &chained);

    let mut transfers: Vec<TokenTransfer> = logs
        .iter()
        .zip(decoded)
        .filter_map(|(raw, decoding)| to_transfer(raw, decoding, address))
        .collect();
    transfers.sort_by(|a, b| b.block_number.cmp(&a.block_number));
    transfers.truncate(limit);
    Ok(transfers)
}

fn to_transfer(raw: &RawLog, decoding: LogDecoding, owner: &str) -> Option<TokenTransfer> {
    let (address, event) = match decoding {
        LogDecoding::Decoded { address, event } => (address, event),
        other => {
            debug!(?other, "skipping undecodable transfer log");
            return None;
        }
    };
    // ERC-721 shares the signature but indexes the token id
    if event.signature != TRANSFER_SIGNATURE || event.params.len() != 3 || event.params[2].indexed {
        return None;
    }
    let value = parse_amount(&event.params[2].value)?;
    let from = event.params[0].value.clone();
    let to = event.params[1].value.clone();
    let direction = if addresses_match(&from, owner) {
        TransferDirection::Send
    } else {
        TransferDirection::Receive
    };

    Some(TokenTransfer {
        transaction_hash: raw.transaction_hash.clone(),
        log_index: raw.log_index,
        block_number: raw.block_number,
        token: address,
        from,
        to,
        value: value.to_string(),
        formatted_value: format_token_value(value, DEFAULT_TOKEN_DECIMALS),
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d";
    const OTHER: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0beb0";

    fn transfer_log(from: &str, to: &str, data: String, extra_topic: Option<String>) -> RawLog {
        let mut topics = vec![
            derive_event_topic(TRANSFER_SIGNATURE),
            pad_address_to_bytes32(from),
            pad_address_to_bytes32(to),
        ];
        topics.extend(extra_topic);
        RawLog {
            log: EventLog {
                address: "0x6b175474e89094c44da98b954eedeac495271d0f".to_string(),
                topics,
                data,
            },
            block_number: Some(10),
            transaction_hash: Some(format!("0x{}", "ab".repeat(32))),
            log_index: Some(0),
        }
    }

    fn decode(raw: &RawLog) -> LogDecoding {
        let fallback = Erc20Fallback {
            abi: erc20_transfer_abi(),
        };
        AbiCodec::slots()
            .decode_receipt_logs(std::slice::from_ref(&raw.log), None, &fallback)
            .remove(0)
    }

    #[test]
    fn test_is_contract_code() {
        assert!(!is_contract_code("0x"));
        assert!(!is_contract_code(""));
        assert!(is_contract_code("0x6080604052"));
    }

    #[test]
    fn test_outgoing_transfer() {
        let raw = transfer_log(OWNER, OTHER, format!("0x{:064x}", 1_500_000_000_000_000_000u128), None);
        let transfer = to_transfer(&raw, decode(&raw), OWNER).unwrap();
        assert_eq!(transfer.direction, TransferDirection::Send);
        assert_eq!(transfer.from, OWNER);
        assert_eq!(transfer.to, OTHER);
        assert_eq!(transfer.value, "1500000000000000000");
        assert_eq!(transfer.formatted_value, "1.5000");
    }

    #[test]
    fn test_incoming_transfer() {
        let raw = transfer_log(OTHER, OWNER, format!("0x{:064x}", 42), None);
        let transfer = to_transfer(&raw, decode(&raw), OWNER).unwrap();
        assert_eq!(transfer.direction, TransferDirection::Receive);
        assert_eq!(transfer.value, "42");
    }

    #[test]
    fn test_nft_transfer_is_skipped() {
        // Token id in the fourth topic, empty data
        let raw = transfer_log(OWNER, OTHER, "0x".to_string(), Some(format!("0x{:064x}", 7)));
        assert!(to_transfer(&raw, decode(&raw), OWNER).is_none());
    }
}
