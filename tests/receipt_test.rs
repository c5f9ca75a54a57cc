//! Receipt decoding across contracts
//!
//! A swap-like receipt emits logs from the router it was sent to and from
//! token contracts it touched. ABIs for the tokens come from a persisted
//! store, layered under an in-memory registry.

use std::path::PathBuf;

use abiscope::domain::abi::{
    derive_event_topic, parse_abi, AbiCodec, AbiLookup, AbiRegistry, ChainedLookup, DecodeMode,
    EventLog, LogDecoding,
};
use abiscope::domain::address::pad_address_to_bytes32;
use abiscope::infrastructure::abi::codec_for;
use abiscope::store::AbiStore;

const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
const TOKEN: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
const UNKNOWN: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
const ALICE: &str = "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d";

const TOKEN_ABI: &str = r#"[
    {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256"}]}
]"#;

const ROUTER_ABI: &str = r#"[
    {"type":"event","name":"Swapped","inputs":[{"name":"sender","type":"address","indexed":true},{"name":"memo","type":"string"},{"name":"amountOut","type":"uint256"}]},
    {"type":"event","name":"Ping","inputs":[],"anonymous":true}
]"#;

fn temp_db(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("abiscope_receipt_{}_{}.db", name, std::process::id()));
    std::fs::remove_file(&path).ok();
    path
}

fn word(value: u64) -> String {
    format!("{:064x}", value)
}

fn receipt_logs() -> Vec<EventLog> {
    let memo = format!("{:0<64}", hex::encode("gm"));
    vec![
        EventLog {
            address: TOKEN.to_uppercase().replacen("0X", "0x", 1),
            topics: vec![
                derive_event_topic("Transfer(address,address,uint256)"),
                pad_address_to_bytes32(ALICE),
                pad_address_to_bytes32(ROUTER),
            ],
            data: format!("0x{}", word(500)),
        },
        EventLog {
            address: ROUTER.to_string(),
            topics: vec![
                derive_event_topic("Swapped(address,string,uint256)"),
                pad_address_to_bytes32(ALICE),
            ],
            data: format!("0x{}{}{}{}", word(64), word(42), word(2), memo),
        },
        EventLog {
            address: UNKNOWN.to_string(),
            topics: vec![derive_event_topic("Deposit(address,uint256)")],
            data: format!("0x{}", word(1)),
        },
        EventLog {
            address: ROUTER.to_string(),
            topics: vec![derive_event_topic("Ping()")],
            data: "0x".to_string(),
        },
    ]
}

#[test]
fn test_receipt_with_store_backed_lookup() {
    let path = temp_db("slots");
    let store = AbiStore::open(&path).unwrap();
    store.save(TOKEN, TOKEN_ABI, Some("Dai")).unwrap();

    let router_abi = parse_abi(ROUTER_ABI).unwrap();
    let overlay = AbiRegistry::new();
    let lookup = ChainedLookup::new().with(&overlay).with(&store);

    let results = AbiCodec::slots().decode_receipt_logs(
        &receipt_logs(),
        Some((ROUTER, router_abi.as_slice())),
        &lookup,
    );
    assert_eq!(results.len(), 4);

    let LogDecoding::Decoded { address, event } = &results[0] else {
        panic!("token transfer should decode: {:?}", results[0]);
    };
    assert_eq!(address, TOKEN);
    assert_eq!(event.params[0].value, ALICE);
    assert_eq!(event.params[1].value, ROUTER);
    assert_eq!(event.params[2].value, "500");

    // Slot mode leaves the string as its offset slot
    let LogDecoding::Decoded { event, .. } = &results[1] else {
        panic!("router event should decode");
    };
    assert_eq!(event.name, "Swapped");
    assert_eq!(event.params[1].value, format!("0x{}", word(64)));
    assert_eq!(event.params[2].value, "42");

    assert_eq!(
        results[2],
        LogDecoding::NeedAbi {
            address: UNKNOWN.to_string()
        }
    );

    // Anonymous events never match on topic 0
    assert!(matches!(&results[3], LogDecoding::Unrecognized { .. }));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_full_mode_decodes_dynamic_event_data() {
    let router_abi = parse_abi(ROUTER_ABI).unwrap();
    let mut registry = AbiRegistry::new();
    registry.insert(TOKEN, parse_abi(TOKEN_ABI).unwrap());

    let codec = codec_for(DecodeMode::Full);
    let results = codec.decode_receipt_logs(
        &receipt_logs(),
        Some((ROUTER, router_abi.as_slice())),
        &registry,
    );

    let LogDecoding::Decoded { event, .. } = &results[1] else {
        panic!("router event should decode");
    };
    assert_eq!(event.params[0].name, "sender");
    assert!(event.params[0].indexed);
    assert_eq!(event.params[1].value, "\"gm\"");
    assert_eq!(event.params[2].value, "42");

    // Static-only data decodes the same in both modes
    let slots = AbiCodec::slots().decode_receipt_logs(&receipt_logs()[..1], None, &registry);
    assert_eq!(slots[0], results[0]);
}

#[test]
fn test_store_lookup_survives_reopen() {
    let path = temp_db("reopen");
    {
        let store = AbiStore::open(&path).unwrap();
        store.save(TOKEN, TOKEN_ABI, None).unwrap();
    }
    let store = AbiStore::open(&path).unwrap();
    assert!(store.get(&TOKEN.to_uppercase().replacen("0X", "0x", 1)).is_some());
    assert!(store.get(UNKNOWN).is_none());

    std::fs::remove_file(path).ok();
}
