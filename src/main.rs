use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use alloy_primitives::U256;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use abiscope::config::{self, Config};
use abiscope::domain::abi::{
    derive_event_topic, format_abi_for_display, AbiCodec, AbiDescriptor, AbiLookup, CallDecoding,
    DecodeMode, DecodedParameter, EventLog, LogDecoding,
};
use abiscope::domain::address::{is_address, normalize_address, truncate_middle};
use abiscope::infrastructure::abi::{codec_for, load_abi_file};
use abiscope::infrastructure::ethereum::{AlloyProvider, ChainProvider, RawTransaction};
use abiscope::logging;
use abiscope::modules::address::{self, TokenTransfer, TransferDirection};
use abiscope::modules::export::{self, DecodedReport, ExportFormat};
use abiscope::modules::toolkit::convert::{format_ether, format_gwei, format_with_separators};
use abiscope::modules::toolkit::timestamp::{format_timestamp, now, time_ago};
use abiscope::modules::toolkit::{selector, ToolResult};
use abiscope::store::{AbiStore, LabelStore};

const DEFAULT_RPC: &str = "localhost:8545";

#[derive(Debug, Parser)]
#[command(
    name = "abiscope",
    version,
    about = "abiscope: decode EVM call data and event logs against contract ABIs"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Follow head/tail offsets for dynamic types instead of raw slots
    #[arg(long, global = true)]
    full: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Export decoded results: a .csv/.json path, a directory, or `csv`/`json`
    /// for a timestamped file under the data directory
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Override the data directory holding the database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Function selector and event topic for a signature
    Selector {
        /// e.g. "transfer(address to, uint256 amount)"
        #[arg(required = true, num_args = 1..)]
        signature: Vec<String>,
    },
    /// Manage saved ABIs
    Abi {
        #[command(subcommand)]
        action: AbiCommand,
    },
    /// Manage address labels
    Label {
        #[command(subcommand)]
        action: LabelCommand,
    },
    /// Decode raw call data or a raw log
    Decode {
        #[command(subcommand)]
        target: DecodeCommand,
    },
    /// Fetch a transaction and decode its input and logs
    Tx { hash: String },
    /// Balance, account kind and recent ERC-20 transfers of an address
    Address {
        address: String,
        /// Blocks searched back from the head for transfers
        #[arg(long, default_value_t = address::TRANSFER_SEARCH_BLOCKS)]
        blocks: u64,
        /// Most transfers shown
        #[arg(long, default_value_t = address::MAX_TRANSFERS)]
        limit: usize,
    },
    /// Block summary
    Block {
        /// Block number or "latest"
        #[arg(default_value = "latest")]
        block: String,
    },
    /// Save the default RPC endpoint
    Rpc { url: String },
}

#[derive(Debug, Subcommand)]
enum AbiCommand {
    /// Save an ABI (raw array or build artifact) for a contract address
    Import {
        address: String,
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the functions and events of a saved ABI
    Show { address: String },
    Remove { address: String },
    List,
}

#[derive(Debug, Subcommand)]
enum LabelCommand {
    Set {
        address: String,
        #[arg(required = true, num_args = 1..)]
        label: Vec<String>,
    },
    Remove { address: String },
    List,
}

#[derive(Debug, Subcommand)]
enum DecodeCommand {
    /// Decode transaction input
    Call {
        input: String,
        /// ABI file (raw array or build artifact)
        #[arg(long, conflicts_with = "address")]
        abi: Option<PathBuf>,
        /// Use the saved ABI of this contract
        #[arg(long)]
        address: Option<String>,
    },
    /// Decode one event log
    Log {
        /// Emitting contract
        #[arg(long)]
        address: String,
        /// Topics in order, topic 0 first
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,
        #[arg(long, default_value = "0x")]
        data: String,
        /// ABI file for the emitting contract; saved ABIs are used otherwise
        #[arg(long)]
        abi: Option<PathBuf>,
    },
}

/// Resolved settings shared by every command
struct Session {
    codec: AbiCodec,
    data_dir: PathBuf,
    rpc: Option<String>,
    config_rpc: Option<String>,
    json: bool,
    output: Option<PathBuf>,
}

impl Session {
    fn new(args: &Args, config: &Config) -> Result<Self> {
        // CLI flags take precedence
        let mode = if args.full {
            DecodeMode::Full
        } else {
            config.decode_mode
        };
        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| config.resolved_data_dir())
            .context("Cannot determine a data directory; pass --data-dir")?;

        debug!(%mode, data_dir = %data_dir.display(), "session");
        Ok(Self {
            codec: codec_for(mode),
            data_dir,
            rpc: args.rpc.clone(),
            config_rpc: config.rpc_url.clone(),
            json: args.json,
            output: args.output.clone(),
        })
    }

    fn db_path(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;
        Ok(config::db_path_in(&self.data_dir))
    }

    fn abi_store(&self) -> Result<AbiStore> {
        AbiStore::open(&self.db_path()?)
    }

    fn label_store(&self) -> Result<LabelStore> {
        LabelStore::open(&self.db_path()?)
    }

    /// --rpc, then the endpoint saved with `abiscope rpc`, then config, then localhost
    fn rpc_endpoint(&self, labels: &LabelStore) -> Result<String> {
        let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
        let endpoint = match non_empty(self.rpc.clone()) {
            Some(url) => url,
            None => non_empty(labels.rpc_url()?)
                .or_else(|| non_empty(self.config_rpc.clone()))
                .unwrap_or_else(|| DEFAULT_RPC.to_string()),
        };
        Ok(normalize_http_endpoint(&endpoint))
    }

    fn provider(&self, labels: &LabelStore) -> Result<AlloyProvider> {
        let endpoint = self.rpc_endpoint(labels)?;
        info!(%endpoint, "using RPC endpoint");
        AlloyProvider::connect_http(&endpoint)
    }

    fn print(&self, result: &ToolResult) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        } else {
            print!("{}", result.render_text());
        }
        Ok(())
    }

    fn print_report(&self, report: &DecodedReport, labels: &BTreeMap<String, String>) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            print!("{}", render_report(report, labels));
        }
        self.export(report)
    }

    fn export(&self, report: &DecodedReport) -> Result<()> {
        let Some(path) = &self.output else {
            return Ok(());
        };
        let prefix = if report.tx_hash.is_some() { "tx" } else { "decode" };
        let path = match path.to_str() {
            // Bare format name: timestamped file in the data directory
            Some("csv") => export::export_dir(&self.data_dir)?
                .join(export::generate_filename(prefix, ExportFormat::Csv)),
            Some("json") => export::export_dir(&self.data_dir)?
                .join(export::generate_filename(prefix, ExportFormat::Json)),
            _ if path.is_dir() => path.join(export::generate_filename(prefix, ExportFormat::Json)),
            _ => path.clone(),
        };
        let count = export::export_report(&path, report)?;
        eprintln!("Exported {} records to {}", count, path.display());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load();

    let mut log_config = config.log.clone();
    if args.verbose {
        log_config.level = "debug".to_string();
    }
    logging::init_tracing(&log_config);

    let session = Session::new(&args, &config)?;
    match args.command {
        Command::Selector { signature } => {
            session.print(&selector::selector(&signature.join(" "))?)
        }
        Command::Abi { action } => run_abi(&session, action),
        Command::Label { action } => run_label(&session, action),
        Command::Decode { target } => run_decode(&session, target),
        Command::Tx { hash } => run_tx(&session, &hash).await,
        Command::Address {
            address,
            blocks,
            limit,
        } => run_address(&session, &address, blocks, limit).await,
        Command::Block { block } => run_block(&session, &block).await,
        Command::Rpc { url } => {
            let url = normalize_http_endpoint(&url);
            session.label_store()?.set_rpc_url(&url)?;
            info!(%url, "saved default RPC endpoint");
            println!("Default RPC endpoint: {}", url);
            Ok(())
        }
    }
}

fn run_abi(session: &Session, action: AbiCommand) -> Result<()> {
    let store = session.abi_store()?;
    match action {
        AbiCommand::Import {
            address,
            file,
            name,
        } => {
            let address = require_address(&address)?;
            let abi_file = load_abi_file(&file)?;
            let name = name.or(abi_file.contract_name);
            let kept = store.save(&address, &abi_file.abi_json, name.as_deref())?;
            let mut result = ToolResult::new("ABI imported")
                .add("address", address)
                .add("entries", kept.to_string());
            if let Some(name) = name {
                result = result.add("name", name);
            }
            session.print(&result)
        }
        AbiCommand::Show { address } => {
            let Some(abi) = store.get_descriptors(&address)? else {
                bail!("No ABI saved for {}", normalize_address(&address));
            };
            if session.json {
                println!("{}", serde_json::to_string_pretty(&abi)?);
            } else {
                print!("{}", render_abi(&abi));
            }
            Ok(())
        }
        AbiCommand::Remove { address } => {
            if !store.remove(&address)? {
                bail!("No ABI saved for {}", normalize_address(&address));
            }
            println!("Removed ABI for {}", normalize_address(&address));
            Ok(())
        }
        AbiCommand::List => {
            let mut result = ToolResult::new(format!("Saved ABIs ({})", store.count()?));
            for stored in store.list()? {
                result = result.add(
                    stored.address,
                    stored.contract_name.unwrap_or_else(|| "-".to_string()),
                );
            }
            session.print(&result)
        }
    }
}

fn run_label(session: &Session, action: LabelCommand) -> Result<()> {
    let store = session.label_store()?;
    match action {
        LabelCommand::Set { address, label } => {
            let address = require_address(&address)?;
            store.set_label(&address, &label.join(" "))?;
            println!("Labelled {}", address);
            Ok(())
        }
        LabelCommand::Remove { address } => {
            if !store.remove_label(&address)? {
                bail!("No label for {}", normalize_address(&address));
            }
            println!("Removed label for {}", normalize_address(&address));
            Ok(())
        }
        LabelCommand::List => {
            let mut result = ToolResult::new("Labels");
            for (address, label) in store.load_all()? {
                result = result.add(address, label);
            }
            session.print(&result)
        }
    }
}

fn run_decode(session: &Session, target: DecodeCommand) -> Result<()> {
    let store = session.abi_store()?;
    let labels = session.label_store()?.load_all()?;

    let report = match target {
        DecodeCommand::Call {
            input,
            abi,
            address,
        } => {
            let descriptors = match (abi, address.as_deref()) {
                (Some(path), _) => load_abi_file(&path)?.descriptors,
                (None, Some(address)) => store
                    .get_descriptors(address)?
                    .with_context(|| format!("No ABI saved for {}", normalize_address(address)))?,
                (None, None) => bail!("Pass --abi FILE or --address ADDR"),
            };
            DecodedReport {
                to: address.map(|a| normalize_address(&a)),
                call: Some(session.codec.decode_call(&input, &descriptors)),
                ..Default::default()
            }
        }
        DecodeCommand::Log {
            address,
            topics,
            data,
            abi,
        } => {
            let log = EventLog {
                address: normalize_address(&address),
                topics,
                data,
            };
            let file_abi = abi.as_deref().map(load_abi_file).transpose()?;
            let primary = file_abi
                .as_ref()
                .map(|file| (log.address.as_str(), file.descriptors.as_slice()));
            DecodedReport {
                logs: session.codec.decode_receipt_logs(
                    std::slice::from_ref(&log),
                    primary,
                    &store,
                ),
                ..Default::default()
            }
        }
    };

    session.print_report(&report, &labels)
}

async fn run_tx(session: &Session, hash: &str) -> Result<()> {
    let label_store = session.label_store()?;
    let labels = label_store.load_all()?;
    let store = session.abi_store()?;
    let provider = session.provider(&label_store)?;

    let (tx, receipt) = tokio::try_join!(provider.get_transaction(hash), provider.get_receipt(hash))?;
    let Some(tx) = tx else {
        bail!("Transaction {} not found on {}", hash, provider.endpoint_name());
    };

    let primary_abi: Option<Vec<AbiDescriptor>> = tx.to.as_deref().and_then(|to| store.get(to));
    let call = session
        .codec
        .decode_call(&tx.input, primary_abi.as_deref().unwrap_or_default());

    let logs = match &receipt {
        Some(receipt) => {
            let primary = tx
                .to
                .as_deref()
                .zip(primary_abi.as_deref());
            session
                .codec
                .decode_receipt_logs(&receipt.logs, primary, &store)
        }
        None => Vec::new(),
    };

    if !session.json {
        let mut summary = tx_summary(&tx, &labels);
        if let Some(receipt) = &receipt {
            let status = match receipt.status {
                Some(true) => "success",
                Some(false) => "reverted",
                None => "unknown",
            };
            summary = summary
                .add("status", status)
                .add("gas used", format_with_separators(receipt.gas_used));
            if let Some(price) = receipt.effective_gas_price {
                summary = summary.add("gas price", format!("{} gwei", format_gwei(U256::from(price))));
            }
            if let Some(created) = &receipt.contract_address {
                summary = summary.add("created", display_address(created, &labels));
            }
        } else {
            summary = summary.add("status", "pending");
        }
        print!("{}", summary.render_text());
    }

    let report = DecodedReport {
        tx_hash: Some(tx.hash.clone()),
        to: tx.to.as_deref().map(normalize_address),
        call: Some(call),
        logs,
    };
    session.print_report(&report, &labels)
}

async fn run_address(session: &Session, target: &str, blocks: u64, limit: usize) -> Result<()> {
    let target = require_address(target)?;
    let label_store = session.label_store()?;
    let store = session.abi_store()?;
    let provider = session.provider(&label_store)?;

    let (overview, transfers) = tokio::try_join!(
        address::fetch_overview(&provider, &target),
        address::fetch_erc20_transfers(&provider, &session.codec, &store, &target, blocks, limit),
    )?;

    let mut result = ToolResult::new("Address")
        .add("address", overview.address.clone())
        .add("type", if overview.is_contract { "contract" } else { "EOA" })
        .add("balance", format!("{} ETH", format_ether(overview.balance)))
        .add("transactions", format_with_separators(overview.transaction_count));
    if let Some(label) = label_store.get_label(&target)? {
        result = result.add("label", label);
    }
    let saved_abi = match store.get_raw(&target)? {
        Some(stored) => stored.contract_name.unwrap_or_else(|| "saved".to_string()),
        None => "none".to_string(),
    };
    result = result.add("saved ABI", saved_abi);

    if session.json {
        let output = serde_json::json!({
            "overview": result.to_json(),
            "transfers": transfers,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", result.render_text());
    let labels = label_store.load_all()?;
    print!("{}", render_transfers(&transfers, blocks, &labels));
    Ok(())
}

async fn run_block(session: &Session, block: &str) -> Result<()> {
    let label_store = session.label_store()?;
    let labels = label_store.load_all()?;
    let provider = session.provider(&label_store)?;

    let number = match block.trim() {
        "latest" => provider.block_number().await?,
        value => parse_block_number(value)?,
    };
    let Some(block) = provider.get_block(number).await? else {
        bail!("Block {} not found on {}", number, provider.endpoint_name());
    };

    let mut result = ToolResult::new(format!("Block {}", format_with_separators(block.number)))
        .add("hash", block.hash.clone())
        .add("parent", block.parent_hash.clone())
        .add(
            "time",
            format!("{} ({})", format_timestamp(block.timestamp), time_ago(block.timestamp, now())),
        )
        .add("transactions", block.transactions.len().to_string())
        .add(
            "gas",
            format!(
                "{} / {}",
                format_with_separators(block.gas_used),
                format_with_separators(block.gas_limit)
            ),
        )
        .add("miner", display_address(&block.miner, &labels));
    if let Some(base_fee) = block.base_fee_per_gas {
        result = result.add("base fee", format!("{} gwei", format_gwei(U256::from(base_fee))));
    }
    session.print(&result)
}

fn tx_summary(tx: &RawTransaction, labels: &BTreeMap<String, String>) -> ToolResult {
    let mut summary = ToolResult::new("Transaction")
        .add("hash", tx.hash.clone())
        .add("from", display_address(&tx.from, labels))
        .add(
            "to",
            tx.to
                .as_deref()
                .map(|to| display_address(to, labels))
                .unwrap_or_else(|| "contract creation".to_string()),
        )
        .add("value", format!("{} ETH", format_ether(tx.value)))
        .add("nonce", tx.nonce.to_string());
    if let Some(number) = tx.block_number {
        summary = summary.add("block", format_with_separators(number));
    }
    summary
}

fn render_report(report: &DecodedReport, labels: &BTreeMap<String, String>) -> String {
    let mut out = String::new();

    match &report.call {
        Some(CallDecoding::Decoded(call)) => {
            out.push_str(&format!("Call {} {}\n", call.selector, call.signature));
            render_params(&mut out, &call.params, labels);
        }
        Some(CallDecoding::Unrecognized {
            selector: Some(selector),
        }) => {
            out.push_str(&format!("Call {} (selector not in ABI)\n", selector));
        }
        Some(CallDecoding::Unrecognized { selector: None }) => {
            out.push_str("Call: input is not hex call data\n");
        }
        Some(CallDecoding::PlainTransfer) => out.push_str("Call: plain value transfer\n"),
        None => {}
    }

    for (idx, log) in report.logs.iter().enumerate() {
        match log {
            LogDecoding::Decoded { address, event } => {
                out.push_str(&format!(
                    "Log {} {} {}\n",
                    idx,
                    display_address(address, labels),
                    event.signature
                ));
                render_params(&mut out, &event.params, labels);
            }
            LogDecoding::NeedAbi { address } => {
                out.push_str(&format!(
                    "Log {} {} (no ABI; import one with `abiscope abi import {} FILE`)\n",
                    idx,
                    display_address(address, labels),
                    address
                ));
            }
            LogDecoding::Unrecognized { address, topic } => {
                out.push_str(&format!(
                    "Log {} {} (unknown event {})\n",
                    idx,
                    display_address(address, labels),
                    topic
                        .as_deref()
                        .map(|t| truncate_middle(t, 10, 8))
                        .unwrap_or_else(|| "-".to_string())
                ));
            }
        }
    }

    out
}

fn render_transfers(
    transfers: &[TokenTransfer],
    blocks: u64,
    labels: &BTreeMap<String, String>,
) -> String {
    if transfers.is_empty() {
        return format!("No ERC-20 transfers in the last {} blocks\n", blocks);
    }
    let mut out = format!("ERC-20 transfers (last {} blocks)\n", blocks);
    for transfer in transfers {
        let (arrow, counterparty) = match transfer.direction {
            TransferDirection::Send => ("OUT", &transfer.to),
            TransferDirection::Receive => ("IN ", &transfer.from),
        };
        out.push_str(&format!(
            "  {:>10}  {}  {} {}  token {}  tx {}\n",
            transfer
                .block_number
                .map(format_with_separators)
                .unwrap_or_else(|| "-".to_string()),
            arrow,
            transfer.formatted_value,
            display_address(counterparty, labels),
            display_address(&transfer.token, labels),
            transfer
                .transaction_hash
                .as_deref()
                .map(|hash| truncate_middle(hash, 10, 8))
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    out
}

fn render_params(out: &mut String, params: &[DecodedParameter], labels: &BTreeMap<String, String>) {
    let width = params.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for param in params {
        let value = if param.kind == "address" {
            display_address(&param.value, labels)
        } else {
            param.value.clone()
        };
        let marker = if param.indexed { " (indexed)" } else { "" };
        out.push_str(&format!(
            "  {:<width$}  {:<9} {}{}\n",
            param.name,
            param.kind,
            value,
            marker,
            width = width
        ));
    }
}

fn render_abi(abi: &[AbiDescriptor]) -> String {
    let mut out = String::new();
    let functions = format_abi_for_display(abi);
    if !functions.is_empty() {
        out.push_str("Functions\n");
        for line in functions.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    let events: Vec<&AbiDescriptor> = abi.iter().filter(|d| d.is_event()).collect();
    if !events.is_empty() {
        out.push_str("Events\n");
        for event in events {
            let signature = event.signature();
            let topic = if event.anonymous {
                "anonymous".to_string()
            } else {
                truncate_middle(&derive_event_topic(&signature), 10, 8)
            };
            out.push_str(&format!("  {}  {}\n", signature, topic));
        }
    }
    out
}

fn display_address(address: &str, labels: &BTreeMap<String, String>) -> String {
    match labels.get(&normalize_address(address)) {
        Some(label) => format!("{} ({})", address, label),
        None => address.to_string(),
    }
}

fn require_address(address: &str) -> Result<String> {
    if !is_address(address) {
        bail!("Not an address: {}", address);
    }
    Ok(normalize_address(address))
}

fn parse_block_number(value: &str) -> Result<u64> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.replace(['_', ','], "").parse(),
    };
    parsed.with_context(|| format!("Invalid block number: {}", value))
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
