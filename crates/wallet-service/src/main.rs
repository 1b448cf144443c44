//! Main entry point for the wallet node.
//!
//! Loads the adapter configuration, constructs one chain adapter per
//! configured implementation and answers a small set of queries through
//! them, printing each result as JSON.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use wallet_adapter::AdapterService;
use wallet_config::Config;
use wallet_types::{AccountQuery, BlockByNumber, ChainRequest, FeeQuery, TxByHash};

mod factory_registry;

/// Command-line arguments for the wallet node.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
	/// Probe every configured adapter
	Chains,
	/// Balance and sequence of an address
	Account {
		#[arg(long)]
		chain: Option<String>,
		#[arg(long)]
		address: String,
		#[arg(long)]
		contract: Option<String>,
	},
	/// Fee tiers
	Fee {
		#[arg(long)]
		chain: Option<String>,
		/// Serialized message, required by chains that price per message
		#[arg(long)]
		raw_tx: Option<String>,
	},
	/// Block by height; 0 selects the latest
	Block {
		#[arg(long)]
		chain: Option<String>,
		#[arg(long, default_value_t = 0)]
		height: u64,
		#[arg(long)]
		view_tx: bool,
	},
	/// Transaction by hash
	Tx {
		#[arg(long)]
		chain: Option<String>,
		#[arg(long)]
		hash: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Results go to stdout, logs to stderr.
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let node = factory_registry::build_node_from_config(&config)?;
	let output = execute(&node.service, node.primary_chain.as_deref(), args.command).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

/// Runs one command against the adapter serving its chain.
async fn execute(
	service: &AdapterService,
	primary_chain: Option<&str>,
	command: Command,
) -> Result<Value, Box<dyn std::error::Error>> {
	let target = |chain: Option<String>| -> Result<String, Box<dyn std::error::Error>> {
		chain
			.or_else(|| primary_chain.map(str::to_string))
			.ok_or_else(|| "No --chain given and no primary adapter configured".into())
	};

	let output = match command {
		Command::Chains => {
			let mut chains = Vec::new();
			for chain in service.chains() {
				let adapter = service.adapter(chain)?;
				let supported = service.support_chains(chain, adapter.network()).await;
				chains.push(json!({
					"chain": chain,
					"network": adapter.network(),
					"supported": supported,
				}));
			}
			Value::Array(chains)
		},
		Command::Account {
			chain,
			address,
			contract,
		} => {
			let chain = target(chain)?;
			let adapter = service.adapter(&chain)?;
			let request = ChainRequest::new(
				&chain,
				adapter.network(),
				AccountQuery {
					address,
					contract_address: contract,
				},
			);
			json!(adapter.account(&request).await?)
		},
		Command::Fee { chain, raw_tx } => {
			let chain = target(chain)?;
			let adapter = service.adapter(&chain)?;
			let request = ChainRequest::new(&chain, adapter.network(), FeeQuery { raw_tx });
			json!(adapter.fee(&request).await?)
		},
		Command::Block {
			chain,
			height,
			view_tx,
		} => {
			let chain = target(chain)?;
			let adapter = service.adapter(&chain)?;
			let request = ChainRequest::new(&chain, adapter.network(), BlockByNumber { height, view_tx });
			json!(adapter.block_by_number(&request).await?)
		},
		Command::Tx { chain, hash } => {
			let chain = target(chain)?;
			let adapter = service.adapter(&chain)?;
			let request = ChainRequest::new(&chain, adapter.network(), TxByHash { hash });
			json!(adapter.tx_by_hash(&request).await?)
		},
	};
	Ok(output)
}
