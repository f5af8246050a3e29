use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use unichain::types::{CallContractRequest, SendTransactionRequest};
use unichain::{Network, UnichainClient};

#[derive(Parser)]
#[command(name = "unichain")]
#[command(about = "Unichain CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Target {
    /// Config file path (default: UNICHAIN_CONFIG_PATH or ~/.unichain/config.json)
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Network to use (mainnet, testnet, local); overrides the config file
    #[arg(long, short, global = true)]
    network: Option<Network>,

    /// Base URL; overrides both the config file and the network default
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Network status
    Status,

    /// Block at the given height
    Block { height: u64 },

    /// Most recent blocks
    Blocks {
        #[arg(long, default_value_t = unichain::rest::DEFAULT_LATEST_BLOCKS_LIMIT)]
        limit: u32,
    },

    /// Transaction by hash
    Tx { hash: String },

    /// Submit a signed transfer
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Amount in base units, as a decimal string
        #[arg(long)]
        amount: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        signature: Option<String>,
    },

    /// Account by address
    Account { address: String },

    /// Balance of an account
    Balance { address: String },

    /// Transactions of an account, newest first
    AccountTxs {
        address: String,
        #[arg(long, default_value_t = unichain::rest::DEFAULT_ACCOUNT_TX_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = unichain::rest::DEFAULT_ACCOUNT_TX_OFFSET)]
        offset: u32,
    },

    /// Contract by address
    Contract { address: String },

    /// Call a contract method
    Call {
        address: String,
        method: String,
        /// JSON object of named parameters
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        gas_limit: Option<u64>,
        #[arg(long)]
        gas_price: Option<u64>,
    },

    /// Validator set
    Validators,

    /// Statistics for one validator
    ValidatorStats { address: String },

    /// Look up a block, transaction or account by hash
    Search { hash: String },

    /// Search accounts by free text
    SearchAccounts {
        query: String,
        #[arg(long, default_value_t = unichain::rest::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Subscribe to a live-update channel and print every payload until Ctrl-C
    Watch {
        /// blocks, transactions, accounts, validators, or any other channel name
        channel: String,
        /// Narrow the subscription to one address
        #[arg(long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("unichain {}", env!("CARGO_PKG_VERSION"));
        }
        Some(command) => {
            if let Err(e) = run(cli.target, command).await {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn build_client(target: Target) -> anyhow::Result<UnichainClient> {
    let (mut config, path) = unichain::config::load_config(target.config)?;
    if let Some(network) = target.network {
        config.network = network;
        // An explicit network beats a base URL pinned in the file.
        if target.base_url.is_none() {
            config.base_url = None;
        }
    }
    if let Some(url) = target.base_url {
        config.base_url = Some(url);
    }
    log::debug!("config {} -> {}", path.display(), config.resolved_base_url());
    Ok(UnichainClient::new(config)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(target: Target, command: Commands) -> anyhow::Result<()> {
    let client = build_client(target)?;
    match command {
        Commands::Version => {}
        Commands::Status => print_json(&client.get_status().await?)?,
        Commands::Block { height } => print_json(&client.get_block(height).await?)?,
        Commands::Blocks { limit } => print_json(&client.get_latest_blocks(limit).await?)?,
        Commands::Tx { hash } => print_json(&client.get_transaction(&hash).await?)?,
        Commands::Send {
            from,
            to,
            amount,
            message,
            data,
            signature,
        } => {
            let tx = SendTransactionRequest {
                from,
                to,
                amount,
                message,
                data,
                signature,
            };
            print_json(&client.send_transaction(&tx).await?)?
        }
        Commands::Account { address } => print_json(&client.get_account(&address).await?)?,
        Commands::Balance { address } => print_json(&client.get_balance(&address).await?)?,
        Commands::AccountTxs {
            address,
            limit,
            offset,
        } => print_json(
            &client
                .get_account_transactions(&address, limit, offset)
                .await?,
        )?,
        Commands::Contract { address } => print_json(&client.get_contract(&address).await?)?,
        Commands::Call {
            address,
            method,
            params,
            from,
            gas_limit,
            gas_price,
        } => {
            let params: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&params)
                    .map_err(|e| anyhow::anyhow!("--params must be a JSON object: {}", e))?;
            let call = CallContractRequest {
                method,
                params,
                from,
                gas_limit,
                gas_price,
            };
            print_json(&client.call_contract(&address, &call).await?)?
        }
        Commands::Validators => print_json(&client.get_validators().await?)?,
        Commands::ValidatorStats { address } => {
            print_json(&client.get_validator_stats(&address).await?)?
        }
        Commands::Search { hash } => print_json(&client.search_by_hash(&hash).await?)?,
        Commands::SearchAccounts { query, limit } => {
            print_json(&client.search_accounts(&query, limit).await?)?
        }
        Commands::Watch { channel, address } => run_watch(&client, &channel, address).await?,
    }
    Ok(())
}

async fn run_watch(
    client: &UnichainClient,
    channel: &str,
    address: Option<String>,
) -> anyhow::Result<()> {
    client.connect_websocket().await?;
    log::info!("watching {} on {}", channel, client.ws().ws_url());
    client.subscribe(channel, address.as_deref(), |payload| {
        match serde_json::to_string(&payload) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("unprintable payload: {}", e),
        }
    })?;

    tokio::signal::ctrl_c().await?;
    client.unsubscribe(channel, address.as_deref());
    client.disconnect_websocket().await;
    Ok(())
}
