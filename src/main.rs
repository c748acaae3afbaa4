//! `vai` — command-line client for the VAI token-and-referral platform.

use std::{path::PathBuf, process, sync::Arc, time::Duration};

use alloy::primitives::{Address, B256};
use clap::{Parser, Subcommand};
use serde_json::json;

use vai_client::{
    aggregate,
    cache::{
        spawn_poll, QueryCache, QueryKey, Snapshot, SnapshotCell, PORTFOLIO_REFRESH,
        ROUND_STATS_REFRESH,
    },
    contracts::ContractService,
    dispatch::Dispatch,
    referral::{CaptureState, ExpiryPolicy, ReferralCapture},
    rpc, ClientError,
};

#[derive(Parser)]
#[command(name = "vai", version, about = "Client for the VAI token-and-referral platform")]
struct Cli {
    /// JSON-RPC HTTP endpoint of the target chain.
    #[arg(long, global = true, env = "VAI_RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Hex private key; required for state-changing commands.
    #[arg(long, global = true, env = "VAI_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Directory for local state (the captured referral code).
    #[arg(long, global = true, env = "VAI_STATE_DIR", default_value = ".vai")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Balances, membership state, and earnings of an account.
    Portfolio {
        /// Defaults to the connected signer.
        #[arg(long)]
        account: Option<Address>,
    },
    /// Referral standing, commissions, and the shareable link.
    Affiliate {
        #[arg(long)]
        account: Option<Address>,
        /// Base URL the referral link is built on.
        #[arg(long, default_value = "https://app.vai.example")]
        base_url: String,
    },
    /// The active bootstrap round and its statistics.
    Round,
    /// Contribution state of an account in the active round.
    Contributor {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Recent on-chain activity of an account, newest first.
    History {
        #[arg(long)]
        account: Option<Address>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Join the membership, crediting the held or given referrer.
    Join {
        /// Overrides the captured referral code.
        #[arg(long)]
        referrer: Option<Address>,
    },
    /// Claim accrued referral commissions.
    ClaimCommissions,
    /// Contribute to the active bootstrap round.
    Contribute {
        /// Native-coin amount, e.g. "0.1".
        amount: String,
    },
    /// Claim bootstrap round rewards.
    ClaimRewards,
    /// Transfer VAI.
    Transfer { to: Address, amount: String },
    /// Approve a VAI spender.
    Approve { spender: Address, amount: String },
    /// Manage the locally held referral code.
    #[command(subcommand)]
    Ref(RefCommand),
    /// Poll the portfolio and round views and print refreshed snapshots.
    Watch {
        #[arg(long)]
        account: Option<Address>,
    },
}

#[derive(Subcommand)]
enum RefCommand {
    /// Capture a referral code from a shared link.
    Capture { url: String },
    /// Store a referral code entered by hand.
    Set { code: String },
    /// Show the currently held code.
    Show,
    /// Drop the held code.
    Clear,
}

fn die(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {error}");
    process::exit(1)
}

fn print_json(value: impl serde::Serialize) {
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{text}"),
        Err(error) => die(error),
    }
}

fn print_tx(hash: B256) {
    print_json(json!({ "transaction_hash": hash }));
}

/// Resolve the account a read command observes: explicit flag first, then the
/// connected signer.
fn observed_account(explicit: Option<Address>, service: &ContractService) -> Address {
    match explicit.or_else(|| service.signer_address()) {
        Some(account) => account,
        None => die("no account: pass --account or connect a key"),
    }
}

async fn build_service(cli: &Cli) -> Result<ContractService, ClientError> {
    let (public, chain_id) = rpc::connect(&cli.rpc_url).await?;
    let mut service = ContractService::new(chain_id, public);
    if let Some(key) = &cli.private_key {
        let (wallet, signer) = rpc::connect_with_key(&cli.rpc_url, key)?;
        service = service.with_wallet(wallet, signer);
    }
    Ok(service)
}

fn referral_store(state_dir: &std::path::Path) -> ReferralCapture {
    ReferralCapture::new(state_dir, ExpiryPolicy::ConsumeOnJoin)
}

fn held_code(state: CaptureState) -> Option<Address> {
    match state {
        CaptureState::CodeHeld(code) => Some(code),
        CaptureState::NoCode => None,
    }
}

fn snapshot_json<T: serde::Serialize>(snapshot: &Snapshot<T>) -> serde_json::Value {
    json!({
        "value": snapshot.value,
        "error": snapshot.error,
        "loading": snapshot.loading,
        "stale": snapshot.stale,
    })
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    // The referral commands are pure local state; no RPC endpoint needed.
    if let Command::Ref(command) = &cli.command {
        let store = referral_store(&cli.state_dir);
        match command {
            RefCommand::Capture { url } => {
                let (state, cleaned) = store.capture_from_url(url)?;
                print_json(json!({ "held": held_code(state), "cleaned_url": cleaned }));
            }
            RefCommand::Set { code } => {
                let state = store.set_manual(code)?;
                print_json(json!({ "held": held_code(state) }));
            }
            RefCommand::Show => {
                print_json(json!({ "held": held_code(store.state()) }));
            }
            RefCommand::Clear => {
                store.clear();
                print_json(json!({ "held": serde_json::Value::Null }));
            }
        }
        return Ok(());
    }

    let service = build_service(&cli).await?;
    let cache = QueryCache::new();
    let dispatch = Dispatch::with_cache(&service, &cache);

    match cli.command {
        Command::Portfolio { account } => {
            let account = observed_account(account, &service);
            print_json(aggregate::fetch_portfolio(&service, account).await?);
        }
        Command::Affiliate { account, base_url } => {
            let account = observed_account(account, &service);
            let view = aggregate::fetch_affiliate(&service, account).await?;
            let link = aggregate::referral_link(&base_url, account);
            print_json(json!({ "view": view, "referral_link": link }));
        }
        Command::Round => {
            let round = aggregate::fetch_round(&service).await?;
            let statistics = aggregate::fetch_round_statistics(&service).await?;
            let now = unix_now();
            print_json(json!({
                "round": round,
                "statistics": statistics,
                "time_remaining": aggregate::time_remaining(round.deadline, now),
                "can_participate": aggregate::can_participate(&round, &statistics, now),
            }));
        }
        Command::Contributor { account } => {
            let account = observed_account(account, &service);
            print_json(aggregate::fetch_contributor(&service, account).await?);
        }
        Command::History { account, limit } => {
            let account = observed_account(account, &service);
            print_json(aggregate::fetch_history(&service, account, limit).await?);
        }
        Command::Join { referrer } => {
            let store = referral_store(&cli.state_dir);
            let referrer = referrer.or_else(|| store.referrer_for_join());
            let hash = dispatch.join(referrer).await?;
            store.on_join_complete();
            print_tx(hash);
        }
        Command::ClaimCommissions => print_tx(dispatch.claim_commissions().await?),
        Command::Contribute { amount } => print_tx(dispatch.contribute(&amount).await?),
        Command::ClaimRewards => print_tx(dispatch.claim_rewards().await?),
        Command::Transfer { to, amount } => print_tx(dispatch.transfer(to, &amount).await?),
        Command::Approve { spender, amount } => print_tx(dispatch.approve(spender, &amount).await?),
        Command::Watch { account } => watch(&service, &cache, account).await,
        Command::Ref(_) => unreachable!("handled above"),
    }
    Ok(())
}

/// Keep the portfolio and round views fresh and print each snapshot until
/// interrupted.
async fn watch(service: &ContractService, cache: &QueryCache, account: Option<Address>) {
    let account = account.or_else(|| service.signer_address());

    let round_cell = Arc::new(SnapshotCell::new());
    cache.register(
        QueryKey::new("round_statistics", None, service.chain_id()),
        round_cell.clone(),
    );
    let round_service = service.clone();
    let _round_poll = spawn_poll(round_cell.clone(), ROUND_STATS_REFRESH, move || {
        let service = round_service.clone();
        async move { aggregate::fetch_round_statistics(&service).await }
    });

    let portfolio_cell = Arc::new(SnapshotCell::new());
    let _portfolio_poll = account.map(|account| {
        cache.register(
            QueryKey::new("portfolio", Some(account), service.chain_id()),
            portfolio_cell.clone(),
        );
        let service = service.clone();
        spawn_poll(portfolio_cell.clone(), PORTFOLIO_REFRESH, move || {
            let service = service.clone();
            async move { aggregate::fetch_portfolio(&service, account).await }
        })
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut report = json!({ "round": snapshot_json(&round_cell.snapshot()) });
                if account.is_some() {
                    report["portfolio"] = snapshot_json(&portfolio_cell.snapshot());
                }
                print_json(report);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(error) = result {
                    eprintln!("warn: failed to listen for ctrl-c: {error}");
                }
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        die(error);
    }
}
