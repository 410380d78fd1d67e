//! tempo-fees - Tempo stablecoin transfer client
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────┐
//! │  Session │───▶│ Request  │───▶│ Orchestrator │───▶│ Outcome  │
//! │ (passkey)│    │ (tokens) │    │ submit+wait  │    │ (status) │
//! └──────────┘    └──────────┘    └──────────────┘    └──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use tempo_fees::chain::{Faucet, JsonRpcClient, MockChain, ReceiptSource, TransferGateway};
use tempo_fees::config::AppConfig;
use tempo_fees::core_types::{Address, format_units, parse_units};
use tempo_fees::session::{AccountManager, FileStore, LocalAuthenticator};
use tempo_fees::tokens::FeeMode;
use tempo_fees::transfer::{
    TransferError, TransferOrchestrator, TransferOutcome, TransferPayload, TransferRequest,
};

/// Simulated chain latency for `--mock` runs
const MOCK_LATENCY: Duration = Duration::from_millis(300);

#[derive(Parser, Debug)]
#[command(name = "tempo-fees", version, about = "Tempo stablecoin transfers with a selectable fee token")]
struct Cli {
    /// Config environment, reads config/<env>.yaml
    #[arg(long, global = true, default_value = "dev")]
    env: String,

    /// Use the in-process simulated chain
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a passkey account and fund it from the faucet
    Signup,
    /// Sign in with the saved passkey
    Signin,
    /// End the session; the passkey stays saved
    Signout,
    /// Show the active account
    Whoami,
    /// Preview the transfer payload
    Payload(Selection),
    /// Submit a transfer and wait for confirmation
    Transfer(Selection),
    /// Serve the built web client
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug)]
struct Selection {
    /// Token to transfer
    #[arg(long, default_value = "alphaUSD")]
    token: String,

    /// Fee token symbol, or `native` to pay in the transfer token
    #[arg(long, default_value = "native")]
    fee_token: FeeMode,

    /// Human units; defaults to the configured amount
    #[arg(long)]
    amount: Option<String>,

    /// Recipient; defaults to the configured recipient
    #[arg(long)]
    to: Option<Address>,
}

struct Services {
    manager: AccountManager,
    orchestrator: TransferOrchestrator,
}

fn build_services(config: &AppConfig) -> Result<Services> {
    let (gateway, receipts, faucet): (
        Arc<dyn TransferGateway>,
        Arc<dyn ReceiptSource>,
        Arc<dyn Faucet>,
    ) = if config.chain.mock {
        let chain = Arc::new(MockChain::new().with_latency(MOCK_LATENCY));
        (chain.clone(), chain.clone(), chain)
    } else {
        let client = Arc::new(
            JsonRpcClient::new(&config.chain.rpc_url, config.chain.request_timeout())
                .context("Failed to create JSON-RPC client")?,
        );
        (client.clone(), client.clone(), client)
    };

    let manager = AccountManager::new(
        Arc::new(FileStore::new(config.store_path())),
        Arc::new(LocalAuthenticator::new()),
        faucet,
        config.session.rp_id.clone(),
    );
    let orchestrator = TransferOrchestrator::new(
        gateway,
        receipts,
        config.token_registry(),
        config.confirmation.wait_config(),
    );

    Ok(Services {
        manager,
        orchestrator,
    })
}

fn build_request(config: &AppConfig, selection: &Selection) -> Result<TransferRequest> {
    let amount_text = selection
        .amount
        .as_deref()
        .unwrap_or(&config.transfer.amount);
    let amount = parse_units(amount_text, config.transfer.decimals)
        .with_context(|| format!("Invalid amount: {}", amount_text))?;

    let request = TransferRequest::build(
        &config.token_registry(),
        selection.to.unwrap_or(config.transfer.recipient),
        &selection.token,
        amount,
        &selection.fee_token,
    )?;
    Ok(request)
}

async fn run_transfer(config: &AppConfig, services: &Services, selection: &Selection) -> Result<()> {
    let account = services.manager.restore();
    let request = build_request(config, selection)?;

    let preview = TransferPayload::preview(account.as_ref().map(|_| &request));
    println!("{}", preview.to_pretty_json());
    println!(
        "Sending {} {} to {} (fee token: {})",
        format_units(request.amount, config.transfer.decimals),
        selection.token,
        request.to.short(),
        selection.fee_token
    );

    let mut rx = services.orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let outcome = rx.borrow_and_update().outcome.clone();
            println!("{}", outcome.status_line());
            if outcome.is_terminal() {
                break;
            }
        }
    });

    let outcome = match services
        .orchestrator
        .submit(account.as_ref(), &request)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            printer.abort();
            let hint = match e {
                TransferError::NotAuthenticated => "Please sign in to continue.",
                _ => "Transfer rejected",
            };
            return Err(anyhow::Error::new(e).context(hint));
        }
    };
    if let Err(e) = printer.await {
        warn!(error = %e, "Status printer stopped");
    }

    match &outcome {
        TransferOutcome::Failed {
            technical_detail, ..
        } => println!("Details: {}", technical_detail),
        _ => {
            if let Some(tx_id) = outcome.tx_id() {
                println!("Tx: {}", tx_id.short());
            }
            if let Some(url) = outcome.explorer_url(&config.chain.explorer_tx_base) {
                println!("Explorer: {}", url);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.env).context("Failed to load configuration")?;
    if cli.mock {
        config.chain.mock = true;
    }
    let _log_guard = tempo_fees::logging::init_logging(&config);

    info!(
        git_hash = env!("GIT_HASH"),
        env = %cli.env,
        mock = config.chain.mock,
        "Starting tempo-fees"
    );

    if let Command::Serve { port } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        tempo_fees::server::serve(&config.server).await?;
        return Ok(());
    }

    let services = build_services(&config)?;

    match &cli.command {
        Command::Signup => {
            println!("Creating passkey...");
            let account = services
                .manager
                .sign_up()
                .await
                .context("Sign-up failed")?;
            println!("Signed up + funded: {}", account.address.short());
        }
        Command::Signin => {
            println!("Verifying passkey...");
            let account = services
                .manager
                .sign_in()
                .await
                .context("Sign-in failed")?;
            println!("Logged in: {}", account.address.short());
        }
        Command::Signout => {
            services.manager.sign_out()?;
            println!("Logged out. Sign in again to continue.");
        }
        Command::Whoami => match services.manager.restore() {
            Some(account) => {
                println!("Restored session: {}", account.address.short());
                println!("Address: {}", account.address);
                println!("Credential: {}", account.credential.id);
            }
            None => println!("Please sign in to continue."),
        },
        Command::Payload(selection) => {
            let account = services.manager.restore();
            let request = build_request(&config, selection)?;
            let preview = TransferPayload::preview(account.as_ref().map(|_| &request));
            println!("{}", preview.to_pretty_json());
        }
        Command::Transfer(selection) => run_transfer(&config, &services, selection).await?,
        Command::Serve { .. } => {}
    }

    Ok(())
}
