//! parcero-wallet: connect a wallet on Polygon and read the PARCERO balance.

#[cfg(not(target_arch = "wasm32"))]
use clap::{Parser, Subcommand};
#[cfg(not(target_arch = "wasm32"))]
use parcero_wallet::WalletBridge;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Restore a previously authorized session and print it
    Status,
    /// Ask the wallet for access and switch it to Polygon
    Connect,
    /// Forget the session and stay logged out on the next start
    Disconnect,
    /// Re-read the token balance
    Refresh,
    /// Print the token's block-explorer page
    Explorer {
        /// Also open it in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Apply account and chain changes reported by the wallet
    Events,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eyre::Result<()> {
    // Initialize logging; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        git_hash = env!("GIT_HASH"),
        build_time = env!("BUILD_TIME"),
        "Starting parcero-wallet"
    );

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command.unwrap_or(Command::Status)))
}

#[cfg(not(target_arch = "wasm32"))]
async fn run(command: Command) -> eyre::Result<()> {
    let bridge = WalletBridge::default();
    if let Err(e) = bridge.start().await {
        tracing::warn!(error = %e, "session restore failed");
    }

    let result: eyre::Result<()> = match command {
        Command::Status => Ok(()),
        Command::Connect => bridge.connect_wallet().await.map(drop).map_err(Into::into),
        Command::Disconnect => bridge.disconnect_wallet().map_err(Into::into),
        Command::Refresh => bridge.refresh_balance().await.map(drop).map_err(Into::into),
        Command::Explorer { open } => {
            let url = if open {
                bridge.open_explorer()?
            } else {
                bridge
                    .explorer_url()
                    .ok_or_else(|| eyre::eyre!("no block explorer configured"))?
            };
            println!("{url}");
            return Ok(());
        }
        Command::Events => bridge
            .sync_provider_events()
            .await
            .map(drop)
            .map_err(Into::into),
    };

    // Print the record even when the command failed; it carries the error.
    println!("{}", serde_json::to_string_pretty(&bridge.view())?);
    result
}

#[cfg(target_arch = "wasm32")]
fn main() {}
