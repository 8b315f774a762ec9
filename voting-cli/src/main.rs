//! Command-line front-end for the voting dapp client: the same operations
//! the browser dashboards expose, driven from a terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use voting_client::config::{from_toml_path, AppConfig};
use voting_client::{connect, run_event_loop, DashboardState, Session, TxOutcome, VotingApp};
use voting_eth_adapter::{load_abi, EthVotingContract, EthWalletProvider};
use voting_interface::Address;

#[derive(Parser)]
#[command(author, version, about = "Client for the on-chain voting dapp")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "vdapp_config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the dashboard state for the active account
    Dashboard {
        /// Keep running and re-print whenever the wallet session changes
        #[arg(long)]
        watch: bool,
    },
    /// List candidates and their vote counts
    Candidates,
    /// Show the winner once voting has ended
    Winner,
    /// List pending registration requests with their CINs (admin)
    Requests,
    /// Request voter registration with the given CIN
    RequestRegistration {
        /// Identity string for manual admin verification
        cin: String,
    },
    /// Cast a vote for a candidate
    Vote {
        /// 1-based candidate id, as shown by `candidates`
        candidate_id: String,
    },
    /// Privileged operations for the contract owner
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Add a candidate to the ballot
    AddCandidate { name: String },
    /// Approve a pending registration request
    Approve { voter: Address },
    /// Reject a pending registration request
    Reject { voter: Address },
    /// Start the voting session
    Start,
    /// End the voting session
    End,
    /// Reset an ended voting session
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config: AppConfig = from_toml_path(&cli.config)
        .with_context(|| format!("could not load config from {}", cli.config.display()))?;

    let wallet = EthWalletProvider::new(&config.connection)?;
    let contract = match &config.connection.abi_path {
        Some(path) => EthVotingContract::with_abi(
            wallet.provider(),
            config.contract_address,
            load_abi(path)?,
        ),
        None => EthVotingContract::new(wallet.provider(), config.contract_address),
    };
    let app = VotingApp::new(contract);

    let session = connect(&wallet, app.client()).await?;

    match cli.command {
        Command::Dashboard { watch } => {
            let state = app.refresh(session.account).await;
            print_dashboard(&session, &state);
            if watch {
                watch_dashboard(wallet, app, session).await?;
            }
        }
        Command::Candidates => {
            for candidate in app.client().candidates().await {
                println!(
                    "{:>3}  {:<24} {:>6}",
                    candidate.id, candidate.name, candidate.vote_count
                );
            }
        }
        Command::Winner => println!("{}", app.client().winner().await),
        Command::Requests => {
            let requests = app
                .client()
                .registration_requests_with_cins(session.account)
                .await;
            if requests.is_empty() {
                println!("No pending registration requests.");
            }
            for (voter, cin) in requests {
                println!("{voter}  CIN: {cin}");
            }
        }
        Command::RequestRegistration { cin } => {
            finish(app.request_registration(session.account, &cin).await);
        }
        Command::Vote { candidate_id } => {
            finish(app.submit_vote(session.account, &candidate_id).await);
        }
        Command::Admin(command) => {
            let outcome = match command {
                AdminCommand::AddCandidate { name } => {
                    app.add_candidate(session.account, &name).await
                }
                AdminCommand::Approve { voter } => app.approve_voter(session.account, voter).await,
                AdminCommand::Reject { voter } => app.reject_voter(session.account, voter).await,
                AdminCommand::Start => app.start_voting(session.account).await,
                AdminCommand::End => app.end_voting(session.account).await,
                AdminCommand::Reset => app.reset_voting(session.account).await,
            };
            finish(outcome);
        }
    }

    Ok(())
}

/// Re-prints the dashboard on every refresh until interrupted. Wallet events
/// (account or network switches) re-acquire the session and trigger a full
/// re-synchronization.
async fn watch_dashboard(
    wallet: EthWalletProvider,
    app: VotingApp<EthVotingContract>,
    session: Session,
) -> anyhow::Result<()> {
    let mut snapshots = app.sync().subscribe();
    let (sessions_tx, mut sessions_rx) = watch::channel(Some(session));
    tokio::spawn(run_event_loop(
        wallet,
        app.client().clone(),
        app.sync().clone(),
        sessions_tx,
    ));

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().clone();
                match *sessions_rx.borrow() {
                    Some(session) => print_dashboard(&session, &state),
                    None => println!("wallet disconnected; waiting for an account"),
                }
            }
            changed = sessions_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if sessions_rx.borrow_and_update().is_none() {
                    println!("wallet disconnected; waiting for an account");
                }
            }
        }
    }
    Ok(())
}

fn print_dashboard(session: &Session, state: &DashboardState) {
    println!("account: {}  (chain {})", session.account, session.chain_id);
    println!("phase:   {}", state.phase);
    println!(
        "voter:   registered={} requested={} voted={}",
        state.voter.is_registered, state.voter.has_requested, state.voter.has_voted
    );
    if state.voter.has_voted {
        println!("         voted for candidate {}", state.voter.vote);
    }
    if state.candidates.is_empty() {
        println!("no candidates yet");
    }
    for candidate in &state.candidates {
        println!(
            "{:>3}  {:<24} {:>6}",
            candidate.id, candidate.name, candidate.vote_count
        );
    }
}

fn finish(outcome: TxOutcome) {
    println!("{}", outcome.message);
    if !outcome.success {
        std::process::exit(1);
    }
}
