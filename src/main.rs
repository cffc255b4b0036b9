//! bank_fsm - banking client state machines on the command line
//!
//! ```text
//! ┌──────────┐   LOGIN    ┌──────────────┐  authorized  ┌────────────────┐
//! │  Config  │──────────▶│ Auth Machine │─────────────▶│ Data Machines  │
//! │  (YAML)  │           │  + refresher │              │ (accounts ...) │
//! └──────────┘           └──────────────┘              └────────────────┘
//!                               │ LOGOUT (EndSession)          │
//!                               ▼                              ▼
//!                            API (cookie session, reqwest)
//! ```

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use bank_fsm::auth::{
    AuthEvent, AuthMachine, AuthService, AuthState, Credentials, RefreshScheduler, start_auth_machine,
};
use bank_fsm::bank_accounts::{BankAccount, BankAccountDraft, display_order};
use bank_fsm::config::AppConfig;
use bank_fsm::data::{DataEvent, DataSnapshot, FetchQuery, ResourceService, spawn_data_machine};
use bank_fsm::http::{ApiClient, HttpAuthService, HttpResourceService};
use bank_fsm::logging::init_logging;
use bank_fsm::failure::Failure;
use bank_fsm::machine::MachineHandle;
use bank_fsm::notice::{NoticeSink, TracingNotices};
use bank_fsm::resource::Resource;
use bank_fsm::transactions::{Transaction, TransactionDraft, TransactionFeed, format_cents, parse_amount};
use bank_fsm::users::User;
use bank_fsm::{DataMachine, HttpResource};

#[derive(Parser)]
#[command(name = "bank_fsm", version = env!("BANK_FSM_GIT_HASH"))]
#[command(about = "Drive the banking client state machines against a live API", long_about = None)]
struct Cli {
    /// Config environment, loads config/<env>.yaml
    #[arg(long, default_value = "dev")]
    env: String,

    #[arg(long, short)]
    username: String,

    /// Falls back to BANK_FSM_PASSWORD
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the signed-in user
    Whoami,
    /// List bank accounts, active first
    Accounts,
    /// Add a bank account
    AddAccount {
        #[arg(long)]
        bank_name: String,
        #[arg(long)]
        routing_number: String,
        #[arg(long)]
        account_number: String,
    },
    /// Delete a bank account by id
    RemoveAccount { id: String },
    /// List or search contacts
    Contacts {
        #[arg(long)]
        search: Option<String>,
    },
    /// List transactions
    Transactions {
        #[arg(long, default_value = "public", value_parser = ["public", "contacts", "personal"])]
        feed: String,
    },
    /// Pay a contact
    Pay {
        /// Receiving user id
        #[arg(long)]
        to: String,
        /// Dollars, e.g. 12.50 or $12.5
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        description: String,
    },
    /// Request money from a contact
    Request {
        /// User id asked to pay
        #[arg(long)]
        from: String,
        #[arg(long, value_parser = parse_amount)]
        amount: i64,
        #[arg(long)]
        description: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.env).context("Failed to load configuration")?;
    let _guard = init_logging(&config);
    info!(env = %cli.env, version = env!("BANK_FSM_GIT_HASH"), "bank_fsm starting");

    let password = match cli.password.clone() {
        Some(password) => password,
        None => std::env::var("BANK_FSM_PASSWORD")
            .context("No --password given and BANK_FSM_PASSWORD is not set")?,
    };

    let client = Arc::new(ApiClient::new(&config.api)?);
    let notices: Arc<dyn NoticeSink> = Arc::new(TracingNotices);
    let buffer = config.machine.event_buffer;

    // Task kept so it can be joined after logout
    let auth_service: Arc<dyn AuthService> =
        Arc::new(HttpAuthService::new(client.clone(), config.session.remember_me));
    let (auth, auth_task, session) =
        start_auth_machine(auth_service, buffer, Some(notices.clone())).await?;
    let session = if session.is_logged_in() {
        session
    } else {
        let credentials = Credentials::new(&cli.username, password, config.session.remember_me);
        auth.send_until(AuthEvent::Login(credentials), |s| !s.state.is_in_flight())
            .await?
    };
    let Some(user) = session.current_user.clone().filter(|_| session.is_logged_in()) else {
        let reason = session
            .last_auth_error
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("Login failed: {}", reason);
    };

    let refresher = config
        .session
        .refresh_interval()
        .map(|interval| RefreshScheduler::new(auth.clone(), interval).spawn());

    let outcome = run_command(&cli.command, &user, &client, buffer, &notices).await;

    if let Some(refresher) = refresher {
        refresher.abort();
    }
    sign_out(auth).await;
    if let Err(e) = auth_task.await {
        warn!(error = %e, "Auth machine task failed");
    }

    outcome
}

async fn run_command(
    command: &Command,
    user: &User,
    client: &Arc<ApiClient>,
    buffer: usize,
    notices: &Arc<dyn NoticeSink>,
) -> anyhow::Result<()> {
    match command {
        Command::Whoami => {
            println!("{} ({}) id={}", user.display_name(), user.username, user.id);
        }
        Command::Accounts => {
            let accounts = open::<BankAccount>(client, None, buffer, notices);
            let snapshot = fetch(&accounts, FetchQuery::new()).await?;
            print_accounts(&snapshot);
        }
        Command::AddAccount {
            bank_name,
            routing_number,
            account_number,
        } => {
            let accounts = open::<BankAccount>(client, None, buffer, notices);
            fetch(&accounts, FetchQuery::new()).await?;
            let draft = BankAccountDraft::new(bank_name, routing_number, account_number);
            let snapshot = settle(&accounts, DataEvent::Create(draft)).await?;
            print_accounts(&snapshot);
        }
        Command::RemoveAccount { id } => {
            let accounts = open::<BankAccount>(client, None, buffer, notices);
            fetch(&accounts, FetchQuery::new()).await?;
            let snapshot = settle(&accounts, DataEvent::Delete(id.clone())).await?;
            print_accounts(&snapshot);
        }
        Command::Contacts { search } => {
            let users = open::<User>(client, None, buffer, notices);
            let query = match search {
                Some(q) => FetchQuery::new().with("q", q),
                None => FetchQuery::new(),
            };
            let snapshot = fetch(&users, query).await?;
            for contact in &snapshot.records {
                println!("{:<24} {:<20} {}", contact.display_name(), contact.username, contact.id);
            }
        }
        Command::Transactions { feed } => {
            let feed = match feed.as_str() {
                "contacts" => TransactionFeed::Contacts,
                "personal" => TransactionFeed::Personal,
                _ => TransactionFeed::Public,
            };
            let transactions = open::<Transaction>(client, Some(feed.path()), buffer, notices);
            let snapshot = fetch(&transactions, FetchQuery::new()).await?;
            println!("{} transactions ({} feed)", snapshot.records.len(), feed);
            for tx in &snapshot.records {
                let status = format!("{:?}", tx.status);
                println!("{:>12} {:<10} {}", tx.display_amount(), status, tx.description);
            }
        }
        Command::Pay {
            to,
            amount,
            description,
        } => {
            let draft = TransactionDraft::payment(&user.id, to, *amount, description);
            create_transaction(client, draft, buffer, notices).await?;
        }
        Command::Request {
            from,
            amount,
            description,
        } => {
            let draft = TransactionDraft::request(&user.id, from, *amount, description);
            create_transaction(client, draft, buffer, notices).await?;
        }
    }
    Ok(())
}

async fn create_transaction(
    client: &Arc<ApiClient>,
    draft: TransactionDraft,
    buffer: usize,
    notices: &Arc<dyn NoticeSink>,
) -> anyhow::Result<()> {
    let feed = TransactionFeed::Personal;
    let transactions = open::<Transaction>(client, Some(feed.path()), buffer, notices);
    fetch(&transactions, FetchQuery::new()).await?;
    let summary = format!("{:?} of {} to {}", draft.transaction_type, format_cents(draft.amount), draft.receiver_id);
    let snapshot = settle(&transactions, DataEvent::Create(draft)).await?;
    println!("{} sent, {} transactions in {} feed", summary, snapshot.records.len(), feed);
    Ok(())
}

fn open<R: HttpResource>(
    client: &Arc<ApiClient>,
    path: Option<&str>,
    buffer: usize,
    notices: &Arc<dyn NoticeSink>,
) -> MachineHandle<DataMachine<R>> {
    let service: Arc<dyn ResourceService<R>> = match path {
        Some(path) => Arc::new(HttpResourceService::<R>::with_path(client.clone(), path)),
        None => Arc::new(HttpResourceService::<R>::new(client.clone())),
    };
    spawn_data_machine(R::PATH, service, buffer, Some(notices.clone()))
}

async fn fetch<R: Resource>(
    handle: &MachineHandle<DataMachine<R>>,
    query: FetchQuery,
) -> anyhow::Result<DataSnapshot<R>> {
    settle(handle, DataEvent::fetch_with(query)).await
}

/// Send `event` and wait for the machine to come to rest
async fn settle<R: Resource>(
    handle: &MachineHandle<DataMachine<R>>,
    event: DataEvent<R>,
) -> anyhow::Result<DataSnapshot<R>> {
    let snapshot = handle
        .send_until(event, |s| !s.state.is_in_flight())
        .await?;
    if let Some(error) = &snapshot.last_error {
        bail!("{} request failed: {}", handle.name(), describe_failure(error));
    }
    Ok(snapshot)
}

fn describe_failure(failure: &Failure) -> String {
    if failure.kind.is_transient() {
        format!("{} (temporary, try again)", failure)
    } else {
        failure.to_string()
    }
}

fn print_accounts(snapshot: &DataSnapshot<BankAccount>) {
    if snapshot.is_empty() {
        println!("No bank accounts");
        return;
    }
    for account in display_order(&snapshot.records) {
        let deleted = if account.is_deleted { " (deleted)" } else { "" };
        println!(
            "{:<14} {:<28} {} {}{}",
            account.id,
            account.bank_name,
            account.routing_number,
            account.masked_account_number(),
            deleted
        );
    }
}

async fn sign_out(auth: MachineHandle<AuthMachine>) {
    if !auth.snapshot().is_logged_in() {
        return;
    }
    match auth
        .send_until(AuthEvent::Logout, |s| s.state == AuthState::Unauthorized)
        .await
    {
        Ok(_) => info!("Signed out"),
        Err(e) => warn!(error = %e, "Logout failed"),
    }
}
