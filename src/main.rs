use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use crib_portal::api::{BankCredentials, CribCredentials, ReportQuery};
use crib_portal::config::PortalConfig;
use crib_portal::dispatch::Navigation;
use crib_portal::error::PortalError;
use crib_portal::portal::Portal;
use crib_portal::session::Role;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crib-portal", about = "CRIB portal session and navigation CLI")]
struct Cli {
    /// Backend base URL; falls back to `CRIB_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Session file; falls back to `CRIB_SESSION_FILE`.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session.
    Login(PortalCommand),
    /// Register a new account.
    Register(PortalCommand),
    /// Clear the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// List sidebar entries for the current session.
    Nav,
    /// Resolve a path: which view renders, or where it redirects.
    Open { path: String },
    /// Show the logged-in bank's activation status.
    Status,
    /// Ask CRIB to add the logged-in bank to the network.
    Activate {
        #[arg(long)]
        license_number: String,
    },
    /// List bank activation requests (CRIB members).
    ActivationRequests {
        #[arg(long, default_value = "pending")]
        status: String,
    },
    /// List customer CRIB accounts registered by the logged-in bank.
    Accounts,
    /// List customer report requests (CRIB members).
    Reports {
        #[arg(long, default_value = "Pending")]
        status: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Approve a customer report request (CRIB members).
    Approve { request_id: String, nic: String },
}

#[derive(Args, Debug)]
struct PortalCommand {
    #[command(subcommand)]
    portal: PortalKind,
}

#[derive(Subcommand, Debug)]
enum PortalKind {
    Bank {
        #[arg(long)]
        bank_name: String,
        #[arg(long, env = "CRIB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Crib {
        #[arg(long)]
        user_name: String,
        #[arg(long, env = "CRIB_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crib_portal=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PortalError> {
    let mut config = PortalConfig::from_env_with_api_url(cli.api_url.as_deref())?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    let portal = Portal::open(config)?;

    match cli.command {
        Command::Login(cmd) => login(&portal, cmd.portal).await,
        Command::Register(cmd) => register(&portal, cmd.portal).await,
        Command::Logout => {
            portal.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            whoami(&portal);
            Ok(())
        }
        Command::Nav => {
            for entry in portal.nav_entries() {
                println!("{:<14} {}", entry.label, entry.path);
            }
            Ok(())
        }
        Command::Open { path } => {
            open(&portal, &path);
            Ok(())
        }
        Command::Status => {
            let status = portal.approval_status().await?;
            println!("{status}");
            Ok(())
        }
        Command::Activate { license_number } => {
            let status = portal.request_activation(&license_number).await?;
            println!("activation requested; status: {status}");
            Ok(())
        }
        Command::ActivationRequests { status } => {
            for request in portal.activation_requests(&status).await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    request.bank_name, request.bank_id, request.license_number, request.status, request.created_at
                );
            }
            Ok(())
        }
        Command::Accounts => {
            for account in portal.crib_accounts().await? {
                let state = if account.is_active { "active" } else { "inactive" };
                println!("{}\t{}\t{}\t{}\t{state}", account.crib_id, account.nic, account.full_name, account.email);
            }
            Ok(())
        }
        Command::Reports { status, limit, offset } => {
            let rows = portal.report_requests(&ReportQuery { status, limit, offset }).await?;
            for row in rows {
                let state = if row.status { "approved" } else { "pending" };
                println!("{}\t{}\t{}\t{state}", row.id, row.nic, row.email);
            }
            Ok(())
        }
        Command::Approve { request_id, nic } => {
            portal.approve_report(&request_id, &nic).await?;
            println!("approved {request_id}");
            Ok(())
        }
    }
}

async fn login(portal: &Portal, kind: PortalKind) -> Result<(), PortalError> {
    let outcome = match kind {
        PortalKind::Bank { bank_name, password } => portal.login_bank(&BankCredentials { bank_name, password }).await?,
        PortalKind::Crib { user_name, password } => portal.login_crib(&CribCredentials { user_name, password }).await?,
    };
    println!("logged in as {}", portal.session().principal_label());
    if outcome.role == Role::Bank {
        println!("approval status: {}", outcome.approval);
    }
    if !outcome.wallet_attached {
        println!("no wallet secret on this session; signing is unavailable");
    }
    println!("next: {}", outcome.landing);
    Ok(())
}

async fn register(portal: &Portal, kind: PortalKind) -> Result<(), PortalError> {
    match kind {
        PortalKind::Bank { bank_name, password } => {
            portal.register_bank(&BankCredentials { bank_name, password }).await?;
            println!("bank registered; log in with `crib-portal login bank`");
        }
        PortalKind::Crib { user_name, password } => {
            portal.register_crib(&CribCredentials { user_name, password }).await?;
            println!("crib member registered; log in with `crib-portal login crib`");
        }
    }
    Ok(())
}

fn whoami(portal: &Portal) {
    let session = portal.session();
    if !session.is_authenticated() {
        println!("not logged in");
        return;
    }
    println!("principal: {}", session.principal_label());
    if !session.organization_id.is_empty() {
        println!("organization id: {}", session.organization_id);
    }
    println!("wallet secret: {}", if session.wallet_secret.is_some() { "stored" } else { "none" });
}

fn open(portal: &Portal, path: &str) {
    match portal.navigate(path) {
        Navigation::Render { view, layout, nav } => {
            println!("render {view:?} in {layout:?}");
            for entry in nav {
                println!("  {:<14} {}", entry.label, entry.path);
            }
        }
        Navigation::Redirect { to, reason } => println!("redirect to {to} ({reason:?})"),
        Navigation::NotFound => println!("no view registered for {path}"),
    }
}
