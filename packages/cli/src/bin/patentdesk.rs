use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use cli::auth::LoginArgs;
use cli::dashboard::DashboardCommands;
use cli::filings::FilingsCommands;
use cli::notifications::NotificationsCommands;
use cli::users::UsersCommands;
use patentdesk_cli::{AppContext, Config};

#[derive(Parser)]
#[command(name = "patentdesk")]
#[command(about = "PatentDesk CLI - patent filing and user administration")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as an admin
    Login(LoginArgs),
    /// Forget the saved admin session
    Logout,
    /// Show the logged-in admin
    Whoami,
    /// Check that the REST backend is reachable
    Health,
    /// Review and move patent filings through the workflow
    #[command(subcommand)]
    Filings(FilingsCommands),
    /// Manage platform user accounts
    #[command(subcommand)]
    Users(UsersCommands),
    /// Read and clear a user's notifications
    #[command(subcommand)]
    Notifications(NotificationsCommands),
    /// Dashboard figures
    Dashboard {
        #[command(subcommand)]
        view: Option<DashboardCommands>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new(default_level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let mut ctx = AppContext::new(config)?;

    match command {
        Commands::Login(args) => cli::auth::login(&ctx, args).await,
        Commands::Logout => cli::auth::logout(&ctx).await,
        Commands::Whoami => cli::auth::whoami(&ctx).await,
        Commands::Health => cli::auth::health(&ctx).await,
        Commands::Filings(cmd) => cli::filings::handle_filings_command(&mut ctx, cmd).await,
        Commands::Users(cmd) => cli::users::handle_users_command(&mut ctx, cmd).await,
        Commands::Notifications(cmd) => {
            cli::notifications::handle_notifications_command(&mut ctx, cmd).await
        }
        Commands::Dashboard { view } => {
            cli::dashboard::handle_dashboard_command(&mut ctx, view.unwrap_or_default()).await
        }
    }
}
