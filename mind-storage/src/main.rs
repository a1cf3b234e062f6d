mod app;
mod bootstrap;
mod cli;
mod config;
mod date_engine;
mod entry_store;
mod error;
mod gateway;
mod logging;
mod login;
mod runtime;
mod session_store;
mod ui;
mod validation;

use anyhow::{bail, Context, Result};
use app::App;
use clap::Parser;
use cli::{Cli, Commands, LoginArgs};
use config::MindConfig;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use date_engine::{Clock, SystemClock};
use gateway::{AuthGateway, DEV_EMAIL};
use ratatui::{backend::CrosstermBackend, Terminal};
use runtime::Services;
use session_store::SessionStore;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = MindConfig::load()?;

    if let Err(e) = logging::init(&config.log_path()?) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_tui(config, false).await,
        Commands::Dev => {
            println!("Dev mode: signed in as {}, nothing leaves this process.", DEV_EMAIL);
            run_tui(config, true).await
        }
        Commands::Login(args) => run_login(config, args).await,
        Commands::Logout => run_logout(config).await,
        Commands::DeleteAccount { yes } => run_delete_account(config, yes).await,
        Commands::ConfigPath => {
            let path = MindConfig::ensure_exists()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run_tui(config: MindConfig, dev: bool) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let today = date_engine::today(clock.as_ref());
    let quiet = config.autosave_quiet();
    let services = bootstrap::build_services(config, dev, today)?;

    let mut app = App::new(clock, quiet);
    bootstrap::initialize_app_state(&mut app, &services).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = runtime::run_app(&mut terminal, &mut app, &services).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("App exited with error: {:#}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Services for the one-shot shell commands, which always talk to the
/// configured backend.
fn shell_services(config: MindConfig) -> Result<Services> {
    let today = date_engine::today(&SystemClock);
    bootstrap::build_services(config, false, today)
}

async fn run_login(config: MindConfig, args: LoginArgs) -> Result<()> {
    let services = shell_services(config)?;
    let gateway = services.gateway.as_ref();

    let user = match (args.email, args.provider) {
        (Some(email), _) => login::run_password_login(gateway, &email).await?,
        (None, Some(provider)) => {
            login::run_oauth_login(gateway, provider, &services.config).await?
        }
        (None, None) => bail!("Pass --email or --provider"),
    };

    services.persist_session();
    println!(
        "Logged in as {}.",
        user.email.as_deref().unwrap_or(user.id.as_str())
    );
    Ok(())
}

async fn run_logout(config: MindConfig) -> Result<()> {
    let services = shell_services(config)?;
    if let Err(e) = services.gateway.sign_out().await {
        // The local files go regardless.
        tracing::warn!("Remote sign-out failed: {}", e);
    }
    SessionStore::default_location()?.clear()?;
    println!("Logged out.");
    Ok(())
}

async fn run_delete_account(config: MindConfig, yes: bool) -> Result<()> {
    let services = shell_services(config)?;
    let user = services
        .gateway
        .current_user()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?
        .context("Not logged in. Run `mind-storage login` first.")?;

    let who = user.email.clone().unwrap_or_else(|| user.id.clone());
    if !yes && !confirm(&format!(
        "Delete the account {} and every entry in it? This cannot be undone. [y/N] ",
        who
    ))? {
        println!("Cancelled.");
        return Ok(());
    }

    services
        .gateway
        .delete_account(&user.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    services.forget_session();
    println!("Account {} deleted.", who);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
