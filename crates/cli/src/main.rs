// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

// resocks5 - CLI Client
// Command-line shell over the proxy view core

mod render;
mod session;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resocks5_gui_core::{
    validate_draft, ConnectionState, MainViewModel, SettingsField, SettingsFormViewModel,
};

use session::Session;

#[derive(Parser)]
#[command(name = "resocks5")]
#[command(about = "Local SOCKS5 proxy controller", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend client configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the proxy is running
    Status,

    /// Start the proxy
    Start,

    /// Stop the proxy
    Stop,

    /// Start the proxy if stopped, stop it if running
    Toggle,

    /// Print proxy state changes until interrupted
    Watch,

    /// Copy the local proxy address to the clipboard
    CopyAddress,

    /// Show or change the remote server settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the stored settings
    Show,

    /// Change the stored settings
    Set {
        /// Remote SOCKS5 server address
        #[arg(short, long)]
        address: Option<String>,

        /// Remote SOCKS5 server port
        #[arg(short = 'P', long)]
        port: Option<String>,

        /// Login for the remote server
        #[arg(short, long)]
        login: Option<String>,

        /// Password for the remote server (prompted when given without a value)
        #[arg(short, long, num_args = 0..=1)]
        password: Option<Option<String>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resocks5=info,resocks5_gui_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session = Session::connect(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Status => show_status(&session).await,
        Commands::Start => start_proxy(&session).await,
        Commands::Stop => stop_proxy(&session).await,
        Commands::Toggle => toggle_proxy(&session).await,
        Commands::Watch => watch(&session).await,
        Commands::CopyAddress => copy_address(&session).await,
        Commands::Settings { action } => match action {
            SettingsAction::Show => show_settings(&session).await,
            SettingsAction::Set {
                address,
                port,
                login,
                password,
            } => set_settings(&session, address, port, login, password).await,
        },
    };

    session.shutdown();
    result
}

async fn show_status(session: &Session) -> Result<()> {
    let mut snapshot = session.open_main().await?;
    if snapshot.connection.is_connected() {
        snapshot.local_address = session.local_address().await;
    }
    println!("{}", render::main_view(&MainViewModel::from_snapshot(&snapshot)));
    Ok(())
}

async fn start_proxy(session: &Session) -> Result<()> {
    let snapshot = session.open_main().await?;
    if snapshot.connection.is_connected() {
        println!("{}", "Proxy is already running".yellow());
        return Ok(());
    }
    run_start(session).await
}

async fn run_start(session: &Session) -> Result<()> {
    let spinner = render::spinner(MainViewModel::label_for(ConnectionState::Starting));
    let connection = session.start().await?;
    spinner.finish_and_clear();

    match connection {
        ConnectionState::Connected => {
            let address = session.local_address().await.unwrap_or_default();
            println!("{}", format!("✓ Proxy running on {}", address).green().bold());
            Ok(())
        }
        ConnectionState::Starting => bail!("Proxy did not finish starting in time"),
        ConnectionState::Disconnected => bail!("Proxy failed to start (see log output)"),
    }
}

async fn stop_proxy(session: &Session) -> Result<()> {
    let snapshot = session.open_main().await?;
    if !snapshot.connection.is_connected() {
        println!("{}", "Proxy is not running".yellow());
        return Ok(());
    }
    run_stop(session).await
}

async fn run_stop(session: &Session) -> Result<()> {
    let spinner = render::spinner("Stopping...");
    let connection = session.stop().await?;
    spinner.finish_and_clear();

    if connection == ConnectionState::Disconnected {
        println!("{}", "✓ Proxy stopped".green().bold());
        Ok(())
    } else {
        bail!("Proxy did not stop in time")
    }
}

async fn toggle_proxy(session: &Session) -> Result<()> {
    let snapshot = session.open_main().await?;
    match snapshot.connection {
        ConnectionState::Connected => run_stop(session).await,
        _ => run_start(session).await,
    }
}

async fn watch(session: &Session) -> Result<()> {
    let mut rx = session.watch();
    let snapshot = session.open_main().await?;

    let mut last = MainViewModel::from_snapshot(&snapshot);
    println!("{}", render::watch_line(&timestamp(), &last));
    println!("{}", "Watching proxy state. Press Ctrl+C to stop".dimmed());

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let model = MainViewModel::from_snapshot(&rx.borrow_and_update());
                if model.connection != last.connection || model.address_text != last.address_text {
                    println!("{}", render::watch_line(&timestamp(), &model));
                    last = model;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn copy_address(session: &Session) -> Result<()> {
    let snapshot = session.open_main().await?;
    if !snapshot.connection.is_connected() {
        bail!("Proxy is not running");
    }
    let Some(address) = session.local_address().await else {
        bail!("Local proxy address is not available");
    };

    match session.copy_address().await? {
        Some(snapshot) => {
            let model = MainViewModel::from_snapshot(&snapshot);
            println!("{} {}", format!("✓ {}", model.address_text).green().bold(), address);
            // Keep serving the clipboard until the confirmation clears
            session.wait_copy_cleared().await?;
            Ok(())
        }
        None => bail!("Failed to copy the address (see log output)"),
    }
}

async fn show_settings(session: &Session) -> Result<()> {
    let snapshot = session.open_settings().await?;
    let form = SettingsFormViewModel::from_snapshot(&snapshot)
        .context("Settings screen is not open")?;
    println!("{}", render::settings_form(&form));
    Ok(())
}

async fn set_settings(
    session: &Session,
    address: Option<String>,
    port: Option<String>,
    login: Option<String>,
    password: Option<Option<String>>,
) -> Result<()> {
    let snapshot = session.open_settings().await?;
    let mut draft = snapshot
        .settings
        .context("Settings screen is not open")?
        .draft;

    if let Some(address) = address {
        draft.set(SettingsField::ServerAddress, address);
    }
    if let Some(port) = port {
        draft.set(SettingsField::ServerPort, port);
    }
    if let Some(login) = login {
        draft.set(SettingsField::ServerLogin, login);
    }
    match password {
        Some(Some(password)) => draft.set(SettingsField::ServerPassword, password),
        Some(None) => draft.set(SettingsField::ServerPassword, prompt_password()?),
        None if draft.server_password.is_empty() => {
            draft.set(SettingsField::ServerPassword, prompt_password()?)
        }
        None => {}
    }

    let validated = validate_draft(&draft)?;
    session.fill(&draft).await?;

    let spinner = render::spinner("Saving...");
    let saved = session.save(validated).await?;
    spinner.finish_and_clear();

    if !saved {
        bail!("Backend rejected the settings (see log output)");
    }
    println!("{}", "✓ Settings saved".green().bold());
    Ok(())
}

fn prompt_password() -> Result<String> {
    Password::new()
        .with_prompt(SettingsField::ServerPassword.label())
        .interact()
        .context("Failed to read password input")
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
