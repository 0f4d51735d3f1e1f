mod cli;
mod commands;
mod config;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use medportal_client::GatewayError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, ConfigCommands, DoctorsCommands, OutputFormat};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Gateway failures have already been reported through the notifier.
        if e.downcast_ref::<GatewayError>().is_none() {
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let profile = cli.profile.as_str();
    let dir = config::config_dir()?;
    let profile_cfg = config::load_profile(&dir, profile)?;
    let format = cli.format.unwrap_or(match profile_cfg.format.as_deref() {
        Some("table") => OutputFormat::Table,
        Some("yaml") => OutputFormat::Yaml,
        _ => OutputFormat::Json,
    });

    if let Commands::Config(args) = &cli.command {
        match &args.command {
            ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    profile_cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("json")
                );
                println!(
                    "{}: {}",
                    "Auth".cyan(),
                    profile_cfg.auth_mode.unwrap_or_default()
                );
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg;
                config::set_key(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(&dir, profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        }
        return Ok(());
    }

    let client_cfg = config::resolve_client(
        cli.server.as_deref(),
        cli.auth_mode.map(Into::into),
        &profile_cfg,
    )?;
    tracing::debug!(server = %client_cfg.base_url, mode = %client_cfg.auth_mode, profile, "resolved client");
    let store = session::open(client_cfg, &dir, profile)?;

    match &cli.command {
        Commands::Login(args) => commands::auth::login(&store, args).await?,
        Commands::Register(args) => commands::auth::register(&store, args).await?,
        Commands::Logout => commands::auth::logout(&store).await?,
        Commands::Whoami => commands::auth::whoami(&store, profile, format).await?,
        Commands::Dashboard(args) => commands::dashboard::show(&store, args.role, format).await?,
        Commands::Doctors(args) => match &args.command {
            DoctorsCommands::List(list_args) => {
                commands::doctors::list(&store, list_args, format).await?
            }
            DoctorsCommands::Verify(verify_args) => {
                commands::doctors::verify(&store, verify_args, format).await?
            }
        },
        Commands::Config(_) => {}
    }

    Ok(())
}
