mod cli;
mod commands;
mod config;
mod output;
mod testserver;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use trackhub_api::Api;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;

    match &cli.command {
        Commands::Automation(args) => {
            let api = make_api(&cli.server, profile)?;
            match &args.command {
                cli::AutomationCommands::List(list_args) => {
                    commands::automations::list(&api, list_args).await?;
                }
                cli::AutomationCommands::Delete(delete_args) => {
                    commands::automations::delete(&api, delete_args).await?;
                }
            }
        }
        Commands::Testserver(args) => match &args.command {
            cli::TestserverCommands::Start(start_args) => {
                commands::testserver::start(start_args).await?;
            }
            cli::TestserverCommands::Connect(connect_args) => {
                commands::testserver::connect(connect_args).await?;
            }
            cli::TestserverCommands::Stop(stop_args) => {
                commands::testserver::stop(stop_args)?;
            }
            cli::TestserverCommands::PrintDebug => {
                commands::testserver::print_debug()?;
            }
        },
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Entity".cyan(),
                    cfg.entity.as_deref().unwrap_or("(not set)")
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                match set_args.key.as_str() {
                    "server" => cfg.server = Some(set_args.value.clone()),
                    "entity" => cfg.entity = Some(set_args.value.clone()),
                    other => {
                        anyhow::bail!("Unknown config key: {other}. Valid keys: server, entity")
                    }
                }
                config::save_profile(profile, cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(())
}

fn make_api(server: &Option<String>, profile: &str) -> Result<Api> {
    let settings = config::resolve_settings(server, profile)?;
    Ok(Api::new(settings)?)
}
