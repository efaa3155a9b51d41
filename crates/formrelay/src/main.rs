//! `formrelay` - CLI for the form relay
//!
//! This binary runs the HTTP front door and the decoder, together or as
//! separate processes, and inspects configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use formrelay::cli::{Cli, Command, ConfigCommand};
use formrelay::{daemon, init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Execute the command; config subcommands load the file themselves
    match cli.command {
        Command::Serve(serve_cmd) => {
            let mut config = Config::load_from(cli.config)?;
            if let Some(transport) = serve_cmd.transport {
                config.relay.transport = transport.into();
                config.validate()?;
            }
            daemon::run_all(&config).await.context("relay stopped")?;
        }
        Command::FrontDoor => {
            let config = Config::load_from(cli.config)?;
            daemon::run_front_door(&config)
                .await
                .context("front door stopped")?;
        }
        Command::Decoder => {
            let config = Config::load_from(cli.config)?;
            daemon::run_decoder(&config)
                .await
                .context("decoder stopped")?;
        }
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd)?,
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[HTTP]");
                println!("  Listen:          {}:{}", config.http.host, config.http.port);
                println!();
                println!("[Relay]");
                println!("  Transport:       {}", config.relay.transport);
                println!("  Decoder address: {}:{}", config.relay.host, config.relay.port);
                println!("  Buffer size:     {}", config.relay.buffer_size);
                println!("  Queue capacity:  {}", config.relay.queue_capacity);
                println!();
                println!("[Store]");
                println!("  Document:        {}", config.data_path().display());
                println!();
                println!("[Assets]");
                println!("  Templates:       {}", config.assets.templates_dir.display());
                println!("  Static files:    {}", config.assets.static_dir.display());
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
