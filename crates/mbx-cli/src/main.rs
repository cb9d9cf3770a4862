// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Overrides};
use mbx_app::AppState;
use runtime::ApiRuntime;
use std::path::PathBuf;

/// Browse Metabase collections and database metadata from the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "mbx", version, about)]
struct Cli {
    /// Use a specific config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Metabase base URL, e.g. https://metabase.example.com
    #[arg(long, env = "MBX_URL")]
    url: Option<String>,

    /// Metabase API key
    #[arg(long, env = "MBX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Profile from the config file to connect with
    #[arg(long, short = 'p')]
    profile: Option<String>,

    /// Print the resolved config path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Print a config template and exit
    #[arg(long)]
    print_example_config: bool,

    /// List the profiles in the config file and exit
    #[arg(long)]
    list_profiles: bool,

    /// Resolve the config, test the connection, and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            token: self.token.clone(),
            profile: self.profile.clone(),
        }
    }
}

fn main() {
    if let Err(error) = run(Cli::parse()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if cli.print_example_config {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `mbx --print-example-config` for a template",
            config_path.display()
        )
    })?;

    if cli.list_profiles {
        for name in config.profile_names() {
            let marker = if config.default_profile.as_deref() == Some(name) {
                " (default)"
            } else {
                ""
            };
            println!("{name}{marker}");
        }
        return Ok(());
    }

    let connection = config.resolve(&cli.overrides())?;
    let client = mbx_api::Client::new(&connection.url, &connection.token, config.http_timeout()?)
        .with_context(|| {
            format!(
                "invalid connection settings for {}; fix the URL or token",
                connection.url
            )
        })?;

    if cli.check {
        let user = client.test_connection()?;
        println!("connected to {} as {}", client.base_url(), user.display_name());
        return Ok(());
    }

    let _log_guard = logging::init(&config)?;
    tracing::info!(
        url = client.base_url(),
        profile = connection.profile.as_deref().unwrap_or("-"),
        "starting mbx"
    );

    let mut state = AppState::new(client.base_url(), config.viewport_height());
    let mut runtime = ApiRuntime::new(client, config.check_updates());
    mbx_tui::run_app(&mut state, &mut runtime)
}
