use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use skyboard_core::{App, AppError, Config, Secrets, ValidationResult};
use skyboard_weather::TemperatureUnit;
use tokio_util::sync::CancellationToken;

/// Weather dashboard for the terminal.
#[derive(Debug, Parser)]
#[command(name = "skyboard", version, about)]
struct Cli {
    /// Temperature unit (celsius or fahrenheit); defaults to the config value
    #[arg(long, global = true)]
    unit: Option<TemperatureUnit>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the dashboard for a city ("London" or "London,GB")
    Show {
        city: String,

        /// Number of past days in the history section
        #[arg(long)]
        days: Option<u32>,
    },
    /// Resolve coordinates to a place and show its dashboard
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Suggest places matching a partial name
    Suggest { query: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Apply command-line overrides, then validate the config that will run.
fn prepare_config(
    mut config: Config,
    command: &Command,
) -> Result<(Config, ValidationResult), AppError> {
    if let Command::Show {
        days: Some(days), ..
    } = command
    {
        config.weather.history_days = *days;
    }

    let validation = config.ensure_valid()?;
    Ok((config, validation))
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), AppError> {
    let (config, _) = prepare_config(Config::load()?, &cli.command)?;

    let mut app = App::new(config, Secrets::from_env())?;
    tracing::debug!("Using config directory {}", app.config().config_dir.display());
    if let Some(unit) = cli.unit {
        app.set_unit(unit);
    }

    match cli.command {
        Command::Show { city, .. } => print_json(&app.show(&city, &cancel).await?)?,
        Command::Locate { lat, lon } => print_json(&app.locate(lat, lon, &cancel).await?)?,
        Command::Suggest { query } => print_json(&app.suggest(&query).await?)?,
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    skyboard_core::init()?;

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling outstanding requests");
                cancel.cancel();
            }
        })
    };

    let result = run(cli, cancel).await;
    ctrl_c.abort();

    if let Err(e) = result {
        tracing::error!("{}", e);
        anyhow::bail!("{}", e.user_message());
    }

    Ok(())
}
