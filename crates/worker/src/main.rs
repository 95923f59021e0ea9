use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tvscreener_core::ingest::provider::TradingviewScanner;
use tvscreener_core::service::ScreenerService;

#[derive(Debug, Parser)]
#[command(name = "tvscreener_worker")]
struct Args {
    /// Snapshot date (YYYY-MM-DD). Defaults to today's local date.
    #[arg(long, global = true)]
    as_of_date: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Make sure the day's snapshot exists, fetching it if needed.
    Warm,
    /// Print the recommendation listing.
    Recommendations,
    /// Print column-major values for the given tickers.
    Check {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tvscreener_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let as_of_date = tvscreener_core::time::cache_date::resolve_cache_date(
        args.as_of_date.as_deref(),
        chrono::Local::now(),
    )?;

    let scanner = TradingviewScanner::from_settings(&settings)?;
    let service = ScreenerService::new(
        Arc::new(scanner),
        settings.screener_columns.clone(),
        settings.cache_dir.clone(),
    );

    let result = run(&service, args.command, as_of_date).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(%as_of_date, error = %format!("{err:#}"), "worker command failed");
    }
    result
}

async fn run(
    service: &ScreenerService,
    command: Command,
    as_of_date: chrono::NaiveDate,
) -> anyhow::Result<()> {
    match command {
        Command::Warm => {
            let dataset = service
                .dataset(as_of_date)
                .await
                .context("failed to warm screener cache")?;
            tracing::info!(
                %as_of_date,
                rows = dataset.len(),
                path = %service.cache_path(as_of_date).display(),
                "screener snapshot ready"
            );
        }
        Command::Recommendations => {
            let text = service.get_stock_recommendations(as_of_date).await?;
            println!("{text}");
        }
        Command::Check { tickers } => {
            let values = service.check_stock_values(as_of_date, &tickers).await?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
    }
    Ok(())
}

fn init_sentry(settings: &tvscreener_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_check_with_global_date() {
        let args = Args::try_parse_from([
            "tvscreener_worker",
            "check",
            "AAPL",
            "MSFT",
            "--as-of-date",
            "2026-10-16",
        ])
        .unwrap();
        assert_eq!(args.as_of_date.as_deref(), Some("2026-10-16"));
        match args.command {
            Command::Check { tickers } => assert_eq!(tickers, ["AAPL", "MSFT"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_requires_tickers() {
        assert!(Args::try_parse_from(["tvscreener_worker", "check"]).is_err());
    }
}
