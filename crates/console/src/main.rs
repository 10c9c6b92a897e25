use anyhow::Context;
use chrono::{Datelike, Duration, Local, NaiveDate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewboard_console::config::ConsoleConfig;
use crewboard_console::context::AppContext;
use crewboard_console::preferences::Preferences;
use crewboard_console::team_board::TeamBoard;
use crewboard_console::toast::ToastTray;
use crewboard_core::filter::TeamFilter;

/// Usage: `crewboard-console [START END [REGION,REGION...]]`
///
/// Loads one page of teams for the window (default: the current week) and
/// prints the swimlane view model as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewboard_console=debug,crewboard_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ConsoleConfig::from_env().context("Invalid console configuration")?;
    tracing::info!(backend_url = %config.backend_url, page_size = config.page_size, "Loaded console configuration");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (start, end) = match (args.first(), args.get(1)) {
        (Some(start), Some(end)) => (parse_date(start)?, parse_date(end)?),
        _ => current_week(),
    };
    let regions: Vec<String> = args
        .get(2)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    // --- Preferences ---
    let prefs = Preferences::open(&config.preferences_path)
        .with_context(|| format!("Cannot read {}", config.preferences_path.display()))?;
    let setting = prefs.swimlane_settings();

    // --- Context ---
    let ctx = AppContext::connect(config).await;
    let mut toast_rx = ctx.toasts.subscribe();
    let mut tray = ToastTray::new(ctx.config.toast_dismiss);

    // --- Board ---
    let filter = TeamFilter::window(start, end).with_regions(regions);
    let mut board = TeamBoard::new(ctx.clone(), setting, filter);
    board.refresh().await;

    let view = board.view(ctx.config.viewport_width);
    println!("{}", serde_json::to_string_pretty(&view)?);

    tray.drain(&mut toast_rx);
    for toast in tray.visible() {
        tracing::warn!(level = ?toast.level, message = %toast.message, "Notification");
    }

    Ok(())
}

fn parse_date(text: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Expected a YYYY-MM-DD date, got {text:?}"))
}

/// Monday to Sunday of the current week.
fn current_week() -> (NaiveDate, NaiveDate) {
    let today = Local::now().date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}
