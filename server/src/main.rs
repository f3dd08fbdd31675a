//! Questwatch trigger endpoint and process bootstrap.
//!
//! This is the thin shell around the core crates: it loads configuration,
//! opens the store, seeds the tracker state, and exposes the `POST
//! /scheduled` endpoint an external scheduler hits once per cycle. The
//! endpoint answers immediately; the cycle itself runs in a spawned task.

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use questwatch_core::{AppConfig, WatchList};
use questwatch_db::Database;
use questwatch_engine::{alert, reconcile, Alert, TrackerState};
use questwatch_fetch::PageClient;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared state behind the trigger endpoint.
struct AppState {
    config: AppConfig,
    watch: WatchList,
    db: Database,
    fetcher: PageClient,
    /// The tracker indexes. Cycles are serialized through this mutex; a
    /// trigger that finds it held skips instead of queueing.
    tracker: Mutex<TrackerState>,
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,questwatch_engine=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting questwatch v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load_with_env().context("load configuration")?;
    if config.watchlist.is_empty() {
        config.watchlist = AppConfig::with_default_watchlist().watchlist;
    }
    let watch = WatchList::new(&config.watchlist);
    info!("Watching {} quests", watch.len());

    let db = Database::new(&config.tracker.database_path)
        .await
        .context("open store")?;
    db.run_migrations().await.context("run migrations")?;

    let tracker = TrackerState::load(&db, chrono::Utc::now())
        .await
        .context("seed tracker state")?;
    let fetcher = PageClient::new(&config.fetch).context("build page client")?;

    let state = Arc::new(AppState {
        config,
        watch,
        db,
        fetcher,
        tracker: Mutex::new(tracker),
    });

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/scheduled", post(scheduled_handler))
        .with_state(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.server.listen_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("app listening on port {}", state.config.server.listen_port);

    axum::serve(listener, router.into_make_service())
        .await
        .context("serve trigger endpoint")?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// The scheduler's trigger. Responds before the cycle runs; the caller's
/// status is not coupled to the cycle's outcome.
async fn scheduled_handler(State(app): State<Arc<AppState>>) -> StatusCode {
    info!("scheduled task");
    tokio::spawn(run_cycle(app));
    StatusCode::OK
}

async fn run_cycle(app: Arc<AppState>) {
    let Ok(mut tracker) = app.tracker.try_lock() else {
        warn!("Previous cycle still running, skipping this trigger");
        return;
    };

    let now = chrono::Utc::now();
    let page = match app.fetcher.fetch_page(&app.config.tracker.page_url).await {
        Ok(page) => page,
        Err(e) => {
            error!("Fetch failed: {}", e);
            deliver(&app, &alert::compose_failure(&e));
            return;
        }
    };

    match reconcile(&mut tracker, &app.db, &page, now).await {
        Ok(outcome) => {
            info!(
                new = outcome.new_quest_ids.len(),
                expired = outcome.instances_expired,
                soft_errors = outcome.soft_errors.len(),
                "completed scheduled task"
            );
            if let Some(message) = alert::compose(
                &outcome.new_quest_ids,
                &app.watch,
                &tracker.quests,
                &tracker.active,
            ) {
                info!("Alerting Quests: {}", message.subject);
                deliver(&app, &message);
            }
        }
        Err(e) => {
            error!("Cycle failed: {}", e);
            deliver(&app, &alert::compose_failure(&e));
        }
    }
}

/// Single best-effort delivery; a notifier failure is logged, never retried.
fn deliver(app: &AppState, message: &Alert) {
    if !app.config.mail.enabled {
        info!("Mail disabled, not sending: {}", message.subject);
        return;
    }
    if let Err(e) = questwatch_mail::send_smtp(&app.config.mail, &message.subject, &message.body) {
        error!("Failed to send alert mail: {}", e);
    }
}
