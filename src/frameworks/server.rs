// Framework bootstrap for the jukebox server runtime.

use crate::frameworks::clock::MonotonicClock;
use crate::frameworks::config;
use crate::interface_adapters::net::{
    area_command_handler, create_area_handler, delete_area_handler, get_area_handler,
    list_areas_handler, spawn_area_serializer, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{AreaRegistry, AreaSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state().await?;
    // Start the Web Server
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/areas", post(create_area_handler).get(list_areas_handler))
        .route(
            "/areas/{area_id}",
            get(get_area_handler).delete(delete_area_handler),
        )
        .route("/areas/{area_id}/commands", post(area_command_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let settings = AreaSettings {
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        snapshot_broadcast_capacity: config::SNAPSHOT_BROADCAST_CAPACITY,
        heartbeat_interval: config::heartbeat_interval(),
        default_song_duration: config::default_song_duration(),
        skip_policy: config::skip_policy(),
    };
    tracing::debug!(
        heartbeat_interval_ms = settings.heartbeat_interval.as_millis(),
        default_song_duration_ms = settings.default_song_duration.as_millis(),
        skip_policy = ?settings.skip_policy,
        "area settings configured"
    );

    // Setup Area Registry
    // This owns the set of active area coordinator tasks.
    let area_registry = Arc::new(AreaRegistry::new(
        settings,
        Arc::new(MonotonicClock::new()),
    ));

    // Keep the default area pinned so it never gets deleted.
    let default_area_id = config::default_area_id();
    let default_area = area_registry
        .create_area(default_area_id.clone(), true)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default area: {e}")))?;
    spawn_area_serializer(&default_area);

    Ok(Arc::new(AppState {
        area_registry,
        default_area_id: Arc::from(default_area_id.as_str()),
    }))
}
