//! Thin HTTP layer over the store: the daily payload, single-entry offset
//! lookups and the static dashboard files. No caching, no auth.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio_rusqlite::Connection;
use tracing::{error, info, warn};

use crate::database::entries::GlossEntry;
use crate::{daily, publish, Result};

#[derive(Clone)]
struct AppState {
    conn: Connection,
    www_dir: PathBuf,
}

pub struct ServerConfig {
    pub addr: String,
    pub www_dir: PathBuf,
    pub api_key: Option<String>,
    pub history_path: PathBuf,
    pub push_interval: Duration,
}

/// Serves the dashboard and, when an API key is configured, keeps the
/// hourly background push running alongside it.
pub async fn run(conn: Connection, config: ServerConfig) -> Result<()> {
    match config.api_key {
        Some(api_key) => {
            tokio::spawn(publish::run_updater(
                conn.clone(),
                api_key,
                config.history_path.clone(),
                config.push_interval,
            ));
        }
        None => warn!("display api key not set, daily push disabled"),
    }

    let state = AppState {
        conn,
        www_dir: config.www_dir,
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/favicon.ico", get(favicon))
        .route("/api/words", get(daily_words))
        .route("/api/words/{offset}", get(daily_word))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(addr = %config.addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn index(State(state): State<AppState>) -> Response {
    serve_file(&state.www_dir.join("index.html"), "text/html; charset=utf-8").await
}

async fn favicon(State(state): State<AppState>) -> Response {
    serve_file(&state.www_dir.join("favicon.png"), "image/png").await
}

async fn serve_file(path: &Path, content_type: &'static str) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Today's compressed display payload.
async fn daily_words(State(state): State<AppState>) -> Response {
    let result = async {
        let batch = daily::select_daily(&state.conn, &daily::today()).await?;
        publish::build_payload(&batch)
    }
    .await;

    match result {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            error!(error = %e, "building daily payload failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// One entry of today's batch by offset.
async fn daily_word(
    UrlPath(offset): UrlPath<u32>,
    State(state): State<AppState>,
) -> Response {
    match daily::select_offset(&state.conn, &daily::today(), offset).await {
        Ok(Some(entry)) => Json(entry_json(&entry)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, "offset lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn entry_json(entry: &GlossEntry) -> serde_json::Value {
    serde_json::json!({
        "word_id": entry.word_id,
        "representation": entry.representation_markup,
        "meaning_wrapper": entry.wrapper_markup,
    })
}
