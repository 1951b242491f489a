//! Daily payload for the e-paper display service.
//!
//! The four daily entries travel as one compressed field: raw markup pairs,
//! JSON-array-encoded, zlib-compressed and base64-encoded. A small history
//! file keeps the push idempotent per calendar date.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;
use tracing::{error, info, warn};

use crate::daily;
use crate::database::entries::GlossEntry;
use crate::error::{Error, Result};

pub const DISPLAY_API_URL: &str = "https://usetrmnl.com/api/custom_plugins/";

/// zlib at best compression, then base64.
pub fn compress_text(text: &str) -> Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;

    Ok(STANDARD.encode(encoder.finish()?))
}

/// Builds the display payload for one daily batch: each entry's
/// representation and wrapper markup concatenated, the batch JSON-encoded
/// and compressed into a single merge variable.
pub fn build_payload(batch: &[GlossEntry]) -> Result<serde_json::Value> {
    let combined: Vec<String> = batch
        .iter()
        .map(|entry| format!("{}{}", entry.representation_markup, entry.wrapper_markup))
        .collect();

    let raw = serde_json::to_string(&combined)?;

    Ok(serde_json::json!({
        "merge_variables": { "compressed": compress_text(&raw)? }
    }))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PushHistory {
    last_date: Option<String>,
}

async fn read_history(path: &Path) -> PushHistory {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(_) => return PushHistory::default(),
    };

    match serde_json::from_str(&raw) {
        Ok(history) => history,
        Err(error) => {
            warn!(%error, path = %path.display(), "ignoring invalid push history");
            PushHistory::default()
        }
    }
}

async fn write_history(path: &Path, date: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await?;
        }
    }

    let history = PushHistory {
        last_date: Some(date.to_string()),
    };
    tokio::fs::write(path, serde_json::to_string_pretty(&history)?).await?;

    Ok(())
}

/// Pushes the daily batch for `date` to the display service, unless the
/// history file says that date already went out. Returns whether a push
/// happened. The history file is only updated after the service accepts
/// the payload.
pub async fn push_daily(
    conn: &Connection,
    api_key: &str,
    history_path: &Path,
    date: &str,
) -> Result<bool> {
    if read_history(history_path).await.last_date.as_deref() == Some(date) {
        info!(date, "daily batch already pushed");
        return Ok(false);
    }

    let batch = daily::select_daily(conn, date).await?;
    let payload = build_payload(&batch)?;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{DISPLAY_API_URL}{api_key}"))
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::PushRejected(status.as_u16(), body));
    }

    write_history(history_path, date).await?;
    info!(date, words = batch.len(), "daily batch pushed");

    Ok(true)
}

/// Hourly background push. Failures are logged and the loop keeps going;
/// the per-date gate makes repeat ticks for one day a no-op.
pub async fn run_updater(
    conn: Connection,
    api_key: String,
    history_path: std::path::PathBuf,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let date = daily::today();
        if let Err(e) = push_daily(&conn, &api_key, &history_path, &date).await {
            error!(error = %e, date, "daily push failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn entry(word_id: i64, gloss_id: i64) -> GlossEntry {
        GlossEntry {
            gloss_id,
            word_id,
            representation_markup: format!("<div>word {word_id}</div>"),
            wrapper_markup: format!("<div>gloss {gloss_id}</div>"),
        }
    }

    fn inflate(encoded: &str) -> String {
        let compressed = STANDARD.decode(encoded).unwrap();
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn payload_decodes_to_combined_markup() {
        let payload = build_payload(&[entry(1, 1), entry(2, 3)]).unwrap();

        let compressed = payload["merge_variables"]["compressed"].as_str().unwrap();
        let decoded: Vec<String> = serde_json::from_str(&inflate(compressed)).unwrap();

        assert_eq!(
            decoded,
            [
                "<div>word 1</div><div>gloss 1</div>",
                "<div>word 2</div><div>gloss 3</div>",
            ]
        );
    }

    #[test]
    fn compresses_multibyte_text() {
        let original = "読む".repeat(100);
        assert_eq!(inflate(&compress_text(&original).unwrap()), original);
    }

    #[tokio::test]
    async fn history_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trmnl.json");

        assert_eq!(read_history(&path).await.last_date, None);

        write_history(&path, "2024-01-01").await.unwrap();
        assert_eq!(
            read_history(&path).await.last_date.as_deref(),
            Some("2024-01-01")
        );
    }

    #[tokio::test]
    async fn invalid_history_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trmnl.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert_eq!(read_history(&path).await.last_date, None);
    }
}
