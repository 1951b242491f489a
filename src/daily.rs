//! Deterministic daily selection.
//!
//! The calendar date alone decides which four words appear: the date string
//! hashes to a 31-bit seed, and the store orders candidates by a pure
//! function of `(id, seed)`. No process state is involved, so repeated and
//! concurrent calls for one date always agree.

use sha2::{Digest, Sha256};
use tokio_rusqlite::Connection;

use crate::database::entries::{self, GlossEntry};
use crate::Result;

/// Number of entries in one daily batch.
pub const DAILY_COUNT: u32 = 4;

/// Derives the selection seed for a date string: the SHA-256 digest read as
/// an unsigned big-endian integer, reduced mod 2^31.
pub fn date_seed(date: &str) -> u32 {
    let digest = Sha256::digest(date.as_bytes());

    // mod 2^31 of the big-endian digest is its trailing 31 bits.
    let tail = u32::from_be_bytes([digest[28], digest[29], digest[30], digest[31]]);
    tail & 0x7FFF_FFFF
}

/// Sort key of one candidate id under a seed: the first 15 decimal digits
/// of `id * seed`, or the whole number when it is shorter. Keys compare as
/// strings; callers break ties by id.
pub fn sort_key(id: i64, seed: u32) -> String {
    let product = id as u128 * seed as u128;
    let digits = product.to_string();
    let prefix = digits.len().min(15);
    digits[..prefix].to_string()
}

/// Today's date in the `%Y-%m-%d` form the seed derivation expects.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// The daily batch for a date: up to [`DAILY_COUNT`] entries with distinct
/// words, ordered by word id. A store holding fewer distinct words returns
/// them all.
pub async fn select_daily(conn: &Connection, date: &str) -> Result<Vec<GlossEntry>> {
    entries::sample_deterministic(conn, date_seed(date), DAILY_COUNT).await
}

/// Single-entry access into the same batch `select_daily` returns for the
/// date: `offset` wraps around the batch, so offsets 0..4 enumerate exactly
/// the daily four in order.
pub async fn select_offset(
    conn: &Connection,
    date: &str,
    offset: u32,
) -> Result<Option<GlossEntry>> {
    let batch = select_daily(conn, date).await?;

    if batch.is_empty() {
        return Ok(None);
    }

    let index = offset as usize % batch.len();
    Ok(Some(batch[index].clone()))
}
