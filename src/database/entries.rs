use rusqlite::params;
use tokio_rusqlite::Connection;

use crate::error::{Error, Result};
use crate::scrape::WordEntry;

/// One stored gloss joined with its word, as returned by the sampling and
/// listing queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossEntry {
    pub gloss_id: i64,
    pub word_id: i64,
    pub representation_markup: String,
    pub wrapper_markup: String,
}

pub async fn create_tables(conn: &Connection) -> Result<()> {
    conn.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                representation_markup TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS glosses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word_id INTEGER NOT NULL,
                wrapper_markup TEXT NOT NULL,
                FOREIGN KEY(word_id) REFERENCES words(id) ON DELETE CASCADE
            )",
            (),
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_gloss_word_id ON glosses(word_id)",
            (),
        )?;

        Ok(())
    })
    .await?;

    Ok(())
}

pub async fn insert_word(conn: &Connection, representation_markup: String) -> Result<i64> {
    let id = conn
        .call(move |conn| {
            conn.execute(
                "INSERT INTO words (representation_markup) VALUES (?1)",
                [representation_markup],
            )?;

            Ok(conn.last_insert_rowid())
        })
        .await?;

    Ok(id)
}

pub async fn insert_gloss(conn: &Connection, word_id: i64, wrapper_markup: String) -> Result<i64> {
    let id = conn
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO glosses (word_id, wrapper_markup) VALUES (?1, ?2)",
                params![word_id, wrapper_markup],
            );

            match inserted {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(rusqlite::Error::SqliteFailure(error, _))
                    if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
                {
                    Err(Error::ForeignKeyViolation(word_id).into())
                }
                Err(error) => Err(error.into()),
            }
        })
        .await?;

    Ok(id)
}

/// Stores a whole scrape batch in one transaction: every word and gloss is
/// committed, or on any failure none are.
pub async fn bulk_insert(conn: &Connection, batch: Vec<WordEntry>) -> Result<(usize, usize)> {
    let counts = conn
        .call(move |conn| {
            let ta = conn.transaction()?;

            let mut word_stmt =
                ta.prepare("INSERT INTO words (representation_markup) VALUES (?1)")?;
            let mut gloss_stmt =
                ta.prepare("INSERT INTO glosses (word_id, wrapper_markup) VALUES (?1, ?2)")?;

            let mut words = 0usize;
            let mut glosses = 0usize;

            for entry in batch {
                word_stmt.execute(params![entry.representation])?;
                let word_id = ta.last_insert_rowid();
                words += 1;

                for wrapper in entry.wrappers {
                    gloss_stmt.execute(params![word_id, wrapper])?;
                    glosses += 1;
                }
            }

            drop(word_stmt);
            drop(gloss_stmt);

            ta.commit()?;

            Ok((words, glosses))
        })
        .await?;

    Ok(counts)
}

/// Seeded deterministic sample: `count` distinct words ordered by the
/// 15-digit decimal prefix of `word_id * seed` (ids break ties), one gloss
/// per word picked by the same key over gloss ids, result ordered by word
/// id.
///
/// For a fixed seed and store content the result is identical on every
/// call; insertion order and table growth beyond the selected words do not
/// affect it.
pub async fn sample_deterministic(
    conn: &Connection,
    seed: u32,
    count: u32,
) -> Result<Vec<GlossEntry>> {
    let entries = conn
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "WITH daily_words AS (
                    SELECT word_id FROM (SELECT DISTINCT word_id FROM glosses)
                    ORDER BY SUBSTR(CAST(word_id * ?1 AS TEXT), 1, 15), word_id
                    LIMIT ?2
                ),
                ranked AS (
                    SELECT
                        g.id AS gloss_id,
                        g.word_id AS word_id,
                        w.representation_markup AS representation_markup,
                        g.wrapper_markup AS wrapper_markup,
                        ROW_NUMBER() OVER (
                            PARTITION BY g.word_id
                            ORDER BY SUBSTR(CAST(g.id * ?1 AS TEXT), 1, 15), g.id
                        ) AS rn
                    FROM glosses g
                    JOIN words w ON g.word_id = w.id
                    JOIN daily_words dw ON g.word_id = dw.word_id
                )
                SELECT gloss_id, word_id, representation_markup, wrapper_markup
                FROM ranked
                WHERE rn = 1
                ORDER BY word_id",
            )?;

            let rows = stmt.query_map(params![seed, count], |row| {
                Ok(GlossEntry {
                    gloss_id: row.get(0)?,
                    word_id: row.get(1)?,
                    representation_markup: row.get(2)?,
                    wrapper_markup: row.get(3)?,
                })
            })?;

            let mut entries = Vec::new();

            for entry in rows {
                entries.push(entry?);
            }

            Ok(entries)
        })
        .await?;

    Ok(entries)
}

/// Every stored gloss joined with its word, ordered by word id then gloss
/// id.
pub async fn list_all(conn: &Connection) -> Result<Vec<GlossEntry>> {
    let entries = conn
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.word_id, w.representation_markup, g.wrapper_markup
                FROM glosses g
                JOIN words w ON g.word_id = w.id
                ORDER BY g.word_id, g.id",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok(GlossEntry {
                    gloss_id: row.get(0)?,
                    word_id: row.get(1)?,
                    representation_markup: row.get(2)?,
                    wrapper_markup: row.get(3)?,
                })
            })?;

            let mut entries = Vec::new();

            for entry in rows {
                entries.push(entry?);
            }

            Ok(entries)
        })
        .await?;

    Ok(entries)
}
