use std::path::Path;

use tokio::fs;
use tokio_rusqlite::Connection;

use crate::Result;

pub mod entries;

async fn init(conn: &Connection) -> tokio_rusqlite::Result<()> {
    conn.call(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
                PRAGMA journal_size_limit = 6144000;
                PRAGMA foreign_keys = ON;",
        )?;

        Ok(())
    })
    .await
}

/// Opens (creating if necessary) the word store at `path`.
pub async fn open(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).await?;
        }
    }

    let conn = Connection::open(path).await?;

    init(&conn).await?;

    entries::create_tables(&conn).await?;

    Ok(conn)
}

#[cfg(test)]
pub(crate) async fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().await?;

    conn.call(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    })
    .await?;

    entries::create_tables(&conn).await?;

    Ok(conn)
}
