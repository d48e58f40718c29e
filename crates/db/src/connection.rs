use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

/// Default pool sizing used by one-shot commands.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

/// An in-memory SQLite database is private to the connection that opened
/// it; pooling more than one would hand concurrent readers empty databases.
fn is_memory_database(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let max_connections =
        if is_memory_database(database_url) { 1 } else { max_connections.max(1) };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
