//! Database connection pool management.

use super::DbError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection pool for the Watchdesk store.
pub type DbPool = sqlx::SqlitePool;

/// Escapes special characters in a search pattern for use in SQL LIKE clauses.
///
/// SQL LIKE patterns use `%` for any sequence of characters and `_` for any
/// single character. User input containing these characters should be escaped
/// so it matches literally.
///
/// # Example
///
/// ```
/// use wd_core::db::escape_like_pattern;
///
/// let escaped = escape_like_pattern("user_test%");
/// assert_eq!(escaped, r"user\_test\%");
/// ```
pub fn escape_like_pattern(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Creates a LIKE pattern that matches anywhere in the string.
///
/// Escapes the search term and wraps it with `%` wildcards. Use with
/// `LIKE ? ESCAPE '\'` in queries.
pub fn make_like_pattern(search: &str) -> String {
    format!("%{}%", escape_like_pattern(search))
}

/// Options for creating a database connection pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool.
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Creates a connection pool with default options.
///
/// The database file is created if it does not exist. In-memory URLs
/// (`sqlite::memory:` or `mode=memory`) are supported for tests.
pub async fn create_pool(url: &str) -> Result<DbPool, DbError> {
    create_pool_with_options(url, &PoolOptions::default()).await
}

/// Creates a connection pool with explicit options.
pub async fn create_pool_with_options(
    url: &str,
    options: &PoolOptions,
) -> Result<DbPool, DbError> {
    let connect = SqliteConnectOptions::from_str(url)
        .map_err(|e| DbError::Configuration(e.to_string()))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .acquire_timeout(options.acquire_timeout)
        .connect_with(connect)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("plain"), "plain");
        assert_eq!(escape_like_pattern("50%_off"), r"50\%\_off");
        assert_eq!(escape_like_pattern(r"back\slash"), r"back\\slash");
    }

    #[test]
    fn test_make_like_pattern_wraps_wildcards() {
        assert_eq!(make_like_pattern("failed"), "%failed%");
        assert_eq!(make_like_pattern("100%"), r"%100\%%");
    }
}
