//! Database abstraction layer.
//!
//! [`MessageStore`] defines the interface for persisting chat turns. The
//! only implementation is [`AnyStore`], built on the sqlx `Any` driver so
//! the backend is chosen by the connection string at runtime:
//! `sqlite://chatbot.db?mode=rwc` for a local file, `postgres://…` for a
//! network database.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required here.

pub mod dao;
pub mod message;

pub use dao::{ChatMessage, NewMessage};
pub use message::MessageStore;

use sqlx::any::AnyPoolOptions;
use thiserror::Error;

/// SQL dialects the store knows how to bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Pick the dialect from the URL scheme.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(StoreError::UnsupportedScheme(scheme.to_owned())),
        }
    }

    fn create_table(self) -> &'static str {
        match self {
            Self::Sqlite => {
                "CREATE TABLE IF NOT EXISTS messages (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 role VARCHAR(10) NOT NULL, \
                 content TEXT NOT NULL, \
                 \"timestamp\" TEXT NOT NULL)"
            }
            Self::Postgres => {
                "CREATE TABLE IF NOT EXISTS messages (\
                 id BIGSERIAL PRIMARY KEY, \
                 role VARCHAR(10) NOT NULL, \
                 content TEXT NOT NULL, \
                 \"timestamp\" TEXT NOT NULL)"
            }
        }
    }
}

const CREATE_ROLE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_messages_role ON messages (role)";

/// Errors raised while opening the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported database scheme '{0}' (expected sqlite or postgres)")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Debug)]
pub struct AnyStore {
    pool: sqlx::Pool<sqlx::Any>,
    dialect: Dialect,
}

impl AnyStore {
    /// Open (or create) the database at `url` and make sure the `messages`
    /// table exists.
    ///
    /// `url` is a sqlx connection string, e.g. `"sqlite://chatbot.db?mode=rwc"`,
    /// `"sqlite::memory:"` for tests or `"postgres://user@host/chat"`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let dialect = Dialect::from_url(url)?;
        sqlx::any::install_default_drivers();

        // Every connection to an in-memory SQLite database sees its own empty
        // database, so the pool must hold exactly one that never recycles.
        let options = if url.contains(":memory:") {
            AnyPoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            AnyPoolOptions::new()
        };
        let pool = options.connect(url).await?;

        sqlx::query(dialect.create_table()).execute(&pool).await?;
        sqlx::query(CREATE_ROLE_INDEX).execute(&pool).await?;

        Ok(Self { pool, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dialect_follows_scheme() {
        assert_eq!(Dialect::from_url("sqlite://chatbot.db").ok(), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("sqlite::memory:").ok(), Some(Dialect::Sqlite));
        assert_eq!(
            Dialect::from_url("postgresql://u@localhost/chat").ok(),
            Some(Dialect::Postgres)
        );
        assert!(matches!(
            Dialect::from_url("mysql://localhost/chat"),
            Err(StoreError::UnsupportedScheme(s)) if s == "mysql"
        ));
    }

    #[tokio::test]
    async fn connect_is_idempotent_on_schema() {
        let store = AnyStore::connect("sqlite::memory:").await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);
        // Bootstrapping a second time must not fail on the existing table.
        sqlx::query(Dialect::Sqlite.create_table())
            .execute(&store.pool)
            .await
            .unwrap();
    }
}
