//! Relational store gateway (spec.md §4, C1): connection pooling,
//! environment-driven configuration, and the transaction helper every
//! multi-statement store operation builds on.
//!
//! Stores in `studio-store` take a [`sqlx::PgPool`] and open their own
//! transactions for multi-row operations (node move, function-node creation,
//! project deletion); this crate only owns the pool's lifecycle and the
//! config that shapes it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use studio_error::StudioError;

/// Database connection settings, loaded from `STUDIO_DB_*` environment
/// variables (spec.md §6 "Environment/config").
///
/// | Variable | Default |
/// |---|---|
/// | `STUDIO_DB_HOST` | `localhost` |
/// | `STUDIO_DB_PORT` | `5432` |
/// | `STUDIO_DB_NAME` | `studio` |
/// | `STUDIO_DB_USER` | `studio` |
/// | `STUDIO_DB_PASSWORD` | *(empty)* |
/// | `STUDIO_DB_POOL_MIN` | `1` |
/// | `STUDIO_DB_POOL_MAX` | `10` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Connecting user.
    pub user: String,
    /// Connecting user's password.
    pub password: String,
    /// Minimum number of idle connections the pool keeps open.
    pub pool_min: u32,
    /// Maximum number of connections the pool may open.
    pub pool_max: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "studio".to_string(),
            user: "studio".to_string(),
            password: String::new(),
            pool_min: 1,
            pool_max: 10,
        }
    }
}

impl DbConfig {
    /// Load configuration from `STUDIO_DB_*` environment variables, falling
    /// back to [`DbConfig::default`] for anything unset.
    ///
    /// Fails with [`StudioError::validation`] if a numeric variable is set
    /// but unparseable, or if `pool_min > pool_max`.
    pub fn from_env() -> Result<Self, StudioError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary `key -> value` lookup, falling
    /// back to [`DbConfig::default`] for anything the lookup returns `None`
    /// for.
    ///
    /// [`DbConfig::from_env`] is this with `std::env::var` as the lookup;
    /// tests use an in-memory lookup instead so they never touch real
    /// process environment state (and so they stay free of the `unsafe`
    /// that mutating it requires under edition 2024).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StudioError> {
        let mut config = Self::default();

        if let Some(v) = lookup("STUDIO_DB_HOST") {
            config.host = v;
        }
        if let Some(v) = lookup("STUDIO_DB_PORT") {
            config.port = parse_env_u16("STUDIO_DB_PORT", &v)?;
        }
        if let Some(v) = lookup("STUDIO_DB_NAME") {
            config.database = v;
        }
        if let Some(v) = lookup("STUDIO_DB_USER") {
            config.user = v;
        }
        if let Some(v) = lookup("STUDIO_DB_PASSWORD") {
            config.password = v;
        }
        if let Some(v) = lookup("STUDIO_DB_POOL_MIN") {
            config.pool_min = parse_env_u32("STUDIO_DB_POOL_MIN", &v)?;
        }
        if let Some(v) = lookup("STUDIO_DB_POOL_MAX") {
            config.pool_max = parse_env_u32("STUDIO_DB_POOL_MAX", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StudioError> {
        if self.pool_min > self.pool_max {
            return Err(StudioError::validation(format!(
                "STUDIO_DB_POOL_MIN ({}) must not exceed STUDIO_DB_POOL_MAX ({})",
                self.pool_min, self.pool_max
            )));
        }
        Ok(())
    }

    /// Build the `sqlx` connect options for this configuration.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }

    /// Open a connection pool for this configuration.
    ///
    /// Does not run migrations; callers that want a ready-to-use schema
    /// should follow up with [`run_migrations`].
    pub async fn connect(&self) -> Result<PgPool, StudioError> {
        tracing::info!(host = %self.host, port = self.port, database = %self.database, "connecting to database");
        PgPoolOptions::new()
            .min_connections(self.pool_min)
            .max_connections(self.pool_max)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(self.connect_options())
            .await
            .map_err(|e| StudioError::internal("failed to connect to database").with_cause(e))
    }
}

fn parse_env_u16(name: &str, raw: &str) -> Result<u16, StudioError> {
    raw.parse()
        .map_err(|_| StudioError::validation(format!("{name} must be a valid port number, got {raw:?}")))
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32, StudioError> {
    raw.parse()
        .map_err(|_| StudioError::validation(format!("{name} must be a non-negative integer, got {raw:?}")))
}

/// Apply the workspace's `migrations/` directory to `pool`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StudioError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| StudioError::internal("failed to run database migrations").with_cause(e))
}

/// Start a transaction — the all-or-nothing boundary every multi-row write
/// in `studio-store` uses (spec.md §4.1 `move`, §4.2 `create_function`,
/// §4.5 `delete`).
///
/// Callers run their statements against the returned transaction and finish
/// with an explicit [`sqlx::Transaction::commit`]; if a caller instead
/// returns early via `?` without committing, `sqlx` rolls the transaction
/// back automatically when it drops, so a failure partway through a
/// multi-statement operation always restores the pre-operation state.
pub async fn begin(pool: &PgPool) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, StudioError> {
    pool.begin()
        .await
        .map_err(|e| StudioError::internal("failed to start transaction").with_cause(e))
}
