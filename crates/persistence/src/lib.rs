#![deny(warnings)]

//! Persistence layer: named scenario snapshots stored in SQLite.
//!
//! Configs are stored as camelCase JSON and revalidated on the way out, so a
//! loaded `Config` always satisfies the engine's invariants.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sim_core::{Config, ConfigDraft, ConfigError, Scenario};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

pub use sqlx::sqlite::SqlitePool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] MigrateError),
    #[error("config encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("stored config is invalid: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("scenario {0} not found")]
    NotFound(i64),
    #[error("scenario name must not be empty")]
    EmptyName,
    #[error("bad timestamp {0:?}")]
    BadTimestamp(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/scenarios.db"
}

/// Create the directory holding a file-backed database.
fn ensure_parent_dir(url: &str) -> Result<(), PersistenceError> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|p| !p.contains(":memory:"));
    if let Some(parent) = path.and_then(|p| Path::new(p).parent()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Open (creating if needed) the database at `url` and apply migrations.
pub async fn init_db(url: &str) -> Result<SqlitePool, PersistenceError> {
    ensure_parent_dir(url)?;
    let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = if url.contains(":memory:") {
        // Each connection would otherwise see its own empty database.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?
    };
    MIGRATOR.run(&pool).await?;
    debug!(url, "scenario store ready");
    Ok(pool)
}

fn encode_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(s: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| PersistenceError::BadTimestamp(s.to_string()))
}

fn decode_config(json: &str) -> Result<Config, PersistenceError> {
    let draft: ConfigDraft = serde_json::from_str(json)?;
    Ok(draft.build()?)
}

type ScenarioRow = (i64, String, String, String);

fn decode_row((id, name, saved_at, config): ScenarioRow) -> Result<Scenario, PersistenceError> {
    Ok(Scenario {
        id,
        name,
        saved_at: decode_time(&saved_at)?,
        config: decode_config(&config)?,
    })
}

/// Store `config` under `name` and return the new scenario record.
pub async fn save_scenario(
    pool: &SqlitePool,
    name: &str,
    config: &Config,
) -> Result<Scenario, PersistenceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PersistenceError::EmptyName);
    }
    config.validate()?;
    let saved_at = Utc::now().trunc_subsecs(6);
    let json = serde_json::to_string(config)?;
    let id = sqlx::query("INSERT INTO scenarios (name, saved_at, config) VALUES (?, ?, ?)")
        .bind(name)
        .bind(encode_time(&saved_at))
        .bind(json)
        .execute(pool)
        .await?
        .last_insert_rowid();
    info!(id, name, "scenario saved");
    Ok(Scenario {
        id,
        name: name.to_string(),
        saved_at,
        config: *config,
    })
}

/// All stored scenarios, newest first.
pub async fn list_scenarios(pool: &SqlitePool) -> Result<Vec<Scenario>, PersistenceError> {
    let rows: Vec<ScenarioRow> = sqlx::query_as(
        "SELECT id, name, saved_at, config FROM scenarios ORDER BY saved_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(decode_row).collect()
}

/// Full scenario record by id.
pub async fn get_scenario(pool: &SqlitePool, id: i64) -> Result<Scenario, PersistenceError> {
    let row: Option<ScenarioRow> =
        sqlx::query_as("SELECT id, name, saved_at, config FROM scenarios WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.ok_or(PersistenceError::NotFound(id))
        .and_then(decode_row)
}

/// The stored config for scenario `id`.
pub async fn load_scenario(pool: &SqlitePool, id: i64) -> Result<Config, PersistenceError> {
    Ok(get_scenario(pool, id).await?.config)
}

/// Remove scenario `id`. Deleting a missing id is not an error.
pub async fn delete_scenario(pool: &SqlitePool, id: i64) -> Result<(), PersistenceError> {
    let affected = sqlx::query("DELETE FROM scenarios WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        debug!(id, "delete: no such scenario");
    } else {
        info!(id, "scenario deleted");
    }
    Ok(())
}
