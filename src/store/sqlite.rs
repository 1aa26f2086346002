use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use super::{timestamp, RuleRecord, RuleSnapshot};
use crate::config::RuleStoreConfig;
use crate::error::{StoreError, StoreResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Rule snapshot stored in a SQLite `learned_rules` table.
#[derive(Clone)]
pub struct SqliteSnapshot {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteSnapshot {
    /// Open (creating if missing) the database named by `config.path`.
    pub async fn new(config: &RuleStoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection {
                    message: format!("Failed to create database directory: {}", e),
                })?;
            }
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StoreError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let snapshot = Self {
            pool,
            path: config.path.clone(),
        };
        snapshot.run_migrations().await?;

        Ok(snapshot)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration {
                message: format!("Failed to run migrations: {}", e),
            })?;

        info!(path = %self.path.display(), "Rule database ready");
        Ok(())
    }

    fn row_to_rule(row: &SqliteRow) -> StoreResult<RuleRecord> {
        let created_at: String = row.try_get("created_at")?;
        let last_used: String = row.try_get("last_used")?;
        let usage_count: i64 = row.try_get("usage_count")?;

        Ok(RuleRecord {
            rule_id: row.try_get("rule_id")?,
            description: row.try_get("description")?,
            pattern: row.try_get("pattern")?,
            confidence: row.try_get("confidence")?,
            usage_count: u32::try_from(usage_count).map_err(|_| StoreError::Corrupt {
                message: format!("usage_count out of range: {}", usage_count),
            })?,
            created_at: parse_timestamp(&created_at)?,
            last_used: parse_timestamp(&last_used)?,
            success_rate: row.try_get("success_rate")?,
        })
    }
}

fn parse_timestamp(raw: &str) -> StoreResult<chrono::DateTime<chrono::Utc>> {
    timestamp::parse(raw).ok_or_else(|| StoreError::Corrupt {
        message: format!("invalid timestamp '{}'", raw),
    })
}

#[async_trait]
impl RuleSnapshot for SqliteSnapshot {
    async fn load_all(&self) -> StoreResult<Vec<RuleRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT rule_id, description, pattern, confidence, usage_count,
                   created_at, last_used, success_rate
            FROM learned_rules
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_rule).collect()
    }

    async fn replace_all(&self, records: &[RuleRecord]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM learned_rules")
            .execute(&mut *tx)
            .await?;

        for (position, rule) in records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO learned_rules (
                    position, rule_id, description, pattern, confidence,
                    usage_count, created_at, last_used, success_rate
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&rule.rule_id)
            .bind(&rule.description)
            .bind(&rule.pattern)
            .bind(rule.confidence)
            .bind(i64::from(rule.usage_count))
            .bind(rule.created_at.to_rfc3339())
            .bind(rule.last_used.to_rfc3339())
            .bind(rule.success_rate)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    fn location(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}
