//! Persistent memory of learned rules.
//!
//! [`RuleStore`] owns the in-memory rule list and is its only writer. The
//! snapshot format is pluggable through [`RuleSnapshot`]: a JSON file by
//! default, or a SQLite table.

mod json;
mod sqlite;

pub use json::JsonFileSnapshot;
pub use sqlite::SqliteSnapshot;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{RuleBackend, RuleStoreConfig};
use crate::error::StoreResult;

/// Success rate assigned to a rule before any feedback exists.
pub const INITIAL_SUCCESS_RATE: f64 = 0.8;

/// Confidence assigned when a rule does not state one.
pub const DEFAULT_RULE_CONFIDENCE: f64 = 0.8;

/// A reusable generalization abstracted from one problem-solving run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Unique, time-seeded identifier.
    pub rule_id: String,
    /// What the rule is about.
    pub description: String,
    /// The rule or pattern itself.
    pub pattern: String,
    /// Confidence in the rule (0.0-1.0).
    pub confidence: f64,
    /// Number of runs that produced or reused the rule.
    pub usage_count: u32,
    /// When the rule was learned.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// When the rule was last produced or reused.
    #[serde(with = "timestamp")]
    pub last_used: DateTime<Utc>,
    /// Observed success rate (0.0-1.0).
    pub success_rate: f64,
}

impl RuleRecord {
    /// Create an empty rule at position `index` of a batch learned at `now`.
    pub fn new(index: usize, now: DateTime<Utc>) -> Self {
        Self {
            rule_id: Self::generate_id(index, now),
            description: String::new(),
            pattern: String::new(),
            confidence: DEFAULT_RULE_CONFIDENCE,
            usage_count: 1,
            created_at: now,
            last_used: now,
            success_rate: INITIAL_SUCCESS_RATE,
        }
    }

    /// `rule_{index}_{YYYYmmdd_HHMMSS}_{random}`.
    pub fn generate_id(index: usize, now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "rule_{}_{}_{}",
            index,
            now.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        )
    }
}

/// Serde helpers for rule timestamps.
///
/// Writes RFC 3339. Reads RFC 3339 or a naive ISO-8601 timestamp, taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Backend that stores a full snapshot of the rule list.
#[async_trait]
pub trait RuleSnapshot: Send + Sync {
    /// Read every persisted rule, in persisted order.
    async fn load_all(&self) -> StoreResult<Vec<RuleRecord>>;

    /// Overwrite the snapshot with exactly `records`.
    async fn replace_all(&self, records: &[RuleRecord]) -> StoreResult<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Owner of the learned rule list.
///
/// Single writer, single process: two stores sharing one snapshot will
/// overwrite each other's rules.
pub struct RuleStore {
    snapshot: Box<dyn RuleSnapshot>,
    records: Vec<RuleRecord>,
}

impl RuleStore {
    /// Create an empty store backed by `snapshot`. Nothing is read yet.
    pub fn new(snapshot: impl RuleSnapshot + 'static) -> Self {
        Self {
            snapshot: Box::new(snapshot),
            records: Vec::new(),
        }
    }

    /// Create a store and load whatever the snapshot holds.
    pub async fn open(snapshot: impl RuleSnapshot + 'static) -> Self {
        let mut store = Self::new(snapshot);
        store.load().await;
        store
    }

    /// Open the backend selected by configuration.
    ///
    /// A SQLite database that cannot be opened is fatal here; a snapshot
    /// that cannot be read is not (see [`RuleStore::load`]).
    pub async fn from_config(config: &RuleStoreConfig) -> StoreResult<Self> {
        let store = match config.backend {
            RuleBackend::Json => Self::open(JsonFileSnapshot::new(&config.path)).await,
            RuleBackend::Sqlite => Self::open(SqliteSnapshot::new(config).await?).await,
        };
        Ok(store)
    }

    /// Replace the in-memory list with the persisted snapshot.
    ///
    /// A missing or unreadable snapshot is logged and loads as an empty store.
    pub async fn load(&mut self) -> &[RuleRecord] {
        match self.snapshot.load_all().await {
            Ok(records) => {
                self.records.clear();
                self.append(records);
                info!(
                    location = %self.snapshot.location(),
                    rules = self.records.len(),
                    "Loaded existing rules"
                );
            }
            Err(e) => {
                warn!(
                    location = %self.snapshot.location(),
                    error = %e,
                    "Could not load existing rules, starting empty"
                );
                self.records.clear();
            }
        }
        &self.records
    }

    /// Append rules to the in-memory list. Returns how many were added.
    ///
    /// Rule ids are unique within the store. A rule without an id, or whose
    /// id is already taken, is given a fresh one.
    pub fn append(&mut self, records: impl IntoIterator<Item = RuleRecord>) -> usize {
        let before = self.records.len();
        let now = Utc::now();
        let mut taken: HashSet<String> =
            self.records.iter().map(|r| r.rule_id.clone()).collect();
        for mut rule in records {
            if rule.rule_id.trim().is_empty() {
                rule.rule_id = RuleRecord::generate_id(self.records.len(), now);
            } else if taken.contains(&rule.rule_id) {
                let fresh = RuleRecord::generate_id(self.records.len(), now);
                warn!(
                    rule_id = %rule.rule_id,
                    new_id = %fresh,
                    "Duplicate rule id, assigning a new one"
                );
                rule.rule_id = fresh;
            }
            taken.insert(rule.rule_id.clone());
            self.records.push(rule);
        }
        self.records.len() - before
    }

    /// Overwrite the snapshot with the full in-memory list.
    pub async fn persist(&self) -> StoreResult<()> {
        self.snapshot.replace_all(&self.records).await?;
        info!(
            location = %self.snapshot.location(),
            rules = self.records.len(),
            "Saved rules to storage"
        );
        Ok(())
    }

    /// All rules, oldest first.
    pub fn records(&self) -> &[RuleRecord] {
        &self.records
    }

    /// Look up a rule by id.
    pub fn get(&self, rule_id: &str) -> Option<&RuleRecord> {
        self.records.iter().find(|r| r.rule_id == rule_id)
    }

    /// Number of rules held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no rules.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every rule from memory. Call [`RuleStore::persist`] to reset the snapshot too.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Where the snapshot lives.
    pub fn location(&self) -> String {
        self.snapshot.location()
    }
}
