//! Integration tests for the rule store
//!
//! Exercises both snapshot backends through temporary files.

use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

use novel_reasoning::config::{RuleBackend, RuleStoreConfig};
use novel_reasoning::parsing::parse_rules_at;
use novel_reasoning::store::{JsonFileSnapshot, RuleRecord, RuleStore};

fn sample_rules(n: usize) -> Vec<RuleRecord> {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
    (0..n)
        .map(|i| {
            let mut rule = RuleRecord::new(i, now);
            rule.description = format!("Rule {} description", i);
            rule.pattern = format!("pattern {}", i);
            rule.confidence = 0.5 + i as f64 * 0.1;
            rule.usage_count = i as u32;
            rule
        })
        .collect()
}

fn config(backend: RuleBackend, path: PathBuf) -> RuleStoreConfig {
    RuleStoreConfig {
        backend,
        path,
        max_connections: 1,
    }
}

#[cfg(test)]
mod json_store_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learned_rules.json");

        let mut store = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert!(store.is_empty());
        assert_eq!(store.append(sample_rules(3)), 3);
        store.persist().await.unwrap();

        let reloaded = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert_eq!(reloaded.records(), store.records());
        assert!(!dir.path().join("learned_rules.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_reload_without_changes_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learned_rules.json");

        let mut store = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        store.append(sample_rules(2));
        store.persist().await.unwrap();

        let reopened = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        reopened.persist().await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let again = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert_eq!(again.records(), store.records());
        again.persist().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn test_snapshot_uses_flat_rule_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learned_rules.json");

        let mut store = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        store.append(sample_rules(1));
        store.persist().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let object = raw[0].as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "confidence",
                "created_at",
                "description",
                "last_used",
                "pattern",
                "rule_id",
                "success_rate",
                "usage_count",
            ]
        );
        assert_eq!(raw[0]["success_rate"], serde_json::json!(0.8));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learned_rules.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert!(store.is_empty());

        // The store stays usable and overwrites the corrupt snapshot.
        store.append(sample_rules(1));
        store.persist().await.unwrap();
        let reloaded = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_parsed_rules_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learned_rules.json");
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let text = "1. Symmetry\nDescription: Mirror the grid\nPattern: reflect left-right\nConfidence: 0.85\n\
                    2. Colour\nDescription: Recolour the largest object\nPattern: 1 -> 2";

        let mut store = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        store.append(parse_rules_at(text, now));
        store.persist().await.unwrap();

        let reloaded = RuleStore::open(JsonFileSnapshot::new(&path)).await;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records()[0].confidence, 0.85);
        assert_eq!(reloaded.records()[1].confidence, 0.8);
        assert_eq!(reloaded.records()[1].pattern, "1 -> 2");
        assert_ne!(reloaded.records()[0].rule_id, reloaded.records()[1].rule_id);
    }

    #[tokio::test]
    async fn test_from_config_json() {
        let dir = TempDir::new().unwrap();
        let cfg = config(RuleBackend::Json, dir.path().join("nested/rules.json"));

        let mut store = RuleStore::from_config(&cfg).await.unwrap();
        store.append(sample_rules(1));
        store.persist().await.unwrap();

        assert!(dir.path().join("nested/rules.json").exists());
        assert!(store.location().ends_with("rules.json"));
    }
}

#[cfg(test)]
mod sqlite_store_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sqlite_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let cfg = config(RuleBackend::Sqlite, dir.path().join("data/rules.db"));

        let mut store = RuleStore::from_config(&cfg).await.unwrap();
        store.append(sample_rules(4));
        store.persist().await.unwrap();
        drop(store);

        let reloaded = RuleStore::from_config(&cfg).await.unwrap();
        assert_eq!(reloaded.len(), 4);
        let expected = sample_rules(4);
        for (got, want) in reloaded.records().iter().zip(&expected) {
            assert_eq!(got.description, want.description);
            assert_eq!(got.pattern, want.pattern);
            assert_eq!(got.confidence, want.confidence);
            assert_eq!(got.usage_count, want.usage_count);
            assert_eq!(got.created_at, want.created_at);
        }
        assert!(reloaded.location().starts_with("sqlite://"));
    }

    #[tokio::test]
    async fn test_sqlite_persist_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let cfg = config(RuleBackend::Sqlite, dir.path().join("rules.db"));

        let mut store = RuleStore::from_config(&cfg).await.unwrap();
        store.append(sample_rules(3));
        store.persist().await.unwrap();

        store.clear();
        store.append(sample_rules(1));
        store.persist().await.unwrap();

        let reloaded = RuleStore::from_config(&cfg).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].description, "Rule 0 description");
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_ids_do_not_block_persist() {
        let dir = TempDir::new().unwrap();
        let cfg = config(RuleBackend::Sqlite, dir.path().join("rules.db"));
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        let mut store = RuleStore::from_config(&cfg).await.unwrap();
        let rule = sample_rules(1).remove(0);
        store.append(vec![rule.clone(), rule]);
        store.persist().await.unwrap();

        store.append(parse_rules_at("1. Later\nDescription: learned later", now));
        store.persist().await.unwrap();
        drop(store);

        let reloaded = RuleStore::from_config(&cfg).await.unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.records()[2].description, "learned later");
    }
}
