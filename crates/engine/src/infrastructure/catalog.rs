//! SQLite-backed theme/role catalog and its JSON seeder.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use loreforge_domain::{CatalogEntry, RarityTier, RarityWeights, RoleEntry, ThemeEntry};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::infrastructure::ports::{
    CatalogCounts, CatalogImport, CatalogRepo, ClockPort, RepoError,
};

const CONFIG_KEY: &str = "config";

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS themes (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        rarity TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_themes_rarity ON themes (rarity)",
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        rarity TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_roles_rarity ON roles (rarity)",
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value_json TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

#[derive(Debug, Clone, Copy)]
enum Collection {
    Themes,
    Roles,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Themes => "themes",
            Collection::Roles => "roles",
        }
    }
}

/// Shape of the `config` metadata document. Missing weights mean the
/// standard table applies.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(
        rename = "rarityWeights",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    rarity_weights: Option<RarityWeights>,
}

/// SQLite implementation of the catalog document store.
pub struct SqliteCatalogRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteCatalogRepo {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("catalog", e))?;
        Self::with_pool(pool, clock).await
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same database.
    pub async fn in_memory(clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| RepoError::database("catalog", e))?;
        Self::with_pool(pool, clock).await
    }

    async fn with_pool(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| RepoError::database("catalog_schema", e))?;
        }
        Ok(Self { pool, clock })
    }

    async fn fetch_entries(
        &self,
        collection: Collection,
        rarity: Option<&RarityTier>,
    ) -> Result<Vec<CatalogEntry>, RepoError> {
        let mut query = format!(
            "SELECT id, name, rarity, description FROM {}",
            collection.table()
        );
        if rarity.is_some() {
            query.push_str(" WHERE rarity = ?");
        }
        query.push_str(" ORDER BY id");

        let mut q = sqlx::query(&query);
        if let Some(rarity) = rarity {
            q = q.bind(rarity.as_str());
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("catalog_fetch", e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                CatalogEntry::new(
                    row.get::<String, _>("id"),
                    row.get::<String, _>("name"),
                    row.get::<String, _>("rarity"),
                    row.get::<String, _>("description"),
                )
            })
            .collect())
    }

    async fn save_entry(&self, collection: Collection, entry: &CatalogEntry) -> Result<(), RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("catalog_save", e))?;
        upsert_entry(&mut conn, collection, entry, &self.clock.now().to_rfc3339()).await
    }

    async fn count(&self, collection: Collection) -> Result<u64, RepoError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", collection.table()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::database("catalog_count", e))?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl CatalogRepo for SqliteCatalogRepo {
    async fn rarity_weights(&self) -> Result<Option<RarityWeights>, RepoError> {
        let row = sqlx::query("SELECT value_json FROM metadata WHERE key = ?")
            .bind(CONFIG_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("catalog_weights", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("value_json");
                let config: ConfigDocument =
                    serde_json::from_str(&json).map_err(RepoError::serialization)?;
                Ok(config.rarity_weights)
            }
            None => Ok(None),
        }
    }

    async fn themes_with_rarity(&self, rarity: &RarityTier) -> Result<Vec<ThemeEntry>, RepoError> {
        self.fetch_entries(Collection::Themes, Some(rarity)).await
    }

    async fn all_themes(&self) -> Result<Vec<ThemeEntry>, RepoError> {
        self.fetch_entries(Collection::Themes, None).await
    }

    async fn roles_with_rarity(&self, rarity: &RarityTier) -> Result<Vec<RoleEntry>, RepoError> {
        self.fetch_entries(Collection::Roles, Some(rarity)).await
    }

    async fn all_roles(&self) -> Result<Vec<RoleEntry>, RepoError> {
        self.fetch_entries(Collection::Roles, None).await
    }

    async fn counts(&self) -> Result<CatalogCounts, RepoError> {
        Ok(CatalogCounts {
            themes: self.count(Collection::Themes).await?,
            roles: self.count(Collection::Roles).await?,
        })
    }

    async fn save_theme(&self, theme: &ThemeEntry) -> Result<(), RepoError> {
        self.save_entry(Collection::Themes, theme).await
    }

    async fn save_role(&self, role: &RoleEntry) -> Result<(), RepoError> {
        self.save_entry(Collection::Roles, role).await
    }

    async fn save_rarity_weights(&self, weights: &RarityWeights) -> Result<(), RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("catalog_weights", e))?;
        upsert_weights(&mut conn, weights, &self.clock.now().to_rfc3339()).await
    }

    async fn import_catalog(&self, import: &CatalogImport) -> Result<(), RepoError> {
        let now = self.clock.now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("catalog_import", e))?;

        for theme in &import.themes {
            upsert_entry(&mut *tx, Collection::Themes, theme, &now).await?;
        }
        for role in &import.roles {
            upsert_entry(&mut *tx, Collection::Roles, role, &now).await?;
        }
        if let Some(weights) = &import.rarity_weights {
            upsert_weights(&mut *tx, weights, &now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("catalog_import", e))
    }
}

async fn upsert_entry(
    conn: &mut SqliteConnection,
    collection: Collection,
    entry: &CatalogEntry,
    now: &str,
) -> Result<(), RepoError> {
    let query = format!(
        r#"
        INSERT INTO {} (id, name, rarity, description, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            rarity = excluded.rarity,
            description = excluded.description,
            updated_at = excluded.updated_at
        "#,
        collection.table()
    );

    sqlx::query(&query)
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(entry.rarity.as_str())
        .bind(&entry.description)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepoError::database("catalog_save", e))?;

    Ok(())
}

async fn upsert_weights(
    conn: &mut SqliteConnection,
    weights: &RarityWeights,
    now: &str,
) -> Result<(), RepoError> {
    let json = serde_json::to_string(&ConfigDocument {
        rarity_weights: Some(weights.clone()),
    })
    .map_err(RepoError::serialization)?;

    sqlx::query(
        r#"
        INSERT INTO metadata (key, value_json, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value_json = excluded.value_json,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(CONFIG_KEY)
    .bind(json)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepoError::database("catalog_weights", e))?;

    Ok(())
}

// =============================================================================
// Seeding
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read {file}: {message}")]
    Read { file: String, message: String },

    #[error("Invalid JSON in {file}: {message}")]
    Parse { file: String, message: String },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Counts of documents written by [`seed_from_dir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub themes: usize,
    pub roles: usize,
    pub rarity_tiers: usize,
}

/// One document in `themes.json` / `roles.json`, keyed by its id.
#[derive(Debug, Deserialize)]
struct SeedDocument {
    name: String,
    rarity: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    config: ConfigDocument,
}

fn to_entries(docs: BTreeMap<String, SeedDocument>) -> Vec<CatalogEntry> {
    docs.into_iter()
        .map(|(id, doc)| CatalogEntry::new(id, doc.name, doc.rarity, doc.description))
        .collect()
}

/// Import `themes.json`, `roles.json` and `metadata.json` from `dir`.
///
/// Theme and role files map document ids to `{name, rarity, description}`;
/// `metadata.json` holds `{"config": {"rarityWeights": {...}}}`. Existing
/// documents with the same id are overwritten. A metadata file without
/// weights leaves the stored table alone. Nothing is written unless every
/// document is.
pub async fn seed_from_dir(repo: &dyn CatalogRepo, dir: &Path) -> Result<SeedSummary, SeedError> {
    let themes: BTreeMap<String, SeedDocument> = read_json(dir, "themes.json").await?;
    let roles: BTreeMap<String, SeedDocument> = read_json(dir, "roles.json").await?;
    let metadata: MetadataFile = read_json(dir, "metadata.json").await?;

    let import = CatalogImport {
        themes: to_entries(themes),
        roles: to_entries(roles),
        rarity_weights: metadata.config.rarity_weights,
    };
    repo.import_catalog(&import).await?;

    let summary = SeedSummary {
        themes: import.themes.len(),
        roles: import.roles.len(),
        rarity_tiers: import.rarity_weights.as_ref().map_or(0, RarityWeights::len),
    };
    tracing::info!(
        themes = summary.themes,
        roles = summary.roles,
        tiers = summary.rarity_tiers,
        "Seeded catalog"
    );

    Ok(summary)
}

async fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, SeedError> {
    let path = dir.join(file);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| SeedError::Read {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_str(&content).map_err(|e| SeedError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<dyn ClockPort> {
        Arc::new(FixedClock(Utc.timestamp_opt(1_700_000_000, 0).unwrap()))
    }

    async fn seeded_repo() -> SqliteCatalogRepo {
        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        repo.save_theme(&CatalogEntry::new("ember", "Ember", "Common", "Warm coals."))
            .await
            .unwrap();
        repo.save_theme(&CatalogEntry::new("void", "Void", "Rare", "Silence between stars."))
            .await
            .unwrap();
        repo.save_role(&CatalogEntry::new("monk", "Monk", "Common", "A disciplined ascetic"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_rarity_filter_and_full_listing() {
        let repo = seeded_repo().await;

        let rare = repo.themes_with_rarity(&"Rare".into()).await.unwrap();
        assert_eq!(rare.len(), 1);
        assert_eq!(rare[0].name, "Void");

        assert_eq!(repo.all_themes().await.unwrap().len(), 2);
        assert!(repo.roles_with_rarity(&"Rare".into()).await.unwrap().is_empty());
        assert_eq!(repo.all_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_upsert_by_id() {
        let repo = seeded_repo().await;
        repo.save_theme(&CatalogEntry::new("ember", "Ember", "Epic", "Hotter now."))
            .await
            .unwrap();

        let epic = repo.themes_with_rarity(&"Epic".into()).await.unwrap();
        assert_eq!(epic.len(), 1);
        assert_eq!(epic[0].description, "Hotter now.");
        assert_eq!(repo.counts().await.unwrap(), CatalogCounts { themes: 2, roles: 1 });
    }

    #[tokio::test]
    async fn test_missing_config_document_is_none() {
        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        assert!(repo.rarity_weights().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_weights_round_trip_keeps_order() {
        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        let weights = RarityWeights::new([("Rare", 1.0), ("Common", 9.0), ("Eternal", 0.5)]).unwrap();

        repo.save_rarity_weights(&weights).await.unwrap();
        let loaded = repo.rarity_weights().await.unwrap().unwrap();

        let tiers: Vec<&str> = loaded.tiers().map(RarityTier::as_str).collect();
        assert_eq!(tiers, vec!["Rare", "Common", "Eternal"]);
        assert_eq!(loaded, weights);
    }

    #[tokio::test]
    async fn test_file_backed_repo_persists_across_reopen() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let db_path = temp_dir.path().join("catalog.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        {
            let repo = SqliteCatalogRepo::new(&db_path_str, clock()).await.unwrap();
            repo.save_role(&CatalogEntry::new("bard", "Bard", "Uncommon", "Sings."))
                .await
                .unwrap();
        }

        let reopened = SqliteCatalogRepo::new(&db_path_str, clock()).await.unwrap();
        assert_eq!(reopened.all_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_from_dir_imports_all_files() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp_dir.path().join("themes.json"),
            r#"{"storm": {"name": "Storm", "rarity": "Epic", "description": "Thunder."},
                "ash": {"name": "Ash", "rarity": "Common", "description": "Cinders."}}"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("roles.json"),
            r#"{"monk": {"name": "Monk", "rarity": "Common", "description": "Calm."}}"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("metadata.json"),
            r#"{"config": {"rarityWeights": {"Common": 90, "Epic": 10}}}"#,
        )
        .unwrap();

        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        let summary = seed_from_dir(&repo, temp_dir.path()).await.unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                themes: 2,
                roles: 1,
                rarity_tiers: 2
            }
        );
        let storm = repo.themes_with_rarity(&"Epic".into()).await.unwrap();
        assert_eq!(storm[0].id, "storm");
        assert_eq!(
            repo.rarity_weights().await.unwrap().unwrap().weight_of(&"Epic".into()),
            Some(10.0)
        );
    }

    #[tokio::test]
    async fn test_seed_rejects_invalid_weights() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp_dir.path().join("themes.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("roles.json"), "{}").unwrap();
        std::fs::write(
            temp_dir.path().join("metadata.json"),
            r#"{"config": {"rarityWeights": {"Common": -1}}}"#,
        )
        .unwrap();

        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        let err = seed_from_dir(&repo, temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_config_document_without_weights_is_none() {
        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        sqlx::query("INSERT INTO metadata (key, value_json, updated_at) VALUES ('config', '{}', '')")
            .execute(&repo.pool)
            .await
            .unwrap();

        assert!(repo.rarity_weights().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_without_weights_keeps_stored_table() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp_dir.path().join("themes.json"),
            r#"{"ash": {"name": "Ash", "rarity": "Common"}}"#,
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("roles.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("metadata.json"), r#"{"config": {}}"#).unwrap();

        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        let weights = RarityWeights::new([("Common", 1.0)]).unwrap();
        repo.save_rarity_weights(&weights).await.unwrap();

        let summary = seed_from_dir(&repo, temp_dir.path()).await.unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                themes: 1,
                roles: 0,
                rarity_tiers: 0
            }
        );
        assert_eq!(repo.rarity_weights().await.unwrap(), Some(weights));
    }

    #[tokio::test]
    async fn test_failed_seed_writes_nothing() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp_dir.path().join("themes.json"),
            r#"{"storm": {"name": "Storm", "rarity": "Epic"}}"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("roles.json"),
            r#"{"monk": {"name": "Monk", "rarity": "Common"}}"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("metadata.json"),
            r#"{"config": {"rarityWeights": {"Common": 1}}}"#,
        )
        .unwrap();

        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();
        sqlx::query("DROP TABLE roles")
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = seed_from_dir(&repo, temp_dir.path()).await.unwrap_err();

        assert!(matches!(err, SeedError::Repo(_)));
        assert!(repo.all_themes().await.unwrap().is_empty());
        assert!(repo.rarity_weights().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_missing_file_is_read_error() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let repo = SqliteCatalogRepo::in_memory(clock()).await.unwrap();

        let err = seed_from_dir(&repo, temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }
}
