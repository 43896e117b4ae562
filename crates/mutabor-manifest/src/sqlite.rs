//! SQLite reference backend.
//!
//! The schema is applied at construction time, the way the sink contract
//! demands: a sink that exists can be written to. All rows of one run go
//! through a single transaction; on error the transaction rolls back and the
//! connection handle is released either way.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use mutabor_policy::{AppliedTransformation, TransformationResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sink::ManifestSink;

/// Target string selecting an ephemeral in-memory database.
pub const IN_MEMORY_TARGET: &str = ":memory:";

/// The shipped schema definition.
pub const DEFAULT_SCHEMA: &str = include_str!("../schema/manifest.sql");

const REQUIRED_TABLES: &[&str] = &[
    "info",
    "positions",
    "transformation_names",
    "transformation_categories",
    "transformation_name_category_mapping",
    "transformations",
];

/// SQLite-backed manifest sink.
///
/// Holds a single-connection pool, which keeps `:memory:` targets alive for
/// the lifetime of the sink and serializes all writes.
#[derive(Debug)]
pub struct SqliteManifestSink {
    pool: SqlitePool,
    target: String,
}

impl SqliteManifestSink {
    /// Open `target` (a file path, or [`IN_MEMORY_TARGET`]) and apply the
    /// shipped schema.
    pub async fn create(target: &str) -> Result<Self> {
        Self::open(DEFAULT_SCHEMA, "embedded schema", target).await
    }

    /// Open `target` with a schema definition loaded from `schema_path`.
    ///
    /// Fails fast with a [`StorageError`] when the schema file is missing,
    /// unreadable, or does not define the manifest tables.
    pub async fn create_with_schema_file(schema_path: &Path, target: &str) -> Result<Self> {
        if !schema_path.exists() {
            return Err(StorageError::SchemaMissing {
                path: schema_path.to_path_buf(),
            });
        }
        let schema = std::fs::read_to_string(schema_path).map_err(|source| {
            StorageError::SchemaIo {
                path: schema_path.to_path_buf(),
                source,
            }
        })?;
        Self::open(&schema, &schema_path.display().to_string(), target).await
    }

    async fn open(schema: &str, schema_origin: &str, target: &str) -> Result<Self> {
        validate_schema(schema, schema_origin)?;

        let options = if target == IN_MEMORY_TARGET {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(target)
                .create_if_missing(true)
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        // Idempotent against an already-initialized target.
        sqlx::raw_sql(schema).execute(&pool).await?;
        debug!(target, "manifest schema applied");

        Ok(Self {
            pool,
            target: target.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Release the backing connection. Dropping the sink releases it too;
    /// closing explicitly just makes the release point visible.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn validate_schema(schema: &str, origin: &str) -> Result<()> {
    if schema.trim().is_empty() {
        return Err(StorageError::MalformedSchema {
            origin: origin.to_string(),
            reason: "schema definition is empty".to_string(),
        });
    }
    let lowered = schema.to_lowercase();
    if !lowered.contains("create table") {
        return Err(StorageError::MalformedSchema {
            origin: origin.to_string(),
            reason: "schema defines no tables".to_string(),
        });
    }
    for table in REQUIRED_TABLES {
        if !lowered.contains(table) {
            return Err(StorageError::MalformedSchema {
                origin: origin.to_string(),
                reason: format!("schema is missing the '{table}' table"),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl ManifestSink for SqliteManifestSink {
    async fn write_manifest(&self, results: &[TransformationResult]) -> Result<()> {
        let applied: Vec<&AppliedTransformation> =
            results.iter().filter_map(|r| r.as_applied()).collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO info (info_key, info_value) VALUES (?1, ?2)")
            .bind("tool_version")
            .bind(env!("CARGO_PKG_VERSION"))
            .execute(&mut *tx)
            .await?;

        let mut name_ids: BTreeMap<&str, i64> = BTreeMap::new();
        for transformation in &applied {
            if !name_ids.contains_key(transformation.policy.as_str()) {
                sqlx::query(
                    "INSERT OR IGNORE INTO transformation_names (transformation_name) \
                     VALUES (?1)",
                )
                .bind(&transformation.policy)
                .execute(&mut *tx)
                .await?;
                let name_id: i64 = sqlx::query_scalar(
                    "SELECT name_id FROM transformation_names WHERE transformation_name = ?1",
                )
                .bind(&transformation.policy)
                .fetch_one(&mut *tx)
                .await?;
                name_ids.insert(transformation.policy.as_str(), name_id);

                for category in &transformation.categories {
                    sqlx::query(
                        "INSERT OR IGNORE INTO transformation_categories (category_name) \
                         VALUES (?1)",
                    )
                    .bind(category.as_str())
                    .execute(&mut *tx)
                    .await?;
                    let category_id: i64 = sqlx::query_scalar(
                        "SELECT category_id FROM transformation_categories \
                         WHERE category_name = ?1",
                    )
                    .bind(category.as_str())
                    .fetch_one(&mut *tx)
                    .await?;
                    sqlx::query(
                        "INSERT OR IGNORE INTO transformation_name_category_mapping \
                         (name_reference, category_reference) VALUES (?1, ?2)",
                    )
                    .bind(name_id)
                    .bind(category_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }

            let position = sqlx::query(
                "INSERT INTO positions (unit_name, element_name) VALUES (?1, ?2)",
            )
            .bind(&transformation.unit)
            .bind(&transformation.element)
            .execute(&mut *tx)
            .await?;
            let position_id = position.last_insert_rowid();

            sqlx::query(
                "INSERT INTO transformations (name_reference, position_reference) \
                 VALUES (?1, ?2)",
            )
            .bind(name_ids[transformation.policy.as_str()])
            .bind(position_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            target = %self.target,
            transformations = applied.len(),
            "manifest written"
        );
        Ok(())
    }
}
