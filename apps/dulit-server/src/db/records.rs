//! Generic document record operations

use std::marker::PhantomData;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// An entity stored as a JSON document in one collection
pub trait Record: DeserializeOwned + Send + Sync {
    /// Collection the entity lives in
    const COLLECTION: &'static str;
    /// Human-readable name used in API messages
    const LABEL: &'static str;

    /// Body stored on create
    type New: Serialize + Sync;
    /// Partial update; `None` fields are left alone
    type Patch: Serialize + Sync;
}

/// Record repository for one collection
pub struct RecordRepository<'a, R> {
    pool: &'a SqlitePool,
    _record: PhantomData<R>,
}

impl<'a, R: Record> RecordRepository<'a, R> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Insert a new record, returning its generated id
    pub async fn create(&self, data: &R::New) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let body = serde_json::to_string(data)?;

        sqlx::query(
            r#"
            INSERT INTO records (id, collection, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(R::COLLECTION)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(id)
    }

    /// All records in insertion order
    pub async fn list(&self) -> Result<Vec<R>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, body
            FROM records
            WHERE collection = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(R::COLLECTION)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, body)| decode_record(id, &body))
            .collect()
    }

    /// Get a specific record
    pub async fn get(&self, id: &str) -> Result<Option<R>> {
        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, body
            FROM records
            WHERE id = ? AND collection = ?
            "#,
        )
        .bind(id)
        .bind(R::COLLECTION)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(id, body)| decode_record(id, &body)).transpose()
    }

    /// Merge the provided fields into a record.
    ///
    /// Returns the number of matched records (0 or 1). A patch with no
    /// fields still counts as a match. The merge runs as one statement so
    /// concurrent updates serialize on the write lock.
    pub async fn update(&self, id: &str, patch: &R::Patch) -> Result<u64> {
        let fields = patch_fields(serde_json::to_value(patch)?);

        if fields.is_empty() {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM records WHERE id = ? AND collection = ?")
                    .bind(id)
                    .bind(R::COLLECTION)
                    .fetch_optional(self.pool)
                    .await?;
            return Ok(u64::from(exists.is_some()));
        }

        let result = sqlx::query(
            r#"
            UPDATE records
            SET body = json_patch(body, ?), updated_at = ?
            WHERE id = ? AND collection = ?
            "#,
        )
        .bind(serde_json::Value::Object(fields).to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(R::COLLECTION)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a record, returning the number removed (0 or 1)
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE id = ? AND collection = ?")
            .bind(id)
            .bind(R::COLLECTION)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn decode_record<R: Record>(id: String, body: &str) -> Result<R> {
    let mut document: serde_json::Value = serde_json::from_str(body)?;
    match document.as_object_mut() {
        Some(fields) => {
            fields.insert("id".to_string(), serde_json::Value::String(id));
        }
        None => {
            return Err(AppError::Internal(format!(
                "{} record {} is not a JSON object",
                R::LABEL,
                id
            )))
        }
    }
    Ok(serde_json::from_value(document)?)
}

/// Top-level fields of `patch` that should overwrite stored values.
///
/// Nulls are dropped since `json_patch` treats them as deletions.
fn patch_fields(patch: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match patch {
        serde_json::Value::Object(fields) => fields
            .into_iter()
            .filter(|(key, value)| !value.is_null() && key != "id")
            .collect(),
        _ => serde_json::Map::new(),
    }
}

/// Collects names of required fields that were not supplied
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn take<T>(&mut self, value: Option<T>, field: &'static str) -> Option<T> {
        if value.is_none() {
            self.missing.push(field);
        }
        value
    }

    /// Fail with a 400 listing every missing field
    pub fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Missing required field(s): {}",
                self.missing.join(", ")
            )))
        }
    }
}
