use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Place, PlaceId};

/// Record store behind the persistence gateway: one JSON document per place id.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredPlace {
    pub place: Place,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_places_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_places_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id         TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure places table exists")?;
        Ok(())
    }

    /// Every stored place in insertion order. Replacing a record keeps its position.
    pub async fn list_places(&self) -> Result<Vec<Place>> {
        Ok(self
            .list_stored_places()
            .await?
            .into_iter()
            .map(|stored| stored.place)
            .collect())
    }

    pub async fn list_stored_places(&self) -> Result<Vec<StoredPlace>> {
        let rows =
            sqlx::query("SELECT id, data, created_at, updated_at FROM places ORDER BY rowid")
                .fetch_all(&self.pool)
                .await
                .context("failed to list places")?;
        rows.into_iter().map(stored_place_from_row).collect()
    }

    pub async fn get_place(&self, id: &PlaceId) -> Result<Option<StoredPlace>> {
        let row = sqlx::query("SELECT id, data, created_at, updated_at FROM places WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(stored_place_from_row).transpose()
    }

    /// Creates the record when absent, replaces it when present.
    pub async fn upsert_place(&self, place: &Place) -> Result<()> {
        let data = serde_json::to_string(place)
            .with_context(|| format!("failed to encode place {}", place.id))?;
        sqlx::query(
            "INSERT INTO places (id, data) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(place.id.as_str())
        .bind(data)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to upsert place {}", place.id))?;
        Ok(())
    }

    /// Returns whether a record was removed; deleting an absent id is not an error.
    pub async fn delete_place(&self, id: &PlaceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM places WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete place {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_places(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM places")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn stored_place_from_row(row: SqliteRow) -> Result<StoredPlace> {
    let id: String = row.try_get("id")?;
    let data: String = row.try_get("data")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let place: Place = serde_json::from_str(&data)
        .with_context(|| format!("stored record for place {id} is not a valid place"))?;
    Ok(StoredPlace {
        place,
        created_at: parse_sqlite_timestamp(&created_at)?,
        updated_at: parse_sqlite_timestamp(&updated_at)?,
    })
}

fn parse_sqlite_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid sqlite timestamp '{raw}'"))?;
    Ok(naive.and_utc())
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
