use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    db::RankStore,
    error::{AppError, AppResult},
    models::{MediaType, RankedItem, Tier, TitleMetadata},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations in `./migrations`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Column list for the `ranked_items` table.
const COLUMNS: &str = "id, catalog_id, title, media_type, rank, tier, comparison_count, \
    date_added, review, genre_names, runtime_minutes, release_date";

#[derive(Debug, FromRow)]
struct RankedItemRow {
    id: Uuid,
    catalog_id: String,
    title: String,
    media_type: String,
    rank: i32,
    tier: String,
    comparison_count: i32,
    date_added: DateTime<Utc>,
    review: Option<String>,
    genre_names: Vec<String>,
    runtime_minutes: i32,
    release_date: Option<String>,
}

impl TryFrom<RankedItemRow> for RankedItem {
    type Error = AppError;

    fn try_from(row: RankedItemRow) -> Result<Self, Self::Error> {
        Ok(RankedItem {
            id: row.id,
            catalog_id: row.catalog_id,
            title: row.title,
            media_type: row.media_type.parse().map_err(AppError::Internal)?,
            rank: to_u32("rank", row.rank)?,
            tier: row.tier.parse().map_err(AppError::Internal)?,
            comparison_count: to_u32("comparison_count", row.comparison_count)?,
            date_added: row.date_added,
            review: row.review,
            genre_names: row.genre_names,
            runtime_minutes: to_u32("runtime_minutes", row.runtime_minutes)?,
            release_date: row.release_date,
        })
    }
}

fn to_u32(column: &str, value: i32) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::Internal(format!("Negative {} value in ranked_items: {}", column, value)))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Rank store over the `ranked_items` table
#[derive(Clone)]
pub struct PgRankStore {
    pool: PgPool,
}

impl PgRankStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_items(&self, query: &str, media_type: Option<MediaType>) -> AppResult<Vec<RankedItem>> {
        let mut q = sqlx::query_as::<_, RankedItemRow>(query);
        if let Some(media_type) = media_type {
            q = q.bind(media_type.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(RankedItem::try_from).collect()
    }
}

#[async_trait::async_trait]
impl RankStore for PgRankStore {
    async fn list_partition(&self, media_type: MediaType) -> AppResult<Vec<RankedItem>> {
        let query = format!(
            "SELECT {COLUMNS} FROM ranked_items WHERE media_type = $1 ORDER BY rank"
        );
        self.fetch_items(&query, Some(media_type)).await
    }

    async fn list_all(&self) -> AppResult<Vec<RankedItem>> {
        let query = format!("SELECT {COLUMNS} FROM ranked_items ORDER BY media_type, rank");
        self.fetch_items(&query, None).await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
        let query = format!("SELECT {COLUMNS} FROM ranked_items WHERE id = $1");
        let row = sqlx::query_as::<_, RankedItemRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(RankedItem::try_from).transpose()
    }

    async fn find_by_catalog_id(
        &self,
        catalog_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<RankedItem>> {
        let query = format!(
            "SELECT {COLUMNS} FROM ranked_items WHERE catalog_id = $1 AND media_type = $2"
        );
        let row = sqlx::query_as::<_, RankedItemRow>(&query)
            .bind(catalog_id)
            .bind(media_type.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(RankedItem::try_from).transpose()
    }

    async fn insert(&self, item: RankedItem) -> AppResult<()> {
        let query = format!(
            "INSERT INTO ranked_items ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        let result = sqlx::query(&query)
            .bind(item.id)
            .bind(&item.catalog_id)
            .bind(&item.title)
            .bind(item.media_type.as_str())
            .bind(to_i32(item.rank))
            .bind(item.tier.as_str())
            .bind(to_i32(item.comparison_count))
            .bind(item.date_added)
            .bind(&item.review)
            .bind(&item.genre_names)
            .bind(to_i32(item.runtime_minutes))
            .bind(&item.release_date)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateItem {
                    catalog_id: item.catalog_id,
                    media_type: item.media_type,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, id: Uuid) -> AppResult<Option<RankedItem>> {
        let query = format!("DELETE FROM ranked_items WHERE id = $1 RETURNING {COLUMNS}");
        let row = sqlx::query_as::<_, RankedItemRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(RankedItem::try_from).transpose()
    }

    async fn set_rank(&self, id: Uuid, rank: u32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE ranked_items SET rank = $2 WHERE id = $1")
            .bind(id)
            .bind(to_i32(rank))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_tier(&self, id: Uuid, tier: Tier) -> AppResult<bool> {
        let result = sqlx::query("UPDATE ranked_items SET tier = $2 WHERE id = $1")
            .bind(id)
            .bind(tier.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_review(&self, id: Uuid, review: Option<String>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE ranked_items SET review = $2 WHERE id = $1")
            .bind(id)
            .bind(review)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_metadata(&self, id: Uuid, metadata: &TitleMetadata) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE ranked_items SET genre_names = $2, runtime_minutes = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(&metadata.genre_names)
        .bind(to_i32(metadata.runtime_minutes))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
