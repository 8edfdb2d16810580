//! PostgreSQL implementation of the catalog repository.
//!
//! Every query is a keyset-paginated, read-only statement against the catalog
//! schema. Pages are independent statements, so the single connection the
//! pipeline holds is free between pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movies_etl_shared::{
    AggregateRow, ChangedRow, GenreRef, PageCursor, Participation, TrackedTable,
};
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::errors::CatalogError;
use crate::interfaces::CatalogRepository;
use crate::utils::validate_identifier;

#[derive(sqlx::FromRow)]
struct ChangedRowRecord {
    id: Uuid,
    updated_at: DateTime<Utc>,
}

impl From<ChangedRowRecord> for ChangedRow {
    fn from(record: ChangedRowRecord) -> Self {
        ChangedRow::new(record.id, record.updated_at)
    }
}

#[derive(sqlx::FromRow)]
struct AggregateRecord {
    id: Uuid,
    rating: Option<f64>,
    title: String,
    description: Option<String>,
    film_type: String,
    genres: Json<Vec<GenreRef>>,
    persons: Json<Vec<Participation>>,
}

impl TryFrom<AggregateRecord> for AggregateRow {
    type Error = CatalogError;

    fn try_from(record: AggregateRecord) -> Result<Self, Self::Error> {
        let film_type = record.film_type.parse().map_err(|e| {
            CatalogError::invalid_row(format!("film_work {}: {}", record.id, e))
        })?;

        Ok(AggregateRow {
            id: record.id,
            rating: record.rating,
            title: record.title,
            description: record.description,
            film_type,
            genres: record.genres.0,
            persons: record.persons.0,
        })
    }
}

/// PostgreSQL-backed catalog repository.
///
/// Reads the `film_work`, `genre`, `person` tables and their join tables from
/// a configurable schema.
pub struct PostgresCatalogRepository {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
    schema: String,
}

impl PostgresCatalogRepository {
    /// Creates a new PostgreSQL catalog repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    /// * `schema` - Schema holding the catalog tables (e.g. `content`)
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresCatalogRepository)` - Ready-to-use repository instance
    /// * `Err(CatalogError)` - If the schema name is not a plain identifier
    pub fn new(pool: sqlx::PgPool, schema: impl Into<String>) -> Result<Self, CatalogError> {
        let schema = schema.into();
        validate_identifier(&schema).map_err(CatalogError::InvalidIdentifier)?;
        Ok(Self { pool, schema })
    }

    fn changed_rows_sql(&self, table: TrackedTable, continuation: bool) -> String {
        let filter = if continuation {
            "(updated_at, id) > ($1, $2)"
        } else {
            "updated_at > $1"
        };
        let limit = if continuation { "$3" } else { "$2" };

        format!(
            "SELECT id, updated_at FROM {schema}.{table} WHERE {filter} \
             ORDER BY updated_at, id LIMIT {limit}",
            schema = self.schema,
            table = table.table_name(),
        )
    }

    fn films_referencing_sql(
        &self,
        link_table: &str,
        foreign_key: &str,
        continuation: bool,
    ) -> String {
        let (filter, limit) = if continuation {
            (" AND (fw.updated_at, fw.id) > ($2, $3)", "$4")
        } else {
            ("", "$2")
        };

        format!(
            "SELECT DISTINCT fw.id, fw.updated_at \
             FROM {schema}.film_work fw \
             JOIN {schema}.{link_table} lt ON lt.film_work_id = fw.id \
             WHERE lt.{foreign_key} = ANY($1){filter} \
             ORDER BY fw.updated_at, fw.id LIMIT {limit}",
            schema = self.schema,
        )
    }

    fn aggregate_rows_sql(&self) -> String {
        format!(
            "SELECT \
                fw.id, \
                fw.rating, \
                fw.title, \
                fw.description, \
                fw.type AS film_type, \
                COALESCE( \
                    json_agg(DISTINCT jsonb_build_object('id', g.id, 'name', g.name)) \
                        FILTER (WHERE g.id IS NOT NULL), \
                    '[]' \
                ) AS genres, \
                COALESCE( \
                    json_agg(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name, 'role', pfw.role)) \
                        FILTER (WHERE p.id IS NOT NULL), \
                    '[]' \
                ) AS persons \
             FROM {schema}.film_work fw \
             LEFT JOIN {schema}.person_film_work pfw ON pfw.film_work_id = fw.id \
             LEFT JOIN {schema}.person p ON p.id = pfw.person_id \
             LEFT JOIN {schema}.genre_film_work gfw ON gfw.film_work_id = fw.id \
             LEFT JOIN {schema}.genre g ON g.id = gfw.genre_id \
             WHERE fw.id = ANY($1) \
             GROUP BY fw.id \
             ORDER BY fw.updated_at, fw.id",
            schema = self.schema,
        )
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn changed_rows(
        &self,
        table: TrackedTable,
        cursor: &PageCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError> {
        let sql = self.changed_rows_sql(table, cursor.id.is_some());

        let mut query = sqlx::query_as::<_, ChangedRowRecord>(&sql).bind(cursor.updated_at);
        if let Some(id) = cursor.id {
            query = query.bind(id);
        }
        let records = query.bind(limit as i64).fetch_all(&self.pool).await?;

        debug!(table = %table, rows = records.len(), "Fetched changed rows");
        Ok(records.into_iter().map(ChangedRow::from).collect())
    }

    async fn films_referencing(
        &self,
        table: TrackedTable,
        child_ids: &[Uuid],
        cursor: Option<&PageCursor>,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError> {
        let (link_table, foreign_key) = table.link().ok_or_else(|| {
            CatalogError::InvalidIdentifier(format!("{} has no link to film_work", table))
        })?;
        if child_ids.is_empty() {
            return Ok(Vec::new());
        }

        let continuation = cursor.and_then(|c| c.id.map(|id| (c.updated_at, id)));
        let sql = self.films_referencing_sql(link_table, foreign_key, continuation.is_some());

        let mut query = sqlx::query_as::<_, ChangedRowRecord>(&sql).bind(child_ids);
        if let Some((updated_at, id)) = continuation {
            query = query.bind(updated_at).bind(id);
        }
        let records = query.bind(limit as i64).fetch_all(&self.pool).await?;

        debug!(
            table = %table,
            children = child_ids.len(),
            films = records.len(),
            "Fetched films referencing changed rows"
        );
        Ok(records.into_iter().map(ChangedRow::from).collect())
    }

    async fn aggregate_rows(&self, film_ids: &[Uuid]) -> Result<Vec<AggregateRow>, CatalogError> {
        if film_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = self.aggregate_rows_sql();
        let records = sqlx::query_as::<_, AggregateRecord>(&sql)
            .bind(film_ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(films = records.len(), "Fetched film aggregates");
        records.into_iter().map(AggregateRow::try_from).collect()
    }
}
