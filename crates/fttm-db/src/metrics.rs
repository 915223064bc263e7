//! Database operations for the metric tables (`ga_traffic`, `ads_metrics`,
//! `agent_postings`, `google_index`, `semrush_rank`).
//!
//! All five tables share one shape: a text `brand`, one or two `DATE` key
//! columns and a handful of `BIGINT` values. Statements are generated from
//! the [`MetricKind`] column lists so every kind goes through the same
//! batched lookup, upsert, and list paths.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use fttm_core::{
    AdsRecord, IndexRecord, ListQuery, MetricKind, MetricRecord, NaturalKey, PostingsRecord,
    RankRecord, TrafficRecord, UpsertCounts,
};
use sqlx::{postgres::PgRow, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `ga_traffic` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrafficRow {
    pub id: i64,
    pub brand: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub users: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `ads_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdsRow {
    pub id: i64,
    pub brand: String,
    pub date: NaiveDate,
    pub clicks: i64,
    pub impressions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `agent_postings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostingsRow {
    pub id: i64,
    pub brand: String,
    pub date: NaiveDate,
    pub total_listings: i64,
    pub sale_listings: i64,
    pub rent_listings: i64,
    pub auction_listings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `google_index` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IndexRow {
    pub id: i64,
    pub brand: String,
    pub date: NaiveDate,
    pub indexed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `semrush_rank` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankRow {
    pub id: i64,
    pub brand: String,
    pub date: NaiveDate,
    pub rank: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TrafficRow> for MetricRecord {
    fn from(row: TrafficRow) -> Self {
        MetricRecord::Traffic(TrafficRecord {
            brand: row.brand,
            start_date: row.start_date,
            end_date: row.end_date,
            users: row.users,
        })
    }
}

impl From<AdsRow> for MetricRecord {
    fn from(row: AdsRow) -> Self {
        MetricRecord::Ads(AdsRecord {
            brand: row.brand,
            date: row.date,
            clicks: row.clicks,
            impressions: row.impressions,
        })
    }
}

impl From<PostingsRow> for MetricRecord {
    fn from(row: PostingsRow) -> Self {
        MetricRecord::Postings(PostingsRecord {
            brand: row.brand,
            date: row.date,
            total_listings: row.total_listings,
            sale_listings: row.sale_listings,
            rent_listings: row.rent_listings,
            auction_listings: row.auction_listings,
        })
    }
}

impl From<IndexRow> for MetricRecord {
    fn from(row: IndexRow) -> Self {
        MetricRecord::Index(IndexRecord {
            brand: row.brand,
            date: row.date,
            indexed: row.indexed,
        })
    }
}

impl From<RankRow> for MetricRecord {
    fn from(row: RankRow) -> Self {
        MetricRecord::Rank(RankRecord {
            brand: row.brand,
            date: row.date,
            rank: row.rank,
        })
    }
}

// ---------------------------------------------------------------------------
// Statement builders
// ---------------------------------------------------------------------------

fn quoted(column: &str) -> String {
    format!("\"{column}\"")
}

fn array_cast(column: &str) -> &'static str {
    match column {
        "brand" => "text[]",
        "date" | "start_date" | "end_date" => "date[]",
        _ => "bigint[]",
    }
}

fn select_list(kind: MetricKind) -> String {
    std::iter::once("id")
        .chain(kind.expected_columns())
        .chain(["created_at", "updated_at"])
        .map(|c| format!("m.{}", quoted(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parameter list `$1::text[], $2::date[], …` for `columns`.
fn unnest_params(columns: &[&str]) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("${}::{}", i + 1, array_cast(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Batched composite-key lookup: joins the table against one `UNNEST` row
/// per requested key.
pub(crate) fn lookup_sql(kind: MetricKind) -> String {
    let keys = kind.key_columns();
    let alias = keys.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    let on = keys
        .iter()
        .map(|c| format!("m.{0} = k.{0}", quoted(c)))
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "SELECT {} FROM {} m JOIN UNNEST({}) AS k({alias}) ON {on}",
        select_list(kind),
        kind.table(),
        unnest_params(keys),
    )
}

/// Batched upsert: one `INSERT … SELECT FROM UNNEST … ON CONFLICT` statement
/// that replaces every value column of an existing key.
pub(crate) fn upsert_sql(kind: MetricKind) -> String {
    let columns = kind.expected_columns();
    let column_list = columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    let conflict = kind
        .key_columns()
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = kind
        .int_columns()
        .iter()
        .map(|c| format!("{0} = EXCLUDED.{0}", quoted(c)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({column_list}) SELECT * FROM UNNEST({}) \
         ON CONFLICT ({conflict}) DO UPDATE SET {updates}, \"updated_at\" = NOW() \
         RETURNING (xmax = 0) AS is_new",
        kind.table(),
        unnest_params(&columns),
    )
}

/// Filtered listing. `NULL` parameters disable their filter; `LIMIT NULL`
/// returns every row.
pub(crate) fn list_sql(kind: MetricKind, descending: bool) -> String {
    let order = quoted(kind.order_column());
    let dir = if descending { "DESC" } else { "ASC" };

    format!(
        "SELECT {} FROM {} m \
         WHERE ($1::text IS NULL OR m.\"brand\" = $1) \
         AND ($2::date IS NULL OR m.{order} >= $2) \
         AND ($3::date IS NULL OR m.{order} <= $3) \
         ORDER BY m.{order} {dir}, m.\"brand\" {dir} \
         LIMIT $4",
        select_list(kind),
        kind.table(),
    )
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

fn key_matches_kind(kind: MetricKind, key: &NaturalKey) -> bool {
    (kind == MetricKind::Traffic) == key.end_date.is_some()
}

/// Splits keys into parallel `brand` and date-column vectors for `UNNEST`.
fn key_columns(
    kind: MetricKind,
    keys: &[&NaturalKey],
) -> Result<(Vec<String>, Vec<Vec<NaiveDate>>), DbError> {
    if let Some(bad) = keys.iter().find(|k| !key_matches_kind(kind, k)) {
        return Err(DbError::InvalidBatch(format!(
            "key {bad} does not fit the {kind} schema"
        )));
    }

    let brands = keys.iter().map(|k| k.brand.clone()).collect();
    let mut dates = vec![keys.iter().map(|k| k.date).collect::<Vec<_>>()];
    if kind == MetricKind::Traffic {
        dates.push(keys.iter().filter_map(|k| k.end_date).collect());
    }
    Ok((brands, dates))
}

// ---------------------------------------------------------------------------
// Typed fetch helpers
// ---------------------------------------------------------------------------

async fn fetch_keyed<R>(
    pool: &PgPool,
    sql: &str,
    brands: &[String],
    dates: &[Vec<NaiveDate>],
) -> Result<Vec<MetricRecord>, sqlx::Error>
where
    R: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin + Into<MetricRecord>,
{
    let mut query = sqlx::query_as::<_, R>(sql).bind(brands);
    for column in dates {
        query = query.bind(column);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

async fn fetch_listed<R>(
    pool: &PgPool,
    sql: &str,
    query: &ListQuery,
) -> Result<Vec<MetricRecord>, sqlx::Error>
where
    R: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin + Into<MetricRecord>,
{
    let rows = sqlx::query_as::<_, R>(sql)
        .bind(query.brand.as_deref())
        .bind(query.range.map(|r| r.start))
        .bind(query.range.map(|r| r.end))
        .bind(query.limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

/// Returns stored rows whose natural key matches any of `keys`.
///
/// Repeated keys are collapsed before binding, so each stored row is
/// returned at most once. The whole lookup is a single round-trip.
///
/// # Errors
///
/// Returns [`DbError::InvalidBatch`] if a key does not fit the kind's schema
/// or [`DbError::Sqlx`] if the query fails.
pub async fn find_existing_records(
    pool: &PgPool,
    kind: MetricKind,
    keys: &[NaturalKey],
) -> Result<Vec<MetricRecord>, DbError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let unique: Vec<&NaturalKey> = keys.iter().collect::<BTreeSet<_>>().into_iter().collect();
    let (brands, dates) = key_columns(kind, &unique)?;
    let sql = lookup_sql(kind);

    let records = match kind {
        MetricKind::Traffic => fetch_keyed::<TrafficRow>(pool, &sql, &brands, &dates).await?,
        MetricKind::Ads => fetch_keyed::<AdsRow>(pool, &sql, &brands, &dates).await?,
        MetricKind::Postings => fetch_keyed::<PostingsRow>(pool, &sql, &brands, &dates).await?,
        MetricKind::Index => fetch_keyed::<IndexRow>(pool, &sql, &brands, &dates).await?,
        MetricKind::Rank => fetch_keyed::<RankRow>(pool, &sql, &brands, &dates).await?,
    };

    Ok(records)
}

/// Upserts a batch of records of one kind in a single statement.
///
/// Conflicts on the kind's natural key replace every value column and bump
/// `updated_at`. Returns how many rows were inserted versus updated, using
/// `xmax = 0` to tell fresh inserts apart.
///
/// # Errors
///
/// Returns [`DbError::InvalidBatch`] if a record is of another kind or a key
/// repeats within the batch, or [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_records(
    pool: &PgPool,
    kind: MetricKind,
    records: &[MetricRecord],
) -> Result<UpsertCounts, DbError> {
    if records.is_empty() {
        return Ok(UpsertCounts::default());
    }

    fttm_core::store::ensure_kind(kind, records)
        .map_err(|e| DbError::InvalidBatch(e.message))?;

    let keys: Vec<NaturalKey> = records.iter().map(MetricRecord::key).collect();
    let mut seen = BTreeSet::new();
    if let Some(repeated) = keys.iter().find(|k| !seen.insert(*k)) {
        return Err(DbError::InvalidBatch(format!(
            "key {repeated} appears more than once in one batch"
        )));
    }

    let key_refs: Vec<&NaturalKey> = keys.iter().collect();
    let (brands, dates) = key_columns(kind, &key_refs)?;

    let value_count = kind.int_columns().len();
    let mut values: Vec<Vec<i64>> = vec![Vec::with_capacity(records.len()); value_count];
    for record in records {
        for (column, (_, value)) in values.iter_mut().zip(record.values()) {
            column.push(value);
        }
    }

    let sql = upsert_sql(kind);
    let mut query = sqlx::query_scalar::<_, bool>(&sql).bind(&brands);
    for column in &dates {
        query = query.bind(column);
    }
    for column in &values {
        query = query.bind(column);
    }
    let rows: Vec<bool> = query.fetch_all(pool).await?;

    let inserted = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated = rows.len() as u64 - inserted;

    Ok(UpsertCounts { inserted, updated })
}

/// Lists rows of one kind with optional brand/date filters, ordering, and limit.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_records(
    pool: &PgPool,
    kind: MetricKind,
    query: &ListQuery,
) -> Result<Vec<MetricRecord>, DbError> {
    let sql = list_sql(kind, query.descending);

    let records = match kind {
        MetricKind::Traffic => fetch_listed::<TrafficRow>(pool, &sql, query).await?,
        MetricKind::Ads => fetch_listed::<AdsRow>(pool, &sql, query).await?,
        MetricKind::Postings => fetch_listed::<PostingsRow>(pool, &sql, query).await?,
        MetricKind::Index => fetch_listed::<IndexRow>(pool, &sql, query).await?,
        MetricKind::Rank => fetch_listed::<RankRow>(pool, &sql, query).await?,
    };

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_sql_joins_on_every_key_column() {
        assert_eq!(
            lookup_sql(MetricKind::Ads),
            "SELECT m.\"id\", m.\"brand\", m.\"date\", m.\"clicks\", m.\"impressions\", \
             m.\"created_at\", m.\"updated_at\" FROM ads_metrics m \
             JOIN UNNEST($1::text[], $2::date[]) AS k(\"brand\", \"date\") \
             ON m.\"brand\" = k.\"brand\" AND m.\"date\" = k.\"date\""
        );
    }

    #[test]
    fn lookup_sql_for_traffic_uses_window_key() {
        let sql = lookup_sql(MetricKind::Traffic);
        assert!(sql.contains("UNNEST($1::text[], $2::date[], $3::date[])"));
        assert!(sql.contains("m.\"end_date\" = k.\"end_date\""));
    }

    #[test]
    fn upsert_sql_replaces_all_value_columns() {
        let sql = upsert_sql(MetricKind::Postings);
        assert!(sql.starts_with(
            "INSERT INTO agent_postings (\"brand\", \"date\", \"total_listings\", \
             \"sale_listings\", \"rent_listings\", \"auction_listings\") \
             SELECT * FROM UNNEST($1::text[], $2::date[], $3::bigint[], $4::bigint[], \
             $5::bigint[], $6::bigint[])"
        ));
        assert!(sql.contains("ON CONFLICT (\"brand\", \"date\") DO UPDATE SET"));
        for column in MetricKind::Postings.int_columns() {
            assert!(sql.contains(&format!("\"{column}\" = EXCLUDED.\"{column}\"")));
        }
        assert!(sql.ends_with("RETURNING (xmax = 0) AS is_new"));
    }

    #[test]
    fn upsert_sql_conflicts_on_traffic_window() {
        let sql = upsert_sql(MetricKind::Traffic);
        assert!(sql.contains("ON CONFLICT (\"brand\", \"start_date\", \"end_date\")"));
        assert!(!sql.contains("\"start_date\" = EXCLUDED"));
    }

    #[test]
    fn list_sql_orders_by_kind_column() {
        let sql = list_sql(MetricKind::Traffic, true);
        assert!(sql.contains("ORDER BY m.\"end_date\" DESC, m.\"brand\" DESC"));
        assert!(sql.contains("m.\"end_date\" >= $2"));
        let sql = list_sql(MetricKind::Rank, false);
        assert!(sql.contains("ORDER BY m.\"date\" ASC"));
        assert!(sql.ends_with("LIMIT $4"));
    }

    #[test]
    fn key_columns_rejects_shape_mismatch() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dated = NaturalKey::dated("FindHouse", date);
        let window = NaturalKey::window("FindHouse", date, date);

        assert!(key_columns(MetricKind::Ads, &[&dated]).is_ok());
        assert!(key_columns(MetricKind::Ads, &[&window]).is_err());
        assert!(key_columns(MetricKind::Traffic, &[&dated]).is_err());

        let (brands, dates) = key_columns(MetricKind::Traffic, &[&window]).unwrap();
        assert_eq!(brands, vec!["FindHouse".to_string()]);
        assert_eq!(dates.len(), 2);
    }
}
