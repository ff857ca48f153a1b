//! Repository for the `traces` table.

use llmscope_core::rules::sql::{SqlFilter, SqlParam};
use llmscope_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

use crate::models::trace::{CreateTrace, Trace, TraceListParams};

const COLUMNS: &str = "\
    id, org_id, trace_id, span_id, parent_span_id, timestamp, service_name, span_name, \
    duration_ms, status_code, attributes, created_at";

/// Status recorded when a span does not report one.
pub const DEFAULT_STATUS_CODE: &str = "UNSET";

pub struct TraceRepo;

impl TraceRepo {
    /// Insert a batch of spans in one transaction. Returns the number stored.
    pub async fn insert_batch(
        pool: &PgPool,
        org_id: Option<DbId>,
        spans: &[CreateTrace],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;
        for span in spans {
            let result = sqlx::query(
                "INSERT INTO traces \
                     (org_id, trace_id, span_id, parent_span_id, timestamp, service_name, \
                      span_name, duration_ms, status_code, attributes) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(org_id)
            .bind(&span.trace_id)
            .bind(&span.span_id)
            .bind(span.parent_span_id.as_deref())
            .bind(span.timestamp)
            .bind(&span.service_name)
            .bind(&span.span_name)
            .bind(span.duration_ms)
            .bind(span.status_code.as_deref().unwrap_or(DEFAULT_STATUS_CODE))
            .bind(Json(&span.attributes))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        tracing::debug!(org_id = ?org_id, inserted, "Trace batch stored");
        Ok(inserted)
    }

    /// Spans in the organisation, newest first, with optional filters.
    pub async fn list(
        pool: &PgPool,
        org_id: Option<DbId>,
        params: &TraceListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Trace>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM traces \
             WHERE org_id IS NOT DISTINCT FROM $1 \
               AND ($2::TEXT IS NULL OR trace_id = $2) \
               AND ($3::TEXT IS NULL OR service_name = $3) \
               AND ($4::TIMESTAMPTZ IS NULL OR timestamp >= $4) \
               AND ($5::TIMESTAMPTZ IS NULL OR timestamp < $5) \
             ORDER BY timestamp DESC, id DESC LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Trace>(&query)
            .bind(org_id)
            .bind(params.trace_id.as_deref())
            .bind(params.service_name.as_deref())
            .bind(params.from)
            .bind(params.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Spans whose `attributes` satisfy a compiled rule filter.
    ///
    /// The filter must have been compiled with `first_param = 2`; `$1` is the
    /// organisation and the pagination placeholders follow the filter's own.
    pub async fn list_matching(
        pool: &PgPool,
        org_id: Option<DbId>,
        filter: &SqlFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Trace>, sqlx::Error> {
        let next = filter.next_param(2);
        let query = format!(
            "SELECT {COLUMNS} FROM traces \
             WHERE org_id IS NOT DISTINCT FROM $1 AND {clause} \
             ORDER BY timestamp DESC, id DESC LIMIT ${next} OFFSET ${after}",
            clause = filter.clause,
            after = next + 1,
        );

        let mut q = sqlx::query_as::<_, Trace>(&query).bind(org_id);
        for param in &filter.params {
            q = bind_param(q, param);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }
}

fn bind_param<'q>(
    q: QueryAs<'q, Postgres, Trace, PgArguments>,
    param: &SqlParam,
) -> QueryAs<'q, Postgres, Trace, PgArguments> {
    match param {
        SqlParam::Text(s) => q.bind(s.clone()),
        SqlParam::Number(n) => q.bind(*n),
        SqlParam::TextList(items) => q.bind(items.clone()),
        SqlParam::NumberList(items) => q.bind(items.clone()),
    }
}
