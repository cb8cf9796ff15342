//! PostgreSQL Audit Store
//!
//! Reads and writes the Inspektr audit trail layout (`COM_AUDIT_TRAIL`).
//! Timestamps are stored as `TIMESTAMP` in UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::TryStreamExt;
use sqlx::PgPool;

use crate::domain::entities::AuditEvent;
use crate::domain::repository::{AuditTrailRepository, FailureHistoryRepository};
use crate::domain::value_objects::FailureQuery;
use crate::error::{ThrottleError, ThrottleResult};

/// Default failure lookup.
///
/// Bind order: client IP, username, action code, application code,
/// cutoff. Replacement queries must use exactly these five parameters
/// and return the event timestamp as the first column, newest first.
/// Rows past the query's limit are never read.
pub const DEFAULT_FAILURE_QUERY: &str = r#"
    SELECT AUD_DATE
    FROM COM_AUDIT_TRAIL
    WHERE AUD_CLIENT_IP = $1
      AND AUD_USER = $2
      AND AUD_ACTION = $3
      AND APPLIC_CD = $4
      AND AUD_DATE >= $5
    ORDER BY AUD_DATE DESC
"#;

const FAILURE_QUERY_PARAMETERS: usize = 5;

/// PostgreSQL-backed audit store
#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
    failure_query: String,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            failure_query: DEFAULT_FAILURE_QUERY.to_string(),
        }
    }

    /// Replace the failure lookup statement (see [`DEFAULT_FAILURE_QUERY`])
    pub fn with_query(mut self, failure_query: impl Into<String>) -> ThrottleResult<Self> {
        let failure_query = failure_query.into();
        check_failure_query(&failure_query)?;
        self.failure_query = failure_query;
        Ok(self)
    }

    pub fn failure_query(&self) -> &str {
        &self.failure_query
    }
}

/// Reject statements that do not bind `$1..$5` exactly.
fn check_failure_query(sql: &str) -> ThrottleResult<()> {
    let placeholders = placeholder_indexes(sql);
    let complete = (1..=FAILURE_QUERY_PARAMETERS).all(|i| placeholders.contains(&i));
    let extra = placeholders
        .iter()
        .any(|i| *i == 0 || *i > FAILURE_QUERY_PARAMETERS);

    if !complete || extra {
        return Err(ThrottleError::InvalidConfig(
            "failure query must bind exactly $1..$5 \
             (client IP, username, action, application code, cutoff)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Positional `$n` parameters referenced by a statement
fn placeholder_indexes(sql: &str) -> Vec<usize> {
    let mut indexes = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if let Ok(index) = rest[..digits].parse::<usize>() {
            indexes.push(index);
        }
        rest = &rest[digits..];
    }
    indexes
}

/// Postgres `TIMESTAMP` cannot hold chrono's full range; earlier cutoffs
/// already cover every stored event.
fn bounded_cutoff(cutoff: DateTime<Utc>) -> NaiveDateTime {
    cutoff.max(DateTime::<Utc>::UNIX_EPOCH).naive_utc()
}

impl FailureHistoryRepository for PgAuditRepository {
    async fn find_recent_failures(
        &self,
        query: &FailureQuery,
    ) -> ThrottleResult<Vec<DateTime<Utc>>> {
        let mut rows = sqlx::query_scalar::<_, NaiveDateTime>(&self.failure_query)
            .bind(&query.client_ip)
            .bind(&query.username)
            .bind(&query.action_code)
            .bind(&query.application_code)
            .bind(bounded_cutoff(query.cutoff))
            .fetch(&self.pool);

        let mut failures = Vec::with_capacity(query.limit);
        while failures.len() < query.limit {
            match rows.try_next().await.map_err(ThrottleError::AuditQuery)? {
                Some(when) => failures.push(when.and_utc()),
                None => break,
            }
        }
        Ok(failures)
    }
}

impl AuditTrailRepository for PgAuditRepository {
    async fn record(&self, event: &AuditEvent) -> ThrottleResult<()> {
        sqlx::query(
            r#"
            INSERT INTO COM_AUDIT_TRAIL (
                AUD_USER,
                AUD_CLIENT_IP,
                AUD_SERVER_IP,
                AUD_RESOURCE,
                AUD_ACTION,
                APPLIC_CD,
                AUD_DATE
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&event.principal)
        .bind(&event.client_ip)
        .bind(&event.server_ip)
        .bind(&event.resource_operated_upon)
        .bind(&event.action_performed)
        .bind(&event.application_code)
        .bind(event.when.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(ThrottleError::AuditPersistence)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://audit@localhost/audit")
            .unwrap()
    }

    #[test]
    fn test_default_query_binds_five_parameters() {
        assert!(check_failure_query(DEFAULT_FAILURE_QUERY).is_ok());
        assert_eq!(placeholder_indexes(DEFAULT_FAILURE_QUERY), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_with_query_accepts_five_parameter_statement() {
        let sql = "SELECT AUD_DATE FROM COM_AUDIT_TRAIL \
                   WHERE AUD_CLIENT_IP = $1 AND AUD_USER = $2 AND AUD_ACTION = $3 \
                   AND APPLIC_CD = $4 AND AUD_DATE >= $5 ORDER BY AUD_DATE DESC";

        let repo = PgAuditRepository::new(lazy_pool()).with_query(sql).unwrap();
        assert_eq!(repo.failure_query(), sql);
    }

    #[tokio::test]
    async fn test_with_query_rejects_limit_parameter() {
        let sql = format!("{DEFAULT_FAILURE_QUERY} LIMIT $6");

        let result = PgAuditRepository::new(lazy_pool()).with_query(sql);
        assert!(matches!(result, Err(ThrottleError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_with_query_rejects_missing_parameter() {
        let sql = "SELECT AUD_DATE FROM COM_AUDIT_TRAIL \
                   WHERE AUD_CLIENT_IP = $1 AND AUD_USER = $2 AND AUD_DATE >= $5";

        let result = PgAuditRepository::new(lazy_pool()).with_query(sql);
        assert!(matches!(result, Err(ThrottleError::InvalidConfig(_))));
    }

    #[test]
    fn test_cutoff_is_bounded_for_postgres() {
        assert_eq!(
            bounded_cutoff(DateTime::<Utc>::MIN_UTC),
            DateTime::<Utc>::UNIX_EPOCH.naive_utc()
        );

        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(bounded_cutoff(cutoff), cutoff.naive_utc());
    }
}
