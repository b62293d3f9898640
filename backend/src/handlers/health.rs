//! Health check handlers
//!
//! Reports whether the pool reaches PostgreSQL and whether every ledger
//! migration has been applied. Anything short of that answers 503.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{AppState, MIGRATOR};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub migrations_applied: Option<i64>,
    pub migrations_expected: usize,
}

impl HealthResponse {
    /// Classify what the database told us
    pub fn from_probe(reachable: bool, applied: Option<i64>, expected: usize) -> Self {
        let status = match (reachable, applied) {
            (false, _) => "unavailable",
            (true, Some(n)) if n >= expected as i64 => "healthy",
            (true, _) => "degraded",
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: if reachable { "connected" } else { "disconnected" },
            migrations_applied: applied,
            migrations_expected: expected,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.status == "healthy" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Health check could not reach database: {}", e);
            false
        }
    };

    // Missing table means migrations never ran
    let applied = if reachable {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(&state.db)
            .await
            .ok()
    } else {
        None
    };

    let response = HealthResponse::from_probe(reachable, applied, MIGRATOR.migrations.len());
    (response.status_code(), Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_migrated_database_is_healthy() {
        let r = HealthResponse::from_probe(true, Some(3), 3);
        assert_eq!(r.status, "healthy");
        assert_eq!(r.status_code(), StatusCode::OK);
    }

    #[test]
    fn pending_migrations_are_degraded() {
        assert_eq!(HealthResponse::from_probe(true, Some(2), 3).status, "degraded");
        let r = HealthResponse::from_probe(true, None, 3);
        assert_eq!(r.status, "degraded");
        assert_eq!(r.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unreachable_database_is_unavailable() {
        let r = HealthResponse::from_probe(false, None, 3);
        assert_eq!(r.database, "disconnected");
        assert_eq!(r.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
