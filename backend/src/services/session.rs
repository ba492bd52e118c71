//! Anonymous sessions keyed by client IP address

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::SessionStat;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Session service for IP-keyed client sessions
#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub preferences: Json<serde_json::Value>,
    pub fields_count: i32,
    pub crops_count: i32,
    pub predictions_count: i32,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Session for `ip_address`, created on first contact and touched on reuse
    pub async fn create_or_get(
        &self,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> AppResult<UserSession> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            INSERT INTO user_sessions (ip_address, user_agent)
            VALUES ($1, $2)
            ON CONFLICT (ip_address) DO UPDATE
            SET last_active = NOW(),
                user_agent = COALESCE(EXCLUDED.user_agent, user_sessions.user_agent)
            RETURNING id, ip_address, user_agent, preferences, fields_count, crops_count,
                      predictions_count, created_at, last_active
            "#,
        )
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&self.db)
        .await?;

        tracing::debug!("Session {} for {}", session.id, ip_address);

        Ok(session)
    }

    /// Bump one of the per-session activity counters
    pub async fn record_activity(&self, session_id: Uuid, stat: SessionStat) -> AppResult<()> {
        let column = stat.column();
        let query = format!(
            "UPDATE user_sessions SET {column} = {column} + 1, last_active = NOW() WHERE id = $1"
        );

        sqlx::query(&query).bind(session_id).execute(&self.db).await?;

        Ok(())
    }
}
