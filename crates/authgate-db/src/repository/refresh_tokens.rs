//! Refresh-token operations
//!
//! The store never sees a raw token: callers hash the token before
//! handing it over, and lookups compare digests only. Expiry is checked
//! by the caller; `find_refresh_token` deliberately returns
//! expired-but-unrevoked rows.

use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::{NewRefreshToken, RefreshToken};
use crate::repository::Database;

impl Database {
    // ==================== Refresh Token Operations ====================

    /// Store a new refresh-token record, revoking prior active records
    /// for the same `(user_id, app_name)` pair in the same transaction.
    ///
    /// This enforces the rotation invariant: at most one non-revoked
    /// row per principal/app at any time.
    pub async fn store_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshToken, DbError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // `IS` so a NULL app only matches other NULL-app rows
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = 1
            WHERE user_id = ? AND app_name IS ? AND revoked = 0
            "#,
        )
        .bind(token.user_id)
        .bind(&token.app_name)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, app_name, expires_at, created_at, revoked)
            VALUES (?, ?, ?, ?, ?, 0)
            RETURNING id
            "#,
        )
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(&token.app_name)
        .bind(token.expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        let id: i64 = result.get("id");
        tx.commit().await?;

        debug!("Stored refresh token for user {}", token.user_id);

        Ok(RefreshToken {
            id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            app_name: token.app_name,
            expires_at: token.expires_at,
            created_at: now,
            revoked: false,
        })
    }

    /// Look up a refresh-token record by its digest
    pub async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, app_name, expires_at, created_at, revoked
            FROM refresh_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| RefreshToken::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Revoke a refresh-token record.
    ///
    /// Compare-and-set on the `revoked` flag: returns `true` only for
    /// the caller that transitioned the row. Two rotations racing on
    /// the same token see exactly one `true`.
    pub async fn revoke_refresh_token(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = 1
            WHERE id = ? AND revoked = 0
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all refresh-token records (admin inspection)
    pub async fn list_refresh_tokens(&self) -> Result<Vec<RefreshToken>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, app_name, expires_at, created_at, revoked
            FROM refresh_tokens
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| RefreshToken::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Non-revoked records for a `(user, app)` pair
    pub async fn active_refresh_tokens(
        &self,
        user_id: i64,
        app_name: Option<&str>,
    ) -> Result<Vec<RefreshToken>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, app_name, expires_at, created_at, revoked
            FROM refresh_tokens
            WHERE user_id = ? AND app_name IS ? AND revoked = 0
            "#,
        )
        .bind(user_id)
        .bind(app_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| RefreshToken::try_from(row).map_err(DbError::from))
            .collect()
    }
}
