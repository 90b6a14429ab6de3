//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, RoleName, UpdateUser, User};
use crate::repository::Database;

const USER_COLUMNS: &str = r#"
    u.id, u.email, u.name, u.password_hash, u.is_active,
    r.role AS role, u.created_at, u.updated_at
"#;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        // Check if user already exists
        let existing = self.get_user_by_email(&user.email).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(
                "A user with this email already exists".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash, is_active, role_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, (SELECT id FROM roles WHERE role = ?), ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: user.is_active,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by fingerprinted email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u JOIN roles r ON r.id = u.role_id
            WHERE u.email = ?
            "#,
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u JOIN roles r ON r.id = u.role_id
            WHERE u.id = ?
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u JOIN roles r ON r.id = u.role_id
            ORDER BY u.id
            "#,
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update user role
    pub async fn update_user_role(&self, id: i64, role: RoleName) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role_id = (SELECT id FROM roles WHERE role = ?), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update profile fields; `None` fields are left untouched
    pub async fn update_user(&self, id: i64, update: UpdateUser) -> Result<bool, DbError> {
        let now = Utc::now();

        if let Some(email) = &update.email {
            let existing = self.get_user_by_email(email).await?;
            if existing.as_ref().is_some_and(|u| u.id != id) {
                return Err(DbError::Duplicate(
                    "A user with this email already exists".to_string(),
                ));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE(?, email),
                name = COALESCE(?, name),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.email)
        .bind(&update.name)
        .bind(&update.password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user; refresh tokens cascade via the foreign key
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.bootstrap_roles().await.unwrap();
        db
    }

    fn new_user(email: &str, role: RoleName) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let db = test_db().await;
        let user = db
            .insert_user(new_user("fp-alice", RoleName::Reader))
            .await
            .unwrap();

        let by_email = db.get_user_by_email("fp-alice").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.role, RoleName::Reader);

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "fp-alice");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let db = test_db().await;
        db.insert_user(new_user("fp-bob", RoleName::Reader))
            .await
            .unwrap();

        let err = db
            .insert_user(new_user("fp-bob", RoleName::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn role_update() {
        let db = test_db().await;
        let user = db
            .insert_user(new_user("fp-carol", RoleName::Reader))
            .await
            .unwrap();

        assert!(db.update_user_role(user.id, RoleName::Admin).await.unwrap());
        let updated = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.role, RoleName::Admin);

        // Unknown user is reported, not silently ignored
        assert!(!db.update_user_role(9999, RoleName::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let db = test_db().await;
        let user = db
            .insert_user(new_user("fp-dave", RoleName::Reader))
            .await
            .unwrap();

        db.update_user(
            user.id,
            UpdateUser {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "fp-dave");
        assert_eq!(updated.password_hash, "$argon2id$fake");
    }

    #[tokio::test]
    async fn update_to_taken_email_is_a_conflict() {
        let db = test_db().await;
        db.insert_user(new_user("fp-eve", RoleName::Reader))
            .await
            .unwrap();
        let other = db
            .insert_user(new_user("fp-frank", RoleName::Reader))
            .await
            .unwrap();

        let err = db
            .update_user(
                other.id,
                UpdateUser {
                    email: Some("fp-eve".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }
}
