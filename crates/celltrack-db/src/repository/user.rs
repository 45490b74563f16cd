//! # User Repository
//!
//! Staff accounts. Passwords arrive here already hashed; see
//! [`crate::password`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use celltrack_core::validation::{non_blank, validate_username};
use celltrack_core::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, role, phone, is_active, password_hash, created_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Stores a new account.
    ///
    /// ## Arguments
    /// * `user` - Registration form; its plain `password` is ignored
    /// * `password_hash` - PHC string produced by the caller
    pub async fn insert(&self, user: &NewUser, password_hash: &str) -> DbResult<User> {
        let username = user.username.trim();
        validate_username(username)?;

        if self.get_by_username(username).await?.is_some() {
            return Err(DbError::duplicate("username", username));
        }

        let sql = format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, role, phone,
                               is_active, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(non_blank(user.email.as_deref()))
            .bind(non_blank(user.first_name.as_deref()))
            .bind(non_blank(user.last_name.as_deref()))
            .bind(user.role)
            .bind(non_blank(user.phone.as_deref()))
            .bind(password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(id = created.id, username = %created.username, role = %created.role, "User registered");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Finds an account by username, ignoring ASCII case.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Enables or disables login for an account.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<User> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, active, "User active flag changed");
        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use celltrack_core::Role;

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let db = fixtures::db().await;
        let created = db
            .users()
            .insert(
                &NewUser {
                    username: "admin".to_string(),
                    password: "ignored".to_string(),
                    email: Some("admin@celltrack.local".to_string()),
                    first_name: Some("Ada".to_string()),
                    last_name: Some("Admin".to_string()),
                    role: Role::Admin,
                    phone: None,
                },
                "hash",
            )
            .await
            .unwrap();

        assert!(created.is_active);
        assert_eq!(created.role, Role::Admin);
        assert_eq!(created.password_hash, "hash");

        let found = db.users().get_by_username("ADMIN").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.full_name(), "Ada Admin");
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = fixtures::db().await;
        fixtures::user(&db, "empleado1").await;

        let err = db
            .users()
            .insert(
                &NewUser {
                    username: "empleado1".to_string(),
                    ..Default::default()
                },
                "hash",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_user() {
        let db = fixtures::db().await;
        let user = fixtures::user(&db, "empleado1").await;

        let user = db.users().set_active(user.id, false).await.unwrap();
        assert!(!user.is_active);
        assert_eq!(db.users().list().await.unwrap().len(), 1);
    }
}
