//! # Comment Repository
//!
//! Free-text notes attached to a phone. Staff add them by hand; status
//! changes and sales add them automatically, so a phone's comments double as
//! its history.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::Actor;
use crate::error::{DbError, DbResult};
use celltrack_core::validation::validate_comment;
use celltrack_core::PhoneComment;

/// Repository for phone comments.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommentRepository { pool }
    }

    /// Adds a comment to a phone.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No phone with that id
    pub async fn add(&self, phone_id: &str, actor: Actor<'_>, comment: &str) -> DbResult<PhoneComment> {
        validate_comment(comment)?;

        let mut conn = self.pool.acquire().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM phones WHERE id = ?1")
            .bind(phone_id)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Phone", phone_id));
        }

        let id = insert_comment(&mut *conn, phone_id, actor, comment.trim(), Utc::now()).await?;
        drop(conn);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("PhoneComment", id))
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<PhoneComment>> {
        let comment = sqlx::query_as::<_, PhoneComment>(
            r#"
            SELECT c.id, c.phone_id, c.user_id, u.username AS author, c.comment, c.created_at
            FROM phone_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Lists a phone's comments, newest first.
    pub async fn list_for_phone(&self, phone_id: &str) -> DbResult<Vec<PhoneComment>> {
        let comments = sqlx::query_as::<_, PhoneComment>(
            r#"
            SELECT c.id, c.phone_id, c.user_id, u.username AS author, c.comment, c.created_at
            FROM phone_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.phone_id = ?1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(phone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}

/// Writes a comment on an open connection or transaction.
pub(crate) async fn insert_comment(
    conn: &mut SqliteConnection,
    phone_id: &str,
    actor: Actor<'_>,
    comment: &str,
    at: DateTime<Utc>,
) -> DbResult<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO phone_comments (phone_id, user_id, comment, created_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(phone_id)
    .bind(actor.user_id)
    .bind(comment)
    .bind(at)
    .fetch_one(&mut *conn)
    .await?;

    debug!(phone_id, id, "Comment recorded");
    Ok(id)
}
