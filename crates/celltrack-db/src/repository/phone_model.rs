//! # Phone Model Repository
//!
//! Models belong to a brand and carry the base price new stock defaults to.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use celltrack_core::validation::validate_phone_model;
use celltrack_core::{NewPhoneModel, PhoneModel};

const MODEL_SELECT: &str = r#"
    SELECT m.id, m.brand_id, b.name AS brand_name, m.name, m.base_price_cents,
           m.is_active, m.created_at
    FROM phone_models m
    JOIN brands b ON b.id = m.brand_id
"#;

/// Repository for phone model database operations.
#[derive(Debug, Clone)]
pub struct PhoneModelRepository {
    pool: SqlitePool,
}

impl PhoneModelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PhoneModelRepository { pool }
    }

    /// Lists models ordered by brand then name.
    ///
    /// ## Arguments
    /// * `brand_id` - Restrict to one brand (the cascading brand → model picker)
    /// * `active_only` - Skip inactive models and models of inactive brands
    pub async fn list(&self, brand_id: Option<i64>, active_only: bool) -> DbResult<Vec<PhoneModel>> {
        let sql = format!(
            r#"{MODEL_SELECT}
            WHERE (?1 IS NULL OR m.brand_id = ?1)
              AND (?2 = 0 OR (m.is_active = 1 AND b.is_active = 1))
            ORDER BY b.name, m.name
            "#
        );

        let models = sqlx::query_as::<_, PhoneModel>(&sql)
            .bind(brand_id)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(models)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<PhoneModel>> {
        let sql = format!("{MODEL_SELECT} WHERE m.id = ?1");
        let model = sqlx::query_as::<_, PhoneModel>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(model)
    }

    /// Creates a model under an existing brand.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - The brand doesn't exist
    /// * `Err(DbError::UniqueViolation)` - The brand already has a model with that name
    pub async fn insert(&self, model: &NewPhoneModel) -> DbResult<PhoneModel> {
        validate_phone_model(model)?;
        let name = model.name.trim();

        self.ensure_brand(model.brand_id).await?;
        self.ensure_unique_name(model.brand_id, name, None).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO phone_models (brand_id, name, base_price_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(model.brand_id)
        .bind(name)
        .bind(model.base_price_cents)
        .bind(model.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, brand_id = model.brand_id, name, "Phone model created");
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("PhoneModel", id))
    }

    /// Replaces a model's brand, name, base price and active flag.
    ///
    /// Existing phones keep their own price; only new stock picks up the
    /// changed base price.
    pub async fn update(&self, id: i64, model: &NewPhoneModel) -> DbResult<PhoneModel> {
        validate_phone_model(model)?;
        let name = model.name.trim();

        self.ensure_brand(model.brand_id).await?;
        self.ensure_unique_name(model.brand_id, name, Some(id)).await?;

        let result = sqlx::query(
            r#"
            UPDATE phone_models
            SET brand_id = ?2, name = ?3, base_price_cents = ?4, is_active = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(model.brand_id)
        .bind(name)
        .bind(model.base_price_cents)
        .bind(model.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PhoneModel", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("PhoneModel", id))
    }

    async fn ensure_brand(&self, brand_id: i64) -> DbResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM brands WHERE id = ?1")
            .bind(brand_id)
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Brand", brand_id))
    }

    async fn ensure_unique_name(&self, brand_id: i64, name: &str, except: Option<i64>) -> DbResult<()> {
        let clash: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM phone_models
            WHERE brand_id = ?1 AND name = ?2 COLLATE NOCASE
              AND (?3 IS NULL OR id != ?3)
            "#,
        )
        .bind(brand_id)
        .bind(name)
        .bind(except)
        .fetch_optional(&self.pool)
        .await?;

        match clash {
            Some(_) => Err(DbError::duplicate("name", name)),
            None => Ok(()),
        }
    }
}
