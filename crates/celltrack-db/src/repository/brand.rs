//! # Brand Repository
//!
//! Database operations for phone brands.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use celltrack_core::validation::validate_brand;
use celltrack_core::{Brand, NewBrand};

/// Repository for brand database operations.
#[derive(Debug, Clone)]
pub struct BrandRepository {
    pool: SqlitePool,
}

impl BrandRepository {
    /// Creates a new BrandRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BrandRepository { pool }
    }

    /// Lists brands ordered by name.
    ///
    /// ## Arguments
    /// * `active_only` - Skip brands that were switched off in the catalog
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            r#"
            SELECT id, name, is_active, created_at
            FROM brands
            WHERE (?1 = 0 OR is_active = 1)
            ORDER BY name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(brands)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            "SELECT id, name, is_active, created_at FROM brands WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Finds a brand by name, ignoring ASCII case.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            "SELECT id, name, is_active, created_at FROM brands WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Creates a brand.
    ///
    /// ## Returns
    /// * `Ok(Brand)` - The stored brand
    /// * `Err(DbError::UniqueViolation)` - A brand with that name exists
    pub async fn insert(&self, brand: &NewBrand) -> DbResult<Brand> {
        validate_brand(brand)?;
        let name = brand.name.trim();

        if self.get_by_name(name).await?.is_some() {
            return Err(DbError::duplicate("name", name));
        }

        let created = sqlx::query_as::<_, Brand>(
            r#"
            INSERT INTO brands (name, is_active, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, is_active, created_at
            "#,
        )
        .bind(name)
        .bind(brand.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id = created.id, name = %created.name, "Brand created");
        Ok(created)
    }

    /// Renames a brand or toggles whether it is active.
    pub async fn update(&self, id: i64, brand: &NewBrand) -> DbResult<Brand> {
        validate_brand(brand)?;
        let name = brand.name.trim();

        if let Some(other) = self.get_by_name(name).await? {
            if other.id != id {
                return Err(DbError::duplicate("name", name));
            }
        }

        let updated = sqlx::query_as::<_, Brand>(
            r#"
            UPDATE brands SET name = ?2, is_active = ?3
            WHERE id = ?1
            RETURNING id, name, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(brand.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Brand", id))?;

        debug!(id, "Brand updated");
        Ok(updated)
    }
}
