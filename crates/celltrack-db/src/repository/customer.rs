//! # Customer Repository
//!
//! Customers are buyers and, for trade-ins, the previous owners of phones
//! taken back into stock.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::{like_pattern, page_window, Page};
use crate::error::{DbError, DbResult};
use celltrack_core::validation::{non_blank, validate_customer};
use celltrack_core::{Customer, CustomerSummary, NewCustomer};

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.name, c.email, c.phone, c.address, c.dni, c.created_at,
           COUNT(s.id) AS total_purchases,
           COALESCE(SUM(s.sale_price_cents), 0) AS total_spent_cents
    FROM customers c
    LEFT JOIN sales s ON s.customer_id = c.id
"#;

/// Filters by name, email, phone or DNI when a search term is given.
const SEARCH_CLAUSE: &str = r#"
    WHERE (?1 IS NULL
        OR c.name LIKE ?1 ESCAPE '\'
        OR c.email LIKE ?1 ESCAPE '\'
        OR c.phone LIKE ?1 ESCAPE '\'
        OR c.dni LIKE ?1 ESCAPE '\')
"#;

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        validate_customer(customer)?;

        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, dni, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, name, email, phone, address, dni, created_at
            "#,
        )
        .bind(customer.name.trim())
        .bind(non_blank(customer.email.as_deref()))
        .bind(non_blank(customer.phone.as_deref()))
        .bind(non_blank(customer.address.as_deref()))
        .bind(non_blank(customer.dni.as_deref()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id = created.id, "Customer created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, customer: &NewCustomer) -> DbResult<Customer> {
        validate_customer(customer)?;

        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET name = ?2, email = ?3, phone = ?4, address = ?5, dni = ?6
            WHERE id = ?1
            RETURNING id, name, email, phone, address, dni, created_at
            "#,
        )
        .bind(id)
        .bind(customer.name.trim())
        .bind(non_blank(customer.email.as_deref()))
        .bind(non_blank(customer.phone.as_deref()))
        .bind(non_blank(customer.address.as_deref()))
        .bind(non_blank(customer.dni.as_deref()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, phone, address, dni, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// One customer with purchase count and total spent.
    pub async fn summary(&self, id: i64) -> DbResult<Option<CustomerSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE c.id = ?1 GROUP BY c.id");
        let summary = sqlx::query_as::<_, CustomerSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(summary)
    }

    /// Lists customers, newest first, with their purchase totals.
    ///
    /// ## Arguments
    /// * `search` - Optional term matched against name, email, phone and DNI
    /// * `page` - 1-based page number
    pub async fn list(&self, search: Option<&str>, page: i64, per_page: i64) -> DbResult<Page<CustomerSummary>> {
        let (page, per_page, offset) = page_window(page, per_page);
        let pattern = non_blank(search).map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM customers c {SEARCH_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{SUMMARY_SELECT} {SEARCH_CLAUSE} GROUP BY c.id ORDER BY c.created_at DESC, c.id DESC LIMIT ?2 OFFSET ?3"
        );
        let items = sqlx::query_as::<_, CustomerSummary>(&sql)
            .bind(pattern.as_deref())
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, per_page, total))
    }

    /// Customers for the sale form's picker, ordered by name.
    pub async fn all(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, phone, address, dni, created_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
