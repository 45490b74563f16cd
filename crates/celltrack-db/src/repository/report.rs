//! # Report Repository
//!
//! Aggregation queries behind the dashboard and the admin reports page.
//!
//! ## Revenue
//! Revenue is `SUM(sale_price_cents)`: the ticket price before trade-in
//! credit. Month buckets come from the first seven characters of the stored
//! RFC 3339 `sale_date` (`YYYY-MM`), so everything is grouped in UTC.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::phone::PhoneRepository;
use super::sale::SaleRepository;
use crate::error::{DbError, DbResult};
use celltrack_core::report::{
    month_bounds, previous_month, twelve_months_before, year_month, CountBy, CustomerStats,
    Dashboard, InventoryStats, LowStockModel, ModelSales, MonthlyRevenue, ReportBundle,
    RevenueBucket, SalesStats, TopCustomer, TOP_N,
};
use celltrack_core::{PhoneStatus, RECENT_ITEMS};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub async fn inventory_stats(&self) -> DbResult<InventoryStats> {
        let total_phones: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phones")
            .fetch_one(&self.pool)
            .await?;

        let by_status = self.count_phones_by("p.status").await?;
        let by_condition = self.count_phones_by("p.condition").await?;

        let by_brand = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT b.name AS key, COUNT(*) AS count
            FROM phones p
            JOIN phone_models m ON m.id = p.model_id
            JOIN brands b ON b.id = m.brand_id
            GROUP BY b.id
            ORDER BY count DESC, b.name
            LIMIT ?1
            "#,
        )
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;

        Ok(InventoryStats {
            total_phones,
            by_status,
            by_condition,
            by_brand,
        })
    }

    async fn count_phones_by(&self, column: &str) -> DbResult<Vec<CountBy>> {
        let sql = format!(
            "SELECT {column} AS key, COUNT(*) AS count FROM phones p GROUP BY {column} ORDER BY count DESC, key"
        );
        let rows = sqlx::query_as::<_, CountBy>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Active models with at most `threshold` phones available, scarcest first.
    /// Models with no stock at all are included.
    pub async fn low_stock_models(&self, threshold: i64) -> DbResult<Vec<LowStockModel>> {
        let models = sqlx::query_as::<_, LowStockModel>(
            r#"
            SELECT m.id AS model_id, b.name AS brand_name, m.name AS model_name,
                   COUNT(p.id) AS available_count
            FROM phone_models m
            JOIN brands b ON b.id = m.brand_id
            LEFT JOIN phones p ON p.model_id = m.id AND p.status = 'available'
            WHERE m.is_active = 1
            GROUP BY m.id
            HAVING COUNT(p.id) <= ?1
            ORDER BY available_count, b.name, m.name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!(threshold, count = models.len(), "Low stock models");
        Ok(models)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Totals, the last twelve months by month, and the split by payment method.
    pub async fn sales_stats(&self, now: DateTime<Utc>) -> DbResult<SalesStats> {
        let (total_sales, total_revenue_cents): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(sale_price_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        let monthly = sqlx::query_as::<_, RevenueBucket>(
            r#"
            SELECT substr(sale_date, 1, 7) AS key, COUNT(*) AS count,
                   COALESCE(SUM(sale_price_cents), 0) AS revenue_cents
            FROM sales
            WHERE sale_date >= ?1
            GROUP BY key
            ORDER BY key
            "#,
        )
        .bind(twelve_months_before(now))
        .fetch_all(&self.pool)
        .await?;

        let by_payment_method = sqlx::query_as::<_, RevenueBucket>(
            r#"
            SELECT payment_method AS key, COUNT(*) AS count,
                   COALESCE(SUM(sale_price_cents), 0) AS revenue_cents
            FROM sales
            GROUP BY payment_method
            ORDER BY revenue_cents DESC, key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesStats {
            total_sales,
            total_revenue_cents,
            monthly,
            by_payment_method,
        })
    }

    /// Revenue of the calendar month containing `now` against the month before.
    pub async fn monthly_revenue(&self, now: DateTime<Utc>) -> DbResult<MonthlyRevenue> {
        let (year, month) = year_month(now);
        let (current, _) = self.month_totals(year, month).await?;
        let (py, pm) = previous_month(year, month);
        let (previous, _) = self.month_totals(py, pm).await?;

        Ok(MonthlyRevenue::new(current, previous))
    }

    /// `(revenue_cents, sale_count)` of one calendar month.
    async fn month_totals(&self, year: i32, month: u32) -> DbResult<(i64, i64)> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| DbError::Internal(format!("invalid month {year}-{month}")))?;

        let totals: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(sale_price_cents), 0), COUNT(*)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn top_selling_models(&self, limit: i64) -> DbResult<Vec<ModelSales>> {
        let models = sqlx::query_as::<_, ModelSales>(
            r#"
            SELECT m.id AS model_id, b.name AS brand_name, m.name AS model_name,
                   COUNT(s.id) AS sales_count
            FROM sales s
            JOIN phones p ON p.id = s.phone_id
            JOIN phone_models m ON m.id = p.model_id
            JOIN brands b ON b.id = m.brand_id
            GROUP BY m.id
            ORDER BY sales_count DESC, b.name, m.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(models)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn customer_stats(&self) -> DbResult<CustomerStats> {
        let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        let top_customers = sqlx::query_as::<_, TopCustomer>(
            r#"
            SELECT c.id AS customer_id, c.name, COUNT(s.id) AS purchase_count,
                   COALESCE(SUM(s.sale_price_cents), 0) AS total_spent_cents
            FROM customers c
            JOIN sales s ON s.customer_id = c.id
            GROUP BY c.id
            ORDER BY total_spent_cents DESC, c.name
            LIMIT ?1
            "#,
        )
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;

        Ok(CustomerStats {
            total_customers,
            top_customers,
        })
    }

    // =========================================================================
    // Composite
    // =========================================================================

    /// Home screen: phones per status, this month's sales, recent activity.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> DbResult<Dashboard> {
        let counts = self.count_phones_by("p.status").await?;
        let count_of = |status: PhoneStatus| {
            counts
                .iter()
                .find(|c| c.key == status.as_str())
                .map_or(0, |c| c.count)
        };

        let (year, month) = year_month(now);
        let (month_revenue_cents, month_sales) = self.month_totals(year, month).await?;

        let recent_phones = PhoneRepository::new(self.pool.clone())
            .recent(RECENT_ITEMS)
            .await?;
        let recent_sales = SaleRepository::new(self.pool.clone())
            .recent(RECENT_ITEMS)
            .await?;

        Ok(Dashboard {
            available: count_of(PhoneStatus::Available),
            reserved: count_of(PhoneStatus::Reserved),
            sold: count_of(PhoneStatus::Sold),
            service: count_of(PhoneStatus::Service),
            in_transit: count_of(PhoneStatus::InTransit),
            warehouse: count_of(PhoneStatus::Warehouse),
            month_sales,
            month_revenue_cents,
            recent_phones,
            recent_sales,
        })
    }

    /// Everything on the admin reports page.
    pub async fn bundle(&self, now: DateTime<Utc>) -> DbResult<ReportBundle> {
        Ok(ReportBundle {
            inventory: self.inventory_stats().await?,
            sales: self.sales_stats(now).await?,
            monthly_revenue: self.monthly_revenue(now).await?,
            top_models: self.top_selling_models(TOP_N).await?,
            customers: self.customer_stats().await?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, IMEI_A, IMEI_B, IMEI_C};
    use crate::repository::Actor;
    use celltrack_core::SaleRequest;

    /// Two Galaxy phones and one iPhone; one Galaxy sold to Juan.
    async fn shop() -> crate::Database {
        let db = fixtures::db().await;
        let galaxy = fixtures::galaxy(&db).await;
        let apple = fixtures::brand(&db, "Apple").await;
        let iphone = fixtures::model(&db, apple.id, "iPhone 14", 1_200_000_00).await;

        let sold = fixtures::phone(&db, fixtures::new_phone(galaxy.id, IMEI_A)).await;
        fixtures::phone(&db, fixtures::new_phone(galaxy.id, IMEI_B)).await;
        fixtures::phone(&db, fixtures::used_phone(iphone.id, IMEI_C)).await;
        let juan = fixtures::customer(&db, "Juan").await;
        fixtures::customer(&db, "Ana").await;

        db.sales()
            .record_sale(
                &SaleRequest {
                    phone_id: sold.phone.id,
                    customer_id: juan.id,
                    ..Default::default()
                },
                Actor::system(),
            )
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_inventory_stats() {
        let db = shop().await;
        let stats = db.reports().inventory_stats().await.unwrap();

        assert_eq!(stats.total_phones, 3);
        let available = stats.by_status.iter().find(|c| c.key == "available").unwrap();
        assert_eq!(available.count, 2);
        assert_eq!(stats.by_brand[0].key, "Samsung");
        assert_eq!(stats.by_brand[0].count, 2);
    }

    #[tokio::test]
    async fn test_sales_stats_and_monthly_revenue() {
        let db = shop().await;
        let now = Utc::now();

        let stats = db.reports().sales_stats(now).await.unwrap();
        assert_eq!(stats.total_sales, 1);
        assert_eq!(stats.total_revenue_cents, 800_000_00);
        assert_eq!(stats.monthly.len(), 1);
        assert_eq!(stats.monthly[0].key, now.format("%Y-%m").to_string());
        assert_eq!(stats.by_payment_method[0].key, "cash");

        let monthly = db.reports().monthly_revenue(now).await.unwrap();
        assert_eq!(monthly.current_month_cents, 800_000_00);
        assert_eq!(monthly.previous_month_cents, 0);
        assert_eq!(monthly.change_percent, 100.0);
    }

    #[tokio::test]
    async fn test_top_models_and_customers() {
        let db = shop().await;

        let models = db.reports().top_selling_models(TOP_N).await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].model_name, "Galaxy S23");
        assert_eq!(models[0].sales_count, 1);

        let customers = db.reports().customer_stats().await.unwrap();
        assert_eq!(customers.total_customers, 2);
        assert_eq!(customers.top_customers.len(), 1);
        assert_eq!(customers.top_customers[0].name, "Juan");
    }

    #[tokio::test]
    async fn test_low_stock_includes_empty_models() {
        let db = shop().await;
        let moto = fixtures::brand(&db, "Motorola").await;
        fixtures::model(&db, moto.id, "Moto G100", 500_000_00).await;

        let low = db.reports().low_stock_models(1).await.unwrap();
        let names: Vec<_> = low.iter().map(|m| m.model_name.as_str()).collect();
        assert_eq!(names, vec!["Moto G100", "iPhone 14", "Galaxy S23"]);
        assert_eq!(low[0].available_count, 0);

        let low = db.reports().low_stock_models(0).await.unwrap();
        assert_eq!(low.len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let db = shop().await;
        let dashboard = db.reports().dashboard(Utc::now()).await.unwrap();

        assert_eq!(dashboard.available, 2);
        assert_eq!(dashboard.sold, 1);
        assert_eq!(dashboard.reserved, 0);
        assert_eq!(dashboard.month_sales, 1);
        assert_eq!(dashboard.month_revenue_cents, 800_000_00);
        assert_eq!(dashboard.recent_phones.len(), 3);
        assert_eq!(dashboard.recent_sales.len(), 1);
    }
}
