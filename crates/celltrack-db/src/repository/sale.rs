//! # Sale Repository
//!
//! Records sales and answers the sale lists.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        record_sale(request)                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. Re-read the phone and the customer                                │
//! │    2. plan_sale(): sellable? trade-in ok? payments add up?              │
//! │       A stock trade-in must not be credited on an earlier sale          │
//! │    3. Trade-in: insert the received handset, or use the stock phone     │
//! │    4. INSERT sales                                                      │
//! │    5. INSERT sale_payments (one row per line, in order)                 │
//! │    6. UPDATE phones SET status = 'sold'                                 │
//! │         WHERE status IN ('available', 'reserved')  ← 0 rows = abort     │
//! │    7. Audit comments on the sold phone (and the trade-in phone)         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error drops the transaction, which rolls everything back.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::comment::insert_comment;
use super::phone::{fetch_phone, insert_phone};
use super::{page_window, Actor, Page};
use crate::error::{DbError, DbResult};
use celltrack_core::sale::{plan_sale, validate_customer_ref};
use celltrack_core::{
    CoreError, Currency, PhoneListing, PhoneStatus, SaleListing, SalePayment, SaleRequest,
    TradeInPlan,
};

pub(crate) const SALE_SELECT: &str = r#"
    SELECT s.id, s.phone_id, s.customer_id, s.sale_price_cents, s.payment_method,
           s.is_picked_up, s.pickup_date, s.has_trade_in, s.trade_in_phone_id,
           s.trade_in_value_cents, s.sold_by, s.sale_date, s.notes,
           c.name AS customer_name, p.imei, b.name AS brand_name, m.name AS model_name,
           u.username AS sold_by_username
    FROM sales s
    JOIN customers c ON c.id = s.customer_id
    JOIN phones p ON p.id = s.phone_id
    JOIN phone_models m ON m.id = p.model_id
    JOIN brands b ON b.id = m.brand_id
    LEFT JOIN users u ON u.id = s.sold_by
"#;

/// A sale with everything its detail page and receipt show.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: SaleListing,
    pub final_price_cents: i64,
    pub payments: Vec<SalePayment>,
    pub trade_in_phone: Option<PhoneListing>,
    pub qr_payload: String,
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale atomically.
    ///
    /// ## Arguments
    /// * `request` - The sale form
    /// * `actor` - The employee making the sale (`sold_by`)
    ///
    /// ## Returns
    /// * `Ok(SaleDetail)` - The committed sale
    /// * `Err(DbError::NotFound)` - Unknown phone or customer
    /// * `Err(DbError::Rule(_))` - A sale rule failed; nothing was written
    /// * `Err(DbError::UniqueViolation)` - The trade-in IMEI is already stocked
    pub async fn record_sale(&self, request: &SaleRequest, actor: Actor<'_>) -> DbResult<SaleDetail> {
        validate_customer_ref(request.customer_id)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let phone = fetch_phone(&mut *tx, &request.phone_id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", &request.phone_id))?;

        let customer_name: String = sqlx::query_scalar("SELECT name FROM customers WHERE id = ?1")
            .bind(request.customer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", request.customer_id))?;

        let existing_trade_in = match request.trade_in.as_ref().and_then(|t| t.phone_id.as_deref()) {
            Some(id) => fetch_phone(&mut *tx, id).await?,
            None => None,
        };

        let plan = plan_sale(&phone, request, existing_trade_in.as_ref(), now)?;

        // A handset is credited once; later sales may sell it but not trade it in again.
        if let TradeInPlan::Existing { phone_id, .. } = &plan.trade_in {
            let credited: Option<String> = sqlx::query_scalar(
                "SELECT id FROM sales WHERE trade_in_phone_id = ?1 LIMIT 1",
            )
            .bind(phone_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(earlier) = credited {
                return Err(CoreError::trade_in(format!(
                    "phone {phone_id} was already credited as a trade-in on sale {earlier}"
                ))
                .into());
            }
        }

        let trade_in_phone_id = match &plan.trade_in {
            TradeInPlan::None => None,
            TradeInPlan::Existing { phone_id, .. } => Some(phone_id.clone()),
            TradeInPlan::New { draft, .. } => Some(insert_phone(&mut *tx, draft, actor, now).await?),
        };

        let sale_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, phone_id, customer_id, sale_price_cents, payment_method,
                is_picked_up, pickup_date, has_trade_in, trade_in_phone_id,
                trade_in_value_cents, sold_by, sale_date, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale_id)
        .bind(&plan.phone_id)
        .bind(plan.customer_id)
        .bind(plan.sale_price.cents())
        .bind(plan.payment_method)
        .bind(plan.is_picked_up)
        .bind(plan.pickup_date)
        .bind(trade_in_phone_id.is_some())
        .bind(trade_in_phone_id.as_deref())
        .bind(plan.trade_in.value().map(|v| v.cents()))
        .bind(actor.user_id)
        .bind(plan.sale_date)
        .bind(plan.notes.as_deref())
        .execute(&mut *tx)
        .await?;

        for (position, line) in plan.payments.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_payments (
                    sale_id, position, kind, currency, amount_cents,
                    installments, exchange_rate_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&sale_id)
            .bind(position as i64)
            .bind(line.kind)
            .bind(line.currency)
            .bind(line.amount_cents)
            .bind(line.installments)
            .bind(line.exchange_rate_cents)
            .execute(&mut *tx)
            .await?;
        }

        // Guards against a concurrent sale or status change since the read above.
        let result = sqlx::query(
            r#"
            UPDATE phones SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status IN ('available', 'reserved')
            "#,
        )
        .bind(&plan.phone_id)
        .bind(PhoneStatus::Sold)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            warn!(phone_id = %plan.phone_id, "Phone left the sellable statuses mid-sale");
            return Err(CoreError::PhoneNotSellable {
                imei: phone.imei.clone(),
                status: PhoneStatus::Sold.to_string(),
            }
            .into());
        }

        let comment = format!(
            "Vendido a {} por {} ({})",
            customer_name,
            actor.username,
            plan.final_price.format(Currency::Ars)
        );
        insert_comment(&mut *tx, &plan.phone_id, actor, &comment, now).await?;

        if let Some(trade_in_id) = &trade_in_phone_id {
            let comment = format!(
                "Recibido como parte de pago de {} (venta {})",
                customer_name, sale_id
            );
            insert_comment(&mut *tx, trade_in_id, actor, &comment, now).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            phone_id = %plan.phone_id,
            customer_id = plan.customer_id,
            final_price_cents = plan.final_price.cents(),
            method = %plan.payment_method,
            trade_in = trade_in_phone_id.is_some(),
            "Sale recorded"
        );

        self.get_detail(&sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale_id))
    }

    /// Marks a sale as picked up. The pickup date is kept from the first time.
    pub async fn mark_picked_up(&self, id: &str) -> DbResult<SaleListing> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET is_picked_up = 1, pickup_date = COALESCE(pickup_date, ?2)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        debug!(id, "Sale picked up");
        self.get(id).await?.ok_or_else(|| DbError::not_found("Sale", id))
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SaleListing>> {
        let sql = format!("{SALE_SELECT} WHERE s.id = ?1");
        let sale = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// The sale of a phone, if it was sold.
    pub async fn get_by_phone(&self, phone_id: &str) -> DbResult<Option<SaleListing>> {
        let sql = format!("{SALE_SELECT} WHERE s.phone_id = ?1");
        let sale = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(phone_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Payment lines of a sale in the order they were entered.
    pub async fn payments(&self, sale_id: &str) -> DbResult<Vec<SalePayment>> {
        let payments = sqlx::query_as::<_, SalePayment>(
            r#"
            SELECT id, sale_id, position, kind, currency, amount_cents,
                   installments, exchange_rate_cents
            FROM sale_payments
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get(id).await? else {
            return Ok(None);
        };

        let payments = self.payments(id).await?;

        let trade_in_phone = match sale.sale.trade_in_phone_id.as_deref() {
            Some(phone_id) => {
                let sql = format!("{} WHERE p.id = ?1", super::phone::PHONE_SELECT);
                sqlx::query_as::<_, PhoneListing>(&sql)
                    .bind(phone_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        Ok(Some(SaleDetail {
            final_price_cents: sale.sale.final_price().cents(),
            qr_payload: sale.qr_payload(),
            sale,
            payments,
            trade_in_phone,
        }))
    }

    /// Lists sales, newest first.
    pub async fn list(&self, page: i64, per_page: i64) -> DbResult<Page<SaleListing>> {
        let (page, per_page, offset) = page_window(page, per_page);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("{SALE_SELECT} ORDER BY s.sale_date DESC, s.id LIMIT ?1 OFFSET ?2");
        let items = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, per_page, total))
    }

    /// Sales with `start <= sale_date < end`, newest first.
    pub async fn list_by_period(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<Vec<SaleListing>> {
        let sql = format!(
            "{SALE_SELECT} WHERE s.sale_date >= ?1 AND s.sale_date < ?2 ORDER BY s.sale_date DESC"
        );
        let sales = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// A customer's purchases, newest first.
    pub async fn list_by_customer(&self, customer_id: i64) -> DbResult<Vec<SaleListing>> {
        let sql = format!("{SALE_SELECT} WHERE s.customer_id = ?1 ORDER BY s.sale_date DESC");
        let sales = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn recent(&self, limit: i64) -> DbResult<Vec<SaleListing>> {
        let sql = format!("{SALE_SELECT} ORDER BY s.sale_date DESC, s.id LIMIT ?1");
        let sales = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, IMEI_A, IMEI_B, IMEI_C};
    use celltrack_core::{
        PaymentKind, PaymentLine, PaymentMethod, PhoneCondition, PhoneDraft, TradeInRequest,
    };

    struct Counter {
        db: crate::Database,
        phone_id: String,
        customer_id: i64,
        user_id: i64,
    }

    async fn counter() -> Counter {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;
        let customer = fixtures::customer(&db, "Juan Pérez").await;
        let user = fixtures::user(&db, "empleado1").await;
        Counter {
            db,
            phone_id: phone.phone.id,
            customer_id: customer.id,
            user_id: user.id,
        }
    }

    impl Counter {
        fn actor(&self) -> Actor<'_> {
            Actor::new(self.user_id, "empleado1")
        }

        fn request(&self) -> SaleRequest {
            SaleRequest {
                phone_id: self.phone_id.clone(),
                customer_id: self.customer_id,
                ..Default::default()
            }
        }
    }

    #[tokio::test]
    async fn test_cash_sale_marks_phone_sold() {
        let c = counter().await;

        let detail = c.db.sales().record_sale(&c.request(), c.actor()).await.unwrap();

        assert_eq!(detail.sale.sale.sale_price_cents, 800_000_00);
        assert_eq!(detail.final_price_cents, 800_000_00);
        assert_eq!(detail.sale.sale.payment_method, PaymentMethod::Cash);
        assert_eq!(detail.sale.customer_name, "Juan Pérez");
        assert_eq!(detail.sale.sold_by_username.as_deref(), Some("empleado1"));
        assert!(!detail.sale.sale.has_trade_in);
        assert!(detail.payments.is_empty());
        assert!(detail.qr_payload.starts_with("SALE:"));

        let phone = c.db.phones().get(&c.phone_id).await.unwrap().unwrap();
        assert_eq!(phone.phone.status, PhoneStatus::Sold);

        let comments = c.db.comments().list_for_phone(&c.phone_id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].comment.starts_with("Vendido a Juan Pérez por empleado1"));
    }

    #[tokio::test]
    async fn test_phone_cannot_be_sold_twice() {
        let c = counter().await;
        c.db.sales().record_sale(&c.request(), c.actor()).await.unwrap();

        let err = c.db.sales().record_sale(&c.request(), c.actor()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::PhoneNotSellable { .. })));
        assert_eq!(c.db.sales().list(1, 20).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_reserved_phone_can_be_sold() {
        let c = counter().await;
        c.db.phones()
            .update_status(&c.phone_id, PhoneStatus::Reserved, c.actor())
            .await
            .unwrap();

        assert!(c.db.sales().record_sale(&c.request(), c.actor()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let c = counter().await;
        let mut request = c.request();
        request.customer_id = 404;

        let err = c.db.sales().record_sale(&request, c.actor()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mixed_payment_with_new_trade_in() {
        let c = counter().await;
        let model_id = c.db.phones().get(&c.phone_id).await.unwrap().unwrap().phone.model_id;

        let mut request = c.request();
        request.trade_in = Some(TradeInRequest {
            value_cents: 100_000_00,
            phone_id: None,
            new_phone: Some(PhoneDraft {
                model_id,
                imei: IMEI_B.to_string(),
                battery_percentage: Some(78),
                price_cents: Some(150_000_00),
                ..Default::default()
            }),
        });
        request.payment_method = Some(PaymentMethod::Mixed);
        request.payments = vec![
            PaymentLine::ars(PaymentKind::Cash, 200_000_00),
            PaymentLine::usd_cash(200_00, 1_000_00),
            PaymentLine::card(300_000_00, 6),
        ];

        let detail = c.db.sales().record_sale(&request, c.actor()).await.unwrap();

        assert_eq!(detail.final_price_cents, 700_000_00);
        assert!(detail.sale.sale.has_trade_in);
        assert_eq!(detail.sale.sale.trade_in_value_cents, Some(100_000_00));
        assert_eq!(detail.payments.len(), 3);
        assert_eq!(detail.payments[1].currency, Currency::Usd);
        assert_eq!(detail.payments[2].installments, Some(6));

        let trade_in = detail.trade_in_phone.unwrap();
        assert_eq!(trade_in.phone.imei, IMEI_B);
        assert_eq!(trade_in.phone.condition, PhoneCondition::TradeIn);
        assert_eq!(trade_in.phone.status, PhoneStatus::Available);
        assert_eq!(trade_in.phone.acquired_from, Some(c.customer_id));
    }

    #[tokio::test]
    async fn test_payments_must_cover_amount_due() {
        let c = counter().await;
        let mut request = c.request();
        request.payments = vec![PaymentLine::ars(PaymentKind::Cash, 500_000_00)];

        let err = c.db.sales().record_sale(&request, c.actor()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InvalidPayment { .. })));

        let phone = c.db.phones().get(&c.phone_id).await.unwrap().unwrap();
        assert_eq!(phone.phone.status, PhoneStatus::Available);
    }

    #[tokio::test]
    async fn test_trade_in_with_stocked_imei_rolls_back() {
        let c = counter().await;
        let model_id = c.db.phones().get(&c.phone_id).await.unwrap().unwrap().phone.model_id;
        fixtures::phone(&c.db, fixtures::new_phone(model_id, IMEI_C)).await;

        let mut request = c.request();
        request.trade_in = Some(TradeInRequest {
            value_cents: 50_000_00,
            phone_id: None,
            new_phone: Some(PhoneDraft {
                model_id,
                imei: IMEI_C.to_string(),
                battery_percentage: Some(60),
                ..Default::default()
            }),
        });

        let err = c.db.sales().record_sale(&request, c.actor()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(c.db.sales().list(1, 20).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_existing_trade_in_phone_is_linked() {
        let c = counter().await;
        let model_id = c.db.phones().get(&c.phone_id).await.unwrap().unwrap().phone.model_id;
        let used = fixtures::phone(&c.db, fixtures::used_phone(model_id, IMEI_B)).await;

        let mut request = c.request();
        request.trade_in = Some(TradeInRequest {
            value_cents: 300_000_00,
            phone_id: Some(used.phone.id.clone()),
            new_phone: None,
        });

        let detail = c.db.sales().record_sale(&request, c.actor()).await.unwrap();
        assert_eq!(detail.final_price_cents, 500_000_00);
        assert_eq!(
            detail.sale.sale.trade_in_phone_id.as_deref(),
            Some(used.phone.id.as_str())
        );
        assert_eq!(c.db.comments().list_for_phone(&used.phone.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stock_trade_in_is_credited_once() {
        let c = counter().await;
        let model_id = c.db.phones().get(&c.phone_id).await.unwrap().unwrap().phone.model_id;
        let used = fixtures::phone(&c.db, fixtures::used_phone(model_id, IMEI_B)).await;
        let second = fixtures::phone(&c.db, fixtures::new_phone(model_id, IMEI_C)).await;

        let trade_in = TradeInRequest {
            value_cents: 300_000_00,
            phone_id: Some(used.phone.id.clone()),
            new_phone: None,
        };
        let mut request = c.request();
        request.trade_in = Some(trade_in.clone());
        c.db.sales().record_sale(&request, c.actor()).await.unwrap();

        let mut again = c.request();
        again.phone_id = second.phone.id.clone();
        again.trade_in = Some(trade_in);
        let err = c.db.sales().record_sale(&again, c.actor()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InvalidTradeIn { .. })));

        let second = c.db.phones().get(&second.phone.id).await.unwrap().unwrap();
        assert_eq!(second.phone.status, PhoneStatus::Available);
        assert_eq!(c.db.sales().list(1, 20).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_pickup_date_written_once() {
        let c = counter().await;
        let detail = c.db.sales().record_sale(&c.request(), c.actor()).await.unwrap();
        let id = detail.sale.sale.id;
        assert_eq!(detail.sale.sale.pickup_date, None);

        let first = c.db.sales().mark_picked_up(&id).await.unwrap();
        assert!(first.sale.is_picked_up);
        let date = first.sale.pickup_date.unwrap();

        let second = c.db.sales().mark_picked_up(&id).await.unwrap();
        assert_eq!(second.sale.pickup_date, Some(date));

        let err = c.db.sales().mark_picked_up("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_customer_history_and_period() {
        let c = counter().await;
        c.db.sales().record_sale(&c.request(), c.actor()).await.unwrap();

        let purchases = c.db.sales().list_by_customer(c.customer_id).await.unwrap();
        assert_eq!(purchases.len(), 1);

        let summary = c.db.customers().summary(c.customer_id).await.unwrap().unwrap();
        assert_eq!(summary.total_purchases, 1);
        assert_eq!(summary.total_spent_cents, 800_000_00);

        let now = Utc::now();
        let day = chrono::Duration::days(1);
        assert_eq!(c.db.sales().list_by_period(now - day, now + day).await.unwrap().len(), 1);
        assert!(c.db.sales().list_by_period(now + day, now + day * 2).await.unwrap().is_empty());

        assert_eq!(
            c.db.sales().get_by_phone(&c.phone_id).await.unwrap().unwrap().customer_name,
            "Juan Pérez"
        );
    }
}
