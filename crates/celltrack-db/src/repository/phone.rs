//! # Phone Repository
//!
//! Inventory: one row per physical handset, keyed by a UUID and unique by IMEI.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert ──► available ◄──► reserved / service / in_transit / warehouse  │
//! │                 │             (update_status, audit comment each time)  │
//! │                 │                                                       │
//! │                 └──── record_sale (SaleRepository) ────► sold           │
//! │                                                          (terminal)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Search
//! `list` matches the search term with LIKE against IMEI, internal code,
//! model, brand, color and storage. SQLite's LIKE ignores ASCII case, so
//! "galaxy" finds "Galaxy S23".

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::comment::insert_comment;
use super::{like_pattern, page_window, Actor, Page};
use crate::error::{DbError, DbResult};
use celltrack_core::imei::normalize_imei;
use celltrack_core::sale::check_manual_status_change;
use celltrack_core::search::{parse_search_query, SearchQuery};
use celltrack_core::validation::{non_blank, validate_phone_draft};
use celltrack_core::{Phone, PhoneCondition, PhoneDraft, PhoneListing, PhoneStatus};

pub(crate) const PHONE_SELECT: &str = r#"
    SELECT p.id, p.internal_code, p.model_id, p.imei, p.status, p.condition,
           p.price_cents, p.storage_capacity, p.color, p.battery_percentage,
           p.acquisition_type, p.acquired_from, p.notes, p.added_by,
           p.created_at, p.updated_at,
           b.name AS brand_name, m.name AS model_name
    FROM phones p
    JOIN phone_models m ON m.id = p.model_id
    JOIN brands b ON b.id = m.brand_id
"#;

const PHONE_FROM: &str = r#"
    FROM phones p
    JOIN phone_models m ON m.id = p.model_id
    JOIN brands b ON b.id = m.brand_id
"#;

// =============================================================================
// Filter
// =============================================================================

/// Inventory list filter.
///
/// Sold phones are hidden unless `include_sold` is set or `status` asks for
/// them explicitly.
#[derive(Debug, Clone, Default)]
pub struct PhoneFilter {
    pub search: Option<String>,
    pub status: Option<PhoneStatus>,
    pub condition: Option<PhoneCondition>,
    pub model_id: Option<i64>,
    pub include_sold: bool,
}

impl PhoneFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: PhoneStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn condition(mut self, condition: PhoneCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        match self.status {
            Some(status) => {
                qb.push(" AND p.status = ").push_bind(status);
            }
            None if !self.include_sold => {
                qb.push(" AND p.status != ").push_bind(PhoneStatus::Sold);
            }
            None => {}
        }

        if let Some(condition) = self.condition {
            qb.push(" AND p.condition = ").push_bind(condition);
        }

        if let Some(model_id) = self.model_id {
            qb.push(" AND p.model_id = ").push_bind(model_id);
        }

        if let Some(term) = non_blank(self.search.as_deref()) {
            let pattern = like_pattern(term);
            qb.push(" AND (");
            let columns = [
                "p.imei",
                "p.internal_code",
                "m.name",
                "b.name",
                "p.color",
                "p.storage_capacity",
            ];
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column)
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for phone inventory.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.phones();
///
/// let phone = repo.insert(&draft, Actor::new(user.id, &user.username)).await?;
/// let page = repo.list(&PhoneFilter::default().search("galaxy"), 1, 20).await?;
/// let same = repo.lookup("490154203237518").await?;
/// ```
#[derive(Debug, Clone)]
pub struct PhoneRepository {
    pool: SqlitePool,
}

impl PhoneRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PhoneRepository { pool }
    }

    /// Adds a phone to inventory.
    ///
    /// ## Rules
    /// - The form must pass `validate_phone_draft`
    /// - The IMEI and internal code must not be in use
    /// - A phone can't be created as `sold`
    /// - Price defaults to the model's base price
    ///
    /// ## Returns
    /// * `Ok(PhoneListing)` - The stored phone with brand and model names
    /// * `Err(DbError::UniqueViolation)` - IMEI or internal code taken
    /// * `Err(DbError::NotFound)` - Unknown model or `acquired_from` customer
    pub async fn insert(&self, draft: &PhoneDraft, actor: Actor<'_>) -> DbResult<PhoneListing> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_phone(&mut *conn, draft, actor, Utc::now()).await?;
        drop(conn);

        info!(id = %id, imei = %draft.imei.trim(), "Phone added to inventory");
        self.get_or_not_found(&id).await
    }

    /// Replaces a phone's editable fields.
    ///
    /// Status is not touched here; it moves through [`Self::update_status`]
    /// and the sale workflow.
    pub async fn update(&self, id: &str, draft: &PhoneDraft) -> DbResult<PhoneListing> {
        let mut draft = draft.clone();
        draft.imei = draft.imei.trim().to_string();
        validate_phone_draft(&draft)?;

        let mut conn = self.pool.acquire().await?;

        let existing = fetch_phone(&mut *conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", id))?;
        let model_price = model_base_price(&mut *conn, draft.model_id).await?;
        ensure_customer(&mut *conn, draft.acquired_from).await?;
        ensure_unique_identifiers(&mut *conn, &draft, Some(&existing.id)).await?;

        sqlx::query(
            r#"
            UPDATE phones SET
                internal_code = ?2, model_id = ?3, imei = ?4, condition = ?5,
                price_cents = ?6, storage_capacity = ?7, color = ?8,
                battery_percentage = ?9, acquisition_type = ?10, acquired_from = ?11,
                notes = ?12, updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(non_blank(draft.internal_code.as_deref()))
        .bind(draft.model_id)
        .bind(&draft.imei)
        .bind(draft.condition)
        .bind(draft.price_cents.unwrap_or(model_price))
        .bind(non_blank(draft.storage_capacity.as_deref()))
        .bind(non_blank(draft.color.as_deref()))
        .bind(draft.battery_percentage)
        .bind(draft.acquisition_type)
        .bind(draft.acquired_from)
        .bind(non_blank(draft.notes.as_deref()))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
        drop(conn);

        debug!(id, "Phone updated");
        self.get_or_not_found(id).await
    }

    /// Deletes a phone and its comments.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such phone
    /// * `Err(DbError::ForeignKeyViolation)` - The phone was sold; sales keep
    ///   their phone
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM phones WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Phone", id));
        }

        info!(id, "Phone deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PhoneListing>> {
        self.fetch_listing("p.id = ?1", id).await
    }

    pub async fn get_by_imei(&self, imei: &str) -> DbResult<Option<PhoneListing>> {
        self.fetch_listing("p.imei = ?1", &normalize_imei(imei)).await
    }

    pub async fn get_by_internal_code(&self, code: &str) -> DbResult<Option<PhoneListing>> {
        self.fetch_listing("p.internal_code = ?1", code.trim()).await
    }

    /// Finds a phone from whatever the counter typed or scanned: an IMEI,
    /// a phone id, a `PHONE:` QR payload or an internal code.
    ///
    /// ## Example
    /// ```rust,ignore
    /// repo.lookup("490154203237518").await?;                    // IMEI
    /// repo.lookup("PHONE:7f1c...:490154203237518:Samsung:S23").await?; // QR
    /// repo.lookup("A-0012").await?;                             // internal code
    /// ```
    pub async fn lookup(&self, identifier: &str) -> DbResult<Option<PhoneListing>> {
        match parse_search_query(identifier) {
            SearchQuery::Imei { imei, .. } => self.get_by_imei(&imei).await,
            SearchQuery::Uuid { id } | SearchQuery::QrPhone { id, .. } => self.get(&id).await,
            SearchQuery::QrSale { .. } => Ok(None),
            SearchQuery::Text { text } => self.get_by_internal_code(&text).await,
        }
    }

    /// Lists phones matching `filter`, newest first.
    ///
    /// ## Arguments
    /// * `page` - 1-based page number
    /// * `per_page` - Page size, clamped to 1..=100
    pub async fn list(&self, filter: &PhoneFilter, page: i64, per_page: i64) -> DbResult<Page<PhoneListing>> {
        let (page, per_page, offset) = page_window(page, per_page);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        count.push(PHONE_FROM);
        filter.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(PHONE_SELECT);
        filter.push_where(&mut query);
        query
            .push(" ORDER BY p.created_at DESC, p.id LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let items = query
            .build_query_as::<PhoneListing>()
            .fetch_all(&self.pool)
            .await?;

        debug!(total, returned = items.len(), page, "Listed phones");
        Ok(Page::new(items, page, per_page, total))
    }

    /// Most recently added phones, sold or not.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<PhoneListing>> {
        let sql = format!("{PHONE_SELECT} ORDER BY p.created_at DESC, p.id LIMIT ?1");
        let phones = sqlx::query_as::<_, PhoneListing>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(phones)
    }

    /// Available phones that may be handed in as a trade-in.
    pub async fn trade_in_candidates(&self) -> DbResult<Vec<PhoneListing>> {
        let sql = format!(
            "{PHONE_SELECT} WHERE p.status = 'available' AND p.condition IN ('used', 'trade_in') \
             ORDER BY p.created_at DESC"
        );
        let phones = sqlx::query_as::<_, PhoneListing>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(phones)
    }

    /// Changes a phone's status by hand and records who did it.
    ///
    /// Setting the status it already has is a no-op and writes no comment.
    ///
    /// ## Returns
    /// * `Err(DbError::Rule(InvalidStatusTransition))` - To or from `sold`
    pub async fn update_status(&self, id: &str, status: PhoneStatus, actor: Actor<'_>) -> DbResult<PhoneListing> {
        let mut tx = self.pool.begin().await?;

        let phone = fetch_phone(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", id))?;
        check_manual_status_change(phone.status, status)?;

        if phone.status != status {
            let now = Utc::now();
            sqlx::query("UPDATE phones SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(status)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            let comment = format!(
                "Estado cambiado de {} a {} por {}",
                phone.status.label(),
                status.label(),
                actor.username
            );
            insert_comment(&mut *tx, id, actor, &comment, now).await?;
        }

        tx.commit().await?;

        info!(id, from = %phone.status, to = %status, "Phone status changed");
        self.get_or_not_found(id).await
    }

    async fn fetch_listing(&self, predicate: &str, value: &str) -> DbResult<Option<PhoneListing>> {
        let sql = format!("{PHONE_SELECT} WHERE {predicate}");
        let phone = sqlx::query_as::<_, PhoneListing>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(phone)
    }

    async fn get_or_not_found(&self, id: &str) -> DbResult<PhoneListing> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Phone", id))
    }
}

// =============================================================================
// Connection-level helpers (shared with the sale transaction)
// =============================================================================

pub(crate) async fn fetch_phone(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Phone>> {
    let phone = sqlx::query_as::<_, Phone>(
        r#"
        SELECT id, internal_code, model_id, imei, status, condition, price_cents,
               storage_capacity, color, battery_percentage, acquisition_type,
               acquired_from, notes, added_by, created_at, updated_at
        FROM phones WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(phone)
}

/// Validates and inserts a phone, returning its new id.
pub(crate) async fn insert_phone(
    conn: &mut SqliteConnection,
    draft: &PhoneDraft,
    actor: Actor<'_>,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let mut draft = draft.clone();
    draft.imei = draft.imei.trim().to_string();
    validate_phone_draft(&draft)?;
    check_manual_status_change(PhoneStatus::Available, draft.status)?;

    let model_price = model_base_price(&mut *conn, draft.model_id).await?;
    ensure_customer(&mut *conn, draft.acquired_from).await?;
    ensure_unique_identifiers(&mut *conn, &draft, None).await?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO phones (
            id, internal_code, model_id, imei, status, condition, price_cents,
            storage_capacity, color, battery_percentage, acquisition_type,
            acquired_from, notes, added_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        "#,
    )
    .bind(&id)
    .bind(non_blank(draft.internal_code.as_deref()))
    .bind(draft.model_id)
    .bind(&draft.imei)
    .bind(draft.status)
    .bind(draft.condition)
    .bind(draft.price_cents.unwrap_or(model_price))
    .bind(non_blank(draft.storage_capacity.as_deref()))
    .bind(non_blank(draft.color.as_deref()))
    .bind(draft.battery_percentage)
    .bind(draft.acquisition_type)
    .bind(draft.acquired_from)
    .bind(non_blank(draft.notes.as_deref()))
    .bind(actor.user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

async fn model_base_price(conn: &mut SqliteConnection, model_id: i64) -> DbResult<i64> {
    let price: Option<i64> = sqlx::query_scalar("SELECT base_price_cents FROM phone_models WHERE id = ?1")
        .bind(model_id)
        .fetch_optional(&mut *conn)
        .await?;
    price.ok_or_else(|| DbError::not_found("PhoneModel", model_id))
}

async fn ensure_customer(conn: &mut SqliteConnection, customer_id: Option<i64>) -> DbResult<()> {
    let Some(customer_id) = customer_id else {
        return Ok(());
    };
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Customer", customer_id))
}

/// IMEI and internal code must be free, except on the phone being edited.
async fn ensure_unique_identifiers(
    conn: &mut SqliteConnection,
    draft: &PhoneDraft,
    except: Option<&str>,
) -> DbResult<()> {
    let taken: Option<String> =
        sqlx::query_scalar("SELECT id FROM phones WHERE imei = ?1 AND (?2 IS NULL OR id != ?2)")
            .bind(&draft.imei)
            .bind(except)
            .fetch_optional(&mut *conn)
            .await?;
    if taken.is_some() {
        return Err(DbError::duplicate("imei", draft.imei.as_str()));
    }

    if let Some(code) = non_blank(draft.internal_code.as_deref()) {
        let taken: Option<String> = sqlx::query_scalar(
            "SELECT id FROM phones WHERE internal_code = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(code)
        .bind(except)
        .fetch_optional(&mut *conn)
        .await?;
        if taken.is_some() {
            return Err(DbError::duplicate("internal_code", code));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, IMEI_A, IMEI_B, IMEI_C};
    use celltrack_core::{AcquisitionType, CoreError};

    #[tokio::test]
    async fn test_insert_defaults_price_to_model_base_price() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;

        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;

        assert_eq!(phone.phone.price_cents, 800_000_00);
        assert_eq!(phone.phone.status, PhoneStatus::Available);
        assert_eq!(phone.brand_name, "Samsung");
        assert_eq!(phone.model_name, "Galaxy S23");
        assert!(phone.qr_payload().starts_with("PHONE:"));
    }

    #[tokio::test]
    async fn test_duplicate_imei_rejected() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;

        let err = db
            .phones()
            .insert(&fixtures::new_phone(model.id, IMEI_A), Actor::system())
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "imei");
                assert_eq!(value, IMEI_A);
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_imei_and_sold_status() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;

        let err = db
            .phones()
            .insert(&fixtures::new_phone(model.id, "490154203237519"), Actor::system())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));

        let mut draft = fixtures::new_phone(model.id, IMEI_A);
        draft.status = PhoneStatus::Sold;
        let err = db.phones().insert(&draft, Actor::system()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_trade_in_phone_needs_existing_customer() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;

        let draft = PhoneDraft {
            condition: PhoneCondition::TradeIn,
            acquisition_type: AcquisitionType::TradeIn,
            acquired_from: Some(77),
            battery_percentage: Some(70),
            ..fixtures::new_phone(model.id, IMEI_A)
        };
        let err = db.phones().insert(&draft, Actor::system()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_lookup_by_imei_uuid_qr_and_code() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let mut draft = fixtures::new_phone(model.id, IMEI_A);
        draft.internal_code = Some("A-0012".to_string());
        let phone = fixtures::phone(&db, draft).await;
        let repo = db.phones();

        let by_imei = repo.lookup("49 015420 323751 8").await.unwrap().unwrap();
        assert_eq!(by_imei.phone.id, phone.phone.id);

        let by_id = repo.lookup(&phone.phone.id).await.unwrap().unwrap();
        assert_eq!(by_id.phone.imei, IMEI_A);

        let by_qr = repo.lookup(&phone.qr_payload()).await.unwrap().unwrap();
        assert_eq!(by_qr.phone.id, phone.phone.id);

        let by_code = repo.lookup("A-0012").await.unwrap().unwrap();
        assert_eq!(by_code.phone.id, phone.phone.id);

        assert!(repo.lookup(IMEI_B).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_search_and_filters() {
        let db = fixtures::db().await;
        let samsung = fixtures::galaxy(&db).await;
        let apple_brand = fixtures::brand(&db, "Apple").await;
        let iphone = fixtures::model(&db, apple_brand.id, "iPhone 14", 1_200_000_00).await;

        let mut black = fixtures::new_phone(samsung.id, IMEI_A);
        black.color = Some("Negro".to_string());
        fixtures::phone(&db, black).await;
        fixtures::phone(&db, fixtures::used_phone(iphone.id, IMEI_B)).await;
        fixtures::phone(&db, fixtures::new_phone(iphone.id, IMEI_C)).await;
        let repo = db.phones();

        let page = repo.list(&PhoneFilter::default(), 1, 20).await.unwrap();
        assert_eq!(page.total, 3);

        let page = repo
            .list(&PhoneFilter::default().search("galaxy"), 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].phone.imei, IMEI_A);

        let page = repo
            .list(&PhoneFilter::default().search("negro"), 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = repo
            .list(&PhoneFilter::default().search("APPLE"), 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = repo
            .list(&PhoneFilter::default().condition(PhoneCondition::Used), 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].phone.imei, IMEI_B);

        let page = repo
            .list(&PhoneFilter::default().search("35693803"), 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        for imei in [IMEI_A, IMEI_B, IMEI_C] {
            fixtures::phone(&db, fixtures::new_phone(model.id, imei)).await;
        }

        let page = db.phones().list(&PhoneFilter::default(), 2, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_update_status_writes_audit_comment() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;
        let user = fixtures::user(&db, "empleado1").await;

        let updated = db
            .phones()
            .update_status(
                &phone.phone.id,
                PhoneStatus::Service,
                Actor::new(user.id, &user.username),
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.status, PhoneStatus::Service);

        let comments = db.comments().list_for_phone(&phone.phone.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(
            comments[0].comment,
            "Estado cambiado de Stock a Servicio técnico por empleado1"
        );
    }

    #[tokio::test]
    async fn test_update_status_cannot_set_sold() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;

        let err = db
            .phones()
            .update_status(&phone.phone.id, PhoneStatus::Sold, Actor::system())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidStatusTransition { .. })
        ));
        assert!(db.comments().list_for_phone(&phone.phone.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_status_and_checks_imei() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;
        fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_B)).await;
        db.phones()
            .update_status(&phone.phone.id, PhoneStatus::Reserved, Actor::system())
            .await
            .unwrap();

        let mut edit = fixtures::new_phone(model.id, IMEI_A);
        edit.color = Some("Azul".to_string());
        edit.price_cents = Some(750_000_00);
        let updated = db.phones().update(&phone.phone.id, &edit).await.unwrap();
        assert_eq!(updated.phone.status, PhoneStatus::Reserved);
        assert_eq!(updated.phone.color.as_deref(), Some("Azul"));
        assert_eq!(updated.phone.price_cents, 750_000_00);

        let err = db
            .phones()
            .update(&phone.phone.id, &fixtures::new_phone(model.id, IMEI_B))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_phone() {
        let db = fixtures::db().await;
        let model = fixtures::galaxy(&db).await;
        let phone = fixtures::phone(&db, fixtures::new_phone(model.id, IMEI_A)).await;

        db.phones().delete(&phone.phone.id).await.unwrap();
        assert!(db.phones().get(&phone.phone.id).await.unwrap().is_none());

        let err = db.phones().delete(&phone.phone.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
