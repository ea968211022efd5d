//! # Order Repository
//!
//! Database operations for orders, their items and their status log.
//!
//! ## Order Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle in SQLite                         │
//! │                                                                         │
//! │  1. CHECKOUT                                                           │
//! │     └── insert(order)        one transaction:                          │
//! │         ├── orders            breakdown, destination, status, version  │
//! │         ├── order_items       cart snapshot, by position               │
//! │         └── order_status_log  (pending, created_at)                    │
//! │                                                                         │
//! │  2. ADMIN UPDATES STATUS                                               │
//! │     └── transition(actor, id, expected_version, next, now)             │
//! │         one transaction:                                               │
//! │         ├── authorize(actor)                                           │
//! │         ├── load order, compare version        → StaleTransition      │
//! │         ├── lifecycle::transition              → IllegalTransition    │
//! │         ├── UPDATE orders ... WHERE id AND version                    │
//! │         │      0 rows affected                 → StaleTransition      │
//! │         └── INSERT order_status_log                                   │
//! │                                                                         │
//! │  3. DASHBOARD                                                          │
//! │     └── summaries()  status, total, created_at of every order         │
//! │                      (unreadable fields become None)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two admins racing on the same order both read version N; the first
//! UPDATE moves it to N+1 and the second matches zero rows.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use tienda_core::lifecycle::{self, authorize};
use tienda_core::validation::validate_order_id;
use tienda_core::{
    Actor, CartItem, CoreError, Destination, Money, Order, OrderStatus, OrderSummary,
    PriceBreakdown, ShippingMethod, StatusChange, StoredOrder,
};

use crate::error::{DbError, DbResult};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    subtotal: i64,
    discount_amount: i64,
    shipping_cost: i64,
    total: i64,
    shipping_method: ShippingMethod,
    coupon_code: Option<String>,
    recipient: String,
    phone: String,
    address: String,
    city: String,
    status: OrderStatus,
    version: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    name: String,
    unit_price: i64,
    image: String,
}

#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    status: OrderStatus,
    at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<ItemRow>, log: Vec<StatusRow>) -> DbResult<Order> {
        let corrupt = |reason: String| DbError::corrupt("Order", self.id.clone(), reason);

        let breakdown = PriceBreakdown::from_parts(
            Money::from_units(self.subtotal),
            Money::from_units(self.discount_amount),
            Money::from_units(self.shipping_cost),
        )
        .map_err(|e| corrupt(e.to_string()))?;

        if breakdown.total().units() != self.total {
            return Err(corrupt(format!(
                "stored total {} does not match breakdown total {}",
                self.total,
                breakdown.total().units()
            )));
        }

        let version = u64::try_from(self.version)
            .map_err(|_| corrupt(format!("negative version {}", self.version)))?;

        let stored = StoredOrder {
            items: items
                .into_iter()
                .map(|i| CartItem::new(i.name, Money::from_units(i.unit_price), i.image))
                .collect(),
            breakdown,
            destination: Destination {
                recipient: self.recipient,
                phone: self.phone,
                address: self.address,
                city: self.city,
            },
            shipping_method: self.shipping_method,
            coupon_code: self.coupon_code,
            created_at: self.created_at,
            status: self.status,
            status_log: log
                .into_iter()
                .map(|r| StatusChange {
                    status: r.status,
                    at: r.at,
                })
                .collect(),
            version,
            id: self.id.clone(),
        };

        Order::try_from(stored).map_err(|e| corrupt(e.to_string()))
    }
}

/// Reads one dashboard summary, keeping what parses.
fn summary_from_row(row: &SqliteRow) -> Option<OrderSummary> {
    let id: String = row.try_get("id").unwrap_or_default();

    let status = match row
        .try_get::<String, _>("status")
        .map_err(|e| e.to_string())
        .and_then(|s| s.parse::<OrderStatus>().map_err(|e| e.to_string()))
    {
        Ok(status) => status,
        Err(reason) => {
            warn!(order_id = %id, reason = %reason, "Skipping order with unreadable status");
            return None;
        }
    };

    let total = row
        .try_get::<Option<i64>, _>("total")
        .ok()
        .flatten()
        .map(Money::from_units);
    let created_at = row
        .try_get::<Option<DateTime<Utc>>, _>("created_at")
        .ok()
        .flatten();

    if total.is_none() || created_at.is_none() {
        debug!(order_id = %id, "Order summary has unreadable fields");
    }

    Some(OrderSummary {
        status,
        total,
        created_at,
    })
}

fn version_param(version: u64) -> DbResult<i64> {
    i64::try_from(version).map_err(|_| DbError::Internal(format!("version {} out of range", version)))
}

// =============================================================================
// Repository
// =============================================================================

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a freshly checked-out order.
    ///
    /// ## Snapshot Pattern
    /// Item names and prices are copied into `order_items`. Later catalog
    /// changes never reach a placed order.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            order_id = %order.id,
            total = %order.breakdown.total(),
            items = order.items.len(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id,
                subtotal, discount_amount, shipping_cost, total,
                shipping_method, coupon_code,
                recipient, phone, address, city,
                status, version, created_at
            ) VALUES (
                ?1,
                ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&order.id)
        .bind(order.breakdown.subtotal().units())
        .bind(order.breakdown.discount_amount().units())
        .bind(order.breakdown.shipping_cost().units())
        .bind(order.breakdown.total().units())
        .bind(order.shipping_method)
        .bind(&order.coupon_code)
        .bind(&order.destination.recipient)
        .bind(&order.destination.phone)
        .bind(&order.destination.address)
        .bind(&order.destination.city)
        .bind(order.status())
        .bind(version_param(order.version())?)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, name, unit_price, image)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.unit_price.units())
            .bind(&item.image)
            .execute(&mut *tx)
            .await?;
        }

        for (seq, change) in order.status_log().iter().enumerate() {
            insert_status_change(&mut tx, &order.id, seq, change).await?;
        }

        tx.commit().await?;

        info!(order_id = %order.id, "Order stored");
        Ok(())
    }

    /// Gets an order by ID.
    ///
    /// A malformed id is a validation error; a well-formed unknown one is
    /// `None`.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        validate_order_id(id)?;
        let mut conn = self.pool.acquire().await?;
        load_order(&mut conn, id).await
    }

    /// All orders, newest first; ties broken by id.
    ///
    /// Orders that no longer rebuild into a valid `Order` are left out with
    /// a warning so one bad row does not hide the rest.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            match load_order(&mut conn, &id).await {
                Ok(Some(order)) => orders.push(order),
                Ok(None) => {}
                Err(DbError::Corrupt { reason, .. }) => {
                    warn!(order_id = %id, reason = %reason, "Skipping unreadable order");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Status, total and creation time of every order, for the dashboard.
    ///
    /// Never fails on a bad row: unreadable totals or timestamps become
    /// `None` (the aggregator skips them) and rows without a known status
    /// are left out with a warning.
    pub async fn summaries(&self) -> DbResult<Vec<OrderSummary>> {
        let rows = sqlx::query("SELECT id, status, total, created_at FROM orders")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(summary_from_row).collect())
    }

    /// Number of stored orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Moves an order to `next` on behalf of `actor`.
    ///
    /// `expected_version` is the version the caller last read. If another
    /// writer got there first this fails with `StaleTransition` and nothing
    /// is written; re-read and retry.
    ///
    /// ## Errors
    /// - `NotPermitted` unless `actor` is an admin
    /// - `Validation` if `id` is not a well-formed order id
    /// - `NotFound` if the order does not exist
    /// - `StaleTransition` on a version mismatch
    /// - `IllegalTransition` if the status graph forbids the move
    pub async fn transition(
        &self,
        actor: Actor,
        id: &str,
        expected_version: u64,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        authorize(actor, "update order status")?;
        validate_order_id(id)?;

        debug!(order_id = %id, expected_version, next = %next, "Transitioning order");

        let mut tx = self.pool.begin().await?;

        let mut order = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        let stale = || CoreError::StaleTransition {
            order_id: id.to_string(),
            expected_version,
        };

        if order.version() != expected_version {
            return Err(stale().into());
        }

        let from = order.status();
        lifecycle::transition(&mut order, next, now)?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                version = ?3
            WHERE id = ?1 AND version = ?4
            "#,
        )
        .bind(id)
        .bind(order.status())
        .bind(version_param(order.version())?)
        .bind(version_param(expected_version)?)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale().into());
        }

        let seq = order.status_log().len() - 1;
        if let Some(change) = order.status_log().last() {
            insert_status_change(&mut tx, id, seq, change).await?;
        }

        tx.commit().await?;

        info!(order_id = %id, from = %from, to = %next, version = order.version(), "Order transitioned");
        Ok(order)
    }
}

async fn insert_status_change(
    conn: &mut SqliteConnection,
    order_id: &str,
    seq: usize,
    change: &StatusChange,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_log (order_id, seq, status, at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(order_id)
    .bind(seq as i64)
    .bind(change.status)
    .bind(change.at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn load_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT
            id,
            subtotal, discount_amount, shipping_cost, total,
            shipping_method, coupon_code,
            recipient, phone, address, city,
            status, version, created_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| row_error(id, e))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT name, unit_price, image
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| row_error(id, e))?;

    let log = sqlx::query_as::<_, StatusRow>(
        r#"
        SELECT status, at
        FROM order_status_log
        WHERE order_id = ?1
        ORDER BY seq
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| row_error(id, e))?;

    row.into_order(items, log).map(Some)
}

/// Column values that do not decode mean the stored order is damaged.
fn row_error(id: &str, err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            DbError::corrupt("Order", id, err)
        }
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use tienda_core::{Cart, Coupon, PricingEngine};

    async fn db() -> Database {
        Database::connect(DbConfig::in_memory()).await.unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn checkout(at: DateTime<Utc>) -> Order {
        let cart: Cart = [
            CartItem::new("Camisa", Money::from_units(80_000), "img/camisa.jpg"),
            CartItem::new("Pantalón", Money::from_units(90_000), "img/pantalon.jpg"),
        ]
        .into_iter()
        .collect();
        let coupon = Coupon::new("VERANO10", 10, Money::from_units(100_000), true, None).unwrap();

        PricingEngine::default()
            .checkout(
                &cart,
                Some(&coupon),
                ShippingMethod::CashOnDelivery,
                Destination {
                    recipient: "Ana Pérez".to_string(),
                    phone: "3001234567".to_string(),
                    address: "Cra 27 # 45-10".to_string(),
                    city: "Bucaramanga".to_string(),
                },
                at,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = db().await;
        let order = checkout(t0());

        db.orders().insert(&order).await.unwrap();

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(loaded.breakdown.total().units(), 158_000);
        assert_eq!(loaded.items[1].name, "Pantalón");
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    const ABSENT_ID: &str = "9b2f6c1e-3d4a-4f5b-8c7d-0e1f2a3b4c5d";

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = db().await;
        assert!(db.orders().get_by_id(ABSENT_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_order_id_is_rejected() {
        let db = db().await;

        let err = db.orders().get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = db
            .orders()
            .transition(Actor::Admin, "  ", 0, OrderStatus::Processing, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        let err = db.orders().insert(&order).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transition_persists_status_and_log() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        let updated = db
            .orders()
            .transition(Actor::Admin, &order.id, 0, OrderStatus::Processing, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(updated.status(), OrderStatus::Processing);
        assert_eq!(updated.version(), 1);

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded, updated);
        assert_eq!(loaded.status_log().len(), 2);
        assert_eq!(loaded.breakdown, order.breakdown);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        db.orders()
            .transition(Actor::Admin, &order.id, 0, OrderStatus::Processing, t0())
            .await
            .unwrap();

        // A second admin still holding version 0.
        let err = db
            .orders()
            .transition(Actor::Admin, &order.id, 0, OrderStatus::Cancelled, t0())
            .await
            .unwrap_err();
        assert!(err.is_stale());

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Processing);
        assert_eq!(loaded.version(), 1);
    }

    #[tokio::test]
    async fn test_illegal_transition_writes_nothing() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        let err = db
            .orders()
            .transition(Actor::Admin, &order.id, 0, OrderStatus::Delivered, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::IllegalTransition { .. })));

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn test_customer_cannot_transition() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        let err = db
            .orders()
            .transition(Actor::Customer, &order.id, 0, OrderStatus::Cancelled, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotPermitted { .. })));
    }

    #[tokio::test]
    async fn test_transition_unknown_order() {
        let db = db().await;
        let err = db
            .orders()
            .transition(Actor::Admin, ABSENT_ID, 0, OrderStatus::Processing, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = db().await;
        let old = checkout(t0() - Duration::days(1));
        let new = checkout(t0());
        db.orders().insert(&old).await.unwrap();
        db.orders().insert(&new).await.unwrap();

        let ids: Vec<String> = db
            .orders()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn test_summaries_tolerate_bad_rows() {
        let db = db().await;
        let order = checkout(t0());
        db.orders().insert(&order).await.unwrap();

        sqlx::query(
            "INSERT INTO orders (id, subtotal, total, shipping_method, status, created_at)
             VALUES ('bad-total', 1000, 'n/a', 'standard', 'pending', '2026-03-15T10:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO orders (id, subtotal, total, shipping_method, status, created_at)
             VALUES ('bad-date', 1000, 1000, 'standard', 'pending', 'yesterday')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO orders (id, subtotal, total, shipping_method, status, created_at)
             VALUES ('bad-status', 1000, 1000, 'standard', 'lost', '2026-03-15T10:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let summaries = db.orders().summaries().await.unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries.iter().filter(|s| s.total.is_none()).count(), 1);
        assert_eq!(summaries.iter().filter(|s| s.created_at.is_none()).count(), 1);

        let snapshot = db.metrics(&t0()).await.unwrap();
        assert_eq!(snapshot.all_time.order_count, 1);
        assert_eq!(snapshot.all_time.revenue.units(), 158_000);
        assert_eq!(snapshot.today.order_count, 1);
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_orders() {
        let db = db().await;
        let good = checkout(t0());
        let tampered = checkout(t0() - Duration::hours(1));
        db.orders().insert(&good).await.unwrap();
        db.orders().insert(&tampered).await.unwrap();

        sqlx::query("UPDATE orders SET total = total + 1 WHERE id = ?1")
            .bind(&tampered.id)
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO orders (id, subtotal, total, shipping_method, status, created_at)
             VALUES ('bad-total', 1000, 'n/a', 'standard', 'pending', '2026-03-15T10:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let listed = db.orders().list().await.unwrap();
        assert_eq!(listed, vec![good]);

        let err = db.orders().get_by_id(&tampered.id).await.unwrap_err();
        assert!(matches!(err, DbError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_metrics_exclude_cancelled() {
        let db = db().await;
        let kept = checkout(t0());
        let cancelled = checkout(t0());
        db.orders().insert(&kept).await.unwrap();
        db.orders().insert(&cancelled).await.unwrap();

        db.orders()
            .transition(Actor::Admin, &cancelled.id, 0, OrderStatus::Cancelled, t0())
            .await
            .unwrap();

        let snapshot = db.metrics(&t0()).await.unwrap();
        assert_eq!(snapshot.all_time.order_count, 1);
        assert_eq!(snapshot.this_month.revenue.units(), 158_000);
    }
}
