//! # Coupon Repository
//!
//! Database operations for coupons.
//!
//! Codes are stored in canonical form (see `tienda_core::normalize_code`),
//! so lookups normalize what the customer typed and compare exactly.
//! Rows are rebuilt through `Coupon`'s validating constructor; a row that
//! fails it surfaces as `DbError::Corrupt` instead of a half-valid coupon.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tienda_core::{normalize_code, Coupon, CouponRecord};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for coupon database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.coupons();
///
/// repo.upsert(&Coupon::new("VERANO10", 10, Money::from_units(100_000), true, None)?).await?;
/// let coupon = repo.find_by_code(" verano10 ").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    code: String,
    discount_percent: i64,
    min_amount: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl CouponRow {
    fn into_coupon(self) -> DbResult<Coupon> {
        let code = self.code.clone();
        Coupon::try_from(CouponRecord {
            code: self.code,
            discount_percent: self.discount_percent,
            min_amount: self.min_amount,
            is_active: self.is_active,
            expires_at: self.expires_at,
        })
        .map_err(|e| DbError::corrupt("Coupon", code, e))
    }
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a coupon or replaces the one with the same code.
    pub async fn upsert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code(), percent = coupon.discount_percent(), "Upserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                code, discount_percent, min_amount, is_active, expires_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (code) DO UPDATE SET
                discount_percent = excluded.discount_percent,
                min_amount = excluded.min_amount,
                is_active = excluded.is_active,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(coupon.code())
        .bind(i64::from(coupon.discount_percent()))
        .bind(coupon.min_amount().units())
        .bind(coupon.is_active())
        .bind(coupon.expires_at())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Looks up a coupon by what the customer typed.
    pub async fn find_by_code(&self, entered: &str) -> DbResult<Option<Coupon>> {
        let code = normalize_code(entered);
        if code.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT code, discount_percent, min_amount, is_active, expires_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// All coupons, by code.
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT code, discount_percent, min_amount, is_active, expires_at
            FROM coupons
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CouponRow::into_coupon).collect()
    }

    /// Activates or deactivates a coupon.
    pub async fn set_active(&self, entered: &str, is_active: bool) -> DbResult<()> {
        let code = normalize_code(entered);
        debug!(code = %code, is_active, "Setting coupon active flag");

        let result = sqlx::query(
            r#"
            UPDATE coupons SET is_active = ?2, updated_at = ?3
            WHERE code = ?1
            "#,
        )
        .bind(&code)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", code));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use tienda_core::Money;

    async fn db() -> Database {
        Database::connect(DbConfig::in_memory()).await.unwrap()
    }

    fn verano() -> Coupon {
        let exp = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        Coupon::new("verano10", 10, Money::from_units(100_000), true, Some(exp)).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_find_normalizes_code() {
        let db = db().await;
        db.coupons().upsert(&verano()).await.unwrap();

        let found = db.coupons().find_by_code("  Verano10 ").await.unwrap();
        assert_eq!(found, Some(verano()));

        assert!(db.coupons().find_by_code("OTRO").await.unwrap().is_none());
        assert!(db.coupons().find_by_code("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = db().await;
        db.coupons().upsert(&verano()).await.unwrap();

        let changed = Coupon::new("VERANO10", 25, Money::zero(), true, None).unwrap();
        db.coupons().upsert(&changed).await.unwrap();

        let all = db.coupons().list().await.unwrap();
        assert_eq!(all, vec![changed]);
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = db().await;
        db.coupons().upsert(&verano()).await.unwrap();

        db.coupons().set_active("verano10", false).await.unwrap();
        let found = db.coupons().find_by_code("VERANO10").await.unwrap().unwrap();
        assert!(!found.is_active());

        let err = db.coupons().set_active("NOPE", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let db = db().await;
        for code in ["ZETA", "ALFA", "MEDIO"] {
            let c = Coupon::new(code, 5, Money::zero(), true, None).unwrap();
            db.coupons().upsert(&c).await.unwrap();
        }

        let codes: Vec<String> = db
            .coupons()
            .list()
            .await
            .unwrap()
            .iter()
            .map(|c| c.code().to_string())
            .collect();
        assert_eq!(codes, vec!["ALFA", "MEDIO", "ZETA"]);
    }

    #[tokio::test]
    async fn test_row_without_expiry() {
        let db = db().await;
        sqlx::query(
            "INSERT INTO coupons (code, discount_percent, min_amount, is_active, updated_at)
             VALUES ('PROMO', 15, 0, 1, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let found = db.coupons().find_by_code("promo").await.unwrap().unwrap();
        assert_eq!(found.discount_percent(), 15);
        assert!(found.expires_at().is_none());
    }

    #[tokio::test]
    async fn test_malformed_row_is_corrupt() {
        let db = db().await;
        sqlx::query(
            "INSERT INTO coupons (code, discount_percent, min_amount, is_active, updated_at)
             VALUES ('BAD CODE', 15, 0, 1, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.coupons().list().await.unwrap_err();
        assert!(matches!(err, DbError::Corrupt { .. }));
    }
}
