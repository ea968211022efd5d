//! # Metrics Aggregator
//!
//! Revenue figures for the admin dashboard, recomputed from the order list
//! on every call.
//!
//! ## Buckets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each OrderSummary (one pass):                                      │
//! │                                                                         │
//! │    cancelled? ─────────────────────────► skip                           │
//! │    total or created_at missing? ───────► skip                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    all_time   += total                                                  │
//! │    same calendar month as now? ──► this_month += total                 │
//! │    same calendar day as now?   ──► today      += total                 │
//! │                                                                         │
//! │  average = revenue / count (floor), 0 when count = 0                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Today" and "this month" are computed in the time zone of `now`, so a
//! dashboard in Bogotá passes a `DateTime<FixedOffset>` (or any
//! `chrono::TimeZone`) and gets its own calendar.
//!
//! Summaries are plain data so the store can hand over rows it could not
//! fully parse; those are skipped instead of failing the whole dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, OrderStatus};

// =============================================================================
// Types
// =============================================================================

/// What the aggregator needs to know about one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub status: OrderStatus,
    pub total: Option<Money>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        OrderSummary {
            status: order.status(),
            total: Some(order.breakdown.total()),
            created_at: Some(order.created_at),
        }
    }
}

/// Revenue, count and average for one time bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub revenue: Money,
    pub order_count: u64,
    pub average_order_value: Money,
}

impl RevenueSummary {
    fn record(&mut self, total: Money) {
        self.revenue = self.revenue.saturating_add(total);
        self.order_count += 1;
    }

    fn finish(mut self) -> Self {
        self.average_order_value = self.revenue.average_over(self.order_count);
        self
    }
}

/// Dashboard figures at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub all_time: RevenueSummary,
    pub today: RevenueSummary,
    pub this_month: RevenueSummary,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates revenue over `orders` as seen at `now`.
///
/// Never fails; an empty input gives an all-zero snapshot. The result does
/// not depend on the order of `orders`.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use tienda_core::metrics::{aggregate, OrderSummary};
/// use tienda_core::{Money, OrderStatus};
///
/// let bogota = FixedOffset::west_opt(5 * 3600).unwrap();
/// let now = bogota.with_ymd_and_hms(2026, 3, 15, 20, 0, 0).unwrap();
///
/// let orders = [OrderSummary {
///     status: OrderStatus::Pending,
///     total: Some(Money::from_units(95_000)),
///     created_at: Some(Utc.with_ymd_and_hms(2026, 3, 16, 0, 30, 0).unwrap()),
/// }];
///
/// // 00:30 UTC on the 16th is still the 15th in Bogotá.
/// let snapshot = aggregate(&orders, &now);
/// assert_eq!(snapshot.today.order_count, 1);
/// ```
pub fn aggregate<'a, Tz, I>(orders: I, now: &DateTime<Tz>) -> MetricsSnapshot
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a OrderSummary>,
{
    let tz = now.timezone();
    let today = now.date_naive();

    let mut all_time = RevenueSummary::default();
    let mut this_month = RevenueSummary::default();
    let mut today_bucket = RevenueSummary::default();

    for summary in orders {
        if summary.status == OrderStatus::Cancelled {
            continue;
        }
        let (Some(total), Some(created_at)) = (summary.total, summary.created_at) else {
            continue;
        };

        all_time.record(total);

        let local = created_at.with_timezone(&tz).date_naive();
        if local.year() == today.year() && local.month() == today.month() {
            this_month.record(total);
            if local == today {
                today_bucket.record(total);
            }
        }
    }

    MetricsSnapshot {
        all_time: all_time.finish(),
        today: today_bucket.finish(),
        this_month: this_month.finish(),
    }
}

/// [`aggregate`] over fully loaded orders.
pub fn aggregate_orders<Tz: TimeZone>(orders: &[Order], now: &DateTime<Tz>) -> MetricsSnapshot {
    let summaries: Vec<OrderSummary> = orders.iter().map(OrderSummary::from).collect();
    aggregate(&summaries, now)
}

/// The `limit` most recent orders, newest first; ties broken by id.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    sorted.truncate(limit);
    sorted
}

/// Number of orders per status, cancelled included.
pub fn count_by_status<'a, I>(orders: I) -> BTreeMap<OrderStatus, usize>
where
    I: IntoIterator<Item = &'a OrderSummary>,
{
    let mut counts = BTreeMap::new();
    for summary in orders {
        *counts.entry(summary.status).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Unit Tests
// =============================================================================
