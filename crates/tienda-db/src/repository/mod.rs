//! # Repository Module
//!
//! Repository implementations for the Tienda store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Storefront / admin handler                                            │
//! │       │                                                                 │
//! │       │  db.orders().transition(actor, id, version, next, now)         │
//! │       ▼                                                                 │
//! │  OrderRepository                      CouponRepository                 │
//! │  ├── insert(&order)                   ├── upsert(&coupon)              │
//! │  ├── get_by_id(id)                    ├── find_by_code(entered)        │
//! │  ├── list()                           ├── list()                       │
//! │  ├── summaries()                      └── set_active(code, flag)       │
//! │  ├── count()                                                           │
//! │  └── transition(...)                                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules live in tienda-core; repositories only load, call the rule and
//! store the result.

pub mod coupon;
pub mod order;
