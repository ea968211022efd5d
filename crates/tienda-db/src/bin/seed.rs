//! # Seed Data Generator
//!
//! Populates the database with demo coupons and orders for development.
//!
//! ## Usage
//! ```bash
//! # Generate 40 orders (default) in TIENDA_DB_PATH or ./tienda_dev.db
//! cargo run -p tienda-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tienda-db --bin seed -- --orders 200
//!
//! # Specify database path
//! cargo run -p tienda-db --bin seed -- --db ./data/tienda.db
//! ```
//!
//! ## Generated Data
//! - Four coupons: active, high-minimum, expired and inactive
//! - Orders spread over the last 60 days, across cities inside and outside
//!   the local delivery zone, with one to four items each
//! - Some orders moved along the lifecycle, a few cancelled
//!
//! Finishes by printing the dashboard snapshot as JSON.

use std::env;

use chrono::{Duration, Utc};
use tienda_core::{
    Actor, Cart, CartItem, Coupon, Destination, Money, OrderStatus, ShippingMethod,
};
use tienda_db::{Database, StoreConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Catalog used to fill carts: (name, price in pesos).
const CATALOG: &[(&str, i64)] = &[
    ("Camisa de lino", 80_000),
    ("Pantalón chino", 90_000),
    ("Gorra bordada", 25_000),
    ("Chaqueta de jean", 160_000),
    ("Medias x3", 18_000),
    ("Bolso tejido", 65_000),
    ("Sandalias", 72_000),
];

/// Destination cities; the first three are in the default local zone.
const CITIES: &[&str] = &[
    "Bucaramanga",
    "Floridablanca",
    "Girón",
    "Bogotá",
    "Medellín",
    "Cali",
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tienda=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn demo_coupons() -> Result<Vec<Coupon>, tienda_core::ValidationError> {
    let now = Utc::now();
    Ok(vec![
        Coupon::new("VERANO10", 10, Money::from_units(100_000), true, Some(now + Duration::days(90)))?,
        Coupon::new("BIENVENIDA", 15, Money::zero(), true, None)?,
        Coupon::new("NAVIDAD", 20, Money::zero(), true, Some(now - Duration::days(30)))?,
        Coupon::new("PRUEBA", 50, Money::zero(), false, None)?,
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = StoreConfig::from_env()?;
    let mut order_count: usize = 40;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-n" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(order_count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tienda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --orders <N>   Number of orders to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: $TIENDA_DB_PATH or ./tienda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), orders = order_count, "Seeding database");

    let db = Database::open(&config).await?;

    let existing = db.orders().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has orders, skipping seed");
        return Ok(());
    }

    let coupons = demo_coupons()?;
    for coupon in &coupons {
        db.coupons().upsert(coupon).await?;
    }
    info!(count = coupons.len(), "Coupons stored");

    let engine = config.pricing_engine();
    let now = Utc::now();
    let mut placed = 0;

    for n in 0..order_count {
        let created_at = now - Duration::hours((n as i64 * 37) % (60 * 24));
        let city = CITIES[n % CITIES.len()];

        let cart: Cart = (0..=(n % 4))
            .map(|k| {
                let (name, price) = CATALOG[(n + k * 3) % CATALOG.len()];
                CartItem::new(name, Money::from_units(price), format!("img/{}.jpg", (n + k * 3) % CATALOG.len()))
            })
            .collect();

        let method = if engine.shipping().config().is_local(city) && n % 2 == 0 {
            ShippingMethod::CashOnDelivery
        } else {
            ShippingMethod::Standard
        };

        let coupon = coupons.get(n % (coupons.len() + 2));
        let destination = Destination {
            recipient: format!("Cliente {}", n + 1),
            phone: format!("300{:07}", n),
            address: format!("Calle {} # {}-{}", 10 + n % 40, n % 90, n % 60),
            city: city.to_string(),
        };

        let order = match engine.checkout(&cart, coupon, method, destination, created_at) {
            Ok(order) => order,
            Err(e) => {
                warn!(n, error = %e, "Skipping order");
                continue;
            }
        };

        db.orders().insert(&order).await?;
        placed += 1;

        let path: &[OrderStatus] = match n % 6 {
            0 => &[],
            1 => &[OrderStatus::Processing],
            2 => &[OrderStatus::Processing, OrderStatus::Shipped],
            3 | 4 => &[
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ],
            _ => &[OrderStatus::Cancelled],
        };

        let mut current = order;
        for (step, next) in path.iter().enumerate() {
            let at = created_at + Duration::hours(step as i64 + 1);
            current = db
                .orders()
                .transition(Actor::Admin, &current.id, current.version(), *next, at)
                .await?;
        }
    }

    info!(placed, "Orders stored");

    let snapshot = db.metrics(&Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    db.close().await;
    Ok(())
}
