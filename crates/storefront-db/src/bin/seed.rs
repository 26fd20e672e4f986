//! # Seed Data Generator
//!
//! Populates the database with a small storefront for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront.db (or STOREFRONT_DB_PATH)
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//!
//! # Backdate layout updates so cleanup has something to find
//! cargo run -p storefront-db --bin seed -- --stale-days 30
//! ```
//!
//! ## Generated Data
//! - One store group per website in [`GROUPS`], with its stores
//! - Store-scoped locale config for every store
//! - Layout updates for each handle in [`HANDLES`], linked to theme 1 in
//!   every store, plus one orphan update with no links

use std::env;

use chrono::Duration;
use storefront_core::{datetime, LayoutUpdate, Store, SCOPE_DEFAULT, SCOPE_STORES};
use storefront_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (website_id, group name, [(store code, locale)])
const GROUPS: &[(i64, &str, &[(&str, &str)])] = &[
    (1, "Main Website Store", &[("en_us", "en_US"), ("fr_fr", "fr_FR"), ("de_de", "de_DE")]),
    (2, "Outlet Store", &[("outlet_en", "en_GB")]),
];

const HANDLES: &[&str] = &["default", "catalog_product_view", "checkout_cart_index"];

const THEME_ID: i64 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = DbConfig::from_env()?;
    let mut stale_days: i64 = 0;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--stale-days" | "-s" => {
                if i + 1 < args.len() {
                    stale_days = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: $STOREFRONT_DB_PATH or ./storefront.db)");
                println!("  -s, --stale-days <N>     Age of seeded layout updates in days (default: 0)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(config).await?;

    let existing = db.stores().count_all(false).await?;
    if existing > 0 {
        warn!(existing, "Database already has stores, skipping seed");
        return Ok(());
    }

    let mut store_ids = Vec::new();
    for (website_id, group_name, stores) in GROUPS {
        let group = db.store_groups().create(*website_id, group_name, 2).await?;

        for (sort_order, (code, locale)) in stores.iter().enumerate() {
            let mut store = Store::new(*code, *website_id, group.group_id)
                .with_name(format!("{group_name} ({locale})"))
                .with_sort_order(sort_order as i64);
            db.stores().save(&mut store).await?;

            let Some(store_id) = store.store_id else {
                continue;
            };
            db.config_data()
                .save_value(SCOPE_STORES, store_id, "general/locale/code", Some(*locale))
                .await?;
            store_ids.push(store_id);
        }

        let group = db.store_groups().get_by_id(group.group_id).await?;
        if let Some(group) = group {
            info!(group = %group.name, default_store_id = group.default_store_id, "Seeded store group");
        }
    }

    db.config_data()
        .save_value(SCOPE_DEFAULT, 0, "general/locale/code", Some("en_US"))
        .await?;

    let updated_at = datetime::now() - Duration::days(stale_days);
    for handle in HANDLES {
        let update = db
            .layout_updates()
            .insert(&LayoutUpdate::new(*handle, "<block/>").with_updated_at(Some(updated_at)))
            .await?;

        for store_id in &store_ids {
            db.layout_updates()
                .add_link(update.layout_update_id, THEME_ID, *store_id)
                .await?;
        }
    }

    db.layout_updates()
        .insert(&LayoutUpdate::new("orphan_handle", "<block/>").with_updated_at(Some(updated_at)))
        .await?;

    info!(
        stores = db.stores().count_all(false).await?,
        layout_updates = db.layout_updates().count().await?,
        "Seed complete"
    );

    Ok(())
}
