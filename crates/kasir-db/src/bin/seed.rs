//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and discounts for development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! ## Generated Data
//! - Items across five categories (ids 1-5), each in a few pack sizes,
//!   with cost at 70-85% of the selling price and stock 0-60
//! - `Diskon 10%` (PERCENTAGE, active) and `Potongan 5.000` (FIXED, active)

use std::env;

use kasir_core::{DiscountType, NewDiscount, NewItem};
use kasir_db::{Database, DbConfig};

/// (category id, base names)
const CATEGORIES: &[(i64, &[&str])] = &[
    (1, &["Aqua", "Teh Botol Sosro", "Coca-Cola", "Pocari Sweat", "Kopi Kapal Api"]),
    (2, &["Chitato", "Taro", "Oreo", "Roma Kelapa", "Beng-Beng"]),
    (3, &["Indomie Goreng", "Indomie Soto", "Sarimi", "Pop Mie"]),
    (4, &["Beras Pandan Wangi", "Gula Pasir", "Minyak Goreng", "Tepung Terigu"]),
    (5, &["Sabun Lifebuoy", "Pepsodent", "Rinso", "Sunlight"]),
];

/// (size label, selling price addon in whole rupiah)
const SIZES: &[(&str, i64)] = &[("Kecil", 0), ("Sedang", 2_500), ("Besar", 6_000)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kasir Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0usize;
    for (category_id, names) in CATEGORIES {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                let seed = (*category_id as usize) * 100 + name_idx * 10 + size_idx;
                let item = generate_item(*category_id, name, size, *addon, seed);

                if let Err(e) = db.items().insert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }
    println!("✓ Generated {} items", generated);

    for discount in [
        NewDiscount {
            name: "Diskon 10%".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10,
            is_active: true,
        },
        NewDiscount {
            name: "Potongan 5.000".to_string(),
            discount_type: DiscountType::Fixed,
            value: 500_000,
            is_active: true,
        },
    ] {
        let created = db.discounts().insert(&discount).await?;
        println!("✓ Discount #{} {}", created.id, created.name);
    }

    let counts = db.transactions().count_by_status().await?;
    println!();
    println!(
        "Ledger: {} pending, {} success, {} failed",
        counts.pending, counts.success, counts.failed
    );
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds one item with deterministic pseudo-random price and stock.
fn generate_item(category_id: i64, name: &str, size: &str, addon: i64, seed: usize) -> NewItem {
    // Rp 2.000 - Rp 29.900 base, in cents
    let base_price = 200_000 + ((seed * 7_919) % 280) as i64 * 10_000;
    let selling_price_cents = base_price + addon * 100;

    // Cost at 70-85% of selling price
    let cost_pct = 70 + (seed % 16) as i64;
    let cost_price_cents = selling_price_cents * cost_pct / 100;

    NewItem {
        name: format!("{} {}", name, size),
        category_id: Some(category_id),
        cost_price_cents,
        selling_price_cents,
        stock: (seed % 61) as i64,
    }
}
