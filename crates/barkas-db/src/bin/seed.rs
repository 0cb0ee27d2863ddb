//! # Seed Data Generator
//!
//! Populates a database with staff accounts and a demo catalog of
//! second-hand goods for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p barkas-db --bin seed
//!
//! # Specify database path and staff password
//! cargo run -p barkas-db --bin seed -- --db ./data/barkas.db --password rahasia123
//! ```
//!
//! ## Generated Data
//! - One account per role: `admin@`, `manager@`, `staff@barkasbali88.com`
//! - Products across furniture, electronics, kitchen and decor
//! - A handful of customers

use barkas_core::{CustomerInput, ProductInput, Role};
use barkas_db::{AuthConfig, Database, DbConfig};
use std::env;

/// (name, category, price in rupiah, stock, featured, tags)
const PRODUCTS: &[(&str, &str, i64, i64, bool, &str)] = &[
    ("Kursi Rotan Antik", "Furniture", 450_000, 3, true, "rotan, antik"),
    ("Meja Jati Bekas", "Furniture", 1_250_000, 1, true, "jati, meja"),
    ("Lemari Kayu Dua Pintu", "Furniture", 900_000, 2, false, "kayu, lemari"),
    ("Rak Buku Bambu", "Furniture", 175_000, 6, false, "bambu"),
    ("Kamera Analog Yashica", "Elektronik", 650_000, 2, true, "vintage, kamera"),
    ("Radio Tabung Philips", "Elektronik", 300_000, 4, false, "vintage, radio"),
    ("Kipas Angin Berdiri", "Elektronik", 120_000, 12, false, "kipas"),
    ("Televisi Tabung 21 Inch", "Elektronik", 250_000, 5, false, "tv"),
    ("Panci Presto", "Dapur", 95_000, 15, false, "panci, masak"),
    ("Set Piring Keramik", "Dapur", 140_000, 8, true, "keramik, piring"),
    ("Blender Bekas", "Dapur", 110_000, 7, false, "blender"),
    ("Lukisan Kanvas Bali", "Dekorasi", 500_000, 2, true, "lukisan, bali"),
    ("Patung Kayu Garuda", "Dekorasi", 350_000, 3, true, "kayu, patung"),
    ("Vas Keramik Lombok", "Dekorasi", 85_000, 20, false, "keramik, vas"),
    ("Lampu Gantung Kuningan", "Dekorasi", 275_000, 0, false, "lampu, kuningan"),
];

/// (name, phone, address)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Made Wirawan", "081234567890", "Jl. Sunset Road 12, Kuta"),
    ("Ni Luh Sari", "082145678901", "Jl. Raya Ubud 45, Ubud"),
    ("Ketut Arsana", "085737001122", "Jl. Danau Tamblingan 8, Sanur"),
];

const STAFF: &[(&str, &str, Role)] = &[
    ("admin@barkasbali88.com", "Admin Barkas", Role::Admin),
    ("manager@barkasbali88.com", "Manajer Toko", Role::Manager),
    ("staff@barkasbali88.com", "Staf Gudang", Role::Employee),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./barkas_dev.db");
    let mut password = String::from("barkas123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("BarkasBali88 Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./barkas_dev.db)");
                println!("  -p, --password <PASS>    Password for the staff accounts (default: barkas123)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 BarkasBali88 Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // The secret only matters for issuing tokens, which seeding never does.
    let auth = db.auth(AuthConfig {
        jwt_secret: "seed".to_string(),
        session_lifetime_secs: 60,
    });

    println!();
    println!("Creating staff accounts...");
    for (email, name, role) in STAFF {
        match auth.register(email, &password, name, *role).await {
            Ok(user) => println!("  {} ({})", user.email, user.role.label()),
            Err(e) => eprintln!("  Failed to create {}: {}", email, e),
        }
    }

    println!();
    println!("Generating products...");
    let mut generated = 0;
    for (name, category, price, stock, featured, tags) in PRODUCTS {
        let input = ProductInput {
            name: name.to_string(),
            description: format!("{} dalam kondisi baik, siap pakai.", name),
            price: *price,
            category: category.to_string(),
            stock: *stock,
            tags: ProductInput::parse_tags(tags),
            is_featured: *featured,
            is_limited_stock: *stock <= 3,
            ..Default::default()
        };

        if let Err(e) = db.products().insert(&input).await {
            eprintln!("  Failed to insert {}: {}", name, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ Generated {} products", generated);

    println!();
    println!("Adding customers...");
    for (name, phone, address) in CUSTOMERS {
        let input = CustomerInput {
            name: name.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            ..Default::default()
        };
        if let Err(e) = db.customers().insert(&input).await {
            eprintln!("  Failed to insert {}: {}", name, e);
        }
    }
    println!("✓ {} customers", db.customers().count().await?);

    println!();
    println!("✓ Seed complete! Sign in with any staff email and the seed password.");

    db.close().await;
    Ok(())
}
