//! # Seed Data Generator
//!
//! Populates an empty database with a small shop for development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p celltrack-db --bin seed
//!
//! # More phones
//! cargo run -p celltrack-db --bin seed -- --phones 40
//!
//! # Specify database path
//! cargo run -p celltrack-db --bin seed -- --db ./data/celltrack.db
//! ```
//!
//! ## Generated Data
//! - Users `admin` / `admin123` (admin) and `empleado1` / `empleado123`
//! - Brands Samsung, Apple, Motorola, Xiaomi with one model each
//! - Three customers
//! - Phones with valid IMEIs (TAC `35` + index + Luhn digit), new and used
//! - Three sales (cash, card, transfer) on the first phones

use std::env;

use celltrack_core::imei::luhn_check_digit;
use celltrack_core::{
    NewBrand, NewCustomer, NewPhoneModel, NewUser, PaymentMethod, PhoneCondition, PhoneDraft,
    PhoneModel, PhoneStatus, Role, SaleRequest,
};
use celltrack_db::password::hash_password;
use celltrack_db::{Actor, Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// `(brand, model, base price in pesos)`
const CATALOG: &[(&str, &str, i64)] = &[
    ("Samsung", "Galaxy S23", 800_000),
    ("Apple", "iPhone 14", 1_200_000),
    ("Xiaomi", "Redmi Note 12", 600_000),
    ("Motorola", "Moto G100", 500_000),
];

/// `(name, email, phone, address, dni)`
const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    ("Juan Perez", "juan@example.com", "111111", "Calle Falsa 123", "12345678"),
    ("Maria Gomez", "maria@example.com", "222222", "Av. Siempre Viva 742", "87654321"),
    ("Carlos Lopez", "carlos@example.com", "333333", "San Martin 456", "11223344"),
];

const COLORS: &[&str] = &["Negro", "Blanco", "Azul", "Rojo"];
const STORAGE: &[&str] = &["64GB", "128GB", "256GB"];
const SALE_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::Transfer,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut phone_count: usize = 10;
    let mut db_path = String::from("./celltrack_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--phones" | "-p" => {
                if i + 1 < args.len() {
                    phone_count = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Celltrack Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --phones <N>   Number of phones to generate (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./celltrack_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Celltrack Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Phones:   {}", phone_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? > 0 {
        println!("⚠ Database already has users");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let admin = db
        .users()
        .insert(
            &NewUser {
                username: "admin".to_string(),
                email: Some("admin@tienda.com".to_string()),
                first_name: Some("Administrador".to_string()),
                last_name: Some("Sistema".to_string()),
                role: Role::Admin,
                ..Default::default()
            },
            &hash_password("admin123")?,
        )
        .await?;
    db.users()
        .insert(
            &NewUser {
                username: "empleado1".to_string(),
                email: Some("empleado1@tienda.com".to_string()),
                first_name: Some("Juan".to_string()),
                last_name: Some("Pérez".to_string()),
                role: Role::Employee,
                ..Default::default()
            },
            &hash_password("empleado123")?,
        )
        .await?;
    println!("✓ Users: admin, empleado1");

    let actor = Actor::new(admin.id, &admin.username);

    // Catalog
    let mut models: Vec<PhoneModel> = Vec::new();
    for (brand_name, model_name, price) in CATALOG {
        let brand = db
            .brands()
            .insert(&NewBrand {
                name: brand_name.to_string(),
                is_active: true,
            })
            .await?;
        let model = db
            .phone_models()
            .insert(&NewPhoneModel {
                brand_id: brand.id,
                name: model_name.to_string(),
                base_price_cents: price * 100,
                is_active: true,
            })
            .await?;
        models.push(model);
    }
    println!("✓ Catalog: {} brands, {} models", CATALOG.len(), models.len());

    // Customers
    let mut customer_ids = Vec::new();
    for (name, email, phone, address, dni) in CUSTOMERS {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
                address: Some(address.to_string()),
                dni: Some(dni.to_string()),
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!("✓ Customers: {}", customer_ids.len());

    // Phones
    let mut phone_ids = Vec::new();
    for n in 0..phone_count {
        let draft = sample_phone(&models[n % models.len()], n);
        match db.phones().insert(&draft, actor).await {
            Ok(phone) => phone_ids.push(phone.phone.id),
            Err(e) => eprintln!("Failed to insert IMEI {}: {}", draft.imei, e),
        }
    }
    println!("✓ Phones: {}", phone_ids.len());

    // Sales
    let mut sold = 0;
    for (n, (phone_id, customer_id)) in phone_ids.iter().zip(&customer_ids).enumerate() {
        let request = SaleRequest {
            phone_id: phone_id.clone(),
            customer_id: *customer_id,
            payment_method: Some(SALE_METHODS[n % SALE_METHODS.len()]),
            is_picked_up: true,
            notes: Some("Venta de ejemplo".to_string()),
            ..Default::default()
        };
        match db.sales().record_sale(&request, actor).await {
            Ok(_) => sold += 1,
            Err(e) => eprintln!("Failed to record sample sale: {}", e),
        }
    }
    println!("✓ Sales: {}", sold);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds the n-th sample phone. Every third phone is used.
fn sample_phone(model: &PhoneModel, n: usize) -> PhoneDraft {
    let condition = if n % 3 == 2 {
        PhoneCondition::Used
    } else {
        PhoneCondition::New
    };
    let status = if n % 5 == 4 {
        PhoneStatus::Reserved
    } else {
        PhoneStatus::Available
    };
    // Up to +/- $5.000 around the base price, never below zero
    let offset = ((n as i64 * 3_700) % 10_001 - 5_000) * 100;

    PhoneDraft {
        model_id: model.id,
        imei: sample_imei(n),
        internal_code: Some(format!("CT-{:04}", n + 1)),
        status,
        condition,
        price_cents: Some((model.base_price_cents + offset).max(0)),
        storage_capacity: Some(STORAGE[n % STORAGE.len()].to_string()),
        color: Some(COLORS[n % COLORS.len()].to_string()),
        battery_percentage: (condition == PhoneCondition::Used).then_some(80 + (n % 20) as i64),
        ..Default::default()
    }
}

/// A Luhn-valid IMEI: TAC prefix `35`, the index, then the check digit.
fn sample_imei(n: usize) -> String {
    let body = format!("35{:012}", 100_000 + n);
    let check = luhn_check_digit(&body).unwrap_or(0);
    format!("{body}{check}")
}
