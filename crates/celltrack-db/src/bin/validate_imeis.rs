//! # IMEI Checker
//!
//! Walks the whole inventory and reports which stored IMEIs fail the Luhn
//! check. Exits with status 1 when any are invalid, so it can run in CI or
//! cron against a copy of the shop database.
//!
//! ```bash
//! cargo run -p celltrack-db --bin validate-imeis -- --db ./data/celltrack.db
//! ```

use std::env;
use std::process::ExitCode;

use celltrack_core::imei::is_valid_imei;
use celltrack_db::{Database, DbConfig, PhoneFilter};
use tracing_subscriber::EnvFilter;

const PAGE_SIZE: i64 = 100;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let db_path = args
        .iter()
        .position(|a| a == "--db" || a == "-d")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "./celltrack_dev.db".to_string());

    // Only reads; leave the schema alone.
    let db = Database::new(DbConfig::new(&db_path).run_migrations(false)).await?;

    let filter = PhoneFilter {
        include_sold: true,
        ..Default::default()
    };

    let mut valid = 0;
    let mut invalid = 0;
    let mut page = 1;
    loop {
        let batch = db.phones().list(&filter, page, PAGE_SIZE).await?;
        for listing in &batch.items {
            if is_valid_imei(&listing.phone.imei) {
                valid += 1;
                println!("✓ {} - {}", listing.phone.imei, listing.display_name());
            } else {
                invalid += 1;
                println!("✗ {} - {} (INVÁLIDO)", listing.phone.imei, listing.display_name());
            }
        }
        if !batch.has_next() {
            break;
        }
        page += 1;
    }

    println!();
    println!("Resumen: {} válidos, {} inválidos", valid, invalid);

    db.close().await;

    if invalid > 0 {
        println!("Se encontraron IMEIs inválidos. Considera corregirlos.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
