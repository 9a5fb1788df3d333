//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lifedesk_core` linkage and
//!   storage bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use lifedesk_core::db::open_db_in_memory;
use lifedesk_core::{CategoryRepository, SqliteCategoryRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lifedesk_core version={}", lifedesk_core::core_version());
    match bootstrap_smoke() {
        Ok(count) => {
            println!("categories={count}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("bootstrap failed: {message}");
            ExitCode::FAILURE
        }
    }
}

// Opens an in-memory store so the smoke run exercises migrations and the
// repository readiness guard without touching the filesystem.
fn bootstrap_smoke() -> Result<usize, String> {
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let repo = SqliteCategoryRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let categories = repo.list().map_err(|err| err.to_string())?;
    Ok(categories.len())
}
