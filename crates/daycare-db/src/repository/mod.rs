//! # Repository Module
//!
//! Database repository implementations for the daycare.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.schedulings().save(draft)                                  │
//! │       ▼                                                                 │
//! │  SchedulingRepository                                                  │
//! │  ├── validate (daycare-core)                                           │
//! │  ├── BEGIN IMMEDIATE                                                   │
//! │  ├── write row + service links                                         │
//! │  ├── price the attached services (daycare-core::pricing)               │
//! │  ├── write totals                                                      │
//! │  └── COMMIT                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LocationRepository`](location::LocationRepository) - States and cities
//! - [`TutorRepository`](tutor::TutorRepository) - Tutors
//! - [`PetRepository`](pet::PetRepository) - Pets
//! - [`ServiceRepository`](service::ServiceRepository) - Services and prices
//! - [`SchedulingRepository`](scheduling::SchedulingRepository) - Schedulings, totals, dashboard
//! - [`NoteRepository`](note::NoteRepository) - Note issuance

pub mod location;
pub mod note;
pub mod pet;
pub mod scheduling;
pub mod service;
pub mod tutor;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Opens a transaction that holds SQLite's write lock from the start.
///
/// Use it for every transaction that reads before writing. The lock is
/// taken at `BEGIN`, where `busy_timeout` applies, instead of at the first
/// write.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Folded form of a name, stored in the `search_name` column.
///
/// SQLite only folds ASCII, so "Ângela" and "ângela" are folded here and
/// both sides of a search go through the same function.
pub(crate) fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builds a `LIKE` pattern matched against `search_name`.
///
/// `%` and `_` typed by the user are matched literally (`ESCAPE '\'`).
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = search_key(query)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
