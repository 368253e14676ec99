//! # daycare-db: Database Layer for the Pet Daycare
//!
//! Persistence for the daycare on SQLite through sqlx. This is where the
//! pure rules of `daycare-core` meet transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pet Daycare Data Flow                            │
//! │                                                                         │
//! │  Staff action (save scheduling, issue note, open dashboard)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   daycare-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ Location Tutor  │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Pet Service     │   │ 001_init.sql │  │   │
//! │  │   │ DbConfig      │    │ Scheduling Note │   │              │  │   │
//! │  │   └───────────────┘    └────────┬────────┘   └──────────────┘  │   │
//! │  │                                 │ pricing / issuance rules      │   │
//! │  │                                 ▼                               │   │
//! │  │                           daycare-core                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (daycare.db)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use daycare_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let scheduling = db.schedulings().save(draft).await?;
//! let note = db.notes().issue(&scheduling.id, &actor, &ModelPermissions).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::location::LocationRepository;
pub use repository::note::NoteRepository;
pub use repository::pet::{NewPet, PetRepository};
pub use repository::scheduling::SchedulingRepository;
pub use repository::service::{NewService, ServiceRepository};
pub use repository::tutor::{NewTutor, TutorRepository};
