//! # daycare-core: Pure Business Logic for the Pet Daycare
//!
//! This crate is the **heart** of the daycare system. It holds the pricing
//! engine and the note-issuance rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pet Daycare Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Presentation (forms, lists, printed notes)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                daycare-db (transactions, SQLite)                │   │
//! │  │   save_scheduling: associate → recompute → persist totals      │   │
//! │  │   issue_note:      check → insert note (UNIQUE scheduling)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ daycare-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────────┐         │   │
//! │  │   │  types  │ │  money  │ │ pricing  │ │  issuance   │         │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────────┘         │   │
//! │  │   ┌─────────────┐ ┌─────────────┐                               │   │
//! │  │   │ permissions │ │ validation  │   NO I/O • PURE FUNCTIONS     │   │
//! │  │   └─────────────┘ └─────────────┘                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Tutor, Pet, Service, Scheduling, Note, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Gross and discounted totals of a scheduling
//! - [`issuance`] - Note issuance preconditions and state
//! - [`permissions`] - Authorization predicate
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use daycare_core::money::Money;
//! use daycare_core::pricing::Totals;
//! use daycare_core::types::DiscountRate;
//!
//! let prices = [Money::from_cents(4000), Money::from_cents(2500)];
//! let totals = Totals::compute(prices, DiscountRate::from_percent(20));
//!
//! assert_eq!(totals.gross_total_value.cents(), 6500);
//! assert_eq!(totals.total_value.cents(), 5200);
//! assert_eq!(totals.discount_amount().cents(), 1300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod issuance;
pub mod money;
pub mod permissions;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use issuance::{IssuanceError, IssuanceState};
pub use money::Money;
pub use permissions::{Action, Actor, Authorizer, EntityKind, ModelPermissions, Permission};
pub use pricing::Totals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of names (tutor, pet, service, city, state).
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a CPF including its mask (`000.000.000-00`).
pub const MAX_CPF_LEN: usize = 14;

/// Highest service price in cents (R$ 99,999,999.99).
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// How many upcoming schedulings the dashboard lists.
pub const DASHBOARD_UPCOMING_LIMIT: i64 = 5;
