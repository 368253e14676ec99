//! # Error Types
//!
//! Domain-specific error types for daycare-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  daycare-core errors                                                   │
//! │  ├── CoreError        - General domain errors (this file)              │
//! │  ├── ValidationError  - Input validation failures (this file)          │
//! │  └── IssuanceError    - Note issuance rejections (issuance.rs)         │
//! │                                                                         │
//! │  daycare-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError / IssuanceError → CoreError → DbError → caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is a condition the user can act on. None of them should
//! ever be turned into a panic.

use thiserror::Error;

use crate::issuance::IssuanceError;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input did not pass validation; nothing was persisted.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Note issuance was rejected; nothing was persisted.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// A scheduling with an issued note cannot go back to pending.
    ///
    /// ## User Workflow
    /// ```text
    /// Scheduling (paid) ──► Note 12 issued
    ///      │
    ///      ▼
    /// Edit: status = pending
    ///      │
    ///      ▼
    /// InvalidStatusChange { scheduling_id, note_number: 12 }
    /// ```
    #[error("Scheduling {scheduling_id} already has note {note_number}; status must stay paid")]
    InvalidStatusChange {
        scheduling_id: String,
        note_number: i64,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any persistence happens, so they are never partially applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed amount, malformed CPF).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The pet is owned by a different tutor than the one scheduling it.
    #[error("Pet {pet_id} does not belong to tutor {tutor_id}")]
    PetTutorMismatch { pet_id: String, tutor_id: String },

    /// A pet with schedulings cannot be handed to another tutor.
    #[error("Pet {pet_id} has {schedulings} scheduling(s) and cannot change tutor")]
    PetHasSchedulings { pet_id: String, schedulings: i64 },

    /// The selected city is not in the selected state.
    #[error("City {city_id} is not in state {state_id}")]
    CityStateMismatch { city_id: String, state_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
