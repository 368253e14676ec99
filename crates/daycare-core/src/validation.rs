//! # Validation Module
//!
//! Input validation utilities for the daycare.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Forms (presentation)                                         │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure Rust, before any write)                    │
//! │  ├── Discount range, name lengths, CPF shape                           │
//! │  └── Cross-entity rules: pet ↔ tutor, city ↔ state                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK / UNIQUE constraints                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{City, DiscountRate, Pet, SchedulingDraft};
use crate::{MAX_CPF_LEN, MAX_NAME_LEN, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name-like field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
///
/// ## Example
/// ```rust
/// use daycare_core::validation::validate_required;
///
/// assert!(validate_required("name", "Rex", 100).is_ok());
/// assert!(validate_required("name", "   ", 100).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an entity name (tutor, pet, service, city, state).
pub fn validate_name(value: &str) -> ValidationResult<()> {
    validate_required("name", value, MAX_NAME_LEN)
}

/// Validates a CPF as typed by staff.
///
/// ## Rules
/// - Required, at most 14 characters (`000.000.000-00`)
/// - Digits plus the `.` and `-` mask characters only
/// - Exactly 11 digits
pub fn validate_cpf(cpf: &str) -> ValidationResult<()> {
    validate_required("cpf", cpf, MAX_CPF_LEN)?;

    let cpf = cpf.trim();
    if !cpf.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "cpf".to_string(),
            reason: "only digits, '.' and '-' are allowed".to_string(),
        });
    }

    if cpf.chars().filter(|c| c.is_ascii_digit()).count() != 11 {
        return Err(ValidationError::InvalidFormat {
            field: "cpf".to_string(),
            reason: "must contain 11 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional e-mail address. Only the shape is checked.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a state abbreviation: exactly two ASCII letters.
pub fn validate_abbreviation(abbreviation: &str) -> ValidationResult<()> {
    let abbreviation = abbreviation.trim();
    if abbreviation.len() != 2 || !abbreviation.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "abbreviation".to_string(),
            reason: "must be two letters".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a service price.
///
/// ## Rules
/// - Zero is allowed (complimentary services)
/// - Must not exceed MAX_PRICE_CENTS (R$ 99,999,999.99)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a percentage discount: 0% to 100% inclusive.
///
/// ## Example
/// ```rust
/// use daycare_core::types::DiscountRate;
/// use daycare_core::validation::validate_discount;
///
/// assert!(validate_discount(DiscountRate::from_percent(100)).is_ok());
/// assert!(validate_discount(DiscountRate::from_bps(10_001)).is_err());
/// ```
pub fn validate_discount(rate: DiscountRate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "percentage_discount".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Cross-Entity Validators
// =============================================================================

/// A pet may only be scheduled under its own tutor.
pub fn validate_pet_owner(pet: &Pet, tutor_id: &str) -> ValidationResult<()> {
    if pet.tutor_id != tutor_id {
        return Err(ValidationError::PetTutorMismatch {
            pet_id: pet.id.clone(),
            tutor_id: tutor_id.to_string(),
        });
    }
    Ok(())
}

/// A tutor's city must be in the tutor's state; a city needs a state.
pub fn validate_city_in_state(city: &City, state_id: Option<&str>) -> ValidationResult<()> {
    match state_id {
        Some(state_id) if state_id == city.state_id => Ok(()),
        Some(state_id) => Err(ValidationError::CityStateMismatch {
            city_id: city.id.clone(),
            state_id: state_id.to_string(),
        }),
        None => Err(ValidationError::Required {
            field: "state".to_string(),
        }),
    }
}

/// Checks the parts of a scheduling draft that need no database.
pub fn validate_scheduling_draft(draft: &SchedulingDraft) -> ValidationResult<()> {
    validate_required("tutor", &draft.tutor_id, 64)?;
    validate_required("pet", &draft.pet_id, 64)?;
    validate_discount(draft.percentage_discount)?;

    if draft.service_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "services".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
