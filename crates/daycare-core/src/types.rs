//! # Domain Types
//!
//! Core domain types used throughout the daycare.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐      │
//! │  │    State     │◄───│    City      │    │       Service        │      │
//! │  │  name, UF    │    │  state_id    │    │  name, price (Money) │      │
//! │  └──────▲───────┘    └──────▲───────┘    └──────────▲───────────┘      │
//! │         │                   │                       │ many-to-many     │
//! │  ┌──────┴───────────────────┴───┐        ┌──────────┴───────────┐      │
//! │  │           Tutor              │◄───────│      Scheduling      │      │
//! │  │  name, cpf, contact          │        │  tutor, pet, status  │      │
//! │  └──────▲───────────────────────┘        │  discount, totals    │      │
//! │         │                                └──────────▲───────────┘      │
//! │  ┌──────┴───────┐                                   │ one-to-one       │
//! │  │     Pet      │◄── scheduled under its tutor ┌────┴─────┐            │
//! │  │  tutor_id    │                              │   Note   │            │
//! │  └──────────────┘                              │ number   │            │
//! │                                                └──────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity uses a UUID v4 string `id`, except `Note`, whose identity is
//! the sequential `note_number` printed on the paper note.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount represented in basis points (bps).
///
/// ## Why Basis Points?
/// The discount is a decimal percentage with two places, so `12.50%` is
/// exactly `1250` bps and `100%` is `10000`. No fractions, no floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from a whole percentage (`10` → 10%).
    ///
    /// Saturates at `u32::MAX` bps; anything above 100% is still rejected
    /// by [`validate_discount`](crate::validation::validate_discount).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        DiscountRate(percent.saturating_mul(100))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

/// Formats as a two-place percentage: `12.50%`.
impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Parses `"10"`, `"12.5"` or `"12.50"` into basis points.
///
/// Range is not checked here; see
/// [`validate_discount`](crate::validation::validate_discount).
impl FromStr for DiscountRate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('%');
        // Same shape as an amount: at most two decimal places
        let hundredths = s
            .parse::<Money>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "percentage_discount".to_string(),
                reason: "expected a percentage with at most two decimal places".to_string(),
            })?
            .cents();

        u32::try_from(hundredths)
            .map(DiscountRate)
            .map_err(|_| ValidationError::OutOfRange {
                field: "percentage_discount".to_string(),
                min: 0,
                max: 100,
            })
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment status of a scheduling.
///
/// The boundary vocabulary is exactly `"paid"` / `"pending"`; serde, SQL and
/// `FromStr` all reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment has been confirmed.
    Paid,
    /// Payment is still outstanding.
    Pending,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["paid".to_string(), "pending".to_string()],
            }),
        }
    }
}

// =============================================================================
// Location Reference Data
// =============================================================================

/// A Brazilian state (UF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct State {
    pub id: String,
    pub name: String,
    /// Two-letter code, unique ("SP", "RJ", ...).
    pub abbreviation: String,
}

/// A city, always belonging to one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct City {
    pub id: String,
    pub state_id: String,
    pub name: String,
}

// =============================================================================
// Tutor
// =============================================================================

/// How the tutor first heard about the daycare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReferralSource {
    Internet,
    Friend,
    VetReferral,
    SocialMedia,
    Flyer,
    WalkBy,
    PetEvent,
    Other,
}

/// A pet owner and paying customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tutor {
    pub id: String,
    pub name: String,
    /// Brazilian taxpayer id, unique. Stored as typed (with or without mask).
    pub cpf: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_id: Option<String>,
    /// Must belong to `state_id` when both are set.
    pub city_id: Option<String>,
    pub referral_source: Option<ReferralSource>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Pet
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PetSex {
    Male,
    Female,
}

/// A pet, owned by exactly one tutor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Pet {
    pub id: String,
    pub tutor_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    /// Free text ("2 years", "8 months").
    pub age: Option<String>,
    pub sex: Option<PetSex>,
    /// Weight in kilograms. Informational only, never used in pricing.
    pub weight: Option<f64>,
    pub medical_observations: Option<String>,
    /// Path of an already-uploaded photo.
    pub photo_path: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Service
// =============================================================================

/// A billable service (bath, grooming, day care, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Current price. Changing it does not touch totals already computed.
    pub price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Label used in selection lists: `Bath - R$ 40.00`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.price)
    }
}

// =============================================================================
// Scheduling
// =============================================================================

/// A booked visit for one pet, with a set of attached services.
///
/// `gross_total_value` and `total_value` are caches of the pricing engine's
/// output; they are only ever written by
/// [`pricing::recompute`](crate::pricing::recompute).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Scheduling {
    pub id: String,
    pub tutor_id: String,
    pub pet_id: String,
    /// Attached services, sorted and without duplicates.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub service_ids: Vec<String>,
    #[ts(as = "String")]
    pub date_scheduling: NaiveDate,
    pub status: PaymentStatus,
    pub percentage_discount: DiscountRate,
    pub observations: Option<String>,
    pub gross_total_value: Money,
    pub total_value: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or editing a scheduling.
///
/// Totals are deliberately absent: they are always derived.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SchedulingDraft {
    /// `None` creates a new scheduling; `Some` edits an existing one.
    pub id: Option<String>,
    pub tutor_id: String,
    pub pet_id: String,
    pub service_ids: Vec<String>,
    #[ts(as = "String")]
    pub date_scheduling: NaiveDate,
    pub status: PaymentStatus,
    pub percentage_discount: DiscountRate,
    pub observations: Option<String>,
}

impl SchedulingDraft {
    /// Service ids as a set: sorted, duplicates collapsed.
    pub fn unique_service_ids(&self) -> Vec<String> {
        let mut ids = self.service_ids.clone();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Filter for the scheduling list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SchedulingFilter {
    /// Case-insensitive substring of the tutor's name.
    pub tutor_name: Option<String>,
    pub status: Option<PaymentStatus>,
}

// =============================================================================
// Note
// =============================================================================

/// An immutable payment-confirmation record, one per paid scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Note {
    /// Sequential, unique, never reused.
    pub note_number: i64,
    pub scheduling_id: String,
    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note {}", self.note_number)
    }
}

/// Everything a printed note shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NoteDetail {
    pub note: Note,
    pub scheduling: Scheduling,
    pub tutor_name: String,
    pub pet_name: String,
    pub services: Vec<Service>,
    /// `gross_total_value - total_value`, derived on read.
    pub discount_amount: Money,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Staff dashboard figures.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub total_pets: i64,
    pub total_tutors: i64,
    pub paid_count: i64,
    pub pending_count: i64,
    pub total_paid: Money,
    pub total_pending: Money,
    /// Mean `total_value` over all schedulings.
    pub average_ticket: Money,
    /// Next schedulings on or after the reference date, soonest first.
    pub upcoming: Vec<Scheduling>,
}

// =============================================================================
// Unit Tests
// =============================================================================
