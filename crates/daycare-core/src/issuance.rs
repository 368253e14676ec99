//! # Note Issuance
//!
//! The rules that decide whether a scheduling may receive its note.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Unissued { Pending } ──(payment confirmed)──► Unissued { Paid }       │
//! │          ▲                                           │                  │
//! │          └────────(payment reverted)─────────────────┤                  │
//! │                                                      │ issue_note       │
//! │                                                      ▼                  │
//! │                                          Issued { note_number }         │
//! │                                          (terminal, no revoke)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precondition Order
//! The first failing check wins and nothing is written:
//! 1. actor holds `add_note` → else [`IssuanceError::PermissionDenied`]
//!    ([`authorize_issuance`], needs no stored data)
//! 2. no note exists yet → else [`IssuanceError::AlreadyIssued`]
//! 3. status is paid → else [`IssuanceError::PaymentPending`]
//!    (2 and 3 in [`check_issuable`], once the scheduling is loaded)

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::permissions::{Action, Actor, Authorizer, EntityKind};
use crate::types::{Note, PaymentStatus, Scheduling};

/// Why a note was not issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuanceError {
    #[error("{username} is not allowed to issue notes (scheduling {scheduling_id})")]
    PermissionDenied {
        username: String,
        scheduling_id: String,
    },

    /// Not a fault: the note the caller wanted already exists.
    #[error("Note {note_number} was already issued for scheduling {scheduling_id}")]
    AlreadyIssued {
        scheduling_id: String,
        note_number: i64,
    },

    #[error("Cannot issue note: scheduling {scheduling_id} has a pending payment")]
    PaymentPending { scheduling_id: String },
}

/// Joint state of payment status and note existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IssuanceState {
    Unissued { status: PaymentStatus },
    Issued { note_number: i64 },
}

impl IssuanceState {
    /// Derives the state from the scheduling's status and its note, if any.
    pub fn of(status: PaymentStatus, note: Option<&Note>) -> Self {
        match note {
            Some(note) => IssuanceState::Issued {
                note_number: note.note_number,
            },
            None => IssuanceState::Unissued { status },
        }
    }

    /// Whether moving to `status` keeps the state valid.
    ///
    /// Once issued, the scheduling stays paid.
    pub fn allows_status(&self, status: PaymentStatus) -> bool {
        match self {
            IssuanceState::Issued { .. } => status == PaymentStatus::Paid,
            IssuanceState::Unissued { .. } => true,
        }
    }
}

/// First precondition: the actor may add notes.
pub fn authorize_issuance(
    authorizer: &dyn Authorizer,
    actor: &Actor,
    scheduling_id: &str,
) -> Result<(), IssuanceError> {
    if !authorizer.can(actor, Action::Add, EntityKind::Note) {
        return Err(IssuanceError::PermissionDenied {
            username: actor.username.clone(),
            scheduling_id: scheduling_id.to_string(),
        });
    }
    Ok(())
}

/// Remaining preconditions, in order: no note yet, then payment confirmed.
///
/// `existing` is the note already recorded for `scheduling`, if any. Call
/// after [`authorize_issuance`]; on `Ok` the caller may create the note.
pub fn check_issuable(scheduling: &Scheduling, existing: Option<&Note>) -> Result<(), IssuanceError> {
    if let Some(note) = existing {
        return Err(IssuanceError::AlreadyIssued {
            scheduling_id: scheduling.id.clone(),
            note_number: note.note_number,
        });
    }

    if scheduling.status != PaymentStatus::Paid {
        return Err(IssuanceError::PaymentPending {
            scheduling_id: scheduling.id.clone(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
