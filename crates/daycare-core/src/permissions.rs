//! # Permissions
//!
//! The authorization predicate the core consumes:
//! `can(actor, action, entity) -> bool`.
//!
//! Permissions are model-level codenames of the form `<action>_<entity>`
//! (`add_note`, `change_scheduling`), written with the app label when shown
//! to humans: `daycare.add_note`.
//!
//! ```rust
//! use daycare_core::permissions::{Action, Actor, Authorizer, EntityKind, ModelPermissions};
//!
//! let clerk = Actor::new("clerk").with_permission(Action::Add, EntityKind::Note);
//! assert!(ModelPermissions.can(&clerk, Action::Add, EntityKind::Note));
//! assert!(!ModelPermissions.can(&clerk, Action::Delete, EntityKind::Scheduling));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// App label prefixed to permission codenames.
pub const APP_LABEL: &str = "daycare";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Add,
    Change,
    Delete,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    State,
    City,
    Tutor,
    Pet,
    Service,
    Scheduling,
    Note,
}

impl EntityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::State => "state",
            EntityKind::City => "city",
            EntityKind::Tutor => "tutor",
            EntityKind::Pet => "pet",
            EntityKind::Service => "service",
            EntityKind::Scheduling => "scheduling",
            EntityKind::Note => "note",
        }
    }

    const ALL: [EntityKind; 7] = [
        EntityKind::State,
        EntityKind::City,
        EntityKind::Tutor,
        EntityKind::Pet,
        EntityKind::Service,
        EntityKind::Scheduling,
        EntityKind::Note,
    ];
}

/// A single model permission, e.g. `add_note`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Permission {
    pub action: Action,
    pub entity: EntityKind,
}

impl Permission {
    pub const fn new(action: Action, entity: EntityKind) -> Self {
        Permission { action, entity }
    }

    /// `add_note`
    pub fn codename(&self) -> String {
        format!("{}_{}", self.action.as_str(), self.entity.as_str())
    }
}

/// `daycare.add_note`
impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", APP_LABEL, self.codename())
    }
}

/// Accepts both `add_note` and `daycare.add_note`.
impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "permission".to_string(),
            reason: format!("unknown permission '{}'", s),
        };

        let codename = match s.split_once('.') {
            Some((label, codename)) if label == APP_LABEL => codename,
            Some(_) => return Err(invalid()),
            None => s,
        };

        let (action, entity) = codename.split_once('_').ok_or_else(invalid)?;
        let action = [Action::View, Action::Add, Action::Change, Action::Delete]
            .into_iter()
            .find(|a| a.as_str() == action)
            .ok_or_else(invalid)?;
        let entity = EntityKind::ALL
            .into_iter()
            .find(|e| e.as_str() == entity)
            .ok_or_else(invalid)?;

        Ok(Permission::new(action, entity))
    }
}

/// Whoever is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub username: String,
    /// Inactive accounts are denied everything.
    pub is_active: bool,
    /// Active superusers implicitly hold every permission.
    pub is_superuser: bool,
    pub permissions: BTreeSet<Permission>,
}

impl Actor {
    /// An active, non-superuser actor with no permissions.
    pub fn new(username: impl Into<String>) -> Self {
        Actor {
            username: username.into(),
            is_active: true,
            is_superuser: false,
            permissions: BTreeSet::new(),
        }
    }

    pub fn superuser(username: impl Into<String>) -> Self {
        Actor {
            is_superuser: true,
            ..Actor::new(username)
        }
    }

    pub fn with_permission(mut self, action: Action, entity: EntityKind) -> Self {
        self.permissions.insert(Permission::new(action, entity));
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Authorization predicate supplied by the surrounding application.
pub trait Authorizer: Send + Sync {
    fn can(&self, actor: &Actor, action: Action, entity: EntityKind) -> bool;
}

/// Model-level permission policy: active superusers may do anything, other
/// active actors need the exact permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelPermissions;

impl Authorizer for ModelPermissions {
    fn can(&self, actor: &Actor, action: Action, entity: EntityKind) -> bool {
        if !actor.is_active {
            return false;
        }
        actor.is_superuser || actor.permissions.contains(&Permission::new(action, entity))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
