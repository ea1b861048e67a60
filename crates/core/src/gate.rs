//! Reviewer capability gate.
//!
//! The gate is a pure predicate consulted by the workflow engine before
//! every transition attempt. It owns no state and performs no I/O: session
//! handling happens outside the core, and the [`Actor`] it receives was
//! already authenticated by the session layer.

use crate::case::ClinicalCase;
use crate::error::CaseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Role of an authenticated platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Expert,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Learner => "learner",
            Role::Expert => "expert",
            Role::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Role {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learner" => Ok(Role::Learner),
            "expert" => Ok(Role::Expert),
            "admin" => Ok(Role::Admin),
            other => Err(CaseError::Validation(format!(
                "unknown actor role: '{}'",
                other
            ))),
        }
    }
}

/// The authenticated caller, supplied by the session layer on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// Clinical domain the actor is credentialed for. Unused for learners
    /// and not restricting for admins.
    pub domain: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            domain: domain.into(),
        }
    }
}

/// Returns true iff `actor` may perform review actions on `case`.
///
/// True for admins on any case, and for experts whose domain matches the
/// case's domain exactly. Learners can never act. Domain comparison is
/// byte-for-byte; the domain vocabulary is owned by the platform.
pub fn can_act(actor: &Actor, case: &ClinicalCase) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Expert => actor.domain == case.domain,
        Role::Learner => false,
    }
}
