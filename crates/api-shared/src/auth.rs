//! Session-boundary parsing for the identity headers.
//!
//! The session layer (an external collaborator) authenticates the user and
//! injects identity headers on every proxied call. This module turns the
//! raw header values into an [`ActorContext`]; it never issues or validates
//! tokens itself. The ingest boundary presents an API key instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Header carrying the authenticated user's stable identifier.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated user's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
/// Header carrying the clinical domain the user is credentialed for.
pub const ACTOR_DOMAIN_HEADER: &str = "x-actor-domain";
/// Header carrying the shared ingest key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Errors raised at the session boundary, before any engine call.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),
    #[error("header {0} is not valid text")]
    InvalidHeader(&'static str),
    #[error("unknown actor role: '{0}'")]
    UnknownRole(String),
    #[error("invalid API key")]
    InvalidApiKey,
}

/// Role as carried in `x-actor-role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Learner,
    Expert,
    Admin,
}

impl ActorRole {
    /// Parses the header value, case-insensitively.
    pub fn from_header_value(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "learner" => Ok(ActorRole::Learner),
            "expert" => Ok(ActorRole::Expert),
            "admin" => Ok(ActorRole::Admin),
            other => Err(AuthError::UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorRole::Learner => "learner",
            ActorRole::Expert => "expert",
            ActorRole::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

/// The authenticated caller as established by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub id: String,
    pub role: ActorRole,
    /// Empty unless the role requires a domain credential.
    pub domain: String,
}

/// Builds an [`ActorContext`] from the raw identity header values.
///
/// `id` and `role` are always required. `domain` is required for experts
/// (their credential is domain-scoped) and optional otherwise.
pub fn actor_context(
    id: Option<&str>,
    role: Option<&str>,
    domain: Option<&str>,
) -> Result<ActorContext, AuthError> {
    let id = id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader(ACTOR_ID_HEADER))?;
    let role = role
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader(ACTOR_ROLE_HEADER))?;
    let role = ActorRole::from_header_value(role)?;

    let domain = domain.map(str::trim).filter(|v| !v.is_empty());
    if role == ActorRole::Expert && domain.is_none() {
        return Err(AuthError::MissingHeader(ACTOR_DOMAIN_HEADER));
    }

    Ok(ActorContext {
        id: id.to_owned(),
        role,
        domain: domain.unwrap_or_default().to_owned(),
    })
}

/// Validates the provided API key against the configured one.
///
/// A missing configured key disables the check (development mode). With a
/// key configured, an absent header is reported distinctly from a wrong
/// one.
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = provided.ok_or(AuthError::MissingHeader(API_KEY_HEADER))?;

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}
