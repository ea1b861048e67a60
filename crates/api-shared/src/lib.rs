//! # API Shared
//!
//! Shared utilities and definitions for the CCR API surface.
//!
//! Contains:
//! - The wire error body every endpoint returns on failure (`dto`)
//! - Shared services like `HealthService`
//! - Session-boundary utilities: actor headers and API-key checks (`auth`)
//!
//! This crate is a leaf: it knows nothing about the workflow engine and can
//! be reused by any future API binding.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::ErrorBody;
pub use health::HealthService;
