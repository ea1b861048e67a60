//! # CCR Core
//!
//! Core business logic for the CCR clinical-case review workflow.
//!
//! This crate contains the server-held review state machine and its storage:
//! - Case records and the review status model (`case`)
//! - Sharded JSON case storage with compare-and-swap transitions (`store`)
//! - The reviewer capability gate (`gate`)
//! - The workflow engine driving transitions (`engine`)
//! - Rejection notices, outbox transport and retry policy (`notify`)
//! - Per-case audit trail records (`audit`)
//!
//! **No API concerns**: actor headers, HTTP servers or OpenAPI documents
//! belong in `api-rest` and `api-shared`.

pub mod audit;
pub mod case;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ident;
pub mod notify;
pub mod store;

pub use audit::{AuditAction, AuditRecord};
pub use case::{
    CaseStatus, CaseSummary, ClinicalCase, DecisionNote, Difficulty, DraftCase, EditableFields,
};
pub use config::CoreConfig;
pub use engine::ReviewService;
pub use error::{CaseError, CaseResult};
pub use gate::{can_act, Actor, Role};
pub use ident::CaseId;
pub use notify::{
    NotificationDispatcher, NotificationSink, NotificationTransport, NullSink, OutboxTransport,
    RejectionNotice, RetryPolicy,
};
pub use store::{CaseStore, ListScope, RejectionDetails, TransitionMetadata};

pub use ccr_types::{EmailAddress, NonEmptyText, TextError};
