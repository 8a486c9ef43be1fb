//! Domain layer for the Transdesk backend.
//!
//! This crate contains:
//! - Domain models (User, TranslationRequest, Quote, Job, Message, Invoice)
//! - The pricing, lifecycle and messaging rules
//! - Collaborator traits implemented by the API layer
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
