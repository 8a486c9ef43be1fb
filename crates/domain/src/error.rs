//! Domain error taxonomy.

use thiserror::Error;

use crate::models::Role;

/// Errors raised by domain rules.
///
/// Empty chat messages and repeated invoicing are not errors; they are
/// reported through `MessageOutcome` and `InvoiceOutcome` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("{entity} cannot move from {from} to {to} as {role}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
        role: Role,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}
