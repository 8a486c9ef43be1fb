//! Repository implementations for database operations.
//!
//! Reads go through the repository's pool. Writes that must commit together
//! with other changes are associated functions taking the caller's connection.

pub mod audit_log;
pub mod invoice;
pub mod job;
pub mod message;
pub mod quote;
pub mod rate;
pub mod request;
pub mod term;
pub mod user;

pub use audit_log::AuditLogRepository;
pub use invoice::InvoiceRepository;
pub use job::{JobRepository, JobScope};
pub use message::MessageRepository;
pub use quote::QuoteRepository;
pub use rate::RateRepository;
pub use request::{RequestFilter, RequestRepository};
pub use term::TermRepository;
pub use user::UserRepository;
