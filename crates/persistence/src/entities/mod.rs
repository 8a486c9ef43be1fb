//! Entity definitions (database row mappings).

pub mod audit_log;
pub mod invoice;
pub mod job;
pub mod message;
pub mod quote;
pub mod rate;
pub mod request;
pub mod term;
pub mod user;

pub use audit_log::AuditLogEntity;
pub use invoice::InvoiceEntity;
pub use job::{JobEntity, JobSummaryEntity};
pub use message::MessageEntity;
pub use quote::QuoteEntity;
pub use rate::RateEntity;
pub use request::{RequestEntity, RequestSummary, RequestSummaryEntity};
pub use term::TermEntity;
pub use user::UserEntity;
