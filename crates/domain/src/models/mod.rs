//! Domain models.

pub mod audit_log;
pub mod invoice;
pub mod job;
pub mod message;
pub mod quote;
pub mod rate;
pub mod request;
pub mod role;
pub mod term;
pub mod user;

pub use audit_log::{AuditAction, AuditLogEntry, NewAuditEntry, ObjectType};
pub use invoice::{Invoice, InvoiceOutcome, InvoiceStatus};
pub use job::{Job, JobStatus};
pub use message::{ChatEvent, Message, MessageOutcome, MessagePayload, EMPTY_MESSAGE_WARNING};
pub use quote::{Quote, QuoteStatus};
pub use rate::Rate;
pub use request::{NewTranslationRequest, RequestStatus, TranslationRequest};
pub use role::{Capability, Role};
pub use term::{CreateTermRequest, Term};
pub use user::User;
