//! Application services and external integrations.

pub mod auth;
pub mod bootstrap;
pub mod email;
pub mod intake;
pub mod invoice_renderer;
pub mod invoices;
pub mod jobs;
pub mod messaging;
pub mod notifications;
pub mod quotes;
pub mod storage;

pub use auth::AuthService;
pub use email::EmailNotifier;
pub use intake::IntakeService;
pub use invoice_renderer::TextInvoiceRenderer;
pub use invoices::InvoiceService;
pub use jobs::JobService;
pub use messaging::MessagingService;
pub use quotes::QuoteService;
pub use storage::FileStorage;
