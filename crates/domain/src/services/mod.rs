//! Domain services: pricing, lifecycle rules, messaging and collaborator seams.

pub mod authorization;
pub mod channel;
pub mod extraction;
pub mod invoicing;
pub mod lifecycle;
pub mod notification;
pub mod pricing;
pub mod quality;
pub mod text;

pub use authorization::{can_view, can_view_request, ensure_can_view, require};
pub use channel::{BroadcastReport, ChannelRegistry, ConnectionId, Subscription};
pub use extraction::{
    extract_with_policy, Extraction, ExtractionError, ExtractionPolicy, PlainTextExtractor,
    TextExtractor,
};
pub use invoicing::{invoice_amount, plan_invoice, InvoiceDocument, InvoicePlan, InvoiceRenderer, RenderError};
pub use lifecycle::{JobStateMachine, QuoteStateMachine};
pub use notification::{
    Notification, NotificationError, NotificationTemplate, Notifier, RecordingNotifier,
};
pub use pricing::{compute_total, price, resolve_unit_price, PriceInput};
pub use quality::{run_quality_checks, QualityReport};
pub use text::{count_words, sanitize_message};
