//! HTTP and WebSocket handlers.

pub mod audit_logs;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod invoices;
pub mod jobs;
pub mod messages;
pub mod quotes;
pub mod rates;
pub mod requests;
pub mod terms;
pub mod users;
pub mod ws;
