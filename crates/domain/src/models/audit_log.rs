//! Audit log domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Entity types that audit entries point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    User,
    Request,
    Quote,
    Job,
    Message,
    Invoice,
    Term,
    Rate,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::User => "user",
            ObjectType::Request => "request",
            ObjectType::Quote => "quote",
            ObjectType::Job => "job",
            ObjectType::Message => "message",
            ObjectType::Invoice => "invoice",
            ObjectType::Term => "term",
            ObjectType::Rate => "rate",
        }
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ObjectType::User),
            "request" => Ok(ObjectType::Request),
            "quote" => Ok(ObjectType::Quote),
            "job" => Ok(ObjectType::Job),
            "message" => Ok(ObjectType::Message),
            "invoice" => Ok(ObjectType::Invoice),
            "term" => Ok(ObjectType::Term),
            "rate" => Ok(ObjectType::Rate),
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audited actions following the format: resource.operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserCreate,
    RequestCreate,
    QuoteUpdate,
    QuoteSend,
    QuoteApprove,
    QuoteReject,
    JobCreate,
    JobAssign,
    JobStart,
    JobDeliver,
    JobAccept,
    JobReturn,
    MessagePost,
    InvoiceCreate,
    InvoiceIssue,
    TermCreate,
    TermDelete,
    RateUpdate,
}

impl AuditAction {
    pub const ALL: [AuditAction; 20] = [
        AuditAction::UserRegister,
        AuditAction::UserLogin,
        AuditAction::UserCreate,
        AuditAction::RequestCreate,
        AuditAction::QuoteUpdate,
        AuditAction::QuoteSend,
        AuditAction::QuoteApprove,
        AuditAction::QuoteReject,
        AuditAction::JobCreate,
        AuditAction::JobAssign,
        AuditAction::JobStart,
        AuditAction::JobDeliver,
        AuditAction::JobAccept,
        AuditAction::JobReturn,
        AuditAction::MessagePost,
        AuditAction::InvoiceCreate,
        AuditAction::InvoiceIssue,
        AuditAction::TermCreate,
        AuditAction::TermDelete,
        AuditAction::RateUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user.register",
            AuditAction::UserLogin => "user.login",
            AuditAction::UserCreate => "user.create",
            AuditAction::RequestCreate => "request.create",
            AuditAction::QuoteUpdate => "quote.update",
            AuditAction::QuoteSend => "quote.send",
            AuditAction::QuoteApprove => "quote.approve",
            AuditAction::QuoteReject => "quote.reject",
            AuditAction::JobCreate => "job.create",
            AuditAction::JobAssign => "job.assign",
            AuditAction::JobStart => "job.start",
            AuditAction::JobDeliver => "job.deliver",
            AuditAction::JobAccept => "job.accept",
            AuditAction::JobReturn => "job.return",
            AuditAction::MessagePost => "message.post",
            AuditAction::InvoiceCreate => "invoice.create",
            AuditAction::InvoiceIssue => "invoice.issue",
            AuditAction::TermCreate => "term.create",
            AuditAction::TermDelete => "term.delete",
            AuditAction::RateUpdate => "rate.update",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown audit action: {}", s))
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored audit entry. Entries are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// None for system actions.
    pub actor_id: Option<Uuid>,
    pub actor_handle: Option<String>,
    pub action: String,
    pub object_type: String,
    pub object_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// An entry to append, built next to the action it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub object_type: ObjectType,
    pub object_id: Option<Uuid>,
}

impl NewAuditEntry {
    pub fn new(actor_id: impl Into<Option<Uuid>>, action: AuditAction, object_type: ObjectType) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
            object_type,
            object_id: None,
        }
    }

    pub fn system(action: AuditAction, object_type: ObjectType) -> Self {
        Self::new(None::<Uuid>, action, object_type)
    }

    pub fn object(mut self, id: Uuid) -> Self {
        self.object_id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_are_dotted_and_unique() {
        let mut names: Vec<&str> = AuditAction::ALL.iter().map(|a| a.as_str()).collect();
        assert!(names.iter().all(|n| n.contains('.')));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AuditAction::ALL.len());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(
            "quote.approve".parse::<AuditAction>().unwrap(),
            AuditAction::QuoteApprove
        );
        assert!("quote.delete".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_builder() {
        let actor = Uuid::new_v4();
        let job = Uuid::new_v4();
        let entry = NewAuditEntry::new(actor, AuditAction::JobAssign, ObjectType::Job).object(job);

        assert_eq!(entry.actor_id, Some(actor));
        assert_eq!(entry.object_id, Some(job));
        assert_eq!(entry.object_type.as_str(), "job");

        let system = NewAuditEntry::system(AuditAction::UserCreate, ObjectType::User);
        assert_eq!(system.actor_id, None);
    }
}
