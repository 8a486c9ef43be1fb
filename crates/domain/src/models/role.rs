//! Roles and the capabilities they grant.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The single role a user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Translator,
    Manager,
    Admin,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitRequest,
    RespondToQuote,
    ManageQuotes,
    AssignJobs,
    WorkJobs,
    ReviewDeliveries,
    IssueInvoices,
    ManageGlossary,
    ManageRates,
    ViewAuditLog,
    ManageUsers,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Client, Role::Translator, Role::Manager, Role::Admin];

    /// Managers and admins. Admin holds every manager capability.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;
        match capability {
            SubmitRequest | RespondToQuote => *self == Role::Client,
            WorkJobs => *self == Role::Translator,
            ManageQuotes | AssignJobs | ReviewDeliveries | IssueInvoices | ManageGlossary
            | ManageRates | ViewAuditLog => self.is_staff(),
            ManageUsers => *self == Role::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Translator => "translator",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "translator" => Ok(Role::Translator),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("MANAGER".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_staff() {
        assert!(Role::Manager.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(!Role::Client.is_staff());
        assert!(!Role::Translator.is_staff());
    }

    #[test]
    fn test_admin_holds_every_manager_capability() {
        use Capability::*;
        for cap in [
            ManageQuotes,
            AssignJobs,
            ReviewDeliveries,
            IssueInvoices,
            ManageGlossary,
            ManageRates,
            ViewAuditLog,
        ] {
            assert!(Role::Manager.can(cap));
            assert!(Role::Admin.can(cap));
        }
        assert!(Role::Admin.can(ManageUsers));
        assert!(!Role::Manager.can(ManageUsers));
    }

    #[test]
    fn test_client_and_translator_capabilities() {
        use Capability::*;
        assert!(Role::Client.can(SubmitRequest));
        assert!(Role::Client.can(RespondToQuote));
        assert!(!Role::Client.can(WorkJobs));
        assert!(Role::Translator.can(WorkJobs));
        assert!(!Role::Translator.can(RespondToQuote));
        assert!(!Role::Manager.can(SubmitRequest));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Translator).unwrap(), "\"translator\"");
    }
}
