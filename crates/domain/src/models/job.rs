//! Job domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{Role, User};
use crate::DomainError;

/// Job status. See `JobStateMachine` for the allowed edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    New,
    Assigned,
    InProgress,
    Delivered,
    Accepted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "New",
            JobStatus::Assigned => "Assigned",
            JobStatus::InProgress => "InProgress",
            JobStatus::Delivered => "Delivered",
            JobStatus::Accepted => "Accepted",
        }
    }

    /// Work has not been handed in yet.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            JobStatus::New | JobStatus::Assigned | JobStatus::InProgress
        )
    }

    /// A deliverable exists, so the job can be invoiced.
    pub fn is_invoiceable(&self) -> bool {
        matches!(self, JobStatus::Delivered | JobStatus::Accepted)
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(JobStatus::New),
            "Assigned" => Ok(JobStatus::Assigned),
            "InProgress" => Ok(JobStatus::InProgress),
            "Delivered" => Ok(JobStatus::Delivered),
            "Accepted" => Ok(JobStatus::Accepted),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of translator work for an approved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub request_id: Uuid,
    /// Owner of the request, carried along for visibility checks.
    pub client_id: Uuid,
    pub translator_id: Option<Uuid>,
    pub status: JobStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub manager_comment: Option<String>,
    pub delivered_filename: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub translated_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Sets or clears the translator.
    ///
    /// A non-translator assignee is rejected without touching the job. Due
    /// date and notes are always overwritten and the manager comment cleared.
    /// A job in `New` advances to `Assigned` once it has a translator;
    /// clearing the translator never moves the status back.
    pub fn assign(
        &mut self,
        translator: Option<&User>,
        due_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(user) = translator {
            if user.role != Role::Translator {
                return Err(DomainError::InvalidAssignment(format!(
                    "{} is a {}, not a translator",
                    user.handle, user.role
                )));
            }
        }

        self.translator_id = translator.map(|u| u.id);
        if self.translator_id.is_some() && self.status == JobStatus::New {
            self.status = JobStatus::Assigned;
        }
        self.due_date = due_date;
        self.notes = notes;
        self.manager_comment = None;
        Ok(())
    }

    /// Unconditional status setter. Stamps `delivered_at` on delivery.
    pub fn transition(&mut self, status: JobStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == JobStatus::Delivered {
            self.delivered_at = Some(now);
        }
    }

    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.translator_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            translator_id: None,
            status: JobStatus::New,
            due_date: None,
            notes: Some("glossary attached".into()),
            manager_comment: Some("fix headings".into()),
            delivered_filename: None,
            delivered_at: None,
            translated_text: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            handle: format!("{}-1", role),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assign_translator_advances_new_job() {
        let mut job = job();
        let translator = user(Role::Translator);
        let due = Utc::now();

        job.assign(Some(&translator), Some(due), None).unwrap();

        assert_eq!(job.translator_id, Some(translator.id));
        assert_eq!(job.status, JobStatus::Assigned);
        assert_eq!(job.due_date, Some(due));
        assert_eq!(job.notes, None);
        assert_eq!(job.manager_comment, None);
    }

    #[test]
    fn test_assign_wrong_role_leaves_job_untouched() {
        for role in [Role::Client, Role::Manager, Role::Admin] {
            let mut job = job();
            let previous = user(Role::Translator);
            job.translator_id = Some(previous.id);
            let before = job.clone();

            let result = job.assign(Some(&user(role)), None, None);

            assert!(matches!(result, Err(DomainError::InvalidAssignment(_))));
            assert_eq!(job, before);
        }
    }

    #[test]
    fn test_clearing_translator_keeps_status() {
        let mut job = job();
        job.assign(Some(&user(Role::Translator)), None, None).unwrap();

        job.assign(None, None, Some("waiting".into())).unwrap();

        assert_eq!(job.translator_id, None);
        assert_eq!(job.status, JobStatus::Assigned);
        assert_eq!(job.notes.as_deref(), Some("waiting"));
    }

    #[test]
    fn test_reassign_in_progress_keeps_status() {
        let mut job = job();
        job.status = JobStatus::InProgress;

        job.assign(Some(&user(Role::Translator)), None, None).unwrap();

        assert_eq!(job.status, JobStatus::InProgress);
    }

    #[test]
    fn test_transition_stamps_delivery() {
        let mut job = job();
        let now = Utc::now();

        job.transition(JobStatus::InProgress, now);
        assert_eq!(job.delivered_at, None);

        job.transition(JobStatus::Delivered, now);
        assert_eq!(job.status, JobStatus::Delivered);
        assert_eq!(job.delivered_at, Some(now));
    }

    #[test]
    fn test_status_helpers() {
        assert!(JobStatus::New.is_open());
        assert!(JobStatus::InProgress.is_open());
        assert!(!JobStatus::Delivered.is_open());
        assert!(JobStatus::Delivered.is_invoiceable());
        assert!(JobStatus::Accepted.is_invoiceable());
        assert!(!JobStatus::Assigned.is_invoiceable());
        assert_eq!("InProgress".parse::<JobStatus>().unwrap(), JobStatus::InProgress);
    }
}
