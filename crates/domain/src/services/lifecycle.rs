//! Status machines for jobs and quotes.
//!
//! Each machine is a table of `(from, to, roles)` edges. Model setters stay
//! unconditional; every caller that changes a status on behalf of a user goes
//! through `authorize` first.

use chrono::{DateTime, Utc};

use crate::models::{Job, JobStatus, QuoteStatus, Role};
use crate::DomainError;

const STAFF: &[Role] = &[Role::Manager, Role::Admin];
const TRANSLATOR: &[Role] = &[Role::Translator];
const CLIENT: &[Role] = &[Role::Client];

struct Edge<S> {
    from: S,
    to: S,
    roles: &'static [Role],
}

const fn edge<S>(from: S, to: S, roles: &'static [Role]) -> Edge<S> {
    Edge { from, to, roles }
}

fn find<S: PartialEq + Copy>(edges: &[Edge<S>], from: S, to: S, role: Role) -> bool {
    edges
        .iter()
        .any(|e| e.from == from && e.to == to && e.roles.contains(&role))
}

pub struct JobStateMachine;

impl JobStateMachine {
    const EDGES: &'static [Edge<JobStatus>] = &[
        edge(JobStatus::New, JobStatus::Assigned, STAFF),
        edge(JobStatus::Assigned, JobStatus::InProgress, TRANSLATOR),
        edge(JobStatus::Assigned, JobStatus::Delivered, TRANSLATOR),
        edge(JobStatus::InProgress, JobStatus::Delivered, TRANSLATOR),
        edge(JobStatus::Delivered, JobStatus::Accepted, STAFF),
        // Return to translator.
        edge(JobStatus::Delivered, JobStatus::Assigned, STAFF),
        edge(JobStatus::Accepted, JobStatus::Assigned, STAFF),
    ];

    pub fn is_allowed(from: JobStatus, to: JobStatus, role: Role) -> bool {
        find(Self::EDGES, from, to, role)
    }

    pub fn authorize(from: JobStatus, to: JobStatus, role: Role) -> Result<(), DomainError> {
        if Self::is_allowed(from, to, role) {
            Ok(())
        } else {
            Err(DomainError::IllegalTransition {
                entity: "job",
                from: from.to_string(),
                to: to.to_string(),
                role,
            })
        }
    }

    /// Statuses `role` may move a job to from `from`.
    pub fn next_states(from: JobStatus, role: Role) -> Vec<JobStatus> {
        Self::EDGES
            .iter()
            .filter(|e| e.from == from && e.roles.contains(&role))
            .map(|e| e.to)
            .collect()
    }

    /// Authorizes and applies a transition.
    pub fn advance(
        job: &mut Job,
        to: JobStatus,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        Self::authorize(job.status, to, role)?;
        job.transition(to, now);
        Ok(())
    }
}

pub struct QuoteStateMachine;

impl QuoteStateMachine {
    const EDGES: &'static [Edge<QuoteStatus>] = &[
        edge(QuoteStatus::Draft, QuoteStatus::Sent, STAFF),
        // Resending after a price correction.
        edge(QuoteStatus::Sent, QuoteStatus::Sent, STAFF),
        edge(QuoteStatus::Sent, QuoteStatus::Approved, CLIENT),
        edge(QuoteStatus::Sent, QuoteStatus::Rejected, CLIENT),
    ];

    pub fn is_allowed(from: QuoteStatus, to: QuoteStatus, role: Role) -> bool {
        find(Self::EDGES, from, to, role)
    }

    pub fn authorize(from: QuoteStatus, to: QuoteStatus, role: Role) -> Result<(), DomainError> {
        if Self::is_allowed(from, to, role) {
            Ok(())
        } else {
            Err(DomainError::IllegalTransition {
                entity: "quote",
                from: from.to_string(),
                to: to.to_string(),
                role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const ALL_JOB: [JobStatus; 5] = [
        JobStatus::New,
        JobStatus::Assigned,
        JobStatus::InProgress,
        JobStatus::Delivered,
        JobStatus::Accepted,
    ];

    #[test]
    fn test_happy_path_edges() {
        assert!(JobStateMachine::is_allowed(JobStatus::New, JobStatus::Assigned, Role::Manager));
        assert!(JobStateMachine::is_allowed(JobStatus::Assigned, JobStatus::InProgress, Role::Translator));
        assert!(JobStateMachine::is_allowed(JobStatus::InProgress, JobStatus::Delivered, Role::Translator));
        assert!(JobStateMachine::is_allowed(JobStatus::Delivered, JobStatus::Accepted, Role::Admin));
    }

    #[test]
    fn test_return_loop() {
        assert!(JobStateMachine::is_allowed(JobStatus::Delivered, JobStatus::Assigned, Role::Manager));
        assert!(JobStateMachine::is_allowed(JobStatus::Accepted, JobStatus::Assigned, Role::Manager));
        assert!(!JobStateMachine::is_allowed(JobStatus::Delivered, JobStatus::Assigned, Role::Translator));
    }

    #[test]
    fn test_clients_never_move_jobs() {
        for from in ALL_JOB {
            assert!(JobStateMachine::next_states(from, Role::Client).is_empty());
        }
    }

    #[test]
    fn test_no_skipping_or_self_loops() {
        for status in ALL_JOB {
            for role in Role::ALL {
                assert!(!JobStateMachine::is_allowed(status, status, role));
            }
        }
        assert!(!JobStateMachine::is_allowed(JobStatus::New, JobStatus::Delivered, Role::Translator));
        assert!(!JobStateMachine::is_allowed(JobStatus::New, JobStatus::Accepted, Role::Manager));
        assert!(!JobStateMachine::is_allowed(JobStatus::Accepted, JobStatus::Delivered, Role::Translator));
    }

    #[test]
    fn test_authorize_reports_edge() {
        let err = JobStateMachine::authorize(JobStatus::New, JobStatus::Delivered, Role::Translator)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "job cannot move from New to Delivered as translator"
        );
    }

    #[test]
    fn test_advance_applies_only_legal_edges() {
        let now = Utc::now();
        let mut job = Job {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            translator_id: Some(Uuid::new_v4()),
            status: JobStatus::Assigned,
            due_date: None,
            notes: None,
            manager_comment: None,
            delivered_filename: None,
            delivered_at: None,
            translated_text: None,
            created_at: now,
            updated_at: now,
        };

        assert!(JobStateMachine::advance(&mut job, JobStatus::Accepted, Role::Manager, now).is_err());
        assert_eq!(job.status, JobStatus::Assigned);

        JobStateMachine::advance(&mut job, JobStatus::Delivered, Role::Translator, now).unwrap();
        assert_eq!(job.status, JobStatus::Delivered);
        assert_eq!(job.delivered_at, Some(now));
    }

    #[test]
    fn test_quote_edges() {
        assert!(QuoteStateMachine::is_allowed(QuoteStatus::Draft, QuoteStatus::Sent, Role::Manager));
        assert!(QuoteStateMachine::is_allowed(QuoteStatus::Sent, QuoteStatus::Approved, Role::Client));
        assert!(QuoteStateMachine::is_allowed(QuoteStatus::Sent, QuoteStatus::Rejected, Role::Client));
        assert!(!QuoteStateMachine::is_allowed(QuoteStatus::Draft, QuoteStatus::Approved, Role::Client));
        assert!(!QuoteStateMachine::is_allowed(QuoteStatus::Sent, QuoteStatus::Approved, Role::Manager));
        assert!(!QuoteStateMachine::is_allowed(QuoteStatus::Approved, QuoteStatus::Rejected, Role::Client));
        assert!(!QuoteStateMachine::is_allowed(QuoteStatus::Rejected, QuoteStatus::Sent, Role::Manager));
    }
}
