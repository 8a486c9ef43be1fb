//! Visibility and capability checks.

use crate::models::{Capability, Job, Role, TranslationRequest, User};
use crate::DomainError;

/// Whether `user` may see `job`, its messages and its live channel.
///
/// Staff see everything, a client sees jobs on their own requests and a
/// translator sees jobs assigned to them.
pub fn can_view(user: &User, job: &Job) -> bool {
    match user.role {
        Role::Manager | Role::Admin => true,
        Role::Client => job.client_id == user.id,
        Role::Translator => job.translator_id == Some(user.id),
    }
}

pub fn ensure_can_view(user: &User, job: &Job) -> Result<(), DomainError> {
    if can_view(user, job) {
        Ok(())
    } else {
        Err(DomainError::forbidden("You do not have access to this job"))
    }
}

/// Requests are visible to their owner and to staff.
pub fn can_view_request(user: &User, request: &TranslationRequest) -> bool {
    user.is_staff() || request.client_id == user.id
}

pub fn require(user: &User, capability: Capability) -> Result<(), DomainError> {
    if user.role.can(capability) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "A {} can not perform this action",
            user.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            handle: format!("{}-x", role),
            role,
            created_at: Utc::now(),
        }
    }

    fn job(client_id: Uuid, translator_id: Option<Uuid>) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            client_id,
            translator_id,
            status: JobStatus::Assigned,
            due_date: None,
            notes: None,
            manager_comment: None,
            delivered_filename: None,
            delivered_at: None,
            translated_text: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_staff_see_everything() {
        let job = job(Uuid::new_v4(), None);
        assert!(can_view(&user(Role::Manager), &job));
        assert!(can_view(&user(Role::Admin), &job));
    }

    #[test]
    fn test_client_sees_own_jobs_only() {
        let client = user(Role::Client);
        assert!(can_view(&client, &job(client.id, None)));
        assert!(!can_view(&client, &job(Uuid::new_v4(), None)));
    }

    #[test]
    fn test_translator_sees_assigned_jobs_only() {
        let translator = user(Role::Translator);
        assert!(can_view(&translator, &job(Uuid::new_v4(), Some(translator.id))));
        assert!(!can_view(&translator, &job(Uuid::new_v4(), Some(Uuid::new_v4()))));
        assert!(!can_view(&translator, &job(Uuid::new_v4(), None)));
    }

    #[test]
    fn test_translator_id_matching_client_id_does_not_leak() {
        // A translator whose id happens to equal the client id gains nothing.
        let translator = user(Role::Translator);
        assert!(!can_view(&translator, &job(translator.id, None)));
    }

    #[test]
    fn test_ensure_and_require() {
        let client = user(Role::Client);
        let job = job(Uuid::new_v4(), None);
        assert!(matches!(
            ensure_can_view(&client, &job),
            Err(DomainError::Forbidden(_))
        ));
        assert!(require(&client, Capability::SubmitRequest).is_ok());
        assert!(require(&client, Capability::AssignJobs).is_err());
    }
}
