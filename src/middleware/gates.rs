//! Role and survey gates.
//!
//! Each gate resolves the [`Principal`] once and leaves it in the request
//! extensions, so the handler behind it extracts the same value without a
//! second storage lookup.

use crate::domain::models::{Principal, UserRole};
use crate::error::{AppError, AppResult};
use axum::{extract::Request, middleware::Next, response::Response};

pub fn require_role(principal: &Principal, allowed: &[UserRole]) -> AppResult<()> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %principal.id, role = ?principal.role, "Role gate rejected request");
        Err(AppError::Forbidden)
    }
}

/// Learners must finish the onboarding survey; trainers and policymakers pass.
pub fn require_survey_completion(principal: &Principal) -> AppResult<()> {
    if principal.role == UserRole::Learner && !principal.survey_completed {
        return Err(AppError::SurveyRequired);
    }
    Ok(())
}

pub async fn survey_required(principal: Principal, request: Request, next: Next) -> AppResult<Response> {
    require_survey_completion(&principal)?;
    Ok(next.run(request).await)
}

pub async fn learners_only(principal: Principal, request: Request, next: Next) -> AppResult<Response> {
    require_role(&principal, &[UserRole::Learner])?;
    Ok(next.run(request).await)
}

pub async fn policymakers_only(principal: Principal, request: Request, next: Next) -> AppResult<Response> {
    require_role(&principal, &[UserRole::Policymaker])?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(role: UserRole, survey_completed: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "p@example.com".into(),
            role,
            survey_completed,
        }
    }

    #[test]
    fn role_gate() {
        let trainer = principal(UserRole::Trainer, false);
        assert!(require_role(&trainer, &[UserRole::Trainer, UserRole::Policymaker]).is_ok());
        assert!(matches!(
            require_role(&trainer, &[UserRole::Learner]),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn survey_gate_only_binds_learners() {
        assert!(matches!(
            require_survey_completion(&principal(UserRole::Learner, false)),
            Err(AppError::SurveyRequired)
        ));
        assert!(require_survey_completion(&principal(UserRole::Learner, true)).is_ok());
        assert!(require_survey_completion(&principal(UserRole::Trainer, false)).is_ok());
        assert!(require_survey_completion(&principal(UserRole::Policymaker, false)).is_ok());
    }
}
