//! Role checks shared by the user, assignment and plan handlers.

use crate::{error::AppError, users::repo_types::User};

/// Which plans a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanScope {
    All,
    Owner(i64),
}

impl PlanScope {
    pub fn owner(self) -> Option<i64> {
        match self {
            PlanScope::All => None,
            PlanScope::Owner(id) => Some(id),
        }
    }
}

/// Admins see every plan; everyone else sees their own.
pub fn plan_list_scope(user: &User) -> PlanScope {
    if user.is_admin {
        PlanScope::All
    } else {
        PlanScope::Owner(user.id)
    }
}

pub fn require_admin(user: &User, action: &str) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Not authorized to {action}")))
    }
}

/// Admin sign-up needs the shared code; with no code configured it is closed.
pub fn check_admin_registration(
    wants_admin: bool,
    supplied: Option<&str>,
    expected: Option<&str>,
) -> Result<(), AppError> {
    if !wants_admin {
        return Ok(());
    }
    match (supplied, expected) {
        (Some(given), Some(code)) if given == code => Ok(()),
        _ => Err(AppError::Forbidden("Invalid admin code".into())),
    }
}
