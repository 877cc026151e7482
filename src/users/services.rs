use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    dto::CreateUserRequest,
    repo_types::{NewUser, User},
};
use crate::{
    assignments::AssignmentRegistry,
    auth::{password::hash_password, policy::check_admin_registration},
    db::{DuplicateEmail, Store},
    error::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registers a user. When `caller` is an admin, a new client is assigned to them.
pub async fn register_user(
    store: &dyn Store,
    admin_code: Option<&str>,
    req: CreateUserRequest,
    caller: Option<&User>,
) -> Result<User, AppError> {
    let email = req.email.trim().to_string();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if let Err(e) = check_admin_registration(req.is_admin, req.admin_code.as_deref(), admin_code) {
        warn!(email = %email, "admin registration with invalid code");
        return Err(e);
    }

    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .create_user(&NewUser {
            email,
            password_hash,
            full_name: req.full_name.trim().to_string(),
            is_admin: req.is_admin,
        })
        .await
        .map_err(|e| {
            if e.is::<DuplicateEmail>() {
                warn!("email registered concurrently");
                AppError::Conflict("Email already registered".into())
            } else {
                AppError::Internal(e)
            }
        })?;
    info!(user_id = user.id, is_admin = user.is_admin, "user registered");

    if let Some(admin) = caller.filter(|c| c.is_admin && !user.is_admin) {
        AssignmentRegistry::new(store)
            .link(admin, user.id)
            .await
            .map_err(|e| {
                error!(user_id = user.id, admin_id = admin.id, error = %e, "user stored but assignment failed");
                e
            })?;
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::password::verify_password, db::memory::MemoryStore};

    fn request(email: &str, is_admin: bool, code: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            password: "long-enough-pw".into(),
            full_name: " Pat Doe ".into(),
            is_admin,
            admin_code: code.map(Into::into),
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("pat@example.com"));
        assert!(!is_valid_email("pat@example"));
        assert!(!is_valid_email("pat example.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn registers_client_with_hashed_password() {
        let store = MemoryStore::new();
        let user = register_user(&store, None, request(" pat@example.com ", false, None), None)
            .await
            .unwrap();

        assert_eq!(user.email, "pat@example.com");
        assert_eq!(user.full_name, "Pat Doe");
        assert!(!user.is_admin);
        assert!(verify_password("long-enough-pw", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn admin_without_correct_code_is_forbidden_and_not_stored() {
        let store = MemoryStore::new();
        for code in [None, Some("wrong")] {
            let err = register_user(&store, Some("letmein"), request("boss@example.com", true, code), None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
        let err = register_user(&store, None, request("boss@example.com", true, Some("letmein")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(store.user_count(), 0);

        let admin = register_user(&store, Some("letmein"), request("boss@example.com", true, Some("letmein")), None)
            .await
            .unwrap();
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        register_user(&store, None, request("pat@example.com", false, None), None).await.unwrap();
        let err = register_user(&store, None, request("pat@example.com", false, None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    // Answers every email lookup with "absent", as if a concurrent signup
    // landed between the lookup and the insert.
    struct StaleLookup(MemoryStore);

    #[async_trait::async_trait]
    impl Store for StaleLookup {
        async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
            self.0.find_user(id).await
        }
        async fn find_user_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
            Ok(None)
        }
        async fn create_user(&self, new: &NewUser) -> anyhow::Result<User> {
            self.0.create_user(new).await
        }
        async fn list_non_admin_users(&self, page: crate::db::Page) -> anyhow::Result<Vec<User>> {
            self.0.list_non_admin_users(page).await
        }
        async fn insert_assignment(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
            self.0.insert_assignment(admin_id, client_id).await
        }
        async fn is_assigned(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
            self.0.is_assigned(admin_id, client_id).await
        }
        async fn list_assigned_clients(
            &self,
            admin_id: i64,
            page: crate::db::Page,
        ) -> anyhow::Result<Vec<User>> {
            self.0.list_assigned_clients(admin_id, page).await
        }
        async fn insert_plan(
            &self,
            kind: crate::plans::repo_types::PlanKind,
            new: &crate::plans::repo_types::NewPlanRow,
        ) -> anyhow::Result<crate::plans::repo_types::PlanRow> {
            self.0.insert_plan(kind, new).await
        }
        async fn list_plans(
            &self,
            kind: crate::plans::repo_types::PlanKind,
            owner: Option<i64>,
            page: crate::db::Page,
        ) -> anyhow::Result<Vec<crate::plans::repo_types::PlanRow>> {
            self.0.list_plans(kind, owner, page).await
        }
    }

    #[tokio::test]
    async fn unique_violation_at_insert_is_a_conflict() {
        let store = StaleLookup(MemoryStore::new());
        register_user(&store, None, request("pat@example.com", false, None), None).await.unwrap();
        let err = register_user(&store, None, request("pat@example.com", false, None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.0.user_count(), 1);
    }

    #[tokio::test]
    async fn short_password_and_bad_email_are_validation_errors() {
        let store = MemoryStore::new();
        let mut req = request("pat@example.com", false, None);
        req.password = "short".into();
        assert!(matches!(register_user(&store, None, req, None).await, Err(AppError::Validation(_))));
        assert!(matches!(
            register_user(&store, None, request("not-an-email", false, None), None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn admin_caller_gets_new_client_assigned() {
        let store = MemoryStore::new();
        let coach = register_user(&store, Some("c"), request("coach@example.com", true, Some("c")), None)
            .await
            .unwrap();
        let client = register_user(&store, None, request("pat@example.com", false, None), Some(&coach))
            .await
            .unwrap();

        let registry = AssignmentRegistry::new(&store);
        assert!(registry.is_assigned(coach.id, client.id).await.unwrap());

        // a non-admin caller assigns nothing
        register_user(&store, None, request("sam@example.com", false, None), Some(&client))
            .await
            .unwrap();
        assert_eq!(store.assignment_count(), 1);
    }
}
