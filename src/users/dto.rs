use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Request body for `POST /users/`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub admin_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Restrict the listing to the caller's assigned clients.
    #[serde(default)]
    pub assigned: bool,
}

fn default_limit() -> i64 {
    crate::db::Page::DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub admin_id: i64,
    pub created: bool,
    pub user: User,
}
