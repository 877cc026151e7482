use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::AppError,
    plans::repo_types::{NewPlanRow, PlanKind, PlanRow},
    users::repo_types::{NewUser, User},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Offset pagination applied to every list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }

    /// Every row, for internal callers that need the whole set.
    #[cfg(test)]
    pub fn all() -> Self {
        Self { skip: 0, limit: i64::MAX }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// `?skip=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    Page::DEFAULT_LIMIT
}

impl Pagination {
    pub fn page(self) -> Result<Page, AppError> {
        if self.skip < 0 {
            return Err(AppError::Validation("skip must be >= 0".into()));
        }
        if !(1..=Page::MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                Page::MAX_LIMIT
            )));
        }
        Ok(Page::new(self.skip, self.limit))
    }
}

/// Returned by [`Store::create_user`] when the email is already taken.
#[derive(Debug, thiserror::Error)]
#[error("email already registered")]
pub struct DuplicateEmail;

/// Relational storage behind users, assignments and plans.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Fails with [`DuplicateEmail`] on a unique-email violation.
    async fn create_user(&self, new: &NewUser) -> anyhow::Result<User>;
    async fn list_non_admin_users(&self, page: Page) -> anyhow::Result<Vec<User>>;

    /// Inserts the edge if absent. Returns `true` when a new edge was written.
    async fn insert_assignment(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool>;
    async fn is_assigned(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool>;
    /// Clients of one admin in assignment order.
    async fn list_assigned_clients(&self, admin_id: i64, page: Page) -> anyhow::Result<Vec<User>>;

    async fn insert_plan(&self, kind: PlanKind, new: &NewPlanRow) -> anyhow::Result<PlanRow>;
    /// Plans ordered by id; `owner = None` spans every user.
    async fn list_plans(
        &self,
        kind: PlanKind,
        owner: Option<i64>,
        page: Page,
    ) -> anyhow::Result<Vec<PlanRow>>;
}
