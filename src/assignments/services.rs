use tracing::{debug, info};

use crate::{
    db::{Page, Store},
    error::AppError,
    users::repo_types::User,
};

/// Outcome of an `assign` call.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub admin_id: i64,
    pub client: User,
    /// `false` when the edge already existed.
    pub created: bool,
}

/// Admin → client edge set.
pub struct AssignmentRegistry<'a> {
    store: &'a dyn Store,
}

impl<'a> AssignmentRegistry<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn assign(&self, admin_id: i64, client_id: i64) -> Result<Assignment, AppError> {
        let admin = self
            .store
            .find_user(admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin {admin_id} not found")))?;
        if !admin.is_admin {
            return Err(AppError::Forbidden(format!("User {admin_id} is not an admin")));
        }
        let client = self
            .store
            .find_user(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {client_id} not found")))?;

        let created = self.store.insert_assignment(admin.id, client.id).await?;
        if created {
            info!(admin_id, client_id, "client assigned to admin");
        } else {
            debug!(admin_id, client_id, "client already assigned");
        }
        Ok(Assignment { admin_id, client, created })
    }

    /// Adds the edge for an already-resolved admin and client.
    pub(crate) async fn link(&self, admin: &User, client_id: i64) -> Result<bool, AppError> {
        if !admin.is_admin {
            return Err(AppError::Forbidden(format!("User {} is not an admin", admin.id)));
        }
        let created = self.store.insert_assignment(admin.id, client_id).await?;
        if created {
            info!(admin_id = admin.id, client_id, "client assigned to admin");
        }
        Ok(created)
    }

    pub async fn is_assigned(&self, admin_id: i64, client_id: i64) -> Result<bool, AppError> {
        Ok(self.store.is_assigned(admin_id, client_id).await?)
    }

    #[cfg(test)]
    pub async fn list_clients(&self, admin_id: i64) -> Result<Vec<User>, AppError> {
        self.list_clients_page(admin_id, Page::all()).await
    }

    pub async fn list_clients_page(&self, admin_id: i64, page: Page) -> Result<Vec<User>, AppError> {
        Ok(self.store.list_assigned_clients(admin_id, page).await?)
    }
}
