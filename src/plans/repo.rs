use std::marker::PhantomData;

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    items::{decode_items, encode_items, validate_items, PlanItem},
    repo_types::{NewPlanRow, PlanRow},
};
use crate::{
    auth::policy::PlanScope,
    db::{Page, Store},
    error::AppError,
};

/// A plan with its items decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<I> {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<I>,
    pub scheduled_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPlan<I> {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_date: OffsetDateTime,
    pub items: Vec<I>,
}

fn decode_row<I: PlanItem>(row: PlanRow) -> Result<Plan<I>, super::items::ItemsError> {
    let items = decode_items(&row.items)?;
    Ok(Plan {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        description: row.description,
        items,
        scheduled_date: row.scheduled_date,
        created_at: row.created_at,
    })
}

/// Workout or meal plans, depending on `I`.
pub struct PlanRepository<'a, I> {
    store: &'a dyn Store,
    _items: PhantomData<I>,
}

impl<'a, I: PlanItem> PlanRepository<'a, I> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store, _items: PhantomData }
    }

    pub async fn create(&self, new: NewPlan<I>) -> Result<Plan<I>, AppError> {
        let kind = I::KIND;
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        validate_items(&new.items).map_err(|e| AppError::Validation(e.to_string()))?;

        if self.store.find_user(new.owner_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", new.owner_id)));
        }

        let encoded = encode_items(&new.items).context("encode plan items")?;
        let row = self
            .store
            .insert_plan(
                kind,
                &NewPlanRow {
                    user_id: new.owner_id,
                    title,
                    description: new.description.filter(|d| !d.trim().is_empty()),
                    items: encoded,
                    scheduled_date: new.scheduled_date,
                },
            )
            .await?;

        info!(plan_id = row.id, user_id = row.user_id, kind = kind.label(), "plan created");
        let plan = decode_row(row).context("decode freshly stored plan")?;
        Ok(plan)
    }

    pub async fn list_all(&self, page: Page) -> Result<Vec<Plan<I>>, AppError> {
        let rows = self.store.list_plans(I::KIND, None, page).await?;
        Ok(Self::decode_rows(rows))
    }

    pub async fn list_for_user(&self, owner_id: i64, page: Page) -> Result<Vec<Plan<I>>, AppError> {
        let rows = self.store.list_plans(I::KIND, Some(owner_id), page).await?;
        Ok(Self::decode_rows(rows))
    }

    pub async fn list(&self, scope: PlanScope, page: Page) -> Result<Vec<Plan<I>>, AppError> {
        match scope.owner() {
            Some(owner_id) => self.list_for_user(owner_id, page).await,
            None => self.list_all(page).await,
        }
    }

    // Undecodable rows are logged and dropped.
    fn decode_rows(rows: Vec<PlanRow>) -> Vec<Plan<I>> {
        rows.into_iter()
            .filter_map(|row| {
                let (id, user_id) = (row.id, row.user_id);
                match decode_row(row) {
                    Ok(plan) => Some(plan),
                    Err(e) => {
                        warn!(plan_id = id, user_id, kind = I::KIND.label(), error = %e, "skipping undecodable plan");
                        None
                    }
                }
            })
            .collect()
    }
}
