//! In-process `Store` used by unit and HTTP tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{DuplicateEmail, Page, Store};
use crate::{
    plans::repo_types::{NewPlanRow, PlanKind, PlanRow},
    users::repo_types::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    assignments: Vec<(i64, i64)>,
    workout_plans: Vec<PlanRow>,
    meal_plans: Vec<PlanRow>,
}

impl Tables {
    fn plans(&mut self, kind: PlanKind) -> &mut Vec<PlanRow> {
        match kind {
            PlanKind::Workout => &mut self.workout_plans,
            PlanKind::Meal => &mut self.meal_plans,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn paginate<T: Clone>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    let skip = usize::try_from(page.skip).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.skip(skip).take(limit).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw plan row, bypassing encoding, to simulate legacy or corrupt data.
    pub fn insert_raw_plan(&self, kind: PlanKind, user_id: i64, title: &str, items: &str) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let rows = t.plans(kind);
        let id = rows.len() as i64 + 1;
        let now = OffsetDateTime::now_utc();
        rows.push(PlanRow {
            id,
            user_id,
            title: title.to_string(),
            description: None,
            items: items.to_string(),
            scheduled_date: now,
            created_at: now,
        });
        id
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn plan_count(&self, kind: PlanKind) -> usize {
        self.tables.lock().unwrap().plans(kind).len()
    }

    pub fn assignment_count(&self) -> usize {
        self.tables.lock().unwrap().assignments.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: &NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(DuplicateEmail.into());
        }
        let user = User {
            id: t.users.len() as i64 + 1,
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            full_name: new.full_name.clone(),
            is_admin: new.is_admin,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn list_non_admin_users(&self, page: Page) -> anyhow::Result<Vec<User>> {
        let t = self.tables.lock().unwrap();
        Ok(paginate(t.users.iter().filter(|u| !u.is_admin).cloned(), page))
    }

    async fn insert_assignment(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.assignments.contains(&(admin_id, client_id)) {
            return Ok(false);
        }
        t.assignments.push((admin_id, client_id));
        Ok(true)
    }

    async fn is_assigned(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
        let t = self.tables.lock().unwrap();
        Ok(t.assignments.contains(&(admin_id, client_id)))
    }

    async fn list_assigned_clients(&self, admin_id: i64, page: Page) -> anyhow::Result<Vec<User>> {
        let t = self.tables.lock().unwrap();
        let clients = t
            .assignments
            .iter()
            .filter(|(a, _)| *a == admin_id)
            .filter_map(|(_, c)| t.users.iter().find(|u| u.id == *c).cloned());
        Ok(paginate(clients, page))
    }

    async fn insert_plan(&self, kind: PlanKind, new: &NewPlanRow) -> anyhow::Result<PlanRow> {
        let mut t = self.tables.lock().unwrap();
        anyhow::ensure!(
            t.users.iter().any(|u| u.id == new.user_id),
            "insert or update on table \"{}\" violates foreign key constraint",
            kind.table()
        );
        let rows = t.plans(kind);
        let row = PlanRow {
            id: rows.len() as i64 + 1,
            user_id: new.user_id,
            title: new.title.clone(),
            description: new.description.clone(),
            items: new.items.clone(),
            scheduled_date: new.scheduled_date,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_plans(
        &self,
        kind: PlanKind,
        owner: Option<i64>,
        page: Page,
    ) -> anyhow::Result<Vec<PlanRow>> {
        let mut t = self.tables.lock().unwrap();
        let rows = t
            .plans(kind)
            .iter()
            .filter(|r| owner.map_or(true, |o| r.user_id == o))
            .cloned()
            .collect::<Vec<_>>();
        Ok(paginate(rows.into_iter(), page))
    }
}
