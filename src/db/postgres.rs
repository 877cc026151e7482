use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{DuplicateEmail, Page, Store};
use crate::{
    plans::repo_types::{NewPlanRow, PlanKind, PlanRow},
    users::repo_types::{NewUser, User},
};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, is_admin, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create_user(&self, new: &NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => anyhow::Error::new(DuplicateEmail),
            _ => anyhow::Error::new(e).context("insert user"),
        })?;
        Ok(user)
    }

    async fn list_non_admin_users(&self, page: Page) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE is_admin = FALSE
             ORDER BY id
             LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn insert_assignment(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO admin_clients (admin_id, client_id)
            VALUES ($1, $2)
            ON CONFLICT (admin_id, client_id) DO NOTHING
            "#,
        )
        .bind(admin_id)
        .bind(client_id)
        .execute(&self.pool)
        .await
        .context("insert assignment")?;
        Ok(res.rows_affected() == 1)
    }

    async fn is_assigned(&self, admin_id: i64, client_id: i64) -> anyhow::Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as(
            "SELECT client_id FROM admin_clients WHERE admin_id = $1 AND client_id = $2",
        )
        .bind(admin_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .context("check assignment")?;
        Ok(found.is_some())
    }

    async fn list_assigned_clients(&self, admin_id: i64, page: Page) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.full_name, u.is_admin, u.created_at
              FROM admin_clients ac
              JOIN users u ON u.id = ac.client_id
             WHERE ac.admin_id = $1
             ORDER BY ac.created_at, ac.client_id
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(admin_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await
        .context("list assigned clients")?;
        Ok(rows)
    }

    async fn insert_plan(&self, kind: PlanKind, new: &NewPlanRow) -> anyhow::Result<PlanRow> {
        let sql = format!(
            r#"
            INSERT INTO {table} (user_id, title, description, {items}, scheduled_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, {items} AS items, scheduled_date, created_at
            "#,
            table = kind.table(),
            items = kind.items_column(),
        );
        let row = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(new.user_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.items)
            .bind(new.scheduled_date)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("insert {}", kind.label()))?;
        Ok(row)
    }

    async fn list_plans(
        &self,
        kind: PlanKind,
        owner: Option<i64>,
        page: Page,
    ) -> anyhow::Result<Vec<PlanRow>> {
        // `$1 IS NULL` keeps a single statement for both scopes.
        let sql = format!(
            r#"
            SELECT id, user_id, title, description, COALESCE({items}, '') AS items,
                   scheduled_date, created_at
              FROM {table}
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY id
             LIMIT $2 OFFSET $3
            "#,
            table = kind.table(),
            items = kind.items_column(),
        );
        let rows = sqlx::query_as::<_, PlanRow>(&sql)
            .bind(owner)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("list {}s", kind.label()))?;
        Ok(rows)
    }
}
