use bac_core::User;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::UserRow;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User, DbError> {
        let row = UserRow::from(user);

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.username)
        .bind(&row.full_name)
        .bind(row.is_admin)
        .bind(row.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(DbError::UsernameTaken(user.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, full_name, is_admin, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, full_name, is_admin, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_all(&self) -> Result<Vec<User>, DbError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, full_name, is_admin, created_at
            FROM users
            ORDER BY username ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}
