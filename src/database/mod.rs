use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{RoleEntity, User};
use crate::security;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Result, Row, Sqlite, SqlitePool, Transaction,
};
use tracing::info;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        age INTEGER NOT NULL,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, role_id)
    )
    "#,
];

/// Connects to a SQLite database with the given `db_url`, returning a connection pool for accessing it.
///
/// An in-memory database lives only as long as its connection, so the pool is
/// pinned to a single connection that is never recycled.
pub async fn connect_sqlx(db_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if db_url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .idle_timeout(Duration::from_secs(30))
        .max_connections(8)
        .connect_with(options)
        .await
}

/// New account data, password already hashed
#[derive(Debug, Default, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
    pub roles: Vec<String>,
}

pub struct Database {
    sqlx_db: SqlitePool,
}

impl Database {
    pub fn new(sqlx_db: SqlitePool) -> Self {
        Database { sqlx_db }
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.sqlx_db).await?;
        Ok(())
    }

    /// Creates the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.sqlx_db).await?;
        }
        Ok(())
    }

    /// Makes sure the `user` and `admin` roles and the bootstrap admin account exist
    pub async fn seed_defaults(&self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        for role in ["user", "admin"] {
            if self.get_role_by_name(role).await?.is_none() {
                self.create_role(role).await?;
                info!(role, "created role");
            }
        }

        if self.get_user_by_email("admin@admin.com").await?.is_none() {
            let admin = NewUser {
                first_name: "Admin".to_string(),
                last_name: "Administrator".to_string(),
                email: "admin@admin.com".to_string(),
                age: 30,
                password_hash: security::hash_password("admin")?,
                roles: vec!["admin".to_string(), "user".to_string()],
            };
            self.create_user(&admin).await?;
            info!("created admin user: admin@admin.com");
        }
        Ok(())
    }

    /// Create a new user together with its role assignments
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tx = self.sqlx_db.begin().await?;
        let id = sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, email, age, password_hash)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        Self::assign_roles(&mut tx, id, &user.roles).await?;
        tx.commit().await?;

        self.get_user_by_id(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Overwrites every column of an existing user and replaces its roles
    pub async fn update_user(&self, user: &User) -> Result<User> {
        let mut tx = self.sqlx_db.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?,
                last_name = ?,
                email = ?,
                age = ?,
                password_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.password_hash)
        .bind(user.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Self::assign_roles(&mut tx, user.id, &user.roles).await?;
        tx.commit().await?;

        self.get_user_by_id(user.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Delete a user by ID, returning whether a row was removed
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.sqlx_db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get every user, ordered by ID
    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, age, password_hash
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.sqlx_db)
        .await?;

        let mut roles = self.get_role_names_by_user().await?;
        rows.iter()
            .map(|row| {
                let mut user = user_from_row(row)?;
                user.roles = roles.remove(&user.id).unwrap_or_default();
                Ok(user)
            })
            .collect()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, age, password_hash
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.sqlx_db)
        .await?;
        self.with_roles(row).await
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, age, password_hash
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.sqlx_db)
        .await?;
        self.with_roles(row).await
    }

    pub async fn create_role(&self, name: &str) -> Result<RoleEntity> {
        let id = sqlx::query("INSERT INTO roles (name) VALUES (?)")
            .bind(name)
            .execute(&self.sqlx_db)
            .await?
            .last_insert_rowid();
        Ok(RoleEntity {
            id,
            name: name.to_owned(),
        })
    }

    pub async fn get_all_roles(&self) -> Result<Vec<RoleEntity>> {
        let rows = sqlx::query("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.sqlx_db)
            .await?;
        rows.iter().map(role_from_row).collect()
    }

    pub async fn get_role_by_id(&self, id: i64) -> Result<Option<RoleEntity>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.sqlx_db)
            .await?;
        row.as_ref().map(role_from_row).transpose()
    }

    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<RoleEntity>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.sqlx_db)
            .await?;
        row.as_ref().map(role_from_row).transpose()
    }

    /// Renames a role, returning `None` when no role has that ID
    pub async fn update_role(&self, id: i64, name: &str) -> Result<Option<RoleEntity>> {
        let updated = sqlx::query("UPDATE roles SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.sqlx_db)
            .await?
            .rows_affected();
        if updated == 0 {
            return Ok(None);
        }
        self.get_role_by_id(id).await
    }

    /// Delete a role by ID. Links to users go with it.
    pub async fn delete_role(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.sqlx_db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn with_roles(&self, row: Option<SqliteRow>) -> Result<Option<User>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut user = user_from_row(&row)?;
        user.roles = self.get_role_names_for_user(user.id).await?;
        Ok(Some(user))
    }

    async fn get_role_names_for_user(&self, user_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.sqlx_db)
        .await?;
        rows.iter().map(|row| row.try_get("name")).collect()
    }

    async fn get_role_names_by_user(&self) -> Result<HashMap<i64, Vec<String>>> {
        let rows = sqlx::query(
            r#"
            SELECT ur.user_id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            ORDER BY r.name
            "#,
        )
        .fetch_all(&self.sqlx_db)
        .await?;

        let mut roles: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            let user_id: i64 = row.try_get("user_id")?;
            let name: String = row.try_get("name")?;
            roles.entry(user_id).or_default().push(name);
        }
        Ok(roles)
    }

    /// Replaces the user's role links. Names with no matching role are skipped.
    async fn assign_roles(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        roles: &[String],
    ) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        for name in roles {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO user_roles (user_id, role_id)
                SELECT ?, id FROM roles WHERE name = ?
                "#,
            )
            .bind(user_id)
            .bind(name)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        age: row.try_get("age")?,
        password_hash: row.try_get("password_hash")?,
        roles: Vec::new(),
    })
}

fn role_from_row(row: &SqliteRow) -> Result<RoleEntity> {
    Ok(RoleEntity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}
