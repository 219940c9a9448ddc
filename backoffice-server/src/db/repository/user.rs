//! User Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Role, User, UserCreate, UserUpdate};
use serde::Deserialize;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "user";

#[derive(Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Paginated user list, newest first; returns (users, total)
    pub async fn find_page(&self, limit: i64, skip: i64) -> RepoResult<(Vec<User>, i64)> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY created_at DESC LIMIT $limit START $skip")
            .query("SELECT count() AS total FROM user GROUP ALL")
            .bind(("limit", limit))
            .bind(("skip", skip))
            .await?;
        let users: Vec<User> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.total).unwrap_or(0);
        Ok((users, total))
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let rid = parse_record_id(TABLE, id)?;
        let user: Option<User> = self.base.db().select(rid).await?;
        Ok(user)
    }

    /// Find user by unique email (lowercased)
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user (hashes the password)
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let email = data.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already registered",
                email
            )));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;

        self.create_raw(
            &email,
            data.first_name.trim(),
            data.last_name.trim(),
            &hash_pass,
            data.role.unwrap_or(Role::Editor),
        )
        .await
    }

    /// Create from pre-hashed credentials (seeding path)
    pub async fn create_raw(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        hash_pass: &str,
        role: Role,
    ) -> RepoResult<User> {
        let now = now_millis();
        let user = User {
            id: None,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            hash_pass: hash_pass.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        let created: Option<User> = self.base.db().create(TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update a user (MERGE semantics; password re-hashed when present)
    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let rid = parse_record_id(TABLE, id)?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        let mut patch = serde_json::Map::new();
        if let Some(email) = &data.email {
            let email = email.trim().to_lowercase();
            if email != existing.email && self.find_by_email(&email).await?.is_some() {
                return Err(RepoError::Duplicate(format!(
                    "Email '{}' already registered",
                    email
                )));
            }
            patch.insert("email".into(), serde_json::json!(email));
        }
        if let Some(first_name) = &data.first_name {
            patch.insert("first_name".into(), serde_json::json!(first_name.trim()));
        }
        if let Some(last_name) = &data.last_name {
            patch.insert("last_name".into(), serde_json::json!(last_name.trim()));
        }
        if let Some(role) = data.role {
            patch.insert("role".into(), serde_json::json!(role.as_str()));
        }
        if let Some(password) = &data.password
            && !password.is_empty()
        {
            let hash_pass = User::hash_password(password)
                .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
            patch.insert("hash_pass".into(), serde_json::json!(hash_pass));
        }
        patch.insert("updated_at".into(), serde_json::json!(now_millis()));

        self.base
            .db()
            .query("UPDATE $id MERGE $data")
            .bind(("id", rid))
            .bind(("data", serde_json::Value::Object(patch)))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Hard delete a user
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;
        let deleted: Option<User> = self.base.db().delete(rid).await?;
        Ok(deleted.is_some())
    }
}
