use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::Row;

use crate::app::users::user_from_row;
use crate::domain::user::{Role, User};
use crate::infra::db::Db;

#[derive(Debug)]
pub enum LoginOutcome {
    Success(User),
    UnknownUser,
    WrongPassword,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
}

impl AuthService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Creates a USER account whose display name starts out as the username.
    /// Uniqueness is enforced by the `users_username_key` and
    /// `users_email_key` constraints.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;

        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash, display_name, role) \
             VALUES ($1, $2, $3, $1, $4) \
             RETURNING id, username, email, display_name, avatar, bio, location, occupation, \
                       followers, following, role",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Role::User.as_db())
        .fetch_one(self.db.pool())
        .await?;

        user_from_row(&row)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let row = sqlx::query(
            "SELECT id, username, email, display_name, avatar, bio, location, occupation, \
                    followers, following, role, password_hash \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(LoginOutcome::UnknownUser),
        };

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Ok(LoginOutcome::WrongPassword);
        }

        Ok(LoginOutcome::Success(user_from_row(&row)?))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
