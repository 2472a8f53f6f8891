use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::user::{Role, User, UserProfile};
use crate::infra::db::Db;

/// Profile fields a client may overwrite. The outer `Option` says whether
/// the field was sent at all; the inner one allows clearing it.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub display_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub occupation: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, display_name, avatar, bio, location, occupation, \
                    followers, following, role \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.display_name, u.avatar, u.bio, u.location, \
                    u.occupation, u.followers, u.following, u.role, \
                    (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(UserProfile {
                user: user_from_row(&row)?,
                post_count: row.get("post_count"),
            })),
            None => Ok(None),
        }
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    /// Applies the fields present in `update`. Returns false if the user
    /// does not exist.
    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<bool> {
        let ProfileUpdate {
            display_name,
            bio,
            location,
            occupation,
            avatar,
        } = update;

        let result = sqlx::query(
            "UPDATE users \
             SET display_name = CASE WHEN $2 THEN $3 ELSE display_name END, \
                 bio = CASE WHEN $4 THEN $5 ELSE bio END, \
                 location = CASE WHEN $6 THEN $7 ELSE location END, \
                 occupation = CASE WHEN $8 THEN $9 ELSE occupation END, \
                 avatar = CASE WHEN $10 THEN $11 ELSE avatar END \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(display_name.is_some())
        .bind(display_name.flatten())
        .bind(bio.is_some())
        .bind(bio.flatten())
        .bind(location.is_some())
        .bind(location.flatten())
        .bind(occupation.is_some())
        .bind(occupation.flatten())
        .bind(avatar.is_some())
        .bind(avatar.flatten())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_avatar(&self, user_id: i64, avatar_url: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(user_id)
            .bind(avatar_url)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");
    let role = Role::from_db(&role).ok_or_else(|| anyhow!("unknown user role: {}", role))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        avatar: row.get("avatar"),
        bio: row.get("bio"),
        location: row.get("location"),
        occupation: row.get("occupation"),
        followers: row.get("followers"),
        following: row.get("following"),
        role,
    })
}
