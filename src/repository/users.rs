//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, Signup, UpdateProfile, UpdateUser, User, UserQuery},
};

use super::members::insert_user;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Login linked to a member profile, if any
    pub async fn get_by_member_id(&self, member_id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE member_id = $1")
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by email (case-insensitive, primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if a login already uses this email
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// List users with optional role filter
    pub async fn list(&self, query: &UserQuery, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)> {
        let where_clause = if query.role.is_some() { "WHERE role = $1" } else { "" };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(role) = query.role {
            count_builder = count_builder.bind(role);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM users {} ORDER BY email, id LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut select_builder = sqlx::query_as::<_, User>(&select_query);
        if let Some(role) = query.role {
            select_builder = select_builder.bind(role);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Create a login without a member profile (used for the bootstrap admin)
    pub async fn create(&self, email: &str, password_hash: &str, role: Role) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let id = insert_user(&mut tx, email.trim(), password_hash, role, None).await?;
        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Self-registration: reuse the member with the same email or create one,
    /// then attach a member login to it.
    pub async fn signup(&self, signup: &Signup, password_hash: &str) -> AppResult<User> {
        let email = signup.email.trim();
        let mut tx = self.pool.begin().await?;

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM members WHERE LOWER(email) = LOWER($1) FOR UPDATE")
                .bind(email)
                .fetch_optional(&mut *tx)
                .await?;

        let member_id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO members (name, email, phone, address)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(signup.name.trim())
                .bind(email)
                .bind(&signup.phone)
                .bind(&signup.address)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let linked: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE member_id = $1)")
                .bind(member_id)
                .fetch_one(&mut *tx)
                .await?;
        if linked {
            return Err(AppError::Conflict(
                "An account already exists for this member".to_string(),
            ));
        }

        let id = insert_user(&mut tx, email, password_hash, Role::Member, Some(member_id)).await?;
        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Update role, active flag or member link (admin only)
    pub async fn update(&self, id: i32, update: &UpdateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                role = COALESCE($2, role),
                is_active = COALESCE($3, is_active),
                member_id = COALESCE($4, member_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.role)
        .bind(update.is_active)
        .bind(update.member_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update the caller's own login and member profile together.
    /// A user without a member profile gets one when profile fields are supplied.
    pub async fn update_profile(
        &self,
        user: &User,
        profile: &UpdateProfile,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let email = profile.email.as_deref().map(str::trim);

        sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash)
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        match user.member_id {
            Some(member_id) => {
                sqlx::query(
                    r#"
                    UPDATE members SET
                        name = COALESCE($2, name),
                        email = COALESCE($3, email),
                        phone = COALESCE($4, phone),
                        address = COALESCE($5, address),
                        profile_picture = COALESCE($6, profile_picture),
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(member_id)
                .bind(profile.name.as_deref().map(str::trim))
                .bind(email)
                .bind(&profile.phone)
                .bind(&profile.address)
                .bind(&profile.profile_picture)
                .execute(&mut *tx)
                .await?;
            }
            None if profile.touches_member() => {
                let name = profile
                    .name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_else(|| user.email.split('@').next().unwrap_or("Administrator"));

                let member_id: i32 = sqlx::query_scalar(
                    r#"
                    INSERT INTO members (name, email, phone, address, profile_picture)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(name)
                .bind(email.unwrap_or(&user.email))
                .bind(&profile.phone)
                .bind(&profile.address)
                .bind(&profile.profile_picture)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query("UPDATE users SET member_id = $2 WHERE id = $1")
                    .bind(user.id)
                    .bind(member_id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {}
        }

        tx.commit().await?;
        self.get_by_id(user.id).await
    }
}
