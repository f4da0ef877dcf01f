//! Members repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{AccountChange, CreateMember, Member, MemberQuery, UpdateMember},
        user::Role,
    },
};

use super::like_pattern;

const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.name, m.email, m.phone, m.address, m.profile_picture,
           m.membership_date, m.created_at, m.updated_at, u.role AS user_role
    FROM members m
    LEFT JOIN users u ON u.member_id = m.id
"#;

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(&format!("{} WHERE m.id = $1", MEMBER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search members with pagination
    pub async fn search(
        &self,
        query: &MemberQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Member>, i64)> {
        let pattern = query.search.as_deref().filter(|s| !s.trim().is_empty()).map(like_pattern);

        let where_clause = if pattern.is_some() {
            "WHERE (LOWER(m.name) LIKE $1 OR LOWER(m.email) LIKE $1 OR LOWER(COALESCE(m.phone, '')) LIKE $1)"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM members m {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref p) = pattern {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY m.name, m.id LIMIT {} OFFSET {}",
            MEMBER_SELECT, where_clause, limit, offset
        );
        let mut select_builder = sqlx::query_as::<_, Member>(&select_query);
        if let Some(ref p) = pattern {
            select_builder = select_builder.bind(p);
        }
        let members = select_builder.fetch_all(&self.pool).await?;

        Ok((members, total))
    }

    /// Create a new member, optionally with a login
    pub async fn create(&self, member: &CreateMember, account: Option<AccountChange>) -> AppResult<Member> {
        let mut tx = self.pool.begin().await?;

        let member_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO members (name, email, phone, address, profile_picture)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(member.name.trim())
        .bind(member.email.trim())
        .bind(&member.phone)
        .bind(&member.address)
        .bind(&member.profile_picture)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(account) = account {
            let password_hash = account.password_hash.ok_or_else(|| {
                AppError::Validation("Password is required when creating user account".to_string())
            })?;
            insert_user(
                &mut tx,
                member.email.trim(),
                &password_hash,
                account.role.unwrap_or(Role::Member),
                Some(member_id),
            )
            .await?;
        }

        tx.commit().await?;
        self.get_by_id(member_id).await
    }

    /// Update a member, optionally updating or creating its login
    pub async fn update(
        &self,
        id: i32,
        member: &UpdateMember,
        account: Option<AccountChange>,
    ) -> AppResult<Member> {
        let mut tx = self.pool.begin().await?;

        let email: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE members SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                profile_picture = COALESCE($6, profile_picture),
                updated_at = NOW()
            WHERE id = $1
            RETURNING email
            "#,
        )
        .bind(id)
        .bind(member.name.as_deref().map(str::trim))
        .bind(member.email.as_deref().map(str::trim))
        .bind(&member.phone)
        .bind(&member.address)
        .bind(&member.profile_picture)
        .fetch_optional(&mut *tx)
        .await?;

        let email =
            email.ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;

        if member.email.is_some() || account.is_some() {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND member_id IS DISTINCT FROM $2)",
            )
            .bind(&email)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(AppError::Conflict(
                    "Email belongs to another user account".to_string(),
                ));
            }
        }

        // Keep the login email in step with the member email
        sqlx::query("UPDATE users SET email = $2 WHERE member_id = $1")
            .bind(id)
            .bind(&email)
            .execute(&mut *tx)
            .await?;

        if let Some(account) = account {
            let user_id: Option<i32> = sqlx::query_scalar(
                "SELECT id FROM users WHERE member_id = $1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            match user_id {
                Some(user_id) => {
                    sqlx::query(
                        r#"
                        UPDATE users SET
                            role = COALESCE($2, role),
                            password_hash = COALESCE($3, password_hash)
                        WHERE id = $1
                        "#,
                    )
                    .bind(user_id)
                    .bind(account.role)
                    .bind(account.password_hash)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    let password_hash = account.password_hash.ok_or_else(|| {
                        AppError::Validation(
                            "Password is required when creating user account".to_string(),
                        )
                    })?;
                    insert_user(
                        &mut tx,
                        &email,
                        &password_hash,
                        account.role.unwrap_or(Role::Member),
                        Some(id),
                    )
                    .await?;
                }
            }
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Delete a member and its login. Historical borrowings are kept with no member.
    /// Refused while the member still holds books.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent checkouts for this member until we are done
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT id FROM members WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound(format!("Member with id {} not found", id)));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE member_id = $1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete member with {} active borrowing(s). Please return all books first.",
                active
            )));
        }

        sqlx::query("DELETE FROM users WHERE member_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // borrowings, testimonials and subscriptions reference members ON DELETE SET NULL
        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Insert a login inside an open transaction
pub(crate) async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password_hash: &str,
    role: Role,
    member_id: Option<i32>,
) -> AppResult<i32> {
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, role, member_id, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(member_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}
