//! Testimonials repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::testimonial::{
        CreateTestimonial, Testimonial, TestimonialDetails, TestimonialRow, UpdateTestimonial,
    },
};

const TESTIMONIAL_SELECT: &str = r#"
    SELECT t.id, t.book_id, t.member_id, t.reader_name, t.rating, t.comment,
           t.is_approved, t.created_at, t.updated_at,
           bk.title AS book_title, bk.author AS book_author, bk.isbn AS book_isbn
    FROM testimonials t
    JOIN books bk ON bk.id = t.book_id
"#;

#[derive(Clone)]
pub struct TestimonialsRepository {
    pool: Pool<Postgres>,
}

impl TestimonialsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get testimonial by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<TestimonialDetails> {
        sqlx::query_as::<_, TestimonialRow>(&format!("{} WHERE t.id = $1", TESTIMONIAL_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TestimonialDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Testimonial with id {} not found", id)))
    }

    /// List testimonials, newest first
    pub async fn list(
        &self,
        book_id: Option<i32>,
        approved_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<TestimonialDetails>, i64)> {
        let mut conditions = Vec::new();
        if book_id.is_some() {
            conditions.push("t.book_id = $1");
        }
        if approved_only {
            conditions.push("t.is_approved");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM testimonials t {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(id) = book_id {
            count_builder = count_builder.bind(id);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY t.created_at DESC, t.id DESC LIMIT {} OFFSET {}",
            TESTIMONIAL_SELECT, where_clause, limit, offset
        );
        let mut select_builder = sqlx::query_as::<_, TestimonialRow>(&select_query);
        if let Some(id) = book_id {
            select_builder = select_builder.bind(id);
        }
        let rows = select_builder.fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(TestimonialDetails::from).collect(), total))
    }

    /// Create a testimonial; new testimonials always await approval
    pub async fn create(
        &self,
        testimonial: &CreateTestimonial,
        member_id: Option<i32>,
    ) -> AppResult<TestimonialDetails> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO testimonials (book_id, member_id, reader_name, rating, comment, is_approved)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id
            "#,
        )
        .bind(testimonial.book_id)
        .bind(member_id)
        .bind(testimonial.reader_name.trim())
        .bind(testimonial.rating)
        .bind(testimonial.comment.trim())
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update a testimonial. `is_approved` is written as given.
    pub async fn update(
        &self,
        id: i32,
        update: &UpdateTestimonial,
        is_approved: Option<bool>,
    ) -> AppResult<TestimonialDetails> {
        let updated: Option<Testimonial> = sqlx::query_as(
            r#"
            UPDATE testimonials SET
                rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                is_approved = COALESCE($4, is_approved),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.rating)
        .bind(update.comment.as_deref().map(str::trim))
        .bind(is_approved)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            return Err(AppError::NotFound(format!("Testimonial with id {} not found", id)));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Testimonial with id {} not found", id)));
        }
        Ok(())
    }
}
