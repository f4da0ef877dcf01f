//! Testimonials service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        testimonial::{CreateTestimonial, TestimonialDetails, TestimonialQuery, UpdateTestimonial},
        user::Caller,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TestimonialsService {
    repository: Repository,
}

impl TestimonialsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List testimonials. Unapproved ones are only listed for admins who ask for them.
    pub async fn list(
        &self,
        caller: Option<&Caller>,
        query: &TestimonialQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<TestimonialDetails>, i64)> {
        let is_admin = caller.map(Caller::is_admin).unwrap_or(false);
        let approved_only = !is_admin || query.approved_only.unwrap_or(true);

        self.repository
            .testimonials
            .list(query.book_id, approved_only, limit, offset)
            .await
    }

    /// Get a testimonial. Unapproved ones are visible to admins and their author only.
    pub async fn get(&self, caller: Option<&Caller>, id: i32) -> AppResult<TestimonialDetails> {
        let testimonial = self.repository.testimonials.get_by_id(id).await?;
        let visible = testimonial.is_approved
            || caller
                .map(|c| c.is_admin() || c.owns(testimonial.member_id))
                .unwrap_or(false);

        if !visible {
            return Err(AppError::NotFound(format!("Testimonial with id {} not found", id)));
        }
        Ok(testimonial)
    }

    pub async fn create(&self, caller: &Caller, request: CreateTestimonial) -> AppResult<TestimonialDetails> {
        request.validate()?;
        self.repository.books.get_by_id(request.book_id).await?;

        let member_id = if caller.is_admin() {
            if let Some(id) = request.member_id {
                self.repository.members.get_by_id(id).await?;
            }
            request.member_id.or(caller.member_id)
        } else {
            Some(caller.require_member_id()?)
        };

        let testimonial = self.repository.testimonials.create(&request, member_id).await?;
        tracing::info!(testimonial_id = testimonial.id, book_id = request.book_id, "Testimonial submitted");
        Ok(testimonial)
    }

    /// Admins may edit and approve; the author may edit, which sends it back for approval
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        request: UpdateTestimonial,
    ) -> AppResult<TestimonialDetails> {
        request.validate()?;
        let existing = self.repository.testimonials.get_by_id(id).await?;

        let is_approved = if caller.is_admin() {
            request.is_approved
        } else {
            caller.require_owner_or_admin(existing.member_id, "testimonials")?;
            if request.is_approved.is_some() {
                return Err(AppError::Authorization(
                    "Only administrators can approve testimonials".to_string(),
                ));
            }
            Some(false)
        };

        let updated = self.repository.testimonials.update(id, &request, is_approved).await?;
        tracing::info!(testimonial_id = id, approved = updated.is_approved, "Testimonial updated");
        Ok(updated)
    }

    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        let existing = self.repository.testimonials.get_by_id(id).await?;
        caller.require_owner_or_admin(existing.member_id, "testimonials")?;

        self.repository.testimonials.delete(id).await?;
        tracing::info!(testimonial_id = id, "Testimonial deleted");
        Ok(())
    }
}
