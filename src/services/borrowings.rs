//! Borrowing lifecycle service

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    lending::fines,
    models::{
        borrowing::{
            BorrowingDetails, BorrowingFilter, BorrowingQuery, CreateBorrowing, NewBorrowing,
            ReturnBorrowing, UpdateBorrowing,
        },
        user::Caller,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
    config: LendingConfig,
}

impl BorrowingsService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Date used for due dates, fines and overdue classification
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// List borrowings. Members only ever see their own.
    pub async fn list(
        &self,
        caller: &Caller,
        query: &BorrowingQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingDetails>, i64)> {
        let member_id = if caller.is_admin() {
            query.member_id
        } else {
            Some(caller.require_member_id()?)
        };

        let filter = BorrowingFilter {
            status: query.status,
            member_id,
            book_id: query.book_id,
        };

        self.repository
            .borrowings
            .list(&filter, Self::today(), limit, offset)
            .await
    }

    /// Borrowing history of one member (admin or that member)
    pub async fn list_for_member(
        &self,
        caller: &Caller,
        member_id: i32,
        query: &BorrowingQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingDetails>, i64)> {
        caller.require_owner_or_admin(Some(member_id), "borrowings")?;
        self.repository.members.get_by_id(member_id).await?;

        let filter = BorrowingFilter {
            status: query.status,
            member_id: Some(member_id),
            book_id: query.book_id,
        };

        self.repository
            .borrowings
            .list(&filter, Self::today(), limit, offset)
            .await
    }

    /// Books the caller currently holds, soonest due first
    pub async fn active_for_caller(&self, caller: &Caller) -> AppResult<Vec<BorrowingDetails>> {
        match caller.member_id {
            Some(member_id) => {
                self.repository
                    .borrowings
                    .active_for_member(member_id, Self::today())
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> AppResult<BorrowingDetails> {
        let details = self.repository.borrowings.get_details(id, Self::today()).await?;
        caller.require_owner_or_admin(details.member_id, "borrowings")?;
        Ok(details)
    }

    /// Check out a copy. Members borrow for themselves; admins name the member.
    pub async fn create(&self, caller: &Caller, request: CreateBorrowing) -> AppResult<BorrowingDetails> {
        let member_id = if caller.is_admin() {
            request.member_id.ok_or_else(|| {
                AppError::Validation("member_id is required when borrowing as administrator".to_string())
            })?
        } else {
            caller.require_member_id()?
        };

        let today = Self::today();
        let due_date = request
            .due_date
            .unwrap_or_else(|| today + Duration::days(self.config.default_loan_days));

        let new = NewBorrowing {
            book_id: request.book_id,
            member_id,
            borrow_date: today,
            due_date,
        };

        let borrowing = self.repository.borrowings.create(&new).await?;
        tracing::info!(
            borrowing_id = borrowing.id,
            book_id = borrowing.book_id,
            member_id = member_id,
            due_date = %borrowing.due_date,
            "Book borrowed"
        );

        self.repository.borrowings.get_details(borrowing.id, today).await
    }

    /// Return a borrowed copy. The fine is computed from the days late unless
    /// an admin supplies one.
    pub async fn return_borrowing(
        &self,
        caller: &Caller,
        id: i32,
        request: ReturnBorrowing,
    ) -> AppResult<BorrowingDetails> {
        let fine_override = match request.fine_amount {
            Some(_) if !caller.is_admin() => {
                return Err(AppError::Authorization(
                    "Only administrators can set a fine".to_string(),
                ))
            }
            Some(amount) => Some(fines::check_fine(amount)?),
            None => None,
        };

        let today = Self::today();
        let per_day = self.config.fine_per_day;

        let returned = self
            .repository
            .borrowings
            .return_borrowing(
                id,
                today,
                |borrowing| caller.require_owner_or_admin(borrowing.member_id, "borrowings"),
                |borrowing| {
                    Ok(fine_override
                        .unwrap_or_else(|| fines::late_fine(borrowing.due_date, today, per_day)))
                },
            )
            .await?;

        tracing::info!(
            borrowing_id = id,
            book_id = returned.book_id,
            fine = %returned.fine_amount,
            "Book returned"
        );

        self.repository.borrowings.get_details(id, today).await
    }

    /// Change due date or fine (admin)
    pub async fn update(&self, id: i32, request: UpdateBorrowing) -> AppResult<BorrowingDetails> {
        let existing = self.repository.borrowings.get_by_id(id).await?;

        if let Some(due_date) = request.due_date {
            if due_date < existing.borrow_date {
                return Err(AppError::Validation(
                    "Due date cannot be before the borrow date".to_string(),
                ));
            }
        }

        let request = UpdateBorrowing {
            due_date: request.due_date,
            fine_amount: request.fine_amount.map(fines::check_fine).transpose()?,
        };

        self.repository.borrowings.update(id, &request).await?;
        tracing::info!(borrowing_id = id, "Borrowing updated");

        self.repository.borrowings.get_details(id, Self::today()).await
    }

    /// Hard-delete a borrowing (admin)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let deleted = self.repository.borrowings.delete(id).await?;
        tracing::info!(
            borrowing_id = id,
            book_id = deleted.book_id,
            restored_copy = deleted.is_active(),
            "Borrowing deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, models::user::Role};
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    // Every case below is rejected before the database is touched
    fn service() -> BorrowingsService {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        BorrowingsService::new(Repository::new(pool), config.lending)
    }

    fn caller(role: Role, member_id: Option<i32>) -> Caller {
        Caller {
            user_id: 7,
            email: "reader@example.com".to_string(),
            role,
            member_id,
        }
    }

    #[tokio::test]
    async fn test_member_cannot_set_fine_on_return() {
        let request = ReturnBorrowing {
            fine_amount: Some(Decimal::ZERO),
        };
        let result = service()
            .return_borrowing(&caller(Role::Member, Some(3)), 1, request)
            .await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_admin_must_name_member_when_borrowing() {
        let request = CreateBorrowing {
            book_id: 1,
            member_id: None,
            due_date: None,
        };
        let result = service().create(&caller(Role::Admin, None), request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_member_without_profile_cannot_borrow_or_list() {
        let orphan = caller(Role::Member, None);
        let request = CreateBorrowing {
            book_id: 1,
            member_id: Some(3),
            due_date: None,
        };
        assert!(matches!(
            service().create(&orphan, request).await,
            Err(AppError::Validation(_))
        ));

        let query = BorrowingQuery {
            status: None,
            member_id: Some(3),
            book_id: None,
            page: None,
            per_page: None,
        };
        assert!(matches!(
            service().list(&orphan, &query, 20, 0).await,
            Err(AppError::Validation(_))
        ));
    }
}
