//! Dashboard and statistics service

use chrono::NaiveDate;

use crate::{
    api::dashboard::{DashboardResponse, LibraryStats},
    error::AppResult,
    lending::overdue,
    repository::Repository,
};

const RECENT_BOOKS: i64 = 10;
const RECENT_TESTIMONIALS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Library-wide counters. Overdue uses the same rule as the borrowing listings.
    pub async fn stats(&self, today: NaiveDate) -> AppResult<LibraryStats> {
        let query = format!(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM borrowings) AS total_borrowings,
                (SELECT COUNT(*) FROM borrowings b WHERE b.return_date IS NULL) AS active_borrowings,
                (SELECT COUNT(*) FROM borrowings b WHERE {}) AS overdue_books,
                (SELECT COALESCE(SUM(available_copies), 0)::BIGINT FROM books) AS available_books
            "#,
            overdue::overdue_predicate("b", 1)
        );

        let stats = sqlx::query_as::<_, LibraryStats>(&query)
            .bind(today)
            .fetch_one(&self.repository.pool)
            .await?;
        Ok(stats)
    }

    /// Stats plus the newest books and approved testimonials
    pub async fn dashboard(&self, today: NaiveDate) -> AppResult<DashboardResponse> {
        let stats = self.stats(today).await?;
        let recent_books = self.repository.books.newest(RECENT_BOOKS).await?;
        let (recent_testimonials, _) = self
            .repository
            .testimonials
            .list(None, true, RECENT_TESTIMONIALS, 0)
            .await?;

        Ok(DashboardResponse {
            stats,
            recent_books,
            recent_testimonials,
        })
    }
}
