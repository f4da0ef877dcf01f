//! Borrowings repository: the lending lifecycle transactions
//!
//! Every mutation that touches copy counts locks the book row first and the
//! borrowing row second, so concurrent borrows, returns and deletes of the same
//! title serialize on the book.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    lending::{overdue, stock, BookStock},
    models::borrowing::{
        Borrowing, BorrowingDetails, BorrowingDetailsRow, BorrowingFilter, BorrowingStatus,
        DueReminder, NewBorrowing, UpdateBorrowing,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.book_id, b.member_id, b.borrow_date, b.due_date, b.return_date,
           b.fine_amount, b.created_at, b.updated_at,
           bk.title AS book_title, bk.author AS book_author, bk.isbn AS book_isbn,
           m.name AS member_name, m.email AS member_email
    FROM borrowings b
    JOIN books bk ON bk.id = b.book_id
    LEFT JOIN members m ON m.id = b.member_id
"#;

const BORROWING_COLUMNS: &str =
    "id, book_id, member_id, borrow_date, due_date, return_date, fine_amount, created_at, updated_at";

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            "SELECT {} FROM borrowings WHERE id = $1",
            BORROWING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get borrowing with book and member details
    pub async fn get_details(&self, id: i32, today: NaiveDate) -> AppResult<BorrowingDetails> {
        let row = sqlx::query_as::<_, BorrowingDetailsRow>(&format!(
            "{} WHERE b.id = $1",
            DETAILS_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        Ok(row.into_details(today))
    }

    /// List borrowings with filters and pagination, newest first.
    /// `today` decides which active borrowings count as overdue.
    pub async fn list(
        &self,
        filter: &BorrowingFilter,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingDetails>, i64)> {
        // $1 is always today
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<i32> = Vec::new();

        match filter.status {
            Some(BorrowingStatus::Borrowed) => conditions.push(overdue::on_loan_predicate("b", 1)),
            Some(BorrowingStatus::Overdue) => conditions.push(overdue::overdue_predicate("b", 1)),
            Some(BorrowingStatus::Returned) => conditions.push("b.return_date IS NOT NULL".to_string()),
            None => {}
        }
        if let Some(member_id) = filter.member_id {
            params.push(member_id);
            conditions.push(format!("b.member_id = ${}", params.len() + 1));
        }
        if let Some(book_id) = filter.book_id {
            params.push(book_id);
            conditions.push(format!("b.book_id = ${}", params.len() + 1));
        }

        let where_clause = if conditions.is_empty() {
            // keeps $1 referenced so its type is known
            "WHERE $1::date IS NOT NULL".to_string()
        } else {
            format!("WHERE $1::date IS NOT NULL AND {}", conditions.join(" AND "))
        };

        let count_query = format!(
            "SELECT COUNT(*) FROM borrowings b {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(today);
        for param in &params {
            count_builder = count_builder.bind(*param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY b.borrow_date DESC, b.id DESC LIMIT {} OFFSET {}",
            DETAILS_SELECT, where_clause, limit, offset
        );
        let mut select_builder = sqlx::query_as::<_, BorrowingDetailsRow>(&select_query).bind(today);
        for param in &params {
            select_builder = select_builder.bind(*param);
        }
        let rows = select_builder.fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(|r| r.into_details(today)).collect(), total))
    }

    /// Active borrowings of a member, soonest due first
    pub async fn active_for_member(
        &self,
        member_id: i32,
        today: NaiveDate,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query_as::<_, BorrowingDetailsRow>(&format!(
            "{} WHERE b.member_id = $1 AND b.return_date IS NULL ORDER BY b.due_date, b.id",
            DETAILS_SELECT
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_details(today)).collect())
    }

    /// Check out one copy of a book for a member.
    pub async fn create(&self, new: &NewBorrowing) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let stock = lock_book(&mut tx, new.book_id).await?;

        // FOR SHARE keeps the member from being deleted before we commit
        let member: Option<i32> =
            sqlx::query_scalar("SELECT id FROM members WHERE id = $1 FOR SHARE")
                .bind(new.member_id)
                .fetch_optional(&mut *tx)
                .await?;
        if member.is_none() {
            return Err(AppError::NotFound(format!(
                "Member with id {} not found",
                new.member_id
            )));
        }

        if new.due_date < new.borrow_date {
            return Err(AppError::Validation(
                "Due date cannot be in the past".to_string(),
            ));
        }

        let stock = stock.checkout()?;

        let has_active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowings WHERE book_id = $1 AND member_id = $2 AND return_date IS NULL)",
        )
        .bind(new.book_id)
        .bind(new.member_id)
        .fetch_one(&mut *tx)
        .await?;
        stock::ensure_not_already_borrowed(has_active)?;

        write_stock(&mut tx, new.book_id, stock).await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            INSERT INTO borrowings (book_id, member_id, borrow_date, due_date, status, fine_amount)
            VALUES ($1, $2, $3, $4, 'borrowed', 0)
            RETURNING {}
            "#,
            BORROWING_COLUMNS
        ))
        .bind(new.book_id)
        .bind(new.member_id)
        .bind(new.borrow_date)
        .bind(new.due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrowing)
    }

    /// Close a borrowing and put its copy back on the shelf.
    ///
    /// `authorize` runs on the locked row before anything else is checked;
    /// `fine` computes the amount to record from the locked row.
    pub async fn return_borrowing<A, F>(
        &self,
        id: i32,
        today: NaiveDate,
        authorize: A,
        fine: F,
    ) -> AppResult<Borrowing>
    where
        A: FnOnce(&Borrowing) -> AppResult<()>,
        F: FnOnce(&Borrowing) -> AppResult<Decimal>,
    {
        let mut tx = self.pool.begin().await?;

        let (borrowing, stock) = lock_borrowing(&mut tx, id).await?;
        authorize(&borrowing)?;
        stock::ensure_returnable(!borrowing.is_active())?;

        let fine_amount = fine(&borrowing)?;
        let stock = stock.checkin()?;
        write_stock(&mut tx, borrowing.book_id, stock).await?;

        let returned = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            UPDATE borrowings SET
                return_date = $2,
                status = 'returned',
                fine_amount = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BORROWING_COLUMNS
        ))
        .bind(id)
        .bind(today)
        .bind(fine_amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(returned)
    }

    /// Change due date or fine of a borrowing (admin maintenance)
    pub async fn update(&self, id: i32, update: &UpdateBorrowing) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            UPDATE borrowings SET
                due_date = COALESCE($2, due_date),
                fine_amount = COALESCE($3, fine_amount),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BORROWING_COLUMNS
        ))
        .bind(id)
        .bind(update.due_date)
        .bind(update.fine_amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Hard-delete a borrowing. An active one gives its copy back; a returned
    /// one already did.
    pub async fn delete(&self, id: i32) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let (borrowing, stock) = lock_borrowing(&mut tx, id).await?;
        if borrowing.is_active() {
            write_stock(&mut tx, borrowing.book_id, stock.checkin()?).await?;
        }

        sqlx::query("DELETE FROM borrowings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(borrowing)
    }

    /// Active borrowings with a reachable member that are overdue or due
    /// on or before `until`
    pub async fn due_for_reminder(&self, until: NaiveDate) -> AppResult<Vec<DueReminder>> {
        let reminders = sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT b.id, b.due_date, bk.title AS book_title,
                   m.name AS member_name, m.email AS member_email
            FROM borrowings b
            JOIN books bk ON bk.id = b.book_id
            JOIN members m ON m.id = b.member_id
            WHERE b.return_date IS NULL AND b.due_date <= $1
            ORDER BY b.due_date, b.id
            "#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(reminders)
    }
}

/// Lock a book row and read its copy counts
async fn lock_book(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<BookStock> {
    sqlx::query_as::<_, BookStock>(
        "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
    )
    .bind(book_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))
}

/// Lock a borrowing together with its book, book first
async fn lock_borrowing(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> AppResult<(Borrowing, BookStock)> {
    // book_id never changes, so reading it unlocked is safe
    let book_id: i32 = sqlx::query_scalar("SELECT book_id FROM borrowings WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

    let stock = lock_book(tx, book_id).await?;

    let borrowing = sqlx::query_as::<_, Borrowing>(&format!(
        "SELECT {} FROM borrowings WHERE id = $1 FOR UPDATE",
        BORROWING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

    Ok((borrowing, stock))
}

async fn write_stock(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    stock: BookStock,
) -> AppResult<()> {
    sqlx::query("UPDATE books SET available_copies = $2, updated_at = NOW() WHERE id = $1")
        .bind(book_id)
        .bind(stock.available)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
