//! Book catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &BookQuery, limit: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query, limit, offset).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn newest(&self, limit: i64) -> AppResult<Vec<Book>> {
        self.repository.books.newest(limit).await
    }

    pub async fn create(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        if let Some(isbn) = book.isbn.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if self.repository.books.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(format!("A book with ISBN {} already exists", isbn)));
            }
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, copies = created.total_copies, "Book created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;

        if let Some(isbn) = book.isbn.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(format!("A book with ISBN {} already exists", isbn)));
            }
        }

        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!(
            book_id = id,
            total = updated.total_copies,
            available = updated.available_copies,
            "Book updated"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
