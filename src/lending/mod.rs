//! Borrowing lifecycle rules
//!
//! Pure functions over snapshots read inside a repository transaction. The
//! repository locks the book row, hands the snapshot to these rules and writes
//! back whatever they produce, so availability accounting lives in one place.

pub mod fines;
pub mod overdue;
pub mod stock;

pub use stock::BookStock;
