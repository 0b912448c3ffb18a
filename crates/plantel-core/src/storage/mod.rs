//! Persistence backends for the repository traits in [`crate::domain::repository`].
//!
//! - [`InMemoryBackend`] - process-local state behind one `tokio::sync::RwLock`
//! - [`SqliteBackend`] - sqlx over `SQLite`, one transaction per unit of work
//!
//! Both honour the optimistic status check of
//! [`crate::domain::UnitOfWork::commit`].

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryBackend;
pub use sqlite::SqliteBackend;
