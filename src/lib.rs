//! Books catalog core
//!
//! Books with a many-to-many relation to genres and to contributors (with a
//! role per credit), stored in SQLite. [`Catalog`] is the entry point:
//! filtered and paginated listings, single fetches with relations embedded,
//! and transactional create/update/delete.
//!
//! # Modules
//! - [`catalog`] - Request-level operations
//! - [`listing`] - Sorting, filtering and pagination
//! - [`assembler`] - Book aggregate with genres and contributors
//! - [`storage`] - Connection pool, schema, row models and queries
//! - [`config`] - Environment-driven settings

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod patch;
pub mod storage;

pub use assembler::BookDetails;
pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use listing::{BookListQuery, ContributorListQuery, GenreListQuery, Page, SortField, SortOrder};
pub use patch::Field;
pub use storage::Database;
