// Books Catalog - Genre and contributor aware book catalog
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Catalog services
//!
//! Request-level operations over books, genres and contributors. Each
//! operation validates its payload, runs its statements in one transaction
//! and returns domain values or a [`CatalogError`](crate::error::CatalogError).
//!
//! # Operation Flow
//! 1. Validate the payload at the input boundary
//! 2. Begin a transaction on a pooled connection
//! 3. Guard checks (existence, name uniqueness)
//! 4. Core row write, then link replacement
//! 5. Assemble the response from inside the transaction, then commit
//!
//! Any error drops the transaction, which rolls the whole unit back.
//!
//! # Usage Example
//! ```no_run
//! use books_catalog::catalog::Catalog;
//! use books_catalog::listing::BookListQuery;
//! use books_catalog::storage::{Database, NewBook, NewGenre};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::new(Database::new("./catalog.db").await?);
//!
//! let fantasy = catalog.create_genre(NewGenre::new("Fantasy")).await?;
//! let mut book = NewBook::new("The Hobbit");
//! book.genre_ids = vec![fantasy.id];
//! catalog.create_book(book).await?;
//!
//! let page = catalog
//!     .list_books(&BookListQuery::new(1, 20).in_genre(fantasy.id))
//!     .await?;
//! println!("{} books", page.total);
//! # Ok(())
//! # }
//! ```

mod books;
mod contributors;
mod genres;

use crate::storage::Database;

/// Entry point for catalog operations
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Underlying database handle
    pub fn database(&self) -> &Database {
        &self.db
    }
}
