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


//! Database storage and models
//!
//! This module handles all database operations using SQLite through sqlx.
//!
//! # Database Schema
//! - Books: Core book metadata (title, rating, description, published year)
//! - Genres: Named categories, unique by exact name
//! - Contributors: Authors, editors and illustrators, unique by full name
//! - Many-to-many junction tables for book relationships
//!
//! # Usage Example
//! ```no_run
//! use books_catalog::storage::{Database, queries, models::NewBook};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./catalog.db").await?;
//!
//! let mut tx = db.begin().await?;
//! let book_id = queries::insert_book(&mut *tx, &NewBook::new("The Hobbit")).await?;
//! tx.commit().await?;
//!
//! let mut conn = db.pool().acquire().await?;
//! let book = queries::find_book_by_id(&mut *conn, book_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    BookContributor, BookGenre, BookPatch, BookRow, Contributor, ContributorAssignment,
    ContributorPatch, Genre, GenrePatch, NewBook, NewContributor, NewGenre, Rating, Role,
};
