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


//! Book operations
//!
//! Writes keep a book and its link rows consistent: the book row is written
//! first, link sets are replaced after it exists, and the whole sequence
//! commits or rolls back together.

use super::Catalog;
use crate::assembler::{assemble_book, assemble_books, BookDetails};
use crate::error::{CatalogError, Result};
use crate::listing::{fetch_books, BookListQuery, Page};
use crate::storage::models::{BookPatch, NewBook};
use crate::storage::queries;
use uuid::Uuid;

impl Catalog {
    /// List books matching `query`, one page at a time
    ///
    /// Page and total are read in the same transaction so they agree.
    pub async fn list_books(&self, query: &BookListQuery) -> Result<Page<BookDetails>> {
        let mut tx = self.db.begin().await?;

        let (rows, total) = fetch_books(&mut *tx, query).await?;
        let items = assemble_books(&mut *tx, rows).await?;

        tx.commit().await?;
        Ok(Page::new(items, total, query.page))
    }

    /// Get a book with its genres and contributors
    pub async fn get_book(&self, book_id: Uuid) -> Result<Option<BookDetails>> {
        let mut tx = self.db.begin().await?;

        let book = match queries::find_book_by_id(&mut *tx, book_id).await? {
            Some(row) => Some(assemble_book(&mut *tx, row).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(book)
    }

    /// Create a book and its initial links
    ///
    /// # Errors
    /// - `Validation` if a field is outside its accepted range
    /// - `UnknownReference` if a genre or contributor id does not exist;
    ///   nothing is written in that case
    pub async fn create_book(&self, book: NewBook) -> Result<BookDetails> {
        book.validate()?;

        let mut tx = self.db.begin().await?;

        let book_id = queries::insert_book(&mut *tx, &book).await?;
        queries::replace_book_genres(&mut *tx, book_id, &book.genre_ids).await?;
        queries::replace_book_contributors(&mut *tx, book_id, &book.contributors).await?;

        let details = load_details(&mut *tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(
            book_id = %book_id,
            genres = details.genres.len(),
            contributors = details.contributors.len(),
            "created book"
        );
        Ok(details)
    }

    /// Apply a partial update to a book
    ///
    /// Missing fields are left untouched. A present `genre_ids` or
    /// `contributors` list replaces the whole link set, even when empty.
    ///
    /// # Errors
    /// - `NotFound` if the book does not exist (checked before any write)
    /// - `Validation` / `UnknownReference` as for [`Catalog::create_book`]
    pub async fn update_book(&self, book_id: Uuid, patch: BookPatch) -> Result<BookDetails> {
        patch.validate()?;

        let mut tx = self.db.begin().await?;

        if !queries::book_exists(&mut *tx, book_id).await? {
            return Err(CatalogError::not_found("book", book_id));
        }

        queries::update_book_fields(&mut *tx, book_id, &patch).await?;

        if let Some(genre_ids) = &patch.genre_ids {
            queries::replace_book_genres(&mut *tx, book_id, genre_ids).await?;
        }
        if let Some(contributors) = &patch.contributors {
            queries::replace_book_contributors(&mut *tx, book_id, contributors).await?;
        }

        let details = load_details(&mut *tx, book_id).await?;
        tx.commit().await?;

        tracing::info!(
            book_id = %book_id,
            core = patch.has_core_changes(),
            genres_replaced = patch.genre_ids.is_some(),
            contributors_replaced = patch.contributors.is_some(),
            "updated book"
        );
        Ok(details)
    }

    /// Delete a book; its link rows go with it
    ///
    /// Returns `false` if there was no such book.
    pub async fn delete_book(&self, book_id: Uuid) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let deleted = queries::delete_book(&mut *tx, book_id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(book_id = %book_id, "deleted book");
        }
        Ok(deleted)
    }
}

async fn load_details(conn: &mut sqlx::SqliteConnection, book_id: Uuid) -> Result<BookDetails> {
    let row = queries::find_book_by_id(&mut *conn, book_id)
        .await?
        .ok_or_else(|| CatalogError::internal(format!("book {} vanished inside its own write", book_id)))?;
    assemble_book(conn, row).await
}
