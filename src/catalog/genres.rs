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


//! Genre operations
//!
//! Genre names are unique by exact, case-sensitive match. The name is looked
//! up before every create and rename so the caller gets a Conflict naming the
//! value; the store's unique constraint catches writers that race past the
//! lookup and is reported the same way.

use super::Catalog;
use crate::error::{CatalogError, Result};
use crate::listing::{fetch_genres, GenreListQuery, Page};
use crate::storage::models::{Genre, GenrePatch, NewGenre};
use crate::storage::queries;
use uuid::Uuid;

impl Catalog {
    /// List genres ordered by name
    pub async fn list_genres(&self, query: &GenreListQuery) -> Result<Page<Genre>> {
        let mut tx = self.db.begin().await?;
        let (items, total) = fetch_genres(&mut *tx, query).await?;
        tx.commit().await?;

        Ok(Page::new(items, total, query.page))
    }

    pub async fn get_genre(&self, genre_id: Uuid) -> Result<Option<Genre>> {
        let mut conn = self.db.pool().acquire().await?;
        queries::find_genre_by_id(&mut *conn, genre_id).await
    }

    /// Create a genre
    ///
    /// # Errors
    /// - `Conflict` if a genre with exactly this name exists
    pub async fn create_genre(&self, genre: NewGenre) -> Result<Genre> {
        genre.validate()?;

        let mut tx = self.db.begin().await?;

        if queries::find_genre_by_name(&mut *tx, &genre.name).await?.is_some() {
            tracing::warn!(name = %genre.name, "genre name already taken");
            return Err(CatalogError::conflict("genre", "name", genre.name));
        }

        let genre_id = queries::insert_genre(&mut *tx, &genre).await?;
        let created = queries::find_genre_by_id(&mut *tx, genre_id)
            .await?
            .ok_or_else(|| CatalogError::internal(format!("genre {} vanished inside its own write", genre_id)))?;

        tx.commit().await?;

        tracing::info!(genre_id = %genre_id, name = %created.name, "created genre");
        Ok(created)
    }

    /// Rename a genre
    ///
    /// Renaming a genre to its current name succeeds. A missing or null name
    /// leaves the genre unchanged.
    ///
    /// # Errors
    /// - `Conflict` if another genre holds the new name
    /// - `NotFound` if the genre does not exist
    pub async fn update_genre(&self, genre_id: Uuid, patch: GenrePatch) -> Result<Genre> {
        patch.validate()?;

        let mut tx = self.db.begin().await?;

        if let Some(name) = &patch.name {
            if let Some(holder) = queries::find_genre_by_name(&mut *tx, name).await? {
                if holder.id != genre_id {
                    tracing::warn!(genre_id = %genre_id, name = %name, "genre name already taken");
                    return Err(CatalogError::conflict("genre", "name", name.clone()));
                }
            }
        }

        let existing = queries::find_genre_by_id(&mut *tx, genre_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("genre", genre_id))?;

        let updated = match patch.name {
            Some(name) if name != existing.name => {
                queries::rename_genre(&mut *tx, genre_id, &name).await?;
                let renamed = queries::find_genre_by_id(&mut *tx, genre_id)
                    .await?
                    .ok_or_else(|| CatalogError::not_found("genre", genre_id))?;
                tracing::info!(genre_id = %genre_id, from = %existing.name, to = %renamed.name, "renamed genre");
                renamed
            }
            _ => existing,
        };

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a genre; books lose the link but are kept
    pub async fn delete_genre(&self, genre_id: Uuid) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let deleted = queries::delete_genre(&mut *tx, genre_id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(genre_id = %genre_id, "deleted genre");
        }
        Ok(deleted)
    }
}
