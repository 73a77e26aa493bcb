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


//! Contributor operations
//!
//! Same name guard as genres, on `full_name`.

use super::Catalog;
use crate::error::{CatalogError, Result};
use crate::listing::{fetch_contributors, ContributorListQuery, Page};
use crate::storage::models::{Contributor, ContributorPatch, NewContributor};
use crate::storage::queries;
use uuid::Uuid;

impl Catalog {
    /// List contributors ordered by full name
    pub async fn list_contributors(&self, query: &ContributorListQuery) -> Result<Page<Contributor>> {
        let mut tx = self.db.begin().await?;
        let (items, total) = fetch_contributors(&mut *tx, query).await?;
        tx.commit().await?;

        Ok(Page::new(items, total, query.page))
    }

    pub async fn get_contributor(&self, contributor_id: Uuid) -> Result<Option<Contributor>> {
        let mut conn = self.db.pool().acquire().await?;
        queries::find_contributor_by_id(&mut *conn, contributor_id).await
    }

    pub async fn create_contributor(&self, contributor: NewContributor) -> Result<Contributor> {
        contributor.validate()?;

        let mut tx = self.db.begin().await?;

        if queries::find_contributor_by_name(&mut *tx, &contributor.full_name)
            .await?
            .is_some()
        {
            tracing::warn!(full_name = %contributor.full_name, "contributor name already taken");
            return Err(CatalogError::conflict("contributor", "full_name", contributor.full_name));
        }

        let contributor_id = queries::insert_contributor(&mut *tx, &contributor).await?;
        let created = queries::find_contributor_by_id(&mut *tx, contributor_id)
            .await?
            .ok_or_else(|| {
                CatalogError::internal(format!("contributor {} vanished inside its own write", contributor_id))
            })?;

        tx.commit().await?;

        tracing::info!(contributor_id = %contributor_id, "created contributor");
        Ok(created)
    }

    /// Rename a contributor; a missing or null name leaves it unchanged
    pub async fn update_contributor(
        &self,
        contributor_id: Uuid,
        patch: ContributorPatch,
    ) -> Result<Contributor> {
        patch.validate()?;

        let mut tx = self.db.begin().await?;

        if let Some(full_name) = &patch.full_name {
            if let Some(holder) = queries::find_contributor_by_name(&mut *tx, full_name).await? {
                if holder.id != contributor_id {
                    tracing::warn!(contributor_id = %contributor_id, "contributor name already taken");
                    return Err(CatalogError::conflict("contributor", "full_name", full_name.clone()));
                }
            }
        }

        let existing = queries::find_contributor_by_id(&mut *tx, contributor_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("contributor", contributor_id))?;

        let updated = match patch.full_name {
            Some(full_name) if full_name != existing.full_name => {
                queries::rename_contributor(&mut *tx, contributor_id, &full_name).await?;
                tracing::info!(contributor_id = %contributor_id, "renamed contributor");
                queries::find_contributor_by_id(&mut *tx, contributor_id)
                    .await?
                    .ok_or_else(|| CatalogError::not_found("contributor", contributor_id))?
            }
            _ => existing,
        };

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a contributor; books lose the credit but are kept
    pub async fn delete_contributor(&self, contributor_id: Uuid) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let deleted = queries::delete_contributor(&mut *tx, contributor_id).await?;
        tx.commit().await?;

        if deleted {
            tracing::info!(contributor_id = %contributor_id, "deleted contributor");
        }
        Ok(deleted)
    }
}
