//! Book aggregate assembly
//!
//! Combines a book row with its genres and contributor roles into the shape
//! returned by every book operation. Single fetch and listing go through the
//! same function, so a book reads identically either way.

use crate::error::Result;
use crate::storage::models::{BookRow, Contributor, Genre, Rating, Role};
use crate::storage::queries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<Genre> for GenreSummary {
    fn from(genre: Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub id: Uuid,
    pub full_name: String,
}

impl From<Contributor> for ContributorSummary {
    fn from(contributor: Contributor) -> Self {
        Self {
            id: contributor.id,
            full_name: contributor.full_name,
        }
    }
}

/// A contributor together with the role taken on one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookContributorEntry {
    pub contributor: ContributorSummary,
    pub role: Role,
}

/// Book with its relations embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDetails {
    pub id: Uuid,
    pub title: String,
    pub rating: Option<Rating>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered by name
    pub genres: Vec<GenreSummary>,
    /// Ordered by contributor name, then role
    pub contributors: Vec<BookContributorEntry>,
}

/// Attach genres and contributors to one book row
pub async fn assemble_book(conn: &mut SqliteConnection, row: BookRow) -> Result<BookDetails> {
    let rating = row.get_rating()?;

    let genres = queries::find_genres_by_book(&mut *conn, row.id)
        .await?
        .into_iter()
        .map(GenreSummary::from)
        .collect();

    let contributors = queries::find_contributors_by_book(&mut *conn, row.id)
        .await?
        .into_iter()
        .map(|(contributor, role)| BookContributorEntry {
            contributor: contributor.into(),
            role,
        })
        .collect();

    Ok(BookDetails {
        id: row.id,
        title: row.title,
        rating,
        description: row.description,
        published_year: row.published_year,
        created_at: row.created_at,
        updated_at: row.updated_at,
        genres,
        contributors,
    })
}

/// Assemble a page of rows, preserving their order
pub async fn assemble_books(conn: &mut SqliteConnection, rows: Vec<BookRow>) -> Result<Vec<BookDetails>> {
    let mut books = Vec::with_capacity(rows.len());
    for row in rows {
        books.push(assemble_book(&mut *conn, row).await?);
    }
    Ok(books)
}
