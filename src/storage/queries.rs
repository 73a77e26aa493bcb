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


//! Database query functions
//!
//! Row-level reads and writes per table. Every function takes a
//! `&mut SqliteConnection` so callers decide the unit of work: pass
//! `&mut *tx` inside a transaction, or a pooled connection for plain reads.
//!
//! # Query Patterns
//! - One function per statement family, grouped by table
//! - Store constraint violations translated into domain errors where the
//!   caller knows which value was at fault
//! - Filtered/paginated listing lives in `crate::listing`

use crate::error::{constraint_violation, CatalogError, ConstraintViolation, Result};
use crate::patch::Field;
use crate::storage::models::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

/// Lower-cased copy of a searchable column
///
/// SQLite's own `lower()`/`LIKE` only fold ASCII, so the folded value is
/// computed here and stored next to the searchable column.
pub(crate) fn search_key(value: &str) -> String {
    value.to_lowercase()
}

const BOOK_COLUMNS: &str =
    "id, title, rating, description, published_year, created_at, updated_at";

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// Insert a new book row (links are written separately)
///
/// Returns the id of the inserted book.
pub async fn insert_book(conn: &mut SqliteConnection, book: &NewBook) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO books (id, title, title_search, rating, description, published_year)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&book.title)
    .bind(search_key(&book.title))
    .bind(book.rating.map(Rating::tenths))
    .bind(&book.description)
    .bind(book.published_year)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Find book by ID
pub async fn find_book_by_id(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Option<BookRow>> {
    let book = sqlx::query_as::<_, BookRow>(&format!(
        "SELECT {} FROM books WHERE id = ?",
        BOOK_COLUMNS
    ))
    .bind(book_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(book)
}

/// Check whether a book row exists
pub async fn book_exists(conn: &mut SqliteConnection, book_id: Uuid) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM books WHERE id = ?")
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// Apply the present core fields of a patch to a book row
///
/// Returns the number of rows touched (0 when the patch has no core fields
/// or the book does not exist).
pub async fn update_book_fields(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    patch: &BookPatch,
) -> Result<u64> {
    if !patch.has_core_changes() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE books SET ");
    {
        let mut set = qb.separated(", ");

        match &patch.title {
            Field::Value(title) => {
                set.push("title = ").push_bind_unseparated(title.clone());
                set.push("title_search = ").push_bind_unseparated(search_key(title));
            }
            // Rejected by validation; never clear a required column
            Field::Null | Field::Missing => {}
        }

        if let Some(rating) = patch.rating.clone().into_option() {
            set.push("rating = ")
                .push_bind_unseparated(rating.map(Rating::tenths));
        }
        if let Some(description) = patch.description.clone().into_option() {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(year) = patch.published_year.clone().into_option() {
            set.push("published_year = ").push_bind_unseparated(year);
        }
    }
    qb.push(" WHERE id = ");
    qb.push_bind(book_id);

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Delete a book (and all its link rows via CASCADE)
///
/// Returns whether a row existed.
pub async fn delete_book(conn: &mut SqliteConnection, book_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// BOOK <-> GENRE LINKS
// ============================================================================

/// Replace the genre-link set of a book with exactly `genre_ids`
///
/// Deletes every existing link, then inserts one row per id. Duplicate ids
/// collapse on the composite key. Must run inside the caller's transaction.
pub async fn replace_book_genres(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    genre_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM books_genres WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for genre_id in genre_ids {
        sqlx::query("INSERT OR IGNORE INTO books_genres (book_id, genre_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await
            .map_err(|err| match constraint_violation(&err) {
                Some(ConstraintViolation::ForeignKey) => {
                    CatalogError::unknown_reference("genre", genre_id)
                }
                _ => CatalogError::from(err),
            })?;
    }

    Ok(())
}

/// Find genres linked to a book, ordered by name
pub async fn find_genres_by_book(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.id, g.name, g.created_at, g.updated_at
        FROM genres g
        INNER JOIN books_genres bg ON g.id = bg.genre_id
        WHERE bg.book_id = ?
        ORDER BY g.name, g.id
        "#,
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(genres)
}

/// Raw genre links of a book
pub async fn find_book_genre_links(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Vec<BookGenre>> {
    let links = sqlx::query_as::<_, BookGenre>(
        "SELECT book_id, genre_id FROM books_genres WHERE book_id = ?",
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(links)
}

// ============================================================================
// BOOK <-> CONTRIBUTOR LINKS
// ============================================================================

/// Replace the contributor-link set of a book with exactly `assignments`
///
/// A contributor may hold several distinct roles on one book; repeating the
/// same (contributor, role) pair collapses on the composite key.
pub async fn replace_book_contributors(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    assignments: &[ContributorAssignment],
) -> Result<()> {
    sqlx::query("DELETE FROM books_contributors WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for assignment in assignments {
        sqlx::query(
            "INSERT OR IGNORE INTO books_contributors (book_id, contributor_id, role) VALUES (?, ?, ?)",
        )
        .bind(book_id)
        .bind(assignment.contributor_id)
        .bind(assignment.role.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::ForeignKey) => {
                CatalogError::unknown_reference("contributor", assignment.contributor_id)
            }
            _ => CatalogError::from(err),
        })?;
    }

    Ok(())
}

/// Find contributors of a book with their role, ordered by name then role
pub async fn find_contributors_by_book(
    conn: &mut SqliteConnection,
    book_id: Uuid,
) -> Result<Vec<(Contributor, Role)>> {
    let rows = sqlx::query_as::<_, (Uuid, String, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>, String)>(
        r#"
        SELECT c.id, c.full_name, c.created_at, c.updated_at, bc.role
        FROM contributors c
        INNER JOIN books_contributors bc ON c.id = bc.contributor_id
        WHERE bc.book_id = ?
        ORDER BY c.full_name, c.id, bc.role
        "#,
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id, full_name, created_at, updated_at, role)| {
            let contributor = Contributor {
                id,
                full_name,
                created_at,
                updated_at,
            };
            Ok((contributor, role.parse::<Role>()?))
        })
        .collect()
}

/// Raw contributor links of a book
pub async fn find_book_contributor_links(
    conn: &mut SqliteConnection,
    book_id: Uuid,
) -> Result<Vec<BookContributor>> {
    let links = sqlx::query_as::<_, BookContributor>(
        "SELECT book_id, contributor_id, role FROM books_contributors WHERE book_id = ?",
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(links)
}

// ============================================================================
// GENRE QUERIES
// ============================================================================

/// Insert a new genre
///
/// A unique violation from the store (a concurrent insert that won the race
/// past the pre-check) is reported as a Conflict naming the value.
pub async fn insert_genre(conn: &mut SqliteConnection, genre: &NewGenre) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO genres (id, name, name_search) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&genre.name)
        .bind(search_key(&genre.name))
        .execute(&mut *conn)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => CatalogError::conflict("genre", "name", genre.name.clone()),
            _ => CatalogError::from(err),
        })?;

    Ok(id)
}

/// Find genre by ID
pub async fn find_genre_by_id(conn: &mut SqliteConnection, genre_id: Uuid) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>(
        "SELECT id, name, created_at, updated_at FROM genres WHERE id = ?",
    )
    .bind(genre_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(genre)
}

/// Find genre by exact (case-sensitive) name
pub async fn find_genre_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>(
        "SELECT id, name, created_at, updated_at FROM genres WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(genre)
}

/// Rename a genre
///
/// Returns whether the genre existed.
pub async fn rename_genre(conn: &mut SqliteConnection, genre_id: Uuid, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE genres SET name = ?, name_search = ? WHERE id = ?")
        .bind(name)
        .bind(search_key(name))
        .bind(genre_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => CatalogError::conflict("genre", "name", name),
            _ => CatalogError::from(err),
        })?;

    Ok(result.rows_affected() > 0)
}

/// Delete a genre (its book links go via CASCADE)
pub async fn delete_genre(conn: &mut SqliteConnection, genre_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM genres WHERE id = ?")
        .bind(genre_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// CONTRIBUTOR QUERIES
// ============================================================================

/// Insert a new contributor
pub async fn insert_contributor(conn: &mut SqliteConnection, contributor: &NewContributor) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO contributors (id, full_name, full_name_search) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&contributor.full_name)
        .bind(search_key(&contributor.full_name))
        .execute(&mut *conn)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => {
                CatalogError::conflict("contributor", "full_name", contributor.full_name.clone())
            }
            _ => CatalogError::from(err),
        })?;

    Ok(id)
}

/// Find contributor by ID
pub async fn find_contributor_by_id(
    conn: &mut SqliteConnection,
    contributor_id: Uuid,
) -> Result<Option<Contributor>> {
    let contributor = sqlx::query_as::<_, Contributor>(
        "SELECT id, full_name, created_at, updated_at FROM contributors WHERE id = ?",
    )
    .bind(contributor_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(contributor)
}

/// Find contributor by exact full name
pub async fn find_contributor_by_name(
    conn: &mut SqliteConnection,
    full_name: &str,
) -> Result<Option<Contributor>> {
    let contributor = sqlx::query_as::<_, Contributor>(
        "SELECT id, full_name, created_at, updated_at FROM contributors WHERE full_name = ?",
    )
    .bind(full_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(contributor)
}

/// Rename a contributor
pub async fn rename_contributor(
    conn: &mut SqliteConnection,
    contributor_id: Uuid,
    full_name: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE contributors SET full_name = ?, full_name_search = ? WHERE id = ?")
        .bind(full_name)
        .bind(search_key(full_name))
        .bind(contributor_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => CatalogError::conflict("contributor", "full_name", full_name),
            _ => CatalogError::from(err),
        })?;

    Ok(result.rows_affected() > 0)
}

/// Delete a contributor (its book links go via CASCADE)
pub async fn delete_contributor(conn: &mut SqliteConnection, contributor_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contributors WHERE id = ?")
        .bind(contributor_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    #[tokio::test]
    async fn test_insert_and_find_book() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        let mut new_book = NewBook::new("Test Book");
        new_book.rating = Some(Rating::new(4.5).unwrap());
        new_book.published_year = Some(1999);

        let book_id = insert_book(&mut conn, &new_book).await.expect("Failed to insert book");

        let book = find_book_by_id(&mut conn, book_id)
            .await
            .expect("Failed to find book")
            .expect("Book missing");

        assert_eq!(book.title, "Test Book");
        assert_eq!(book.rating, Some(45));
        assert_eq!(book.get_rating().unwrap(), Some(Rating::new(4.5).unwrap()));
        assert_eq!(book.published_year, Some(1999));
        assert!(book.description.is_none());
    }

    #[tokio::test]
    async fn test_update_book_fields_only_touches_present_fields() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        let mut new_book = NewBook::new("Original");
        new_book.description = Some("kept".to_string());
        new_book.rating = Some(Rating::new(3.0).unwrap());
        let book_id = insert_book(&mut conn, &new_book).await.expect("Failed to insert book");

        let patch = BookPatch {
            title: Field::Value("Renamed".to_string()),
            rating: Field::Null,
            ..BookPatch::default()
        };
        let touched = update_book_fields(&mut conn, book_id, &patch)
            .await
            .expect("Failed to update book");
        assert_eq!(touched, 1);

        let book = find_book_by_id(&mut conn, book_id).await.unwrap().unwrap();
        assert_eq!(book.title, "Renamed");
        assert_eq!(book.rating, None);
        assert_eq!(book.description.as_deref(), Some("kept"));

        let title_search: String = sqlx::query_scalar("SELECT title_search FROM books WHERE id = ?")
            .bind(book_id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(title_search, "renamed");
    }

    #[tokio::test]
    async fn test_replace_book_genres_is_not_a_merge() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        let book_id = insert_book(&mut conn, &NewBook::new("Linked")).await.unwrap();
        let a = insert_genre(&mut conn, &NewGenre::new("A")).await.unwrap();
        let b = insert_genre(&mut conn, &NewGenre::new("B")).await.unwrap();
        let c = insert_genre(&mut conn, &NewGenre::new("C")).await.unwrap();

        replace_book_genres(&mut conn, book_id, &[a, b, b]).await.unwrap();
        assert_eq!(find_book_genre_links(&mut conn, book_id).await.unwrap().len(), 2);

        replace_book_genres(&mut conn, book_id, &[c]).await.unwrap();
        let names: Vec<String> = find_genres_by_book(&mut conn, book_id)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["C"]);
    }

    #[tokio::test]
    async fn test_unknown_genre_reference() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        let book_id = insert_book(&mut conn, &NewBook::new("Dangling")).await.unwrap();
        let missing = Uuid::new_v4();

        let err = replace_book_genres(&mut conn, book_id, &[missing])
            .await
            .expect_err("Link to a missing genre was accepted");
        assert!(matches!(err, CatalogError::UnknownReference { entity: "genre", .. }));
    }

    #[tokio::test]
    async fn test_contributor_may_hold_several_roles() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        let book_id = insert_book(&mut conn, &NewBook::new("Picture Book")).await.unwrap();
        let person = insert_contributor(&mut conn, &NewContributor::new("Ann Artist")).await.unwrap();

        let assignments = [
            ContributorAssignment::new(person, Role::Author),
            ContributorAssignment::new(person, Role::Illustrator),
            ContributorAssignment::new(person, Role::Author),
        ];
        replace_book_contributors(&mut conn, book_id, &assignments).await.unwrap();

        let found = find_contributors_by_book(&mut conn, book_id).await.unwrap();
        let roles: Vec<Role> = found.iter().map(|(_, role)| *role).collect();
        assert_eq!(roles, vec![Role::Author, Role::Illustrator]);
        assert!(found.iter().all(|(c, _)| c.full_name == "Ann Artist"));
    }

    #[tokio::test]
    async fn test_store_unique_violation_becomes_conflict() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");

        insert_genre(&mut conn, &NewGenre::new("Horror")).await.unwrap();
        let err = insert_genre(&mut conn, &NewGenre::new("Horror"))
            .await
            .expect_err("Duplicate genre accepted");

        assert!(err.is_conflict());
        assert!(err.to_string().contains("'Horror'"));
    }
}
