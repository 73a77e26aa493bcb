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


//! Database migrations
//!
//! This module handles database schema creation and migrations.
//!
//! # Migration Strategy
//! Since sqlx's compile-time migration system requires build-time database connection,
//! we implement migrations as runtime SQL execution tracked in `_migrations`.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
///
/// This function creates the database schema and applies any pending migrations.
/// Migrations are tracked in the `_migrations` table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create migrations tracking table
    create_migrations_table(pool).await?;

    // Run all migrations in order
    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    tracing::info!(migration = name, id, "applying migration");
    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// Creates all tables with their relationships, indexes, and constraints.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- MAIN ENTITIES
-- ============================================================================

-- books: core book metadata
CREATE TABLE IF NOT EXISTS books (
    id BLOB PRIMARY KEY NOT NULL,
    title TEXT NOT NULL CHECK (length(title) > 0),
    title_search TEXT NOT NULL,  -- lower-cased title for substring search
    rating INTEGER CHECK (rating IS NULL OR (rating >= 0 AND rating <= 999)),  -- tenths (DECIMAL(3,1))
    description TEXT,
    published_year INTEGER,

    -- Timestamps (server-assigned)
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- genres: name is unique; the service layer checks it too
CREATE TABLE IF NOT EXISTS genres (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    name_search TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- contributors: authors, editors, illustrators
CREATE TABLE IF NOT EXISTS contributors (
    id BLOB PRIMARY KEY NOT NULL,
    full_name TEXT NOT NULL UNIQUE,
    full_name_search TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ============================================================================
-- JUNCTION TABLES (Many-to-Many Relationships)
-- ============================================================================

-- books_genres: Book <-> Genre junction
CREATE TABLE IF NOT EXISTS books_genres (
    book_id BLOB NOT NULL,
    genre_id BLOB NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
    FOREIGN KEY (genre_id) REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

-- books_contributors: Book <-> Contributor junction, one row per role
CREATE TABLE IF NOT EXISTS books_contributors (
    book_id BLOB NOT NULL,
    contributor_id BLOB NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('author', 'editor', 'illustrator')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
    FOREIGN KEY (contributor_id) REFERENCES contributors(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, contributor_id, role)
);

-- ============================================================================
-- INDEXES for Performance
-- ============================================================================

-- books sort/filter columns
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
CREATE INDEX IF NOT EXISTS idx_books_rating ON books(rating);
CREATE INDEX IF NOT EXISTS idx_books_published_year ON books(published_year);

-- genres/contributors ordering
CREATE INDEX IF NOT EXISTS idx_genres_name ON genres(name);
CREATE INDEX IF NOT EXISTS idx_contributors_full_name ON contributors(full_name);

-- reverse lookups on junction tables (forward lookups use the primary key)
CREATE INDEX IF NOT EXISTS idx_books_genres_genre ON books_genres(genre_id);
CREATE INDEX IF NOT EXISTS idx_books_contributors_contributor ON books_contributors(contributor_id);

-- ============================================================================
-- TRIGGERS for Automatic Timestamp Updates
-- ============================================================================

CREATE TRIGGER IF NOT EXISTS update_books_timestamp
AFTER UPDATE ON books
FOR EACH ROW
BEGIN
    UPDATE books SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;

CREATE TRIGGER IF NOT EXISTS update_genres_timestamp
AFTER UPDATE ON genres
FOR EACH ROW
BEGIN
    UPDATE genres SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;

CREATE TRIGGER IF NOT EXISTS update_contributors_timestamp
AFTER UPDATE ON contributors
FOR EACH ROW
BEGIN
    UPDATE contributors SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;
        "#,
    )
    .await?;

    Ok(())
}
