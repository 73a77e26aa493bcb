//! Filtered, sorted and paginated listings
//!
//! Turns loosely-typed listing parameters into one parameterized statement
//! for the page and one for the total. Malformed sort, order and paging
//! inputs never fail: they are normalized to defaults.
//!
//! Every listing orders by the requested column and then by `id`, so a row
//! appears on exactly one page of an unchanged table.

use crate::error::Result;
use crate::storage::models::{BookRow, Contributor, Genre, Rating};
use crate::storage::queries::search_key;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// SORTING
// ============================================================================

/// Book column a listing may be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    Rating,
    PublishedYear,
}

impl SortField {
    /// Total parse: anything unrecognized sorts by title
    pub fn parse(value: &str) -> Self {
        match value {
            "title" => SortField::Title,
            "rating" => SortField::Rating,
            "published_year" => SortField::PublishedYear,
            other => {
                tracing::warn!(sort = other, "unknown sort field, using title");
                SortField::Title
            }
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortField::Title => "b.title",
            SortField::Rating => "b.rating",
            SortField::PublishedYear => "b.published_year",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// Total parse: anything other than `asc`/`desc` is ascending
    pub fn parse(value: &str) -> Self {
        match value {
            "asc" => SortOrder::Ascending,
            "desc" => SortOrder::Descending,
            other => {
                tracing::warn!(order = other, "unknown sort order, using asc");
                SortOrder::Ascending
            }
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

// ============================================================================
// PAGINATION
// ============================================================================

/// Normalized page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// `page < 1` becomes 1; a `page_size` outside `1..=100` becomes 10
    pub fn new(page: i64, page_size: i64) -> Self {
        let normalized = Self {
            page: if page < 1 { DEFAULT_PAGE } else { page },
            page_size: if (1..=MAX_PAGE_SIZE).contains(&page_size) {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
        };
        if normalized.page != page || normalized.page_size != page_size {
            tracing::warn!(
                page,
                page_size,
                normalized_page = normalized.page,
                normalized_page_size = normalized.page_size,
                "pagination parameters normalized"
            );
        }
        normalized
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        // saturating: absurd page numbers must not overflow
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filters across all pages
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
        }
    }
}

// ============================================================================
// LISTING PARAMETERS
// ============================================================================

/// Book listing parameters; all filters are optional and ANDed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookListQuery {
    pub page: PageRequest,
    pub sort: SortField,
    pub order: SortOrder,
    /// Case-insensitive substring of the title; empty is ignored
    pub q: Option<String>,
    pub genre_id: Option<Uuid>,
    pub published_year: Option<i32>,
    /// Inclusive lower rating bound
    pub rating_min: Option<Rating>,
    /// Inclusive upper rating bound
    pub rating_max: Option<Rating>,
}

impl BookListQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: PageRequest::new(page, page_size),
            ..Self::default()
        }
    }

    /// Sort by raw `sort`/`order` strings, normalizing unknown values
    pub fn sorted_by(mut self, sort: &str, order: &str) -> Self {
        self.sort = SortField::parse(sort);
        self.order = SortOrder::parse(order);
        self
    }

    pub fn search<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn in_genre(mut self, genre_id: Uuid) -> Self {
        self.genre_id = Some(genre_id);
        self
    }

    pub fn published_in(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    /// Inclusive rating range; raw bounds are clamped to [0, 99.9]
    pub fn rated_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rating_min = min.map(Rating::clamped);
        self.rating_max = max.map(Rating::clamped);
        self
    }
}

/// Genre listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreListQuery {
    pub page: PageRequest,
    pub q: Option<String>,
}

impl GenreListQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: PageRequest::new(page, page_size),
            q: None,
        }
    }

    pub fn search<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }
}

/// Contributor listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorListQuery {
    pub page: PageRequest,
    pub q: Option<String>,
}

impl ContributorListQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: PageRequest::new(page, page_size),
            q: None,
        }
    }

    pub fn search<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }
}

fn non_empty(q: &Option<String>) -> Option<&str> {
    q.as_deref().filter(|q| !q.is_empty())
}

// ============================================================================
// QUERY EXECUTION
// ============================================================================

/// `FROM ... WHERE ...` shared by the page and count statements
fn push_book_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &BookListQuery) {
    qb.push(" FROM books b");

    if let Some(genre_id) = query.genre_id {
        qb.push(
            " INNER JOIN books_genres bg ON bg.book_id = b.id \
              INNER JOIN genres g ON g.id = bg.genre_id AND g.id = ",
        );
        qb.push_bind(genre_id);
    }

    qb.push(" WHERE 1 = 1");

    if let Some(q) = non_empty(&query.q) {
        qb.push(" AND instr(b.title_search, ");
        qb.push_bind(search_key(q));
        qb.push(") > 0");
    }
    if let Some(year) = query.published_year {
        qb.push(" AND b.published_year = ");
        qb.push_bind(year);
    }
    if let Some(min) = query.rating_min {
        qb.push(" AND b.rating >= ");
        qb.push_bind(min.tenths());
    }
    if let Some(max) = query.rating_max {
        qb.push(" AND b.rating <= ");
        qb.push_bind(max.tenths());
    }
}

/// Fetch one page of book rows plus the total matching the filters
pub async fn fetch_books(
    conn: &mut SqliteConnection,
    query: &BookListQuery,
) -> Result<(Vec<BookRow>, i64)> {
    tracing::debug!(
        page = query.page.page(),
        page_size = query.page.page_size(),
        sort = ?query.sort,
        order = ?query.order,
        "listing books"
    );

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (SELECT b.id");
    push_book_filters(&mut count_qb, query);
    count_qb.push(")");
    let (total,): (i64,) = count_qb.build_query_as::<(i64,)>().fetch_one(&mut *conn).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT b.id, b.title, b.rating, b.description, b.published_year, b.created_at, b.updated_at",
    );
    push_book_filters(&mut qb, query);
    qb.push(" ORDER BY ");
    qb.push(query.sort.column());
    qb.push(" ");
    qb.push(query.order.keyword());
    qb.push(", b.id ASC LIMIT ");
    qb.push_bind(query.page.page_size());
    qb.push(" OFFSET ");
    qb.push_bind(query.page.offset());

    let rows = qb.build_query_as::<BookRow>().fetch_all(&mut *conn).await?;

    Ok((rows, total))
}

/// Listing over a named table: `table` aliased `t`, searched on `search_column`
struct NamedListing<'a> {
    table: &'static str,
    columns: &'static str,
    search_column: &'static str,
    order_column: &'static str,
    q: Option<&'a str>,
    page: PageRequest,
}

impl NamedListing<'_> {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" FROM ");
        qb.push(self.table);
        qb.push(" t");
        if let Some(q) = self.q {
            qb.push(" WHERE instr(t.");
            qb.push(self.search_column);
            qb.push(", ");
            qb.push_bind(search_key(q));
            qb.push(") > 0");
        }
    }

    async fn fetch<T>(&self, conn: &mut SqliteConnection) -> Result<(Vec<T>, i64)>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        tracing::debug!(
            table = self.table,
            page = self.page.page(),
            page_size = self.page.page_size(),
            "listing"
        );

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (SELECT t.id");
        self.push_filters(&mut count_qb);
        count_qb.push(")");
        let (total,): (i64,) = count_qb.build_query_as::<(i64,)>().fetch_one(&mut *conn).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(self.columns);
        self.push_filters(&mut qb);
        qb.push(" ORDER BY t.");
        qb.push(self.order_column);
        qb.push(" ASC, t.id ASC LIMIT ");
        qb.push_bind(self.page.page_size());
        qb.push(" OFFSET ");
        qb.push_bind(self.page.offset());

        let rows = qb.build_query_as::<T>().fetch_all(&mut *conn).await?;

        Ok((rows, total))
    }
}

/// Fetch one page of genres ordered by name
pub async fn fetch_genres(
    conn: &mut SqliteConnection,
    query: &GenreListQuery,
) -> Result<(Vec<Genre>, i64)> {
    NamedListing {
        table: "genres",
        columns: "t.id, t.name, t.created_at, t.updated_at",
        search_column: "name_search",
        order_column: "name",
        q: non_empty(&query.q),
        page: query.page,
    }
    .fetch(conn)
    .await
}

/// Fetch one page of contributors ordered by full name
pub async fn fetch_contributors(
    conn: &mut SqliteConnection,
    query: &ContributorListQuery,
) -> Result<(Vec<Contributor>, i64)> {
    NamedListing {
        table: "contributors",
        columns: "t.id, t.full_name, t.created_at, t.updated_at",
        search_column: "full_name_search",
        order_column: "full_name",
        q: non_empty(&query.q),
        page: query.page,
    }
    .fetch(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::{NewBook, NewGenre};
    use crate::storage::queries;

    #[test]
    fn test_page_request_normalization() {
        assert_eq!(PageRequest::new(0, 10).page(), 1);
        assert_eq!(PageRequest::new(-5, 10).page(), 1);
        assert_eq!(PageRequest::new(3, 0).page_size(), 10);
        assert_eq!(PageRequest::new(3, 101).page_size(), 10);
        assert_eq!(PageRequest::new(3, 100).page_size(), 100);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert_eq!(PageRequest::new(i64::MAX, 100).offset(), i64::MAX);
    }

    #[test]
    fn test_sort_parse_is_total() {
        assert_eq!(SortField::parse("rating"), SortField::Rating);
        assert_eq!(SortField::parse("published_year"), SortField::PublishedYear);
        assert_eq!(SortField::parse("drop table"), SortField::Title);
        assert_eq!(SortField::parse(""), SortField::Title);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Descending);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Ascending);
    }

    async fn seed(db: &Database, titles: &[(&str, Option<f64>, Option<i32>)]) {
        let mut tx = db.begin().await.unwrap();
        for (title, rating, year) in titles {
            let mut book = NewBook::new(*title);
            book.rating = rating.map(|r| Rating::new(r).unwrap());
            book.published_year = *year;
            queries::insert_book(&mut *tx, &book).await.unwrap();
        }
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_filters_are_anded() {
        let db = Database::new_in_memory().await.unwrap();
        seed(
            &db,
            &[
                ("Dune", Some(9.0), Some(1965)),
                ("Dune Messiah", Some(7.5), Some(1969)),
                ("Children of Dune", Some(7.0), Some(1976)),
                ("Emma", None, Some(1815)),
            ],
        )
        .await;
        let mut conn = db.pool().acquire().await.unwrap();

        let query = BookListQuery::new(1, 10)
            .search("DUNE")
            .rated_between(Some(7.0), Some(8.0));
        let (rows, total) = fetch_books(&mut conn, &query).await.unwrap();
        let titles: Vec<&str> = rows.iter().map(|b| b.title.as_str()).collect();

        assert_eq!(total, 2);
        assert_eq!(titles, vec!["Children of Dune", "Dune Messiah"]);

        let query = BookListQuery::new(1, 10).search("").published_in(1815);
        let (rows, total) = fetch_books(&mut conn, &query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "Emma");
    }

    #[tokio::test]
    async fn test_sort_by_rating_desc_keeps_total() {
        let db = Database::new_in_memory().await.unwrap();
        seed(
            &db,
            &[("A", Some(1.0), None), ("B", Some(9.5), None), ("C", None, None)],
        )
        .await;
        let mut conn = db.pool().acquire().await.unwrap();

        let query = BookListQuery::new(1, 2).sorted_by("rating", "desc");
        let (rows, total) = fetch_books(&mut conn, &query).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "B");
        assert_eq!(rows[1].title, "A");
    }

    #[tokio::test]
    async fn test_genre_listing_is_name_ordered_and_searchable() {
        let db = Database::new_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        for name in ["Thriller", "Fantasy", "Dark Fantasy"] {
            queries::insert_genre(&mut conn, &NewGenre::new(name)).await.unwrap();
        }

        let (genres, total) = fetch_genres(&mut conn, &GenreListQuery::new(1, 10)).await.unwrap();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(total, 3);
        assert_eq!(names, vec!["Dark Fantasy", "Fantasy", "Thriller"]);

        let (genres, total) = fetch_genres(&mut conn, &GenreListQuery::new(1, 10).search("fANT"))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(genres.len(), 2);
    }
}
