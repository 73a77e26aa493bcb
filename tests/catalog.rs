//! Integration tests for the catalog services
//!
//! Every test runs against a fresh in-memory database, except the
//! persistence test which uses a temporary file.

use books_catalog::storage::models::{
    BookPatch, ContributorAssignment, GenrePatch, NewBook, NewContributor, NewGenre, Rating, Role,
};
use books_catalog::{
    BookListQuery, Catalog, CatalogConfig, CatalogError, Database, Field, GenreListQuery,
};
use std::collections::HashSet;
use uuid::Uuid;

async fn catalog() -> Catalog {
    Catalog::new(Database::new_in_memory().await.expect("Failed to create database"))
}

async fn add_book(catalog: &Catalog, title: &str, rating: Option<f64>) -> Uuid {
    let mut book = NewBook::new(title);
    book.rating = rating.map(|r| Rating::new(r).expect("valid rating"));
    catalog.create_book(book).await.expect("Failed to create book").id
}

fn titles(page: &books_catalog::Page<books_catalog::BookDetails>) -> Vec<&str> {
    page.items.iter().map(|b| b.title.as_str()).collect()
}

// ============================================================================
// LISTING
// ============================================================================

#[tokio::test]
async fn pagination_is_exhaustive_and_disjoint() {
    let catalog = catalog().await;
    // Repeated titles force the id tie-breaker to matter
    for i in 0..23 {
        add_book(&catalog, &format!("Book {}", i % 4), None).await;
    }

    let mut seen = HashSet::new();
    let mut listed = 0;
    for page in 1..=5 {
        let result = catalog
            .list_books(&BookListQuery::new(page, 5))
            .await
            .expect("Failed to list books");
        assert_eq!(result.total, 23);
        assert_eq!(result.page, page);
        listed += result.items.len();
        for book in &result.items {
            assert!(seen.insert(book.id), "Book {} listed twice", book.id);
        }
    }

    assert_eq!(listed, 23);
    assert_eq!(seen.len(), 23);

    let past_end = catalog.list_books(&BookListQuery::new(6, 5)).await.unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 23);
}

#[tokio::test]
async fn pagination_parameters_are_normalized_and_echoed() {
    let catalog = catalog().await;
    add_book(&catalog, "Only", None).await;

    let page = catalog.list_books(&BookListQuery::new(0, 1000)).await.unwrap();

    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 10);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn title_sort_orders_both_directions() {
    let catalog = catalog().await;
    add_book(&catalog, "Zeta", None).await;
    add_book(&catalog, "Alpha", None).await;

    let asc = catalog
        .list_books(&BookListQuery::new(1, 10).sorted_by("title", "asc"))
        .await
        .unwrap();
    let desc = catalog
        .list_books(&BookListQuery::new(1, 10).sorted_by("title", "desc"))
        .await
        .unwrap();

    assert_eq!(titles(&asc), vec!["Alpha", "Zeta"]);
    assert_eq!(titles(&desc), vec!["Zeta", "Alpha"]);
}

#[tokio::test]
async fn unknown_sort_and_order_fall_back_to_title_ascending() {
    let catalog = catalog().await;
    add_book(&catalog, "Middle", Some(9.0)).await;
    add_book(&catalog, "Zeta", Some(1.0)).await;
    add_book(&catalog, "Alpha", Some(5.0)).await;

    let bogus = catalog
        .list_books(&BookListQuery::new(1, 10).sorted_by("author_name; DROP TABLE books", "sideways"))
        .await
        .expect("Bogus sort must not fail");

    assert_eq!(titles(&bogus), vec!["Alpha", "Middle", "Zeta"]);
}

#[tokio::test]
async fn unknown_genre_filter_yields_empty_page() {
    let catalog = catalog().await;
    add_book(&catalog, "Unfiled", None).await;

    let page = catalog
        .list_books(&BookListQuery::new(1, 10).in_genre(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn genre_filter_returns_linked_books_only() {
    let catalog = catalog().await;
    let poetry = catalog.create_genre(NewGenre::new("Poetry")).await.unwrap();
    let prose = catalog.create_genre(NewGenre::new("Prose")).await.unwrap();

    let mut book = NewBook::new("Leaves of Grass");
    book.genre_ids = vec![poetry.id];
    catalog.create_book(book).await.unwrap();
    let mut book = NewBook::new("Moby Dick");
    book.genre_ids = vec![prose.id];
    catalog.create_book(book).await.unwrap();

    let page = catalog
        .list_books(&BookListQuery::new(1, 10).in_genre(poetry.id))
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(titles(&page), vec!["Leaves of Grass"]);
}

#[tokio::test]
async fn rating_range_is_inclusive() {
    let catalog = catalog().await;
    add_book(&catalog, "Below", Some(4.9)).await;
    add_book(&catalog, "Exact", Some(5.0)).await;
    add_book(&catalog, "Above", Some(5.1)).await;
    add_book(&catalog, "Unrated", None).await;

    let page = catalog
        .list_books(&BookListQuery::new(1, 10).rated_between(Some(5.0), Some(5.0)))
        .await
        .unwrap();

    assert_eq!(titles(&page), vec!["Exact"]);
    assert_eq!(page.total, 1);

    let open_ended = catalog
        .list_books(&BookListQuery::new(1, 10).rated_between(Some(5.0), None))
        .await
        .unwrap();
    assert_eq!(titles(&open_ended), vec!["Above", "Exact"]);
}

#[tokio::test]
async fn search_matches_substring_regardless_of_case() {
    let catalog = catalog().await;
    add_book(&catalog, "Über Alles", None).await;
    add_book(&catalog, "The Hobbit", None).await;

    let page = catalog
        .list_books(&BookListQuery::new(1, 10).search("über"))
        .await
        .unwrap();
    assert_eq!(titles(&page), vec!["Über Alles"]);

    let page = catalog
        .list_books(&BookListQuery::new(1, 10).search("HOBB"))
        .await
        .unwrap();
    assert_eq!(titles(&page), vec!["The Hobbit"]);
}

// ============================================================================
// GENRE UNIQUENESS
// ============================================================================

#[tokio::test]
async fn duplicate_genre_is_a_conflict_naming_the_value() {
    let catalog = catalog().await;
    catalog.create_genre(NewGenre::new("Fantasy")).await.unwrap();

    let err = catalog
        .create_genre(NewGenre::new("Fantasy"))
        .await
        .expect_err("Duplicate genre accepted");

    assert!(err.is_conflict());
    assert!(err.to_string().contains("'Fantasy'"));

    let page = catalog.list_genres(&GenreListQuery::new(1, 10)).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn renaming_a_genre_to_itself_succeeds() {
    let catalog = catalog().await;
    let genre = catalog.create_genre(NewGenre::new("Sci-Fi")).await.unwrap();

    let renamed = catalog
        .update_genre(genre.id, GenrePatch::rename("Sci-Fi"))
        .await
        .expect("Self-rename rejected");

    assert_eq!(renamed.name, "Sci-Fi");
}

/// Uniqueness is an exact match while search folds case: "Fantasy" and
/// "fantasy" may coexist, and one search finds both.
#[tokio::test]
async fn genre_uniqueness_is_case_sensitive_but_search_is_not() {
    let catalog = catalog().await;
    catalog.create_genre(NewGenre::new("Fantasy")).await.unwrap();
    catalog
        .create_genre(NewGenre::new("fantasy"))
        .await
        .expect("Names differing only in case are distinct");

    let page = catalog
        .list_genres(&GenreListQuery::new(1, 10).search("FANTASY"))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

// ============================================================================
// BOOK WRITES
// ============================================================================

#[tokio::test]
async fn empty_genre_ids_clear_links_and_omitted_keeps_them() {
    let catalog = catalog().await;
    let horror = catalog.create_genre(NewGenre::new("Horror")).await.unwrap();
    let mut book = NewBook::new("Dracula");
    book.genre_ids = vec![horror.id];
    let book = catalog.create_book(book).await.unwrap();

    let patch = BookPatch {
        title: Field::Value("Dracula (Annotated)".to_string()),
        ..BookPatch::default()
    };
    let kept = catalog.update_book(book.id, patch).await.unwrap();
    assert_eq!(kept.genres.len(), 1, "Omitted genre_ids changed the links");
    assert_eq!(kept.title, "Dracula (Annotated)");

    let patch = BookPatch {
        genre_ids: Some(vec![]),
        ..BookPatch::default()
    };
    let cleared = catalog.update_book(book.id, patch).await.unwrap();
    assert!(cleared.genres.is_empty(), "Empty genre_ids kept the links");
    assert_eq!(cleared.title, "Dracula (Annotated)");
}

#[tokio::test]
async fn contributor_set_is_replaced_not_merged() {
    let catalog = catalog().await;
    let writer = catalog.create_contributor(NewContributor::new("Writer")).await.unwrap();
    let artist = catalog.create_contributor(NewContributor::new("Artist")).await.unwrap();

    let mut book = NewBook::new("Comic");
    book.contributors = vec![ContributorAssignment::new(writer.id, Role::Author)];
    let book = catalog.create_book(book).await.unwrap();

    let patch: BookPatch = serde_json::from_value(serde_json::json!({
        "contributors": [{ "contributor_id": artist.id, "role": "illustrator" }]
    }))
    .unwrap();
    let updated = catalog.update_book(book.id, patch).await.unwrap();

    assert_eq!(updated.contributors.len(), 1);
    assert_eq!(updated.contributors[0].contributor.full_name, "Artist");
    assert_eq!(updated.contributors[0].role, Role::Illustrator);
}

#[tokio::test]
async fn failed_update_leaves_book_untouched() {
    let catalog = catalog().await;
    let genre = catalog.create_genre(NewGenre::new("Drama")).await.unwrap();
    let mut book = NewBook::new("Hamlet");
    book.genre_ids = vec![genre.id];
    let book = catalog.create_book(book).await.unwrap();

    let patch = BookPatch {
        title: Field::Value("Hamlet, Prince of Denmark".to_string()),
        genre_ids: Some(vec![Uuid::new_v4()]),
        ..BookPatch::default()
    };
    let err = catalog
        .update_book(book.id, patch)
        .await
        .expect_err("Unknown genre accepted");
    assert!(matches!(err, CatalogError::UnknownReference { .. }));

    let reloaded = catalog.get_book(book.id).await.unwrap().unwrap();
    assert_eq!(reloaded, book);
}

#[tokio::test]
async fn deleting_a_book_removes_its_links() {
    let catalog = catalog().await;
    let genre = catalog.create_genre(NewGenre::new("Epic")).await.unwrap();
    let poet = catalog.create_contributor(NewContributor::new("Homer")).await.unwrap();

    let mut book = NewBook::new("The Odyssey");
    book.genre_ids = vec![genre.id];
    book.contributors = vec![ContributorAssignment::new(poet.id, Role::Author)];
    let book = catalog.create_book(book).await.unwrap();

    assert!(catalog.delete_book(book.id).await.unwrap());

    let db = catalog.database();
    let links: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM books_genres) + (SELECT COUNT(*) FROM books_contributors)",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(links, 0);
    assert_eq!(db.count_orphaned_links().await.unwrap(), 0);

    // Parents of the links survive
    assert!(catalog.get_genre(genre.id).await.unwrap().is_some());
    assert!(catalog.get_contributor(poet.id).await.unwrap().is_some());
}

#[tokio::test]
async fn repeated_fetches_are_identical() {
    let catalog = catalog().await;
    let genre = catalog.create_genre(NewGenre::new("Classic")).await.unwrap();
    let mut book = NewBook::new("Emma");
    book.genre_ids = vec![genre.id];
    book.published_year = Some(1815);
    let book = catalog.create_book(book).await.unwrap();

    let first = catalog.get_book(book.id).await.unwrap();
    let second = catalog.get_book(book.id).await.unwrap();
    assert_eq!(first, second);

    let listed = catalog.list_books(&BookListQuery::default()).await.unwrap();
    assert_eq!(Some(&listed.items[0]), first.as_ref());
}

#[tokio::test]
async fn file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = CatalogConfig::with_path(dir.path().join("catalog.db"));

    let catalog = Catalog::new(Database::connect(&config).await.unwrap());
    let id = add_book(&catalog, "Persistent", Some(7.7)).await;
    catalog.database().clone().close().await.unwrap();

    let reopened = Catalog::new(Database::connect(&config).await.unwrap());
    let book = reopened.get_book(id).await.unwrap().expect("Book lost on reopen");
    assert_eq!(book.rating, Some(Rating::new(7.7).unwrap()));
}
