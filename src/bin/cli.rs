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


use anyhow::{bail, Context, Result};
use books_catalog::storage::models::{
    BookPatch, ContributorAssignment, GenrePatch, NewBook, NewContributor, NewGenre, Rating, Role,
};
use books_catalog::{
    BookListQuery, Catalog, CatalogConfig, ContributorListQuery, Database, GenreListQuery,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Books Catalog CLI - Desktop tool for a catalog database", long_about = None)]
struct Cli {
    /// SQLite database file (defaults to the environment configuration)
    #[arg(short, long, global = true, env = "CATALOG_DATABASE_PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage books
    #[command(subcommand)]
    Books(BookCommands),
    /// Manage genres
    #[command(subcommand)]
    Genres(GenreCommands),
    /// Manage contributors
    #[command(subcommand)]
    Contributors(ContributorCommands),
    /// Run database health checks
    Check,
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: i64,
    #[arg(long, default_value_t = 10)]
    page_size: i64,
    /// Case-insensitive substring filter
    #[arg(short, long)]
    q: Option<String>,
}

#[derive(Subcommand)]
enum BookCommands {
    /// List books
    List {
        #[command(flatten)]
        page: PageArgs,
        /// title, rating or published_year
        #[arg(long, default_value = "title")]
        sort: String,
        /// asc or desc
        #[arg(long, default_value = "asc")]
        order: String,
        #[arg(long)]
        genre_id: Option<Uuid>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        rating_min: Option<f64>,
        #[arg(long)]
        rating_max: Option<f64>,
    },
    /// Show one book
    Get { id: Uuid },
    /// Create a book
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(long)]
        rating: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Genre id (repeatable)
        #[arg(long = "genre")]
        genres: Vec<Uuid>,
        /// Contributor credit as `<id>:<role>` (repeatable)
        #[arg(long = "contributor", value_parser = parse_assignment)]
        contributors: Vec<ContributorAssignment>,
    },
    /// Update a book from a JSON patch, e.g. '{"rating": null, "genre_ids": []}'
    Update { id: Uuid, patch: String },
    /// Delete a book
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum GenreCommands {
    /// List genres
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one genre
    Get { id: Uuid },
    /// Create a genre
    Create { name: String },
    /// Rename a genre
    Rename { id: Uuid, name: String },
    /// Delete a genre
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum ContributorCommands {
    /// List contributors
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Create a contributor
    Create { full_name: String },
    /// Delete a contributor
    Delete { id: Uuid },
}

fn parse_assignment(raw: &str) -> std::result::Result<ContributorAssignment, String> {
    let (id, role) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <id>:<role>, got '{}'", raw))?;
    let id = Uuid::parse_str(id).map_err(|e| format!("invalid contributor id '{}': {}", id, e))?;
    let role = role.parse::<Role>().map_err(|e| e.to_string())?;
    Ok(ContributorAssignment::new(id, role))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_deleted(kind: &str, id: Uuid, deleted: bool) -> Result<()> {
    if !deleted {
        bail!("{} {} not found", kind, id);
    }
    print_json(&serde_json::json!({ "deleted": id }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CatalogConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }
    let db = Database::connect(&config)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let catalog = Catalog::new(db);

    match cli.command {
        Commands::Books(command) => run_books(&catalog, command).await?,
        Commands::Genres(command) => run_genres(&catalog, command).await?,
        Commands::Contributors(command) => run_contributors(&catalog, command).await?,
        Commands::Check => {
            let db = catalog.database();
            print_json(&serde_json::json!({
                "quick_check": db.quick_check().await?,
                "integrity_check": db.check_integrity().await?,
                "orphaned_links": db.count_orphaned_links().await?,
            }))?;
        }
    }

    catalog.database().clone().close().await?;
    Ok(())
}

async fn run_books(catalog: &Catalog, command: BookCommands) -> Result<()> {
    match command {
        BookCommands::List {
            page,
            sort,
            order,
            genre_id,
            year,
            rating_min,
            rating_max,
        } => {
            let mut query = BookListQuery::new(page.page, page.page_size)
                .sorted_by(&sort, &order)
                .rated_between(rating_min, rating_max);
            query.q = page.q;
            query.genre_id = genre_id;
            query.published_year = year;
            print_json(&catalog.list_books(&query).await?)
        }
        BookCommands::Get { id } => match catalog.get_book(id).await? {
            Some(book) => print_json(&book),
            None => bail!("book {} not found", id),
        },
        BookCommands::Create {
            title,
            rating,
            description,
            year,
            genres,
            contributors,
        } => {
            let book = NewBook {
                title,
                rating: rating.map(Rating::new).transpose()?,
                description,
                published_year: year,
                genre_ids: genres,
                contributors,
            };
            print_json(&catalog.create_book(book).await?)
        }
        BookCommands::Update { id, patch } => {
            let patch: BookPatch = serde_json::from_str(&patch).context("Invalid book patch JSON")?;
            print_json(&catalog.update_book(id, patch).await?)
        }
        BookCommands::Delete { id } => print_deleted("book", id, catalog.delete_book(id).await?),
    }
}

async fn run_genres(catalog: &Catalog, command: GenreCommands) -> Result<()> {
    match command {
        GenreCommands::List { page } => {
            let mut query = GenreListQuery::new(page.page, page.page_size);
            query.q = page.q;
            print_json(&catalog.list_genres(&query).await?)
        }
        GenreCommands::Get { id } => match catalog.get_genre(id).await? {
            Some(genre) => print_json(&genre),
            None => bail!("genre {} not found", id),
        },
        GenreCommands::Create { name } => print_json(&catalog.create_genre(NewGenre::new(name)).await?),
        GenreCommands::Rename { id, name } => {
            print_json(&catalog.update_genre(id, GenrePatch::rename(name)).await?)
        }
        GenreCommands::Delete { id } => print_deleted("genre", id, catalog.delete_genre(id).await?),
    }
}

async fn run_contributors(catalog: &Catalog, command: ContributorCommands) -> Result<()> {
    match command {
        ContributorCommands::List { page } => {
            let mut query = ContributorListQuery::new(page.page, page.page_size);
            query.q = page.q;
            print_json(&catalog.list_contributors(&query).await?)
        }
        ContributorCommands::Create { full_name } => {
            print_json(&catalog.create_contributor(NewContributor::new(full_name)).await?)
        }
        ContributorCommands::Delete { id } => {
            print_deleted("contributor", id, catalog.delete_contributor(id).await?)
        }
    }
}
