//! Database models for the books catalog
//!
//! Row structs map 1:1 onto the tables created in `migrations.rs`; the
//! `New*`/`*Patch` structs are the write payloads accepted by the catalog
//! services, with their input-boundary validation.
//!
//! # SQLite Adaptations
//! - Ids are UUID v4 stored as 16-byte BLOBs
//! - `Rating` stored as INTEGER tenths (one decimal place, exact comparisons)
//! - `Role` stored as lowercase TEXT
//! - Timestamps stored as TEXT, assigned by the store
//! - Many-to-many relationships use junction tables

use crate::error::{CatalogError, Result};
use crate::patch::Field;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// INPUT LIMITS
// ============================================================================

pub const TITLE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const GENRE_NAME_MAX_LEN: usize = 100;
pub const CONTRIBUTOR_NAME_MAX_LEN: usize = 255;
pub const PUBLISHED_YEAR_MIN: i32 = 1800;
pub const PUBLISHED_YEAR_MAX: i32 = 2100;

// ============================================================================
// ENUMS
// ============================================================================

/// Contributor role on a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author,
    Editor,
    Illustrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Author, Role::Editor, Role::Illustrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Editor => "editor",
            Role::Illustrator => "illustrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "author" => Ok(Role::Author),
            "editor" => Ok(Role::Editor),
            "illustrator" => Ok(Role::Illustrator),
            other => Err(CatalogError::InvalidData(format!("unknown contributor role '{}'", other))),
        }
    }
}

// ============================================================================
// VALUE OBJECTS
// ============================================================================

/// Book rating with one decimal place, in [0, 99.9]
///
/// Held as integer tenths so equality and range predicates are exact
/// (`5.0` is stored as `50`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u16);

impl Rating {
    pub const MIN: Rating = Rating(0);
    pub const MAX: Rating = Rating(999);

    /// Build from tenths (`123` is `12.3`)
    pub fn from_tenths(tenths: i64) -> Result<Self> {
        if (0..=Self::MAX.0 as i64).contains(&tenths) {
            Ok(Rating(tenths as u16))
        } else {
            Err(CatalogError::validation(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                tenths as f64 / 10.0
            )))
        }
    }

    /// Build from a decimal value, rounded to one decimal place
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CatalogError::validation("rating must be a finite number"));
        }
        let tenths = (value * 10.0).round();
        if tenths < 0.0 || tenths > Self::MAX.0 as f64 {
            return Err(CatalogError::validation(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Rating(tenths as u16))
    }

    /// Clamp an arbitrary filter bound into [0, 99.9]; NaN becomes 0
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        let tenths = (value * 10.0).round().clamp(0.0, Self::MAX.0 as f64);
        Rating(tenths as u16)
    }

    pub fn tenths(self) -> i64 {
        self.0 as i64
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl FromStr for Rating {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| CatalogError::validation(format!("rating '{}' is not a number", s)))?;
        Rating::new(value)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Rating::new(value).map_err(de::Error::custom)
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book row (base columns only; relations are attached by the assembler)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    /// Rating in tenths, see [`Rating`]
    #[sqlx(default)]
    pub rating: Option<i64>,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub published_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookRow {
    /// Get rating as a value object
    pub fn get_rating(&self) -> Result<Option<Rating>> {
        self.rating.map(Rating::from_tenths).transpose()
    }
}

/// Genre
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contributor - author, editor or illustrator of books
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Contributor {
    pub id: Uuid,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// JUNCTION TABLES (Many-to-Many Relationships)
// ============================================================================

/// BookGenre - junction table for Book <-> Genre
///
/// Composite primary key: (book_id, genre_id)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BookGenre {
    pub book_id: Uuid,
    pub genre_id: Uuid,
}

/// BookContributor - junction table for Book <-> Contributor
///
/// Composite primary key: (book_id, contributor_id, role)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BookContributor {
    pub book_id: Uuid,
    pub contributor_id: Uuid,
    pub role: String,
}

impl BookContributor {
    pub fn get_role(&self) -> Result<Role> {
        self.role.parse()
    }
}

// ============================================================================
// WRITE PAYLOADS
// ============================================================================

/// A contributor taking a role on a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributorAssignment {
    pub contributor_id: Uuid,
    pub role: Role,
}

impl ContributorAssignment {
    pub fn new(contributor_id: Uuid, role: Role) -> Self {
        Self { contributor_id, role }
    }
}

/// New book for insertion, with its initial genre and contributor sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<Uuid>,
    #[serde(default)]
    pub contributors: Vec<ContributorAssignment>,
}

impl NewBook {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(year) = self.published_year {
            validate_published_year(year)?;
        }
        Ok(())
    }
}

/// Partial book update
///
/// Core fields use [`Field`]: missing keys are left untouched, `null` clears
/// nullable columns. `genre_ids`/`contributors` replace the whole link set
/// when present (an empty list removes every link); `None` leaves links as
/// they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub rating: Field<Rating>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub published_year: Field<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_ids: Option<Vec<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Vec<ContributorAssignment>>,
}

impl BookPatch {
    /// True if any column of the book row itself is touched
    pub fn has_core_changes(&self) -> bool {
        self.title.is_present()
            || self.rating.is_present()
            || self.description.is_present()
            || self.published_year.is_present()
    }

    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Field::Null => return Err(CatalogError::validation("title cannot be null")),
            Field::Value(title) => validate_title(title)?,
            Field::Missing => {}
        }
        if let Some(description) = self.description.as_value() {
            validate_description(description)?;
        }
        if let Some(year) = self.published_year.as_value() {
            validate_published_year(*year)?;
        }
        Ok(())
    }
}

/// New genre for insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
}

impl NewGenre {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("genre name", &self.name, GENRE_NAME_MAX_LEN)
    }
}

/// Partial genre update; a missing or null name leaves the genre unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenrePatch {
    #[serde(default)]
    pub name: Option<String>,
}

impl GenrePatch {
    pub fn rename<S: Into<String>>(name: S) -> Self {
        Self { name: Some(name.into()) }
    }

    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => validate_name("genre name", name, GENRE_NAME_MAX_LEN),
            None => Ok(()),
        }
    }
}

/// New contributor for insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContributor {
    pub full_name: String,
}

impl NewContributor {
    pub fn new<S: Into<String>>(full_name: S) -> Self {
        Self { full_name: full_name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("contributor full_name", &self.full_name, CONTRIBUTOR_NAME_MAX_LEN)
    }
}

/// Partial contributor update; a missing or null name leaves it unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorPatch {
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ContributorPatch {
    pub fn validate(&self) -> Result<()> {
        match &self.full_name {
            Some(name) => validate_name("contributor full_name", name, CONTRIBUTOR_NAME_MAX_LEN),
            None => Ok(()),
        }
    }
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

fn validate_title(title: &str) -> Result<()> {
    validate_name("title", title, TITLE_MAX_LEN)
}

fn validate_name(what: &str, value: &str, max_len: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(CatalogError::validation(format!("{} must not be empty", what)));
    }
    if len > max_len {
        return Err(CatalogError::validation(format!(
            "{} must be at most {} characters, got {}",
            what, max_len, len
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    let len = description.chars().count();
    if len > DESCRIPTION_MAX_LEN {
        return Err(CatalogError::validation(format!(
            "description must be at most {} characters, got {}",
            DESCRIPTION_MAX_LEN, len
        )));
    }
    Ok(())
}

fn validate_published_year(year: i32) -> Result<()> {
    if !(PUBLISHED_YEAR_MIN..=PUBLISHED_YEAR_MAX).contains(&year) {
        return Err(CatalogError::validation(format!(
            "published_year must be between {} and {}, got {}",
            PUBLISHED_YEAR_MIN, PUBLISHED_YEAR_MAX, year
        )));
    }
    Ok(())
}
