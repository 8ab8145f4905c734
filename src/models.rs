//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. Persisted entities are plain data holders; the `New*` inputs are the
//! only way to reach an insert and they can only be built from input that
//! already passed validation.

use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

/// Health scores accepted for an ingredient, inclusive on both ends.
pub const HEALTH_SCORE_RANGE: RangeInclusive<u8> = 1..=5;

/// Reasons a raw form value is rejected before it can reach the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty.")]
    Empty { field: &'static str },
    #[error("{field} must be a whole number.")]
    NotAnInteger { field: &'static str },
    #[error("{field} cannot be negative.")]
    NegativeMinutes { field: &'static str },
    #[error("Health score must be between 1 and 5 (got {0}).")]
    HealthScoreOutOfRange(i64),
}

impl ValidationError {
    /// Name of the field that failed, matching the labels the forms show.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Empty { field }
            | ValidationError::NotAnInteger { field }
            | ValidationError::NegativeMinutes { field } => *field,
            ValidationError::HealthScoreOutOfRange(_) => "Health score",
        }
    }
}

/// Trim `raw` and reject it when nothing is left.
pub fn require_text(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a signed integer, treating blank input as a missing value.
pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger { field })
}

/// Parse a duration in minutes. Negative values are rejected explicitly so the
/// user gets a precise message instead of a generic parse failure.
pub fn parse_minutes(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let value = parse_integer(field, raw)?;
    if value < 0 {
        return Err(ValidationError::NegativeMinutes { field });
    }
    u32::try_from(value).map_err(|_| ValidationError::NotAnInteger { field })
}

pub fn parse_health_score(raw: &str) -> Result<u8, ValidationError> {
    let value = parse_integer("Health score", raw)?;
    u8::try_from(value)
        .ok()
        .filter(|score| HEALTH_SCORE_RANGE.contains(score))
        .ok_or(ValidationError::HealthScoreOutOfRange(value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A person credited with one or more recipes.
pub struct Author {
    /// Primary key from the database.
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Stored as NULL when the user leaves the field blank.
    pub bio: Option<String>,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

/// Validated author fields waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
}

impl NewAuthor {
    pub fn new(name: &str, email: &str, bio: &str) -> Result<Self, ValidationError> {
        let bio = bio.trim();
        Ok(Self {
            name: require_text("Name", name)?,
            email: email.trim().to_string(),
            bio: (!bio.is_empty()).then(|| bio.to_string()),
        })
    }

    /// Attach the generated key once the row exists.
    pub fn with_id(self, id: i64) -> Author {
        Author {
            id,
            name: self.name,
            email: self.email,
            bio: self.bio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Always inside [`HEALTH_SCORE_RANGE`] when created through the app.
    pub health_score: u8,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} (health {}/5)", self.id, self.name, self.health_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIngredient {
    pub name: String,
    pub health_score: u8,
}

impl NewIngredient {
    pub fn new(name: &str, health_score: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: require_text("Name", name)?,
            health_score: parse_health_score(health_score)?,
        })
    }

    pub fn with_id(self, id: i64) -> Ingredient {
        Ingredient {
            id,
            name: self.name,
            health_score: self.health_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A recipe row. The author reference is whatever the user typed; the schema's
/// foreign key is the only thing that checks it.
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_minutes: u32,
    pub cook_minutes: u32,
    pub author_id: i64,
}

impl Recipe {
    pub fn total_minutes(&self) -> u32 {
        self.prep_minutes.saturating_add(self.cook_minutes)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_minutes: u32,
    pub cook_minutes: u32,
    pub author_id: i64,
}

impl NewRecipe {
    /// Build a recipe from raw form text. The first invalid field wins, in the
    /// same order the form presents them.
    pub fn new(
        title: &str,
        description: &str,
        instructions: &str,
        prep_minutes: &str,
        cook_minutes: &str,
        author_id: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: require_text("Title", title)?,
            description: require_text("Description", description)?,
            instructions: require_text("Instructions", instructions)?,
            prep_minutes: parse_minutes("Prep time", prep_minutes)?,
            cook_minutes: parse_minutes("Cook time", cook_minutes)?,
            author_id: parse_integer("Author id", author_id)?,
        })
    }

    pub fn with_id(self, id: i64) -> Recipe {
        Recipe {
            id,
            title: self.title,
            description: self.description,
            instructions: self.instructions,
            prep_minutes: self.prep_minutes,
            cook_minutes: self.cook_minutes,
            author_id: self.author_id,
        }
    }
}

/// One row of the `recipe_ingredient` join table, hydrated with the
/// ingredient name so list views do not need a second lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: String,
}

impl RecipeIngredient {
    /// `"1 tsp de Salt"`, the format used by the recipe listing.
    pub fn display_line(&self) -> String {
        format!("{} de {}", self.quantity, self.ingredient_name)
    }
}

/// Everything the "list recipes" screen shows for a single recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    /// `None` when the author row no longer exists.
    pub author_name: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}
