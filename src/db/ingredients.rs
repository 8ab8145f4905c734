use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::models::{Ingredient, NewIngredient};

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        health_score: row.get(2)?,
    })
}

/// Fetch all ingredients alphabetically, ignoring case so "salt" and "Sugar"
/// sort the way a reader expects.
pub fn fetch_ingredients(conn: &Connection) -> Result<Vec<Ingredient>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, health_score
             FROM ingredient
             ORDER BY name COLLATE NOCASE, id",
        )
        .context("failed to prepare ingredient query")?;

    let ingredients = stmt
        .query_map([], ingredient_from_row)
        .context("failed to iterate ingredients")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect ingredients")?;

    debug!(count = ingredients.len(), "fetched ingredients");
    Ok(ingredients)
}

pub fn find_ingredient(conn: &Connection, id: i64) -> Result<Option<Ingredient>> {
    conn.query_row(
        "SELECT id, name, health_score FROM ingredient WHERE id = ?1",
        [id],
        ingredient_from_row,
    )
    .optional()
    .context("failed to look up ingredient")
}

/// Cheap existence check used before linking an ingredient to a recipe.
pub fn ingredient_exists(conn: &Connection, id: i64) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM ingredient WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .context("failed to check ingredient")?;
    Ok(count > 0)
}

pub fn create_ingredient(conn: &Connection, ingredient: &NewIngredient) -> Result<Ingredient> {
    conn.execute(
        "INSERT INTO ingredient (name, health_score) VALUES (?1, ?2)",
        params![ingredient.name, ingredient.health_score],
    )
    .context("failed to insert ingredient")?;

    let ingredient = ingredient.clone().with_id(conn.last_insert_rowid());
    info!(id = ingredient.id, name = %ingredient.name, "ingredient created");
    Ok(ingredient)
}

/// Permanently delete an ingredient. Recipe links cascade away with it.
pub fn delete_ingredient(conn: &Connection, id: i64) -> Result<Option<Ingredient>> {
    let Some(ingredient) = find_ingredient(conn, id)? else {
        warn!(id, "ingredient to delete not found");
        return Ok(None);
    };

    conn.execute("DELETE FROM ingredient WHERE id = ?1", params![id])
        .context("failed to delete ingredient")?;

    info!(id, name = %ingredient.name, "ingredient deleted");
    Ok(Some(ingredient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::scratch_db;

    fn add(conn: &Connection, name: &str, score: &str) -> Ingredient {
        create_ingredient(conn, &NewIngredient::new(name, score).unwrap()).unwrap()
    }

    #[test]
    fn list_is_alphabetical_ignoring_case() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        add(conn, "sugar", "1");
        add(conn, "Carrot", "5");
        add(conn, "Salt", "3");

        let names: Vec<String> = fetch_ingredients(conn)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Carrot", "Salt", "sugar"]);
    }

    #[test]
    fn empty_table_lists_nothing() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        assert!(fetch_ingredients(conn).unwrap().is_empty());
    }

    #[test]
    fn existence_check_follows_inserts_and_deletes() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let salt = add(conn, "Salt", "3");

        assert!(ingredient_exists(conn, salt.id).unwrap());
        assert!(!ingredient_exists(conn, salt.id + 1).unwrap());

        assert_eq!(delete_ingredient(conn, salt.id).unwrap(), Some(salt.clone()));
        assert!(!ingredient_exists(conn, salt.id).unwrap());
        assert_eq!(delete_ingredient(conn, salt.id).unwrap(), None);
    }

    #[test]
    fn health_score_is_stored_as_given() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let kale = add(conn, "Kale", "5");
        let found = find_ingredient(conn, kale.id).unwrap().unwrap();
        assert_eq!(found.health_score, 5);
    }
}
