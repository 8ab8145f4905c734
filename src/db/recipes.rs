use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::models::{NewRecipe, Recipe, RecipeDetails, RecipeIngredient};

use super::ingredients::ingredient_exists;

/// Result of trying to link an ingredient to a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    /// No ingredient has the requested id; nothing was written.
    IngredientNotFound,
}

const RECIPE_COLUMNS: &str =
    "id, title, description, instructions, prep_minutes, cook_minutes, author_id";

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        instructions: row.get(3)?,
        prep_minutes: row.get(4)?,
        cook_minutes: row.get(5)?,
        author_id: row.get(6)?,
    })
}

pub fn fetch_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {RECIPE_COLUMNS} FROM recipe ORDER BY id"))
        .context("failed to prepare recipe query")?;

    let recipes = stmt
        .query_map([], recipe_from_row)
        .context("failed to iterate recipes")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect recipes")?;

    Ok(recipes)
}

pub fn find_recipe(conn: &Connection, id: i64) -> Result<Option<Recipe>> {
    conn.query_row(
        &format!("SELECT {RECIPE_COLUMNS} FROM recipe WHERE id = ?1"),
        [id],
        recipe_from_row,
    )
    .optional()
    .context("failed to look up recipe")
}

/// Insert a complete recipe inside a single transaction so a failure can never
/// leave a half-written row behind.
pub fn create_recipe(conn: &mut Connection, recipe: &NewRecipe) -> Result<Recipe> {
    let tx = conn.transaction().context("failed to start recipe transaction")?;
    tx.execute(
        "INSERT INTO recipe
            (title, description, instructions, prep_minutes, cook_minutes, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            recipe.title,
            recipe.description,
            recipe.instructions,
            recipe.prep_minutes,
            recipe.cook_minutes,
            recipe.author_id,
        ],
    )
    .context("failed to insert recipe")?;
    let id = tx.last_insert_rowid();
    tx.commit().context("failed to commit recipe")?;

    let recipe = recipe.clone().with_id(id);
    info!(id, title = %recipe.title, author_id = recipe.author_id, "recipe created");
    Ok(recipe)
}

/// Remove a recipe. Its ingredient links go with it through the schema's
/// cascade. `None` means no recipe had that id.
pub fn delete_recipe(conn: &Connection, id: i64) -> Result<Option<Recipe>> {
    let Some(recipe) = find_recipe(conn, id)? else {
        warn!(id, "recipe to delete not found");
        return Ok(None);
    };

    conn.execute("DELETE FROM recipe WHERE id = ?1", params![id])
        .context("failed to delete recipe")?;

    info!(id, title = %recipe.title, "recipe deleted");
    Ok(Some(recipe))
}

/// Ingredients linked to one recipe, alphabetically by ingredient name.
/// Duplicate links are returned as separate lines.
pub fn fetch_recipe_ingredients(conn: &Connection, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
    let mut stmt = conn
        .prepare(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name, ri.quantity
             FROM recipe_ingredient ri
             INNER JOIN ingredient i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ?1
             ORDER BY i.name COLLATE NOCASE, ri.rowid",
        )
        .context("failed to prepare recipe ingredient query")?;

    let lines = stmt
        .query_map([recipe_id], |row| {
            Ok(RecipeIngredient {
                recipe_id: row.get(0)?,
                ingredient_id: row.get(1)?,
                ingredient_name: row.get(2)?,
                quantity: row.get(3)?,
            })
        })
        .context("failed to iterate recipe ingredients")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect recipe ingredients")?;

    Ok(lines)
}

/// Load every recipe together with its author's name and ingredient lines.
pub fn fetch_recipe_details(conn: &Connection) -> Result<Vec<RecipeDetails>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.id, r.title, r.description, r.instructions,
                    r.prep_minutes, r.cook_minutes, r.author_id, a.name
             FROM recipe r
             LEFT JOIN author a ON a.id = r.author_id
             ORDER BY r.id",
        )
        .context("failed to prepare recipe listing")?;

    let rows = stmt
        .query_map([], |row| {
            let recipe = recipe_from_row(row)?;
            let author_name: Option<String> = row.get(7)?;
            Ok((recipe, author_name))
        })
        .context("failed to iterate recipe listing")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect recipe listing")?;

    let mut details = Vec::with_capacity(rows.len());
    for (recipe, author_name) in rows {
        let ingredients = fetch_recipe_ingredients(conn, recipe.id)?;
        details.push(RecipeDetails {
            recipe,
            author_name,
            ingredients,
        });
    }

    debug!(count = details.len(), "fetched recipe listing");
    Ok(details)
}

/// Link an ingredient to a recipe with a free-text quantity. The ingredient id
/// is checked first so a typo is reported as a miss rather than a constraint
/// failure. The same ingredient may be linked more than once.
pub fn attach_ingredient(
    conn: &Connection,
    recipe_id: i64,
    ingredient_id: i64,
    quantity: &str,
) -> Result<AttachOutcome> {
    if !ingredient_exists(conn, ingredient_id)? {
        warn!(recipe_id, ingredient_id, "ingredient to attach not found");
        return Ok(AttachOutcome::IngredientNotFound);
    }

    conn.execute(
        "INSERT INTO recipe_ingredient (recipe_id, ingredient_id, quantity) VALUES (?1, ?2, ?3)",
        params![recipe_id, ingredient_id, quantity],
    )
    .context("failed to link ingredient to recipe")?;

    info!(recipe_id, ingredient_id, quantity, "ingredient attached");
    Ok(AttachOutcome::Attached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::scratch_db;
    use crate::db::{count_recipes_by_author, create_author, create_ingredient, delete_author};
    use crate::models::{NewAuthor, NewIngredient};

    fn author(conn: &Connection) -> i64 {
        create_author(conn, &NewAuthor::new("Ricardo", "r@example.com", "").unwrap())
            .unwrap()
            .id
    }

    fn soup(author_id: i64) -> NewRecipe {
        NewRecipe::new(
            "Soup",
            "A warm bowl; \"grandma's\" style",
            "Chop.\tSimmer 20 min.",
            "10",
            "20",
            &author_id.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn recipe_text_round_trips_exactly() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let author_id = author(conn);

        let input = soup(author_id);
        let created = create_recipe(conn, &input).unwrap();

        let listed = fetch_recipe_details(conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].recipe, created);
        assert_eq!(listed[0].recipe.description, input.description);
        assert_eq!(listed[0].recipe.instructions, input.instructions);
        assert_eq!(listed[0].author_name.as_deref(), Some("Ricardo"));
    }

    #[test]
    fn unknown_author_is_rejected_by_storage() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();

        assert!(create_recipe(conn, &soup(4242)).is_err());
        assert!(fetch_recipes(conn).unwrap().is_empty());
    }

    #[test]
    fn deleting_author_cascades_to_recipes() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let doomed = author(conn);
        let kept = author(conn);
        create_recipe(conn, &soup(doomed)).unwrap();
        create_recipe(conn, &soup(doomed)).unwrap();
        let survivor = create_recipe(conn, &soup(kept)).unwrap();

        assert_eq!(count_recipes_by_author(conn, doomed).unwrap(), 2);
        assert!(delete_author(conn, doomed).unwrap().is_some());

        assert_eq!(fetch_recipes(conn).unwrap(), vec![survivor]);
        assert_eq!(count_recipes_by_author(conn, doomed).unwrap(), 0);
    }

    #[test]
    fn attach_checks_ingredient_and_allows_duplicates() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let author_id = author(conn);
        let recipe = create_recipe(conn, &soup(author_id)).unwrap();
        let salt =
            create_ingredient(conn, &NewIngredient::new("Salt", "3").unwrap()).unwrap();
        let carrot =
            create_ingredient(conn, &NewIngredient::new("Carrot", "5").unwrap()).unwrap();

        assert_eq!(
            attach_ingredient(conn, recipe.id, 99999, "1 cup").unwrap(),
            AttachOutcome::IngredientNotFound
        );
        assert!(fetch_recipe_ingredients(conn, recipe.id).unwrap().is_empty());

        for (id, qty) in [(salt.id, "1 tsp"), (carrot.id, "2"), (salt.id, "1 pinch")] {
            assert_eq!(
                attach_ingredient(conn, recipe.id, id, qty).unwrap(),
                AttachOutcome::Attached
            );
        }

        let lines: Vec<String> = fetch_recipe_ingredients(conn, recipe.id)
            .unwrap()
            .iter()
            .map(RecipeIngredient::display_line)
            .collect();
        assert_eq!(lines, vec!["2 de Carrot", "1 tsp de Salt", "1 pinch de Salt"]);
    }

    #[test]
    fn deleting_recipe_drops_its_links() {
        let (_dir, mut provider) = scratch_db();
        let conn = provider.connection().unwrap();
        let author_id = author(conn);
        let recipe = create_recipe(conn, &soup(author_id)).unwrap();
        let salt =
            create_ingredient(conn, &NewIngredient::new("Salt", "3").unwrap()).unwrap();
        attach_ingredient(conn, recipe.id, salt.id, "1 tsp").unwrap();

        assert_eq!(delete_recipe(conn, recipe.id).unwrap(), Some(recipe.clone()));
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipe_ingredient", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);
        assert_eq!(delete_recipe(conn, recipe.id).unwrap(), None);
    }
}
