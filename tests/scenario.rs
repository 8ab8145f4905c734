//! End-to-end storage walk-through against a fresh database file.

use recipe_manager::db::{
    attach_ingredient, count_recipes_by_author, create_author, create_ingredient, create_recipe,
    delete_author, delete_recipe, fetch_authors, fetch_recipe_details, fetch_recipes,
    AttachOutcome,
};
use recipe_manager::models::{NewAuthor, NewIngredient, NewRecipe};
use recipe_manager::ConnectionProvider;
use tempfile::TempDir;

fn provider() -> (TempDir, ConnectionProvider) {
    let dir = TempDir::new().unwrap();
    let provider = ConnectionProvider::new(dir.path().join("nested").join("recipes.sqlite"));
    (dir, provider)
}

#[test]
fn soup_with_a_teaspoon_of_salt() {
    let (_dir, mut db) = provider();
    let conn = db.connection().unwrap();

    let salt = create_ingredient(conn, &NewIngredient::new("Salt", "3").unwrap()).unwrap();
    let author = create_author(conn, &NewAuthor::new("Ricardo", "", "").unwrap()).unwrap();
    let soup = NewRecipe::new(
        "Soup",
        "A warm bowl",
        "Simmer gently",
        "10",
        "20",
        &author.id.to_string(),
    )
    .unwrap();
    let soup = create_recipe(conn, &soup).unwrap();

    assert_eq!(
        attach_ingredient(conn, soup.id, 99999, "1 tsp").unwrap(),
        AttachOutcome::IngredientNotFound
    );
    assert_eq!(
        attach_ingredient(conn, soup.id, salt.id, "1 tsp").unwrap(),
        AttachOutcome::Attached
    );

    let listing = fetch_recipe_details(conn).unwrap();
    assert_eq!(listing.len(), 1);
    let details = &listing[0];
    assert_eq!(details.recipe.title, "Soup");
    assert_eq!(details.recipe.prep_minutes, 10);
    assert_eq!(details.recipe.cook_minutes, 20);
    assert_eq!(details.author_name.as_deref(), Some("Ricardo"));
    let lines: Vec<String> = details
        .ingredients
        .iter()
        .map(|line| line.display_line())
        .collect();
    assert_eq!(lines, ["1 tsp de Salt"]);
}

#[test]
fn data_survives_reopening_the_file() {
    let (_dir, mut db) = provider();
    {
        let conn = db.connection().unwrap();
        create_author(conn, &NewAuthor::new("Julia", "julia@example.com", "Chef").unwrap())
            .unwrap();
    }
    db.close().unwrap();
    assert!(!db.is_open());

    let authors = fetch_authors(db.connection().unwrap()).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].bio.as_deref(), Some("Chef"));
}

#[test]
fn deletes_cascade_and_misses_are_reported() {
    let (_dir, mut db) = provider();
    let conn = db.connection().unwrap();

    let author = create_author(conn, &NewAuthor::new("Ricardo", "", "").unwrap()).unwrap();
    for title in ["Soup", "Stew"] {
        let recipe =
            NewRecipe::new(title, "Hot", "Cook", "5", "15", &author.id.to_string()).unwrap();
        create_recipe(conn, &recipe).unwrap();
    }

    assert!(delete_recipe(conn, 99999).unwrap().is_none());
    assert!(delete_author(conn, 99999).unwrap().is_none());
    assert_eq!(fetch_recipes(conn).unwrap().len(), 2);

    assert_eq!(count_recipes_by_author(conn, author.id).unwrap(), 2);
    let removed = delete_author(conn, author.id).unwrap().unwrap();
    assert_eq!(removed.name, "Ricardo");
    assert!(fetch_recipes(conn).unwrap().is_empty());
}
