//! Persistence module split across logical submodules.

mod authors;
mod connection;
mod ingredients;
mod recipes;

pub use authors::{count_recipes_by_author, create_author, delete_author, fetch_authors, find_author};
pub use connection::{ensure_schema, ConnectionError, ConnectionProvider};
pub use ingredients::{
    create_ingredient, delete_ingredient, fetch_ingredients, find_ingredient, ingredient_exists,
};
pub use recipes::{
    attach_ingredient, create_recipe, delete_recipe, fetch_recipe_details,
    fetch_recipe_ingredients, fetch_recipes, find_recipe, AttachOutcome,
};

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::ConnectionProvider;

    /// A provider pointed at a throw-away file. Keep the `TempDir` alive for as
    /// long as the provider is used.
    pub(crate) fn scratch_db() -> (TempDir, ConnectionProvider) {
        let dir = TempDir::new().unwrap();
        let provider = ConnectionProvider::new(dir.path().join("recipes.sqlite"));
        (dir, provider)
    }
}
